//! Level thresholds and their rewards

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// What a reward grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardKind {
    Coupon,
    Badge,
    Feature,
}

/// A reward shown once its level is reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub id: String,
    pub kind: RewardKind,
    pub title: String,
    pub description: String,
    /// Discount value for coupons (e.g. "10%")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Redeemable coupon code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Reward {
    fn badge(id: &str, title: &str, description: &str) -> Self {
        Self {
            id: id.into(),
            kind: RewardKind::Badge,
            title: title.into(),
            description: description.into(),
            value: None,
            code: None,
        }
    }

    fn feature(id: &str, title: &str, description: &str) -> Self {
        Self { kind: RewardKind::Feature, ..Self::badge(id, title, description) }
    }

    fn coupon(id: &str, percent: u32, code: &str, description: &str) -> Self {
        Self {
            id: id.into(),
            kind: RewardKind::Coupon,
            title: format!("{}% Off Coupon", percent),
            description: description.into(),
            value: Some(format!("{}%", percent)),
            code: Some(code.into()),
        }
    }
}

/// A contiguous XP range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    /// 1-based level number
    pub level: u32,
    pub name: String,
    /// Inclusive lower bound
    pub min_xp: u64,
    /// Inclusive upper bound, `None` for the open-ended top level
    pub max_xp: Option<u64>,
    pub icon: String,
    pub rewards: Vec<Reward>,
}

impl Level {
    /// Whether a total falls inside this level's range
    pub fn contains(&self, total_xp: u64) -> bool {
        total_xp >= self.min_xp && self.max_xp.is_none_or(|max| total_xp <= max)
    }
}

/// Where a total sits between its level and the next
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelProgress<'a> {
    pub current: &'a Level,
    /// `None` at the top level
    pub next: Option<&'a Level>,
    /// Percentage toward `next` (0-100, 100 at the top level)
    pub percent: f64,
}

impl LevelProgress<'_> {
    /// XP still needed to reach the next level
    pub fn xp_to_next(&self, total_xp: u64) -> Option<u64> {
        self.next.map(|n| n.min_xp.saturating_sub(total_xp))
    }
}

static DEFAULT_LEVELS: Lazy<Vec<Level>> = Lazy::new(|| {
    vec![
        Level {
            level: 1,
            name: "Novice".into(),
            min_xp: 0,
            max_xp: Some(999),
            icon: "📘".into(),
            rewards: vec![Reward::badge(
                "welcome-badge",
                "Welcome Badge",
                "Your first step into learning!",
            )],
        },
        Level {
            level: 2,
            name: "Knowledge Seeker".into(),
            min_xp: 1000,
            max_xp: Some(2499),
            icon: "📚".into(),
            rewards: vec![
                Reward::coupon("seeker-coupon", 10, "SEEKER10", "10% discount on any course"),
                Reward::badge(
                    "seeker-badge",
                    "Knowledge Seeker Badge",
                    "Awarded for reaching Level 2",
                ),
            ],
        },
        Level {
            level: 3,
            name: "Skilled Learner".into(),
            min_xp: 2500,
            max_xp: Some(4999),
            icon: "💡".into(),
            rewards: vec![
                Reward::coupon("skilled-coupon", 15, "SKILLED15", "15% discount on any course"),
                Reward::feature(
                    "priority-support",
                    "Priority Support Access",
                    "Get faster response times from support",
                ),
            ],
        },
        Level {
            level: 4,
            name: "Master".into(),
            min_xp: 5000,
            max_xp: Some(9999),
            icon: "⭐".into(),
            rewards: vec![
                Reward::coupon("master-coupon", 20, "MASTER20", "20% discount on any course"),
                Reward::feature(
                    "early-access",
                    "Early Access to New Courses",
                    "Be the first to access newly released courses",
                ),
            ],
        },
        Level {
            level: 5,
            name: "Expert".into(),
            min_xp: 10000,
            max_xp: Some(19999),
            icon: "🏆".into(),
            rewards: vec![
                Reward::coupon(
                    "expert-coupon",
                    25,
                    "LEARNHUB25",
                    "25% discount on your next course purchase",
                ),
                Reward::feature(
                    "exclusive-newsletter",
                    "Weekly Educational Newsletter",
                    "Exclusive weekly newsletters with learning tips and curated content",
                ),
                Reward::feature(
                    "exclusive-blog",
                    "Premium Blog Access",
                    "Members-only blog posts covering advanced topics and case studies",
                ),
            ],
        },
        Level {
            level: 6,
            name: "Grandmaster".into(),
            min_xp: 20000,
            max_xp: Some(29999),
            icon: "👑".into(),
            rewards: vec![
                Reward::coupon(
                    "grandmaster-coupon",
                    30,
                    "GRANDMASTER30",
                    "30% discount on any course",
                ),
                Reward::feature(
                    "lifetime-access",
                    "VIP Lifetime Access",
                    "Lifetime access to all future courses and materials",
                ),
                Reward::feature(
                    "mentorship",
                    "Personal Mentorship Session",
                    "One-on-one session with an industry expert",
                ),
            ],
        },
        Level {
            level: 7,
            name: "Elite".into(),
            min_xp: 30000,
            max_xp: Some(44999),
            icon: "💎".into(),
            rewards: vec![
                Reward::coupon("elite-coupon", 35, "ELITE35", "35% discount on any course"),
                Reward::feature(
                    "priority-review",
                    "Priority Code Review",
                    "Get your projects reviewed by expert instructors",
                ),
            ],
        },
        Level {
            level: 8,
            name: "Sage".into(),
            min_xp: 45000,
            max_xp: None,
            icon: "🌟".into(),
            rewards: vec![Reward::coupon("sage-coupon", 40, "SAGE40", "40% discount on any course")],
        },
    ]
});

/// Ordered, non-overlapping level ranges, never empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelTable {
    levels: Vec<Level>,
}

impl Default for LevelTable {
    fn default() -> Self {
        Self { levels: DEFAULT_LEVELS.clone() }
    }
}

impl LevelTable {
    /// Build a table from levels, sorting them by threshold
    ///
    /// Returns `None` for an empty list.
    pub fn new(mut levels: Vec<Level>) -> Option<Self> {
        if levels.is_empty() {
            return None;
        }
        levels.sort_by_key(|l| l.min_xp);
        Some(Self { levels })
    }

    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// The highest level
    pub fn top(&self) -> &Level {
        &self.levels[self.levels.len() - 1]
    }

    fn index_for(&self, total_xp: u64) -> usize {
        // Ranges are sorted; the last one whose lower bound is reached wins
        let idx = self.levels.partition_point(|l| l.min_xp <= total_xp);
        match idx.checked_sub(1) {
            Some(i) if self.levels[i].contains(total_xp) => i,
            _ => 0,
        }
    }

    /// Level for a total, falling back to the first level if no range matches
    pub fn level_for(&self, total_xp: u64) -> &Level {
        &self.levels[self.index_for(total_xp)]
    }

    /// Current level, next level and percentage toward it
    pub fn progress_to_next(&self, total_xp: u64) -> LevelProgress<'_> {
        let idx = self.index_for(total_xp);
        let current = &self.levels[idx];
        let Some(next) = self.levels.get(idx + 1) else {
            return LevelProgress { current, next: None, percent: 100.0 };
        };

        let span = next.min_xp.saturating_sub(current.min_xp);
        let percent = if span == 0 {
            100.0
        } else {
            (total_xp.saturating_sub(current.min_xp) as f64 / span as f64 * 100.0).clamp(0.0, 100.0)
        };
        LevelProgress { current, next: Some(next), percent }
    }

    /// Rewards of every level reached so far, lowest level first
    pub fn rewards_unlocked(&self, total_xp: u64) -> Vec<&Reward> {
        let idx = self.index_for(total_xp);
        self.levels[..=idx].iter().flat_map(|l| l.rewards.iter()).collect()
    }
}
