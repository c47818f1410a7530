use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use learnhub::course::Course;
use learnhub::engine::{EngineEvent, QuizOutcome, events, watch_percent};
use learnhub::progress::FileBackend;
use learnhub::quiz::QuizSession;
use learnhub::tracker::{SimulatedPlayer, StopReason, WatchTracker};
use learnhub::{Config, CourseEngine, SharedEngine};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Engine = SharedEngine<FileBackend>;

#[derive(Parser)]
#[command(name = "learnhub")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Use this config file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List courses with progress
    Courses,
    /// Show lesson status for a course
    Status {
        course: String,
    },
    /// Simulate watching a video lesson
    Watch {
        course: String,
        lesson: String,
        /// Playback speed multiplier
        #[arg(short, long, default_value_t = 1.0)]
        speed: f64,
        /// Start position in seconds
        #[arg(long, default_value_t = 0.0)]
        from: f64,
    },
    /// Show a quiz, or submit answers to it
    Quiz {
        course: String,
        lesson: String,
        /// Answer as QUESTION=OPTION, repeatable
        #[arg(short, long = "answer", value_parser = parse_answer)]
        answers: Vec<(String, String)>,
    },
    /// Show level, rewards, badges and milestones
    Level,
    /// Force-unlock a lesson
    Unlock {
        course: String,
        lesson: String,
    },
    /// Force-lock a lesson and clear its completion
    Lock {
        course: String,
        lesson: String,
    },
    /// Mark a lesson completed
    Complete {
        course: String,
        lesson: String,
    },
    /// Delete progress for a lesson, or a whole course
    Reset {
        course: String,
        lesson: Option<String>,
    },
}

fn parse_answer(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((q, o)) if !q.is_empty() && !o.is_empty() => Ok((q.to_string(), o.to_string())),
        _ => Err(format!("expected QUESTION=OPTION, got '{s}'")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "learnhub=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let catalog = config.catalog()?;
    let backend = FileBackend::open_default(&config)?;
    tracing::debug!("Progress file: {:?}", backend.path());

    let (tx, rx) = events::channel();
    let engine = CourseEngine::from_config(&config, catalog, backend).with_listener(tx).into_shared();
    let printer = tokio::spawn(print_events(rx));

    let result = run(cli.command, &engine, &config).await;

    // Closing the last sender ends the printer
    drop(engine);
    printer.await.context("Event printer panicked")?;
    result
}

async fn run(command: Commands, engine: &Engine, config: &Config) -> Result<()> {
    match command {
        Commands::Courses => {
            let engine = engine.lock().await;
            for course in &engine.catalog().courses {
                let summary = engine.course_summary(&course.id)?;
                println!(
                    "{:>3}  {:<32} {:>5.1}%  {:>5}/{:<5} XP  {}",
                    course.id,
                    course.title,
                    summary.percent,
                    summary.earned_xp,
                    summary.total_xp,
                    access_label(course)
                );
            }
        }
        Commands::Status { course } => {
            let engine = engine.lock().await;
            let catalog_course = engine.catalog().course(&course)?;
            let records = engine.course_records(&course)?;
            println!("{}", catalog_course.title);

            for (lesson_id, status) in engine.lesson_statuses(&course)? {
                let Some(lesson) = catalog_course.lesson(&lesson_id) else {
                    continue;
                };
                let record = records.get(&lesson_id).cloned().unwrap_or_default();
                let detail = match record.score_percent {
                    Some(score) if lesson.is_quiz() => format!("best {score}%"),
                    _ => format!(
                        "{:.0}%",
                        watch_percent(record.watched_seconds, lesson.duration_seconds())
                    ),
                };
                println!(
                    "  {} {:<6} {:<40} {:>8} {:>5} XP",
                    status.glyph(),
                    lesson.id,
                    lesson.title,
                    detail,
                    lesson.xp
                );
            }

            let summary = engine.course_summary(&course)?;
            println!(
                "{}/{} lessons, {}/{} XP{}",
                summary.completed_lessons,
                summary.lesson_count,
                summary.earned_xp,
                summary.total_xp,
                if summary.is_certificate_eligible() { ", certificate available" } else { "" }
            );
        }
        Commands::Watch { course, lesson, speed, from } => {
            watch(engine, config, &course, &lesson, speed, from).await?;
        }
        Commands::Quiz { course, lesson, answers } => {
            quiz(engine, &course, &lesson, answers).await?;
        }
        Commands::Level => {
            let engine = engine.lock().await;
            let state = engine.level_state();
            println!(
                "{} Level {} {} ({} XP, {:.0}%)",
                state.level.icon, state.level.level, state.level.name, state.total_xp, state.percent
            );
            if let (Some(next), Some(needed)) = (&state.next, state.xp_to_next()) {
                println!("  {} XP to {}", needed, next.name);
            }
            for reward in &state.rewards {
                match &reward.code {
                    Some(code) => println!("  reward: {} ({})", reward.title, code),
                    None => println!("  reward: {}", reward.title),
                }
            }
            for badge in engine.badges() {
                let mark = if badge.earned { "✓" } else { "○" };
                println!("  {} {} {} - {}", mark, badge.icon, badge.name, badge.description);
            }
            for milestone in engine.milestones() {
                println!(
                    "  {} {}/{} {}",
                    if milestone.completed { "✓" } else { "○" },
                    milestone.progress,
                    milestone.target,
                    milestone.title
                );
            }
        }
        Commands::Unlock { course, lesson } => {
            engine.lock().await.force_unlock(&course, &lesson)?;
            println!("Unlocked {course}/{lesson}");
        }
        Commands::Lock { course, lesson } => {
            engine.lock().await.force_lock(&course, &lesson)?;
            println!("Locked {course}/{lesson}");
        }
        Commands::Complete { course, lesson } => {
            if !engine.lock().await.mark_complete(&course, &lesson)? {
                println!("{course}/{lesson} was already complete");
            }
        }
        Commands::Reset { course, lesson } => {
            let mut engine = engine.lock().await;
            match lesson {
                Some(lesson) => {
                    engine.reset_lesson(&course, &lesson)?;
                    println!("Reset {course}/{lesson}");
                }
                None => {
                    let removed = engine.reset_course(&course)?;
                    println!("Reset {removed} lessons in course {course}");
                }
            }
        }
    }
    Ok(())
}

async fn watch(
    engine: &Engine,
    config: &Config,
    course: &str,
    lesson: &str,
    speed: f64,
    from: f64,
) -> Result<()> {
    let target = engine.lock().await.accessible_video(course, lesson)?;
    let duration = target.duration_seconds();
    if duration <= 0.0 {
        bail!("Lesson {course}/{lesson} is not a playable video");
    }

    let player = SimulatedPlayer::new(duration).with_speed(speed);
    player.seek(from);
    player.play();

    let mut tracker = WatchTracker::new(engine.clone(), config.tick_interval());
    tracker.start(course, lesson, player).await?;
    println!("Watching {course}/{lesson} at {speed}x, Ctrl-C to stop");

    let finished = tokio::select! {
        summary = tracker.finished() => summary,
        _ = tokio::signal::ctrl_c() => None,
    };
    let summary = match finished {
        Some(summary) => Some(summary),
        None => tracker.stop_and_wait().await,
    };

    if let Some(summary) = summary {
        println!(
            "Stopped ({}) at {:.0}s, {:.1}% watched",
            match &summary.reason {
                StopReason::Cancelled => "interrupted".to_string(),
                StopReason::Paused => "paused".to_string(),
                StopReason::Ended => "ended".to_string(),
                StopReason::Failed(e) => format!("failed: {e}"),
            },
            summary.watched_seconds,
            summary.percent
        );
    }
    Ok(())
}

async fn quiz(
    engine: &Engine,
    course: &str,
    lesson: &str,
    answers: Vec<(String, String)>,
) -> Result<()> {
    let mut session = QuizSession::begin(engine.clone(), course, lesson).await?;

    if answers.is_empty() {
        let quiz = session.quiz();
        println!("{} (pass at {}%)", quiz.title, quiz.passing_score);
        if let Some(limit) = quiz.time_limit_seconds {
            println!("Time limit: {}s", limit);
        }
        for question in &quiz.questions {
            println!("\n{} {} ({} pts)", question.id, question.prompt, question.points);
            for option in &question.options {
                println!("  {}  {}", option.id, option.text);
            }
        }
        println!("\nSubmit with --answer QUESTION=OPTION");
        return Ok(());
    }

    let answers: HashMap<String, String> = answers.into_iter().collect();
    for (question_id, option_id) in &answers {
        if !session.select(question_id, option_id) {
            tracing::warn!("Ignoring answer for unknown question {}", question_id);
        }
    }
    let outcome = session.submit().await?;
    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &QuizOutcome) {
    let result = &outcome.result;
    println!(
        "{}: {}% ({}/{} pts, {} of {} correct)",
        if result.passed { "Passed" } else { "Failed" },
        result.score_percent,
        result.earned_points,
        result.max_points,
        result.correct_count(),
        result.questions.len()
    );
    for question in &result.questions {
        println!(
            "  {} {} -> {}",
            if question.correct { "✓" } else { "✗" },
            question.question_id,
            question.selected.as_deref().unwrap_or("-")
        );
    }
    if outcome.xp_awarded > 0 {
        println!("+{} XP (best {}%)", outcome.xp_awarded, outcome.best_score);
    }
    if let Some(next) = &outcome.unlocked_next {
        println!("Unlocked {next}");
    }
}

fn access_label(course: &Course) -> &'static str {
    match (course.enrolled || course.purchased, course.free_preview) {
        (true, _) => "enrolled",
        (false, true) => "preview",
        (false, false) => "locked",
    }
}

async fn print_events(mut rx: UnboundedReceiver<EngineEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            EngineEvent::ProgressUpdate { percent, lesson_id } => {
                println!("  {lesson_id}: {percent:.1}%");
            }
            EngineEvent::LessonComplete { lesson_id } => println!("✓ Lesson {lesson_id} complete"),
            EngineEvent::QuizComplete { passed, quiz_id, score_percent } => {
                tracing::debug!("Quiz {} scored {}% (passed: {})", quiz_id, score_percent, passed);
            }
            EngineEvent::LevelUp { level, name } => println!("★ Level up! Level {level}: {name}"),
            EngineEvent::CourseComplete { course_id } => {
                println!("🏆 Course {course_id} complete, certificate available");
            }
        }
    }
}
