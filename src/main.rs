use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;

use piggybank::clock::SystemClock;
use piggybank::config::Config;
use piggybank::engine::catalog::find_definition;
use piggybank::engine::leveling::progress_to_next;
use piggybank::engine::{ActionReport, ProgressionEngine};
use piggybank::store::UserStats;
use piggybank::event::{AppEvent, EventHandler};
use piggybank::feedback::LogFeedback;
use piggybank::store::JsonFileStore;

#[derive(Parser)]
#[command(
    name = "piggybank",
    version,
    about = "XP, levels, streaks and achievements for young savers"
)]
struct Cli {
    #[arg(long, help = "Directory holding the persisted progress records")]
    data_dir: Option<PathBuf>,

    #[arg(short, long, help = "Log at debug level")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the current stats snapshot
    Status,
    /// List achievements
    Achievements {
        #[arg(long, conflicts_with = "unlocked")]
        locked: bool,
        #[arg(long)]
        unlocked: bool,
    },
    /// Complete a chore and earn its reward
    Chore { reward: f64 },
    /// Complete a lesson and earn its payout
    Lesson { earnings: f64 },
    /// Undo today's chore streak mark
    UncompleteChore,
    /// Undo today's learning streak mark
    UncompleteLesson,
    /// Record an investment in the market simulator
    Invest,
    /// Record a profitable trade
    Trade,
    /// Record a correct quiz answer
    Quiz,
    /// Grant XP directly
    AddXp {
        amount: u32,
        #[arg(default_value = "Bonus")]
        source: String,
    },
    /// Report progress on one achievement
    Check {
        id: String,
        progress: u32,
        #[arg(long, help = "Latch the unlock without granting its reward")]
        no_reward: bool,
    },
    /// Write a config file with default values
    InitConfig,
    /// Read commands from stdin, one per line
    Interactive,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let mut config = Config::load()?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir.to_string_lossy().to_string();
    }

    if let Command::InitConfig = cli.command {
        config.save()?;
        println!("{}", Config::config_path().display());
        return Ok(());
    }

    let store = JsonFileStore::with_base_dir(PathBuf::from(&config.data_dir))
        .with_context(|| format!("opening data dir {}", config.data_dir))?;
    let mut engine = ProgressionEngine::open(
        SystemClock,
        store,
        LogFeedback,
        config.engine_settings(),
    );

    match cli.command {
        Command::Interactive => run_interactive(&mut engine)?,
        command => {
            let output = run_command(&mut engine, command)?;
            println!("{output}");
        }
    }

    engine.shutdown();
    Ok(())
}

fn run_command(engine: &mut ProgressionEngine, command: Command) -> Result<String> {
    let json = match command {
        Command::Status => to_json(&StatusView {
            stats: engine.stats(),
            level_progress: progress_to_next(engine.stats()),
            unlocked_achievements: engine.unlocked_achievements().len(),
            total_achievements: engine.achievements().len(),
        })?,
        Command::Achievements { locked, unlocked } => {
            let list: Vec<_> = if locked {
                engine.locked_achievements()
            } else if unlocked {
                engine.unlocked_achievements()
            } else {
                engine.achievements().iter().collect()
            };
            to_json(&list)?
        }
        Command::Chore { reward } => report(engine.complete_chore(reward))?,
        Command::Lesson { earnings } => report(engine.complete_lesson(earnings))?,
        Command::UncompleteChore => report(engine.uncomplete_chore())?,
        Command::UncompleteLesson => report(engine.uncomplete_lesson())?,
        Command::Invest => report(engine.make_investment())?,
        Command::Trade => report(engine.profitable_trade())?,
        Command::Quiz => report(engine.correct_quiz_answer())?,
        Command::AddXp { amount, source } => report(engine.add_xp(amount, &source))?,
        Command::Check {
            id,
            progress,
            no_reward,
        } => {
            if find_definition(&id).is_none() {
                bail!("unknown achievement id: {id}");
            }
            if no_reward {
                report(engine.record_progress(&id, progress))?
            } else {
                report(engine.check_achievement(&id, progress))?
            }
        }
        Command::InitConfig | Command::Interactive => bail!("not available here"),
    };
    Ok(json)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusView<'a> {
    #[serde(flatten)]
    stats: &'a UserStats,
    level_progress: f64,
    unlocked_achievements: usize,
    total_achievements: usize,
}

fn report(report: ActionReport) -> Result<String> {
    to_json(&report)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Line-oriented session: each line is parsed as a subcommand, plus
/// `notifications`, `dismiss <id>` and `quit`. Idle ticks drive the debounce
/// and notification timers.
fn run_interactive(engine: &mut ProgressionEngine) -> Result<()> {
    let events = EventHandler::stdin(Duration::from_millis(100));
    loop {
        match events.next() {
            AppEvent::Line(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if matches!(line, "quit" | "exit") {
                    return Ok(());
                }
                if line == "notifications" {
                    println!("{}", to_json(&engine.notifications())?);
                    continue;
                }
                if let Some(id) = line.strip_prefix("dismiss ") {
                    match id.trim().parse::<u64>() {
                        Ok(id) if engine.dismiss_notification(id) => {}
                        Ok(id) => eprintln!("no notification with id {id}"),
                        Err(e) => eprintln!("Error: {e}"),
                    }
                    continue;
                }
                let args = std::iter::once("piggybank").chain(line.split_whitespace());
                match Cli::try_parse_from(args) {
                    Ok(parsed) => match run_command(engine, parsed.command) {
                        Ok(output) => println!("{output}"),
                        Err(e) => eprintln!("Error: {e}"),
                    },
                    Err(e) => eprintln!("{e}"),
                }
            }
            AppEvent::Tick => engine.tick(),
            AppEvent::Eof => return Ok(()),
        }
    }
}
