mod console;
mod loader;
mod storage;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use console::{Console, Outcome, Summary};
use loader::DirLoader;
use storage::DirStorage;
use westward_game::{
    Difficulty, GameAssets, GameStorage, Pace, SaveData, SaveDataBuilder, ScreenQueue,
    SessionHost, load_assets,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DifficultyArg {
    Easy,
    Normal,
    Hard,
}

impl From<DifficultyArg> for Difficulty {
    fn from(value: DifficultyArg) -> Self {
        match value {
            DifficultyArg::Easy => Self::Easy,
            DifficultyArg::Normal => Self::Normal,
            DifficultyArg::Hard => Self::Hard,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PaceArg {
    /// Fewer miles, less food
    Leisurely,
    Normal,
    /// More miles, more food
    Quick,
}

impl From<PaceArg> for Pace {
    fn from(value: PaceArg) -> Self {
        match value {
            PaceArg::Leisurely => Self::Leisurely,
            PaceArg::Normal => Self::Normal,
            PaceArg::Quick => Self::Quick,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "westward-runner", version)]
#[command(about = "Run a Westward journey headlessly with an autopilot party")]
struct Args {
    /// Seed for party creation and every random stream of the journey
    #[arg(long, default_value_t = 1848)]
    seed: u64,

    #[arg(long, value_enum, default_value_t = DifficultyArg::Normal)]
    difficulty: DifficultyArg,

    #[arg(long, value_enum, default_value_t = PaceArg::Normal)]
    pace: PaceArg,

    /// Name of the save record
    #[arg(long, default_value = "westward")]
    save_name: String,

    /// Directory with JSON catalogs overriding the bundled ones
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory holding save records
    #[arg(long, default_value = "target/westward-saves")]
    save_dir: PathBuf,

    /// Resume the save named by --save-name instead of starting a new party
    #[arg(long)]
    load: bool,

    /// Stop and save after this many days
    #[arg(long)]
    max_days: Option<u32>,

    /// Milliseconds to linger on each travelled mile
    #[arg(long)]
    frame_ms: Option<u64>,

    /// Only print the summary
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    announce_banner();

    let assets = resolve_assets(&args)?;
    let storage = DirStorage::open(&args.save_dir)
        .with_context(|| format!("opening save directory {}", args.save_dir.display()))?;
    let save = resolve_save(&args, &assets, &storage)?;
    log::info!(
        "journey `{}` with {} members from mile {}",
        save.save_name,
        save.members.len(),
        save.mile
    );

    let queue = Arc::new(ScreenQueue::new());
    let host = Arc::new(SessionHost::new(assets, storage, Arc::clone(&queue)));
    let shutdown = Arc::new(AtomicBool::new(false));
    let simulation = {
        let host = Arc::clone(&host);
        let shutdown = Arc::clone(&shutdown);
        thread::Builder::new()
            .name("westward-simulation".to_string())
            .spawn(move || host.run_simulation(&shutdown))
            .context("spawning simulation thread")?
    };

    host.start_session(save, args.seed)?;
    let pace = Pace::from(args.pace);
    host.with_session_mut(|session| session.set_pace(pace));

    let summary = Console::new(Arc::clone(&host), args.seed, args.max_days, args.quiet).run();

    shutdown.store(true, Ordering::Release);
    host.halt();
    if simulation.join().is_err() {
        bail!("simulation thread panicked");
    }

    print_summary(&summary?);
    Ok(())
}

fn announce_banner() {
    println!("{}", "Westward".bright_cyan().bold());
    println!("{}", "=".repeat(40).bright_cyan());
}

fn resolve_assets(args: &Args) -> Result<GameAssets> {
    let mut assets = match &args.data_dir {
        Some(dir) => load_assets(&DirLoader::new(dir))
            .with_context(|| format!("loading assets from {}", dir.display()))?,
        None => GameAssets::bundled()?,
    };
    if let Some(frame_ms) = args.frame_ms {
        let mut config = (*assets.config).clone();
        config.mile_delay_ms = frame_ms;
        assets.config = Arc::new(config);
    }
    Ok(assets)
}

fn resolve_save(args: &Args, assets: &GameAssets, storage: &DirStorage) -> Result<SaveData> {
    if args.load {
        return storage
            .load(&args.save_name)
            .with_context(|| format!("loading save `{}`", args.save_name))?
            .with_context(|| format!("no save named `{}` in {}", args.save_name, storage.root().display()));
    }
    if !DirStorage::is_valid_name(&args.save_name) {
        bail!("`{}` is not a valid save name", args.save_name);
    }
    let mut builder = SaveDataBuilder::new(&assets.catalog, &assets.config, args.seed)
        .save_name(args.save_name.clone())
        .difficulty(args.difficulty.into());
    for _ in 0..assets.config.party_size {
        builder = builder.add_random_member();
    }
    builder.build().context("creating a new party")
}

fn print_summary(summary: &Summary) {
    let outcome = match summary.outcome {
        Outcome::Victory => summary.outcome.to_string().bright_green().bold(),
        Outcome::Loss => summary.outcome.to_string().red().bold(),
        Outcome::Saved | Outcome::Abandoned => summary.outcome.to_string().yellow().bold(),
    };
    let snapshot = &summary.snapshot;
    println!();
    println!("{} {outcome}", "Outcome:".bold());
    println!("{} {}", "Days:".bold(), summary.days);
    println!("{} {}", "Date:".bold(), snapshot.date);
    println!("{} {}/{}", "Mile:".bold(), snapshot.mile, snapshot.total_miles);
    println!("{} {}", "Score:".bold(), snapshot.score);
    if snapshot.survivors.is_empty() {
        println!("{} none", "Survivors:".bold());
    } else {
        println!("{} {}", "Survivors:".bold(), snapshot.survivors.join(", "));
    }
}
