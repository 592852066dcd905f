use std::fs::File;
use std::io::stdout;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use ratatui::{
    crossterm::{
        event::{self, Event},
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    },
    prelude::*,
};
use tracing::{trace, warn};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use viseur::{Action, Config, Gamelog, PlaybackMode, SettingsManager, Viseur};

use crate::input::Command;
use crate::stream::DeltaStream;

mod input;
mod stream;
mod ui;

const FRAME: Duration = Duration::from_millis(16);

#[derive(Parser)]
struct Args {
    /// Path to the gamelog JSON file
    gamelog: PathBuf,

    /// Read the gamelog as JSON lines that are still being written: the
    /// gamelog first, then one delta per line
    #[arg(long, default_value_t = false)]
    stream: bool,

    /// Path to the deployment config JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where the settings are kept between runs
    #[arg(long, default_value = "viseur-settings.json")]
    settings: PathBuf,

    /// Overrides a setting, e.g. "playbackSpeed=250". Can be repeated
    #[arg(long = "set")]
    overrides: Vec<String>,

    /// Milliseconds per delta
    #[arg(long)]
    speed: Option<f64>,

    /// Step by "deltas" or by "turns"
    #[arg(long)]
    mode: Option<PlaybackMode>,

    /// A log level among "off", "error", "warn", "info", "debug", "trace"
    #[arg(short, long, default_value = "info")]
    log_level: LevelFilter,

    /// The terminal belongs to the visualizer, so logs go to this file
    #[arg(long, default_value = "viseur.log")]
    log_file: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    initialize_logging(args.log_level, &args.log_file)?;

    let mut settings = SettingsManager::load(&args.settings)?;
    for assignment in &args.overrides {
        settings
            .apply_override(assignment)
            .with_context(|| format!("Bad setting override {:?}", assignment))?;
    }
    if let Some(speed) = args.speed {
        settings.set_playback_speed(speed);
    }
    if let Some(mode) = args.mode {
        settings.set_playback_mode(mode);
    }
    // the visualizer starts from these settings, not from changes to them
    settings.drain_changes();

    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Could not read the config {}", path.display()))?,
        None => Config::default(),
    };

    let (gamelog, stream) = if args.stream {
        let (gamelog, stream) = DeltaStream::open(&args.gamelog)?;
        (gamelog, Some(stream))
    } else {
        let gamelog = Gamelog::load(&args.gamelog)
            .with_context(|| format!("Could not read the gamelog {}", args.gamelog.display()))?;
        (gamelog, None)
    };

    let mut viseur = Viseur::new(settings, config);

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let result = run(&mut viseur, gamelog, stream);
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    viseur.settings().save()?;
    result
}

fn run(viseur: &mut Viseur, gamelog: Gamelog, mut stream: Option<DeltaStream>) -> anyhow::Result<()> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let (width, height) = ui::window_pixels(terminal.size()?);
    viseur.handle(Action::ResizeWindow(width, height), Instant::now())?;
    // a gamelog that fails to load is shown in the error modal
    if let Err(err) = viseur.load_gamelog(gamelog, Instant::now()) {
        warn!("{:#}", err);
    }

    loop {
        let now = Instant::now();
        if stream.as_mut().is_some_and(|deltas| deltas.pump(viseur, now)) {
            stream = None;
        }

        viseur.update(now)?;
        viseur.render(now)?;
        for event in viseur.drain_events() {
            trace!(?event);
        }
        terminal.draw(|frame| ui::draw(frame, viseur, now))?;

        if event::poll(FRAME)? {
            match event::read()? {
                Event::Key(key) => match input::command(key, viseur) {
                    Some(Command::Quit) => return Ok(()),
                    Some(Command::Action(action)) => viseur.handle(action, Instant::now())?,
                    None => {}
                },
                Event::Resize(columns, rows) => {
                    let (width, height) = ui::window_pixels(Rect::new(0, 0, columns, rows));
                    viseur.handle(Action::ResizeWindow(width, height), Instant::now())?;
                }
                _ => {}
            }
        }
    }
}

fn initialize_logging(level: LevelFilter, path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Could not create the log file {}", path.display()))?;

    let format = tracing_subscriber::fmt::format()
        .with_target(false)
        .compact();

    let filter = Targets::new().with_default(level);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(format)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .with(filter)
        .init();
    Ok(())
}
