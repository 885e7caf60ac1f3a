//! gensynth: terminal host for interchangeable generative-art plugins.
//!
//! `gensynth` (or `gensynth run`) opens the TUI on the remembered plugin.
//! Logs go to a file so they never tear the terminal UI.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use gensynth::config::Config;
use gensynth::engine::Engine;
use gensynth::error::{GenSynthError, Result};
use gensynth::persist::store::default_settings_path;
use gensynth::persist::{FileStorage, SettingsEnvelope, SettingsStorage};
use gensynth::plugin::builtin_catalog;
use gensynth::tui::{self, App, CellSurface, StartupRequest};

/// Terminal size used when the real one cannot be queried.
const FALLBACK_SIZE: (u16, u16) = (80, 24);

#[derive(Parser, Debug)]
#[command(author, version, long_about = None)]
#[command(about = "Generative-art plugins in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Open the interactive canvas.
    Run {
        /// Plugin to open instead of the remembered one.
        #[arg(long)]
        plugin: Option<String>,
        /// Share payload to load on start.
        #[arg(long)]
        share: Option<String>,
    },
    /// List the bundled plugins.
    Plugins,
    /// Print a share payload for a plugin's stored settings.
    Share {
        #[arg(long)]
        plugin: Option<String>,
    },
    /// Forget every stored parameter setting.
    Reset,
}

fn main() {
    let cli = Cli::parse();
    let (config, config_error) = match Config::load() {
        Ok(config) => (config.unwrap_or_default(), None),
        Err(err) => (Config::default(), Some(err)),
    };
    init_logging(&config.log_path());
    if let Some(err) = config_error {
        log::warn!("ignoring malformed config.yaml: {err}");
    }

    let result = match cli.command.unwrap_or(Commands::Run {
        plugin: None,
        share: None,
    }) {
        Commands::Run { plugin, share } => run(&config, plugin.as_deref(), share.as_deref()),
        Commands::Plugins => {
            for (id, name) in builtin_catalog().list() {
                println!("{id:<10} {name}");
            }
            Ok(())
        }
        Commands::Share { plugin } => print_share(&config, plugin.as_deref()),
        Commands::Reset => reset(&config),
    };

    if let Err(e) = result {
        log::error!("{e}");
        eprintln!("gensynth: {e}");
        std::process::exit(1);
    }
}

fn init_logging(path: &Path) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        // stderr would draw over the TUI
        Err(_) => {
            builder.filter_level(log::LevelFilter::Off);
        }
    }
    let _ = builder.try_init();
}

fn settings_path(config: &Config) -> PathBuf {
    config
        .settings_path
        .clone()
        .unwrap_or_else(default_settings_path)
}

/// Plugin id remembered by the last session.
fn stored_selection(storage: &FileStorage) -> Option<String> {
    let text = storage.read().ok().flatten()?;
    SettingsEnvelope::parse(&text).selected
}

fn run(config: &Config, plugin: Option<&str>, share: Option<&str>) -> Result<()> {
    let catalog = builtin_catalog();
    let storage = FileStorage::new(settings_path(config));
    let stored = stored_selection(&storage);

    let request = StartupRequest {
        share,
        plugin,
        stored: stored.as_deref(),
        default_plugin: &config.default_plugin,
    };
    let fallback = request.default_plugin;
    let startup = request
        .resolve(&catalog)
        .ok_or_else(|| GenSynthError::UnknownPlugin(fallback.to_string()))?;

    let (cols, rows) = crossterm::terminal::size().unwrap_or(FALLBACK_SIZE);
    let mut engine = Engine::new(
        catalog.create(&startup.plugin_id)?,
        CellSurface::new(cols, rows),
        Box::new(storage),
        config.engine_config(),
    )?;
    let (width, height) = engine.surface().logical_size();
    engine.init(width, height);
    if let Some(settings) = &startup.shared {
        engine.apply_shared_settings(settings);
    }

    let mut app = App::new(engine, catalog, config.playback_speeds());
    tui::run_app(&mut app)?;
    Ok(())
}

fn print_share(config: &Config, plugin: Option<&str>) -> Result<()> {
    let catalog = builtin_catalog();
    let storage = FileStorage::new(settings_path(config));
    let stored = stored_selection(&storage);
    let default_plugin = config.default_plugin.as_str();
    let id = match plugin {
        Some(id) => id.to_string(),
        None => catalog
            .resolve([stored.as_deref(), Some(default_plugin)])
            .ok_or_else(|| GenSynthError::UnknownPlugin(default_plugin.to_string()))?
            .to_string(),
    };

    let (cols, rows) = FALLBACK_SIZE;
    let mut engine = Engine::new(
        catalog.create(&id)?,
        CellSurface::new(cols, rows),
        Box::new(storage),
        config.engine_config(),
    )?;
    let (width, height) = engine.surface().logical_size();
    engine.init(width, height);
    // read-only: the engine is dropped without flushing
    println!("{}", engine.share_payload()?);
    Ok(())
}

fn reset(config: &Config) -> Result<()> {
    let mut storage = FileStorage::new(settings_path(config));
    storage.remove()?;
    println!("cleared {}", storage.path().display());
    Ok(())
}
