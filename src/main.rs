//! staktrak - Playwright test generation from recorded interactions

use staktrak::app::cli::{Cli, Commands, ConfigAction};
use staktrak::app::config::Config;
use staktrak::capture::trace::Trace;
use staktrak::codegen::{convert_to_playwright_selector, generate_playwright_test_with, SynthesisOptions};
use staktrak::controller::NoticeLevel;
use staktrak::workflow::{replay_session, Session};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first so we can use --verbose to set log level
    let cli = Cli::parse_args();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = if let Some(path) = &cli.config {
        Config::load(path)?
    } else {
        Config::load_default()?
    };

    match cli.command {
        Commands::Generate {
            input,
            url,
            output,
            name,
        } => run_generate(&input, &url, output, name, &config)?,
        Commands::Replay {
            session,
            output,
            trace_output,
        } => run_replay(&session, output, trace_output, &config)?,
        Commands::Selector { raw } => {
            println!("{}", convert_to_playwright_selector(&raw));
        }
        Commands::Init { force } => run_init(force, &config)?,
        Commands::Config { action } => run_config(action, &config, cli.config.as_deref())?,
    }

    Ok(())
}

fn write_output(source: &str, output: Option<PathBuf>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, source)?;
            info!("Wrote {}", path.display());
        }
        None => print!("{}", source),
    }
    Ok(())
}

fn run_generate(
    input: &Path,
    url: &str,
    output: Option<PathBuf>,
    name: Option<String>,
    config: &Config,
) -> anyhow::Result<()> {
    info!("Loading trace from {:?}", input);
    let trace = Trace::load(input)?;
    info!(
        clicks = trace.clicks.count(),
        inputs = trace.input_changes.len(),
        assertions = trace.assertions.len(),
        "Trace loaded"
    );

    let mut options = SynthesisOptions::from(&config.synthesizer);
    if let Some(name) = name {
        options.test_name = name;
    }

    let source = generate_playwright_test_with(url, &trace, &options);
    write_output(&source, output)
}

fn run_replay(
    session_path: &Path,
    output: Option<PathBuf>,
    trace_output: Option<PathBuf>,
    config: &Config,
) -> anyhow::Result<()> {
    let session = Session::load(session_path)?;
    info!(
        name = %session.metadata.name,
        frames = session.frames.len(),
        steps = session.script.len(),
        "Session loaded"
    );

    let outcome = replay_session(session, config)?;
    for notice in &outcome.notices {
        match notice.level {
            NoticeLevel::Info => info!("{}", notice.message),
            NoticeLevel::Warning | NoticeLevel::Error => warn!("{}", notice.message),
        }
    }

    let Some(source) = outcome.generated_test else {
        anyhow::bail!("Session never stopped a recording; no test was generated");
    };

    if let (Some(path), Some(trace)) = (trace_output, outcome.trace.as_ref()) {
        trace.save(&path)?;
        info!("Wrote merged trace to {}", path.display());
    }
    write_output(&source, output)
}

fn run_init(force: bool, config: &Config) -> anyhow::Result<()> {
    let config_path = Config::default_path();

    if config_path.exists() && !force {
        warn!("Config already exists at {:?}", config_path);
        warn!("Use --force to overwrite");
        return Ok(());
    }

    config.save_default()?;
    info!("Created config at {:?}", config_path);
    println!("Configuration written to {}", config_path.display());

    Ok(())
}

fn run_config(action: ConfigAction, config: &Config, path: Option<&Path>) -> anyhow::Result<()> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_path);

    match action {
        ConfigAction::Show => {
            println!("Configuration ({:?}):\n", config_path);
            println!("{}", config.to_toml()?);
        }
        ConfigAction::Get { key } => match config.get(&key) {
            Some(value) => println!("{} = {}", key, value),
            None => anyhow::bail!("Configuration key '{}' not found", key),
        },
        ConfigAction::Set { key, value } => {
            if !config_path.exists() {
                anyhow::bail!("No config file found. Run 'staktrak init' first.");
            }
            let mut updated = config.clone();
            updated.set(&key, &value)?;
            updated.save(&config_path)?;
            println!("Set {} = {}", key, updated.get(&key).unwrap_or(value));
        }
        ConfigAction::Reset { force } => {
            if config_path.exists() && !force {
                println!("Config exists at {:?}", config_path);
                println!("Use --force to reset to defaults");
                return Ok(());
            }

            Config::default().save(&config_path)?;
            println!("Configuration reset to defaults at {:?}", config_path);
        }
    }

    Ok(())
}
