use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::config::{BlockScope, InterpreterConfig, NumericMode};
use crate::host::{HeadlessHost, HeadlessSprite};
use crate::interpreter::PlanetInterpreter;
use crate::texture_sync::HttpFetcher;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a planet script and print the resulting scene as JSON
    Inspect {
        /// PlanetLang script
        script: PathBuf,

        #[command(flatten)]
        options: ParseOptions,

        /// Bind a headless sprite to an id (NAME=ID); textures are fetched
        /// and installed on it
        #[arg(long = "bind", value_name = "NAME=ID", value_parser = parse_binding)]
        bindings: Vec<(String, String)>,
    },
    /// Fetch the texture of an object or background and print it
    Texture {
        /// PlanetLang script
        script: PathBuf,

        /// Object or background id
        id: String,

        #[command(flatten)]
        options: ParseOptions,
    },
}

#[derive(clap::Args)]
struct ParseOptions {
    /// JSON interpreter config
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override how long a block stays open
    #[arg(long, value_enum)]
    block_scope: Option<BlockScope>,

    /// Override how coordinate fields are read
    #[arg(long, value_enum)]
    numeric: Option<NumericMode>,
}

impl ParseOptions {
    fn resolve(&self) -> Result<InterpreterConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = read_text(path)?;
                InterpreterConfig::from_json(&text)
                    .with_context(|| format!("invalid config {}", path.display()))?
            }
            None => InterpreterConfig::default(),
        };
        if let Some(scope) = self.block_scope {
            config = config.with_block_scope(scope);
        }
        if let Some(numeric) = self.numeric {
            config = config.with_numeric(numeric);
        }
        Ok(config)
    }
}

fn parse_binding(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, id)) if !name.is_empty() && !id.is_empty() => {
            Ok((name.to_string(), id.to_string()))
        }
        _ => Err(format!("expected NAME=ID, got {:?}", raw)),
    }
}

/// Install the global logger. `RUST_LOG` wins over `--verbose`.
pub fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
}

pub fn run(cli: Cli) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    match cli.command {
        Commands::Inspect { script, options, bindings } => {
            runtime.block_on(inspect(&script, &options, &bindings))?;
        }
        Commands::Texture { script, id, options } => {
            runtime.block_on(texture(&script, &id, &options))?;
        }
    }
    Ok(())
}

async fn inspect(script_path: &Path, options: &ParseOptions, bindings: &[(String, String)]) -> Result<()> {
    let config = options.resolve()?;
    let script = read_text(script_path)?;

    let mut host = HeadlessHost::new();
    for (name, _) in bindings {
        if host.sprite(name).is_none() {
            host = host.with_sprite(HeadlessSprite::new(name.as_str()));
        }
    }

    let mut interpreter = PlanetInterpreter::with_config(config, host, HttpFetcher::new()?);
    interpreter.parse(&script);
    for (name, id) in bindings {
        if interpreter.scene().background(id).is_some() {
            interpreter.bind_background(name, id);
        } else {
            interpreter.bind(name, id);
        }
    }

    let report = interpreter.flush_syncs().await;
    if report.total() > 0 {
        log::info!(
            "texture syncs: {} applied, {} failed, {} skipped",
            report.applied,
            report.failed,
            report.skipped
        );
    }
    for sprite in &interpreter.host().sprites {
        if let Some(costume) = sprite.current() {
            log::info!("{} wears {} ({})", sprite.name, costume.name, costume.asset_id);
        }
    }

    let json = serde_json::to_string_pretty(&interpreter.snapshot())?;
    println!("{}", json);
    Ok(())
}

async fn texture(script_path: &Path, id: &str, options: &ParseOptions) -> Result<()> {
    let config = options.resolve()?;
    let script = read_text(script_path)?;

    let mut interpreter = PlanetInterpreter::with_config(config, HeadlessHost::new(), HttpFetcher::new()?);
    interpreter.parse(&script);

    let data = interpreter.texture_data(id).await;
    if data.is_empty() {
        anyhow::bail!("no texture data for {:?}", id);
    }
    println!("{}", data);
    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    let mut file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_binding() {
        assert_eq!(
            parse_binding("Sprite1=rock"),
            Ok(("Sprite1".to_string(), "rock".to_string()))
        );
        assert!(parse_binding("Sprite1").is_err());
        assert!(parse_binding("=rock").is_err());
    }

    #[test]
    fn test_cli_parses_inspect_flags() {
        let cli = Cli::try_parse_from([
            "planetlang",
            "-v",
            "inspect",
            "world.planet",
            "--block-scope",
            "reset-after-content",
            "--numeric",
            "lenient",
            "--bind",
            "Sprite1=rock",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Inspect { script, options, bindings } => {
                assert_eq!(script, PathBuf::from("world.planet"));
                let config = options.resolve().unwrap();
                assert_eq!(config.block_scope, BlockScope::ResetAfterContent);
                assert_eq!(config.numeric, NumericMode::Lenient);
                assert_eq!(bindings, vec![("Sprite1".to_string(), "rock".to_string())]);
            }
            Commands::Texture { .. } => panic!("expected inspect"),
        }
    }
}
