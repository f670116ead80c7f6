use std::io::{self, BufRead};
use std::thread;

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{unbounded, Receiver};
use fluid::{Mood, PreviewConfig};
use moodconfig::{BackgroundConfig, MoodSettings};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    if cli.print_config {
        let rendered = toml::to_string(&config).context("failed to render configuration")?;
        print!("{rendered}");
        return Ok(());
    }

    let artwork_feed = if cli.stdin {
        Some(spawn_stdin_feed()?)
    } else {
        None
    };

    tracing::info!(
        artwork = ?cli.artwork,
        fallback = ?config.fallback,
        "starting fluidpaper"
    );
    fluid::run_preview(PreviewConfig {
        title: config.window.title.clone(),
        size: (config.window.width, config.window.height),
        mood: mood_from(&config.mood),
        artwork: cli.artwork,
        fallback: config.fallback,
        loader_timeout: config.loader.timeout,
        artwork_feed,
    })
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Reads the config file (if any) and layers command-line overrides on top.
pub fn load_config(cli: &Cli) -> Result<BackgroundConfig> {
    let mut config = match &cli.config {
        Some(path) => BackgroundConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => BackgroundConfig::default(),
    };

    if let Some(fallback) = &cli.fallback {
        config.fallback = Some(fallback.clone());
    }
    let mood = &mut config.mood;
    for (slot, value) in [
        (&mut mood.flow, cli.flow),
        (&mut mood.volume, cli.volume),
        (&mut mood.zoom, cli.zoom),
        (&mut mood.noise, cli.noise),
    ] {
        if let Some(value) = value {
            *slot = value;
        }
    }
    if let Some((width, height)) = cli.size {
        config.window.width = width;
        config.window.height = height;
    }

    config
        .validate()
        .context("invalid configuration after applying command-line overrides")?;
    Ok(config)
}

fn mood_from(settings: &MoodSettings) -> Mood {
    Mood {
        flow: settings.flow,
        volume: settings.volume,
        zoom: settings.zoom,
        noise: settings.noise,
    }
}

/// One stdin line as an artwork choice; blank lines clear the artwork.
fn parse_feed_line(line: &str) -> Option<String> {
    let trimmed = line.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn spawn_stdin_feed() -> Result<Receiver<Option<String>>> {
    let (tx, rx) = unbounded();
    thread::Builder::new()
        .name("fluidpaper-stdin".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        tracing::warn!("failed to read artwork from stdin: {err}");
                        break;
                    }
                };
                if tx.send(parse_feed_line(&line)).is_err() {
                    break;
                }
            }
            tracing::debug!("stdin closed; artwork feed finished");
        })
        .map_err(|err| anyhow!("failed to spawn stdin reader: {err}"))?;
    Ok(rx)
}
