use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "fluidpaper",
    author,
    version,
    about = "Animated fluid background generated from album artwork"
)]
pub struct Cli {
    /// Artwork to display: an `http(s)://` URL, a `file://` URL or a path.
    #[arg(value_name = "ARTWORK")]
    pub artwork: Option<String>,

    /// Artwork used whenever no explicit artwork is set.
    #[arg(long, value_name = "URL")]
    pub fallback: Option<String>,

    /// TOML configuration file.
    #[arg(long, value_name = "FILE", env = "FLUIDPAPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Swirl and warp speed.
    #[arg(long, value_name = "FLOW")]
    pub flow: Option<f32>,

    /// Brightness pulse and swirl amplitude.
    #[arg(long, value_name = "VOLUME")]
    pub volume: Option<f32>,

    /// Zoom blend between 0 (out) and 1 (in).
    #[arg(long, value_name = "ZOOM")]
    pub zoom: Option<f32>,

    /// Sampling jitter and dither strength.
    #[arg(long, value_name = "NOISE")]
    pub noise: Option<f32>,

    /// Window size (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_size)]
    pub size: Option<(u32, u32)>,

    /// Read artwork references from stdin, one per line; an empty line clears the artwork.
    #[arg(long)]
    pub stdin: bool,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    pub print_config: bool,
}

fn parse_size(raw: &str) -> Result<(u32, u32), String> {
    moodconfig::parse_size(raw).map_err(|err| err.to_string())
}

pub fn parse() -> Cli {
    Cli::parse()
}
