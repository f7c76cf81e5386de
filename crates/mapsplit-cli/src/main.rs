use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use mapsplit::{Config, LabelPolicy, Options};

#[derive(Debug, Parser)]
#[command(
    name = "mapsplit",
    version,
    about = "Split an SVG map into one SVG file per country"
)]
struct Args {
    /// Source map with <g role="menuitem" aria-label="..."> country groups
    #[arg(value_name = "INPUT", default_value = "pixelmap.svg")]
    input: PathBuf,
    /// Directory receiving one <country>.svg per country
    #[arg(value_name = "OUTPUT_DIR", default_value = "country_svgs")]
    output_dir: PathBuf,
    /// Skip country groups without an aria-label instead of failing
    #[arg(long)]
    skip_unlabeled: bool,
    /// Maximum element nesting depth (0 = unlimited)
    #[arg(long, value_name = "N")]
    max_depth: Option<u16>,
    /// Maximum input size in bytes (0 = unlimited)
    #[arg(long, value_name = "BYTES")]
    max_size: Option<usize>,
    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn options(&self) -> Options {
        let defaults = Config::default();
        Options {
            parser: Config::new(
                self.max_depth.unwrap_or(defaults.max_depth),
                self.max_size.unwrap_or(defaults.max_size),
            ),
            label_policy: if self.skip_unlabeled {
                LabelPolicy::SkipUnlabeled
            } else {
                LabelPolicy::Strict
            },
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let args = Args::parse();
    let options = args.options();
    debug!(?options, input = %args.input.display(), "starting split");

    let summary = mapsplit::split_svg_map_with_options(&args.input, &args.output_dir, &options)
        .with_context(|| {
            format!(
                "failed to split {} into {}",
                args.input.display(),
                args.output_dir.display()
            )
        })?;

    let mut stdout = io::stdout().lock();
    if args.json {
        serde_json::to_writer_pretty(&mut stdout, &summary).context("failed to encode summary")?;
        writeln!(stdout).context("failed to write stdout")?;
    } else {
        writeln!(stdout, "{summary}").context("failed to write stdout")?;
    }
    Ok(())
}
