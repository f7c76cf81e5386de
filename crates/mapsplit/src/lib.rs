//! mapsplit - split a composite SVG map into one file per country
//!
//! The input map marks every country shape with
//! `<g role="menuitem" aria-label="Country Name">`. [`split_svg_map`] reads
//! the map, groups those elements by their trimmed label and writes
//! `<output_dir>/<country_name>.svg` for each country, where the file name is
//! the label lower-cased with spaces replaced by underscores.
//!
//! # Quick Start
//!
//! ```no_run
//! # fn main() -> Result<(), mapsplit::Error> {
//! let summary = mapsplit::split_svg_map("pixelmap.svg", "country_svgs")?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```
//!
//! The run is one linear pass: load, parse, group, emit. Any failure aborts
//! it immediately; files written before the failure stay on disk.

#![forbid(unsafe_code)]

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

pub mod error;
pub use error::{Error, ErrorKind, Pos, Result, Span};

pub mod input;
pub use input::Input;

pub mod lexer;

pub mod xml;
pub use xml::{
    Config, Content as XmlContent, Document as XmlDocument, Element as XmlElement,
    Parser as XmlParser,
};

pub mod group;
pub use group::{group_countries, CountryBuckets, LabelPolicy};

pub mod emit;
pub use emit::{file_name_for, render_document, write_buckets};

/// Options for a split run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Options {
    /// Parser limits
    pub parser: Config,
    /// Handling of country groups without a label
    pub label_policy: LabelPolicy,
}

/// Outcome of a split run
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SplitSummary {
    pub output_dir: PathBuf,
    /// Distinct country labels found
    pub countries: usize,
    /// Matched country groups across all countries
    pub fragments: usize,
    /// Written files in write order
    pub files: Vec<PathBuf>,
}

impl fmt::Display for SplitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Created SVG files for {} countries in {}",
            self.countries,
            self.output_dir.display()
        )
    }
}

/// Split the map at `input_path` into per-country files under `output_dir`
pub fn split_svg_map(
    input_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
) -> Result<SplitSummary> {
    split_svg_map_with_options(input_path, output_dir, &Options::default())
}

/// Split with custom options
#[instrument(skip_all, fields(input = %input_path.as_ref().display()))]
pub fn split_svg_map_with_options(
    input_path: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    options: &Options,
) -> Result<SplitSummary> {
    let input = Input::load_with_limit(input_path.as_ref(), options.parser.max_size)?;
    debug!(bytes = input.len(), "loaded source document");
    split_source(&input, output_dir.as_ref(), options)
}

/// Run the pipeline on an already loaded document
pub fn split_source(input: &Input, output_dir: &Path, options: &Options) -> Result<SplitSummary> {
    let doc = XmlParser::with_config(input.as_bytes(), options.parser).parse()?;
    debug!(root = %doc.root.name, "parsed source document");

    let buckets = group_countries(&doc, input.as_str(), options.label_policy)?;
    let files = write_buckets(&buckets, output_dir)?;

    let summary = SplitSummary {
        output_dir: output_dir.to_path_buf(),
        countries: buckets.len(),
        fragments: buckets.fragment_count(),
        files,
    };
    info!(
        countries = summary.countries,
        fragments = summary.fragments,
        output_dir = %output_dir.display(),
        "split complete"
    );
    Ok(summary)
}

/// Parse XML from string
pub fn from_xml_str(s: &str) -> Result<XmlDocument> {
    XmlParser::new(s.as_bytes()).parse()
}
