//! Writing one standalone SVG document per country

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, ErrorKind, Result, Span};
use crate::group::CountryBuckets;

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#;
pub const SVG_OPEN: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" version="1.1">"#;
pub const SVG_CLOSE: &str = "</svg>";
pub const SVG_EXTENSION: &str = "svg";

/// Output file name for `country`: lower-cased, spaces to underscores, `.svg`
pub fn file_name_for(country: &str) -> String {
    format!("{}.{SVG_EXTENSION}", country.to_lowercase().replace(' ', "_"))
}

/// Wrap `fragments` in the fixed SVG document template
pub fn render_document<S: AsRef<str>>(fragments: &[S]) -> String {
    let body_len: usize = fragments.iter().map(|f| f.as_ref().len() + 1).sum();
    let header_len = XML_DECLARATION.len() + SVG_OPEN.len() + 2;
    let mut out = String::with_capacity(header_len + body_len + SVG_CLOSE.len());

    out.push_str(XML_DECLARATION);
    out.push('\n');
    out.push_str(SVG_OPEN);
    out.push('\n');
    for (i, fragment) in fragments.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(fragment.as_ref());
    }
    out.push('\n');
    out.push_str(SVG_CLOSE);
    out
}

/// Write every bucket to `output_dir`, creating the directory if needed.
///
/// Files are created or truncated in bucket order. Existing files that no
/// bucket maps to are left alone. Returns the written paths, one per bucket.
pub fn write_buckets(buckets: &CountryBuckets, output_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir).map_err(|err| Error::io(output_dir, err))?;

    let mut written = Vec::with_capacity(buckets.len());
    let mut owners: HashMap<String, &str> = HashMap::with_capacity(buckets.len());

    for (country, fragments) in buckets {
        let name = file_name_for(country);
        check_file_name(&name)?;

        if let Some(previous) = owners.insert(name.clone(), country) {
            warn!(
                file = %name,
                previous,
                country = %country,
                "file name collision, later country overwrites earlier one"
            );
        }

        let path = output_dir.join(&name);
        fs::write(&path, render_document(fragments)).map_err(|err| Error::io(&path, err))?;
        debug!(path = %path.display(), fragments = fragments.len(), "wrote country file");
        written.push(path);
    }

    Ok(written)
}

/// Derived names must stay inside the output directory
fn check_file_name(name: &str) -> Result<()> {
    if name.chars().any(|c| std::path::is_separator(c) || c == '\0') {
        return Err(Error::with_message(
            ErrorKind::InvalidFileName {
                name: name.to_string(),
            },
            Span::empty(),
            format!("derived file name {name:?} is not a plain file name"),
        ));
    }
    Ok(())
}
