//! Bucketing of country groups by their label
//!
//! A country group is a `<g role="menuitem" aria-label="...">` element. The
//! whole tree is searched in document order and the exact source markup of
//! each match is appended to the bucket of its trimmed label.

use indexmap::map::{self, IndexMap};
use tracing::{debug, warn};

use crate::error::{Error, ErrorKind, Result};
use crate::xml::{Document, Element};

pub const GROUP_TAG: &str = "g";
pub const ROLE_ATTR: &str = "role";
pub const MENUITEM_ROLE: &str = "menuitem";
pub const LABEL_ATTR: &str = "aria-label";

/// What to do with a country group that has no `aria-label`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LabelPolicy {
    /// Fail the whole run
    #[default]
    Strict,
    /// Log and leave the element out
    SkipUnlabeled,
}

/// Serialized fragments keyed by country name.
///
/// Countries iterate in the order they were first seen; fragments of one
/// country keep the order they were pushed in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CountryBuckets {
    inner: IndexMap<String, Vec<String>>,
}

impl CountryBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `fragment` to the bucket for `country`
    pub fn push(&mut self, country: impl Into<String>, fragment: impl Into<String>) {
        self.inner
            .entry(country.into())
            .or_default()
            .push(fragment.into());
    }

    /// Number of distinct countries
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn get(&self, country: &str) -> Option<&[String]> {
        self.inner.get(country).map(Vec::as_slice)
    }

    pub fn iter(&self) -> map::Iter<'_, String, Vec<String>> {
        self.inner.iter()
    }

    pub fn countries(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    /// Total number of fragments across all countries
    pub fn fragment_count(&self) -> usize {
        self.inner.values().map(Vec::len).sum()
    }
}

impl<'a> IntoIterator for &'a CountryBuckets {
    type Item = (&'a String, &'a Vec<String>);
    type IntoIter = map::Iter<'a, String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Whether `element` is a country group
pub fn is_country_group(element: &Element) -> bool {
    element.name == GROUP_TAG && element.attribute(ROLE_ATTR) == Some(MENUITEM_ROLE)
}

/// Collect every country group of `doc` into buckets.
///
/// `source` must be the text `doc` was parsed from; fragments are sliced out
/// of it verbatim.
pub fn group_countries(
    doc: &Document,
    source: &str,
    policy: LabelPolicy,
) -> Result<CountryBuckets> {
    let mut buckets = CountryBuckets::new();

    for element in doc.root.descendants().filter(|e| is_country_group(e)) {
        let Some(label) = element.attribute(LABEL_ATTR) else {
            match policy {
                LabelPolicy::Strict => return Err(missing_label(element)),
                LabelPolicy::SkipUnlabeled => {
                    warn!(at = %element.span.start, "skipping country group without {LABEL_ATTR}");
                    continue;
                }
            }
        };

        let fragment = element.source_text(source).ok_or_else(|| {
            Error::with_message(
                ErrorKind::InvalidToken,
                element.span,
                "element span is outside the source text",
            )
        })?;

        buckets.push(label.trim(), fragment);
    }

    debug!(
        countries = buckets.len(),
        fragments = buckets.fragment_count(),
        "grouped country elements"
    );
    Ok(buckets)
}

fn missing_label(element: &Element) -> Error {
    Error::new(
        ErrorKind::MissingAttribute {
            element: element.name.clone(),
            attribute: LABEL_ATTR.to_string(),
        },
        element.span,
    )
}
