//! Field extraction with ordered locator fallback.
//!
//! Each logical field carries its own locator chain as data, not code:
//! locators are tried in order against one listing node, the first one
//! yielding a non-empty trimmed value wins, and anything that goes wrong
//! at the locator level is a miss, never an error. A node that yields
//! nothing for a field gets the `"N/A"` sentinel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::nav::ListingNode;

/// Placeholder stored when no locator produced data for a field.
pub const SENTINEL: &str = "N/A";

/// One logical field paired with its ordered locator chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    /// Non-empty; evaluated in order, first hit wins.
    pub locators: Vec<String>,
    /// When set, the attribute is read first and the element text is the
    /// per-locator fallback.
    pub attribute: Option<String>,
    /// When set, values starting with `/` are resolved against this origin.
    pub url_origin: Option<String>,
}

impl FieldSpec {
    /// Field read from element text.
    pub fn text(name: &str, locators: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            locators: locators.iter().map(|l| l.to_string()).collect(),
            attribute: None,
            url_origin: None,
        }
    }

    /// Field read from a named attribute, falling back to text.
    pub fn attr(name: &str, locators: &[&str], attribute: &str) -> Self {
        Self {
            attribute: Some(attribute.to_string()),
            ..Self::text(name, locators)
        }
    }

    /// Link field: reads `href` and resolves site-relative values.
    pub fn link(name: &str, locators: &[&str], origin: &str) -> Self {
        Self {
            attribute: Some("href".to_string()),
            url_origin: Some(origin.to_string()),
            ..Self::text(name, locators)
        }
    }
}

/// Best-effort record extracted from one listing node.
///
/// Field order is the caller's spec order and drives export column order.
/// Immutable after extraction except for the optionally attached
/// compatibility score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub source: String,
    fields: Vec<(String, String)>,
    pub compatibility: Option<String>,
    pub scraped_at: DateTime<Utc>,
}

impl ExtractedRecord {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            fields: Vec::new(),
            compatibility: None,
            scraped_at: Utc::now(),
        }
    }

    pub fn push(&mut self, name: &str, value: String) {
        self.fields.push((name.to_string(), value));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Field value, or the sentinel when the field was never extracted.
    pub fn get_or_sentinel(&self, name: &str) -> &str {
        self.get(name).unwrap_or(SENTINEL)
    }

    /// Extracted fields plus the derived columns, in export/storage order.
    pub fn columns(&self) -> Vec<(String, String)> {
        let mut columns = self.fields.clone();
        columns.push(("source".to_string(), self.source.clone()));
        columns.push(("scraped_at".to_string(), self.scraped_at.to_rfc3339()));
        columns.push((
            "compatibility".to_string(),
            self.compatibility.clone().unwrap_or_else(|| SENTINEL.to_string()),
        ));
        columns
    }
}

/// Extracts one record from `node`, evaluating every spec's locator chain.
///
/// Read-only over the node; any per-locator query error is swallowed and
/// treated as a miss, so extraction completes even when the markup varies
/// node to node.
pub fn extract(node: &dyn ListingNode, specs: &[FieldSpec], source: &str) -> ExtractedRecord {
    let mut record = ExtractedRecord::new(source);
    for spec in specs {
        let value = extract_field(node, spec).unwrap_or_else(|| SENTINEL.to_string());
        record.push(&spec.name, value);
    }
    record
}

fn extract_field(node: &dyn ListingNode, spec: &FieldSpec) -> Option<String> {
    for locator in &spec.locators {
        // ":scope" targets the listing node itself instead of a descendant.
        if locator == ":scope" {
            if let Some(value) = read_element(node, spec) {
                return Some(value);
            }
            continue;
        }

        let element = match node.query_one(locator) {
            Ok(Some(element)) => element,
            Ok(None) => continue,
            Err(err) => {
                debug!(field = %spec.name, locator, %err, "locator query failed, treating as miss");
                continue;
            }
        };

        if let Some(value) = read_element(element.as_ref(), spec) {
            return Some(value);
        }
    }
    None
}

fn read_element(element: &dyn ListingNode, spec: &FieldSpec) -> Option<String> {
    if let Some(attribute) = &spec.attribute {
        if let Ok(Some(raw)) = element.read_attribute(attribute) {
            if let Some(value) = accept(&raw) {
                return Some(normalize(spec, value));
            }
        }
        // Attribute absent or empty: same-locator fallback to text.
    }

    if let Ok(raw) = element.read_text() {
        if let Some(value) = accept(&raw) {
            return Some(normalize(spec, value));
        }
    }
    None
}

/// A candidate value counts only if it trims to something non-empty and
/// non-sentinel.
fn accept(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty() && trimmed != SENTINEL).then_some(trimmed)
}

fn normalize(spec: &FieldSpec, value: &str) -> String {
    match &spec.url_origin {
        Some(origin) if value.starts_with('/') => format!("{origin}{value}"),
        _ => value.to_string(),
    }
}

/// Derives a human-readable source label from a site origin, e.g.
/// `https://www.indeed.com` becomes `Indeed`.
pub fn source_label(origin: &str) -> String {
    let domain = Url::parse(origin)
        .ok()
        .and_then(|url| url.domain().map(str::to_string));
    let Some(domain) = domain else {
        return origin.to_string();
    };

    // Registrable-domain label: the label directly before the public
    // suffix ("www.indeed.com" -> "indeed").
    let labels: Vec<&str> = domain.split('.').collect();
    let label = if labels.len() >= 2 {
        labels[labels.len() - 2]
    } else {
        labels[0]
    };

    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => origin.to_string(),
    }
}
