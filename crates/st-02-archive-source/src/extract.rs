//! Hostname extraction from archive responses.

use regex::RegexBuilder;
use shared_types::names::is_subdomain_of;
use shared_types::SourceError;
use std::collections::HashSet;

/// One DNS label followed by a dot.
const LABEL: &str = r"(?:[a-z0-9_]|[a-z0-9_][a-z0-9_-]{0,61}[a-z0-9_])\.";

/// Find every hostname under `root_domain` in `body`.
///
/// Matching is case-insensitive; results are lowercased, deduplicated and
/// kept in first-seen order. Names under `exclude` (the archive's own
/// domain) are skipped.
pub fn extract_hostnames(
    body: &str,
    root_domain: &str,
    exclude: &str,
) -> Result<Vec<String>, SourceError> {
    let root = root_domain.trim().trim_end_matches('.').to_lowercase();
    if root.is_empty() {
        return Ok(Vec::new());
    }

    let pattern = format!(r"(?:{LABEL})+{}\b", regex::escape(&root));
    let re = RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| SourceError::Parse(e.to_string()))?;

    let mut seen = HashSet::new();
    let names = re
        .find_iter(body)
        .map(|m| m.as_str().to_lowercase())
        .filter(|name| !is_subdomain_of(name, exclude))
        .filter(|name| seen.insert(name.clone()))
        .collect();

    Ok(names)
}
