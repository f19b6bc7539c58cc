//! # Hostname Normalization
//!
//! Sources hand back names the way they found them: quoted, URL-encoded,
//! wildcarded, with stray dots. `clean_name` reduces a candidate to the bare
//! lowercase hostname. It returns an empty string when nothing usable is left.

/// Normalize a candidate hostname.
///
/// Repeats until a fixed point, so `clean_name(clean_name(x)) == clean_name(x)`.
pub fn clean_name(raw: &str) -> String {
    let mut current = raw.to_ascii_lowercase();

    loop {
        let next = clean_once(&current);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn clean_once(input: &str) -> String {
    let mut name = input.trim().trim_matches(|c: char| c == '"' || c == '\'');

    if let Some((_, rest)) = name.split_once("://") {
        name = rest;
    }
    if let Some(end) = name.find(['/', '?', '#']) {
        name = &name[..end];
    }
    if let Some((_, host)) = name.rsplit_once('@') {
        name = host;
    }
    if let Some((host, _port)) = name.split_once(':') {
        name = host;
    }

    name = strip_escape_prefixes(name);

    while let Some(rest) = name.strip_prefix("*.") {
        name = rest;
    }

    name.trim_matches(|c: char| c == '.' || c == '-' || c == '*')
        .to_string()
}

/// Drop leading `%XX`, `\xXX` and `\uXXXX` sequences left over from encoded URLs.
fn strip_escape_prefixes(mut name: &str) -> &str {
    loop {
        let stripped = if let Some(rest) = name.strip_prefix("%25") {
            // Double-encoded: `%252f` is an escaped `%2f`.
            take_hex(rest, 2).or(Some(rest))
        } else if let Some(rest) = name.strip_prefix('%') {
            take_hex(rest, 2)
        } else if let Some(rest) = name.strip_prefix("\\x") {
            take_hex(rest, 2)
        } else if let Some(rest) = name.strip_prefix("\\u") {
            take_hex(rest, 4)
        } else {
            None
        };

        match stripped {
            Some(rest) => name = rest,
            None => return name,
        }
    }
}

fn take_hex(s: &str, digits: usize) -> Option<&str> {
    let head = s.get(..digits)?;
    head.chars()
        .all(|c| c.is_ascii_hexdigit())
        .then(|| &s[digits..])
}

/// True when `name` equals `domain` or is a dot-separated child of it.
///
/// Both arguments are expected in normalized form.
#[must_use]
pub fn is_subdomain_of(name: &str, domain: &str) -> bool {
    if domain.is_empty() {
        return false;
    }
    name == domain
        || (name.len() > domain.len()
            && name.ends_with(domain)
            && name.as_bytes()[name.len() - domain.len() - 1] == b'.')
}
