//! # Scope Filter
//!
//! Policy predicate restricting which hostnames may be processed.
//!
//! Services consult the filter on every request, before any rate-limited or
//! network work. The core never caches answers; an implementation may.

use crate::names::{clean_name, is_subdomain_of};
use std::collections::BTreeSet;

/// Driven port: is a hostname covered by the enumeration policy?
///
/// Implementations must be pure from the caller's point of view.
pub trait ScopeFilter: Send + Sync {
    /// Returns `true` if `name` may be processed.
    fn is_in_scope(&self, name: &str) -> bool;
}

/// Accepts every name.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl ScopeFilter for AllowAll {
    fn is_in_scope(&self, _name: &str) -> bool {
        true
    }
}

/// Root-domain scope with a subdomain blacklist.
///
/// A name is in scope when it equals or sits under one of the configured
/// domains and does not equal or sit under a blacklisted name.
#[derive(Debug, Clone, Default)]
pub struct DomainScope {
    domains: BTreeSet<String>,
    blacklist: BTreeSet<String>,
}

impl DomainScope {
    /// Create an empty scope (nothing is in scope).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scope covering the given root domains.
    pub fn for_domains<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut scope = Self::new();
        for domain in domains {
            scope.add_domain(domain.as_ref());
        }
        scope
    }

    /// Add a root domain. Empty values after normalization are ignored.
    pub fn add_domain(&mut self, domain: &str) {
        let domain = clean_name(domain);
        if !domain.is_empty() {
            self.domains.insert(domain);
        }
    }

    /// Exclude a subdomain (and everything beneath it).
    pub fn add_blacklisted(&mut self, name: &str) {
        let name = clean_name(name);
        if !name.is_empty() {
            self.blacklist.insert(name);
        }
    }

    /// Builder-style variant of `add_blacklisted`.
    #[must_use]
    pub fn with_blacklisted(mut self, name: &str) -> Self {
        self.add_blacklisted(name);
        self
    }

    /// Configured root domains.
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.domains.iter().map(String::as_str)
    }

    /// The most specific configured domain covering `name`, if any.
    pub fn which_domain(&self, name: &str) -> Option<&str> {
        let name = normalize_for_match(name);
        self.domains
            .iter()
            .filter(|d| is_subdomain_of(&name, d))
            .max_by_key(|d| d.len())
            .map(String::as_str)
    }

    fn is_blacklisted(&self, name: &str) -> bool {
        self.blacklist.iter().any(|b| is_subdomain_of(name, b))
    }
}

impl ScopeFilter for DomainScope {
    fn is_in_scope(&self, name: &str) -> bool {
        let name = normalize_for_match(name);
        if name.is_empty() || self.is_blacklisted(&name) {
            return false;
        }
        self.domains.iter().any(|d| is_subdomain_of(&name, d))
    }
}

fn normalize_for_match(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}
