//! Semantic domains and hostname labels

use std::fmt;

/// Destinations an alias host can point at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticDomain {
    /// GitHub, reached through the short `g` alias
    Github,
    /// Entry point of the operator's proxy chain
    App,
}

impl SemanticDomain {
    pub const ALL: [SemanticDomain; 2] = [SemanticDomain::Github, SemanticDomain::App];

    /// Short alias label for this domain
    pub fn alias(&self) -> &'static str {
        match self {
            SemanticDomain::Github => "g",
            SemanticDomain::App => "app",
        }
    }

    /// Host this domain resolves to
    pub fn canonical_host(&self) -> &'static str {
        match self {
            SemanticDomain::Github => "github.com",
            SemanticDomain::App => "traefik.alexheld.io",
        }
    }

    /// Whether `host` is the canonical host of any known domain
    pub fn is_canonical_host(host: &str) -> bool {
        Self::ALL.iter().any(|d| d.canonical_host() == host)
    }
}

impl fmt::Display for SemanticDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_host())
    }
}

/// A hostname split into dot-separated labels.
///
/// Labels are indexed right to left: index 0 is the TLD, higher indices are
/// more specific. `gh.someone.tl` yields `tl`, `someone`, `gh`.
/// No case folding or trailing-dot stripping is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hostname<'a> {
    host: &'a str,
    labels: Vec<&'a str>,
}

impl<'a> Hostname<'a> {
    pub fn parse(host: &'a str) -> Self {
        Self {
            host,
            labels: host.rsplit('.').collect(),
        }
    }

    /// Label at a right-to-left position
    pub fn label(&self, index: usize) -> Option<&'a str> {
        self.labels.get(index).copied()
    }

    /// Number of labels
    pub fn depth(&self) -> usize {
        self.labels.len()
    }

    pub fn as_str(&self) -> &'a str {
        self.host
    }
}
