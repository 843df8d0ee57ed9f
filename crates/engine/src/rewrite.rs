//! URL rewriting

use crate::classify::{RewriteStrategy, Rules};
use crate::domain::SemanticDomain;
use crate::error::{RerouteError, RewriteError};
use http::Uri;
use std::fmt;
use std::str::FromStr;

/// Absolute request URL as seen at the middleware boundary.
///
/// `raw_path` is the request target without its leading `/`, query included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestUrl {
    scheme: String,
    host: String,
    port: Option<u16>,
    raw_path: String,
}

impl RequestUrl {
    pub fn new(
        scheme: impl Into<String>,
        host: impl Into<String>,
        port: Option<u16>,
        raw_path: impl Into<String>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
            raw_path: raw_path.into(),
        }
    }

    /// Build from an absolute `http::Uri`
    pub fn from_uri(uri: &Uri) -> Result<Self, RerouteError> {
        absolute_parts(uri).map_err(|reason| RerouteError::InvalidRequestUrl {
            url: uri.to_string(),
            reason: reason.to_string(),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn raw_path(&self) -> &str {
        &self.raw_path
    }

    /// `host[:port]`
    pub fn authority(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }

    /// Path with its leading `/`, without the query
    pub fn path(&self) -> String {
        let path = self.raw_path.split('?').next().unwrap_or_default();
        format!("/{}", path)
    }

    pub fn query(&self) -> Option<&str> {
        self.raw_path.split_once('?').map(|(_, q)| q)
    }
}

impl FromStr for RequestUrl {
    type Err = RerouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uri: Uri = s.parse().map_err(|e: http::uri::InvalidUri| {
            RerouteError::InvalidRequestUrl {
                url: s.to_string(),
                reason: e.to_string(),
            }
        })?;
        Self::from_uri(&uri)
    }
}

/// An empty `raw_path` renders as `/`, the same as an explicit root target.
impl fmt::Display for RequestUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.scheme, self.authority(), self.raw_path)
    }
}

fn absolute_parts(uri: &Uri) -> Result<RequestUrl, &'static str> {
    let scheme = uri
        .scheme_str()
        .filter(|s| !s.is_empty())
        .ok_or("missing scheme")?;
    let host = uri.host().filter(|h| !h.is_empty()).ok_or("missing host")?;
    let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or_default();
    let raw_path = target.strip_prefix('/').unwrap_or(target);

    Ok(RequestUrl::new(scheme, host, uri.port_u16(), raw_path))
}

/// Apply `strategy` to `original`.
///
/// Rewrites target `github.com` and keep the original scheme and raw path.
pub fn rewrite(
    strategy: &RewriteStrategy,
    original: &RequestUrl,
    rules: &Rules,
) -> Result<RequestUrl, RewriteError> {
    let owner = match strategy {
        RewriteStrategy::NoOp => return Ok(original.clone()),
        RewriteStrategy::RewriteOwnAlias => rules.own_namespace.as_str(),
        RewriteStrategy::RewriteThirdPartyAlias { owner } => owner.as_str(),
    };

    let attempted = format!(
        "{}://{}/{}/{}",
        original.scheme(),
        SemanticDomain::Github.canonical_host(),
        owner,
        original.raw_path()
    );

    let parsed = attempted
        .parse::<Uri>()
        .map_err(|e| e.to_string())
        .and_then(|uri| absolute_parts(&uri).map_err(str::to_string));

    parsed.map_err(|reason| RewriteError::InvalidUrl {
        original: original.to_string(),
        attempted,
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> RequestUrl {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_request_url() {
        let u = url("https://gh.someone.tl:8443/repo/file.go?ref=main");
        assert_eq!(u.scheme(), "https");
        assert_eq!(u.host(), "gh.someone.tl");
        assert_eq!(u.port(), Some(8443));
        assert_eq!(u.raw_path(), "repo/file.go?ref=main");
        assert_eq!(u.path(), "/repo/file.go");
        assert_eq!(u.query(), Some("ref=main"));
        assert_eq!(u.authority(), "gh.someone.tl:8443");
        assert_eq!(u.to_string(), "https://gh.someone.tl:8443/repo/file.go?ref=main");
    }

    #[test]
    fn test_parse_rejects_relative() {
        let err = "/repo/file.go".parse::<RequestUrl>().unwrap_err();
        assert!(matches!(err, RerouteError::InvalidRequestUrl { .. }));

        let err = "https://exa mple.com/".parse::<RequestUrl>().unwrap_err();
        assert!(matches!(err, RerouteError::InvalidRequestUrl { .. }));
    }

    #[test]
    fn test_noop_returns_original() {
        let original = url("http://example.com:8080/x?y=1");
        let rewritten = rewrite(&RewriteStrategy::NoOp, &original, &Rules::default()).unwrap();
        assert_eq!(rewritten, original);
        assert_eq!(rewritten.to_string(), "http://example.com:8080/x?y=1");
    }

    #[test]
    fn test_missing_target_displays_as_root() {
        let original = url("https://example.com");
        assert_eq!(original.raw_path(), "");
        assert_eq!(original.to_string(), "https://example.com/");

        let rewritten = rewrite(&RewriteStrategy::NoOp, &original, &Rules::default()).unwrap();
        assert_eq!(rewritten, original);
        assert_eq!(rewritten, url("https://example.com/"));
    }

    #[test]
    fn test_rewrite_own_alias() {
        let original = url("https://gh.alexheld.io/tool");
        let rewritten =
            rewrite(&RewriteStrategy::RewriteOwnAlias, &original, &Rules::default()).unwrap();
        assert_eq!(rewritten.to_string(), "https://github.com/alex-held/tool");
        assert_eq!(rewritten.host(), "github.com");
    }

    #[test]
    fn test_rewrite_third_party_alias() {
        let original = url("https://gh.someone.tl/repo/file.go");
        let strategy = RewriteStrategy::RewriteThirdPartyAlias {
            owner: "someone".to_string(),
        };
        let rewritten = rewrite(&strategy, &original, &Rules::default()).unwrap();
        assert_eq!(rewritten.to_string(), "https://github.com/someone/repo/file.go");
    }

    #[test]
    fn test_rewrite_keeps_scheme_and_query_drops_port() {
        let original = url("http://gh.someone.tl:8080/repo?tab=readme");
        let strategy = RewriteStrategy::RewriteThirdPartyAlias {
            owner: "someone".to_string(),
        };
        let rewritten = rewrite(&strategy, &original, &Rules::default()).unwrap();
        assert_eq!(rewritten.to_string(), "http://github.com/someone/repo?tab=readme");
        assert_eq!(rewritten.port(), None);
    }

    #[test]
    fn test_rewrite_empty_path() {
        let original = url("https://gh.someone.tl");
        let strategy = RewriteStrategy::RewriteThirdPartyAlias {
            owner: "someone".to_string(),
        };
        let rewritten = rewrite(&strategy, &original, &Rules::default()).unwrap();
        assert_eq!(rewritten.to_string(), "https://github.com/someone/");
    }

    #[test]
    fn test_rewrite_illegal_characters_fail() {
        let original = RequestUrl::new("https", "gh.someone.tl", None, "repo name");
        let strategy = RewriteStrategy::RewriteThirdPartyAlias {
            owner: "someone".to_string(),
        };
        let err = rewrite(&strategy, &original, &Rules::default()).unwrap_err();
        let RewriteError::InvalidUrl { original, attempted, .. } = err;
        assert_eq!(original, "https://gh.someone.tl/repo name");
        assert_eq!(attempted, "https://github.com/someone/repo name");
    }

    #[test]
    fn test_rewrite_own_alias_failure_is_reported() {
        let rules = Rules {
            own_namespace: "alex held".to_string(),
            ..Default::default()
        };
        let original = url("https://gh.alexheld.io/tool");
        let result = rewrite(&RewriteStrategy::RewriteOwnAlias, &original, &rules);
        assert!(matches!(result, Err(RewriteError::InvalidUrl { .. })));
    }

    #[test]
    fn test_rewrite_empty_scheme_fails() {
        let original = RequestUrl::new("", "gh.someone.tl", None, "repo");
        let strategy = RewriteStrategy::RewriteThirdPartyAlias {
            owner: "someone".to_string(),
        };
        assert!(rewrite(&strategy, &original, &Rules::default()).is_err());
    }
}
