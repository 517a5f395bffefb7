//! URL handling module for Frontier-Crawl
//!
//! This module validates the start URL, decides which discovered links are in
//! scope for the crawl, and normalizes the ones that are.

mod matcher;
mod normalize;

use crate::{UrlError, UrlResult};
use url::{Host, ParseError, Url};

pub use matcher::{matches_wildcard, scope_pattern};
pub use normalize::normalize_url;

const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

/// Turns a raw link string into an in-scope, normalized URL
///
/// Returning `None` means the link is dropped: out of scope, unsupported
/// scheme, or not a link at all.
pub trait LinkFilter: Send + Sync {
    fn filter(&self, raw: &str) -> Option<Url>;
}

/// The crawl scope of a single site, derived from the start URL
#[derive(Debug, Clone)]
pub struct SiteScope {
    base: Url,
    pattern: String,
}

impl SiteScope {
    /// Creates a scope rooted at `start_url`
    ///
    /// # Returns
    ///
    /// * `Ok(SiteScope)` - The start URL is a crawlable http(s) URL
    /// * `Err(UrlError)` - See [`validate_start_url`]
    pub fn new(start_url: &str) -> UrlResult<Self> {
        let base = validate_start_url(start_url)?;
        let pattern = base
            .host()
            .map(|host| scope_pattern(&host))
            .ok_or(UrlError::MissingDomain)?;

        Ok(Self { base, pattern })
    }

    /// The validated start URL
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// The host pattern links must match, e.g. `*.example.com`
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns true if `url` is an http(s) URL on this site
    pub fn contains(&self, url: &Url) -> bool {
        ALLOWED_SCHEMES.contains(&url.scheme())
            && url
                .host_str()
                .is_some_and(|host| matches_wildcard(&self.pattern, host))
    }
}

impl LinkFilter for SiteScope {
    /// Filters a raw `href` value
    ///
    /// # Rules
    ///
    /// 1. Empty and fragment-only links are dropped
    /// 2. Absolute links must use http(s), have a host, and be in scope
    /// 3. Schemeless links that start with a bare domain (`example.com/about`)
    ///    are dropped rather than misread as relative paths
    /// 4. Other relative links are resolved against the start URL
    /// 5. Survivors are normalized
    fn filter(&self, raw: &str) -> Option<Url> {
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with('#') {
            return None;
        }

        let candidate = match Url::parse(raw) {
            Ok(url) => url,
            Err(ParseError::RelativeUrlWithoutBase) => {
                if looks_like_bare_domain(raw) {
                    return None;
                }
                self.base.join(raw).ok()?
            }
            Err(_) => return None,
        };

        if !self.contains(&candidate) {
            return None;
        }

        Some(normalize_url(candidate))
    }
}

/// Validates the URL a crawl is seeded with
///
/// # Rules
///
/// * Must parse as an absolute URL
/// * Scheme must be `http` or `https`
/// * Host must be an IP address or a registrable domain under a suffix on
///   the Public Suffix List (so `example.com` passes, `localhost` and
///   `example.notatld` do not)
///
/// # Examples
///
/// ```
/// use frontier_crawl::url::validate_start_url;
///
/// assert!(validate_start_url("https://example.com/").is_ok());
/// assert!(validate_start_url("ftp://example.com/").is_err());
/// assert!(validate_start_url("https://localhost/").is_err());
/// ```
pub fn validate_start_url(raw: &str) -> UrlResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if !ALLOWED_SCHEMES.contains(&url.scheme()) {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    match url.host() {
        None => Err(UrlError::MissingDomain),
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => Ok(url),
        Some(Host::Domain(domain)) => {
            if has_public_suffix(domain) {
                Ok(url)
            } else {
                Err(UrlError::Malformed(format!(
                    "host '{}' has no domain suffix",
                    domain
                )))
            }
        }
    }
}

/// Returns true if `host` is a registrable domain under a known public suffix
fn has_public_suffix(host: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    psl::domain(host.as_bytes()).is_some_and(|domain| domain.suffix().is_known())
}

/// Returns true if a schemeless link begins with a domain name
/// (`example.blog/about`) rather than a relative path (`page.html`)
fn looks_like_bare_domain(raw: &str) -> bool {
    if raw.starts_with(['/', '.', '?']) {
        return false;
    }

    let first_segment = raw.split(['/', '?', '#']).next().unwrap_or_default();
    first_segment.to_ascii_lowercase().starts_with("www.") || has_public_suffix(first_segment)
}
