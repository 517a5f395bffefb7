use url::Host;

/// Checks if a host matches a scope pattern
///
/// This function supports two types of patterns:
/// 1. Exact match: "example.com" matches only "example.com"
/// 2. Wildcard match: "*.example.com" matches:
///    - "example.com" (the bare domain)
///    - "blog.example.com" (single subdomain)
///    - "api.v2.example.com" (nested subdomains)
///
/// Comparison is case-insensitive.
///
/// # Examples
///
/// ```
/// use frontier_crawl::url::matches_wildcard;
///
/// assert!(matches_wildcard("example.com", "example.com"));
/// assert!(!matches_wildcard("example.com", "other.com"));
///
/// assert!(matches_wildcard("*.example.com", "example.com"));
/// assert!(matches_wildcard("*.example.com", "blog.example.com"));
/// assert!(!matches_wildcard("*.example.com", "badexample.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    let candidate = candidate.to_ascii_lowercase();
    let pattern = pattern.to_ascii_lowercase();

    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base || candidate.ends_with(&format!(".{}", base))
    } else {
        candidate == pattern
    }
}

/// Builds the scope pattern for a site root host
///
/// Domain names cover themselves and every subdomain, with a leading `www.`
/// dropped so `www.example.com` and `example.com` share one scope. IP
/// addresses only ever match themselves.
pub fn scope_pattern(host: &Host<&str>) -> String {
    match host {
        Host::Domain(domain) => {
            let domain = domain.to_ascii_lowercase();
            let bare = domain.strip_prefix("www.").unwrap_or(&domain);
            format!("*.{}", bare)
        }
        Host::Ipv4(addr) => addr.to_string(),
        Host::Ipv6(addr) => format!("[{}]", addr),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(matches_wildcard("example.com", "example.com"));
        assert!(!matches_wildcard("example.com", "blog.example.com"));
    }

    #[test]
    fn test_wildcard_matches_bare_and_nested() {
        assert!(matches_wildcard("*.example.com", "example.com"));
        assert!(matches_wildcard("*.example.com", "www.example.com"));
        assert!(matches_wildcard("*.example.com", "api.v2.example.com"));
    }

    #[test]
    fn test_wildcard_requires_label_boundary() {
        assert!(!matches_wildcard("*.example.com", "notexample.com"));
        assert!(!matches_wildcard("*.example.com", "example.com.evil.org"));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(matches_wildcard("*.Example.com", "BLOG.example.COM"));
    }

    #[test]
    fn test_scope_pattern_strips_www() {
        assert_eq!(
            scope_pattern(&Host::Domain("www.Example.com")),
            "*.example.com"
        );
        assert_eq!(scope_pattern(&Host::Domain("docs.rs")), "*.docs.rs");
    }

    #[test]
    fn test_scope_pattern_for_ip() {
        let host = Host::Ipv4("127.0.0.1".parse().unwrap());
        assert_eq!(scope_pattern(&host), "127.0.0.1");
        assert!(matches_wildcard(&scope_pattern(&host), "127.0.0.1"));
    }
}
