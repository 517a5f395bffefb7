use url::Url;

/// Query parameters that only carry tracking data and never change the page
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid", "mc_eid", "msclkid"];

/// Normalizes an in-scope URL so equivalent links share one store key
///
/// # Normalization Steps
///
/// 1. Remove the fragment (everything after `#`)
/// 2. Remove tracking query parameters (`utm_*`, `fbclid`, `gclid`, ...)
/// 3. Sort the remaining query parameters by key (stable for repeated keys)
/// 4. Remove an empty query string
///
/// Host lowercasing, dot-segment removal and the empty-path-to-`/` rewrite are
/// already performed by [`Url`] parsing for http(s) URLs.
///
/// # Examples
///
/// ```
/// use frontier_crawl::url::normalize_url;
/// use url::Url;
///
/// let url = Url::parse("https://Example.com/a/../page?b=2&utm_source=x&a=1#top").unwrap();
/// assert_eq!(normalize_url(url).as_str(), "https://example.com/page?a=1&b=2");
/// ```
pub fn normalize_url(mut url: Url) -> Url {
    url.set_fragment(None);

    if url.query().is_some() {
        let params = filter_and_sort_query_params(&url);
        if params.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(params);
        }
    }

    url
}

fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));
    params
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}
