use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use product_scout::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Normalizes a configured domain entry
///
/// Accepts the forms people paste into config files ("https://Shop.com/",
/// "shop.com") and reduces them to a bare lowercase host.
///
/// # Examples
///
/// ```
/// use product_scout::url::normalize_domain;
///
/// assert_eq!(normalize_domain("https://www.Zara.com/"), "www.zara.com");
/// assert_eq!(normalize_domain("argos.co.uk"), "argos.co.uk");
/// ```
pub fn normalize_domain(domain: &str) -> String {
    let domain = domain.trim();
    let domain = domain
        .strip_prefix("https://")
        .or_else(|| domain.strip_prefix("http://"))
        .unwrap_or(domain);
    domain.trim_end_matches('/').to_lowercase()
}

/// Strips a leading "www." label
pub fn bare_host(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}
