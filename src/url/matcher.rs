use super::domain::bare_host;

/// Checks if a host matches a domain pattern
///
/// Patterns come from `[[domains]]`, `also-allow` and `[[retailers]]`
/// entries. Two kinds are supported:
/// 1. Exact: "argos.co.uk" matches "argos.co.uk" and "www.argos.co.uk"
/// 2. Wildcard: "*.amazon.com" matches "amazon.com" and any subdomain,
///    nested ones included ("smile.amazon.com", "a.b.amazon.com")
///
/// A leading "www." is ignored on both sides, so retailers configured with
/// or without it match the same hosts.
///
/// # Examples
///
/// ```
/// use product_scout::url::matches_wildcard;
///
/// assert!(matches_wildcard("ebay.com", "www.ebay.com"));
/// assert!(!matches_wildcard("ebay.com", "pages.ebay.com"));
///
/// assert!(matches_wildcard("*.amazon.com", "amazon.com"));
/// assert!(matches_wildcard("*.amazon.com", "smile.amazon.com"));
/// assert!(!matches_wildcard("*.amazon.com", "amazon.co.uk"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    let candidate = bare_host(candidate);

    match pattern.strip_prefix("*.") {
        Some(base) => {
            let base = bare_host(base);
            candidate == base
                || candidate
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => candidate == bare_host(pattern),
    }
}
