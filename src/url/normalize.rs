use crate::UrlError;
use url::{form_urlencoded, Url};

/// Tracking query parameters removed during normalization
const TRACKING_PARAMS: &[&str] = &[
    "fbclid",
    "gclid",
    "dclid",
    "msclkid",
    "mc_eid",
    "mc_cid",
    "igshid",
    "_ga",
    "_gl",
    "ref",
    "ref_",
    "source",
    "spm",
];

/// Tracking parameter prefixes (utm_source, pd_rd_w, pf_rd_p, ...)
const TRACKING_PREFIXES: &[&str] = &["utm_", "pd_rd_", "pf_rd_"];

/// Normalizes a URL so that equivalent links map to the same frontier node
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything that is not http or https
/// 3. Lowercase the scheme and host, and strip default ports (both done
///    by the parser)
/// 4. Reject URLs without a host
/// 5. Normalize path:
///    - Remove dot segments (. and ..) and empty segments
///    - Remove trailing slash (except for root /)
///    - Empty path becomes /
/// 6. Remove fragment (everything after #)
/// 7. Remove tracking query parameters
/// 8. Sort remaining query parameters by key
/// 9. Remove empty query string (trailing ?)
///
/// # Examples
///
/// ```
/// use product_scout::url::normalize_url;
///
/// let url = normalize_url("HTTPS://Shop.Example:443/p/123/?utm_source=x#reviews").unwrap();
/// assert_eq!(url.as_str(), "https://shop.example/p/123");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if let Some(query) = url.query().map(|q| filter_and_sort_query_params(q).join("&")) {
        url.set_query((!query.is_empty()).then_some(query.as_str()));
    }

    Ok(url)
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}

/// Filters out tracking parameters and sorts remaining query parameters
///
/// Each `k` or `k=v` piece is kept exactly as written; only its decoded key
/// is used for filtering and ordering.
fn filter_and_sort_query_params(query: &str) -> Vec<&str> {
    let mut params: Vec<(String, &str)> = query
        .split('&')
        .filter(|piece| !piece.is_empty())
        .map(|piece| (query_key(piece), piece))
        .filter(|(key, _)| !is_tracking_param(key))
        .collect();

    // Stable sort keeps repeated keys in document order
    params.sort_by(|a, b| a.0.cmp(&b.0));

    params.into_iter().map(|(_, piece)| piece).collect()
}

/// The form-decoded key of one `k` or `k=v` query piece
fn query_key(piece: &str) -> String {
    form_urlencoded::parse(piece.as_bytes())
        .next()
        .map(|(key, _)| key.into_owned())
        .unwrap_or_default()
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    TRACKING_PARAMS.contains(&key.as_str())
        || TRACKING_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
}
