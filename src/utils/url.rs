// src/utils/url.rs

//! URL manipulation utilities.

/// Extract the normalized host of a URL: lower-cased, without a leading `www.`.
///
/// # Examples
/// ```
/// use jobwatch::utils::url::normalized_host;
///
/// assert_eq!(
///     normalized_host("https://WWW.LinkedIn.com/jobs/view/1"),
///     Some("linkedin.com".to_string())
/// );
/// assert_eq!(normalized_host("not a url"), None);
/// ```
pub fn normalized_host(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

/// First dot-separated label of a host (`careers.tcs.com` → `careers`).
pub fn first_label(host: &str) -> &str {
    host.split('.').next().unwrap_or(host)
}
