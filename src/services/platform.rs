//! Source platform classification.
//!
//! Maps a posting's application URL to a display label such as "LinkedIn".

use crate::models::Posting;
use crate::utils::url::{first_label, normalized_host};

/// Label used when no usable URL is available.
pub const UNKNOWN_SOURCE: &str = "Unknown Source";

/// Host substrings and their display names, checked in order.
const KNOWN_PLATFORMS: &[(&str, &str)] = &[
    ("linkedin", "LinkedIn"),
    ("indeed", "Indeed"),
    ("naukri", "Naukri"),
    ("glassdoor", "Glassdoor"),
    ("foundit", "Foundit"),
    ("hirist", "Hirist"),
    ("angel", "AngelList"),
    ("timesjobs", "TimesJobs"),
    ("instahyre", "Instahyre"),
    ("google", "Google"),
    ("turing", "Turing"),
    ("remoteok", "RemoteOK"),
];

/// Classify the posting by its preferred application URL.
pub fn classify(posting: &Posting) -> String {
    posting
        .preferred_url()
        .map(classify_url)
        .unwrap_or_else(|| UNKNOWN_SOURCE.to_string())
}

/// Classify a single URL.
pub fn classify_url(url: &str) -> String {
    let Some(host) = normalized_host(url) else {
        return UNKNOWN_SOURCE.to_string();
    };

    KNOWN_PLATFORMS
        .iter()
        .find(|(needle, _)| host.contains(needle))
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| first_label(&host).to_string())
}
