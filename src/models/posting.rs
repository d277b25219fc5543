//! Job posting data structure.

use serde::{Deserialize, Serialize};

/// A single job listing returned by the search provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Posting {
    /// Job title
    pub title: String,

    /// Hiring company
    pub company_name: String,

    /// Location as reported by the provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Relative or absolute posting date (e.g. "2 days ago")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<String>,

    /// Link of the first apply option
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_url: Option<String>,

    /// Provider share link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_url: Option<String>,
}

impl Posting {
    /// Create a posting with only title and company set.
    pub fn new(title: impl Into<String>, company_name: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            company_name: company_name.into(),
            location: None,
            posted_at: None,
            apply_url: None,
            share_url: None,
        }
    }

    /// Set the share link.
    pub fn with_share_url(mut self, url: impl Into<String>) -> Self {
        self.share_url = Some(url.into());
        self
    }

    /// Set the apply link.
    pub fn with_apply_url(mut self, url: impl Into<String>) -> Self {
        self.apply_url = Some(url.into());
        self
    }

    /// Set the posted date.
    pub fn with_posted_at(mut self, posted_at: impl Into<String>) -> Self {
        self.posted_at = Some(posted_at.into());
        self
    }

    /// Stable identifier used for deduplication.
    ///
    /// The share link when present, otherwise `title|company`.
    pub fn identifier(&self) -> String {
        match non_empty(&self.share_url) {
            Some(url) => url.to_string(),
            None => format!("{}|{}", self.title.trim(), self.company_name.trim()),
        }
    }

    /// Preferred application URL: apply option first, then share link.
    pub fn preferred_url(&self) -> Option<&str> {
        non_empty(&self.apply_url).or_else(|| non_empty(&self.share_url))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
