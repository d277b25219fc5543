//! Digest rendering.
//!
//! Turns an ordered list of postings into an HTML fragment for email.

use chrono::NaiveDate;

use crate::models::{DigestConfig, Posting};
use crate::services::platform::classify;

/// Shown when a posting carries no date.
pub const NO_DATE_PLACEHOLDER: &str = "Recently posted";

/// Shown when a posting carries no usable link.
pub const NO_LINK_PLACEHOLDER: &str = "Link unavailable";

/// Body of a digest with no postings.
pub const EMPTY_DIGEST_TEXT: &str = "No jobs found today.";

/// A rendered digest ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub subject: String,
    pub html: String,
    pub count: usize,
}

/// Render postings into a digest. Output order follows input order.
pub fn render(postings: &[Posting], options: &DigestConfig, date: NaiveDate) -> Digest {
    let mut html = format!("<h2>{}</h2>\n", escape(&options.heading));

    if postings.is_empty() {
        html.push_str(&format!("<p>{}</p>\n", EMPTY_DIGEST_TEXT));
    }

    for posting in postings {
        html.push_str(&render_entry(posting, options.show_platform));
    }

    Digest {
        subject: subject(&options.subject, postings.len(), date),
        html,
        count: postings.len(),
    }
}

/// Fill the subject template.
///
/// Supported placeholders: `{count}`, `{date}` (YYYY-MM-DD).
pub fn subject(template: &str, count: usize, date: NaiveDate) -> String {
    template
        .replace("{count}", &count.to_string())
        .replace("{date}", &date.format("%Y-%m-%d").to_string())
}

fn render_entry(posting: &Posting, show_platform: bool) -> String {
    let mut entry = String::from("<div class=\"job\" style=\"margin-bottom:16px;\">\n");

    entry.push_str(&format!("  <b>{}</b><br>\n", escape(&posting.title)));
    entry.push_str(&format!("  {}<br>\n", escape(&posting.company_name)));

    if let Some(location) = posting.location.as_deref().filter(|l| !l.trim().is_empty()) {
        entry.push_str(&format!("  {}<br>\n", escape(location)));
    }

    let posted = posting
        .posted_at
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .unwrap_or(NO_DATE_PLACEHOLDER);
    entry.push_str(&format!(
        "  <small class=\"posted\">{}</small><br>\n",
        escape(posted)
    ));

    if show_platform {
        entry.push_str(&format!(
            "  <small class=\"platform\">via {}</small><br>\n",
            escape(&classify(posting))
        ));
    }

    match posting.preferred_url() {
        Some(url) => entry.push_str(&format!(
            "  <a href=\"{}\" target=\"_blank\">View Job</a>\n",
            escape(url)
        )),
        None => entry.push_str(&format!("  <i>{}</i>\n", NO_LINK_PLACEHOLDER)),
    }

    entry.push_str("</div>\n");
    entry
}

/// Escape text for HTML element content and quoted attributes.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn options() -> DigestConfig {
        DigestConfig::default()
    }

    fn texts(html: &str, selector: &str) -> Vec<String> {
        let doc = Html::parse_fragment(html);
        let sel = Selector::parse(selector).unwrap();
        doc.select(&sel)
            .map(|e| e.text().collect::<String>().trim().to_string())
            .collect()
    }

    #[test]
    fn test_render_preserves_order() {
        let postings = vec![
            Posting::new("First", "A").with_share_url("https://g.co/1"),
            Posting::new("Second", "B").with_share_url("https://g.co/2"),
            Posting::new("Third", "C").with_share_url("https://g.co/3"),
        ];

        let digest = render(&postings, &options(), date());
        assert_eq!(digest.count, 3);
        assert_eq!(texts(&digest.html, "div.job b"), vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_render_placeholders() {
        let postings = vec![Posting::new("Dev", "Acme")];
        let digest = render(&postings, &options(), date());

        assert_eq!(texts(&digest.html, "small.posted"), vec![NO_DATE_PLACEHOLDER]);
        assert_eq!(texts(&digest.html, "small.platform"), vec!["via Unknown Source"]);
        assert_eq!(texts(&digest.html, "div.job i"), vec![NO_LINK_PLACEHOLDER]);
        assert!(texts(&digest.html, "a").is_empty());
    }

    #[test]
    fn test_render_prefers_apply_link() {
        let postings = vec![Posting::new("Dev", "Acme")
            .with_share_url("https://www.google.com/search?q=dev")
            .with_apply_url("https://www.linkedin.com/jobs/view/123")
            .with_posted_at("2 days ago")];
        let digest = render(&postings, &options(), date());

        let doc = Html::parse_fragment(&digest.html);
        let sel = Selector::parse("a").unwrap();
        let hrefs: Vec<_> = doc
            .select(&sel)
            .filter_map(|a| a.value().attr("href"))
            .collect();
        assert_eq!(hrefs, vec!["https://www.linkedin.com/jobs/view/123"]);
        assert_eq!(texts(&digest.html, "small.posted"), vec!["2 days ago"]);
        assert_eq!(texts(&digest.html, "small.platform"), vec!["via LinkedIn"]);
    }

    #[test]
    fn test_render_without_platform() {
        let mut opts = options();
        opts.show_platform = false;
        let digest = render(&[Posting::new("Dev", "Acme")], &opts, date());
        assert!(texts(&digest.html, "small.platform").is_empty());
    }

    #[test]
    fn test_render_escapes_html() {
        let postings = vec![Posting::new("<script>alert(1)</script>", "R&D \"Labs\"")];
        let digest = render(&postings, &options(), date());

        assert!(!digest.html.contains("<script>"));
        assert!(digest.html.contains("R&amp;D &quot;Labs&quot;"));
        assert_eq!(texts(&digest.html, "div.job b"), vec!["<script>alert(1)</script>"]);
    }

    #[test]
    fn test_render_empty() {
        let digest = render(&[], &options(), date());
        assert_eq!(digest.count, 0);
        assert_eq!(texts(&digest.html, "p"), vec![EMPTY_DIGEST_TEXT]);
        assert_eq!(texts(&digest.html, "h2"), vec!["Today's Job Results"]);
    }

    #[test]
    fn test_subject_template() {
        assert_eq!(
            subject("Jobs: {count} on {date}", 4, date()),
            "Jobs: 4 on 2026-10-19"
        );
        assert_eq!(
            render(&[], &options(), date()).subject,
            "Daily Job Updates (0 jobs, 2026-10-19)"
        );
    }

    #[test]
    fn test_render_is_deterministic() {
        let postings = vec![Posting::new("Dev", "Acme").with_share_url("https://g.co/1")];
        assert_eq!(
            render(&postings, &options(), date()),
            render(&postings, &options(), date())
        );
    }
}
