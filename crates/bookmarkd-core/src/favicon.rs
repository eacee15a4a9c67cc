//! Favicon URL derivation
//!
//! When a client saves a bookmark without a favicon, one is pointed at an
//! external lookup service keyed by the bookmark's host. The URL is only
//! built, never fetched or validated.

use url::Url;

use crate::config::DOMAIN_PLACEHOLDER;

/// Build the favicon URL for `bookmark_url` from a `{domain}` template
///
/// An unparseable URL yields an empty domain, as the service still answers
/// with a generic icon.
pub fn favicon_url(template: &str, bookmark_url: &str) -> String {
    let domain = Url::parse(bookmark_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_default();
    template.replace(DOMAIN_PLACEHOLDER, &domain)
}

/// Use the caller's favicon when given, otherwise derive one
pub fn resolve_favicon(template: &str, bookmark_url: &str, supplied: Option<&str>) -> String {
    match supplied {
        Some(favicon) if !favicon.is_empty() => favicon.to_string(),
        _ => favicon_url(template, bookmark_url),
    }
}
