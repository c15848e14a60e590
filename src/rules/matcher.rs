//! URL normalization and rule matching

use url::Url;

use super::Rule;
use crate::{RefreshError, Result};

/// Check whether a URL uses an http or https scheme
pub fn is_web_url(url: &str) -> bool {
    let lower = url.get(..8).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Check whether a tab URL falls under a rule base
pub fn matches_rule(url: &str, base_url: &str) -> bool {
    is_web_url(url) && url.starts_with(base_url)
}

/// Pick the most specific rule for a URL.
///
/// Among all rules whose base is a prefix of `url`, the one with the longest base
/// wins. Equal lengths keep list order.
pub fn pick_rule<'a>(rules: &'a [Rule], url: &str) -> Option<&'a Rule> {
    let mut best: Option<&Rule> = None;
    for rule in rules.iter().filter(|r| matches_rule(url, &r.base_url)) {
        match best {
            Some(current) if current.base_url.len() >= rule.base_url.len() => {}
            _ => best = Some(rule),
        }
    }
    best
}

fn parse_web_origin(url: &str) -> Result<(Url, String)> {
    let parsed = Url::parse(url.trim()).map_err(|_| RefreshError::InvalidUrl(url.to_string()))?;
    let origin = parsed.origin();
    if !origin.is_tuple() {
        return Err(RefreshError::InvalidUrl(url.to_string()));
    }
    let origin = origin.ascii_serialization();
    Ok((parsed, origin))
}

/// Normalize a page URL to its origin plus a slash-terminated path.
///
/// Query and fragment are dropped: `https://a.com/x?q=1` becomes `https://a.com/x/`.
pub fn normalize_base_url(url: &str) -> Result<String> {
    let (parsed, origin) = parse_web_origin(url)?;
    let path = parsed.path();
    if path.ends_with('/') {
        Ok(format!("{}{}", origin, path))
    } else {
        Ok(format!("{}{}/", origin, path))
    }
}

/// Normalize a page URL to `scheme://host[:port]/`
pub fn normalize_origin(url: &str) -> Result<String> {
    let (_, origin) = parse_web_origin(url)?;
    Ok(format!("{}/", origin))
}

/// Interpret a base URL typed by a user.
///
/// Input is trimmed and `https://` is assumed when no web scheme is given. The
/// result is otherwise kept as typed, so it can be a partial path prefix.
pub fn parse_user_base_url(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(RefreshError::InvalidUrl(input.to_string()));
    }
    let candidate = if is_web_url(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    Url::parse(&candidate).map_err(|_| RefreshError::InvalidUrl(input.to_string()))?;
    Ok(candidate)
}
