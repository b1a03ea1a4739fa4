/// Finds `name=value` in a list of `Set-Cookie` header values.
///
/// Only the leading pair of each header is considered, so attributes such as
/// `Path=/` never match. Empty values (cookie deletion) are skipped.
pub fn extract_cookie(set_cookies: &[String], name: &str) -> Option<String> {
    for header in set_cookies {
        let pair = header.split(';').next().unwrap_or("").trim();
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        let value = value.trim();
        if key.trim() == name && !value.is_empty() {
            return Some(format!("{}={}", name, value));
        }
    }
    None
}

/// Builds a `Cookie` header from the tokens that are present, keeping order.
pub fn join_cookies(tokens: &[Option<&str>]) -> Option<String> {
    let joined = tokens
        .iter()
        .flatten()
        .filter(|t| !t.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("; ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}
