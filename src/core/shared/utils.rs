use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Trimmed string content of a JSON value; anything that is not a string is empty.
pub fn normalize_text(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Like [`normalize_text`] but empty results become `None`.
pub fn non_empty_text(value: Option<&Value>) -> Option<String> {
    Some(normalize_text(value)).filter(|s| !s.is_empty())
}

pub fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Appends percent-encoded query parameters to a path.
pub fn with_query(path: &str, params: &[(&str, &str)]) -> String {
    if params.is_empty() {
        return path.to_string();
    }
    let query = params
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}{query}")
}

/// Decoded `key=value` pairs of a raw query string. `+` decodes to a space.
pub fn parse_query(raw: &str) -> Vec<(String, String)> {
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| spaced.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("jane@insurer.co"));
        assert!(is_valid_email("a.b+c@mail.example.org"));
        assert!(!is_valid_email("jane.insurer.co"));
        assert!(!is_valid_email("jane@insurer"));
        assert!(!is_valid_email("jane doe@insurer.co"));
        assert!(!is_valid_email("@insurer.co"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_normalize_text_ignores_non_strings() {
        assert_eq!(normalize_text(Some(&json!("  claim  "))), "claim");
        assert_eq!(normalize_text(Some(&json!(42))), "");
        assert_eq!(normalize_text(Some(&Value::Null)), "");
        assert_eq!(normalize_text(None), "");
        assert_eq!(non_empty_text(Some(&json!("   "))), None);
    }

    #[test]
    fn test_with_query_encodes_values() {
        assert_eq!(
            with_query("/register", &[("error", "Passwords do not match."), ("next", "/")]),
            "/register?error=Passwords%20do%20not%20match.&next=%2F"
        );
        assert_eq!(with_query("/admin?tab=1", &[("message", "ok")]), "/admin?tab=1&message=ok");
        assert_eq!(with_query("/login", &[]), "/login");
    }

    #[test]
    fn test_parse_query_decodes_pairs() {
        assert_eq!(
            parse_query("range=7d&team=a+b&q=%2Fx&flag&&"),
            vec![
                ("range".to_string(), "7d".to_string()),
                ("team".to_string(), "a b".to_string()),
                ("q".to_string(), "/x".to_string()),
                ("flag".to_string(), String::new()),
            ]
        );
        assert!(parse_query("").is_empty());
    }
}
