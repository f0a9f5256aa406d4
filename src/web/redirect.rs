use crate::core::urls::PageUrls;

/// Post-flow destination, restricted to same-origin relative paths.
///
/// Accepts only values starting with a single `/`; protocol-relative
/// (`//host`), backslash (`/\host`) and absolute URLs fall back to `/`.
pub fn safe_next(raw: Option<&str>) -> String {
    let Some(candidate) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return PageUrls::HOME.to_string();
    };

    let mut chars = candidate.chars();
    let first = chars.next();
    let second = chars.next();
    let acceptable = first == Some('/')
        && !matches!(second, Some('/') | Some('\\'))
        && !candidate.chars().any(char::is_control);

    if acceptable {
        candidate.to_string()
    } else {
        PageUrls::HOME.to_string()
    }
}
