//! Server-rendered pages: home, login, register and the admin shell.

use askama::Template;
use axum::{
    extract::{Query, RawQuery},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use log::error;
use std::collections::HashMap;

use super::redirect::safe_next;
use crate::core::shared::utils::{parse_query, with_query};
use crate::core::urls::PageUrls;

fn param(params: &HashMap<String, String>, key: &str) -> String {
    params.get(key).cloned().unwrap_or_default()
}

fn render_page<T: Template>(template: T) -> Response {
    match template.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Failed to render page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to render page").into_response()
        }
    }
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub submit_href: &'static str,
    pub track_href: &'static str,
}

impl Default for HomeTemplate {
    fn default() -> Self {
        Self {
            submit_href: PageUrls::SUBMIT,
            track_href: PageUrls::TRACK,
        }
    }
}

/// Login page template
#[derive(Template)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub message: String,
    pub error: String,
    pub next: String,
    pub register_href: String,
}

impl LoginTemplate {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let next = safe_next(params.get("next").map(String::as_str));
        Self {
            message: param(params, "message"),
            error: param(params, "error"),
            register_href: with_query(PageUrls::REGISTER, &[("next", &next)]),
            next,
        }
    }
}

#[derive(Template)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub error: String,
    pub next: String,
    pub login_href: String,
}

impl RegisterTemplate {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let next = safe_next(params.get("next").map(String::as_str));
        Self {
            error: param(params, "error"),
            login_href: with_query(PageUrls::LOGIN, &[("next", &next)]),
            next,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminTab {
    pub href: String,
    pub label: &'static str,
    pub active: bool,
}

/// Overview and Statistics tabs. Only the tab for `current_path` is active;
/// both links carry the current query, re-encoded.
pub fn admin_tabs(current_path: &str, raw_query: Option<&str>) -> Vec<AdminTab> {
    let pairs = parse_query(raw_query.unwrap_or_default());
    let params: Vec<(&str, &str)> = pairs
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();

    [
        (PageUrls::ADMIN, "Overview"),
        (PageUrls::ADMIN_STATISTICS, "Statistics"),
    ]
    .into_iter()
    .map(|(path, label)| AdminTab {
        href: with_query(path, &params),
        label,
        active: current_path == path,
    })
    .collect()
}

#[derive(Template)]
#[template(path = "admin/shell.html")]
pub struct AdminShellTemplate {
    pub heading: &'static str,
    pub blurb: &'static str,
    pub tabs: Vec<AdminTab>,
}

pub async fn home_page() -> Response {
    render_page(HomeTemplate::default())
}

pub async fn login_page(Query(params): Query<HashMap<String, String>>) -> Response {
    render_page(LoginTemplate::from_params(&params))
}

pub async fn register_page(Query(params): Query<HashMap<String, String>>) -> Response {
    render_page(RegisterTemplate::from_params(&params))
}

pub async fn admin_overview(RawQuery(query): RawQuery) -> Response {
    render_page(AdminShellTemplate {
        heading: "Overview",
        blurb: "Incoming complaints and their current status.",
        tabs: admin_tabs(PageUrls::ADMIN, query.as_deref()),
    })
}

pub async fn admin_statistics(RawQuery(query): RawQuery) -> Response {
    render_page(AdminShellTemplate {
        heading: "Statistics",
        blurb: "Ticket volumes by priority and category.",
        tabs: admin_tabs(PageUrls::ADMIN_STATISTICS, query.as_deref()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_login_shows_messages_escaped() {
        let html = LoginTemplate::from_params(&params(&[
            ("message", "Account created."),
            ("error", "<script>alert(1)</script>"),
            ("next", "/admin"),
        ]))
        .render()
        .expect("login page renders");

        assert!(html.contains(r#"<p class="notice">Account created.</p>"#));
        assert!(html.contains("alert(1)"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("next=%2Fadmin"));
    }

    #[test]
    fn test_login_defaults_next_to_root() {
        let page = LoginTemplate::from_params(&params(&[("next", "https://evil.test")]));
        assert_eq!(page.next, "/");
        assert_eq!(page.register_href, "/register?next=%2F");

        let html = page.render().expect("login page renders");
        assert!(!html.contains("evil.test"));
        assert!(!html.contains(r#"class="error""#));
    }

    #[test]
    fn test_register_carries_next_to_login_link() {
        let page = RegisterTemplate::from_params(&params(&[
            ("error", "Passwords do not match."),
            ("next", "/track"),
        ]));
        assert_eq!(page.login_href, "/login?next=%2Ftrack");

        let html = page.render().expect("register page renders");
        assert!(html.contains("Passwords do not match."));
        assert!(html.contains(r#"name="confirmPassword""#));
    }

    #[test]
    fn test_home_links_to_submit_and_track() {
        let html = HomeTemplate::default().render().expect("home renders");
        assert!(html.contains("AI-Powered Complaint Resolution"));
        assert!(html.contains("Submit a Complaint"));
        assert!(html.contains("Track Your Ticket"));
    }

    #[test]
    fn test_admin_tabs_mark_current_path() {
        let tabs = admin_tabs(PageUrls::ADMIN_STATISTICS, Some("range=7d&team=a+b"));

        assert_eq!(
            tabs,
            vec![
                AdminTab {
                    href: "/admin?range=7d&team=a%20b".to_string(),
                    label: "Overview",
                    active: false,
                },
                AdminTab {
                    href: "/admin/statistics?range=7d&team=a%20b".to_string(),
                    label: "Statistics",
                    active: true,
                },
            ]
        );
    }

    #[test]
    fn test_admin_tabs_without_query() {
        let tabs = admin_tabs(PageUrls::ADMIN, None);
        assert_eq!(tabs[0].href, "/admin");
        assert_eq!(tabs[1].href, "/admin/statistics");
        assert_eq!(tabs.iter().filter(|t| t.active).count(), 1);
        assert!(tabs[0].active);
    }

    #[test]
    fn test_admin_shell_renders_single_active_tab() {
        let html = AdminShellTemplate {
            heading: "Overview",
            blurb: "Incoming complaints and their current status.",
            tabs: admin_tabs(PageUrls::ADMIN, Some("range=7d")),
        }
        .render()
        .expect("admin shell renders");

        assert_eq!(html.matches(r#"class="nav-tab nav-tab-active""#).count(), 1);
        assert_eq!(html.matches("range=7d").count(), 2);
    }
}
