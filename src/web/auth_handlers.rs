//! Form handlers for registration and password login.

use axum::{extract::State, response::Redirect, Form};
use serde::Deserialize;
use std::sync::Arc;
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};
use tracing::{info, warn};

use super::redirect::safe_next;
use super::registration::{register, RegistrationForm, CREDENTIALS_REQUIRED};
use crate::config::AppConfig;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::with_query;
use crate::core::urls::PageUrls;
use crate::directory::AuthSession;

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub next: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("next", &self.next)
            .finish_non_exhaustive()
    }
}

/// Session cookie carrying the access token issued by the auth service.
pub fn create_auth_cookie(config: &AppConfig, session: &AuthSession) -> Cookie<'static> {
    Cookie::build((config.auth.cookie_name.clone(), session.access_token.clone()))
        .path("/")
        .secure(config.is_production())
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(config.auth.cookie_max_age_hours))
        .build()
}

pub async fn register_submit(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Form(form): Form<RegistrationForm>,
) -> Redirect {
    let outcome = register(&state, &form).await;

    if let Some(session) = outcome.session() {
        cookies.add(create_auth_cookie(&state.config, session));
        info!("Registered and signed in {}", form.email.trim());
    }

    Redirect::to(&outcome.redirect_location())
}

pub async fn login_submit(
    State(state): State<Arc<AppState>>,
    cookies: Cookies,
    Form(form): Form<LoginForm>,
) -> Redirect {
    let next = safe_next(Some(&form.next));
    let email = form.email.trim();

    if email.is_empty() || form.password.is_empty() {
        return login_error(CREDENTIALS_REQUIRED, &next);
    }

    match state.auth.sign_in_with_password(email, &form.password).await {
        Ok(session) => {
            cookies.add(create_auth_cookie(&state.config, &session));
            info!("User {} signed in", session.user.id);
            Redirect::to(&next)
        }
        Err(e) => {
            warn!("Sign-in failed for {}: {}", email, e);
            login_error(&e.user_message(), &next)
        }
    }
}

fn login_error(message: &str, next: &str) -> Redirect {
    Redirect::to(&with_query(
        PageUrls::LOGIN,
        &[("error", message), ("next", next)],
    ))
}
