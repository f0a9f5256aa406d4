//! Browser-facing routes: pages plus the login and registration forms.

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::core::shared::state::AppState;
use crate::core::urls::PageUrls;

pub mod auth_handlers;
pub mod pages;
pub mod redirect;
pub mod registration;

pub use redirect::safe_next;
pub use registration::{register, RegistrationError, RegistrationForm, RegistrationOutcome};

pub fn configure_web_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(PageUrls::HOME, get(pages::home_page))
        .route(
            PageUrls::LOGIN,
            get(pages::login_page).post(auth_handlers::login_submit),
        )
        .route(
            PageUrls::REGISTER,
            get(pages::register_page).post(auth_handlers::register_submit),
        )
        .route(PageUrls::ADMIN, get(pages::admin_overview))
        .route(PageUrls::ADMIN_STATISTICS, get(pages::admin_statistics))
}
