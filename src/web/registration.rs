//! Account registration with optional staff promotion.
//!
//! [`register`] never builds HTTP responses; it returns a
//! [`RegistrationOutcome`] and the handler decides how to render it.

use backon::{ConstantBuilder, Retryable};
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::redirect::safe_next;
use crate::core::retry::{bootstrap_backoff, RetryError};
use crate::core::shared::state::AppState;
use crate::core::shared::utils::{non_empty, with_query};
use crate::core::urls::PageUrls;
use crate::directory::{AuthError, AuthSession, SignUpRequest};
use crate::tables::{Row, TableQuery, TableStore};

pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const STAFF_ROLE: &str = "Staff";

pub const CREDENTIALS_REQUIRED: &str = "Email and password are required.";
pub const PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters.";
pub const PASSWORDS_DIFFER: &str = "Passwords do not match.";
pub const ACCOUNT_CREATED: &str = "Account created successfully.";
pub const SIGN_IN_TO_CONTINUE: &str = "Account created. Please sign in to continue.";
pub const BOOTSTRAP_INCOMPLETE: &str = "Account created, but staff bootstrap did not complete. \
     Sign in and ask an administrator to grant staff access.";

#[derive(Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
    pub next: String,
}

impl std::fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("next", &self.next)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// The account exists but its profile row never showed up.
    #[error("Staff bootstrap did not complete: {0}")]
    ConsistencyTimeout(#[from] RetryError),
}

impl RegistrationError {
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Auth(e) => e.user_message(),
            Self::ConsistencyTimeout(_) => BOOTSTRAP_INCOMPLETE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Completed {
        destination: String,
        session: Option<AuthSession>,
        promoted: bool,
    },
    Failed {
        error: RegistrationError,
        next: String,
    },
}

impl RegistrationOutcome {
    /// Where the browser goes next, with the status carried in the query string.
    pub fn redirect_location(&self) -> String {
        match self {
            Self::Completed {
                destination,
                session: Some(_),
                ..
            } => with_query(destination, &[("message", ACCOUNT_CREATED)]),
            Self::Completed {
                destination,
                session: None,
                ..
            } => with_query(
                PageUrls::LOGIN,
                &[("message", SIGN_IN_TO_CONTINUE), ("next", destination)],
            ),
            Self::Failed {
                error: error @ RegistrationError::ConsistencyTimeout(_),
                next,
            } => with_query(
                PageUrls::LOGIN,
                &[("error", &error.user_message()), ("next", next)],
            ),
            Self::Failed { error, next } => with_query(
                PageUrls::REGISTER,
                &[("error", &error.user_message()), ("next", next)],
            ),
        }
    }

    pub fn session(&self) -> Option<&AuthSession> {
        match self {
            Self::Completed { session, .. } => session.as_ref(),
            Self::Failed { .. } => None,
        }
    }
}

pub fn validate(form: &RegistrationForm) -> Result<SignUpRequest, RegistrationError> {
    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        return Err(RegistrationError::Validation(CREDENTIALS_REQUIRED.to_string()));
    }
    if form.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(RegistrationError::Validation(PASSWORD_TOO_SHORT.to_string()));
    }
    if form.password != form.confirm_password {
        return Err(RegistrationError::Validation(PASSWORDS_DIFFER.to_string()));
    }

    Ok(SignUpRequest {
        email: email.to_string(),
        password: form.password.clone(),
        first_name: non_empty(Some(&form.first_name)),
        last_name: non_empty(Some(&form.last_name)),
    })
}

fn staff_patch() -> Row {
    let mut patch = Row::new();
    patch.insert("role".to_string(), json!(STAFF_ROLE));
    patch.insert("is_active".to_string(), json!(true));
    patch
}

/// Promotes the profile row of `user_id`, waiting for it to be created.
///
/// The row is inserted by a trigger after sign-up, so an update that matches
/// nothing (or fails) counts as "not there yet" until the backoff runs out.
pub async fn promote_to_staff(
    store: &dyn TableStore,
    table: &str,
    user_id: &str,
    backoff: ConstantBuilder,
) -> Result<Row, RetryError> {
    let query = TableQuery::new().eq("id", user_id);
    let mut attempts = 0u32;

    let result = (|| {
        attempts += 1;
        let query = query.clone();
        async move {
            match store.update(table, &query, staff_patch()).await {
                Ok(rows) => rows
                    .into_iter()
                    .next()
                    .ok_or_else(|| format!("profile {user_id} not created yet")),
                Err(e) => Err(e.to_string()),
            }
        }
    })
    .retry(backoff)
    .notify(|reason: &String, delay: Duration| {
        debug!("Profile {} not ready ({}), retrying in {:?}", user_id, reason, delay);
    })
    .await;

    match result {
        Ok(row) => {
            info!("Profile {} promoted to staff after {} attempt(s)", user_id, attempts);
            Ok(row)
        }
        Err(last_reason) => Err(RetryError::Exhausted {
            attempts,
            last_reason,
        }),
    }
}

pub async fn register(state: &AppState, form: &RegistrationForm) -> RegistrationOutcome {
    let next = safe_next(Some(&form.next));

    let request = match validate(form) {
        Ok(request) => request,
        Err(error) => return RegistrationOutcome::Failed { error, next },
    };

    let signed_up = match state.auth.sign_up(&request).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("Sign-up failed for {}: {}", request.email, e);
            return RegistrationOutcome::Failed {
                error: e.into(),
                next,
            };
        }
    };

    let mut promoted = false;
    if state.config.staff_bootstrap_active() {
        match promote_to_staff(
            state.tables.as_ref(),
            state.profiles_table(),
            &signed_up.user.id,
            bootstrap_backoff(&state.config.staff_bootstrap),
        )
        .await
        {
            Ok(_) => promoted = true,
            Err(e) => {
                warn!("Staff bootstrap for {} gave up: {}", request.email, e);
                return RegistrationOutcome::Failed {
                    error: e.into(),
                    next,
                };
            }
        }
    }

    let destination = if promoted {
        PageUrls::STAFF_HOME.to_string()
    } else {
        next
    };

    RegistrationOutcome::Completed {
        destination,
        session: signed_up.session,
        promoted,
    }
}
