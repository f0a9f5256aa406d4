//! In-memory stand-ins for the hosted data and auth services.

use crate::config::AppConfig;
use crate::core::shared::state::AppState;
use crate::directory::{AuthClient, AuthError, AuthSession, AuthUser, SignUpOutcome, SignUpRequest};
use crate::tables::{Row, StoreError, TableQuery, TableStore};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

pub const DEFAULT_TABLE: &str = "tickets";

#[derive(Debug)]
struct PendingRow {
    table: String,
    row: Row,
    remaining_calls: u32,
}

#[derive(Debug, Default)]
struct StoreInner {
    rows: HashMap<String, Vec<Row>>,
    pending: Vec<PendingRow>,
    rejected_columns: Vec<String>,
    insert_defaults: Row,
    select_failure: Option<String>,
    inserted: Vec<Row>,
    selects: Vec<TableQuery>,
    updates: Vec<(TableQuery, Row)>,
    next_id: i64,
}

/// Table store that keeps rows in memory and records every call.
///
/// Columns passed to [`MockTableStore::reject_columns`] behave like columns
/// missing from the live schema: any insert, filter or patch naming them fails.
#[derive(Debug, Default)]
pub struct MockTableStore {
    inner: Mutex<StoreInner>,
}

fn to_row(value: Value) -> Row {
    match value {
        Value::Object(row) => row,
        _ => Row::new(),
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn matches(row: &Row, query: &TableQuery) -> bool {
    query
        .filters
        .iter()
        .all(|(column, expected)| row.get(column).is_some_and(|v| !v.is_null() && text_of(v) == *expected))
}

impl MockTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(self, rows: Vec<Value>) -> Self {
        self.with_table_rows(DEFAULT_TABLE, rows)
    }

    pub fn with_table_rows(self, table: &str, rows: Vec<Value>) -> Self {
        self.lock()
            .rows
            .entry(table.to_string())
            .or_default()
            .extend(rows.into_iter().map(to_row));
        self
    }

    /// The row becomes visible on the `nth_call` select or update against `table`.
    pub fn with_row_appearing_on_call(self, table: &str, row: Value, nth_call: u32) -> Self {
        self.lock().pending.push(PendingRow {
            table: table.to_string(),
            row: to_row(row),
            remaining_calls: nth_call.max(1),
        });
        self
    }

    pub fn reject_columns(self, columns: &[&str]) -> Self {
        self.lock()
            .rejected_columns
            .extend(columns.iter().map(|c| c.to_string()));
        self
    }

    /// Server-assigned columns merged into every accepted insert.
    pub fn with_insert_defaults(self, defaults: Value) -> Self {
        self.lock().insert_defaults = to_row(defaults);
        self
    }

    pub fn fail_selects(self, message: &str) -> Self {
        self.lock().select_failure = Some(message.to_string());
        self
    }

    /// Every insert payload received, accepted or not.
    pub fn inserted(&self) -> Vec<Row> {
        self.lock().inserted.clone()
    }

    pub fn selects(&self) -> Vec<TableQuery> {
        self.lock().selects.clone()
    }

    pub fn updates(&self) -> Vec<(TableQuery, Row)> {
        self.lock().updates.clone()
    }

    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.lock().rows.get(table).cloned().unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl StoreInner {
    fn rejected<'a>(&self, mut columns: impl Iterator<Item = &'a String>) -> Option<StoreError> {
        columns
            .find(|c| self.rejected_columns.contains(c))
            .map(|c| StoreError::Rejected(format!("column \"{c}\" does not exist")))
    }

    fn tick_pending(&mut self, table: &str) {
        let mut still_pending = Vec::new();
        for mut pending in std::mem::take(&mut self.pending) {
            if pending.table == table {
                pending.remaining_calls -= 1;
                if pending.remaining_calls == 0 {
                    self.rows.entry(pending.table).or_default().push(pending.row);
                    continue;
                }
            }
            still_pending.push(pending);
        }
        self.pending = still_pending;
    }
}

#[async_trait]
impl TableStore for MockTableStore {
    async fn insert(&self, table: &str, row: Row) -> Result<Row, StoreError> {
        let mut inner = self.lock();
        inner.inserted.push(row.clone());
        if let Some(err) = inner.rejected(row.keys()) {
            return Err(err);
        }

        inner.next_id += 1;
        let mut stored = inner.insert_defaults.clone();
        stored
            .entry("id".to_string())
            .or_insert_with(|| Value::from(inner.next_id));
        stored.extend(row);
        inner
            .rows
            .entry(table.to_string())
            .or_default()
            .push(stored.clone());
        Ok(stored)
    }

    async fn select(&self, table: &str, query: &TableQuery) -> Result<Vec<Row>, StoreError> {
        let mut inner = self.lock();
        inner.selects.push(query.clone());
        inner.tick_pending(table);
        if let Some(message) = &inner.select_failure {
            return Err(StoreError::Transport(message.clone()));
        }
        if let Some(err) = inner.rejected(query.filters.iter().map(|(c, _)| c)) {
            return Err(err);
        }

        let mut rows: Vec<Row> = inner
            .rows
            .get(table)
            .map(|rows| rows.iter().filter(|r| matches(r, query)).cloned().collect())
            .unwrap_or_default();

        if let Some(order) = &query.order {
            rows.sort_by_key(|r| r.get(&order.column).map(text_of).unwrap_or_default());
            if order.descending {
                rows.reverse();
            }
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn update(&self, table: &str, query: &TableQuery, patch: Row) -> Result<Vec<Row>, StoreError> {
        let mut inner = self.lock();
        inner.updates.push((query.clone(), patch.clone()));
        inner.tick_pending(table);
        if let Some(err) = inner.rejected(query.filters.iter().map(|(c, _)| c).chain(patch.keys())) {
            return Err(err);
        }

        let mut updated = Vec::new();
        if let Some(rows) = inner.rows.get_mut(table) {
            for row in rows.iter_mut().filter(|r| matches(r, query)) {
                row.extend(patch.clone());
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }
}

#[derive(Debug, Default)]
struct AuthInner {
    accounts: HashMap<String, String>,
    sign_ups: Vec<SignUpRequest>,
    sign_up_error: Option<String>,
    issue_session: bool,
}

/// Auth service stand-in. Sign-up registers the account so it can sign in later.
#[derive(Debug)]
pub struct MockAuthClient {
    user_id: String,
    inner: Mutex<AuthInner>,
}

impl Default for MockAuthClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockAuthClient {
    pub fn new() -> Self {
        Self {
            user_id: "user-1".to_string(),
            inner: Mutex::new(AuthInner {
                issue_session: true,
                ..AuthInner::default()
            }),
        }
    }

    pub fn with_user_id(mut self, user_id: &str) -> Self {
        self.user_id = user_id.to_string();
        self
    }

    /// Sign-up succeeds but the account still needs email confirmation.
    pub fn without_session(self) -> Self {
        self.lock().issue_session = false;
        self
    }

    pub fn reject_sign_up(self, message: &str) -> Self {
        self.lock().sign_up_error = Some(message.to_string());
        self
    }

    pub fn with_account(self, email: &str, password: &str) -> Self {
        self.lock()
            .accounts
            .insert(email.to_string(), password.to_string());
        self
    }

    pub fn sign_ups(&self) -> Vec<SignUpRequest> {
        self.lock().sign_ups.clone()
    }

    fn lock(&self) -> MutexGuard<'_, AuthInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn session_for(&self, email: &str) -> AuthSession {
        AuthSession {
            access_token: format!("token-for-{}", self.user_id),
            refresh_token: None,
            expires_in: Some(3600),
            user: AuthUser {
                id: self.user_id.clone(),
                email: Some(email.to_string()),
            },
        }
    }
}

#[async_trait]
impl AuthClient for MockAuthClient {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<SignUpOutcome, AuthError> {
        let issue_session = {
            let mut inner = self.lock();
            inner.sign_ups.push(request.clone());
            if let Some(message) = &inner.sign_up_error {
                return Err(AuthError::Rejected(message.clone()));
            }
            inner
                .accounts
                .insert(request.email.clone(), request.password.clone());
            inner.issue_session
        };

        let session = issue_session.then(|| self.session_for(&request.email));
        Ok(SignUpOutcome {
            user: AuthUser {
                id: self.user_id.clone(),
                email: Some(request.email.clone()),
            },
            session,
        })
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let known = self.lock().accounts.get(email).is_some_and(|p| p == password);
        if known {
            Ok(self.session_for(email))
        } else {
            Err(AuthError::Rejected("Invalid login credentials".to_string()))
        }
    }
}

/// Application state wired to the given in-memory collaborators.
pub fn mock_state(config: AppConfig, tables: Arc<MockTableStore>, auth: Arc<MockAuthClient>) -> AppState {
    AppState::new(config, tables, auth)
}

/// Fast retry settings so tests do not sleep for real intervals.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.staff_bootstrap.delay_ms = 1;
    config
}
