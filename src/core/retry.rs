//! Retry utilities: backoff builders for waiting on records that another
//! system creates asynchronously.
//!
//! Uses `backon` for the retry loop. Attempts always run one after another.

use backon::ConstantBuilder;

use crate::config::StaffBootstrapConfig;

/// Backoff for the staff bootstrap: `max_attempts` attempts in total, a fixed
/// delay between them. Zero attempts still runs once.
///
/// - Delay: `delay_ms` (250ms by default)
/// - Max attempts: `max_attempts` (6 by default)
/// - No jitter
pub fn bootstrap_backoff(settings: &StaffBootstrapConfig) -> ConstantBuilder {
    ConstantBuilder::default()
        .with_delay(settings.delay())
        .with_max_times(settings.max_attempts.saturating_sub(1) as usize)
}

/// Condition still unmet once the backoff ran out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RetryError {
    #[error("condition not met after {attempts} attempts: {last_reason}")]
    Exhausted { attempts: u32, last_reason: String },
}
