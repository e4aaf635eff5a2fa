//! Proactive rate-limit accounting.
//!
//! The upstream advertises its per-bucket budget on every response through
//! the `X-RateLimit-Remaining` and `X-RateLimit-Reset-After` headers. The
//! budget is recorded after each response and, when depleted, the client
//! sleeps through the advertised reset window before issuing the next
//! request instead of provoking a 429.

use std::sync::Mutex;
use std::time::Duration;

use reqwest::header::HeaderMap;
use tracing::debug;

const HEADER_REMAINING: &str = "X-RateLimit-Remaining";
const HEADER_RESET_AFTER: &str = "X-RateLimit-Reset-After";

/// Longest proactive sleep; anything larger is capped.
pub const MAX_PAUSE: Duration = Duration::from_secs(60);

/// Extra margin added on top of the advertised reset window.
const RESET_MARGIN: Duration = Duration::from_secs(1);

#[derive(Debug, Default, Clone, Copy)]
struct BudgetState {
    remaining: Option<f64>,
    reset_after: Option<Duration>,
}

/// Tracks the most recently advertised budget.
#[derive(Debug, Default)]
pub struct RateBudget {
    state: Mutex<BudgetState>,
}

impl RateBudget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the budget advertised by a response.
    pub fn observe(&self, headers: &HeaderMap) {
        let remaining = header_f64(headers, HEADER_REMAINING);
        let reset_after = header_f64(headers, HEADER_RESET_AFTER).map(Duration::from_secs_f64);

        let mut state = self.state.lock().expect("budget lock poisoned");
        state.remaining = remaining;
        state.reset_after = reset_after;
    }

    /// The pause required before the next request, if the budget is spent.
    ///
    /// Consumes the recorded state so one depleted response causes exactly
    /// one pause.
    pub fn required_pause(&self) -> Option<Duration> {
        let mut state = self.state.lock().expect("budget lock poisoned");
        let depleted = matches!(state.remaining, Some(r) if r <= 0.0);
        let reset_after = state.reset_after?;
        if !depleted {
            return None;
        }
        *state = BudgetState::default();
        Some((reset_after + RESET_MARGIN).min(MAX_PAUSE))
    }

    /// Sleep through the reset window when the budget is depleted.
    pub async fn pause_if_depleted(&self) {
        if let Some(pause) = self.required_pause() {
            debug!(pause_ms = pause.as_millis() as u64, "rate budget depleted, waiting");
            tokio::time::sleep(pause).await;
        }
    }
}

fn header_f64(headers: &HeaderMap, name: &str) -> Option<f64> {
    headers
        .get(name)?
        .to_str()
        .ok()?
        .trim()
        .parse::<f64>()
        .ok()
}
