use std::future::Future;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::api::ApiClient;

/// One-shot gate that decides whether the shell opens a window at all.
pub struct ReadinessProbe {
    client: ApiClient,
}

impl ReadinessProbe {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Poll `/api/health` up to `max_attempts` times, sleeping `delay`
    /// between attempts. Returns on the first HTTP 200.
    pub async fn wait_ready(&self, max_attempts: u32, delay: Duration) -> bool {
        info!(url = %self.client.base_url(), "Waiting for backend");
        let client = &self.client;

        poll_until_ready(
            max_attempts,
            delay,
            |attempt| async move {
                match client.check_health().await {
                    Ok(()) => true,
                    Err(e) => {
                        debug!(attempt, error = %e, "Health check failed");
                        false
                    }
                }
            },
            tokio::time::sleep,
        )
        .await
    }
}

/// Fixed-delay polling loop. `check` receives the 1-based attempt number;
/// `sleep` runs between attempts only, never after the last one.
pub async fn poll_until_ready<C, CF, S, SF>(
    max_attempts: u32,
    delay: Duration,
    mut check: C,
    mut sleep: S,
) -> bool
where
    C: FnMut(u32) -> CF,
    CF: Future<Output = bool>,
    S: FnMut(Duration) -> SF,
    SF: Future<Output = ()>,
{
    for attempt in 1..=max_attempts {
        if check(attempt).await {
            info!(attempts = attempt, "Backend ready after {} attempts", attempt);
            return true;
        }
        if attempt < max_attempts {
            sleep(delay).await;
        }
    }

    warn!(attempts = max_attempts, "Backend not ready after {} attempts", max_attempts);
    false
}
