//! Renewal scheduling for the credential bundle.
//!
//! The session renews its credentials proactively: about one minute before
//! expiry, never more than fifteen minutes out even for long-lived tokens,
//! and never sooner than thirty seconds from now. An already-expired
//! credential gets no timer at all - the session logs out immediately.

use std::sync::Mutex;
use std::time::Duration;

use tokio::task::AbortHandle;

/// Renew this long before the credential expires.
pub const RENEW_LEAD: Duration = Duration::from_secs(60);

/// Never schedule a renewal sooner than this.
pub const MIN_DELAY: Duration = Duration::from_secs(30);

/// Never wait longer than this, even for long-lived credentials.
pub const MAX_DELAY: Duration = Duration::from_secs(15 * 60);

/// Retry delay after a transient refresh failure.
pub const RETRY_DELAY: Duration = Duration::from_secs(30);

/// Compute the renewal delay for a credential with `remaining_secs` of
/// lifetime left.
///
/// Returns `None` when the credential is already expired: the caller must
/// log out instead of scheduling anything.
#[must_use]
pub fn renewal_delay(remaining_secs: i64) -> Option<Duration> {
    if remaining_secs <= 0 {
        return None;
    }
    let target = Duration::from_secs(remaining_secs.unsigned_abs()).saturating_sub(RENEW_LEAD);
    Some(target.clamp(MIN_DELAY, MAX_DELAY))
}

/// Owner of the single renewal timer task.
///
/// The timer is the only autonomously scheduled activity in the engine and
/// the only resource requiring disposal: it is cancelled and rearmed on
/// every credential change and cancelled for good on logout.
#[derive(Debug, Default)]
pub struct RenewalTimer {
    handle: Mutex<Option<AbortHandle>>,
}

impl RenewalTimer {
    /// Cancel any pending renewal.
    pub fn cancel(&self) {
        if let Ok(mut guard) = self.handle.lock()
            && let Some(handle) = guard.take()
        {
            handle.abort();
        }
    }

    /// Replace the pending renewal with `handle`, cancelling the old one.
    pub fn replace(&self, handle: AbortHandle) {
        if let Ok(mut guard) = self.handle.lock() {
            if let Some(old) = guard.take() {
                old.abort();
            }
            *guard = Some(handle);
        }
    }

    /// Whether a renewal is currently scheduled.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.handle
            .lock()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renews_one_minute_before_expiry() {
        // 2 minutes remaining -> renew in 60s
        assert_eq!(renewal_delay(120), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_long_lifetimes_are_capped() {
        // 30 minutes remaining -> capped at 15 minutes
        assert_eq!(renewal_delay(30 * 60), Some(Duration::from_secs(15 * 60)));
    }

    #[test]
    fn test_short_lifetimes_hit_the_floor() {
        // 45s remaining: 45 - 60 saturates to 0, floored at 30s
        assert_eq!(renewal_delay(45), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_expired_credentials_get_no_timer() {
        assert_eq!(renewal_delay(0), None);
        assert_eq!(renewal_delay(-10), None);
    }
}
