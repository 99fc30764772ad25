//! Bounded polling primitives.
//!
//! Every wait is `attempts × poll interval`. Nothing here waits on a clock
//! deadline, so a stalled surface still terminates after the attempt budget.

use crate::locator::Locator;
use crate::result::{WaypointError, WaypointResult};
use crate::surface::BrowserSurface;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Attempt budget and interval for a polling wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitOptions {
    /// Number of checks before giving up
    pub attempts: u32,
    /// Pause between checks in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::new(50, 100)
    }
}

impl WaitOptions {
    /// Create wait options
    #[must_use]
    pub const fn new(attempts: u32, poll_interval_ms: u64) -> Self {
        Self {
            attempts,
            poll_interval_ms,
        }
    }

    /// Set the attempt budget
    #[must_use]
    pub const fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Same budget with no pause between checks
    #[must_use]
    pub const fn instant(self) -> Self {
        self.with_poll_interval(0)
    }
}

// =============================================================================
// ELEMENT STATE
// =============================================================================

/// Element condition to wait for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementState {
    /// At least one match exists
    Attached,
    /// First match is rendered
    Visible,
    /// Nothing matches or the first match is not rendered
    Hidden,
    /// First match accepts input
    Enabled,
}

impl std::fmt::Display for ElementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Attached => "attached",
            Self::Visible => "visible",
            Self::Hidden => "hidden",
            Self::Enabled => "enabled",
        };
        f.write_str(name)
    }
}

// =============================================================================
// POLLING
// =============================================================================

/// Poll `check` until it returns `true`
///
/// A check that errors counts as unsatisfied; flaky reads are absorbed
/// until the budget runs out.
///
/// # Errors
///
/// [`WaypointError::Timeout`] after `options.attempts` unsatisfied checks
pub async fn poll_until<F, Fut>(
    surface: &dyn BrowserSurface,
    what: &str,
    options: WaitOptions,
    mut check: F,
) -> WaypointResult<()>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = WaypointResult<bool>>,
{
    for attempt in 1..=options.attempts {
        match check().await {
            Ok(true) => return Ok(()),
            Ok(false) => debug!(what, attempt, "condition not met"),
            Err(e) => debug!(what, attempt, error = %e, "condition check failed"),
        }
        if attempt < options.attempts {
            surface.pause(options.poll_interval()).await;
        }
    }
    Err(WaypointError::Timeout {
        what: what.to_string(),
        attempts: options.attempts,
    })
}

/// Wait for the first match of `locator` to reach `state`
///
/// # Errors
///
/// [`WaypointError::Timeout`] when the state is not reached in budget
pub async fn wait_for_element(
    surface: &dyn BrowserSurface,
    locator: &Locator,
    state: ElementState,
    options: WaitOptions,
) -> WaypointResult<()> {
    let what = format!("{locator} to be {state}");
    poll_until(surface, &what, options, move || async move {
        match state {
            ElementState::Attached => Ok(surface.count(locator).await? > 0),
            ElementState::Visible => surface.is_visible(locator).await,
            ElementState::Hidden => Ok(!surface.is_visible(locator).await?),
            ElementState::Enabled => surface.is_enabled(locator).await,
        }
    })
    .await
}

async fn poll_for_difference<T, F, Fut>(
    surface: &dyn BrowserSurface,
    what: &str,
    options: WaitOptions,
    mut read: F,
) -> WaypointResult<(T, Option<T>)>
where
    T: PartialEq + Debug,
    F: FnMut() -> Fut,
    Fut: Future<Output = WaypointResult<T>>,
{
    let original = read().await?;
    for attempt in 1..=options.attempts {
        surface.pause(options.poll_interval()).await;
        match read().await {
            Ok(current) if current != original => {
                debug!(what, attempt, ?original, ?current, "value changed");
                return Ok((original, Some(current)));
            }
            Ok(_) => {}
            Err(e) => debug!(what, attempt, error = %e, "read failed while polling"),
        }
    }
    Ok((original, None))
}

/// Poll `read` until it differs from its first sample
///
/// Returns the new value, or the original when nothing changed in budget.
///
/// # Errors
///
/// Only when the first read fails
pub async fn wait_for_change<T, F, Fut>(
    surface: &dyn BrowserSurface,
    what: &str,
    options: WaitOptions,
    read: F,
) -> WaypointResult<T>
where
    T: PartialEq + Debug,
    F: FnMut() -> Fut,
    Fut: Future<Output = WaypointResult<T>>,
{
    let (original, changed) = poll_for_difference(surface, what, options, read).await?;
    if changed.is_none() {
        debug!(what, attempts = options.attempts, "value unchanged");
    }
    Ok(changed.unwrap_or(original))
}

/// Like [`wait_for_change`] but an unchanged value is an error
///
/// # Errors
///
/// [`WaypointError::Timeout`] when the value never changes
pub async fn expect_change<T, F, Fut>(
    surface: &dyn BrowserSurface,
    what: &str,
    options: WaitOptions,
    read: F,
) -> WaypointResult<(T, T)>
where
    T: PartialEq + Debug,
    F: FnMut() -> Fut,
    Fut: Future<Output = WaypointResult<T>>,
{
    match poll_for_difference(surface, what, options, read).await? {
        (original, Some(current)) => Ok((original, current)),
        (_, None) => Err(WaypointError::Timeout {
            what: what.to_string(),
            attempts: options.attempts,
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::{MockElement, MockSurface};
    use std::sync::atomic::{AtomicU32, Ordering};

    mod options_tests {
        use super::*;

        #[test]
        fn test_builders() {
            let opts = WaitOptions::new(3, 10).with_attempts(5).with_poll_interval(20);
            assert_eq!(opts.attempts, 5);
            assert_eq!(opts.poll_interval(), Duration::from_millis(20));
            assert_eq!(opts.instant().poll_interval_ms, 0);
        }
    }

    mod poll_tests {
        use super::*;

        #[tokio::test]
        async fn test_poll_until_exhausts_exact_budget() {
            let mock = MockSurface::new();
            let checks = &AtomicU32::new(0);
            let err = poll_until(&mock, "never", WaitOptions::new(4, 7), move || async move {
                checks.fetch_add(1, Ordering::SeqCst);
                Ok(false)
            })
            .await
            .unwrap_err();
            assert_eq!(checks.load(Ordering::SeqCst), 4);
            assert!(matches!(err, WaypointError::Timeout { attempts: 4, .. }));
            assert_eq!(mock.pauses(), vec![Duration::from_millis(7); 3]);
        }

        #[tokio::test]
        async fn test_poll_until_absorbs_errors() {
            let mock = MockSurface::new();
            let checks = &AtomicU32::new(0);
            poll_until(&mock, "eventually", WaitOptions::new(5, 0), move || async move {
                let n = checks.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(WaypointError::script("not yet"))
                } else {
                    Ok(true)
                }
            })
            .await
            .unwrap();
            assert_eq!(checks.load(Ordering::SeqCst), 3);
        }

        #[tokio::test]
        async fn test_wait_for_element_states() {
            let mock = MockSurface::new();
            let loc = Locator::new(".options");
            let opts = WaitOptions::new(3, 0);
            assert!(wait_for_element(&mock, &loc, ElementState::Visible, opts)
                .await
                .is_err());
            assert!(wait_for_element(&mock, &loc, ElementState::Hidden, opts)
                .await
                .is_ok());
            mock.element(&loc, MockElement::new());
            assert!(wait_for_element(&mock, &loc, ElementState::Visible, opts)
                .await
                .is_ok());
        }
    }

    mod change_tests {
        use super::*;

        #[tokio::test]
        async fn test_wait_for_change_returns_new_value() {
            let mock = MockSurface::new();
            let reads = &AtomicU32::new(0);
            let value = wait_for_change(&mock, "photos", WaitOptions::new(10, 0), move || async move {
                Ok(if reads.fetch_add(1, Ordering::SeqCst) < 3 { 5 } else { 9 })
            })
            .await
            .unwrap();
            assert_eq!(value, 9);
        }

        #[tokio::test]
        async fn test_wait_for_change_returns_original_when_stable() {
            let mock = MockSurface::new();
            let value = wait_for_change(&mock, "time", WaitOptions::new(4, 0), || async { Ok(7) })
                .await
                .unwrap();
            assert_eq!(value, 7);
            assert_eq!(mock.pauses().len(), 4);
        }

        #[tokio::test]
        async fn test_expect_change_times_out() {
            let mock = MockSurface::new();
            let err = expect_change(&mock, "count", WaitOptions::new(10, 200), || async { Ok(3) })
                .await
                .unwrap_err();
            assert!(matches!(err, WaypointError::Timeout { attempts: 10, .. }));
        }
    }
}
