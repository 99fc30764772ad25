//! Before/after sampling around a mutation.
//!
//! ```
//! # futures::executor::block_on(async {
//! use waypoint::change::{sampler, ChangeCheck};
//! use std::cell::Cell;
//!
//! let photos = &Cell::new(120.0_f64);
//! let bracket = ChangeCheck::new(sampler(move || async move { Ok(photos.get()) }))
//!     .begin()
//!     .await?;
//! photos.set(150.0);
//! let sample = bracket.finish().await?;
//! assert_eq!(sample.change, 30.0);
//! # Ok::<(), waypoint::WaypointError>(())
//! # }).unwrap();
//! ```
//!
//! A bracket is consumed by `finish`, so it cannot be finalised twice.
//! Independent brackets may nest around the same action.

use crate::result::WaypointResult;
use futures::future::LocalBoxFuture;
use std::future::Future;
use std::ops::Sub;

/// Re-invocable sampling function
pub type Sampler<'a, T> = Box<dyn Fn() -> LocalBoxFuture<'a, WaypointResult<T>> + 'a>;

type DeltaFn<'a, T, D> = Box<dyn Fn(&T, &T) -> D + 'a>;

/// Box an async closure as a [`Sampler`]
pub fn sampler<'a, T, F, Fut>(f: F) -> Sampler<'a, T>
where
    F: Fn() -> Fut + 'a,
    Fut: Future<Output = WaypointResult<T>> + 'a,
{
    Box::new(move || Box::pin(f()))
}

/// Samples taken around a mutation
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSample<T, D = T> {
    /// Value before the mutation
    pub before: T,
    /// Value after the mutation
    pub after: T,
    /// Delta computed from `before` and `after`
    pub change: D,
}

/// Change check definition, not yet started
pub struct ChangeCheck<'a, T, D = T> {
    before: Sampler<'a, T>,
    after: Option<Sampler<'a, T>>,
    delta: DeltaFn<'a, T, D>,
}

impl<T, D> std::fmt::Debug for ChangeCheck<'_, T, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeCheck")
            .field("separate_after", &self.after.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a, T> ChangeCheck<'a, T, T>
where
    T: Sub<Output = T> + Clone + 'a,
{
    /// Sample with `sampler` before and after; delta is `after - before`
    #[must_use]
    pub fn new(sampler: Sampler<'a, T>) -> Self {
        Self {
            before: sampler,
            after: None,
            delta: Box::new(|before: &T, after: &T| after.clone() - before.clone()),
        }
    }
}

impl<'a, T, D> ChangeCheck<'a, T, D> {
    /// Sample with `sampler` before and after, comparing with `delta`
    #[must_use]
    pub fn comparing(sampler: Sampler<'a, T>, delta: impl Fn(&T, &T) -> D + 'a) -> Self {
        Self {
            before: sampler,
            after: None,
            delta: Box::new(delta),
        }
    }

    /// Use a different sampler for the `after` value
    #[must_use]
    pub fn with_after(mut self, sampler: Sampler<'a, T>) -> Self {
        self.after = Some(sampler);
        self
    }

    /// Replace the delta function
    #[must_use]
    pub fn with_delta<E>(self, delta: impl Fn(&T, &T) -> E + 'a) -> ChangeCheck<'a, T, E> {
        ChangeCheck {
            before: self.before,
            after: self.after,
            delta: Box::new(delta),
        }
    }

    /// Capture the `before` value
    ///
    /// # Errors
    ///
    /// Propagates the sampler's error
    pub async fn begin(self) -> WaypointResult<ChangeBracket<'a, T, D>> {
        let before = (self.before)().await?;
        Ok(ChangeBracket {
            check: self,
            before,
        })
    }
}

/// Open bracket holding the `before` value
pub struct ChangeBracket<'a, T, D = T> {
    check: ChangeCheck<'a, T, D>,
    before: T,
}

impl<T: std::fmt::Debug, D> std::fmt::Debug for ChangeBracket<'_, T, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeBracket")
            .field("before", &self.before)
            .finish_non_exhaustive()
    }
}

impl<T, D> ChangeBracket<'_, T, D> {
    /// Value captured by `begin`
    pub const fn before(&self) -> &T {
        &self.before
    }

    /// Capture `after` and compute the delta
    ///
    /// # Errors
    ///
    /// Propagates the sampler's error
    pub async fn finish(self) -> WaypointResult<ChangeSample<T, D>> {
        let sampler = self.check.after.as_ref().unwrap_or(&self.check.before);
        let after = sampler().await?;
        let change = (self.check.delta)(&self.before, &after);
        Ok(ChangeSample {
            before: self.before,
            after,
            change,
        })
    }

    /// Run `action` inside the bracket, finishing even when it fails
    ///
    /// # Errors
    ///
    /// The action's error takes precedence over a sampling error
    pub async fn around<F, Fut, R>(self, action: F) -> WaypointResult<(R, ChangeSample<T, D>)>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = WaypointResult<R>>,
    {
        let outcome = action().await;
        let sample = self.finish().await;
        let value = outcome?;
        Ok((value, sample?))
    }
}

/// Sample, run `action`, sample again
///
/// # Errors
///
/// Propagates sampler and action errors
pub async fn check_change<'a, T, F, Fut, R>(
    sampler: Sampler<'a, T>,
    action: F,
) -> WaypointResult<(R, ChangeSample<T>)>
where
    T: Sub<Output = T> + Clone + 'a,
    F: FnOnce() -> Fut,
    Fut: Future<Output = WaypointResult<R>>,
{
    ChangeCheck::new(sampler).begin().await?.around(action).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::result::WaypointError;
    use std::cell::Cell;

    #[tokio::test]
    async fn test_delta_is_after_minus_before() {
        let value = &Cell::new(10);
        let bracket = ChangeCheck::new(sampler(move || async move { Ok(value.get()) }))
            .begin()
            .await
            .unwrap();
        assert_eq!(*bracket.before(), 10);
        value.set(4);
        let sample = bracket.finish().await.unwrap();
        assert_eq!(sample, ChangeSample { before: 10, after: 4, change: -6 });
    }

    #[tokio::test]
    async fn test_separate_after_sampler_and_custom_delta() {
        let a = &Cell::new(1.0_f64);
        let b = &Cell::new(5.0_f64);
        let sample = ChangeCheck::new(sampler(move || async move { Ok(a.get()) }))
            .with_after(sampler(move || async move { Ok(b.get()) }))
            .with_delta(|before, after| after > before)
            .begin()
            .await
            .unwrap()
            .finish()
            .await
            .unwrap();
        assert!(sample.change);
        assert_eq!(sample.after, 5.0);
    }

    #[tokio::test]
    async fn test_around_finishes_on_action_error() {
        let samples = &Cell::new(0);
        let bracket = ChangeCheck::new(sampler(move || async move {
            samples.set(samples.get() + 1);
            Ok(samples.get())
        }))
        .begin()
        .await
        .unwrap();
        let result: WaypointResult<((), _)> = bracket
            .around(|| async { Err(WaypointError::script("boom")) })
            .await;
        assert!(matches!(result, Err(WaypointError::Script { .. })));
        assert_eq!(samples.get(), 2);
    }

    #[tokio::test]
    async fn test_nested_brackets() {
        let height = &Cell::new(66.0_f64);
        let time = &Cell::new(12.0_f64);
        let outer = ChangeCheck::new(sampler(move || async move { Ok(time.get()) }))
            .begin()
            .await
            .unwrap();
        let inner = ChangeCheck::new(sampler(move || async move { Ok(height.get()) }))
            .begin()
            .await
            .unwrap();
        height.set(120.0);
        time.set(8.0);
        assert_eq!(inner.finish().await.unwrap().change, 54.0);
        assert_eq!(outer.finish().await.unwrap().change, -4.0);
    }

    #[tokio::test]
    async fn test_check_change_helper() {
        let value = &Cell::new(1);
        let (r, sample) = check_change(sampler(move || async move { Ok(value.get()) }), || async move {
            value.set(3);
            Ok("done")
        })
        .await
        .unwrap();
        assert_eq!(r, "done");
        assert_eq!(sample.change, 2);
    }
}
