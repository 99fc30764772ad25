//! Rail slider with a paired numeric input.
//!
//! The widget only delivers the gesture or the raw text. Snapping and range
//! clamping of the committed value belong to the application.

use super::require_box;
use crate::config::{SliderTimings, Timings};
use crate::geometry::Point;
use crate::locator::Locator;
use crate::result::{WaypointError, WaypointResult};
use crate::surface::{BrowserSurface, ClickOptions, Key};
use std::fmt::Display;
use std::sync::Arc;
use tracing::debug;

/// A slider rooted at a container holding a rail, a handle and an input
#[derive(Clone)]
pub struct Slider {
    surface: Arc<dyn BrowserSurface>,
    root: Locator,
    rail: Locator,
    handle: Locator,
    input: Locator,
    timings: SliderTimings,
}

impl std::fmt::Debug for Slider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Slider")
            .field("root", &self.root.describe())
            .finish_non_exhaustive()
    }
}

impl Slider {
    /// Create a slider rooted at `root`
    #[must_use]
    pub fn new(surface: Arc<dyn BrowserSurface>, root: Locator, timings: &Timings) -> Self {
        Self {
            surface,
            rail: root.clone().child(".ant-slider-rail"),
            handle: root.clone().child(".ant-slider-handle"),
            input: root.clone().child("input"),
            root,
            timings: timings.slider,
        }
    }

    /// Container locator
    #[must_use]
    pub const fn root(&self) -> &Locator {
        &self.root
    }

    /// Rail locator
    #[must_use]
    pub const fn rail(&self) -> &Locator {
        &self.rail
    }

    /// Handle locator
    #[must_use]
    pub const fn handle(&self) -> &Locator {
        &self.handle
    }

    /// Paired input locator
    #[must_use]
    pub const fn input(&self) -> &Locator {
        &self.input
    }

    /// Normalise a requested fraction to `[0, 1]`; NaN becomes 0
    #[must_use]
    pub fn clamp_fraction(fraction: f64) -> f64 {
        if fraction.is_nan() {
            0.0
        } else {
            fraction.clamp(0.0, 1.0)
        }
    }

    /// Drag the handle to `fraction` of the rail width
    ///
    /// A zero offset overshoots left of the rail so the gesture reaches the
    /// minimum. Returns the release point in page coordinates.
    pub async fn slide(&self, fraction: f64) -> WaypointResult<Point> {
        let fraction = Self::clamp_fraction(fraction);
        let rail = require_box(self.surface.as_ref(), &self.rail).await?;
        let handle = require_box(self.surface.as_ref(), &self.handle).await?;

        let mut offset = fraction * rail.width;
        if offset == 0.0 {
            offset = -self.timings.zero_overshoot_px;
        }
        let grab = handle.center();
        let release = Point::new(rail.x + offset, rail.y + rail.height / 2.0);
        debug!(slider = %self.root, fraction, ?grab, ?release, "slide");

        self.surface.mouse_move(grab, 1).await?;
        self.surface.mouse_down().await?;
        self.surface
            .pause(Timings::ms(self.timings.press_settle_ms))
            .await;
        self.surface.mouse_move(release, 1).await?;
        self.surface.mouse_up().await?;
        self.surface
            .pause(Timings::ms(self.timings.release_settle_ms))
            .await;
        Ok(release)
    }

    /// Type `value` into the paired input and commit it
    pub async fn fill_box(&self, value: impl Display) -> WaypointResult<()> {
        let text = value.to_string();
        debug!(slider = %self.root, value = %text, "fill");
        self.surface.fill(&self.input, &text).await?;
        self.surface.press(&self.input, Key::Enter).await?;
        self.surface
            .click(&Locator::body(), ClickOptions::default())
            .await?;
        self.surface
            .pause(Timings::ms(self.timings.commit_settle_ms))
            .await;
        Ok(())
    }

    /// Committed value shown in the paired input
    pub async fn value(&self) -> WaypointResult<String> {
        self.surface.input_value(&self.input).await
    }

    /// Committed value parsed as a number
    pub async fn numeric_value(&self) -> WaypointResult<f64> {
        let raw = self.value().await?;
        raw.trim()
            .parse()
            .map_err(|_| WaypointError::MetricParse {
                text: raw.clone(),
                reason: "slider value is not a number".to_string(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::locator::BoundingBox;
    use crate::mock::{MockCall, MockElement, MockSurface};
    use std::time::Duration;

    fn height_slider(mock: &MockSurface, timings: &Timings) -> Slider {
        let slider = Slider::new(Arc::new(mock.clone()), Locator::new(".height"), timings);
        mock.element(
            slider.rail(),
            MockElement::new().bbox(BoundingBox::new(100.0, 200.0, 400.0, 4.0)),
        )
        .element(
            slider.handle(),
            MockElement::new().bbox(BoundingBox::new(190.0, 195.0, 14.0, 14.0)),
        )
        .element(slider.input(), MockElement::new().value("66"))
        .element(&Locator::body(), MockElement::new());
        slider
    }

    mod slide_tests {
        use super::*;

        #[test]
        fn test_clamp_fraction() {
            assert_eq!(Slider::clamp_fraction(-0.5), 0.0);
            assert_eq!(Slider::clamp_fraction(1.7), 1.0);
            assert_eq!(Slider::clamp_fraction(f64::NAN), 0.0);
            assert_eq!(Slider::clamp_fraction(0.25), 0.25);
        }

        #[tokio::test]
        async fn test_slide_zero_overshoots_left() {
            let mock = MockSurface::new();
            let slider = height_slider(&mock, &Timings::instant());
            let release = slider.slide(0.0).await.unwrap();
            assert_eq!(release, Point::new(90.0, 202.0));
            assert_eq!(mock.drags(), vec![(Point::new(197.0, 202.0), Point::new(90.0, 202.0))]);
        }

        #[tokio::test]
        async fn test_slide_out_of_range_clamps() {
            let mock = MockSurface::new();
            let slider = height_slider(&mock, &Timings::instant());
            assert_eq!(slider.slide(3.0).await.unwrap(), Point::new(500.0, 202.0));
            assert_eq!(slider.slide(-1.0).await.unwrap(), Point::new(90.0, 202.0));
        }

        #[tokio::test]
        async fn test_slide_gesture_order_and_settles() {
            let mock = MockSurface::new();
            let slider = height_slider(&mock, &Timings::default());
            slider.slide(0.5).await.unwrap();
            let gesture: Vec<MockCall> = mock
                .calls()
                .into_iter()
                .filter(|c| {
                    matches!(
                        c,
                        MockCall::MouseMove(_) | MockCall::MouseDown | MockCall::MouseUp | MockCall::Pause(_)
                    )
                })
                .collect();
            assert_eq!(
                gesture,
                vec![
                    MockCall::MouseMove(Point::new(197.0, 202.0)),
                    MockCall::MouseDown,
                    MockCall::Pause(Duration::from_millis(100)),
                    MockCall::MouseMove(Point::new(300.0, 202.0)),
                    MockCall::MouseUp,
                    MockCall::Pause(Duration::from_millis(500)),
                ]
            );
        }

        #[tokio::test]
        async fn test_slide_without_rail_fails() {
            let mock = MockSurface::new();
            let slider = Slider::new(Arc::new(mock.clone()), Locator::new(".gone"), &Timings::instant());
            assert!(slider.slide(0.5).await.is_err());
            assert!(mock.drags().is_empty());
        }
    }

    mod fill_tests {
        use super::*;

        #[tokio::test]
        async fn test_fill_box_commits() {
            let mock = MockSurface::new();
            let slider = height_slider(&mock, &Timings::default());
            slider.fill_box(120).await.unwrap();
            assert_eq!(slider.value().await.unwrap(), "120");
            let calls = mock.calls();
            let fill = calls
                .iter()
                .position(|c| matches!(c, MockCall::Fill(_, v) if v == "120"))
                .unwrap();
            assert_eq!(calls[fill + 1], MockCall::Press(slider.input().describe(), Key::Enter));
            assert!(calls.contains(&MockCall::Click {
                locator: "css(body)".to_string(),
                force: false
            }));
            assert_eq!(mock.pauses(), vec![Duration::from_millis(1000)]);
        }

        #[tokio::test]
        async fn test_numeric_value() {
            let mock = MockSurface::new();
            let slider = height_slider(&mock, &Timings::instant());
            assert_eq!(slider.numeric_value().await.unwrap(), 66.0);
            mock.scene(|s| s.element_mut(slider.input()).value = "abc".into());
            assert!(slider.numeric_value().await.is_err());
        }
    }
}
