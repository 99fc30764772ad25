//! Scripted in-memory browser surface.
//!
//! [`MockSurface`] stands in for a real page in unit tests and offline runs.
//! Elements are keyed by [`Locator::describe`], so a test registers exactly the
//! locator chain the page object will resolve. Reactions mutate the scene when
//! an element is clicked, filled or pressed; evaluation responders answer
//! scripts by their leading `/*tag*/` comment.

use crate::geometry::Point;
use crate::locator::{BoundingBox, Locator};
use crate::result::{WaypointError, WaypointResult};
use crate::surface::{BrowserSurface, ClickOptions, Key};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// PNG signature returned by [`MockSurface::screenshot`]
pub const MOCK_PNG: &[u8] = b"\x89PNG\r\n\x1a\n";

/// A scripted element
#[derive(Debug, Clone, PartialEq)]
pub struct MockElement {
    /// Text content
    pub text: String,
    /// Input value
    pub value: String,
    /// Rendered
    pub visible: bool,
    /// Accepts input
    pub enabled: bool,
    /// Toggle state
    pub checked: bool,
    /// Number of matches this key resolves to
    pub count: usize,
    /// Attributes
    pub attributes: HashMap<String, String>,
    /// Page-frame box
    pub bbox: Option<BoundingBox>,
}

impl Default for MockElement {
    fn default() -> Self {
        Self {
            text: String::new(),
            value: String::new(),
            visible: true,
            enabled: true,
            checked: false,
            count: 1,
            attributes: HashMap::new(),
            bbox: None,
        }
    }
}

impl MockElement {
    /// Visible, enabled element with no content
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set text content
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set input value
    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Mark as not rendered
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Mark as disabled
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Set toggle state
    #[must_use]
    pub fn checked(mut self, checked: bool) -> Self {
        self.checked = checked;
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the bounding box
    #[must_use]
    pub fn bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Set the match count
    #[must_use]
    pub fn count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }
}

/// Mutable page state visible to reactions
#[derive(Debug, Default)]
pub struct MockScene {
    /// Elements by locator description
    pub elements: HashMap<String, MockElement>,
    /// Free-form counters for evaluation responders
    pub counters: HashMap<String, i64>,
    /// Pointer position
    pub mouse: Point,
    /// Primary button held
    pub pressed: bool,
    /// Where the current press started
    pub pressed_at: Option<Point>,
    /// Completed drags as (press, release) positions
    pub drags: Vec<(Point, Point)>,
    /// Last navigated URL
    pub url: Option<String>,
}

impl MockScene {
    /// Insert or replace an element
    pub fn insert(&mut self, locator: &Locator, element: MockElement) {
        self.elements.insert(locator.describe(), element);
    }

    /// Remove an element
    pub fn remove(&mut self, locator: &Locator) -> Option<MockElement> {
        self.elements.remove(&locator.describe())
    }

    /// Element for `locator`, if registered
    #[must_use]
    pub fn get(&self, locator: &Locator) -> Option<&MockElement> {
        self.elements.get(&locator.describe())
    }

    /// Element for `locator`, inserting a default one when missing
    pub fn element_mut(&mut self, locator: &Locator) -> &mut MockElement {
        self.elements.entry(locator.describe()).or_default()
    }

    /// Set text content, inserting the element when missing
    pub fn set_text(&mut self, locator: &Locator, text: impl Into<String>) {
        self.element_mut(locator).text = text.into();
    }

    /// Set visibility, inserting the element when missing
    pub fn set_visible(&mut self, locator: &Locator, visible: bool) {
        self.element_mut(locator).visible = visible;
    }

    /// Counter value, zero when unset
    #[must_use]
    pub fn counter(&self, name: &str) -> i64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    /// Add `delta` to a counter
    pub fn bump(&mut self, name: &str, delta: i64) {
        *self.counters.entry(name.to_string()).or_insert(0) += delta;
    }
}

/// Recorded surface call
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    /// `count`
    Count(String),
    /// `text_content`
    Text(String),
    /// `input_value`
    Value(String),
    /// `attribute`
    Attribute(String, String),
    /// `is_visible`
    Visible(String),
    /// `is_enabled`
    Enabled(String),
    /// `is_checked`
    Checked(String),
    /// `bounding_box`
    BoundingBox(String),
    /// `click`
    Click {
        /// Locator description
        locator: String,
        /// Forced
        force: bool,
    },
    /// `hover`
    Hover(String),
    /// `fill`
    Fill(String, String),
    /// `press`
    Press(String, Key),
    /// `type_text`
    Type(String),
    /// `mouse_move`
    MouseMove(Point),
    /// `mouse_down`
    MouseDown,
    /// `mouse_up`
    MouseUp,
    /// `evaluate`, by script tag
    Evaluate(String),
    /// `goto`
    Goto(String),
    /// `screenshot`
    Screenshot,
    /// `close`
    Close,
    /// `pause`
    Pause(Duration),
}

type Reaction = Arc<dyn Fn(&mut MockScene, &str) + Send + Sync>;
type EvalFn = Arc<dyn Fn(&mut MockScene) -> WaypointResult<Value> + Send + Sync>;

enum Responder {
    Fixed(Value),
    Sequence(VecDeque<Value>),
    Computed(EvalFn),
}

#[derive(Default)]
struct MockState {
    scene: MockScene,
    on_click: HashMap<String, Vec<Reaction>>,
    on_fill: HashMap<String, Vec<Reaction>>,
    on_press: HashMap<String, Vec<Reaction>>,
    on_mouse_up: Vec<Reaction>,
    responders: HashMap<String, Responder>,
    failures: HashMap<String, u32>,
    calls: Vec<MockCall>,
}

/// Scripted browser surface
///
/// Clones share state, so a test can hand one clone to the page object as
/// `Arc<dyn BrowserSurface>` and inspect the other.
#[derive(Clone, Default)]
pub struct MockSurface {
    state: Arc<Mutex<MockState>>,
}

impl fmt::Debug for MockSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("MockSurface")
            .field("elements", &state.scene.elements.len())
            .field("calls", &state.calls.len())
            .finish_non_exhaustive()
    }
}

/// Leading `/*tag*/` of a script, empty when absent
#[must_use]
pub fn script_tag(script: &str) -> &str {
    script
        .trim_start()
        .strip_prefix("/*")
        .and_then(|rest| rest.find("*/").map(|end| rest[..end].trim()))
        .unwrap_or("")
}

impl MockSurface {
    /// Create an empty surface
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an element
    pub fn element(&self, locator: &Locator, element: MockElement) -> &Self {
        self.lock().scene.insert(locator, element);
        self
    }

    /// Run `f` against the scene
    pub fn scene<R>(&self, f: impl FnOnce(&mut MockScene) -> R) -> R {
        f(&mut self.lock().scene)
    }

    /// React to clicks on `locator`; the argument is empty
    pub fn on_click(
        &self,
        locator: &Locator,
        reaction: impl Fn(&mut MockScene, &str) + Send + Sync + 'static,
    ) -> &Self {
        self.lock()
            .on_click
            .entry(locator.describe())
            .or_default()
            .push(Arc::new(reaction));
        self
    }

    /// React to fills of `locator`; the argument is the filled text
    pub fn on_fill(
        &self,
        locator: &Locator,
        reaction: impl Fn(&mut MockScene, &str) + Send + Sync + 'static,
    ) -> &Self {
        self.lock()
            .on_fill
            .entry(locator.describe())
            .or_default()
            .push(Arc::new(reaction));
        self
    }

    /// React to key presses on `locator`; the argument is the key name
    pub fn on_press(
        &self,
        locator: &Locator,
        reaction: impl Fn(&mut MockScene, &str) + Send + Sync + 'static,
    ) -> &Self {
        self.lock()
            .on_press
            .entry(locator.describe())
            .or_default()
            .push(Arc::new(reaction));
        self
    }

    /// React to button releases; `pressed_at` and `mouse` describe the gesture
    pub fn on_mouse_up(&self, reaction: impl Fn(&mut MockScene, &str) + Send + Sync + 'static) -> &Self {
        self.lock().on_mouse_up.push(Arc::new(reaction));
        self
    }

    /// Answer scripts tagged `tag` with a fixed value
    pub fn on_eval(&self, tag: &str, value: Value) -> &Self {
        self.lock()
            .responders
            .insert(tag.to_string(), Responder::Fixed(value));
        self
    }

    /// Answer scripts tagged `tag` with successive values, repeating the last
    pub fn on_eval_sequence(&self, tag: &str, values: impl IntoIterator<Item = Value>) -> &Self {
        self.lock().responders.insert(
            tag.to_string(),
            Responder::Sequence(values.into_iter().collect()),
        );
        self
    }

    /// Answer scripts tagged `tag` by computing from the scene
    pub fn on_eval_fn(
        &self,
        tag: &str,
        f: impl Fn(&mut MockScene) -> WaypointResult<Value> + Send + Sync + 'static,
    ) -> &Self {
        self.lock()
            .responders
            .insert(tag.to_string(), Responder::Computed(Arc::new(f)));
        self
    }

    /// Fail the next `n` element operations on `locator`
    pub fn fail_times(&self, locator: &Locator, n: u32) -> &Self {
        self.lock().failures.insert(locator.describe(), n);
        self
    }

    /// Recorded calls
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    /// Clear the call log
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Number of clicks issued on `locator`
    #[must_use]
    pub fn clicks_on(&self, locator: &Locator) -> usize {
        let key = locator.describe();
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, MockCall::Click { locator, .. } if *locator == key))
            .count()
    }

    /// Number of evaluations of scripts tagged `tag`
    #[must_use]
    pub fn evaluations(&self, tag: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| matches!(c, MockCall::Evaluate(t) if t == tag))
            .count()
    }

    /// Recorded pauses in order
    #[must_use]
    pub fn pauses(&self) -> Vec<Duration> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                MockCall::Pause(d) => Some(*d),
                _ => None,
            })
            .collect()
    }

    /// Completed drags as (press, release)
    #[must_use]
    pub fn drags(&self) -> Vec<(Point, Point)> {
        self.lock().scene.drags.clone()
    }
}

impl MockState {
    fn record(&mut self, call: MockCall) {
        self.calls.push(call);
    }

    fn injected_failure(&mut self, key: &str) -> WaypointResult<()> {
        if let Some(remaining) = self.failures.get_mut(key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(WaypointError::NotActionable {
                    locator: key.to_string(),
                    reason: "injected failure".to_string(),
                });
            }
        }
        Ok(())
    }

    fn resolve(&mut self, key: &str) -> WaypointResult<&mut MockElement> {
        self.injected_failure(key)?;
        self.scene
            .elements
            .get_mut(key)
            .filter(|e| e.count > 0)
            .ok_or_else(|| WaypointError::ElementNotFound {
                locator: key.to_string(),
            })
    }

    fn actionable(&mut self, key: &str, force: bool) -> WaypointResult<()> {
        let element = self.resolve(key)?;
        if force {
            return Ok(());
        }
        let reason = if !element.visible {
            "not visible"
        } else if !element.enabled {
            "disabled"
        } else {
            return Ok(());
        };
        Err(WaypointError::NotActionable {
            locator: key.to_string(),
            reason: reason.to_string(),
        })
    }

    fn react(&mut self, table: ReactionTable, key: &str, arg: &str) {
        let reactions = match table {
            ReactionTable::Click => self.on_click.get(key),
            ReactionTable::Fill => self.on_fill.get(key),
            ReactionTable::Press => self.on_press.get(key),
        }
        .cloned()
        .unwrap_or_default();
        for reaction in reactions {
            reaction(&mut self.scene, arg);
        }
    }
}

#[derive(Clone, Copy)]
enum ReactionTable {
    Click,
    Fill,
    Press,
}

#[async_trait]
impl BrowserSurface for MockSurface {
    async fn count(&self, locator: &Locator) -> WaypointResult<usize> {
        let key = locator.describe();
        let mut state = self.lock();
        state.record(MockCall::Count(key.clone()));
        state.injected_failure(&key)?;
        Ok(state.scene.elements.get(&key).map_or(0, |e| e.count))
    }

    async fn text_content(&self, locator: &Locator) -> WaypointResult<String> {
        let key = locator.describe();
        let mut state = self.lock();
        state.record(MockCall::Text(key.clone()));
        Ok(state.resolve(&key)?.text.clone())
    }

    async fn input_value(&self, locator: &Locator) -> WaypointResult<String> {
        let key = locator.describe();
        let mut state = self.lock();
        state.record(MockCall::Value(key.clone()));
        Ok(state.resolve(&key)?.value.clone())
    }

    async fn attribute(&self, locator: &Locator, name: &str) -> WaypointResult<Option<String>> {
        let key = locator.describe();
        let mut state = self.lock();
        state.record(MockCall::Attribute(key.clone(), name.to_string()));
        Ok(state.resolve(&key)?.attributes.get(name).cloned())
    }

    async fn is_visible(&self, locator: &Locator) -> WaypointResult<bool> {
        let key = locator.describe();
        let mut state = self.lock();
        state.record(MockCall::Visible(key.clone()));
        state.injected_failure(&key)?;
        Ok(state
            .scene
            .elements
            .get(&key)
            .is_some_and(|e| e.count > 0 && e.visible))
    }

    async fn is_enabled(&self, locator: &Locator) -> WaypointResult<bool> {
        let key = locator.describe();
        let mut state = self.lock();
        state.record(MockCall::Enabled(key.clone()));
        Ok(state.resolve(&key)?.enabled)
    }

    async fn is_checked(&self, locator: &Locator) -> WaypointResult<bool> {
        let key = locator.describe();
        let mut state = self.lock();
        state.record(MockCall::Checked(key.clone()));
        Ok(state.resolve(&key)?.checked)
    }

    async fn bounding_box(&self, locator: &Locator) -> WaypointResult<Option<BoundingBox>> {
        let key = locator.describe();
        let mut state = self.lock();
        state.record(MockCall::BoundingBox(key.clone()));
        state.injected_failure(&key)?;
        Ok(state
            .scene
            .elements
            .get(&key)
            .filter(|e| e.visible)
            .and_then(|e| e.bbox))
    }

    async fn click(&self, locator: &Locator, options: ClickOptions) -> WaypointResult<()> {
        let key = locator.describe();
        let mut state = self.lock();
        state.record(MockCall::Click {
            locator: key.clone(),
            force: options.force,
        });
        state.actionable(&key, options.force)?;
        state.react(ReactionTable::Click, &key, "");
        Ok(())
    }

    async fn hover(&self, locator: &Locator) -> WaypointResult<()> {
        let key = locator.describe();
        let mut state = self.lock();
        state.record(MockCall::Hover(key.clone()));
        state.actionable(&key, false)
    }

    async fn fill(&self, locator: &Locator, text: &str) -> WaypointResult<()> {
        let key = locator.describe();
        let mut state = self.lock();
        state.record(MockCall::Fill(key.clone(), text.to_string()));
        state.actionable(&key, false)?;
        state.resolve(&key)?.value = text.to_string();
        state.react(ReactionTable::Fill, &key, text);
        Ok(())
    }

    async fn press(&self, locator: &Locator, key_press: Key) -> WaypointResult<()> {
        let key = locator.describe();
        let mut state = self.lock();
        state.record(MockCall::Press(key.clone(), key_press));
        state.resolve(&key)?;
        state.react(ReactionTable::Press, &key, key_press.name());
        Ok(())
    }

    async fn type_text(&self, text: &str, _delay: Duration) -> WaypointResult<()> {
        self.lock().record(MockCall::Type(text.to_string()));
        Ok(())
    }

    async fn mouse_move(&self, to: Point, _steps: u32) -> WaypointResult<()> {
        let mut state = self.lock();
        state.record(MockCall::MouseMove(to));
        state.scene.mouse = to;
        Ok(())
    }

    async fn mouse_down(&self) -> WaypointResult<()> {
        let mut state = self.lock();
        state.record(MockCall::MouseDown);
        state.scene.pressed = true;
        state.scene.pressed_at = Some(state.scene.mouse);
        Ok(())
    }

    async fn mouse_up(&self) -> WaypointResult<()> {
        let mut state = self.lock();
        state.record(MockCall::MouseUp);
        if let Some(start) = state.scene.pressed_at {
            let end = state.scene.mouse;
            state.scene.drags.push((start, end));
        }
        for reaction in state.on_mouse_up.clone() {
            reaction(&mut state.scene, "");
        }
        state.scene.pressed = false;
        state.scene.pressed_at = None;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> WaypointResult<Value> {
        let tag = script_tag(script).to_string();
        let mut state = self.lock();
        state.record(MockCall::Evaluate(tag.clone()));
        let MockState {
            scene, responders, ..
        } = &mut *state;
        match responders.get_mut(&tag) {
            Some(Responder::Fixed(v)) => Ok(v.clone()),
            Some(Responder::Sequence(values)) => {
                let value = if values.len() > 1 {
                    values.pop_front()
                } else {
                    values.front().cloned()
                };
                value.ok_or_else(|| WaypointError::script(format!("empty sequence for `{tag}`")))
            }
            Some(Responder::Computed(f)) => {
                let f = Arc::clone(f);
                f(scene)
            }
            None => Err(WaypointError::script(format!(
                "no mock response for script `{tag}`"
            ))),
        }
    }

    async fn goto(&self, url: &str) -> WaypointResult<()> {
        let mut state = self.lock();
        state.record(MockCall::Goto(url.to_string()));
        state.scene.url = Some(url.to_string());
        Ok(())
    }

    async fn screenshot(&self) -> WaypointResult<Vec<u8>> {
        self.lock().record(MockCall::Screenshot);
        Ok(MOCK_PNG.to_vec())
    }

    async fn close(&self) -> WaypointResult<()> {
        self.lock().record(MockCall::Close);
        Ok(())
    }

    async fn pause(&self, duration: Duration) {
        self.lock().record(MockCall::Pause(duration));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    mod element_tests {
        use super::*;

        #[tokio::test]
        async fn test_missing_element() {
            let mock = MockSurface::new();
            let loc = Locator::new(".absent");
            assert!(!mock.is_visible(&loc).await.unwrap());
            assert_eq!(mock.count(&loc).await.unwrap(), 0);
            assert!(matches!(
                mock.text_content(&loc).await,
                Err(WaypointError::ElementNotFound { .. })
            ));
        }

        #[tokio::test]
        async fn test_hidden_click_needs_force() {
            let mock = MockSurface::new();
            let loc = Locator::new(".select");
            mock.element(&loc, MockElement::new().hidden());
            assert!(matches!(
                mock.click(&loc, ClickOptions::default()).await,
                Err(WaypointError::NotActionable { .. })
            ));
            assert!(mock.click(&loc, ClickOptions::forced()).await.is_ok());
            assert_eq!(mock.clicks_on(&loc), 2);
        }

        #[tokio::test]
        async fn test_fill_sets_value_and_reacts() {
            let mock = MockSurface::new();
            let input = Locator::new("input");
            let echo = Locator::new(".echo");
            mock.element(&input, MockElement::new());
            let echo_key = echo.clone();
            mock.on_fill(&input, move |scene, text| scene.set_text(&echo_key, text));
            mock.fill(&input, "42").await.unwrap();
            assert_eq!(mock.input_value(&input).await.unwrap(), "42");
            assert_eq!(mock.text_content(&echo).await.unwrap(), "42");
        }

        #[tokio::test]
        async fn test_fail_times() {
            let mock = MockSurface::new();
            let loc = Locator::new("button");
            mock.element(&loc, MockElement::new()).fail_times(&loc, 2);
            assert!(mock.click(&loc, ClickOptions::default()).await.is_err());
            assert!(mock.click(&loc, ClickOptions::default()).await.is_err());
            assert!(mock.click(&loc, ClickOptions::default()).await.is_ok());
        }
    }

    mod pointer_tests {
        use super::*;

        #[tokio::test]
        async fn test_drag_is_recorded() {
            let mock = MockSurface::new();
            mock.mouse_move(Point::new(1.0, 1.0), 1).await.unwrap();
            mock.mouse_down().await.unwrap();
            mock.mouse_move(Point::new(5.0, 9.0), 3).await.unwrap();
            mock.mouse_up().await.unwrap();
            assert_eq!(mock.drags(), vec![(Point::new(1.0, 1.0), Point::new(5.0, 9.0))]);
        }
    }

    mod eval_tests {
        use super::*;

        #[test]
        fn test_script_tag() {
            assert_eq!(script_tag("  /*bounds*/ (() => 1)()"), "bounds");
            assert_eq!(script_tag("1 + 1"), "");
        }

        #[tokio::test]
        async fn test_sequence_repeats_last() {
            let mock = MockSurface::new();
            mock.on_eval_sequence("animating", [json!(true), json!(false)]);
            assert_eq!(mock.evaluate("/*animating*/x").await.unwrap(), json!(true));
            assert_eq!(mock.evaluate("/*animating*/x").await.unwrap(), json!(false));
            assert_eq!(mock.evaluate("/*animating*/x").await.unwrap(), json!(false));
            assert_eq!(mock.evaluations("animating"), 3);
        }

        #[tokio::test]
        async fn test_unknown_tag_errors() {
            let mock = MockSurface::new();
            assert!(mock.evaluate("/*nope*/0").await.is_err());
        }

        #[tokio::test]
        async fn test_computed_reads_scene() {
            let mock = MockSurface::new();
            mock.scene(|s| s.bump("rendered", 3));
            mock.on_eval_fn("rendered-count", |s| Ok(json!(s.counter("rendered"))));
            assert_eq!(mock.evaluate("/*rendered-count*/").await.unwrap(), json!(3));
        }
    }

    #[tokio::test]
    async fn test_pause_is_recorded_not_slept() {
        let mock = MockSurface::new();
        mock.pause(Duration::from_secs(3600)).await;
        assert_eq!(mock.pauses(), vec![Duration::from_secs(3600)]);
    }
}
