//! Camera settings modal opened from the scan settings section.

use crate::locator::{Locator, Selector};
use crate::result::WaypointResult;
use crate::surface::{BrowserSurface, ClickOptions};
use crate::config::Timings;
use crate::widgets::{Slider, TabList};
use std::sync::Arc;
use tracing::debug;

const MODAL_XPATH: &str = "//*[contains(@class, 'CameraActionEditor')]";
const SETTINGS_TAB_CSS: &str = "[id^='rc-tabs-'][id$='-tab-Settings']";
const CAPTURE_TAB_CSS: &str = "[id^='rc-tabs-'][id$='-tab-Capture']";

/// Modal tab a setting lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalTab {
    /// Tab-strip settings
    Settings,
    /// Exposure rows
    Capture,
}

/// A labelled setting in the modal
pub trait SettingLabel: Copy + std::fmt::Debug {
    /// Tab the setting is shown on
    const TAB: ModalTab;

    /// Visible label
    fn label(self) -> &'static str;

    /// Row container inside `modal`
    fn row(self, modal: &Locator) -> Locator;
}

/// Tab-strip settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabSetting {
    /// Image resolution
    Resolution,
    /// Capture mode
    CameraMode,
    /// Active sensor
    CameraSensor,
    /// Colour image format
    ImageFileType,
    /// Thermal capture toggle
    CaptureThermal,
    /// Thermal image format
    ThermalFileType,
}

impl TabSetting {
    /// Every tab-strip setting
    pub const ALL: [Self; 6] = [
        Self::Resolution,
        Self::CameraMode,
        Self::CameraSensor,
        Self::ImageFileType,
        Self::CaptureThermal,
        Self::ThermalFileType,
    ];
}

impl SettingLabel for TabSetting {
    const TAB: ModalTab = ModalTab::Settings;

    fn label(self) -> &'static str {
        match self {
            Self::Resolution => "Resolution",
            Self::CameraMode => "Camera Mode",
            Self::CameraSensor => "Camera Sensor",
            Self::ImageFileType => "Image File Type",
            Self::CaptureThermal => "Capture Thermal",
            Self::ThermalFileType => "Thermal File Type",
        }
    }

    fn row(self, modal: &Locator) -> Locator {
        modal
            .clone()
            .locator(Selector::xpath(format!(
                "//span[normalize-space(.)='{}']/parent::div",
                self.label()
            )))
            .first()
    }
}

/// Exposure rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureSetting {
    /// White balance
    WhiteBalance,
    /// Shutter speed
    ShutterSpeed,
    /// Sensor gain
    Iso,
    /// Exposure compensation
    Brightness,
}

impl CaptureSetting {
    /// Every exposure row
    pub const ALL: [Self; 4] = [
        Self::WhiteBalance,
        Self::ShutterSpeed,
        Self::Iso,
        Self::Brightness,
    ];
}

impl SettingLabel for CaptureSetting {
    const TAB: ModalTab = ModalTab::Capture;

    fn label(self) -> &'static str {
        match self {
            Self::WhiteBalance => "White Balance",
            Self::ShutterSpeed => "Shutter Speed",
            Self::Iso => "ISO",
            Self::Brightness => "Brightness (EV)",
        }
    }

    fn row(self, modal: &Locator) -> Locator {
        modal.clone().locator(Selector::xpath(format!(
            "//*[contains(@class, 'exposureCompRow') and .//text()[contains(., '{}')]]",
            self.label()
        )))
    }
}

/// An exposure row: slider, numeric input and auto toggle
#[derive(Debug, Clone)]
pub struct CaptureRow {
    /// Row slider
    pub slider: Slider,
    /// Numeric entry
    pub input: Locator,
    /// "Auto On" button
    pub auto_on: Locator,
}

/// The camera settings modal
#[derive(Clone)]
pub struct CameraSettings {
    surface: Arc<dyn BrowserSurface>,
    timings: Timings,
    open_button: Locator,
    modal: Locator,
    settings_tab: Locator,
    capture_tab: Locator,
    close_button: Locator,
    sensor_menu: Locator,
}

impl std::fmt::Debug for CameraSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSettings")
            .field("open_button", &self.open_button.describe())
            .finish_non_exhaustive()
    }
}

impl CameraSettings {
    /// Create the modal opened by `open_button`
    #[must_use]
    pub fn new(surface: Arc<dyn BrowserSurface>, open_button: Locator, timings: &Timings) -> Self {
        let modal = Locator::xpath(MODAL_XPATH);
        Self {
            surface,
            timings: timings.clone(),
            open_button,
            settings_tab: Locator::new(SETTINGS_TAB_CSS),
            capture_tab: Locator::new(CAPTURE_TAB_CSS),
            close_button: modal.clone().get_by_role("button", Some("Close".into())),
            sensor_menu: modal
                .clone()
                .locator(Selector::xpath(
                    "//span[normalize-space(.)='Estimates for:']/following-sibling::button",
                ))
                .first(),
            modal,
        }
    }

    /// Modal root
    #[must_use]
    pub const fn modal(&self) -> &Locator {
        &self.modal
    }

    /// Button that opens the modal
    #[must_use]
    pub const fn open_button(&self) -> &Locator {
        &self.open_button
    }

    /// Whether the modal is shown
    pub async fn is_open(&self) -> WaypointResult<bool> {
        self.surface.is_visible(&self.modal).await
    }

    /// Open the modal if it is not shown
    pub async fn open(&self) -> WaypointResult<()> {
        if !self.is_open().await? {
            self.surface
                .click(&self.open_button, ClickOptions::default())
                .await?;
        }
        Ok(())
    }

    /// Dismiss the modal
    pub async fn close(&self) -> WaypointResult<()> {
        self.surface
            .click(&self.close_button, ClickOptions::default())
            .await
    }

    /// "Estimates for:" airframe menu button
    #[must_use]
    pub const fn sensor_menu(&self) -> &Locator {
        &self.sensor_menu
    }

    /// Menu entry for airframe `sensor`
    #[must_use]
    pub fn sensor_entry(sensor: &str) -> Locator {
        Locator::new("span").with_text(sensor).first()
    }

    /// Switch the estimates to another airframe sensor
    pub async fn select_sensor(&self, sensor: &str) -> WaypointResult<()> {
        debug!(sensor, "select estimate sensor");
        self.surface
            .click(&self.sensor_menu, ClickOptions::default())
            .await?;
        self.surface
            .click(&Self::sensor_entry(sensor), ClickOptions::default())
            .await
    }

    /// Tab button for `tab`
    #[must_use]
    pub const fn tab_button(&self, tab: ModalTab) -> &Locator {
        match tab {
            ModalTab::Settings => &self.settings_tab,
            ModalTab::Capture => &self.capture_tab,
        }
    }

    async fn reveal<S: SettingLabel>(&self, setting: S) -> WaypointResult<Locator> {
        self.open().await?;
        self.surface
            .click(self.tab_button(S::TAB), ClickOptions::default())
            .await?;
        Ok(setting.row(&self.modal))
    }

    /// Strip for `setting` without opening the modal
    #[must_use]
    pub fn tab_list(&self, setting: TabSetting) -> TabList {
        TabList::new(Arc::clone(&self.surface), setting.row(&self.modal))
    }

    /// Open the modal on the settings tab and return the strip for `setting`
    pub async fn tab(&self, setting: TabSetting) -> WaypointResult<TabList> {
        let row = self.reveal(setting).await?;
        Ok(TabList::new(Arc::clone(&self.surface), row))
    }

    /// Open the modal on the capture tab and return the row for `setting`
    pub async fn capture(&self, setting: CaptureSetting) -> WaypointResult<CaptureRow> {
        let row = self.reveal(setting).await?;
        Ok(CaptureRow {
            slider: Slider::new(Arc::clone(&self.surface), row.clone(), &self.timings),
            input: row.clone().child("input").first(),
            auto_on: row.child("button").with_text("Auto On").first(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::{MockElement, MockSurface};

    fn modal_on(mock: &MockSurface) -> CameraSettings {
        let cs = CameraSettings::new(
            Arc::new(mock.clone()),
            Locator::new(".scan").child("button").with_text("Edit"),
            &Timings::instant(),
        );
        mock.element(cs.open_button(), MockElement::new())
            .element(cs.modal(), MockElement::new().hidden())
            .element(cs.tab_button(ModalTab::Settings), MockElement::new())
            .element(cs.tab_button(ModalTab::Capture), MockElement::new());
        let modal = cs.modal().clone();
        mock.on_click(cs.open_button(), move |scene, _| scene.set_visible(&modal, true));
        cs
    }

    #[test]
    fn test_label_tables() {
        let labels: Vec<_> = TabSetting::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(labels[0], "Resolution");
        assert_eq!(labels[5], "Thermal File Type");
        assert_eq!(CaptureSetting::Brightness.label(), "Brightness (EV)");
    }

    #[tokio::test]
    async fn test_tab_opens_modal_once() {
        let mock = MockSurface::new();
        let cs = modal_on(&mock);
        let resolution = cs.tab(TabSetting::Resolution).await.unwrap();
        assert_eq!(
            cs.tab_list(TabSetting::Resolution).root().describe(),
            resolution.root().describe()
        );
        cs.tab(TabSetting::CameraMode).await.unwrap();
        assert!(cs.is_open().await.unwrap());
        assert_eq!(mock.clicks_on(cs.open_button()), 1);
        assert_eq!(mock.clicks_on(cs.tab_button(ModalTab::Settings)), 2);
        assert!(resolution.root().describe().contains("normalize-space(.)='Resolution'"));
    }

    #[tokio::test]
    async fn test_capture_row_parts() {
        let mock = MockSurface::new();
        let cs = modal_on(&mock);
        let row = cs.capture(CaptureSetting::Iso).await.unwrap();
        assert_eq!(mock.clicks_on(cs.tab_button(ModalTab::Capture)), 1);
        assert!(row.auto_on.describe().ends_with(">> has-text(\"Auto On\") >> nth(0)"));
        assert!(row.slider.rail().describe().contains("exposureCompRow"));
    }

    #[tokio::test]
    async fn test_select_sensor() {
        let mock = MockSurface::new();
        let cs = modal_on(&mock);
        let entry = CameraSettings::sensor_entry("Skydio X10 VT300Z");
        mock.element(cs.sensor_menu(), MockElement::new())
            .element(&entry, MockElement::new());
        cs.select_sensor("Skydio X10 VT300Z").await.unwrap();
        assert_eq!(mock.clicks_on(&entry), 1);
    }
}
