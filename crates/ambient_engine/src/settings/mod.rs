//! User settings
//!
//! Appearance and language, plus the environment the background scene
//! depicts (time of day, season, weather). Edits are staged on a draft copy
//! and only stored when committed.
//!
//! Environment fields are stored under `"EnvironmentStore"` and the UI
//! fields under `"UIStore"`, as JSON with lowercase variant names.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::persistence::{Storage, StorageError};

/// Storage key for the environment fields
pub const ENVIRONMENT_STORE: &str = "EnvironmentStore";
/// Storage key for appearance and language
pub const UI_STORE: &str = "UIStore";

/// A setting with a fixed set of choices shown as segmented labels
pub trait Choice: Copy + PartialEq + 'static {
    /// Every choice in display order
    const ALL: &'static [Self];

    /// Display label
    fn label(self) -> &'static str;

    /// Choice with the given display label
    fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|choice| choice.label() == label)
    }

    /// Position in [`Choice::ALL`]
    fn index(self) -> usize {
        Self::ALL.iter().position(|choice| *choice == self).unwrap_or(0)
    }
}

/// Colour scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Appearance {
    /// Follow the system setting
    #[default]
    System,
    /// Light
    Light,
    /// Dark
    Dark,
}

impl Choice for Appearance {
    const ALL: &'static [Self] = &[Self::System, Self::Light, Self::Dark];

    fn label(self) -> &'static str {
        match self {
            Self::System => "System",
            Self::Light => "Light",
            Self::Dark => "Dark",
        }
    }
}

/// Interface language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Follow the system setting
    #[default]
    System,
    /// English
    En,
    /// German
    De,
    /// Russian
    Ru,
}

impl Choice for Language {
    const ALL: &'static [Self] = &[Self::System, Self::En, Self::De, Self::Ru];

    fn label(self) -> &'static str {
        match self {
            Self::System => "System",
            Self::En => "EN",
            Self::De => "DE",
            Self::Ru => "RU",
        }
    }
}

/// Time of day shown by the background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    /// Day
    #[default]
    Day,
    /// Night
    Night,
}

impl Choice for TimeOfDay {
    const ALL: &'static [Self] = &[Self::Day, Self::Night];

    fn label(self) -> &'static str {
        match self {
            Self::Day => "日",
            Self::Night => "夜",
        }
    }
}

/// Season shown by the background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    /// Spring
    #[default]
    Spring,
    /// Summer
    Summer,
    /// Autumn
    Autumn,
    /// Winter
    Winter,
}

impl Choice for Season {
    const ALL: &'static [Self] = &[Self::Spring, Self::Summer, Self::Autumn, Self::Winter];

    fn label(self) -> &'static str {
        match self {
            Self::Spring => "春",
            Self::Summer => "夏",
            Self::Autumn => "秋",
            Self::Winter => "冬",
        }
    }
}

/// Weather shown by the background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    /// Sunny
    #[default]
    Sunny,
    /// Cloudy
    Cloudy,
    /// Rainy
    Rainy,
    /// Snowy
    Snowy,
}

impl Choice for Weather {
    const ALL: &'static [Self] = &[Self::Sunny, Self::Cloudy, Self::Rainy, Self::Snowy];

    fn label(self) -> &'static str {
        match self {
            Self::Sunny => "晴れ",
            Self::Cloudy => "曇り",
            Self::Rainy => "雨",
            Self::Snowy => "雪",
        }
    }
}

/// Looping, muted background video for a time of day
pub const fn background_video(time: TimeOfDay) -> &'static str {
    match time {
        TimeOfDay::Day => "day.mp4",
        TimeOfDay::Night => "night.mp4",
    }
}

/// Every user setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Settings {
    /// Colour scheme
    pub appearance: Appearance,
    /// Interface language
    pub language: Language,
    /// Time of day
    pub time: TimeOfDay,
    /// Season
    pub season: Season,
    /// Weather
    pub weather: Weather,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct UiRecord {
    appearance: Appearance,
    language: Language,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct EnvironmentRecord {
    time: TimeOfDay,
    season: Season,
    weather: Weather,
}

/// Committed settings with optional persistence
#[derive(Default)]
pub struct SettingsStore {
    settings: Settings,
    storage: Option<Arc<dyn Storage>>,
}

impl SettingsStore {
    /// In-memory store with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist commits to `storage`
    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Committed settings
    pub const fn current(&self) -> &Settings {
        &self.settings
    }

    /// Editable copy of the committed settings
    pub const fn draft(&self) -> Settings {
        self.settings
    }

    /// Whether `draft` differs from what is committed
    pub fn has_unsaved_changes(&self, draft: &Settings) -> bool {
        self.settings != *draft
    }

    /// Background video for the committed time of day
    pub const fn background_video(&self) -> &'static str {
        background_video(self.settings.time)
    }

    /// Make `draft` the committed settings and store them. Returns whether
    /// anything changed. The new settings stay committed even if storing fails.
    pub fn commit(&mut self, draft: Settings) -> Result<bool, StorageError> {
        if !self.has_unsaved_changes(&draft) {
            return Ok(false);
        }
        self.settings = draft;
        log::info!("Settings changed: {:?}", self.settings);

        if let Some(storage) = &self.storage {
            let ui = UiRecord {
                appearance: draft.appearance,
                language: draft.language,
            };
            let environment = EnvironmentRecord {
                time: draft.time,
                season: draft.season,
                weather: draft.weather,
            };
            storage.save(UI_STORE, &serde_json::to_vec(&ui)?)?;
            storage.save(ENVIRONMENT_STORE, &serde_json::to_vec(&environment)?)?;
        }
        Ok(true)
    }

    /// Load stored settings. Missing or unreadable records keep their
    /// defaults. Returns whether any record was loaded.
    pub fn hydrate(&mut self) -> bool {
        let Some(storage) = &self.storage else {
            return false;
        };
        let mut loaded = false;

        if let Some(ui) = load_record::<UiRecord>(storage.as_ref(), UI_STORE) {
            self.settings.appearance = ui.appearance;
            self.settings.language = ui.language;
            loaded = true;
        }
        if let Some(env) = load_record::<EnvironmentRecord>(storage.as_ref(), ENVIRONMENT_STORE) {
            self.settings.time = env.time;
            self.settings.season = env.season;
            self.settings.weather = env.weather;
            loaded = true;
        }
        loaded
    }
}

fn load_record<T: DeserializeOwned>(storage: &dyn Storage, name: &str) -> Option<T> {
    let bytes = match storage.load(name) {
        Ok(bytes) => bytes?,
        Err(e) => {
            log::warn!("Failed to load '{name}': {e}");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(record) => Some(record),
        Err(e) => {
            log::warn!("Stored '{name}' is unreadable, keeping defaults: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStorage;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.appearance, Appearance::System);
        assert_eq!(settings.language, Language::System);
        assert_eq!(settings.time, TimeOfDay::Day);
        assert_eq!(settings.season, Season::Spring);
        assert_eq!(settings.weather, Weather::Sunny);
    }

    #[test]
    fn test_labels_round_trip_in_display_order() {
        let labels: Vec<_> = Weather::ALL.iter().map(|w| w.label()).collect();
        assert_eq!(labels, ["晴れ", "曇り", "雨", "雪"]);
        assert_eq!(Season::from_label("秋"), Some(Season::Autumn));
        assert_eq!(TimeOfDay::from_label("夜"), Some(TimeOfDay::Night));
        assert_eq!(Language::from_label("DE"), Some(Language::De));
        assert_eq!(Appearance::from_label("dark"), None);
        assert_eq!(Language::Ru.index(), 3);
    }

    #[test]
    fn test_draft_is_staged_until_commit() {
        let mut store = SettingsStore::new();
        let mut draft = store.draft();
        assert!(!store.has_unsaved_changes(&draft));

        draft.time = TimeOfDay::Night;
        draft.weather = Weather::Snowy;
        assert!(store.has_unsaved_changes(&draft));
        assert_eq!(store.current().time, TimeOfDay::Day);
        assert_eq!(store.background_video(), "day.mp4");

        assert!(store.commit(draft).unwrap());
        assert!(!store.has_unsaved_changes(&draft));
        assert_eq!(store.background_video(), "night.mp4");
        assert!(!store.commit(draft).unwrap());
    }

    #[test]
    fn test_commit_persists_and_hydrates() {
        let storage = MemoryStorage::new();
        let mut store = SettingsStore::new().with_storage(Arc::new(storage.clone()));
        let draft = Settings {
            appearance: Appearance::Dark,
            language: Language::En,
            time: TimeOfDay::Night,
            season: Season::Winter,
            weather: Weather::Rainy,
        };
        store.commit(draft).unwrap();

        let env: serde_json::Value =
            serde_json::from_slice(&storage.get(ENVIRONMENT_STORE).unwrap()).unwrap();
        assert_eq!(env["time"], "night");
        assert_eq!(env["season"], "winter");
        assert_eq!(env["weather"], "rainy");

        let mut restored = SettingsStore::new().with_storage(Arc::new(storage));
        assert!(restored.hydrate());
        assert_eq!(*restored.current(), draft);
    }

    #[test]
    fn test_hydrate_partial_and_corrupt_records() {
        let storage = MemoryStorage::new();
        storage.save(ENVIRONMENT_STORE, br#"{"season":"summer"}"#).unwrap();
        storage.save(UI_STORE, b"not json").unwrap();

        let mut store = SettingsStore::new().with_storage(Arc::new(storage));
        assert!(store.hydrate());
        assert_eq!(store.current().season, Season::Summer);
        assert_eq!(store.current().time, TimeOfDay::Day);
        assert_eq!(store.current().appearance, Appearance::System);
    }

    #[test]
    fn test_hydrate_without_storage() {
        let mut store = SettingsStore::new();
        assert!(!store.hydrate());
    }
}
