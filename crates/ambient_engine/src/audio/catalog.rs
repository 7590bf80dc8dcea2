//! Sound catalog
//!
//! The static, ordered list of ambient sound categories the mixer knows about.
//! The catalog is fixed at process start and never changes afterwards.

use serde::{Deserialize, Serialize};

/// Unique identifier for a sound category
pub type SoundId = String;

/// One ambient audio source exposed to the UI as a dial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundCategory {
    /// Stable identifier used as the persistence key
    pub id: SoundId,
    /// Display title
    pub title: String,
    /// Icon reference
    pub icon_url: String,
    /// Audio source reference handed to the audio player
    pub sound_url: String,
}

impl SoundCategory {
    /// Create a new category
    pub fn new(
        id: impl Into<SoundId>,
        title: impl Into<String>,
        icon_url: impl Into<String>,
        sound_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            icon_url: icon_url.into(),
            sound_url: sound_url.into(),
        }
    }
}

/// Ordered, immutable set of sound categories
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SoundCatalog {
    categories: Vec<SoundCategory>,
}

impl SoundCatalog {
    /// Build a catalog from categories, keeping the first entry for any
    /// duplicated id
    pub fn new(categories: impl IntoIterator<Item = SoundCategory>) -> Self {
        let mut unique: Vec<SoundCategory> = Vec::new();
        for category in categories {
            if unique.iter().any(|c| c.id == category.id) {
                log::warn!("Duplicate sound id '{}' in catalog, ignoring", category.id);
                continue;
            }
            unique.push(category);
        }
        Self { categories: unique }
    }

    /// Catalog of bare ids, mostly useful for tests
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SoundId>,
    {
        Self::new(ids.into_iter().map(|id| {
            let id = id.into();
            SoundCategory::new(id.clone(), id.clone(), String::new(), id)
        }))
    }

    /// The eight ambient sounds shipped with the app
    pub fn builtin() -> Self {
        const CDN: &str = "https://d19lw2j693qzyn.cloudfront.net";
        const SOUNDJAY: &str = "https://www.soundjay.com/nature";

        Self::new([
            SoundCategory::new("rain", "雨", format!("{CDN}/rain.png"), format!("{CDN}/rain.mp3")),
            SoundCategory::new(
                "thunder",
                "雷",
                format!("{CDN}/thunder.png"),
                format!("{CDN}/thunder.mp3"),
            ),
            SoundCategory::new("wind", "風", format!("{CDN}/wind.png"), format!("{CDN}/wind.mp3")),
            SoundCategory::new(
                "ocean",
                "海",
                format!("{SOUNDJAY}/ocean-waves-1.png"),
                format!("{SOUNDJAY}/ocean-waves-1.mp3"),
            ),
            SoundCategory::new(
                "fire",
                "焚き火",
                format!("{SOUNDJAY}/fire-1.png"),
                format!("{SOUNDJAY}/fire-1.mp3"),
            ),
            SoundCategory::new(
                "forest",
                "森",
                format!("{SOUNDJAY}/forest-1.png"),
                format!("{SOUNDJAY}/forest-1.mp3"),
            ),
            SoundCategory::new(
                "night",
                "夜",
                format!("{SOUNDJAY}/night-1.png"),
                format!("{SOUNDJAY}/night-1.mp3"),
            ),
            SoundCategory::new(
                "birds",
                "鳥",
                format!("{SOUNDJAY}/birds-1.png"),
                format!("{SOUNDJAY}/birds-1.mp3"),
            ),
        ])
    }

    /// Look up a category by id
    pub fn get(&self, id: &str) -> Option<&SoundCategory> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Check if an id is part of the catalog
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Ids in catalog order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.id.as_str())
    }

    /// Categories in catalog order
    pub fn iter(&self) -> std::slice::Iter<'_, SoundCategory> {
        self.categories.iter()
    }

    /// Number of categories
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// True if the catalog has no categories
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl<'a> IntoIterator for &'a SoundCatalog {
    type Item = &'a SoundCategory;
    type IntoIter = std::slice::Iter<'a, SoundCategory>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
