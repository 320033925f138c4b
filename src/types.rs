//! Core data types shared by the generator, loader, pipeline and API

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ordered mapping from category name to the names in that category.
///
/// Insertion order matters: it decides the numeric identifiers the generator
/// assigns, so it must survive parsing and re-serialization untouched.
pub type CategoryMapping = IndexMap<String, Vec<String>>;

/// The validated, normalized contents of one world description
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Item names grouped by [`ItemCategory`] key
    pub items: CategoryMapping,
    /// Location names grouped by arbitrary region category
    pub locations: CategoryMapping,
}

/// The four item categories the generated `ItemName` module understands
///
/// Each category owns a fixed numeric range. The bases are part of the
/// contract with the world code that imports the generated module, so they
/// are not derived from list sizes and ranges may overlap when a list runs
/// past the next base.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemCategory {
    /// Regular items, numbered from 0
    Normal,
    /// Trap items, numbered from 197
    Trap,
    /// Filler items, numbered from 200
    Filler,
    /// Progression items, numbered from 300
    Prog,
}

impl ItemCategory {
    /// All categories in the order they are written out
    pub const ALL: [ItemCategory; 4] = [
        ItemCategory::Normal,
        ItemCategory::Trap,
        ItemCategory::Filler,
        ItemCategory::Prog,
    ];

    /// Key used for this category under `items` in the YAML document
    pub fn key(self) -> &'static str {
        match self {
            ItemCategory::Normal => "normal",
            ItemCategory::Trap => "trap",
            ItemCategory::Filler => "filler",
            ItemCategory::Prog => "prog",
        }
    }

    /// First item number of this category
    pub fn base(self) -> usize {
        match self {
            ItemCategory::Normal => 0,
            ItemCategory::Trap => 197,
            ItemCategory::Filler => 200,
            ItemCategory::Prog => 300,
        }
    }

    /// Look up a category by its YAML key
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.key() == key)
    }
}

/// Successful response body of `POST /apworld/build`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildResponse {
    /// Always true
    pub ok: bool,
    /// Where the freshly built artifact now lives
    pub artifact: PathBuf,
}

impl BuildResponse {
    /// Response for a build that produced `artifact`
    pub fn success(artifact: PathBuf) -> Self {
        Self { ok: true, artifact }
    }
}
