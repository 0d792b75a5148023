//! Categories of facts tracked by the cache.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use crate::error::ConfigError;

/// A named channel of state updates written by the producer.
///
/// Each variant maps to the top-level key the producer writes on a log line
/// (e.g. `player_information`). `Map` carries derived minimap fields in
/// addition to the producer's payload.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    #[serde(rename = "player_information")]
    Player,
    #[serde(rename = "train_information")]
    Train,
    #[serde(rename = "turret_information")]
    Turret,
    #[serde(rename = "map_information")]
    Map,
}

impl Category {
    /// Key under which the producer records this category on a log line.
    pub const fn key(self) -> &'static str {
        match self {
            Category::Player => "player_information",
            Category::Train => "train_information",
            Category::Turret => "turret_information",
            Category::Map => "map_information",
        }
    }

    pub const fn is_map(self) -> bool {
        matches!(self, Category::Map)
    }
}

impl FromStr for Category {
    type Err = ConfigError;

    /// Accepts the short name (`player`) or the log key (`player_information`),
    /// ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Category::iter()
            .find(|category| {
                category.as_ref().eq_ignore_ascii_case(wanted)
                    || category.key().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| ConfigError::UnknownCategory(wanted.to_string()))
    }
}

/// Ordered set of tracked categories.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategorySet(BTreeSet<Category>);

impl CategorySet {
    /// Every known category.
    pub fn all() -> Self {
        Category::iter().collect()
    }

    pub fn contains(&self, category: Category) -> bool {
        self.0.contains(&category)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Category> + '_ {
        self.0.iter().copied()
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        Self::all()
    }
}

impl FromIterator<Category> for CategorySet {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromStr for CategorySet {
    type Err = ConfigError;

    /// Parses a comma separated list such as `player,train`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(Category::from_str)
            .collect()
    }
}
