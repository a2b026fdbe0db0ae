//! Static entity records: items, weapons, upgrades and set definitions.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::combat::sets::SetRequirement;
use crate::effects::Effect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Items,
    Weapons,
    Upgrades,
    Sets,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Items => "items",
            Self::Weapons => "weapons",
            Self::Upgrades => "upgrades",
            Self::Sets => "sets",
        }
    }

    /// Bucket implied by a slug prefix such as `weapons/`. Defaults to items.
    pub fn from_slug(slug: &str) -> Self {
        match slug.split_once('/').map(|(prefix, _)| prefix) {
            Some("weapons") => Self::Weapons,
            Some("upgrades") => Self::Upgrades,
            Some("sets") => Self::Sets,
            _ => Self::Items,
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityStats {
    #[serde(default, alias = "atk")]
    pub attack: i64,
    #[serde(default)]
    pub armor: i64,
    #[serde(default, alias = "hp")]
    pub health: i64,
    #[serde(default)]
    pub speed: i64,
}

impl EntityStats {
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

/// Set definition carried by a record in the `sets` bucket. Either the
/// `requiredTag`/`minCount` shorthand, a `requires` list, or both (all must hold).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSpec {
    #[serde(default, alias = "required_tag", alias = "tag")]
    pub required_tag: Option<String>,
    #[serde(default, alias = "min_count")]
    pub min_count: Option<usize>,
    #[serde(default, alias = "reqs")]
    pub requires: Vec<SetRequirement>,
    #[serde(default = "default_set_multiplier", alias = "modifier")]
    pub multiplier: i64,
}

impl SetSpec {
    /// Shorthand requirement first (minCount defaults to 1), then `requires`.
    pub fn requirements(&self) -> Vec<SetRequirement> {
        let shorthand = self.required_tag.as_ref().map(|tag| SetRequirement::TagCount {
            tag: tag.clone(),
            count: self.min_count.unwrap_or(1),
        });
        shorthand.into_iter().chain(self.requires.iter().cloned()).collect()
    }
}

fn default_set_multiplier() -> i64 {
    2
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    pub key: String,
    pub name: String,
    pub bucket: Bucket,
    pub stats: EntityStats,
    pub tags: BTreeSet<String>,
    pub effects: Vec<Effect>,
    pub set: Option<SetSpec>,
}

impl EntityRecord {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}
