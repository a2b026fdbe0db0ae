//! Entity database accessor. Loaded once, then passed by shared reference;
//! nothing in the simulator mutates it.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::combat::sets::{builtin_sets, SetDef};
use crate::data::entity::{Bucket, EntityRecord, EntityStats, SetSpec};
use crate::effects::Effect;
use crate::error::{Result, SimError};

pub const DEFAULT_DATABASE_PATH: &str = "data/details.json";

#[derive(Debug, Deserialize)]
struct RawEntity {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    bucket: Option<Bucket>,
    #[serde(default)]
    stats: EntityStats,
    #[serde(default)]
    tags: BTreeSet<String>,
    #[serde(default)]
    effects: Vec<Effect>,
    #[serde(default)]
    set: Option<SetSpec>,
}

/// Normalize a slug for lookup: lowercase, collapse spaces/underscores/dashes.
fn normalize_lookup(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_whitespace() || c == '_' || c == '-' {
                ' '
            } else {
                c
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// `items/ruby_ring` -> `Ruby Ring`.
fn display_name(slug: &str) -> String {
    let tail = slug.rsplit('/').next().unwrap_or(slug);
    tail.split(['_', '-', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone)]
pub struct Database {
    entities: HashMap<String, EntityRecord>,
    normalized: HashMap<String, String>,
    sets: Vec<SetDef>,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            entities: HashMap::new(),
            normalized: HashMap::new(),
            sets: builtin_sets(),
        }
    }
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a record. A `sets` record with a set spec also
    /// registers a [SetDef] carrying the record's effects, replacing any set
    /// of the same name.
    pub fn insert(&mut self, record: EntityRecord) {
        if let (Bucket::Sets, Some(spec)) = (record.bucket, &record.set) {
            let def = SetDef {
                name: record.name.clone(),
                requires: spec.requirements(),
                multiplier: spec.multiplier,
                effects: record.effects.clone(),
            };
            match self.sets.iter_mut().find(|set| set.name == def.name) {
                Some(existing) => *existing = def,
                None => self.sets.push(def),
            }
        }
        self.normalized
            .insert(normalize_lookup(&record.key), record.key.clone());
        self.entities.insert(record.key.clone(), record);
    }

    /// Exact slug first, then the normalized form.
    pub fn lookup(&self, slug: &str) -> Option<&EntityRecord> {
        self.entities.get(slug).or_else(|| {
            self.normalized
                .get(&normalize_lookup(slug))
                .and_then(|key| self.entities.get(key))
        })
    }

    pub fn get(&self, slug: &str) -> Result<&EntityRecord> {
        self.lookup(slug).ok_or_else(|| SimError::DataNotFound {
            slug: slug.to_string(),
        })
    }

    /// All records sorted by key.
    pub fn records(&self) -> Vec<&EntityRecord> {
        let mut records: Vec<&EntityRecord> = self.entities.values().collect();
        records.sort_by(|a, b| a.key.cmp(&b.key));
        records
    }

    pub fn sets(&self) -> &[SetDef] {
        &self.sets
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Accepts `{ slug: record, .. }` or `{ "entities": { slug: record, .. } }`.
    pub fn from_value(value: Value) -> Result<Self> {
        let mut root = match value {
            Value::Object(map) => map,
            _ => {
                return Err(SimError::InvalidConfig(
                    "database must be an object keyed by slug".to_string(),
                ))
            }
        };
        let entries = match root.remove("entities") {
            Some(Value::Object(map)) => map,
            Some(_) => {
                return Err(SimError::InvalidConfig(
                    "`entities` must be an object keyed by slug".to_string(),
                ))
            }
            None => root,
        };

        let mut db = Self::default();
        for (slug, raw) in entries {
            let raw: RawEntity = serde_json::from_value(raw)
                .map_err(|err| SimError::InvalidConfig(format!("entity {slug}: {err}")))?;
            let key = raw.key.unwrap_or_else(|| slug.clone());
            db.insert(EntityRecord {
                name: raw.name.unwrap_or_else(|| display_name(&key)),
                bucket: raw.bucket.unwrap_or_else(|| Bucket::from_slug(&key)),
                key,
                stats: raw.stats,
                tags: raw.tags,
                effects: raw.effects,
                set: raw.set,
            });
        }
        Ok(db)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Self::from_value(serde_json::from_str(raw)?)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        Self::from_value(serde_yaml::from_str(raw)?)
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    )
}

/// Loads a database from JSON, or YAML when the extension is `.yaml`/`.yml`.
pub fn load_database(path: impl AsRef<Path>) -> Result<Database> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)?;
    let db = if is_yaml(path) {
        Database::from_yaml_str(&raw)?
    } else {
        Database::from_json_str(&raw)?
    };
    tracing::info!(
        path = %path.display(),
        entities = db.len(),
        sets = db.sets().len(),
        "loaded entity database"
    );
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::sets::SetRequirement;

    #[test]
    fn normalize_lookup_collapses_separators() {
        assert_eq!(normalize_lookup("Items/Ruby  Ring"), "items/ruby_ring");
        assert_eq!(normalize_lookup("items/ruby-ring"), "items/ruby_ring");
    }

    #[test]
    fn display_name_title_cases_the_slug_tail() {
        assert_eq!(display_name("items/ruby_ring"), "Ruby Ring");
        assert_eq!(display_name("weapons/great-axe"), "Great Axe");
    }

    #[test]
    fn missing_fields_are_inferred_from_the_slug() {
        let db = Database::from_json_str(r#"{"weapons/great_axe": {"stats": {"atk": 4}}}"#).unwrap();
        let axe = db.get("weapons/great_axe").unwrap();
        assert_eq!(axe.key, "weapons/great_axe");
        assert_eq!(axe.name, "Great Axe");
        assert_eq!(axe.bucket, Bucket::Weapons);
        assert_eq!(axe.stats.attack, 4);
    }

    #[test]
    fn lookup_falls_back_to_normalized_slug() {
        let db = Database::from_json_str(r#"{"entities": {"items/ruby_ring": {}}}"#).unwrap();
        assert_eq!(db.get("Items/Ruby Ring").unwrap().key, "items/ruby_ring");
        assert!(matches!(
            db.get("items/emerald_ring"),
            Err(SimError::DataNotFound { .. })
        ));
    }

    #[test]
    fn set_records_override_builtin_by_name() {
        let db = Database::from_json_str(
            r#"{
                "sets/highborn": {"name": "Highborn", "set": {"requiredTag": "Ring", "minCount": 2, "multiplier": 3}},
                "sets/tidal": {"name": "Tidal", "set": {"requiredTag": "Tide", "minCount": 2}}
            }"#,
        )
        .unwrap();
        let highborn = db.sets().iter().find(|s| s.name == "Highborn").unwrap();
        assert_eq!(
            highborn.requires,
            vec![SetRequirement::TagCount {
                tag: "Ring".to_string(),
                count: 2
            }]
        );
        assert_eq!(highborn.multiplier, 3);
        assert_eq!(db.sets().len(), builtin_sets().len() + 1);
        assert_eq!(db.sets().iter().filter(|s| s.name == "Highborn").count(), 1);
    }

    #[test]
    fn set_records_may_list_slug_requirements_and_effects() {
        let db = Database::from_json_str(
            r#"{
                "sets/twin_fangs": {"name": "Twin Fangs", "set": {"requires": [
                    {"kind": "slugs", "all": ["weapons/left_fang", "weapons/right_fang"]}
                ]}, "effects": [
                    {"trigger": "onHit", "actions": [{"type": "give_enemy_status", "status": "poison", "value": 1}]}
                ]}
            }"#,
        )
        .unwrap();
        let fangs = db.sets().iter().find(|s| s.name == "Twin Fangs").unwrap();
        assert_eq!(fangs.effects.len(), 1);
        assert!(matches!(&fangs.requires[0], SetRequirement::Slugs { all } if all.len() == 2));
    }

    #[test]
    fn yaml_databases_parse_the_same_shape() {
        let db = Database::from_yaml_str(
            "items/ruby_ring:\n  tags: [Ring]\n  effects:\n    - trigger: battleStart\n      actions:\n        - type: gain_stat\n          stat: health\n          value: 5\n",
        )
        .unwrap();
        let ring = db.get("items/ruby_ring").unwrap();
        assert!(ring.has_tag("Ring"));
        assert_eq!(ring.effects.len(), 1);
    }

    #[test]
    fn non_object_root_is_rejected() {
        assert!(matches!(
            Database::from_json_str("[1, 2]"),
            Err(SimError::InvalidConfig(_))
        ));
    }
}
