//! Set-bonus resolver.
//!
//! A set is active when every one of its requirements holds for a fighter's
//! equipped records. Tag-count requirements make the set multiply magnitudes
//! of actions from entities carrying that tag; any set may also carry its own
//! effect list, which the dispatcher runs after the equipped entities.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::combat::fighter::Stat;
use crate::combat::status::StatusKind;
use crate::data::{Database, EntityRecord};
use crate::effects::{Action, ActionDescriptor, Condition, Effect, TriggerKind};
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SetRequirement {
    /// At least `count` equipped entities carry `tag`. Duplicates count individually.
    TagCount {
        tag: String,
        #[serde(alias = "minCount", alias = "min_count")]
        count: usize,
    },
    /// Every listed slug is equipped.
    Slugs { all: Vec<String> },
}

impl SetRequirement {
    fn is_met(&self, records: &[&EntityRecord], db: &Database) -> bool {
        match self {
            Self::TagCount { tag, count } => {
                records.iter().filter(|record| record.has_tag(tag)).count() >= *count
            }
            Self::Slugs { all } => all.iter().all(|slug| {
                db.lookup(slug)
                    .is_some_and(|wanted| records.iter().any(|record| record.key == wanted.key))
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDef {
    pub name: String,
    pub requires: Vec<SetRequirement>,
    /// Factor applied to every magnitude of actions from entities carrying a
    /// tag named by one of the tag-count requirements.
    pub multiplier: i64,
    #[serde(skip)]
    pub effects: Vec<Effect>,
}

impl SetDef {
    pub fn tag_count(name: &str, tag: &str, count: usize, multiplier: i64) -> Self {
        Self {
            name: name.to_string(),
            requires: vec![SetRequirement::TagCount {
                tag: tag.to_string(),
                count,
            }],
            multiplier,
            effects: Vec::new(),
        }
    }

    /// Set requiring every slug in `all`, running `effects` while active.
    pub fn combination(name: &str, all: &[&str], effects: Vec<Effect>) -> Self {
        Self {
            name: name.to_string(),
            requires: vec![SetRequirement::Slugs {
                all: all.iter().map(|slug| slug.to_string()).collect(),
            }],
            multiplier: 1,
            effects,
        }
    }

    pub fn applies_to(&self, tags: &BTreeSet<String>) -> bool {
        self.requires.iter().any(|req| match req {
            SetRequirement::TagCount { tag, .. } => tags.contains(tag),
            SetRequirement::Slugs { .. } => false,
        })
    }

    /// A set with no requirements is never active.
    pub fn is_active_for(&self, records: &[&EntityRecord], db: &Database) -> bool {
        !self.requires.is_empty() && self.requires.iter().all(|req| req.is_met(records, db))
    }
}

fn effect(trigger: TriggerKind, actions: Vec<Action>) -> Effect {
    Effect::new(trigger, actions.into_iter().map(ActionDescriptor::from).collect())
}

fn thorns(value: i64) -> Action {
    Action::GainStatus {
        status: StatusKind::Thorns,
        value,
    }
}

/// Sets known without any database entry, in catalogue order.
pub fn builtin_sets() -> Vec<SetDef> {
    use TriggerKind::{BattleStart, OnGainArmor, OnHeal, OnHit, TurnStart};

    let armor = |value| Action::GainStat {
        stat: Stat::Armor,
        value,
    };
    let attack_is_one = Condition::All {
        conditions: vec![
            Condition::StatAtLeast {
                stat: Stat::Attack,
                value: 1,
            },
            Condition::Not {
                condition: Box::new(Condition::StatAtLeast {
                    stat: Stat::Attack,
                    value: 2,
                }),
            },
        ],
    };

    vec![
        SetDef::tag_count("Highborn", "Ring", 3, 2),
        SetDef::combination(
            "Iron Chain",
            &["weapons/chainmail_sword", "items/chainmail_armor"],
            vec![effect(BattleStart, vec![armor(5)])],
        ),
        SetDef::combination(
            "Ironstone Arrowhead",
            &["weapons/ironstone_spear", "items/ironstone_sandals"],
            vec![effect(OnHit, vec![armor(1)])],
        ),
        SetDef::combination(
            "Sanguine Gemstone",
            &["weapons/sanguine_scepter", "items/ruby_gemstone"],
            vec![effect(OnHit, vec![Action::Heal { value: 1 }]).with_condition(attack_is_one)],
        ),
        SetDef::combination(
            "Glasses of the Hero",
            &["items/tome_of_the_hero", "items/hero_s_crossguard"],
            vec![effect(OnHit, vec![Action::AdvanceCountdowns { value: 1 }])],
        ),
        SetDef::combination(
            "Weaver Medallion",
            &["items/weaver_armor", "items/weaver_shield"],
            vec![effect(BattleStart, vec![Action::Heal { value: 5 }])],
        ),
        SetDef::combination(
            "Basilisk's Gaze",
            &["weapons/basilisk_fang", "items/basilisk_scale"],
            vec![effect(
                OnHit,
                vec![Action::GiveEnemyStatus {
                    status: StatusKind::Poison,
                    value: 1,
                }],
            )],
        ),
        SetDef::combination(
            "Bloodmoon Strike",
            &["weapons/bloodmoon_dagger", "items/bloodmoon_armor"],
            vec![effect(TurnStart, vec![Action::AddExtraStrikes { value: 1 }])
                .with_condition(Condition::IsFirstTurn)],
        ),
        SetDef::combination(
            "Bloodstone Pendant",
            &["items/bloodstone_ring", "items/elderwood_necklace"],
            vec![effect(
                OnHeal,
                vec![Action::AddCounter {
                    counter: "gold".to_string(),
                    value: 1,
                }],
            )],
        ),
        SetDef::combination(
            "Briar Greaves",
            &["items/briar_greaves", "items/blackbriar_rose"],
            vec![effect(OnGainArmor, vec![thorns(1)])],
        ),
        SetDef::combination(
            "Brittlebark Blessing",
            &["items/brittlebark_helm", "items/brittlebark_bow"],
            vec![effect(BattleStart, vec![armor(1), thorns(1)])],
        ),
        SetDef::combination(
            "Ironbark Shield",
            &["items/ironbark_shield", "items/ironbark_brace"],
            vec![effect(OnGainArmor, vec![thorns(1)])],
        ),
        SetDef::combination(
            "Ironstone Ore",
            &["items/ironstone_ore", "items/ironstone_helm"],
            vec![effect(
                TurnStart,
                vec![Action::ConvertStatToStatus {
                    stat: Stat::Armor,
                    status: StatusKind::Thorns,
                    multiplier: 2,
                    amount: Some(1),
                }],
            )
            .with_condition(Condition::HasArmor)],
        ),
        SetDef::combination(
            "Liquid Metal",
            &["items/liquid_metal", "items/liquid_core"],
            vec![effect(OnGainArmor, vec![thorns(1)])],
        ),
        SetDef::combination(
            "Saffron Talon",
            &["items/saffron_talon", "items/saffron_gloves"],
            vec![effect(OnHit, vec![thorns(1)])],
        ),
    ]
}

/// Active sets for already-resolved records, in catalogue order.
pub(crate) fn active_sets<'a>(records: &[&EntityRecord], db: &'a Database) -> Vec<&'a SetDef> {
    db.sets()
        .iter()
        .filter(|set| set.is_active_for(records, db))
        .collect()
}

/// Sets whose requirements are met by the given equipped slugs, in catalogue order.
pub fn compute_active_sets<S: AsRef<str>>(slugs: &[S], db: &Database) -> Result<Vec<SetDef>> {
    let records = slugs
        .iter()
        .map(|slug| db.get(slug.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    Ok(active_sets(&records, db).into_iter().cloned().collect())
}

/// Combined factor for an entity carrying `tags`. 1 when no active set applies.
pub fn multiplier_for(active: &[SetDef], tags: &BTreeSet<String>) -> i64 {
    active
        .iter()
        .filter(|set| set.applies_to(tags))
        .fold(1i64, |acc, set| acc.saturating_mul(set.multiplier))
}
