//! Fighter model: the mutable combat state derived from a [Build] and the
//! static records it references.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::combat::countdown::Countdown;
use crate::combat::sets::{compute_active_sets, SetDef};
use crate::combat::status::{StatusKind, StatusLedger};
use crate::data::{Database, EntityRecord};
use crate::effects::TriggerKind;
use crate::error::Result;

pub const DEFAULT_BASE_HP: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }

    pub fn opponent(self) -> Side {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    pub fn default_name(self) -> &'static str {
        match self {
            Self::Left => "Left",
            Self::Right => "Right",
        }
    }
}

/// Numeric fighter attribute addressable from data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    #[serde(alias = "atk")]
    Attack,
    Armor,
    Speed,
    #[serde(alias = "hp")]
    Health,
}

impl Stat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Attack => "attack",
            Self::Armor => "armor",
            Self::Speed => "speed",
            Self::Health => "health",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit base-stat overrides supplied by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatOverrides {
    #[serde(default, alias = "health")]
    pub hp: Option<i64>,
    #[serde(default, alias = "atk")]
    pub attack: Option<i64>,
    #[serde(default)]
    pub armor: Option<i64>,
    #[serde(default)]
    pub speed: Option<i64>,
}

/// Upgrade level of an equipped entity. Selects `value_gold`/`value_diamond`
/// over `value` in that entity's actions when present.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Base,
    Gold,
    Diamond,
}

/// One equipped slug. Written in data as a bare slug string or as
/// `{ "slug": .., "tier": "gold" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EquipRepr", into = "EquipRepr")]
pub struct Equip {
    pub slug: String,
    pub tier: Tier,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum EquipRepr {
    Slug(String),
    Tiered {
        slug: String,
        #[serde(default)]
        tier: Tier,
    },
}

impl From<EquipRepr> for Equip {
    fn from(repr: EquipRepr) -> Self {
        match repr {
            EquipRepr::Slug(slug) => Self::new(slug, Tier::Base),
            EquipRepr::Tiered { slug, tier } => Self::new(slug, tier),
        }
    }
}

impl From<Equip> for EquipRepr {
    fn from(equip: Equip) -> Self {
        match equip.tier {
            Tier::Base => Self::Slug(equip.slug),
            tier => Self::Tiered {
                slug: equip.slug,
                tier,
            },
        }
    }
}

impl Equip {
    pub fn new(slug: impl Into<String>, tier: Tier) -> Self {
        Self {
            slug: slug.into(),
            tier,
        }
    }
}

impl From<&str> for Equip {
    fn from(slug: &str) -> Self {
        Self::new(slug, Tier::Base)
    }
}

impl From<String> for Equip {
    fn from(slug: String) -> Self {
        Self::new(slug, Tier::Base)
    }
}

/// Caller-supplied loadout, resolved against the database at battle start.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub stats: Option<StatOverrides>,
    #[serde(default)]
    pub weapon: Option<Equip>,
    #[serde(default, alias = "weapon_edge")]
    pub weapon_edge: Option<Equip>,
    #[serde(default)]
    pub items: Vec<Equip>,
}

impl Build {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_stats(mut self, stats: StatOverrides) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn with_weapon(mut self, slug: impl Into<Equip>) -> Self {
        self.weapon = Some(slug.into());
        self
    }

    pub fn with_edge(mut self, slug: impl Into<Equip>) -> Self {
        self.weapon_edge = Some(slug.into());
        self
    }

    pub fn with_item(mut self, slug: impl Into<Equip>) -> Self {
        self.items.push(slug.into());
        self
    }

    pub fn with_tiered_item(self, slug: &str, tier: Tier) -> Self {
        self.with_item(Equip::new(slug, tier))
    }

    /// Equipment in equip order: weapon, edge, then items.
    pub fn equipment(&self) -> impl Iterator<Item = &Equip> {
        self.weapon
            .iter()
            .chain(self.weapon_edge.iter())
            .chain(self.items.iter())
    }

    pub fn slugs(&self) -> Vec<&str> {
        self.equipment().map(|equip| equip.slug.as_str()).collect()
    }
}

/// Per-fighter battle statistics reported in the summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FighterStats {
    pub strikes_attempted: u32,
    pub strikes_landed: u32,
    pub hp_damage_dealt: i64,
    pub armor_destroyed_dealt: i64,
    pub statuses_gained: BTreeMap<String, i64>,
}

#[derive(Debug, Clone)]
pub struct Fighter {
    pub name: String,
    pub side: Side,
    pub hp: i64,
    pub hp_max: i64,
    pub attack: i64,
    /// Reset every round; may go negative.
    pub temp_attack: i64,
    pub armor: i64,
    pub speed: i64,
    pub statuses: StatusLedger,
    pub countdowns: Vec<Countdown>,
    pub equipped: Vec<String>,
    pub active_sets: Vec<SetDef>,
    pub counters: BTreeMap<String, i64>,
    pub extra_strikes: i64,
    pub exposed_fired: bool,
    pub wounded_fired: bool,
    pub stats: FighterStats,
    /// State-change triggers raised since the dispatcher last drained them.
    pub pending: Vec<TriggerKind>,
}

impl Fighter {
    /// Fighter with the given base stats and nothing equipped.
    pub fn bare(side: Side, name: &str, hp: i64, attack: i64, armor: i64, speed: i64) -> Self {
        let hp_max = hp.max(1);
        Self {
            name: name.to_string(),
            side,
            hp: hp_max,
            hp_max,
            attack: attack.max(0),
            temp_attack: 0,
            armor: armor.max(0),
            speed: speed.max(0),
            statuses: StatusLedger::new(),
            countdowns: Vec::new(),
            equipped: Vec::new(),
            active_sets: Vec::new(),
            counters: BTreeMap::new(),
            extra_strikes: 0,
            exposed_fired: false,
            wounded_fired: false,
            stats: FighterStats::default(),
            pending: Vec::new(),
        }
    }

    fn raise(&mut self, trigger: TriggerKind) {
        self.pending.push(trigger);
    }

    pub fn take_pending(&mut self) -> Vec<TriggerKind> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn stat(&self, stat: Stat) -> i64 {
        match stat {
            Stat::Attack => self.attack,
            Stat::Armor => self.armor,
            Stat::Speed => self.speed,
            Stat::Health => self.hp,
        }
    }

    pub fn counter(&self, name: &str) -> i64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn wounded_threshold(&self) -> i64 {
        self.hp_max / 2
    }

    pub fn is_at_wounded_threshold(&self) -> bool {
        self.hp <= self.wounded_threshold()
    }

    /// Damage a strike would deal before freeze and armor.
    pub fn strike_damage(&self) -> i64 {
        self.attack.saturating_add(self.temp_attack).max(0)
    }

    /// Adds `delta` to a stat and returns the change actually applied.
    ///
    /// Health gains raise both current and max; health losses lower current
    /// health only (reaching 0 is death). Other stats floor at 0.
    pub fn apply_stat_delta(&mut self, stat: Stat, delta: i64) -> i64 {
        match stat {
            Stat::Health if delta >= 0 => {
                self.hp_max = self.hp_max.saturating_add(delta);
                self.hp = self.hp.saturating_add(delta);
                delta
            }
            Stat::Health => -self.take_damage(delta.saturating_neg()),
            Stat::Attack => floor_add(&mut self.attack, delta),
            Stat::Armor => {
                let applied = floor_add(&mut self.armor, delta);
                if applied > 0 {
                    self.raise(TriggerKind::OnGainArmor);
                }
                applied
            }
            Stat::Speed => floor_add(&mut self.speed, delta),
        }
    }

    /// Raises max health without healing. Negative values lower it (min 1)
    /// and pull current health down with it.
    pub fn gain_max_health(&mut self, delta: i64) -> i64 {
        let before = self.hp_max;
        self.hp_max = self.hp_max.saturating_add(delta).max(1);
        self.hp = self.hp.min(self.hp_max);
        self.hp_max - before
    }

    /// Heals up to `amount`, clamped to max health. Returns health restored.
    pub fn heal(&mut self, amount: i64) -> i64 {
        let healed = amount.max(0).min(self.hp_max - self.hp);
        self.hp += healed;
        if healed > 0 {
            self.raise(TriggerKind::OnHeal);
        }
        healed
    }

    /// Armor-bypassing health loss that raises no trigger (upkeep, stat loss).
    pub fn take_damage(&mut self, amount: i64) -> i64 {
        let lost = amount.max(0).min(self.hp);
        self.hp -= lost;
        lost
    }

    /// Armor-bypassing damage from an action. Returns health lost.
    pub fn pierce(&mut self, amount: i64) -> i64 {
        let lost = self.take_damage(amount);
        if lost > 0 {
            self.raise(TriggerKind::OnDamaged);
        }
        lost
    }

    /// Armor absorbs first, the remainder hits health. Returns `(armor_lost, hp_lost)`.
    pub fn absorb(&mut self, amount: i64) -> (i64, i64) {
        let amount = amount.max(0);
        let armor_lost = amount.min(self.armor);
        self.armor -= armor_lost;
        let hp_lost = self.take_damage(amount - armor_lost);
        if armor_lost + hp_lost > 0 {
            self.raise(TriggerKind::OnDamaged);
        }
        (armor_lost, hp_lost)
    }

    /// Adds stacks of `kind` and records the gain. Returns stacks applied.
    pub fn gain_status(&mut self, kind: StatusKind, amount: i64) -> i64 {
        let applied = self.statuses.add(kind, amount);
        if applied > 0 {
            self.record_status_gain(kind.as_str(), applied);
            self.raise(TriggerKind::OnGainStatus);
        }
        applied
    }

    pub fn lose_armor(&mut self, amount: i64) -> i64 {
        -floor_add(&mut self.armor, -amount.max(0))
    }

    pub fn record_status_gain(&mut self, status: &str, applied: i64) {
        if applied > 0 {
            *self.stats.statuses_gained.entry(status.to_string()).or_insert(0) += applied;
        }
    }

    pub fn active_set_names(&self) -> Vec<String> {
        self.active_sets.iter().map(|set| set.name.clone()).collect()
    }
}

fn floor_add(slot: &mut i64, delta: i64) -> i64 {
    let before = *slot;
    *slot = before.saturating_add(delta).max(0);
    *slot - before
}

/// Resolves every equipped slug in equip order.
pub fn resolve_loadout<'a>(build: &Build, db: &'a Database) -> Result<Vec<&'a EntityRecord>> {
    build.equipment().map(|equip| db.get(&equip.slug)).collect()
}

/// [resolve_loadout] keeping each entry's tier.
pub fn resolve_equipment<'a>(
    build: &Build,
    db: &'a Database,
) -> Result<Vec<(&'a EntityRecord, Tier)>> {
    build
        .equipment()
        .map(|equip| Ok((db.get(&equip.slug)?, equip.tier)))
        .collect()
}

/// Builds a fighter on the left side. See [create_fighter_on].
pub fn create_fighter(build: &Build, db: &Database) -> Result<Fighter> {
    create_fighter_on(Side::Left, build, db)
}

/// Base stats are the override (or default) plus every equipped entity's
/// stats. Fails with `DataNotFound` on the first unresolvable slug.
pub fn create_fighter_on(side: Side, build: &Build, db: &Database) -> Result<Fighter> {
    let loadout = resolve_loadout(build, db)?;
    let overrides = build.stats.unwrap_or_default();

    let mut hp = overrides.hp.unwrap_or(DEFAULT_BASE_HP);
    let mut attack = overrides.attack.unwrap_or(0);
    let mut armor = overrides.armor.unwrap_or(0);
    let mut speed = overrides.speed.unwrap_or(0);
    for record in &loadout {
        hp = hp.saturating_add(record.stats.health);
        attack = attack.saturating_add(record.stats.attack);
        armor = armor.saturating_add(record.stats.armor);
        speed = speed.saturating_add(record.stats.speed);
    }

    let name = build.name.as_deref().unwrap_or(side.default_name());
    let mut fighter = Fighter::bare(side, name, hp, attack, armor, speed);
    fighter.equipped = loadout.iter().map(|record| record.key.clone()).collect();
    fighter.active_sets = compute_active_sets(&fighter.equipped, db)?;
    Ok(fighter)
}
