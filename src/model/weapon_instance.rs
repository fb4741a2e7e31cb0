//! A weapon together with its augment and upgrade selections.
//!
//! [`WeaponInstance`] owns the mutable selection state; [`WeaponContribution`] is the
//! immutable snapshot that everything downstream works from.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::skills::{SetBonusId, SkillId};
use crate::data::weapon::{AugmentScheme, EleStat, UpgradeScheme, Weapon, WeaponId};
use crate::error::ConfigError;
use crate::model::sharpness::SharpnessGauge;

pub const MAX_AUGMENT_LEVEL: u8 = 3;
pub const MAX_CUSTOM_UPGRADES: usize = 7;
pub const MAX_AWAKENINGS: usize = 5;

const AUGMENT_ATTACK: u32 = 5;
const CUSTOM_ATTACK: u32 = 3;
const FIRST_AFFINITY_STEP: i32 = 10;
const LATER_AFFINITY_STEP: i32 = 5;
const EXTRA_SLOT_SIZE: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeaponAugment {
    AttackIncrease,
    AffinityIncrease,
    HealthRegen,
    SlotUpgrade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WeaponUpgrade {
    CustomAttack,
    CustomAffinity,
    CustomSlot,
    AwakenedAttack5,
    AwakenedAttack6,
    AwakenedAffinity5,
    AwakenedAffinity6,
    AwakenedSharpness5,
    AwakenedSharpness6,
    AwakenedSlot,
    AwakenedSetBonus(SetBonusId),
}

impl WeaponUpgrade {
    fn is_custom(self) -> bool {
        matches!(self, Self::CustomAttack | Self::CustomAffinity | Self::CustomSlot)
    }

    fn is_level_six(self) -> bool {
        matches!(
            self,
            Self::AwakenedAttack6 | Self::AwakenedAffinity6 | Self::AwakenedSharpness6
        )
    }

    fn is_sharpness(self) -> bool {
        matches!(self, Self::AwakenedSharpness5 | Self::AwakenedSharpness6)
    }

    fn is_slot(self) -> bool {
        matches!(self, Self::CustomSlot | Self::AwakenedSlot)
    }

    fn set_bonus(self) -> Option<SetBonusId> {
        match self {
            Self::AwakenedSetBonus(id) => Some(id),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::CustomAttack => "CUSTOM_ATTACK",
            Self::CustomAffinity => "CUSTOM_AFFINITY",
            Self::CustomSlot => "CUSTOM_SLOT",
            Self::AwakenedAttack5 => "SAFI_ATTACK_5",
            Self::AwakenedAttack6 => "SAFI_ATTACK_6",
            Self::AwakenedAffinity5 => "SAFI_AFFINITY_5",
            Self::AwakenedAffinity6 => "SAFI_AFFINITY_6",
            Self::AwakenedSharpness5 => "SAFI_SHARPNESS_5",
            Self::AwakenedSharpness6 => "SAFI_SHARPNESS_6",
            Self::AwakenedSlot => "SAFI_SLOT",
            Self::AwakenedSetBonus(_) => "SAFI_SET_BONUS",
        }
    }
}

impl fmt::Display for WeaponUpgrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
struct AugmentSelection {
    level: u8,
    attack: u8,
    affinity: u8,
    health_regen: u8,
    slot: u8,
}

impl AugmentSelection {
    fn spent(&self) -> u16 {
        [self.attack, self.affinity, self.health_regen, self.slot]
            .iter()
            .map(|count| u16::from(*count))
            .sum()
    }

    fn count_mut(&mut self, augment: WeaponAugment) -> &mut u8 {
        match augment {
            WeaponAugment::AttackIncrease => &mut self.attack,
            WeaponAugment::AffinityIncrease => &mut self.affinity,
            WeaponAugment::HealthRegen => &mut self.health_regen,
            WeaponAugment::SlotUpgrade => &mut self.slot,
        }
    }
}

/// Additive affinity for `count` stacked steps: the first is worth more than the rest.
fn stepped_affinity(count: u8) -> i32 {
    match count {
        0 => 0,
        n => FIRST_AFFINITY_STEP + LATER_AFFINITY_STEP * (i32::from(n) - 1),
    }
}

/// Immutable snapshot of everything a configured weapon brings to a build.
#[derive(Debug, Clone, PartialEq)]
pub struct WeaponContribution {
    pub weapon_raw: u32,
    pub weapon_aff: i32,
    pub skill: Option<SkillId>,
    pub set_bonus: Option<SetBonusId>,
    /// Sorted descending.
    pub deco_slots: Vec<u8>,
    pub maximum_sharpness: Option<SharpnessGauge>,
    pub is_constant_sharpness: bool,
    pub health_regen_active: bool,
    pub elestat: EleStat,
}

#[derive(Debug, Clone)]
pub struct WeaponInstance<'db> {
    pub id: WeaponId,
    pub weapon: &'db Weapon,
    augments: AugmentSelection,
    upgrades: Vec<WeaponUpgrade>,
}

impl<'db> WeaponInstance<'db> {
    pub fn new(id: WeaponId, weapon: &'db Weapon) -> Self {
        Self {
            id,
            weapon,
            augments: AugmentSelection::default(),
            upgrades: Vec::new(),
        }
    }

    fn invalid(&self, message: impl fmt::Display) -> ConfigError {
        ConfigError::InvalidWeaponConfiguration(format!("{}: {message}", self.weapon.id))
    }

    pub fn augment_level(&self) -> u8 {
        self.augments.level
    }

    pub fn upgrades(&self) -> &[WeaponUpgrade] {
        &self.upgrades
    }

    pub fn augment_count(&self, augment: WeaponAugment) -> u8 {
        match augment {
            WeaponAugment::AttackIncrease => self.augments.attack,
            WeaponAugment::AffinityIncrease => self.augments.affinity,
            WeaponAugment::HealthRegen => self.augments.health_regen,
            WeaponAugment::SlotUpgrade => self.augments.slot,
        }
    }

    pub fn set_augment_level(&mut self, level: u8) -> Result<(), ConfigError> {
        if self.weapon.augments == AugmentScheme::None && level > 0 {
            return Err(self.invalid("weapon cannot be augmented"));
        }
        if level > MAX_AUGMENT_LEVEL {
            return Err(self.invalid(format!("augment level {level} exceeds {MAX_AUGMENT_LEVEL}")));
        }
        if self.augments.spent() > u16::from(level) {
            return Err(self.invalid("augment level is lower than the augments already selected"));
        }
        self.augments.level = level;
        Ok(())
    }

    pub fn set_augment(&mut self, augment: WeaponAugment, count: u8) -> Result<(), ConfigError> {
        let mut next = self.augments;
        *next.count_mut(augment) = count;
        let singular = matches!(augment, WeaponAugment::HealthRegen | WeaponAugment::SlotUpgrade);
        if singular && count > 1 {
            return Err(self.invalid(format!("{augment:?} can only be selected once")));
        }
        if next.spent() > u16::from(next.level) {
            return Err(self.invalid(format!(
                "augments need {} steps but augment level is {}",
                next.spent(),
                next.level
            )));
        }
        self.augments = next;
        Ok(())
    }

    pub fn add_upgrade(&mut self, upgrade: WeaponUpgrade) -> Result<(), ConfigError> {
        let count_where = |pred: fn(WeaponUpgrade) -> bool| {
            self.upgrades.iter().filter(|existing| pred(**existing)).count()
        };
        match &self.weapon.upgrades {
            UpgradeScheme::None => return Err(self.invalid("weapon has no upgrades")),
            UpgradeScheme::Custom => {
                if !upgrade.is_custom() {
                    return Err(self.invalid(format!("{upgrade} is not a custom upgrade")));
                }
                if self.upgrades.len() >= MAX_CUSTOM_UPGRADES {
                    return Err(self.invalid("all custom upgrade slots are used"));
                }
            }
            UpgradeScheme::Awakening { set_bonus_options } => {
                if upgrade.is_custom() {
                    return Err(self.invalid(format!("{upgrade} is not an awakening")));
                }
                if self.upgrades.len() >= MAX_AWAKENINGS {
                    return Err(self.invalid("all awakening slots are used"));
                }
                if upgrade.is_level_six() && count_where(WeaponUpgrade::is_level_six) > 0 {
                    return Err(self.invalid("only one level-6 awakening is allowed"));
                }
                if upgrade.is_sharpness() && self.weapon.sharpness.is_none() {
                    return Err(self.invalid("weapon has no sharpness to awaken"));
                }
                if let Some(set_bonus) = upgrade.set_bonus() {
                    if !set_bonus_options.contains(&set_bonus) {
                        return Err(self.invalid("set bonus is not offered by this weapon"));
                    }
                    if self.upgrades.iter().any(|existing| existing.set_bonus().is_some()) {
                        return Err(self.invalid("only one set bonus awakening is allowed"));
                    }
                }
            }
        }
        if upgrade.is_slot() && count_where(WeaponUpgrade::is_slot) > 0 {
            return Err(self.invalid("only one slot upgrade is allowed"));
        }
        self.upgrades.push(upgrade);
        Ok(())
    }

    pub fn calculate_contribution(&self) -> WeaponContribution {
        let weapon = self.weapon;
        let mut raw = weapon.true_raw + AUGMENT_ATTACK * u32::from(self.augments.attack);
        let mut affinity = weapon.affinity + stepped_affinity(self.augments.affinity);
        let mut deco_slots = weapon.deco_slots.clone();
        if self.augments.slot > 0 {
            deco_slots.push(EXTRA_SLOT_SIZE);
        }

        let mut custom_affinity = 0u8;
        let mut extra_top_hits = 0u16;
        let mut set_bonus = None;
        for upgrade in &self.upgrades {
            match upgrade {
                WeaponUpgrade::CustomAttack => raw += CUSTOM_ATTACK,
                WeaponUpgrade::CustomAffinity => custom_affinity += 1,
                WeaponUpgrade::AwakenedAttack5 => raw += 9,
                WeaponUpgrade::AwakenedAttack6 => raw += 12,
                WeaponUpgrade::AwakenedAffinity5 => affinity += 8,
                WeaponUpgrade::AwakenedAffinity6 => affinity += 10,
                WeaponUpgrade::AwakenedSharpness5 => extra_top_hits += 50,
                WeaponUpgrade::AwakenedSharpness6 => extra_top_hits += 70,
                WeaponUpgrade::CustomSlot | WeaponUpgrade::AwakenedSlot => {
                    deco_slots.push(EXTRA_SLOT_SIZE)
                }
                WeaponUpgrade::AwakenedSetBonus(id) => set_bonus = Some(*id),
            }
        }
        affinity += stepped_affinity(custom_affinity);
        deco_slots.sort_unstable_by(|a, b| b.cmp(a));

        let maximum_sharpness = weapon.sharpness.map(|gauge| {
            if extra_top_hits > 0 {
                gauge.with_added_top_hits(extra_top_hits)
            } else {
                gauge
            }
        });

        WeaponContribution {
            weapon_raw: raw,
            weapon_aff: affinity,
            skill: weapon.skill,
            set_bonus,
            deco_slots,
            maximum_sharpness,
            is_constant_sharpness: weapon.constant_sharpness,
            health_regen_active: self.augments.health_regen > 0,
            elestat: weapon.elestat,
        }
    }

    /// Human-readable selections for reports.
    pub fn describe(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.augments.level > 0 {
            lines.push(format!(
                "augment level {} (attack {}, affinity {}, health regen {}, slot {})",
                self.augments.level,
                self.augments.attack,
                self.augments.affinity,
                self.augments.health_regen,
                self.augments.slot
            ));
        }
        lines.extend(self.upgrades.iter().map(|upgrade| upgrade.to_string()));
        lines
    }
}

/// Splits of `total` steps into (attack, affinity, health regen, slot); the last two are capped at one.
fn splits_with_singletons(total: u8) -> Vec<(u8, u8, u8, u8)> {
    let mut splits = Vec::new();
    for health in 0..=1u8.min(total) {
        for slot in 0..=1u8.min(total - health) {
            let rest = total - health - slot;
            for attack in 0..=rest {
                splits.push((attack, rest - attack, health, slot));
            }
        }
    }
    splits
}

fn maximized_augments(weapon: &Weapon) -> Vec<AugmentSelection> {
    match weapon.augments {
        AugmentScheme::None => vec![AugmentSelection::default()],
        AugmentScheme::Iceborne => splits_with_singletons(MAX_AUGMENT_LEVEL)
            .into_iter()
            .map(|(attack, affinity, health_regen, slot)| AugmentSelection {
                level: MAX_AUGMENT_LEVEL,
                attack,
                affinity,
                health_regen,
                slot,
            })
            .collect(),
    }
}

fn maximized_custom_upgrades() -> Vec<Vec<WeaponUpgrade>> {
    let mut lists = Vec::new();
    for slot in 0..=1usize {
        let rest = MAX_CUSTOM_UPGRADES - slot;
        for attack in 0..=rest {
            let mut list = vec![WeaponUpgrade::CustomAttack; attack];
            list.extend(std::iter::repeat(WeaponUpgrade::CustomAffinity).take(rest - attack));
            list.extend(std::iter::repeat(WeaponUpgrade::CustomSlot).take(slot));
            lists.push(list);
        }
    }
    lists
}

fn maximized_awakenings(weapon: &Weapon, set_bonus_options: &[SetBonusId]) -> Vec<Vec<WeaponUpgrade>> {
    let has_sharpness = weapon.sharpness.is_some();
    let mut level_six = vec![WeaponUpgrade::AwakenedAttack6, WeaponUpgrade::AwakenedAffinity6];
    let mut level_five = vec![WeaponUpgrade::AwakenedAttack5, WeaponUpgrade::AwakenedAffinity5];
    if has_sharpness {
        level_six.push(WeaponUpgrade::AwakenedSharpness6);
        level_five.push(WeaponUpgrade::AwakenedSharpness5);
    }
    // Single-use picks: at most one slot and at most one set bonus.
    let mut singles: Vec<Vec<WeaponUpgrade>> = vec![Vec::new(), vec![WeaponUpgrade::AwakenedSlot]];
    for set_bonus in set_bonus_options {
        singles.push(vec![WeaponUpgrade::AwakenedSetBonus(*set_bonus)]);
        singles.push(vec![
            WeaponUpgrade::AwakenedSlot,
            WeaponUpgrade::AwakenedSetBonus(*set_bonus),
        ]);
    }

    let mut lists = Vec::new();
    for six in &level_six {
        for single in &singles {
            let remaining = MAX_AWAKENINGS - 1 - single.len();
            for fives in multisets(&level_five, remaining) {
                let mut list = vec![*six];
                list.extend(fives);
                list.extend(single.iter().copied());
                lists.push(list);
            }
        }
    }
    lists
}

/// Every multiset of `size` items drawn from `choices`.
fn multisets(choices: &[WeaponUpgrade], size: usize) -> Vec<Vec<WeaponUpgrade>> {
    let mut results = Vec::new();
    let mut stack: Vec<(usize, Vec<WeaponUpgrade>)> = vec![(0, Vec::with_capacity(size))];
    while let Some((start, current)) = stack.pop() {
        if current.len() == size {
            results.push(current);
            continue;
        }
        for index in start..choices.len() {
            let mut next = current.clone();
            next.push(choices[index]);
            stack.push((index, next));
        }
    }
    results
}

/// Candidate configurations worth searching for one weapon.
///
/// Assumes that spending every augment step and upgrade slot is never worse than
/// leaving one empty, so only fully-spent configurations are produced. This is a
/// heuristic: it does not prove that the best configuration is among them.
pub fn generate_maximized_instances(id: WeaponId, weapon: &Weapon) -> Vec<WeaponInstance<'_>> {
    let upgrade_lists = match &weapon.upgrades {
        UpgradeScheme::None => vec![Vec::new()],
        UpgradeScheme::Custom => maximized_custom_upgrades(),
        UpgradeScheme::Awakening { set_bonus_options } => {
            maximized_awakenings(weapon, set_bonus_options)
        }
    };
    let augment_choices = maximized_augments(weapon);

    let mut instances = Vec::with_capacity(augment_choices.len() * upgrade_lists.len());
    for augments in &augment_choices {
        for upgrades in &upgrade_lists {
            instances.push(WeaponInstance {
                id,
                weapon,
                augments: *augments,
                upgrades: upgrades.clone(),
            });
        }
    }
    instances
}
