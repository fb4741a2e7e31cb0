//! Weapon catalogue (`weapons.json`). Sharpness is stored as the maximum gauge
//! (handicraft 5); lower handicraft levels are derived by truncation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::armour::Tier;
use crate::data::decoration::MAX_SLOT_SIZE;
use crate::data::skills::{SetBonusId, SkillCatalogue, SkillId};
use crate::error::DataError;
use crate::model::sharpness::{SharpnessGauge, SHARPNESS_TIERS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WeaponId(pub(crate) u32);

impl WeaponId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeaponClass {
    Greatsword,
    Longsword,
    SwordAndShield,
    DualBlades,
    Hammer,
    HuntingHorn,
    Lance,
    Gunlance,
    SwitchAxe,
    ChargeBlade,
    InsectGlaive,
    Bow,
    LightBowgun,
    HeavyBowgun,
}

impl WeaponClass {
    pub fn is_ranged(self) -> bool {
        matches!(self, Self::Bow | Self::LightBowgun | Self::HeavyBowgun)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Greatsword => "GREATSWORD",
            Self::Longsword => "LONGSWORD",
            Self::SwordAndShield => "SWORD_AND_SHIELD",
            Self::DualBlades => "DUAL_BLADES",
            Self::Hammer => "HAMMER",
            Self::HuntingHorn => "HUNTING_HORN",
            Self::Lance => "LANCE",
            Self::Gunlance => "GUNLANCE",
            Self::SwitchAxe => "SWITCH_AXE",
            Self::ChargeBlade => "CHARGE_BLADE",
            Self::InsectGlaive => "INSECT_GLAIVE",
            Self::Bow => "BOW",
            Self::LightBowgun => "LIGHT_BOWGUN",
            Self::HeavyBowgun => "HEAVY_BOWGUN",
        }
    }
}

impl fmt::Display for WeaponClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EleStatVisibility {
    #[default]
    None,
    Open,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EleStatType {
    #[default]
    None,
    Fire,
    Water,
    Thunder,
    Ice,
    Dragon,
    Poison,
    Paralysis,
    Sleep,
    Blast,
}

impl EleStatType {
    /// True elements, as opposed to statuses.
    pub fn is_element(self) -> bool {
        matches!(
            self,
            Self::Fire | Self::Water | Self::Thunder | Self::Ice | Self::Dragon
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EleStat {
    #[serde(default)]
    pub visibility: EleStatVisibility,
    #[serde(rename = "type", default)]
    pub kind: EleStatType,
    #[serde(default)]
    pub value: u32,
}

impl EleStat {
    /// Non-elemental Boost treats hidden-element weapons as raw.
    pub fn is_raw(&self) -> bool {
        self.visibility != EleStatVisibility::Open
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AugmentScheme {
    #[default]
    None,
    Iceborne,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum UpgradeScheme {
    #[default]
    None,
    Custom,
    Awakening { set_bonus_options: Vec<SetBonusId> },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
enum UpgradeRecord {
    #[default]
    None,
    Custom,
    Awakening {
        #[serde(default)]
        set_bonus_options: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Weapon {
    pub id: String,
    pub name: String,
    pub class: WeaponClass,
    pub rarity: u8,
    pub true_raw: u32,
    pub affinity: i32,
    pub skill: Option<SkillId>,
    /// Sorted descending.
    pub deco_slots: Vec<u8>,
    pub elestat: EleStat,
    /// Maximum gauge; `None` for ranged weapons.
    pub sharpness: Option<SharpnessGauge>,
    pub constant_sharpness: bool,
    pub augments: AugmentScheme,
    pub upgrades: UpgradeScheme,
}

impl Weapon {
    pub fn tier(&self) -> Tier {
        Tier::from_rarity(self.rarity)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct WeaponRecord {
    id: String,
    name: String,
    class: WeaponClass,
    rarity: u8,
    true_raw: u32,
    #[serde(default)]
    affinity: i32,
    #[serde(default)]
    skill: Option<String>,
    #[serde(default)]
    decoration_slots: Vec<u8>,
    #[serde(default)]
    element: EleStat,
    #[serde(default)]
    sharpness: Option<[u16; SHARPNESS_TIERS]>,
    #[serde(default)]
    constant_sharpness: bool,
    #[serde(default)]
    augments: AugmentScheme,
    #[serde(default)]
    upgrades: UpgradeRecord,
}

/// Raw shape of `weapons.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct WeaponsFile {
    weapons: Vec<WeaponRecord>,
}

pub fn resolve_weapons(file: WeaponsFile, skills: &SkillCatalogue) -> Result<Vec<Weapon>, DataError> {
    file.weapons
        .into_iter()
        .map(|record| resolve_weapon(record, skills))
        .collect()
}

fn resolve_weapon(record: WeaponRecord, skills: &SkillCatalogue) -> Result<Weapon, DataError> {
    let context = format!("weapon '{}'", record.id);
    let invalid = |message: String| DataError::Invalid {
        context: context.clone(),
        message,
    };

    if record.true_raw == 0 {
        return Err(invalid("true raw must be positive".to_string()));
    }
    if record.class.is_ranged() != record.sharpness.is_none() {
        return Err(invalid(format!(
            "{} weapons {} a sharpness gauge",
            record.class,
            if record.class.is_ranged() { "cannot have" } else { "need" }
        )));
    }
    let element = record.element;
    let element_consistent = match element.visibility {
        EleStatVisibility::None => element.kind == EleStatType::None && element.value == 0,
        _ => element.kind != EleStatType::None && element.value > 0,
    };
    if !element_consistent {
        return Err(invalid("element visibility, type and value disagree".to_string()));
    }
    if let Some(bad) = record
        .decoration_slots
        .iter()
        .find(|size| **size == 0 || **size > MAX_SLOT_SIZE)
    {
        return Err(invalid(format!("decoration slot size {bad} is out of range")));
    }

    let skill = match &record.skill {
        Some(id) => Some(skills.resolve_skill(&context, id)?),
        None => None,
    };
    let upgrades = match record.upgrades {
        UpgradeRecord::None => UpgradeScheme::None,
        UpgradeRecord::Custom => UpgradeScheme::Custom,
        UpgradeRecord::Awakening { set_bonus_options } => UpgradeScheme::Awakening {
            set_bonus_options: set_bonus_options
                .iter()
                .map(|id| skills.resolve_set_bonus(&context, id))
                .collect::<Result<Vec<_>, DataError>>()?,
        },
    };

    let mut deco_slots = record.decoration_slots;
    deco_slots.sort_unstable_by(|a, b| b.cmp(a));

    Ok(Weapon {
        id: record.id,
        name: record.name,
        class: record.class,
        rarity: record.rarity,
        true_raw: record.true_raw,
        affinity: record.affinity,
        skill,
        deco_slots,
        elestat: element,
        sharpness: record.sharpness.map(SharpnessGauge::from_hits),
        constant_sharpness: record.constant_sharpness,
        augments: record.augments,
        upgrades,
    })
}
