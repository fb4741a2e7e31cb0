//! Armour pieces (`armour.json`), grouped in the file by set and variant.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::decoration::MAX_SLOT_SIZE;
use crate::data::skills::{SetBonusId, SkillCatalogue, SkillId};
use crate::error::DataError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArmourPieceId(pub(crate) u32);

impl ArmourPieceId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArmourSlot {
    Head,
    Chest,
    Arms,
    Waist,
    Legs,
}

impl ArmourSlot {
    /// Merge order used by the search.
    pub const ALL: [ArmourSlot; 5] = [
        ArmourSlot::Head,
        ArmourSlot::Chest,
        ArmourSlot::Arms,
        ArmourSlot::Waist,
        ArmourSlot::Legs,
    ];

    pub fn index(self) -> usize {
        match self {
            Self::Head => 0,
            Self::Chest => 1,
            Self::Arms => 2,
            Self::Waist => 3,
            Self::Legs => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::Chest => "chest",
            Self::Arms => "arms",
            Self::Waist => "waist",
            Self::Legs => "legs",
        }
    }
}

impl fmt::Display for ArmourSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Tier {
    LowRank,
    HighRank,
    MasterRank,
}

impl Tier {
    /// Weapon rarity bands: 1-4 low rank, 5-8 high rank, 9+ master rank.
    pub fn from_rarity(rarity: u8) -> Self {
        match rarity {
            0..=4 => Self::LowRank,
            5..=8 => Self::HighRank,
            _ => Self::MasterRank,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArmourVariant {
    LowRank,
    HighRankAlpha,
    HighRankBeta,
    HighRankGamma,
    MasterRankAlphaPlus,
    MasterRankBetaPlus,
    MasterRankGammaPlus,
}

impl ArmourVariant {
    pub fn tier(self) -> Tier {
        match self {
            Self::LowRank => Tier::LowRank,
            Self::HighRankAlpha | Self::HighRankBeta | Self::HighRankGamma => Tier::HighRank,
            Self::MasterRankAlphaPlus | Self::MasterRankBetaPlus | Self::MasterRankGammaPlus => {
                Tier::MasterRank
            }
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Self::LowRank => "",
            Self::HighRankAlpha => " α",
            Self::HighRankBeta => " β",
            Self::HighRankGamma => " γ",
            Self::MasterRankAlphaPlus => " α+",
            Self::MasterRankBetaPlus => " β+",
            Self::MasterRankGammaPlus => " γ+",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArmourPiece {
    pub set_name: String,
    pub variant: ArmourVariant,
    pub slot: ArmourSlot,
    pub skills: Vec<(SkillId, u8)>,
    /// Sorted descending.
    pub deco_slots: Vec<u8>,
    pub set_bonus: Option<SetBonusId>,
}

impl ArmourPiece {
    pub fn tier(&self) -> Tier {
        self.variant.tier()
    }

    pub fn display_name(&self) -> String {
        format!("{} {}{}", self.set_name, self.slot, self.variant.suffix())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct PieceRecord {
    #[serde(default)]
    skills: BTreeMap<String, u8>,
    #[serde(default)]
    decoration_slots: Vec<u8>,
}

#[derive(Debug, Clone, Deserialize)]
struct ArmourSetRecord {
    set_name: String,
    variant: ArmourVariant,
    #[serde(default)]
    set_bonus: Option<String>,
    pieces: BTreeMap<ArmourSlot, PieceRecord>,
}

/// Raw shape of `armour.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ArmourFile {
    armour_sets: Vec<ArmourSetRecord>,
}

pub fn resolve_armour(file: ArmourFile, skills: &SkillCatalogue) -> Result<Vec<ArmourPiece>, DataError> {
    let mut pieces = Vec::new();
    for set in file.armour_sets {
        let set_context = format!("armour set '{}'{}", set.set_name, set.variant.suffix());
        let set_bonus = match &set.set_bonus {
            Some(id) => Some(skills.resolve_set_bonus(&set_context, id)?),
            None => None,
        };
        for (slot, record) in set.pieces {
            let context = format!("{set_context} {slot}");
            let resolved = record
                .skills
                .iter()
                .map(|(skill, level)| Ok((skills.resolve_skill(&context, skill)?, *level)))
                .collect::<Result<Vec<_>, DataError>>()?;
            let mut deco_slots = record.decoration_slots;
            if let Some(bad) = deco_slots
                .iter()
                .find(|size| **size == 0 || **size > MAX_SLOT_SIZE)
            {
                return Err(DataError::Invalid {
                    context,
                    message: format!("decoration slot size {bad} is out of range"),
                });
            }
            deco_slots.sort_unstable_by(|a, b| b.cmp(a));
            pieces.push(ArmourPiece {
                set_name: set.set_name.clone(),
                variant: set.variant,
                slot,
                skills: resolved,
                deco_slots,
                set_bonus,
            });
        }
    }
    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_tiers_follow_rank() {
        assert_eq!(ArmourVariant::LowRank.tier(), Tier::LowRank);
        assert_eq!(ArmourVariant::HighRankGamma.tier(), Tier::HighRank);
        assert_eq!(ArmourVariant::MasterRankBetaPlus.tier(), Tier::MasterRank);
    }

    #[test]
    fn rarity_bands_map_to_tiers() {
        assert_eq!(Tier::from_rarity(4), Tier::LowRank);
        assert_eq!(Tier::from_rarity(5), Tier::HighRank);
        assert_eq!(Tier::from_rarity(8), Tier::HighRank);
        assert_eq!(Tier::from_rarity(12), Tier::MasterRank);
    }

    #[test]
    fn slot_order_matches_indices() {
        for (position, slot) in ArmourSlot::ALL.iter().enumerate() {
            assert_eq!(slot.index(), position);
        }
    }
}
