//! Concrete gear assemblies: the armour and charm worn, the decorations slotted in, and
//! the consumables active for a build.

use crate::data::armour::{ArmourPieceId, ArmourSlot};
use crate::data::charm::CharmId;
use crate::data::database::Database;
use crate::data::decoration::DecorationId;
use crate::data::misc_buff::MiscBuffId;
use crate::error::ConfigError;
use crate::model::skills::{SetBonusMap, SkillMap};
use crate::model::weapon_instance::WeaponContribution;

/// At most one piece per slot plus an optional charm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ArmourEquips {
    pieces: [Option<ArmourPieceId>; 5],
    charm: Option<CharmId>,
}

impl ArmourEquips {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_charm(charm: Option<CharmId>) -> Self {
        Self {
            pieces: [None; 5],
            charm,
        }
    }

    /// Equip a piece in its own slot, replacing whatever was there.
    pub fn add(&mut self, db: &Database, piece: ArmourPieceId) {
        let slot = db.armour_piece(piece).slot;
        self.pieces[slot.index()] = Some(piece);
    }

    pub fn set_charm(&mut self, charm: Option<CharmId>) {
        self.charm = charm;
    }

    pub fn piece(&self, slot: ArmourSlot) -> Option<ArmourPieceId> {
        self.pieces[slot.index()]
    }

    pub fn charm(&self) -> Option<CharmId> {
        self.charm
    }

    pub fn pieces(&self) -> impl Iterator<Item = ArmourPieceId> + '_ {
        self.pieces.iter().flatten().copied()
    }

    pub fn skills_without_set_bonuses(&self, db: &Database) -> SkillMap {
        let catalogue = db.skills();
        let mut skills = SkillMap::new();
        for piece in self.pieces() {
            for (skill, level) in &db.armour_piece(piece).skills {
                skills.increment(*skill, *level, catalogue);
            }
        }
        if let Some(charm) = self.charm {
            let charm = db.charm(charm);
            for skill in &charm.skills {
                skills.increment(*skill, charm.max_level, catalogue);
            }
        }
        skills
    }

    pub fn set_bonuses(&self, db: &Database) -> SetBonusMap {
        self.pieces()
            .filter_map(|piece| db.armour_piece(piece).set_bonus)
            .map(|set_bonus| (set_bonus, 1))
            .collect()
    }

    /// Every open armour slot, sorted descending.
    pub fn deco_slots(&self, db: &Database) -> Vec<u8> {
        let mut slots: Vec<u8> = self
            .pieces()
            .flat_map(|piece| db.armour_piece(piece).deco_slots.iter().copied())
            .collect();
        slots.sort_unstable_by(|a, b| b.cmp(a));
        slots
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DecoEquips(Vec<DecorationId>);

impl DecoEquips {
    pub fn new(decorations: Vec<DecorationId>) -> Self {
        Self(decorations)
    }

    pub fn iter(&self) -> impl Iterator<Item = DecorationId> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn extend(&mut self, other: &DecoEquips) {
        self.0.extend_from_slice(&other.0);
    }

    pub fn skills(&self, db: &Database) -> SkillMap {
        let catalogue = db.skills();
        let mut skills = SkillMap::new();
        for deco in self.iter() {
            for (skill, level) in &db.decoration(deco).skills {
                skills.increment(*skill, *level, catalogue);
            }
        }
        skills
    }

    /// Whether the decorations can be assigned to distinct slots of the armour and weapon.
    pub fn fits_in(&self, db: &Database, armour: &ArmourEquips, weapon: &WeaponContribution) -> bool {
        let mut slots = armour.deco_slots(db);
        slots.extend(weapon.deco_slots.iter().copied());
        slots.sort_unstable_by(|a, b| b.cmp(a));
        let mut sizes: Vec<u8> = self.iter().map(|deco| db.decoration(deco).slot_size).collect();
        sizes.sort_unstable_by(|a, b| b.cmp(a));
        // Largest decoration into largest slot is optimal when both lists are sorted.
        sizes.len() <= slots.len() && sizes.iter().zip(&slots).all(|(size, slot)| size <= slot)
    }
}

/// Active consumables with their combined effect precomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct MiscBuffsEquips {
    buffs: Vec<MiscBuffId>,
    added_raw: u32,
    base_raw_multiplier: f64,
}

impl Default for MiscBuffsEquips {
    fn default() -> Self {
        Self {
            buffs: Vec::new(),
            added_raw: 0,
            base_raw_multiplier: 1.0,
        }
    }
}

impl MiscBuffsEquips {
    pub fn new(db: &Database, buffs: Vec<MiscBuffId>) -> Result<Self, ConfigError> {
        for (index, first) in buffs.iter().enumerate() {
            let first = db.misc_buff(*first);
            for second in &buffs[index + 1..] {
                let second = db.misc_buff(*second);
                let clash = match (&first.exclusive_group, &second.exclusive_group) {
                    (Some(a), Some(b)) => a == b,
                    _ => first.id == second.id,
                };
                if clash {
                    return Err(ConfigError::ExclusiveBuffs {
                        first: first.id.clone(),
                        second: second.id.clone(),
                    });
                }
            }
        }
        let added_raw = buffs.iter().map(|id| db.misc_buff(*id).added_raw).sum();
        let base_raw_multiplier = buffs
            .iter()
            .map(|id| db.misc_buff(*id).base_raw_multiplier)
            .product();
        Ok(Self {
            buffs,
            added_raw,
            base_raw_multiplier,
        })
    }

    pub fn buffs(&self) -> &[MiscBuffId] {
        &self.buffs
    }

    pub fn added_raw(&self) -> u32 {
        self.added_raw
    }

    pub fn base_raw_multiplier(&self) -> f64 {
        self.base_raw_multiplier
    }
}
