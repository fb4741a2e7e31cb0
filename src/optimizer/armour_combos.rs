//! Per-slot candidate tables: every allowed piece of a slot with every useful way of
//! decorating it, collapsed to one entry per maximal (skills, set bonuses) signature.

use rayon::prelude::*;
use tracing::{debug, info};

use crate::data::armour::{ArmourPieceId, ArmourSlot};
use crate::data::charm::CharmId;
use crate::data::database::Database;
use crate::data::request::SearchParameters;
use crate::error::SearchError;
use crate::model::equips::DecoEquips;
use crate::model::skills::{SetBonusMap, SkillMap};
use crate::optimizer::deco_combos::{generate_deco_combos, DecoCatalogue};
use crate::optimizer::seen_map::{HashSubsetSeenMap, Signature, SubsetSeenMap};
use crate::parallel::WorkerPool;

#[derive(Debug, Clone, PartialEq)]
pub struct SlotCombo {
    pub piece: ArmourPieceId,
    pub decorations: DecoEquips,
    pub skills: SkillMap,
    pub set_bonuses: SetBonusMap,
}

/// Combinations for every armour slot, indexed like [`ArmourSlot::ALL`].
#[derive(Debug, Clone)]
pub struct SlotCombos {
    pub slots: [Vec<SlotCombo>; 5],
}

impl SlotCombos {
    pub fn get(&self, slot: ArmourSlot) -> &[SlotCombo] {
        &self.slots[slot.index()]
    }

    pub fn counts(&self) -> [usize; 5] {
        [
            self.slots[0].len(),
            self.slots[1].len(),
            self.slots[2].len(),
            self.slots[3].len(),
            self.slots[4].len(),
        ]
    }
}

/// Relevant skills and set bonus of one piece before decorations.
fn piece_signature(db: &Database, params: &SearchParameters, piece: ArmourPieceId) -> (SkillMap, SetBonusMap) {
    let catalogue = db.skills();
    let spec = &params.skill_spec;
    let info = db.armour_piece(piece);
    let mut skills = SkillMap::new();
    for (skill, level) in &info.skills {
        skills.increment(*skill, *level, catalogue);
    }
    spec.normalize_skills(&mut skills);
    let mut set_bonuses: SetBonusMap = info.set_bonus.map(|id| (id, 1)).into_iter().collect();
    spec.normalize_set_bonuses(&mut set_bonuses);
    (skills, set_bonuses)
}

pub fn generate_slot_combos(
    db: &Database,
    params: &SearchParameters,
    decorations: &DecoCatalogue,
    slot: ArmourSlot,
) -> Result<Vec<SlotCombo>, SearchError> {
    let catalogue = db.skills();
    let pieces: Vec<ArmourPieceId> = db
        .armour_pieces()
        .filter(|(_, piece)| piece.slot == slot && params.allows_tier(piece.tier()))
        .map(|(id, _)| id)
        .collect();
    if pieces.is_empty() {
        return Err(SearchError::EmptyArmourSlot { slot });
    }

    let mut seen = HashSubsetSeenMap::new();
    let mut generated = 0usize;
    for piece in &pieces {
        let (skills, set_bonuses) = piece_signature(db, params, *piece);
        let slots = &db.armour_piece(*piece).deco_slots;
        for combo in generate_deco_combos(slots, decorations, catalogue, &skills) {
            generated += 1;
            let signature = Signature::new(combo.skills, set_bonuses.clone());
            let payload = SlotCombo {
                piece: *piece,
                decorations: combo.decorations,
                skills: signature.skills.clone(),
                set_bonuses: signature.set_bonuses.clone(),
            };
            seen.add(&signature, payload);
        }
    }
    debug!(%slot, pieces = pieces.len(), generated, kept = seen.size(), "slot combinations");
    Ok(seen.into_data())
}

/// All five slots, generated in parallel.
pub fn generate_all_slot_combos(
    db: &Database,
    params: &SearchParameters,
    decorations: &DecoCatalogue,
    pool: &WorkerPool,
) -> Result<SlotCombos, SearchError> {
    let generated: Vec<Vec<SlotCombo>> = pool.install(|| {
        ArmourSlot::ALL
            .par_iter()
            .map(|slot| generate_slot_combos(db, params, decorations, *slot))
            .collect::<Result<Vec<_>, SearchError>>()
    })?;
    let mut slots: [Vec<SlotCombo>; 5] = Default::default();
    for (index, combos) in generated.into_iter().enumerate() {
        slots[index] = combos;
    }
    let combos = SlotCombos { slots };
    info!(counts = ?combos.counts(), "armour slot combinations generated");
    Ok(combos)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CharmSeed {
    pub charm: Option<CharmId>,
    pub skills: SkillMap,
}

/// One seed per distinct useful charm signature; "no charm" survives only when no
/// charm adds a relevant skill.
pub fn charm_seeds(db: &Database, params: &SearchParameters) -> Vec<CharmSeed> {
    let catalogue = db.skills();
    let spec = &params.skill_spec;
    let mut seen = HashSubsetSeenMap::new();
    seen.add(
        &Signature::default(),
        CharmSeed {
            charm: None,
            skills: SkillMap::new(),
        },
    );
    for (id, charm) in db.charms() {
        if charm.skills.iter().any(|skill| spec.is_removed(*skill)) {
            continue;
        }
        let mut skills = SkillMap::new();
        for skill in &charm.skills {
            skills.increment(*skill, charm.max_level, catalogue);
        }
        spec.normalize_skills(&mut skills);
        let signature = Signature::new(skills, SetBonusMap::new());
        seen.add(
            &signature,
            CharmSeed {
                charm: Some(id),
                skills: signature.skills.clone(),
            },
        );
    }
    seen.into_data()
}
