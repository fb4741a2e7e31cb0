//! Decoration packing: which decorations are worth considering for a search, and every
//! useful way of slotting them into a list of open slots.

use std::collections::BTreeMap;

use tracing::info;

use crate::data::database::Database;
use crate::data::decoration::DecorationId;
use crate::data::skills::{SkillCatalogue, SkillId};
use crate::error::SearchError;
use crate::model::equips::DecoEquips;
use crate::model::skills::{SkillMap, SkillSpec};

#[derive(Debug, Clone, PartialEq)]
pub struct PreparedDecoration {
    pub id: DecorationId,
    pub slot_size: u8,
    /// Only the levels that count toward relevant skills.
    pub relevant: Vec<(SkillId, u8)>,
}

impl PreparedDecoration {
    fn relevant_levels(&self) -> u32 {
        self.relevant.iter().map(|(_, level)| u32::from(*level)).sum()
    }

    /// Copies worth adding before every relevant skill saturates.
    fn useful_copies(&self, skills: &SkillMap, catalogue: &SkillCatalogue) -> usize {
        self.relevant
            .iter()
            .map(|(skill, level)| {
                let headroom = catalogue.skill(*skill).secret_limit.saturating_sub(skills.get(*skill));
                usize::from(headroom.div_ceil(*level))
            })
            .max()
            .unwrap_or(0)
    }
}

/// Decorations kept for a search, largest slot size first.
///
/// A decoration giving a single relevant level is kept only if it is the smallest way
/// to get that level of that skill; decorations giving two or more relevant levels are
/// always kept. This discards compound jewels whose second skill is irrelevant, which
/// can miss builds where the larger jewel's extra slot usage would not matter, so the
/// search is not exhaustive over decorations.
#[derive(Debug, Clone, Default)]
pub struct DecoCatalogue {
    decorations: Vec<PreparedDecoration>,
}

impl DecoCatalogue {
    pub fn prepare(db: &Database, spec: &SkillSpec) -> Result<Self, SearchError> {
        let mut single_level: BTreeMap<SkillId, PreparedDecoration> = BTreeMap::new();
        let mut multi_level = Vec::new();
        let mut considered = 0usize;

        for (id, deco) in db.decorations() {
            considered += 1;
            if deco.skills.iter().any(|(skill, _)| spec.is_removed(*skill)) {
                continue;
            }
            let prepared = PreparedDecoration {
                id,
                slot_size: deco.slot_size,
                relevant: deco
                    .skills
                    .iter()
                    .filter(|(skill, _)| spec.is_in_subset(*skill))
                    .copied()
                    .collect(),
            };
            match prepared.relevant_levels() {
                0 => {}
                1 => {
                    let skill = prepared.relevant[0].0;
                    let smaller = single_level
                        .get(&skill)
                        .map_or(true, |kept| prepared.slot_size < kept.slot_size);
                    if smaller {
                        single_level.insert(skill, prepared);
                    }
                }
                _ => multi_level.push(prepared),
            }
        }

        let mut decorations: Vec<PreparedDecoration> =
            single_level.into_values().chain(multi_level).collect();
        decorations.sort_by(|a, b| b.slot_size.cmp(&a.slot_size).then(a.id.cmp(&b.id)));

        if decorations.is_empty() && spec.subset().next().is_some() {
            return Err(SearchError::EmptyDecorationCatalogue);
        }
        info!(considered, kept = decorations.len(), "decoration catalogue prepared");
        Ok(Self { decorations })
    }

    pub fn from_decorations(mut decorations: Vec<PreparedDecoration>) -> Self {
        decorations.sort_by(|a, b| b.slot_size.cmp(&a.slot_size).then(a.id.cmp(&b.id)));
        Self { decorations }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PreparedDecoration> + '_ {
        self.decorations.iter()
    }

    pub fn len(&self) -> usize {
        self.decorations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorations.is_empty()
    }
}

/// One way of filling a slot list, with the skills it ends up at.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoCombo {
    pub decorations: DecoEquips,
    /// `accumulated` plus the decorations' relevant levels.
    pub skills: SkillMap,
}

#[derive(Debug, Clone)]
struct Partial {
    next_slot: usize,
    decorations: Vec<DecorationId>,
    skills: SkillMap,
}

/// Every distinct multiset of decorations that exactly fills `slots` (sorted descending).
///
/// Decorations are visited from the largest size down and placed into slots front to
/// back, so a placed decoration always sits in the largest free slot. A branch that
/// still has open slots once the catalogue runs out is dropped.
pub fn generate_deco_combos(
    slots: &[u8],
    decorations: &DecoCatalogue,
    catalogue: &SkillCatalogue,
    accumulated: &SkillMap,
) -> Vec<DecoCombo> {
    let mut partials = vec![Partial {
        next_slot: 0,
        decorations: Vec::new(),
        skills: accumulated.clone(),
    }];

    for deco in decorations.iter() {
        let mut next = Vec::with_capacity(partials.len());
        for partial in partials {
            let fitting = slots[partial.next_slot..]
                .iter()
                .take_while(|size| **size >= deco.slot_size)
                .count();
            let copies = deco.useful_copies(&partial.skills, catalogue).min(fitting);
            let mut current = partial;
            for _ in 0..copies {
                next.push(current.clone());
                current.next_slot += 1;
                current.decorations.push(deco.id);
                for (skill, level) in &deco.relevant {
                    current.skills.increment(*skill, *level, catalogue);
                }
            }
            next.push(current);
        }
        partials = next;
    }

    partials
        .into_iter()
        .filter(|partial| partial.next_slot == slots.len())
        .map(|partial| DecoCombo {
            decorations: DecoEquips::new(partial.decorations),
            skills: partial.skills,
        })
        .collect()
}
