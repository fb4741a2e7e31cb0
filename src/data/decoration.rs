use std::collections::BTreeMap;

use serde::Deserialize;

use crate::data::skills::{SkillCatalogue, SkillId};
use crate::error::DataError;

pub const MAX_SLOT_SIZE: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DecorationId(pub(crate) u16);

impl DecorationId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decoration {
    pub id: String,
    pub name: String,
    pub slot_size: u8,
    pub skills: Vec<(SkillId, u8)>,
}

impl Decoration {
    pub fn level_of(&self, skill: SkillId) -> u8 {
        self.skills
            .iter()
            .find(|(id, _)| *id == skill)
            .map_or(0, |(_, level)| *level)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct DecorationRecord {
    id: String,
    name: String,
    slot_size: u8,
    skills: BTreeMap<String, u8>,
}

/// Raw shape of `decorations.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct DecorationsFile {
    decorations: Vec<DecorationRecord>,
}

pub fn resolve_decorations(
    file: DecorationsFile,
    skills: &SkillCatalogue,
) -> Result<Vec<Decoration>, DataError> {
    file.decorations
        .into_iter()
        .map(|record| {
            let context = format!("decoration '{}'", record.id);
            if record.slot_size == 0 || record.slot_size > MAX_SLOT_SIZE {
                return Err(DataError::Invalid {
                    context,
                    message: format!("slot size {} is out of range", record.slot_size),
                });
            }
            if record.skills.is_empty() {
                return Err(DataError::Invalid {
                    context,
                    message: "decoration grants no skills".to_string(),
                });
            }
            let resolved = record
                .skills
                .iter()
                .map(|(skill, level)| Ok((skills.resolve_skill(&context, skill)?, *level)))
                .collect::<Result<Vec<_>, DataError>>()?;
            Ok(Decoration {
                id: record.id,
                name: record.name,
                slot_size: record.slot_size,
                skills: resolved,
            })
        })
        .collect()
}
