use serde::Deserialize;

use crate::data::skills::{SkillCatalogue, SkillId};
use crate::error::DataError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharmId(pub(crate) u16);

impl CharmId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A charm at its maximum level. Every listed skill is granted `max_level` levels.
#[derive(Debug, Clone, PartialEq)]
pub struct Charm {
    pub id: String,
    pub name: String,
    pub max_level: u8,
    pub skills: Vec<SkillId>,
}

#[derive(Debug, Clone, Deserialize)]
struct CharmRecord {
    id: String,
    name: String,
    max_level: u8,
    skills: Vec<String>,
}

/// Raw shape of `charms.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct CharmsFile {
    charms: Vec<CharmRecord>,
}

pub fn resolve_charms(file: CharmsFile, skills: &SkillCatalogue) -> Result<Vec<Charm>, DataError> {
    file.charms
        .into_iter()
        .map(|record| {
            let context = format!("charm '{}'", record.id);
            if record.max_level == 0 {
                return Err(DataError::Invalid {
                    context,
                    message: "max level must be at least 1".to_string(),
                });
            }
            let resolved = record
                .skills
                .iter()
                .map(|skill| skills.resolve_skill(&context, skill))
                .collect::<Result<Vec<_>, DataError>>()?;
            Ok(Charm {
                id: record.id,
                name: record.name,
                max_level: record.max_level,
                skills: resolved,
            })
        })
        .collect()
}
