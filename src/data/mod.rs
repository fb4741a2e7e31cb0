pub mod armour;
pub mod build;
pub mod charm;
pub mod database;
pub mod decoration;
pub mod misc_buff;
pub mod request;
pub mod skills;
pub mod validate;
pub mod weapon;

pub use armour::{ArmourPiece, ArmourPieceId, ArmourSlot, ArmourVariant, Tier};
pub use charm::{Charm, CharmId};
pub use database::{resolve_data_dir, Database, DATA_DIR_ENV, DEFAULT_DATA_DIR};
pub use decoration::{Decoration, DecorationId, MAX_SLOT_SIZE};
pub use misc_buff::{MiscBuff, MiscBuffId};
pub use request::SearchParameters;
pub use skills::{SetBonus, SetBonusId, Skill, SkillCatalogue, SkillId};
pub use validate::{validate_catalogue_dir, ValidationReport, ValidationSeverity};
pub use weapon::{EleStat, EleStatType, EleStatVisibility, Weapon, WeaponClass, WeaponId};
