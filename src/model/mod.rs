//! Game mechanics: skill accumulation, weapon configuration and the damage objective.

pub mod damage;
pub mod equips;
pub mod sharpness;
pub mod skill_contribution;
pub mod skills;
pub mod weapon_instance;

pub use damage::{
    calculate_damage, calculate_edv, calculate_edv_from_gear_lookup,
    calculate_edv_from_skills_lookup, DamageModel, EffectiveDamageValues, ModelCalculatedValues,
};
pub use equips::{ArmourEquips, DecoEquips, MiscBuffsEquips};
pub use sharpness::SharpnessGauge;
pub use skills::{SetBonusMap, SkillMap, SkillSpec};
pub use weapon_instance::{
    generate_maximized_instances, WeaponAugment, WeaponContribution, WeaponInstance, WeaponUpgrade,
};
