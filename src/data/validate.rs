use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::data::armour::ArmourSlot;
use crate::data::database::Database;
use crate::data::skills::SkillId;
use crate::data::weapon::UpgradeScheme;
use crate::model::skills::MAX_SET_BONUS_PIECES;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ValidationSeverity {
    Error,
    Warning,
    Info,
}

impl ValidationSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }
}

impl fmt::Display for ValidationSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationDiagnostic {
    pub severity: ValidationSeverity,
    pub context: String,
    pub message: String,
}

impl fmt::Display for ValidationDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.context, self.message)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    pub fn push(
        &mut self,
        severity: ValidationSeverity,
        context: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.diagnostics.push(ValidationDiagnostic {
            severity,
            context: context.into(),
            message: message.into(),
        });
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diag| diag.severity == ValidationSeverity::Error)
    }

    pub fn count(&self, severity: ValidationSeverity) -> usize {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity == severity)
            .count()
    }
}

/// Load a catalogue directory and report on it. Load failures (unreadable files,
/// duplicate ids, unresolved references) are errors; everything else is advisory.
pub fn validate_catalogue_dir(dir: &Path) -> ValidationReport {
    match Database::load_from_dir(dir) {
        Ok(db) => validate_database(&db),
        Err(err) => {
            let mut report = ValidationReport::default();
            report.push(
                ValidationSeverity::Error,
                dir.display().to_string(),
                err.to_string(),
            );
            report
        }
    }
}

pub fn validate_database(db: &Database) -> ValidationReport {
    let mut report = ValidationReport::default();
    let catalogue = db.skills();

    let mut obtainable: HashSet<SkillId> = HashSet::new();
    for (_, deco) in db.decorations() {
        obtainable.extend(deco.skills.iter().map(|(skill, _)| *skill));
        for (skill, level) in &deco.skills {
            let info = catalogue.skill(*skill);
            if *level > info.secret_limit {
                report.push(
                    ValidationSeverity::Warning,
                    format!("decoration '{}'", deco.id),
                    format!("grants {} levels of {} (limit {})", level, info.id, info.secret_limit),
                );
            }
        }
    }
    for (_, piece) in db.armour_pieces() {
        obtainable.extend(piece.skills.iter().map(|(skill, _)| *skill));
    }
    for (_, charm) in db.charms() {
        obtainable.extend(charm.skills.iter().copied());
    }
    for (_, weapon) in db.weapons() {
        obtainable.extend(weapon.skill);
    }
    for set_bonus in catalogue.set_bonus_ids() {
        obtainable.extend(catalogue.set_bonus(set_bonus).stages.iter().map(|stage| stage.skill));
    }

    for skill in catalogue.skill_ids() {
        if !obtainable.contains(&skill) {
            report.push(
                ValidationSeverity::Info,
                format!("skill '{}'", catalogue.skill(skill).id),
                "not granted by any decoration, armour, charm, weapon or set bonus",
            );
        }
    }

    for set_bonus in catalogue.set_bonus_ids() {
        let info = catalogue.set_bonus(set_bonus);
        let mut slots: HashSet<ArmourSlot> = HashSet::new();
        for (_, piece) in db.armour_pieces() {
            if piece.set_bonus == Some(set_bonus) {
                slots.insert(piece.slot);
            }
        }
        let awakening_source = db.weapons().any(|(_, weapon)| match &weapon.upgrades {
            UpgradeScheme::Awakening { set_bonus_options } => set_bonus_options.contains(&set_bonus),
            _ => false,
        });
        let reachable = slots.len() as u8 + u8::from(awakening_source);
        if let Some(stage) = info.stages.iter().find(|stage| stage.parts > reachable) {
            report.push(
                ValidationSeverity::Warning,
                format!("set bonus '{}'", info.id),
                format!(
                    "stage at {} pieces is unreachable: only {} distinct sources carry the set",
                    stage.parts, reachable
                ),
            );
        }
        if info.stages.iter().any(|stage| stage.parts > MAX_SET_BONUS_PIECES) {
            report.push(
                ValidationSeverity::Warning,
                format!("set bonus '{}'", info.id),
                "stage threshold above the piece cap",
            );
        }
    }

    for slot in ArmourSlot::ALL {
        if !db.armour_pieces().any(|(_, piece)| piece.slot == slot) {
            report.push(
                ValidationSeverity::Warning,
                format!("armour {slot}"),
                "no pieces; every search will fail",
            );
        }
    }

    for (_, weapon) in db.weapons() {
        if let UpgradeScheme::Awakening { set_bonus_options } = &weapon.upgrades {
            if set_bonus_options.is_empty() {
                report.push(
                    ValidationSeverity::Info,
                    format!("weapon '{}'", weapon.id),
                    "awakenings declared without set bonus options",
                );
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::database::shipped_database;

    #[test]
    fn shipped_catalogue_has_no_errors() {
        let report = validate_database(&shipped_database());
        assert!(!report.has_errors(), "{:?}", report.diagnostics);
    }

    #[test]
    fn unreadable_directory_is_an_error() {
        let report = validate_catalogue_dir(Path::new("/definitely/not/here"));
        assert!(report.has_errors());
        assert_eq!(report.count(ValidationSeverity::Error), 1);
    }

    #[test]
    fn diagnostics_render_with_severity() {
        let mut report = ValidationReport::default();
        report.push(ValidationSeverity::Warning, "skill 'X'", "unused");
        assert_eq!(report.diagnostics[0].to_string(), "[warning] skill 'X': unused");
    }
}
