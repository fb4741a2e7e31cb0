use thiserror::Error;

use crate::data::armour::ArmourSlot;

/// Catalogue loading and cross-reference failures. Raised before any request is read.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("unable to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("duplicate {kind} id '{id}'")]
    DuplicateId { kind: &'static str, id: String },

    #[error("{context} references unknown {kind} '{id}'")]
    UnresolvedReference {
        context: String,
        kind: &'static str,
        id: String,
    },

    #[error("{context}: {message}")]
    Invalid { context: String, message: String },
}

/// Request and build-document failures. Raised before any search work starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("unknown {kind} '{id}'")]
    UnknownId { kind: &'static str, id: String },

    #[error("contradictory skill spec: {0}")]
    ContradictorySkillSpec(String),

    #[error("misc buffs '{first}' and '{second}' cannot be combined")]
    ExclusiveBuffs { first: String, second: String },

    #[error("invalid weapon configuration: {0}")]
    InvalidWeaponConfiguration(String),

    #[error("decorations do not fit in the available slots")]
    DecorationsDoNotFit,
}

/// Search-time invariant violations. Each carries enough context to relax the request.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("no {slot} armour remains after filtering; allow more ranks")]
    EmptyArmourSlot { slot: ArmourSlot },

    #[error("no decorations remain after filtering for the selected skills")]
    EmptyDecorationCatalogue,

    #[error("no {class} weapons remain after filtering")]
    NoWeaponCandidates { class: String },
}

