//! Hand-computed EFR values for builds made from the shipped catalogue. Chained cases
//! each add gear to the previous one, so their EFR must strictly increase.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use smithy::data::armour::{ArmourSlot, ArmourVariant};
use smithy::data::database::Database;
use smithy::model::damage::{calculate_damage, calculate_edv_from_gear_lookup, DamageModel};
use smithy::model::equips::{ArmourEquips, DecoEquips, MiscBuffsEquips};
use smithy::model::skills::SkillSpec;
use smithy::model::weapon_instance::{WeaponAugment, WeaponInstance, WeaponUpgrade};

fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

fn shipped() -> Arc<Database> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
    Database::load_from_dir(&dir).expect("shipped catalogue should load")
}

fn weapon<'db>(db: &'db Database, id: &str) -> WeaponInstance<'db> {
    let weapon_id = db.find_weapon(id).expect("weapon should exist");
    WeaponInstance::new(weapon_id, db.weapon(weapon_id))
}

fn buffs(db: &Database, ids: &[&str]) -> MiscBuffsEquips {
    let ids = ids
        .iter()
        .map(|id| db.find_misc_buff(id).expect("buff should exist"))
        .collect();
    MiscBuffsEquips::new(db, ids).expect("buffs should combine")
}

fn decorations(db: &Database, ids: &[&str]) -> DecoEquips {
    DecoEquips::new(
        ids.iter()
            .map(|id| db.find_decoration(id).expect("decoration should exist"))
            .collect(),
    )
}

fn armour(db: &Database, pieces: &[(&str, ArmourSlot)]) -> ArmourEquips {
    let mut armour = ArmourEquips::new();
    for (set, slot) in pieces {
        let piece = db
            .find_armour_piece(set, ArmourVariant::MasterRankBetaPlus, *slot)
            .expect("piece should exist");
        armour.add(db, piece);
    }
    armour
}

/// Weakness Exploit pinned to weak points; Agitator and Critical Eye relevant but
/// unconstrained.
fn weak_point_spec(db: &Database) -> SkillSpec {
    let catalogue = db.skills();
    let skill = |id: &str| catalogue.find_skill(id).expect("skill should exist");
    let min_levels: BTreeMap<_, _> = [(skill("AGITATOR"), 0), (skill("CRITICAL_EYE"), 0)].into_iter().collect();
    let forced: BTreeMap<_, _> = [(skill("WEAKNESS_EXPLOIT"), 1)].into_iter().collect();
    SkillSpec::new(min_levels, forced, BTreeSet::new(), BTreeMap::new(), catalogue)
        .expect("spec should be consistent")
}

#[test]
fn chained_safi_builds_match_hand_computed_efr() {
    let db = shipped();
    let spec = weak_point_spec(&db);
    let none = MiscBuffsEquips::default();
    let decos = DecoEquips::default();

    let safi = weapon(&db, "SAFI_SHATTERSPLITTER");
    let mut augmented = safi.clone();
    augmented.set_augment_level(3).expect("safi takes three augment levels");
    augmented
        .set_augment(WeaponAugment::AffinityIncrease, 1)
        .expect("one affinity augment fits");
    augmented
        .set_augment(WeaponAugment::HealthRegen, 1)
        .expect("health regen fits next to it");
    let mut awakened = augmented.clone();
    for upgrade in [
        WeaponUpgrade::AwakenedAttack6,
        WeaponUpgrade::AwakenedAttack5,
        WeaponUpgrade::AwakenedAttack5,
        WeaponUpgrade::AwakenedAttack5,
        WeaponUpgrade::AwakenedSharpness5,
    ] {
        awakened.add_upgrade(upgrade).expect("awakening should be accepted");
    }

    let head = armour(&db, &[("Teostra", ArmourSlot::Head)]);
    let upper = armour(
        &db,
        &[
            ("Teostra", ArmourSlot::Head),
            ("Raging Brachy", ArmourSlot::Chest),
            ("Teostra", ArmourSlot::Arms),
        ],
    );
    let full = armour(
        &db,
        &[
            ("Teostra", ArmourSlot::Head),
            ("Raging Brachy", ArmourSlot::Chest),
            ("Teostra", ArmourSlot::Arms),
            ("Teostra", ArmourSlot::Waist),
            ("Raging Brachy", ArmourSlot::Legs),
        ],
    );
    let mut charmed = full;
    charmed.set_charm(db.find_charm("CHALLENGER_CHARM"));

    // Critical multiplier 1.25. White sharpness (1.32) until the sharpness awakening.
    let cases = [
        // Critical eye 2: 320 raw, 10%.
        ("head", &safi, &head, 432.96),
        // Critical eye 4, agitator 2, attack boost 1: 331 raw, 25%.
        ("chest and arms", &safi, &upper, 464.2275),
        // Critical eye 5, agitator 4, attack boost 1: 339 raw, 32%.
        ("full set", &safi, &full, 483.2784),
        // Agitator 6 capped at 5 with only two Brachydios pieces: 343 raw, 35%.
        ("charm", &safi, &charmed, 492.3765),
        // First affinity augment: 45%.
        ("augments", &augmented, &charmed, 503.6955),
        // +39 true raw and 50 purple hits, 40 left after handicraft 0 (1.39): 382 raw.
        ("awakenings", &awakened, &charmed, 590.71525),
    ];

    let mut previous = 0.0;
    for (label, weapon, armour, expected) in cases {
        let edv = calculate_edv_from_gear_lookup(&db, weapon, armour, &decos, &none, &spec);
        assert!(
            approx_eq(edv.efr, expected, 1e-6),
            "{label}: expected {expected}, got {}",
            edv.efr
        );
        assert!(edv.efr > previous, "{label} should improve on the previous step");
        assert_eq!(edv.efes, 0.0);
        previous = edv.efr;
    }
}

#[test]
fn buffs_and_decorations_stack_on_a_partial_set() {
    let db = shipped();
    let spec = SkillSpec::default();
    let safi = weapon(&db, "SAFI_SHATTERSPLITTER");
    let gear = armour(&db, &[("Teostra", ArmourSlot::Head), ("Raging Brachy", ArmourSlot::Chest)]);
    let misc = buffs(&db, &["POWERCHARM", "POWERTALON"]);

    let bare = calculate_edv_from_gear_lookup(
        &db,
        &safi,
        &ArmourEquips::new(),
        &DecoEquips::default(),
        &MiscBuffsEquips::default(),
        &spec,
    );
    // 320 true raw, white sharpness after losing 50 hits to handicraft 0.
    assert!(approx_eq(bare.efr, 422.4, 1e-9), "got {}", bare.efr);

    // Eye 2, agitator 3, attack boost 2, +15 item raw: 353 raw at 17%.
    let decorated = calculate_edv_from_gear_lookup(
        &db,
        &safi,
        &gear,
        &decorations(&db, &["CHALLENGER_JEWEL", "ATTACK_JEWEL"]),
        &misc,
        &spec,
    );
    assert!(approx_eq(decorated.efr, 485.7633, 1e-6), "got {}", decorated.efr);
}

#[test]
fn sharpness_awakening_reaches_purple() {
    let db = shipped();
    let mut safi = weapon(&db, "SAFI_SHATTERSPLITTER");
    safi.add_upgrade(WeaponUpgrade::AwakenedSharpness6)
        .expect("safi should accept a sharpness awakening");
    let edv = calculate_edv_from_gear_lookup(
        &db,
        &safi,
        &ArmourEquips::new(),
        &DecoEquips::default(),
        &MiscBuffsEquips::default(),
        &SkillSpec::default(),
    );
    // 70 extra purple hits survive the 50-hit handicraft penalty: 320 * 1.39.
    assert!(approx_eq(edv.efr, 444.8, 1e-9), "got {}", edv.efr);
    assert_eq!(edv.final_sharpness_gauge.map(|gauge| gauge.top_tier_name()), Some("purple"));
}

#[test]
fn elemental_weapon_reports_efes() {
    let db = shipped();
    let kjarr = weapon(&db, "FIRE_KJARR_BLADE");
    let edv = calculate_edv_from_gear_lookup(
        &db,
        &kjarr,
        &ArmourEquips::new(),
        &DecoEquips::default(),
        &MiscBuffsEquips::default(),
        &SkillSpec::default(),
    );
    // Innate critical boost 1 with 10% affinity; blue sharpness after the penalty.
    assert!(approx_eq(edv.efr, 285.0 * 1.03 * 1.20, 1e-9), "got {}", edv.efr);
    assert!(approx_eq(edv.efes, 300.0 * 1.0625, 1e-9), "got {}", edv.efes);
}

#[test]
fn damage_model_scales_efr_by_motion_value_and_hitzone() {
    let db = shipped();
    let safi = weapon(&db, "SAFI_SHATTERSPLITTER");
    let edv = calculate_edv_from_gear_lookup(
        &db,
        &safi,
        &ArmourEquips::new(),
        &DecoEquips::default(),
        &MiscBuffsEquips::default(),
        &SkillSpec::default(),
    );
    let model = DamageModel {
        raw_mv: 100,
        elemod_fire: 1.0,
        elemod_water: 1.0,
        elemod_thunder: 1.0,
        elemod_ice: 1.0,
        elemod_dragon: 1.0,
        hzv_raw: 80,
        hzv_fire: 20,
        hzv_water: 20,
        hzv_thunder: 20,
        hzv_ice: 20,
        hzv_dragon: 20,
    };
    let damage = calculate_damage(&model, &edv);
    assert!(approx_eq(damage.unrounded_raw_damage, 337.92, 1e-9));
    assert_eq!(damage.unrounded_elestat_damage, 0.0);
    assert_eq!(damage.actual_total_damage, 338);
}
