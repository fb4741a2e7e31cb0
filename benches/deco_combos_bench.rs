//! Decoration combination generation for typical armour slot layouts.
//!
//! Run with: `cargo bench --bench deco_combos`

use std::path::Path;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use smithy::data::database::Database;
use smithy::model::skills::{SkillMap, SkillSpec};
use smithy::optimizer::deco_combos::{generate_deco_combos, DecoCatalogue};

fn bench_deco_combos(c: &mut Criterion) {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("data");
    let db = Database::load_from_dir(&dir).expect("shipped catalogue should load");
    let catalogue = db.skills();
    let min_levels = ["AGITATOR", "CRITICAL_EYE", "WEAKNESS_EXPLOIT", "ATTACK_BOOST", "CRITICAL_BOOST"]
        .iter()
        .map(|id| (catalogue.find_skill(id).expect("bench skill should exist"), 0))
        .collect();
    let spec = SkillSpec::new(
        min_levels,
        Default::default(),
        Default::default(),
        Default::default(),
        catalogue,
    )
    .expect("bench spec should be consistent");
    let decorations = DecoCatalogue::prepare(&db, &spec).expect("bench decorations should exist");
    let empty = SkillMap::new();

    let mut group = c.benchmark_group("deco_combos");
    for slots in [vec![1u8], vec![2, 1], vec![4, 2, 1], vec![4, 4, 2]] {
        let label = format!("slots_{}", slots.iter().map(u8::to_string).collect::<Vec<_>>().join("_"));
        group.bench_function(label, |b| {
            b.iter(|| black_box(generate_deco_combos(&slots, &decorations, catalogue, &empty)).len())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_deco_combos);
criterion_main!(benches);
