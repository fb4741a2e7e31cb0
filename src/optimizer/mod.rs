pub mod armour_combos;
pub mod deco_combos;
pub mod report;
pub mod search;
pub mod seen_map;
pub mod weapon_prep;

use serde::Serialize;
use tracing::{info, warn};

use crate::data::database::Database;
use crate::data::request::SearchParameters;
use crate::error::SearchError;
use crate::optimizer::armour_combos::{charm_seeds, generate_all_slot_combos};
use crate::optimizer::deco_combos::DecoCatalogue;
use crate::optimizer::search::{
    assemble_armour_sets, search_parallel, search_sequential, BestBuild, SearchContext,
};
use crate::optimizer::seen_map::SignatureLayout;
use crate::optimizer::weapon_prep::prepare_weapons;
use crate::parallel::WorkerPool;

pub use report::{build_report, search_report, BuildReport};
pub use search::ArmourSetCombo;
pub use seen_map::{HashSubsetSeenMap, IndexedSubsetSeenMap, MergeSeenMap, Signature, SubsetSeenMap};

/// Armour-set batches between weapon re-filters in parallel mode.
pub const DEFAULT_BATCHES: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Evaluate armour sets on the worker pool instead of the sequential driver.
    pub parallel: bool,
    /// Worker threads; 0 means the rayon default.
    pub workers: usize,
    pub batches: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            parallel: false,
            workers: 0,
            batches: DEFAULT_BATCHES,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub weapons_kept: usize,
    pub decorations_kept: usize,
    /// Per armour slot, head to legs.
    pub slot_combos: [usize; 5],
    pub charm_seeds: usize,
    pub armour_sets: usize,
    pub builds_evaluated: usize,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome<'db> {
    /// None when no build meets the minimum skill levels.
    pub best: Option<BestBuild<'db>>,
    pub stats: SearchStats,
}

/// Full pipeline: decorations, weapons, slot tables, whole sets, then the search proper.
pub fn run_search<'db>(
    db: &'db Database,
    params: &SearchParameters,
    options: &SearchOptions,
) -> Result<SearchOutcome<'db>, SearchError> {
    let pool = WorkerPool::with_workers(options.workers);
    let spec = &params.skill_spec;

    let decorations = DecoCatalogue::prepare(db, spec)?;
    let mut weapons = prepare_weapons(db, params)?;
    let layout = SignatureLayout::for_spec(spec, db.skills());
    if layout.is_none() {
        warn!("signature space exceeds 128 bits; merging armour sets by hashed signature");
    }
    let slots = generate_all_slot_combos(db, params, &decorations, &pool)?;
    let seeds = charm_seeds(db, params);
    let sets = assemble_armour_sets(db, params, layout.as_ref(), &seeds, &slots.slots);

    let mut stats = SearchStats {
        weapons_kept: weapons.len(),
        decorations_kept: decorations.len(),
        slot_combos: slots.counts(),
        charm_seeds: seeds.len(),
        armour_sets: sets.len(),
        builds_evaluated: 0,
    };
    info!(
        weapons = stats.weapons_kept,
        armour_sets = stats.armour_sets,
        parallel = options.parallel,
        "starting search"
    );

    let ctx = SearchContext {
        db,
        params,
        decorations: &decorations,
    };
    let result = if options.parallel {
        search_parallel(&ctx, &sets, &mut weapons, options.batches, &pool)
    } else {
        search_sequential(&ctx, &sets, &mut weapons)
    };
    stats.builds_evaluated = result.evaluated;

    match &result.best {
        Some(best) => info!(efr = best.efr(), evaluated = stats.builds_evaluated, "search finished"),
        None => info!(evaluated = stats.builds_evaluated, "no build satisfies the request"),
    }
    Ok(SearchOutcome {
        best: result.best,
        stats,
    })
}
