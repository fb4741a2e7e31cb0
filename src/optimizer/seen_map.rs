//! Subset-seen maps: deduplication keyed on accumulated skill and set-bonus counts.
//!
//! Adding a signature registers it together with every signature reachable by taking
//! one unit off one component at a time (its whole power set). Anything later added
//! that is no stronger than a registered signature is dropped on arrival, and payloads
//! stored under a signature that a newer, stronger one subsumes are discarded. What
//! remains is one payload per maximal signature, in insertion order.
//!
//! Registration walks an explicit work-list. A walk stops at any signature that was
//! already registered, since its own power set is registered too.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::data::skills::{SetBonusId, SkillCatalogue, SkillId};
use crate::model::skills::{SetBonusMap, SkillMap, SkillSpec, MAX_SET_BONUS_PIECES};

/// Bitsets up to this many bits are allocated densely (8 MiB).
const DENSE_SEEN_LIMIT: u128 = 1 << 26;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Signature {
    pub skills: SkillMap,
    pub set_bonuses: SetBonusMap,
}

impl Signature {
    pub fn new(skills: SkillMap, set_bonuses: SetBonusMap) -> Self {
        Self {
            skills,
            set_bonuses,
        }
    }

    /// Signatures one unit weaker in exactly one component.
    fn children(&self) -> impl Iterator<Item = Signature> + '_ {
        let skill_children = self.skills.iter().map(move |(skill, _)| {
            let mut child = self.clone();
            child.skills.decrement(skill);
            child
        });
        let set_bonus_children = self.set_bonuses.iter().map(move |(set_bonus, _)| {
            let mut child = self.clone();
            child.set_bonuses.decrement(set_bonus);
            child
        });
        skill_children.chain(set_bonus_children)
    }
}

pub trait SubsetSeenMap<D> {
    /// No-op if `signature` (or anything subsuming it) was seen before.
    fn add(&mut self, signature: &Signature, payload: D);

    /// Retained payloads in insertion order.
    fn get_data_as_vector(&self) -> Vec<D>
    where
        D: Clone;

    fn into_data(self) -> Vec<D>
    where
        Self: Sized;

    /// Number of retained payloads: one per distinct maximal signature added.
    fn size(&self) -> usize;

    /// Number of registered signatures, including every subsumed sub-signature.
    fn seen_count(&self) -> usize;
}

/// Payload storage shared by both implementations. Slots keep insertion order;
/// erased payloads leave a hole.
#[derive(Debug, Clone)]
struct Retained<K, D> {
    slots: Vec<Option<D>>,
    index: HashMap<K, usize>,
    live: usize,
}

impl<K: Eq + Hash, D> Default for Retained<K, D> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
            live: 0,
        }
    }
}

impl<K: Eq + Hash, D> Retained<K, D> {
    fn insert(&mut self, key: K, payload: D) {
        self.index.insert(key, self.slots.len());
        self.slots.push(Some(payload));
        self.live += 1;
    }

    fn erase(&mut self, key: &K) {
        if let Some(slot) = self.index.remove(key) {
            if self.slots[slot].take().is_some() {
                self.live -= 1;
            }
        }
    }

    fn cloned(&self) -> Vec<D>
    where
        D: Clone,
    {
        self.slots.iter().flatten().cloned().collect()
    }

    fn into_vec(self) -> Vec<D> {
        self.slots.into_iter().flatten().collect()
    }
}

/// Hashes whole signatures. Suited to small per-slot tables.
#[derive(Debug, Clone)]
pub struct HashSubsetSeenMap<D> {
    seen: HashSet<Signature>,
    data: Retained<Signature, D>,
}

impl<D> Default for HashSubsetSeenMap<D> {
    fn default() -> Self {
        Self {
            seen: HashSet::new(),
            data: Retained::default(),
        }
    }
}

impl<D> HashSubsetSeenMap<D> {
    pub fn new() -> Self {
        Self::default()
    }

    fn register_power_set(&mut self, root: &Signature) {
        let mut pending = vec![root.clone()];
        while let Some(signature) = pending.pop() {
            if self.seen.contains(&signature) {
                self.data.erase(&signature);
                continue;
            }
            pending.extend(signature.children());
            self.seen.insert(signature);
        }
    }
}

impl<D> SubsetSeenMap<D> for HashSubsetSeenMap<D> {
    fn add(&mut self, signature: &Signature, payload: D) {
        if self.seen.contains(signature) {
            return;
        }
        self.register_power_set(signature);
        self.data.insert(signature.clone(), payload);
    }

    fn get_data_as_vector(&self) -> Vec<D>
    where
        D: Clone,
    {
        self.data.cloned()
    }

    fn into_data(self) -> Vec<D> {
        self.data.into_vec()
    }

    fn size(&self) -> usize {
        self.data.live
    }

    fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

/// Mixed-radix encoding of signatures: one digit per tracked skill (radix secret
/// limit + 1) and per tracked set bonus (radix piece cap + 1).
#[derive(Debug, Clone)]
pub struct SignatureLayout {
    skill_digits: HashMap<SkillId, usize>,
    set_bonus_digits: HashMap<SetBonusId, usize>,
    radices: Vec<u128>,
    strides: Vec<u128>,
    space: u128,
}

impl SignatureLayout {
    /// `None` when the code space does not fit in 128 bits.
    pub fn new(skill_maxima: &[(SkillId, u8)], set_bonus_maxima: &[(SetBonusId, u8)]) -> Option<Self> {
        let keys = skill_maxima.len() + set_bonus_maxima.len();
        let mut radices = Vec::with_capacity(keys);
        let mut strides = Vec::with_capacity(keys);
        let mut space: u128 = 1;
        let maxima = skill_maxima
            .iter()
            .map(|(_, max)| *max)
            .chain(set_bonus_maxima.iter().map(|(_, max)| *max));
        for max in maxima {
            let radix = u128::from(max) + 1;
            strides.push(space);
            radices.push(radix);
            space = space.checked_mul(radix)?;
        }
        Some(Self {
            skill_digits: skill_maxima
                .iter()
                .enumerate()
                .map(|(digit, (skill, _))| (*skill, digit))
                .collect(),
            set_bonus_digits: set_bonus_maxima
                .iter()
                .enumerate()
                .map(|(digit, (set_bonus, _))| (*set_bonus, skill_maxima.len() + digit))
                .collect(),
            radices,
            strides,
            space,
        })
    }

    /// Layout covering every skill and set bonus a spec tracks.
    pub fn for_spec(spec: &SkillSpec, catalogue: &SkillCatalogue) -> Option<Self> {
        let skills: Vec<(SkillId, u8)> = spec
            .subset()
            .map(|skill| (skill, catalogue.skill(skill).secret_limit))
            .collect();
        let set_bonuses: Vec<(SetBonusId, u8)> = spec
            .set_bonus_subset()
            .map(|set_bonus| (set_bonus, MAX_SET_BONUS_PIECES))
            .collect();
        Self::new(&skills, &set_bonuses)
    }

    /// Number of distinct codes.
    pub fn space(&self) -> u128 {
        self.space
    }

    /// Keys outside the layout must have been normalized away beforehand.
    pub fn encode(&self, signature: &Signature) -> u128 {
        let mut code = 0;
        for (skill, level) in signature.skills.iter() {
            let digit = self.skill_digits.get(&skill);
            debug_assert!(digit.is_some(), "skill outside the signature layout");
            if let Some(digit) = digit {
                code += self.strides[*digit] * u128::from(level).min(self.radices[*digit] - 1);
            }
        }
        for (set_bonus, pieces) in signature.set_bonuses.iter() {
            let digit = self.set_bonus_digits.get(&set_bonus);
            debug_assert!(digit.is_some(), "set bonus outside the signature layout");
            if let Some(digit) = digit {
                code += self.strides[*digit] * u128::from(pieces).min(self.radices[*digit] - 1);
            }
        }
        code
    }

    fn digit(&self, code: u128, position: usize) -> u128 {
        (code / self.strides[position]) % self.radices[position]
    }
}

#[derive(Debug, Clone)]
enum SeenCodes {
    Dense { words: Vec<u64>, count: usize },
    Sparse(HashSet<u128>),
}

impl SeenCodes {
    fn for_space(space: u128) -> Self {
        if space <= DENSE_SEEN_LIMIT {
            let words = (space as usize).div_ceil(64);
            Self::Dense {
                words: vec![0; words],
                count: 0,
            }
        } else {
            Self::Sparse(HashSet::new())
        }
    }

    fn contains(&self, code: u128) -> bool {
        match self {
            Self::Dense { words, .. } => {
                let code = code as usize;
                words[code / 64] & (1u64 << (code % 64)) != 0
            }
            Self::Sparse(set) => set.contains(&code),
        }
    }

    fn insert(&mut self, code: u128) {
        match self {
            Self::Dense { words, count } => {
                let code = code as usize;
                let bit = 1u64 << (code % 64);
                if words[code / 64] & bit == 0 {
                    words[code / 64] |= bit;
                    *count += 1;
                }
            }
            Self::Sparse(set) => {
                set.insert(code);
            }
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Dense { count, .. } => *count,
            Self::Sparse(set) => set.len(),
        }
    }
}

/// Works on integer codes from a [`SignatureLayout`]. Used for whole-set merging where
/// tables reach millions of entries.
#[derive(Debug, Clone)]
pub struct IndexedSubsetSeenMap<D> {
    layout: SignatureLayout,
    seen: SeenCodes,
    data: Retained<u128, D>,
}

impl<D> IndexedSubsetSeenMap<D> {
    pub fn new(layout: SignatureLayout) -> Self {
        let seen = SeenCodes::for_space(layout.space());
        Self {
            layout,
            seen,
            data: Retained::default(),
        }
    }

    pub fn layout(&self) -> &SignatureLayout {
        &self.layout
    }

    fn register_power_set(&mut self, root: u128) {
        let digits = self.layout.radices.len();
        let mut pending = vec![root];
        while let Some(code) = pending.pop() {
            if self.seen.contains(code) {
                self.data.erase(&code);
                continue;
            }
            self.seen.insert(code);
            for position in 0..digits {
                if self.layout.digit(code, position) > 0 {
                    pending.push(code - self.layout.strides[position]);
                }
            }
        }
    }
}

impl<D> SubsetSeenMap<D> for IndexedSubsetSeenMap<D> {
    fn add(&mut self, signature: &Signature, payload: D) {
        let code = self.layout.encode(signature);
        if self.seen.contains(code) {
            return;
        }
        self.register_power_set(code);
        self.data.insert(code, payload);
    }

    fn get_data_as_vector(&self) -> Vec<D>
    where
        D: Clone,
    {
        self.data.cloned()
    }

    fn into_data(self) -> Vec<D> {
        self.data.into_vec()
    }

    fn size(&self) -> usize {
        self.data.live
    }

    fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

/// Whole-set merge table: indexed when a layout exists, hashed when the spec's
/// signatures are too wide to encode.
#[derive(Debug, Clone)]
pub enum MergeSeenMap<D> {
    Indexed(IndexedSubsetSeenMap<D>),
    Hashed(HashSubsetSeenMap<D>),
}

impl<D> MergeSeenMap<D> {
    pub fn new(layout: Option<&SignatureLayout>) -> Self {
        match layout {
            Some(layout) => Self::Indexed(IndexedSubsetSeenMap::new(layout.clone())),
            None => Self::Hashed(HashSubsetSeenMap::new()),
        }
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self, Self::Indexed(_))
    }
}

impl<D> SubsetSeenMap<D> for MergeSeenMap<D> {
    fn add(&mut self, signature: &Signature, payload: D) {
        match self {
            Self::Indexed(map) => map.add(signature, payload),
            Self::Hashed(map) => map.add(signature, payload),
        }
    }

    fn get_data_as_vector(&self) -> Vec<D>
    where
        D: Clone,
    {
        match self {
            Self::Indexed(map) => map.get_data_as_vector(),
            Self::Hashed(map) => map.get_data_as_vector(),
        }
    }

    fn into_data(self) -> Vec<D> {
        match self {
            Self::Indexed(map) => map.into_data(),
            Self::Hashed(map) => map.into_data(),
        }
    }

    fn size(&self) -> usize {
        match self {
            Self::Indexed(map) => map.size(),
            Self::Hashed(map) => map.size(),
        }
    }

    fn seen_count(&self) -> usize {
        match self {
            Self::Indexed(map) => map.seen_count(),
            Self::Hashed(map) => map.seen_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const SKILLS: u16 = 3;
    const SKILL_MAX: u8 = 3;
    const SET_BONUSES: u16 = 2;

    fn signature(skills: &[(u16, u8)], set_bonuses: &[(u16, u8)]) -> Signature {
        Signature::new(
            skills.iter().map(|(id, level)| (SkillId(*id), *level)).collect(),
            set_bonuses.iter().map(|(id, pieces)| (SetBonusId(*id), *pieces)).collect(),
        )
    }

    fn layout() -> SignatureLayout {
        let skills: Vec<_> = (0..SKILLS).map(|id| (SkillId(id), SKILL_MAX)).collect();
        let set_bonuses: Vec<_> = (0..SET_BONUSES)
            .map(|id| (SetBonusId(id), MAX_SET_BONUS_PIECES))
            .collect();
        SignatureLayout::new(&skills, &set_bonuses).unwrap()
    }

    fn both() -> (HashSubsetSeenMap<usize>, IndexedSubsetSeenMap<usize>) {
        (HashSubsetSeenMap::new(), IndexedSubsetSeenMap::new(layout()))
    }

    #[test]
    fn adding_the_same_signature_twice_keeps_the_first_payload() {
        let (mut hashed, mut indexed) = both();
        let sig = signature(&[(0, 2)], &[(1, 3)]);
        for map in [&mut hashed as &mut dyn SubsetSeenMap<usize>, &mut indexed] {
            map.add(&sig, 1);
            map.add(&sig, 2);
            assert_eq!(map.size(), 1);
        }
        assert_eq!(hashed.get_data_as_vector(), vec![1]);
        assert_eq!(indexed.get_data_as_vector(), vec![1]);
    }

    #[test]
    fn weaker_signature_after_stronger_is_dropped() {
        let (mut hashed, mut indexed) = both();
        let strong = signature(&[(0, 2), (1, 1)], &[]);
        let weak = signature(&[(0, 1)], &[]);
        for map in [&mut hashed as &mut dyn SubsetSeenMap<usize>, &mut indexed] {
            map.add(&strong, 1);
            map.add(&weak, 2);
            assert_eq!(map.size(), 1);
        }
        assert_eq!(hashed.get_data_as_vector(), vec![1]);
        assert_eq!(indexed.get_data_as_vector(), vec![1]);
    }

    #[test]
    fn stronger_signature_evicts_weaker_payloads() {
        let (mut hashed, mut indexed) = both();
        let weak = signature(&[(0, 1)], &[]);
        let other = signature(&[(2, 3)], &[]);
        let strong = signature(&[(0, 2), (1, 1)], &[]);
        for map in [&mut hashed as &mut dyn SubsetSeenMap<usize>, &mut indexed] {
            map.add(&weak, 1);
            map.add(&other, 2);
            map.add(&strong, 3);
            assert_eq!(map.size(), 2);
        }
        assert_eq!(hashed.get_data_as_vector(), vec![2, 3]);
        assert_eq!(indexed.into_data(), vec![2, 3]);
    }

    #[test]
    fn power_set_size_is_the_product_of_digit_ranges() {
        let (mut hashed, mut indexed) = both();
        let sig = signature(&[(0, 2), (1, 3)], &[(0, 1)]);
        hashed.add(&sig, 0);
        indexed.add(&sig, 0);
        assert_eq!(hashed.seen_count(), 3 * 4 * 2);
        assert_eq!(indexed.seen_count(), 3 * 4 * 2);
    }

    #[test]
    fn empty_signature_is_retained_until_anything_arrives() {
        let (mut hashed, _) = both();
        hashed.add(&Signature::default(), 0);
        assert_eq!(hashed.size(), 1);
        hashed.add(&signature(&[(0, 1)], &[]), 1);
        assert_eq!(hashed.get_data_as_vector(), vec![1]);
    }

    #[test]
    fn oversized_layouts_fall_back_to_hashing() {
        let skills: Vec<_> = (0..200).map(|id| (SkillId(id), 7)).collect();
        let layout = SignatureLayout::new(&skills, &[]);
        assert!(layout.is_none());

        let mut merged = MergeSeenMap::new(layout.as_ref());
        assert!(!merged.is_indexed());
        merged.add(&signature(&[(0, 1), (150, 2)], &[]), 0);
        merged.add(&signature(&[(0, 2), (150, 2), (199, 1)], &[]), 1);
        merged.add(&signature(&[(199, 1)], &[]), 2);
        assert_eq!(merged.size(), 1);
        assert_eq!(merged.seen_count(), 3 * 3 * 2);
        assert_eq!(merged.into_data(), vec![1]);
    }

    #[test]
    fn merge_map_uses_the_layout_when_it_fits() {
        let layout = layout();
        let mut merged = MergeSeenMap::new(Some(&layout));
        assert!(merged.is_indexed());
        merged.add(&signature(&[(0, 1)], &[]), 0);
        merged.add(&signature(&[(0, 2)], &[(1, 1)]), 1);
        assert_eq!(merged.get_data_as_vector(), vec![1]);
    }

    fn arbitrary_signature() -> impl Strategy<Value = Signature> {
        (
            proptest::collection::vec(0..=SKILL_MAX, SKILLS as usize),
            proptest::collection::vec(0..=MAX_SET_BONUS_PIECES, SET_BONUSES as usize),
        )
            .prop_map(|(skills, set_bonuses)| {
                let skills: Vec<(u16, u8)> = skills
                    .into_iter()
                    .enumerate()
                    .map(|(id, level)| (id as u16, level))
                    .collect();
                let set_bonuses: Vec<(u16, u8)> = set_bonuses
                    .into_iter()
                    .enumerate()
                    .map(|(id, pieces)| (id as u16, pieces))
                    .collect();
                signature(&skills, &set_bonuses)
            })
    }

    fn dominates(a: &Signature, b: &Signature) -> bool {
        b.skills.iter().all(|(skill, level)| a.skills.get(skill) >= level)
            && b.set_bonuses
                .iter()
                .all(|(set_bonus, pieces)| a.set_bonuses.get(set_bonus) >= pieces)
    }

    proptest! {
        #[test]
        fn hash_and_indexed_variants_agree(signatures in proptest::collection::vec(arbitrary_signature(), 1..24)) {
            let (mut hashed, mut indexed) = both();
            for (payload, sig) in signatures.iter().enumerate() {
                hashed.add(sig, payload);
                indexed.add(sig, payload);
            }
            prop_assert_eq!(hashed.size(), indexed.size());
            prop_assert_eq!(hashed.seen_count(), indexed.seen_count());
            prop_assert_eq!(hashed.get_data_as_vector(), indexed.get_data_as_vector());
        }

        #[test]
        fn retained_payloads_are_exactly_the_maximal_signatures(signatures in proptest::collection::vec(arbitrary_signature(), 1..24)) {
            let mut hashed = HashSubsetSeenMap::new();
            for (payload, sig) in signatures.iter().enumerate() {
                hashed.add(sig, payload);
            }
            let retained = hashed.get_data_as_vector();
            for payload in &retained {
                let sig = &signatures[*payload];
                // Nothing later-or-earlier strictly stronger survives alongside it.
                for other in &retained {
                    if other != payload {
                        prop_assert!(!dominates(&signatures[*other], sig));
                    }
                }
            }
            for sig in &signatures {
                prop_assert!(retained.iter().any(|payload| dominates(&signatures[*payload], sig)));
            }
        }
    }
}
