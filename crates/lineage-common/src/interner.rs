//! Name interner for class, field and type parameter identifiers.
//!
//! Names are interned into a shared pool and passed around as `Atom`s
//! (a `u32`). Name comparison in the registry is an integer comparison, and
//! every `TypeExpr` stays `Clone` without allocating.
//!
//! The interner is sharded so that concurrent definitions and reflective
//! queries from several threads do not serialize on a single lock.

use rustc_hash::{FxHashMap, FxHasher};
use serde::Serialize;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, PoisonError, RwLock};

/// An interned name.
///
/// Atoms are cheap to copy and compare. Use `Interner::resolve` to get the
/// text back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Default, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// The empty name.
    pub const NONE: Atom = Atom(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }
}

const SHARD_BITS: u32 = 4;
const SHARD_COUNT: usize = 1 << SHARD_BITS;
const SHARD_MASK: u32 = (SHARD_COUNT as u32) - 1;

#[derive(Default)]
struct Shard {
    map: FxHashMap<Arc<str>, Atom>,
    strings: Vec<Arc<str>>,
}

/// Concurrent name interner.
///
/// # Example
/// ```
/// use lineage_common::Interner;
/// let interner = Interner::new();
/// let a1 = interner.intern("Foo");
/// let a2 = interner.intern("Foo");
/// assert_eq!(a1, a2);
/// assert_eq!(&*interner.resolve(a1), "Foo");
/// ```
pub struct Interner {
    shards: [RwLock<Shard>; SHARD_COUNT],
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}

impl Interner {
    /// Create an interner with the empty name reserved as `Atom::NONE`.
    pub fn new() -> Self {
        let shards: [RwLock<Shard>; SHARD_COUNT] = std::array::from_fn(|_| RwLock::default());
        {
            let mut first = shards[0].write().unwrap_or_else(PoisonError::into_inner);
            let empty: Arc<str> = Arc::from("");
            first.strings.push(empty.clone());
            first.map.insert(empty, Atom::NONE);
        }
        Interner { shards }
    }

    /// Intern a name, returning the existing atom if it was seen before.
    pub fn intern(&self, s: &str) -> Atom {
        if s.is_empty() {
            return Atom::NONE;
        }

        let shard_idx = Self::shard_for(s);
        if let Some(&atom) = self.shards[shard_idx]
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .map
            .get(s)
        {
            return atom;
        }

        let mut shard = self.shards[shard_idx]
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // Another writer may have won the race between the read and write lock.
        if let Some(&atom) = shard.map.get(s) {
            return atom;
        }

        let Some(atom) = Self::make_atom(shard.strings.len(), shard_idx) else {
            // Shard is full; returning a packed atom would collide.
            return Atom::NONE;
        };
        let owned: Arc<str> = Arc::from(s);
        shard.strings.push(owned.clone());
        shard.map.insert(owned, atom);
        atom
    }

    /// Resolve an atom back to its text. Unknown atoms resolve to `""`.
    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        self.try_resolve(atom).unwrap_or_else(|| Arc::from(""))
    }

    pub fn try_resolve(&self, atom: Atom) -> Option<Arc<str>> {
        let shard_idx = (atom.0 & SHARD_MASK) as usize;
        let local_index = (atom.0 >> SHARD_BITS) as usize;
        let shard = self.shards[shard_idx]
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        shard.strings.get(local_index).cloned()
    }

    /// Look up a name without interning it.
    pub fn get(&self, s: &str) -> Option<Atom> {
        if s.is_empty() {
            return Some(Atom::NONE);
        }
        self.shards[Self::shard_for(s)]
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .map
            .get(s)
            .copied()
    }

    /// Number of interned names, including the reserved empty name.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| {
                shard
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .strings
                    .len()
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Pack a shard-local index and shard number, or `None` when the index
    /// does not fit beside the shard bits.
    #[inline]
    fn make_atom(local_index: usize, shard_idx: usize) -> Option<Atom> {
        let local_index = u32::try_from(local_index).ok()?;
        if local_index > (u32::MAX >> SHARD_BITS) {
            return None;
        }
        Some(Atom((local_index << SHARD_BITS) | (shard_idx as u32 & SHARD_MASK)))
    }

    #[inline]
    fn shard_for(s: &str) -> usize {
        let mut hasher = FxHasher::default();
        s.hash(&mut hasher);
        (hasher.finish() as usize) & (SHARD_COUNT - 1)
    }
}

#[cfg(test)]
#[path = "../tests/interner_tests.rs"]
mod tests;
