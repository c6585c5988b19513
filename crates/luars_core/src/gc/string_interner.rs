use ahash::RandomState;
use std::collections::HashMap;
use std::hash::BuildHasher;

use crate::gc::StringId;

/// String interner: same content always maps to the same StringId, so
/// string equality and string-keyed table lookups compare ids only.
/// Content hashing uses ahash.
pub struct StringInterner {
    // Content hash -> ids sharing that hash
    map: HashMap<u32, Vec<StringId>, RandomState>,

    hashbuilder: RandomState,
}

impl StringInterner {
    pub fn new() -> Self {
        Self {
            map: HashMap::with_capacity_and_hasher(256, RandomState::new()),
            hashbuilder: RandomState::new(),
        }
    }

    /// Content hash, folded to the 32 bits carried by StringId
    #[inline(always)]
    pub fn hash_string(&self, s: &str) -> u32 {
        let h = self.hashbuilder.hash_one(s);
        (h ^ (h >> 32)) as u32
    }

    /// Existing id for `s`; `content_of` resolves a candidate id to its text
    #[inline]
    pub fn find<'a>(
        &self,
        s: &str,
        hash: u32,
        content_of: impl Fn(StringId) -> Option<&'a str>,
    ) -> Option<StringId> {
        let candidates = self.map.get(&hash)?;
        candidates
            .iter()
            .copied()
            .find(|&id| content_of(id).is_some_and(|c| c.len() == s.len() && c == s))
    }

    pub fn register(&mut self, id: StringId) {
        self.map.entry(id.cached_hash()).or_default().push(id);
    }

    /// Forget a string that is being freed
    pub fn remove(&mut self, id: StringId) {
        if let Some(ids) = self.map.get_mut(&id.cached_hash()) {
            ids.retain(|&i| i != id);
            if ids.is_empty() {
                self.map.remove(&id.cached_hash());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.map.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}
