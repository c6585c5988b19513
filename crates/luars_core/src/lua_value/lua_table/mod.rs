// LuaTable - associative container behind every table value
mod hash_table;

use super::lua_value::LuaValue;
use crate::gc::{StringId, TableId};
use crate::lua_vm::lua_limits::MAX_BORDER_PROBE;
use hash_table::LuaHashTable;

pub use hash_table::InvalidNextKey;

/// Raw table storage. No metamethods and no write barriers at this level:
/// the VM wraps every mutation with the collector notifications.
pub struct LuaTable {
    meta: Option<TableId>,

    pub(crate) hash: LuaHashTable,

    /// Bumped by every insert that adds a key or rehashes
    shape_version: u32,
}

impl LuaTable {
    pub fn new(size_hint: usize) -> Self {
        Self {
            meta: None,
            hash: LuaHashTable::new(size_hint),
            shape_version: 0,
        }
    }

    #[inline(always)]
    pub fn has_metatable(&self) -> bool {
        self.meta.is_some()
    }

    #[inline(always)]
    pub fn get_metatable(&self) -> Option<TableId> {
        self.meta
    }

    pub fn set_metatable(&mut self, metatable: Option<TableId>) {
        self.meta = metatable;
    }

    /// Raw lookup. Nil (and NaN) keys are never present.
    #[inline(always)]
    pub fn get(&self, key: &LuaValue) -> Option<LuaValue> {
        self.hash.get(key)
    }

    #[inline(always)]
    pub fn get_int(&self, key: i64) -> Option<LuaValue> {
        self.hash.get_int(key)
    }

    #[inline(always)]
    pub fn get_str(&self, key: StringId) -> Option<LuaValue> {
        self.hash.get(&LuaValue::String(key))
    }

    /// Overwrite an existing key; nil removes it from the key set.
    /// Returns false and changes nothing when the key is absent.
    #[inline]
    pub fn update(&mut self, key: &LuaValue, value: LuaValue) -> bool {
        self.hash.update(key, value)
    }

    /// Add a key the caller knows is absent. Returns true when the node
    /// array was rebuilt to make room.
    pub fn insert(&mut self, key: LuaValue, value: LuaValue) -> bool {
        if value.is_nil() {
            return false;
        }
        self.shape_version = self.shape_version.wrapping_add(1);
        self.hash.insert(key, value)
    }

    /// Node array size inserting `key` would rehash into, None when no
    /// rehash is needed
    #[inline]
    pub fn capacity_needed(&self, key: &LuaValue) -> Option<usize> {
        self.hash.capacity_needed(key)
    }

    /// Border: `t[n] ~= nil and t[n + 1] == nil`, found by unbound search
    /// (probe 1, 2, 4, ... then binary search between the last hit and the
    /// first miss). Sparse tables may have several borders; this search
    /// always returns the same one for the same contents and layout.
    pub fn len(&self) -> usize {
        let mut i: u64 = 0;
        let mut j: u64 = 1;
        while self.get_int(j as i64).is_some() {
            i = j;
            if j > MAX_BORDER_PROBE {
                // Pathological table, fall back to a linear scan
                let mut k: u64 = 1;
                while self.get_int(k as i64).is_some() {
                    k += 1;
                }
                return (k - 1) as usize;
            }
            j *= 2;
        }

        while j - i > 1 {
            let m = (i + j) / 2;
            if self.get_int(m as i64).is_none() {
                j = m;
            } else {
                i = m;
            }
        }
        i as usize
    }

    pub fn is_empty(&self) -> bool {
        self.hash.live_count() == 0
    }

    /// Stateless iterator step: nil gives the first entry, a present key
    /// gives the entry after it in slot order, the last key gives None.
    #[inline]
    pub fn next(&self, key: &LuaValue) -> Result<Option<(LuaValue, LuaValue)>, InvalidNextKey> {
        self.hash.next(key)
    }

    /// Borrowing iterator over live entries in slot order
    pub fn iter(&self) -> impl Iterator<Item = (LuaValue, LuaValue)> + '_ {
        self.hash.entries()
    }

    /// Number of keys mapped to non-nil values
    pub fn live_count(&self) -> usize {
        self.hash.live_count()
    }

    /// Node array size
    pub fn capacity(&self) -> usize {
        self.hash.capacity()
    }

    /// Changes whenever a key is added or the nodes are rebuilt; value
    /// updates and deletions leave it untouched
    #[inline(always)]
    pub fn shape_version(&self) -> u32 {
        self.shape_version
    }

    /// Release the node array. The table stays a valid, empty table.
    pub fn clear_nodes(&mut self) {
        self.shape_version = self.shape_version.wrapping_add(1);
        self.hash.clear();
    }
}

impl Default for LuaTable {
    fn default() -> Self {
        Self::new(0)
    }
}
