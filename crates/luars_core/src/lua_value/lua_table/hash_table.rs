use crate::LuaValue;
use crate::lua_value::number_to_integer;
use crate::lua_vm::lua_limits::MIN_TABLE_NODES;

/// Chained scatter table with Brent's variation
///
/// Every key is reachable by following `next` links from its main
/// position. Links are indices into `nodes`, so a resize moves the whole
/// array without fix-ups.
///
/// Invariant: if the node in a main position holds a key whose own main
/// position is elsewhere, that node is on the other key's chain and can be
/// relocated to a free node.
pub(crate) struct LuaHashTable {
    nodes: Vec<Node>,

    /// Free-node cursor, scans downward
    last_free: usize,
}

/// Slot states:
/// - key nil: free, never used since the last rehash
/// - key set, value nil: tombstone, kept so chains through it stay intact
/// - key set, value set: live entry
#[derive(Clone, Copy)]
struct Node {
    key: LuaValue,
    value: LuaValue,
    next: Option<u32>,
}

impl Node {
    const EMPTY: Node = Node {
        key: LuaValue::Nil,
        value: LuaValue::Nil,
        next: None,
    };

    #[inline(always)]
    fn is_free(&self) -> bool {
        self.key.is_nil()
    }

    #[inline(always)]
    fn is_live(&self) -> bool {
        !self.value.is_nil()
    }
}

/// `next` was handed a key that is not in the table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidNextKey;

impl LuaHashTable {
    pub fn new(size_hint: usize) -> Self {
        let size = if size_hint == 0 {
            0
        } else {
            size_hint.next_power_of_two().max(MIN_TABLE_NODES)
        };
        Self {
            nodes: vec![Node::EMPTY; size],
            last_free: size,
        }
    }

    /// Numbers with an integral value hash as i64, so 1 and 1.0 (and 0.0,
    /// -0.0) land in the same slot. References hash by arena index.
    #[inline(always)]
    fn hash_key(key: &LuaValue) -> u64 {
        match key {
            LuaValue::Nil => 0,
            LuaValue::Boolean(b) => *b as u64,
            LuaValue::Number(n) => match number_to_integer(*n) {
                Some(i) => i as u64,
                None => {
                    let bits = n.to_bits();
                    bits ^ (bits >> 32) ^ (bits >> 48)
                }
            },
            LuaValue::String(id) => id.cached_hash() as u64,
            LuaValue::Table(id) => id.0 as u64,
            LuaValue::Function(id) => (id.0 as u64) ^ (1 << 32),
            LuaValue::Userdata(id) => (id.0 as u64) ^ (2 << 32),
            LuaValue::Thread(id) => (id.0 as u64) ^ (3 << 32),
        }
    }

    /// hash & (size - 1); size is a power of two
    #[inline(always)]
    fn main_position(&self, key: &LuaValue) -> usize {
        (Self::hash_key(key) as usize) & (self.nodes.len() - 1)
    }

    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    pub fn live_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_live()).count()
    }

    /// Drop the node array (table teardown)
    pub fn clear(&mut self) {
        self.nodes = Vec::new();
        self.last_free = 0;
    }

    /// Locate the node holding `key`, live or tombstone
    #[inline(always)]
    fn find_node(&self, key: &LuaValue) -> Option<usize> {
        if self.nodes.is_empty() || key.is_nil() {
            return None;
        }

        let mut idx = self.main_position(key);
        loop {
            let node = &self.nodes[idx];
            if node.key.raw_equal(key) {
                return Some(idx);
            }
            match node.next {
                Some(next) => idx = next as usize,
                None => return None,
            }
        }
    }

    #[inline(always)]
    pub fn get(&self, key: &LuaValue) -> Option<LuaValue> {
        let idx = self.find_node(key)?;
        let value = self.nodes[idx].value;
        if value.is_nil() { None } else { Some(value) }
    }

    /// Integer fast path: no temporary key hashing through the general match
    #[inline(always)]
    pub fn get_int(&self, key: i64) -> Option<LuaValue> {
        if self.nodes.is_empty() {
            return None;
        }

        let mut idx = (key as u64 as usize) & (self.nodes.len() - 1);
        loop {
            let node = &self.nodes[idx];
            if let LuaValue::Number(n) = node.key {
                if n == key as f64 && !node.value.is_nil() {
                    return Some(node.value);
                }
            }
            match node.next {
                Some(next) => idx = next as usize,
                None => return None,
            }
        }
    }

    /// Overwrite a live entry in place; nil turns it into a tombstone
    pub fn update(&mut self, key: &LuaValue, value: LuaValue) -> bool {
        match self.find_node(key) {
            Some(idx) if self.nodes[idx].is_live() => {
                self.nodes[idx].value = value;
                true
            }
            _ => false,
        }
    }

    /// Insert a key that is not live. Returns true if the table was rehashed.
    pub fn insert(&mut self, key: LuaValue, value: LuaValue) -> bool {
        debug_assert!(!key.is_nil(), "nil key inserted");
        debug_assert!(
            !matches!(key, LuaValue::Number(n) if n.is_nan()),
            "NaN key inserted"
        );
        debug_assert!(self.get(&key).is_none(), "insert of a live key");

        if value.is_nil() {
            return false;
        }

        // Same key still sitting in its chain as a tombstone: revive it
        if let Some(idx) = self.find_node(&key) {
            self.nodes[idx].value = value;
            return false;
        }

        let mut resized = false;
        while !self.insert_new_key(key, value) {
            self.rehash();
            resized = true;
        }
        resized
    }

    /// Node array size an insert of `key` would rebuild into; None when
    /// the key fits without a rehash
    pub fn capacity_needed(&self, key: &LuaValue) -> Option<usize> {
        if self.find_node(key).is_some() {
            return None;
        }
        if !self.nodes.is_empty() {
            let mp = self.main_position(key);
            if !self.nodes[mp].is_live() || self.nodes[..self.last_free].iter().any(Node::is_free) {
                return None;
            }
        }
        Some(Self::rehash_size(self.live_count()))
    }

    #[inline]
    fn rehash_size(live: usize) -> usize {
        (live + 1).next_power_of_two().max(MIN_TABLE_NODES)
    }

    fn get_free_pos(&mut self) -> Option<usize> {
        while self.last_free > 0 {
            self.last_free -= 1;
            if self.nodes[self.last_free].is_free() {
                return Some(self.last_free);
            }
        }
        None
    }

    /// Place a new key; false means no free node is left
    fn insert_new_key(&mut self, key: LuaValue, value: LuaValue) -> bool {
        if self.nodes.is_empty() {
            return false;
        }

        let mp = self.main_position(&key);

        // Free or tombstone main position: take it, keep whatever chain
        // runs through it
        if !self.nodes[mp].is_live() {
            self.nodes[mp].key = key;
            self.nodes[mp].value = value;
            return true;
        }

        let Some(free) = self.get_free_pos() else {
            return false;
        };

        let other_mp = self.main_position(&self.nodes[mp].key);
        if other_mp != mp {
            // Colliding node is out of its main position: move it to the
            // free node and re-point its predecessor
            let mut prev = other_mp;
            while let Some(next) = self.nodes[prev].next {
                if next as usize == mp {
                    break;
                }
                prev = next as usize;
            }
            self.nodes[prev].next = Some(free as u32);
            self.nodes[free] = self.nodes[mp];
            self.nodes[mp] = Node {
                key,
                value,
                next: None,
            };
        } else {
            // Colliding node is in its own main position: chain after it
            self.nodes[free] = Node {
                key,
                value,
                next: self.nodes[mp].next,
            };
            self.nodes[mp].next = Some(free as u32);
        }
        true
    }

    /// Rebuild into the smallest power of two holding every live entry plus
    /// one more. Without tombstones this doubles the capacity.
    fn rehash(&mut self) {
        let live = self.live_count();
        let new_size = Self::rehash_size(live);

        tracing::debug!(
            target: "luars_core::table",
            old_size = self.nodes.len(),
            new_size,
            live,
            "table rehash"
        );

        let old_nodes = std::mem::replace(&mut self.nodes, vec![Node::EMPTY; new_size]);
        self.last_free = new_size;

        for node in old_nodes {
            if node.is_live() {
                let placed = self.insert_new_key(node.key, node.value);
                debug_assert!(placed, "rehash target too small");
            }
        }
    }

    /// Stateless traversal in slot order
    pub fn next(&self, key: &LuaValue) -> Result<Option<(LuaValue, LuaValue)>, InvalidNextKey> {
        let start = if key.is_nil() {
            0
        } else {
            // Tombstones still resolve, so clearing the current key while
            // traversing is allowed
            match self.find_node(key) {
                Some(idx) => idx + 1,
                None => return Err(InvalidNextKey),
            }
        };

        Ok(self.nodes[start.min(self.nodes.len())..]
            .iter()
            .find(|node| node.is_live())
            .map(|node| (node.key, node.value)))
    }

    /// Live entries in slot order
    pub fn entries(&self) -> impl Iterator<Item = (LuaValue, LuaValue)> + '_ {
        self.nodes
            .iter()
            .filter(|node| node.is_live())
            .map(|node| (node.key, node.value))
    }
}
