// Collector contract
//
// The core never traces or sweeps. It reports two things to the collector:
// 1. every allocation (which may fail with OutOfMemory)
// 2. every reference store into a heap object (write barrier)
//
// `GC` is the default collector: byte accounting against the memory limit
// plus generational age bookkeeping with a touched list of old holders
// that received young referents (the remembered set a minor collection
// would re-scan).
mod gc_id;
mod gc_object;
mod object_pool;
mod string_interner;

pub use gc_id::{FunctionId, GcId, GcObjectKind, StringId, TableId, ThreadId, UserdataId};
pub use gc_object::*;
pub use object_pool::{Arena, ObjectPool};
pub(crate) use object_pool::NODE_SIZE;
pub use string_interner::StringInterner;

use crate::lua_vm::{LuaError, LuaResult, SafeOption};

pub trait Collector {
    /// White of the current cycle, stamped into new headers
    fn current_white(&self) -> u8 {
        0
    }

    /// A new object of `size` bytes now lives at `id`. An error rejects the
    /// allocation; the caller frees the slot and raises it.
    fn track_allocation(&mut self, pool: &mut ObjectPool, id: GcId, size: usize) -> LuaResult<()>;

    /// An existing object is about to grow or shrink (table rehash). An
    /// error cancels the rehash.
    fn track_resize(&mut self, _holder: GcId, _old_size: usize, _new_size: usize) -> LuaResult<()> {
        Ok(())
    }

    /// Part of an existing object was released (table teardown). Giving
    /// memory back cannot fail.
    fn track_free(&mut self, _holder: GcId, _size: usize) {}

    /// `referent` was just stored into `holder`
    fn write_barrier(&mut self, pool: &mut ObjectPool, holder: GcId, referent: GcId);
}

pub struct GC {
    current_white: u8,
    total_bytes: usize,
    max_memory: usize,
    touched: Vec<GcId>,
}

impl GC {
    pub fn new(option: &SafeOption) -> Self {
        Self {
            current_white: 0,
            total_bytes: 0,
            max_memory: option.max_memory_limit,
            touched: Vec::new(),
        }
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    /// Old holders that received young referents since the last reset
    pub fn touched(&self) -> &[GcId] {
        &self.touched
    }

    /// Age every object to G_OLD and reset the touched list, as the end of
    /// a full collection would
    pub fn promote_all(&mut self, pool: &mut ObjectPool) {
        pool.for_each_header(|header| {
            header.set_age(G_OLD);
            header.make_black();
        });
        self.touched.clear();
    }

    /// Hand back the bytes of an object the collector freed
    pub fn release(&mut self, pool: &mut ObjectPool, id: GcId) {
        if let Some(size) = pool.free(id) {
            self.total_bytes = self.total_bytes.saturating_sub(size);
        }
    }

    fn charge(&mut self, size: usize) -> LuaResult<()> {
        let total = self.total_bytes.saturating_add(size);
        if total > self.max_memory {
            tracing::warn!(
                target: "luars_core::gc",
                total,
                limit = self.max_memory,
                "allocation exceeds memory limit"
            );
            return Err(LuaError::OutOfMemory);
        }
        self.total_bytes = total;
        Ok(())
    }
}

impl Collector for GC {
    fn current_white(&self) -> u8 {
        self.current_white
    }

    fn track_allocation(&mut self, _pool: &mut ObjectPool, _id: GcId, size: usize) -> LuaResult<()> {
        self.charge(size)
    }

    fn track_resize(&mut self, _holder: GcId, old_size: usize, new_size: usize) -> LuaResult<()> {
        if new_size >= old_size {
            self.charge(new_size - old_size)
        } else {
            self.total_bytes = self.total_bytes.saturating_sub(old_size - new_size);
            Ok(())
        }
    }

    fn track_free(&mut self, _holder: GcId, size: usize) {
        self.total_bytes = self.total_bytes.saturating_sub(size);
    }

    /// Backward barrier: an old holder pointing at a young object is aged
    /// TOUCHED1, grayed and remembered once
    fn write_barrier(&mut self, pool: &mut ObjectPool, holder: GcId, referent: GcId) {
        let holder_old = match pool.header(holder) {
            Some(h) => h.is_old() && !h.is_touched() && !h.is_fixed(),
            None => return,
        };
        if !holder_old {
            return;
        }
        let referent_young = match pool.header(referent) {
            Some(r) => !r.is_old(),
            None => return,
        };
        if !referent_young {
            return;
        }

        if let Some(header) = pool.header_mut(holder) {
            header.set_age(G_TOUCHED1);
            header.make_gray();
        }
        tracing::trace!(target: "luars_core::gc", ?holder, ?referent, "write barrier");
        self.touched.push(holder);
    }
}
