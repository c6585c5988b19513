// Object Pool - collector-owned arenas for every heap object
//
// 1. All IDs are u32 indices into Vec storage
// 2. Each slot holds a Gc<T>: the collector header next to the payload
// 3. Free list for slot reuse
// 4. All strings are interned through StringInterner

use crate::gc::gc_object::{Gc, GcHeader};
use crate::gc::string_interner::StringInterner;
use crate::gc::{FunctionId, GcId, StringId, TableId, ThreadId, UserdataId};
use crate::lua_value::{LuaFunction, LuaString, LuaTable, LuaThread, LuaUserdata};
use crate::lua_vm::TmKind;

/// Slot arena with free-list reuse
pub struct Arena<T> {
    slots: Vec<Option<Gc<T>>>,
    free: Vec<u32>,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    pub fn alloc(&mut self, obj: Gc<T>) -> u32 {
        if let Some(index) = self.free.pop() {
            self.slots[index as usize] = Some(obj);
            index
        } else {
            self.slots.push(Some(obj));
            (self.slots.len() - 1) as u32
        }
    }

    #[inline(always)]
    pub fn get(&self, index: u32) -> Option<&Gc<T>> {
        self.slots.get(index as usize).and_then(Option::as_ref)
    }

    #[inline(always)]
    pub fn get_mut(&mut self, index: u32) -> Option<&mut Gc<T>> {
        self.slots.get_mut(index as usize).and_then(Option::as_mut)
    }

    pub fn free(&mut self, index: u32) -> Option<Gc<T>> {
        let obj = self.slots.get_mut(index as usize)?.take()?;
        self.free.push(index);
        Some(obj)
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn headers_mut(&mut self) -> impl Iterator<Item = &mut GcHeader> {
        self.slots.iter_mut().flatten().map(|obj| &mut obj.header)
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Object storage for one VM. Values hold ids into these arenas; the
/// collector decides when slots are freed.
pub struct ObjectPool {
    strings: Arena<LuaString>,
    interner: StringInterner,
    tables: Arena<LuaTable>,
    functions: Arena<LuaFunction>,
    userdata: Arena<LuaUserdata>,
    threads: Arena<LuaThread>,

    // Pre-interned metamethod event names (Lua's G(L)->tmname[]).
    // Fixed: never collected.
    tm_names: [StringId; TmKind::COUNT],
}

impl ObjectPool {
    pub fn new() -> Self {
        let mut pool = Self {
            strings: Arena::new(),
            interner: StringInterner::new(),
            tables: Arena::new(),
            functions: Arena::new(),
            userdata: Arena::new(),
            threads: Arena::new(),
            tm_names: [StringId::default(); TmKind::COUNT],
        };

        // Bootstrap white 0; fixed immediately after
        for tm in TmKind::ALL {
            let (id, _) = pool.create_string(tm.name(), 0);
            if let Some(s) = pool.strings.get_mut(id.index()) {
                s.header.set_fixed();
            }
            pool.tm_names[tm as usize] = id;
        }
        pool
    }

    // ============ Strings ============

    /// Intern `s`. Returns the id and the allocated size when the string is
    /// new (None when an existing string was reused).
    pub fn create_string(&mut self, s: &str, current_white: u8) -> (StringId, Option<usize>) {
        let hash = self.interner.hash_string(s);
        let strings = &self.strings;
        if let Some(id) = self.interner.find(s, hash, |id| {
            strings.get(id.index()).map(|gc| gc.data.as_str())
        }) {
            return (id, None);
        }

        let size = std::mem::size_of::<Gc<LuaString>>() + s.len();
        let obj = Gc::new(LuaString::new(s, hash), current_white, size as u32);
        let id = StringId::new(self.strings.alloc(obj), hash);
        self.interner.register(id);
        (id, Some(size))
    }

    #[inline(always)]
    pub fn get_string(&self, id: StringId) -> Option<&str> {
        self.strings.get(id.index()).map(|gc| gc.data.as_str())
    }

    #[inline(always)]
    pub fn tm_name(&self, tm: TmKind) -> StringId {
        self.tm_names[tm as usize]
    }

    // ============ Tables ============

    pub fn create_table(&mut self, table: LuaTable, current_white: u8) -> (TableId, usize) {
        let size = std::mem::size_of::<Gc<LuaTable>>() + table.capacity() * NODE_SIZE;
        let obj = Gc::new(table, current_white, size as u32);
        (TableId(self.tables.alloc(obj)), size)
    }

    #[inline(always)]
    pub fn get_table(&self, id: TableId) -> Option<&LuaTable> {
        self.tables.get(id.0).map(|gc| &gc.data)
    }

    #[inline(always)]
    pub fn get_table_mut(&mut self, id: TableId) -> Option<&mut LuaTable> {
        self.tables.get_mut(id.0).map(|gc| &mut gc.data)
    }

    // ============ Functions ============

    pub fn create_function(&mut self, func: LuaFunction, current_white: u8) -> (FunctionId, usize) {
        let size = std::mem::size_of::<Gc<LuaFunction>>()
            + func.upvalues().len() * std::mem::size_of::<crate::LuaValue>();
        let obj = Gc::new(func, current_white, size as u32);
        (FunctionId(self.functions.alloc(obj)), size)
    }

    #[inline(always)]
    pub fn get_function(&self, id: FunctionId) -> Option<&LuaFunction> {
        self.functions.get(id.0).map(|gc| &gc.data)
    }

    #[inline(always)]
    pub fn get_function_mut(&mut self, id: FunctionId) -> Option<&mut LuaFunction> {
        self.functions.get_mut(id.0).map(|gc| &mut gc.data)
    }

    // ============ Userdata ============

    pub fn create_userdata(&mut self, ud: LuaUserdata, current_white: u8) -> (UserdataId, usize) {
        let size = std::mem::size_of::<Gc<LuaUserdata>>();
        let obj = Gc::new(ud, current_white, size as u32);
        (UserdataId(self.userdata.alloc(obj)), size)
    }

    #[inline(always)]
    pub fn get_userdata(&self, id: UserdataId) -> Option<&LuaUserdata> {
        self.userdata.get(id.0).map(|gc| &gc.data)
    }

    #[inline(always)]
    pub fn get_userdata_mut(&mut self, id: UserdataId) -> Option<&mut LuaUserdata> {
        self.userdata.get_mut(id.0).map(|gc| &mut gc.data)
    }

    // ============ Threads ============

    pub fn create_thread(&mut self, thread: LuaThread, current_white: u8) -> (ThreadId, usize) {
        let size = std::mem::size_of::<Gc<LuaThread>>();
        let obj = Gc::new(thread, current_white, size as u32);
        (ThreadId(self.threads.alloc(obj)), size)
    }

    #[inline(always)]
    pub fn get_thread(&self, id: ThreadId) -> Option<&LuaThread> {
        self.threads.get(id.0).map(|gc| &gc.data)
    }

    #[inline(always)]
    pub fn get_thread_mut(&mut self, id: ThreadId) -> Option<&mut LuaThread> {
        self.threads.get_mut(id.0).map(|gc| &mut gc.data)
    }

    // ============ Collector access ============

    pub fn header(&self, id: GcId) -> Option<&GcHeader> {
        match id {
            GcId::StringId(id) => self.strings.get(id.index()).map(|gc| &gc.header),
            GcId::TableId(TableId(i)) => self.tables.get(i).map(|gc| &gc.header),
            GcId::FunctionId(FunctionId(i)) => self.functions.get(i).map(|gc| &gc.header),
            GcId::UserdataId(UserdataId(i)) => self.userdata.get(i).map(|gc| &gc.header),
            GcId::ThreadId(ThreadId(i)) => self.threads.get(i).map(|gc| &gc.header),
        }
    }

    pub fn header_mut(&mut self, id: GcId) -> Option<&mut GcHeader> {
        match id {
            GcId::StringId(id) => self.strings.get_mut(id.index()).map(|gc| &mut gc.header),
            GcId::TableId(TableId(i)) => self.tables.get_mut(i).map(|gc| &mut gc.header),
            GcId::FunctionId(FunctionId(i)) => self.functions.get_mut(i).map(|gc| &mut gc.header),
            GcId::UserdataId(UserdataId(i)) => self.userdata.get_mut(i).map(|gc| &mut gc.header),
            GcId::ThreadId(ThreadId(i)) => self.threads.get_mut(i).map(|gc| &mut gc.header),
        }
    }

    /// Every object header, for collector-wide passes
    pub fn for_each_header(&mut self, mut f: impl FnMut(&mut GcHeader)) {
        self.strings.headers_mut().for_each(&mut f);
        self.tables.headers_mut().for_each(&mut f);
        self.functions.headers_mut().for_each(&mut f);
        self.userdata.headers_mut().for_each(&mut f);
        self.threads.headers_mut().for_each(&mut f);
    }

    /// Release an arena slot. Returns the size that was accounted for it.
    pub fn free(&mut self, id: GcId) -> Option<usize> {
        let size = match id {
            GcId::StringId(sid) => {
                let obj = self.strings.free(sid.index())?;
                self.interner.remove(sid);
                obj.header.size
            }
            GcId::TableId(TableId(i)) => self.tables.free(i)?.header.size,
            GcId::FunctionId(FunctionId(i)) => self.functions.free(i)?.header.size,
            GcId::UserdataId(UserdataId(i)) => self.userdata.free(i)?.header.size,
            GcId::ThreadId(ThreadId(i)) => self.threads.free(i)?.header.size,
        };
        Some(size as usize)
    }

    /// Live object count per arena: (strings, tables, functions, userdata, threads)
    pub fn object_counts(&self) -> (usize, usize, usize, usize, usize) {
        (
            self.strings.len(),
            self.tables.len(),
            self.functions.len(),
            self.userdata.len(),
            self.threads.len(),
        )
    }
}

impl Default for ObjectPool {
    fn default() -> Self {
        Self::new()
    }
}

/// Bytes accounted per table node
pub(crate) const NODE_SIZE: usize = std::mem::size_of::<crate::LuaValue>() * 2 + 8;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strings_are_interned() {
        let mut pool = ObjectPool::new();
        let (a, size_a) = pool.create_string("hello", 0);
        let (b, size_b) = pool.create_string("hello", 0);
        let (c, _) = pool.create_string("world", 0);
        assert!(size_a.is_some());
        assert!(size_b.is_none());
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(pool.get_string(a), Some("hello"));
    }

    #[test]
    fn test_tm_names_are_fixed() {
        let mut pool = ObjectPool::new();
        let index = pool.tm_name(TmKind::Index);
        assert_eq!(pool.get_string(index), Some("__index"));
        assert!(pool.header(GcId::StringId(index)).is_some_and(|h| h.is_fixed()));
        let (again, fresh) = pool.create_string("__index", 0);
        assert_eq!(again, index);
        assert!(fresh.is_none());
    }

    #[test]
    fn test_free_slot_is_reused() {
        let mut pool = ObjectPool::new();
        let (t1, _) = pool.create_table(LuaTable::new(0), 0);
        let (t2, _) = pool.create_table(LuaTable::new(4), 0);
        assert_ne!(t1, t2);
        assert!(pool.free(GcId::TableId(t1)).is_some());
        assert!(pool.get_table(t1).is_none());
        assert!(pool.free(GcId::TableId(t1)).is_none());
        let (t3, _) = pool.create_table(LuaTable::new(0), 0);
        assert_eq!(t3, t1);
        assert_eq!(pool.object_counts().1, 2);
    }

    #[test]
    fn test_object_counts() {
        let mut pool = ObjectPool::new();
        let (strings, tables, functions, userdata, threads) = pool.object_counts();
        assert_eq!(strings, TmKind::COUNT);
        assert_eq!((tables, functions, userdata, threads), (0, 0, 0, 0));

        pool.create_string("fresh", 0);
        pool.create_string("fresh", 0);
        let (ud, _) = pool.create_userdata(LuaUserdata::new(1u8), 0);
        pool.create_thread(LuaThread::new(None, None), 0);
        assert_eq!(pool.object_counts(), (TmKind::COUNT + 1, 0, 0, 1, 1));

        pool.free(GcId::UserdataId(ud));
        assert_eq!(pool.object_counts().3, 0);
    }

    #[test]
    fn test_freed_string_is_reinterned() {
        let mut pool = ObjectPool::new();
        let (a, _) = pool.create_string("transient", 0);
        pool.free(GcId::StringId(a));
        let (b, fresh) = pool.create_string("transient", 0);
        assert!(fresh.is_some());
        assert_eq!(pool.get_string(b), Some("transient"));
    }
}
