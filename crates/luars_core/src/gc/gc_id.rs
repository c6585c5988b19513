// ============ Object IDs ============
// All IDs are u32 indices into the ObjectPool arenas

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(transparent)]
pub struct TableId(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(transparent)]
pub struct FunctionId(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(transparent)]
pub struct UserdataId(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[repr(transparent)]
pub struct ThreadId(pub u32);

/// Interned string handle.
///
/// Carries the content hash computed at interning time next to the arena
/// index, so tables can place string keys without a pool lookup.
/// Identity is the index alone: interning guarantees one id per content.
#[derive(Clone, Copy, Debug, Default)]
pub struct StringId {
    pub(crate) index: u32,
    pub(crate) hash: u32,
}

impl StringId {
    #[inline(always)]
    pub(crate) fn new(index: u32, hash: u32) -> Self {
        Self { index, hash }
    }

    #[inline(always)]
    pub fn index(self) -> u32 {
        self.index
    }

    /// Hash cached at interning time
    #[inline(always)]
    pub fn cached_hash(self) -> u32 {
        self.hash
    }
}

impl PartialEq for StringId {
    #[inline(always)]
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl Eq for StringId {}

impl std::hash::Hash for StringId {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u32(self.index);
    }
}

/// Object type tags
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GcObjectKind {
    String = 0,
    Table = 1,
    Function = 2,
    Userdata = 3,
    Thread = 4,
}

/// Unified GC object identifier, used by the collector contract
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum GcId {
    StringId(StringId),
    TableId(TableId),
    FunctionId(FunctionId),
    UserdataId(UserdataId),
    ThreadId(ThreadId),
}

impl GcId {
    #[inline(always)]
    pub fn kind(self) -> GcObjectKind {
        match self {
            GcId::StringId(_) => GcObjectKind::String,
            GcId::TableId(_) => GcObjectKind::Table,
            GcId::FunctionId(_) => GcObjectKind::Function,
            GcId::UserdataId(_) => GcObjectKind::Userdata,
            GcId::ThreadId(_) => GcObjectKind::Thread,
        }
    }

    #[inline(always)]
    pub fn index(self) -> u32 {
        match self {
            GcId::StringId(id) => id.index,
            GcId::TableId(TableId(id)) => id,
            GcId::FunctionId(FunctionId(id)) => id,
            GcId::UserdataId(UserdataId(id)) => id,
            GcId::ThreadId(ThreadId(id)) => id,
        }
    }
}

impl From<TableId> for GcId {
    fn from(id: TableId) -> Self {
        GcId::TableId(id)
    }
}

impl From<StringId> for GcId {
    fn from(id: StringId) -> Self {
        GcId::StringId(id)
    }
}

impl From<FunctionId> for GcId {
    fn from(id: FunctionId) -> Self {
        GcId::FunctionId(id)
    }
}

impl From<UserdataId> for GcId {
    fn from(id: UserdataId) -> Self {
        GcId::UserdataId(id)
    }
}

impl From<ThreadId> for GcId {
    fn from(id: ThreadId) -> Self {
        GcId::ThreadId(id)
    }
}
