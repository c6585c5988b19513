// LuaValue - the dynamic value of the language
//
// A closed sum type: the variant is the tag and the only way to reach the
// payload is an exhaustive match. Reference variants are ids into the
// collector-owned ObjectPool; a LuaValue never owns heap memory.
//
// Size: 16 bytes (8-byte payload + discriminant, f64 alignment)
use crate::gc::{FunctionId, GcId, StringId, TableId, ThreadId, UserdataId};

/// Basic type enumeration (lua.h LUA_T*)
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LuaValueKind {
    Nil = 0,
    Boolean = 1,
    Number = 2,
    String = 3,
    Table = 4,
    Function = 5,
    Userdata = 6,
    Thread = 7,
}

impl LuaValueKind {
    /// Number of basic types, size of the per-type metatable array
    pub const COUNT: usize = 8;

    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            LuaValueKind::Nil => "nil",
            LuaValueKind::Boolean => "boolean",
            LuaValueKind::Number => "number",
            LuaValueKind::String => "string",
            LuaValueKind::Table => "table",
            LuaValueKind::Function => "function",
            LuaValueKind::Userdata => "userdata",
            LuaValueKind::Thread => "thread",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum LuaValue {
    #[default]
    Nil,
    Boolean(bool),
    Number(f64),
    String(StringId),
    Table(TableId),
    Function(FunctionId),
    Userdata(UserdataId),
    Thread(ThreadId),
}

impl LuaValue {
    // ============ Constructors ============

    #[inline(always)]
    pub const fn nil() -> Self {
        LuaValue::Nil
    }

    #[inline(always)]
    pub const fn boolean(b: bool) -> Self {
        LuaValue::Boolean(b)
    }

    #[inline(always)]
    pub const fn number(n: f64) -> Self {
        LuaValue::Number(n)
    }

    /// Integers are numbers whose value happens to be integral
    #[inline(always)]
    pub const fn integer(i: i64) -> Self {
        LuaValue::Number(i as f64)
    }

    #[inline(always)]
    pub const fn string(id: StringId) -> Self {
        LuaValue::String(id)
    }

    #[inline(always)]
    pub const fn table(id: TableId) -> Self {
        LuaValue::Table(id)
    }

    #[inline(always)]
    pub const fn function(id: FunctionId) -> Self {
        LuaValue::Function(id)
    }

    #[inline(always)]
    pub const fn userdata(id: UserdataId) -> Self {
        LuaValue::Userdata(id)
    }

    #[inline(always)]
    pub const fn thread(id: ThreadId) -> Self {
        LuaValue::Thread(id)
    }

    // ============ Type inspection ============

    #[inline(always)]
    pub fn kind(&self) -> LuaValueKind {
        match self {
            LuaValue::Nil => LuaValueKind::Nil,
            LuaValue::Boolean(_) => LuaValueKind::Boolean,
            LuaValue::Number(_) => LuaValueKind::Number,
            LuaValue::String(_) => LuaValueKind::String,
            LuaValue::Table(_) => LuaValueKind::Table,
            LuaValue::Function(_) => LuaValueKind::Function,
            LuaValue::Userdata(_) => LuaValueKind::Userdata,
            LuaValue::Thread(_) => LuaValueKind::Thread,
        }
    }

    #[inline(always)]
    pub fn type_name(&self) -> &'static str {
        self.kind().name()
    }

    #[inline(always)]
    pub fn is_nil(&self) -> bool {
        matches!(self, LuaValue::Nil)
    }

    #[inline(always)]
    pub fn is_number(&self) -> bool {
        matches!(self, LuaValue::Number(_))
    }

    #[inline(always)]
    pub fn is_string(&self) -> bool {
        matches!(self, LuaValue::String(_))
    }

    #[inline(always)]
    pub fn is_table(&self) -> bool {
        matches!(self, LuaValue::Table(_))
    }

    #[inline(always)]
    pub fn is_function(&self) -> bool {
        matches!(self, LuaValue::Function(_))
    }

    /// Only nil and false are falsy; 0 and "" are truthy
    #[inline(always)]
    pub fn is_truthy(&self) -> bool {
        match self {
            LuaValue::Nil | LuaValue::Boolean(false) => false,
            LuaValue::Boolean(true)
            | LuaValue::Number(_)
            | LuaValue::String(_)
            | LuaValue::Table(_)
            | LuaValue::Function(_)
            | LuaValue::Userdata(_)
            | LuaValue::Thread(_) => true,
        }
    }

    #[inline(always)]
    pub fn is_falsy(&self) -> bool {
        !self.is_truthy()
    }

    // ============ Payload access ============

    #[inline(always)]
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            LuaValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            LuaValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Integral numbers that fit an i64
    #[inline(always)]
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            LuaValue::Number(n) => number_to_integer(*n),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn as_string_id(&self) -> Option<StringId> {
        match self {
            LuaValue::String(id) => Some(*id),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn as_table_id(&self) -> Option<TableId> {
        match self {
            LuaValue::Table(id) => Some(*id),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn as_function_id(&self) -> Option<FunctionId> {
        match self {
            LuaValue::Function(id) => Some(*id),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn as_userdata_id(&self) -> Option<UserdataId> {
        match self {
            LuaValue::Userdata(id) => Some(*id),
            _ => None,
        }
    }

    #[inline(always)]
    pub fn as_thread_id(&self) -> Option<ThreadId> {
        match self {
            LuaValue::Thread(id) => Some(*id),
            _ => None,
        }
    }

    /// Collector identity of a reference value; None for nil/boolean/number
    #[inline(always)]
    pub fn gc_id(&self) -> Option<GcId> {
        match self {
            LuaValue::Nil | LuaValue::Boolean(_) | LuaValue::Number(_) => None,
            LuaValue::String(id) => Some(GcId::StringId(*id)),
            LuaValue::Table(id) => Some(GcId::TableId(*id)),
            LuaValue::Function(id) => Some(GcId::FunctionId(*id)),
            LuaValue::Userdata(id) => Some(GcId::UserdataId(*id)),
            LuaValue::Thread(id) => Some(GcId::ThreadId(*id)),
        }
    }

    #[inline(always)]
    pub fn is_collectable(&self) -> bool {
        self.gc_id().is_some()
    }

    /// Raw equality: same variant and same payload, no metamethods.
    /// NaN is never raw-equal to anything, itself included.
    #[inline(always)]
    pub fn raw_equal(&self, other: &LuaValue) -> bool {
        self == other
    }
}

/// Exact conversion of an integral float to i64
#[inline(always)]
pub fn number_to_integer(n: f64) -> Option<i64> {
    // -2^63 is exact; 2^63 is not representable as i64
    if n.fract() == 0.0 && n >= -9_223_372_036_854_775_808.0 && n < 9_223_372_036_854_775_808.0 {
        Some(n as i64)
    } else {
        None
    }
}

impl From<bool> for LuaValue {
    fn from(b: bool) -> Self {
        LuaValue::Boolean(b)
    }
}

impl From<f64> for LuaValue {
    fn from(n: f64) -> Self {
        LuaValue::Number(n)
    }
}

impl From<i64> for LuaValue {
    fn from(i: i64) -> Self {
        LuaValue::integer(i)
    }
}

impl From<TableId> for LuaValue {
    fn from(id: TableId) -> Self {
        LuaValue::Table(id)
    }
}

impl From<StringId> for LuaValue {
    fn from(id: StringId) -> Self {
        LuaValue::String(id)
    }
}

impl From<FunctionId> for LuaValue {
    fn from(id: FunctionId) -> Self {
        LuaValue::Function(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_size() {
        assert_eq!(std::mem::size_of::<LuaValue>(), 16);
    }

    #[test]
    fn test_truthiness() {
        assert!(!LuaValue::nil().is_truthy());
        assert!(!LuaValue::boolean(false).is_truthy());
        assert!(LuaValue::boolean(true).is_truthy());
        assert!(LuaValue::number(0.0).is_truthy());
        assert!(LuaValue::string(StringId::new(0, 0)).is_truthy());
    }

    #[test]
    fn test_integer_view() {
        assert_eq!(LuaValue::number(3.0).as_integer(), Some(3));
        assert_eq!(LuaValue::number(-0.0).as_integer(), Some(0));
        assert_eq!(LuaValue::number(3.5).as_integer(), None);
        assert_eq!(LuaValue::number(f64::NAN).as_integer(), None);
        assert_eq!(LuaValue::number(f64::INFINITY).as_integer(), None);
        assert_eq!(LuaValue::number(9.3e18).as_integer(), None);
    }

    #[test]
    fn test_collectable_values() {
        assert!(!LuaValue::nil().is_collectable());
        assert!(!LuaValue::boolean(true).is_collectable());
        assert!(!LuaValue::number(1.5).is_collectable());
        assert!(LuaValue::string(StringId::new(1, 7)).is_collectable());
        assert!(LuaValue::thread(ThreadId(0)).is_collectable());
        assert_eq!(
            LuaValue::function(FunctionId(2)).gc_id(),
            Some(GcId::FunctionId(FunctionId(2)))
        );
    }

    #[test]
    fn test_raw_equal() {
        assert!(LuaValue::integer(1).raw_equal(&LuaValue::number(1.0)));
        assert!(!LuaValue::number(f64::NAN).raw_equal(&LuaValue::number(f64::NAN)));
        assert!(!LuaValue::nil().raw_equal(&LuaValue::boolean(false)));
        assert!(LuaValue::table(TableId(3)).raw_equal(&LuaValue::table(TableId(3))));
        assert!(!LuaValue::table(TableId(3)).raw_equal(&LuaValue::userdata(UserdataId(3))));
    }
}
