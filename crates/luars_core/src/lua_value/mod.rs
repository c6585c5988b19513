// Value model: the closed LuaValue enum and the heap object payloads
// (strings, tables, functions, userdata, threads) that reference variants
// point at through collector-owned ids.
mod lua_table;
mod lua_value;

use crate::LuaVM;
use crate::gc::TableId;
use crate::lua_vm::LuaResult;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

pub use lua_table::{InvalidNextKey, LuaTable};
pub use lua_value::{LuaValue, LuaValueKind, number_to_integer};

/// Multi-return values from function calls
/// - Empty: no return values
/// - Single: one value (no heap allocation, most common case)
/// - Many: 2+ values stored in Vec
#[derive(Debug, Clone, PartialEq)]
pub enum MultiValue {
    Empty,
    Single(LuaValue),
    Many(Vec<LuaValue>),
}

impl MultiValue {
    #[inline(always)]
    pub fn empty() -> Self {
        MultiValue::Empty
    }

    #[inline(always)]
    pub fn single(value: LuaValue) -> Self {
        MultiValue::Single(value)
    }

    pub fn multiple(mut values: Vec<LuaValue>) -> Self {
        match values.len() {
            0 => MultiValue::Empty,
            1 => MultiValue::Single(values.swap_remove(0)),
            _ => MultiValue::Many(values),
        }
    }

    pub fn all_values(self) -> Vec<LuaValue> {
        match self {
            MultiValue::Empty => Vec::new(),
            MultiValue::Single(v) => vec![v],
            MultiValue::Many(v) => v,
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        match self {
            MultiValue::Empty => 0,
            MultiValue::Single(_) => 1,
            MultiValue::Many(v) => v.len(),
        }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First value, nil when there is none (the single-result convention)
    #[inline(always)]
    pub fn first(&self) -> LuaValue {
        match self {
            MultiValue::Empty => LuaValue::nil(),
            MultiValue::Single(v) => *v,
            MultiValue::Many(v) => v.first().copied().unwrap_or_default(),
        }
    }

    pub fn get(&self, index: usize) -> Option<LuaValue> {
        match self {
            MultiValue::Empty => None,
            MultiValue::Single(v) => (index == 0).then_some(*v),
            MultiValue::Many(v) => v.get(index).copied(),
        }
    }
}

/// Native function: arguments are read from the current call frame through
/// the VM (`LuaVM::get_arg`, `LuaVM::arg_count`)
pub type CFunction = fn(&mut LuaVM) -> LuaResult<MultiValue>;

/// Interned string with its content hash
#[derive(Debug, Clone)]
pub struct LuaString {
    hash: u32,
    data: Box<str>,
}

impl LuaString {
    pub fn new(s: &str, hash: u32) -> Self {
        LuaString {
            hash,
            data: s.into(),
        }
    }

    #[inline(always)]
    pub fn as_str(&self) -> &str {
        &self.data
    }

    #[inline(always)]
    pub fn cached_hash(&self) -> u32 {
        self.hash
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Function prototype produced by the (external) compiler and run by the
/// (external) interpreter. The core only carries it around.
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    pub source_name: Option<String>,
    pub code: Vec<u32>,
    pub constants: Vec<LuaValue>,
    pub param_count: usize,
    pub is_vararg: bool,
    pub max_stack_size: usize,
}

pub enum FunctionBody {
    /// Plain native function
    C(CFunction),
    /// Native function with upvalues
    CClosure {
        func: CFunction,
        upvalues: Vec<LuaValue>,
    },
    /// Interpreted closure
    Lua {
        proto: Rc<Chunk>,
        upvalues: Vec<LuaValue>,
    },
}

/// Function object. `env` is the table unqualified global names resolve
/// against; closures get the creator's environment.
pub struct LuaFunction {
    pub body: FunctionBody,
    pub env: Option<TableId>,
}

impl LuaFunction {
    pub fn new(body: FunctionBody, env: Option<TableId>) -> Self {
        Self { body, env }
    }

    #[inline(always)]
    pub fn is_native(&self) -> bool {
        matches!(self.body, FunctionBody::C(_) | FunctionBody::CClosure { .. })
    }

    pub fn upvalues(&self) -> &[LuaValue] {
        match &self.body {
            FunctionBody::C(_) => &[],
            FunctionBody::CClosure { upvalues, .. } | FunctionBody::Lua { upvalues, .. } => {
                upvalues
            }
        }
    }

    pub(crate) fn upvalues_mut(&mut self) -> Option<&mut Vec<LuaValue>> {
        match &mut self.body {
            FunctionBody::C(_) => None,
            FunctionBody::CClosure { upvalues, .. } | FunctionBody::Lua { upvalues, .. } => {
                Some(upvalues)
            }
        }
    }

    pub fn chunk(&self) -> Option<&Rc<Chunk>> {
        match &self.body {
            FunctionBody::Lua { proto, .. } => Some(proto),
            FunctionBody::C(_) | FunctionBody::CClosure { .. } => None,
        }
    }
}

impl fmt::Debug for LuaFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.body {
            FunctionBody::C(_) => "native",
            FunctionBody::CClosure { .. } => "native closure",
            FunctionBody::Lua { .. } => "lua",
        };
        f.debug_struct("LuaFunction")
            .field("kind", &kind)
            .field("upvalues", &self.upvalues().len())
            .field("env", &self.env)
            .finish()
    }
}

/// Full userdata: opaque host payload plus per-instance metatable and
/// environment
pub struct LuaUserdata {
    data: Box<dyn Any>,
    pub(crate) metatable: Option<TableId>,
    pub(crate) env: Option<TableId>,
}

impl LuaUserdata {
    pub fn new<T: Any>(data: T) -> Self {
        Self {
            data: Box::new(data),
            metatable: None,
            env: None,
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.data.downcast_mut::<T>()
    }

    pub fn get_metatable(&self) -> Option<TableId> {
        self.metatable
    }

    pub fn get_env(&self) -> Option<TableId> {
        self.env
    }
}

/// Coroutine status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoroutineStatus {
    Suspended,
    Running,
    Normal,
    Dead,
}

/// Coroutine handle. Scheduling lives in the interpreter; the core only
/// tracks status and the per-thread environment.
#[derive(Debug)]
pub struct LuaThread {
    pub status: CoroutineStatus,
    pub(crate) env: Option<TableId>,
    pub body: Option<LuaValue>,
}

impl LuaThread {
    pub fn new(body: Option<LuaValue>, env: Option<TableId>) -> Self {
        Self {
            status: CoroutineStatus::Suspended,
            env,
            body,
        }
    }

    pub fn get_env(&self) -> Option<TableId> {
        self.env
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_value_shapes() {
        assert_eq!(MultiValue::multiple(vec![]), MultiValue::Empty);
        assert_eq!(
            MultiValue::multiple(vec![LuaValue::integer(1)]),
            MultiValue::Single(LuaValue::integer(1))
        );
        let many = MultiValue::multiple(vec![LuaValue::integer(1), LuaValue::integer(2)]);
        assert_eq!(many.len(), 2);
        assert_eq!(many.first(), LuaValue::integer(1));
        assert_eq!(many.get(1), Some(LuaValue::integer(2)));
        assert_eq!(MultiValue::empty().first(), LuaValue::nil());
    }

    #[test]
    fn test_userdata_downcast() {
        let mut ud = LuaUserdata::new(41u32);
        *ud.downcast_mut::<u32>().expect("u32 payload") += 1;
        assert_eq!(ud.downcast_ref::<u32>(), Some(&42));
        assert!(ud.downcast_ref::<String>().is_none());
    }
}
