// Lua VM core
// Value model, table engine, metatable dispatch and protected calls

#[cfg(test)]
mod test;

pub mod gc;
pub mod lua_value;
pub mod lua_vm;

pub use gc::{Collector, GC, GcId, ObjectPool};
pub use lua_value::{
    CFunction, Chunk, CoroutineStatus, FunctionBody, LuaFunction, LuaTable, LuaThread, LuaUserdata,
    LuaValue, LuaValueKind, MultiValue,
};
pub use lua_vm::{
    ArithOp, CallStatus, Interpreter, LuaError, LuaResult, LuaVM, SafeOption, TableIter, TmKind,
};
