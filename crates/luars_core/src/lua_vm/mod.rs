// Lua VM core state
//
// One LuaVM per execution context, passed by `&mut` everywhere. It owns the
// object pool, the collector, the per-type metatable slots, the value stack,
// the call stack and the recovery points of the active protected calls.
mod arith;
mod call;
pub mod call_info;
mod compare;
mod coerce;
pub mod lua_error;
pub mod lua_limits;
mod metamethod;
mod metatable;
mod protected_call;
mod safe_option;

use std::rc::Rc;

use crate::gc::{
    Collector, FunctionId, GC, GcId, NODE_SIZE, ObjectPool, StringId, TableId, ThreadId,
    UserdataId,
};
use crate::lua_value::{
    Chunk, FunctionBody, LuaFunction, LuaTable, LuaThread, LuaUserdata, LuaValue, LuaValueKind,
    MultiValue,
};

pub use arith::ArithOp;
pub use call_info::CallInfo;
pub use coerce::{number_to_str, str_to_number};
pub use lua_error::{LuaError, LuaResult};
pub use metatable::TmKind;
pub use protected_call::CallStatus;
pub use safe_option::SafeOption;

pub(crate) use protected_call::RecoveryPoint;

/// The bytecode dispatch loop. The core hands interpreted closures to it;
/// it reads arguments through `LuaVM::get_arg` like native functions do.
pub trait Interpreter {
    fn execute(&self, vm: &mut LuaVM, func: FunctionId, chunk: &Rc<Chunk>)
    -> LuaResult<MultiValue>;
}

pub struct LuaVM {
    pub(crate) pool: ObjectPool,

    pub(crate) gc: Box<dyn Collector>,

    /// Shared metatables for every kind without per-instance metatables
    /// (indexed by LuaValueKind). Tables and userdata slots stay unused.
    pub(crate) type_metatables: [Option<TableId>; LuaValueKind::COUNT],

    globals: TableId,

    registry: TableId,

    pub(crate) stack: Vec<LuaValue>,

    pub(crate) call_stack: Vec<CallInfo>,

    /// Snapshots of the active protected calls, innermost last
    pub(crate) recovery_points: Vec<RecoveryPoint>,

    /// Error handlers currently running
    pub(crate) error_handler_depth: usize,

    /// Value of the last raised error
    pub(crate) error_object: LuaValue,

    // Fixed messages, usable when allocation is no longer possible
    memerr_msg: StringId,
    errerr_msg: StringId,
    overflow_msg: StringId,

    interpreter: Option<Rc<dyn Interpreter>>,

    pub(crate) safe_option: SafeOption,
}

impl LuaVM {
    pub fn new(option: SafeOption) -> Self {
        let gc = GC::new(&option);
        Self::with_collector(option, Box::new(gc))
    }

    pub fn with_collector(option: SafeOption, gc: Box<dyn Collector>) -> Self {
        let mut pool = ObjectPool::new();
        let white = gc.current_white();

        let fixed_table = |pool: &mut ObjectPool| {
            let (id, _) = pool.create_table(LuaTable::new(0), white);
            if let Some(header) = pool.header_mut(id.into()) {
                header.set_fixed();
            }
            id
        };
        let globals = fixed_table(&mut pool);
        let registry = fixed_table(&mut pool);

        let fixed_string = |pool: &mut ObjectPool, s: &str| {
            let (id, _) = pool.create_string(s, white);
            if let Some(header) = pool.header_mut(id.into()) {
                header.set_fixed();
            }
            id
        };
        let memerr_msg = fixed_string(&mut pool, "not enough memory");
        let errerr_msg = fixed_string(&mut pool, "error in error handling");
        let overflow_msg = fixed_string(&mut pool, "stack overflow");

        Self {
            pool,
            gc,
            type_metatables: [None; LuaValueKind::COUNT],
            globals,
            registry,
            stack: Vec::with_capacity(lua_limits::BASIC_STACK_SIZE),
            call_stack: Vec::new(),
            recovery_points: Vec::new(),
            error_handler_depth: 0,
            error_object: LuaValue::nil(),
            memerr_msg,
            errerr_msg,
            overflow_msg,
            interpreter: None,
            safe_option: option,
        }
    }

    pub fn set_interpreter(&mut self, interpreter: Rc<dyn Interpreter>) {
        self.interpreter = Some(interpreter);
    }

    pub(crate) fn interpreter(&self) -> Option<Rc<dyn Interpreter>> {
        self.interpreter.clone()
    }

    #[inline(always)]
    pub fn pool(&self) -> &ObjectPool {
        &self.pool
    }

    #[inline(always)]
    pub fn safe_option(&self) -> &SafeOption {
        &self.safe_option
    }

    /// Default environment of new functions and threads
    #[inline(always)]
    pub fn globals(&self) -> TableId {
        self.globals
    }

    #[inline(always)]
    pub fn registry(&self) -> TableId {
        self.registry
    }

    // ============ Allocation ============

    fn track(&mut self, id: GcId, size: usize) -> LuaResult<()> {
        if self.gc.track_allocation(&mut self.pool, id, size).is_err() {
            self.pool.free(id);
            return Err(self.memory_error());
        }
        Ok(())
    }

    pub fn create_table(&mut self, narr: usize, nhash: usize) -> LuaResult<LuaValue> {
        let white = self.gc.current_white();
        let (id, size) = self.pool.create_table(LuaTable::new(narr + nhash), white);
        self.track(id.into(), size)?;
        Ok(LuaValue::table(id))
    }

    pub fn create_string(&mut self, s: &str) -> LuaResult<LuaValue> {
        let white = self.gc.current_white();
        let (id, fresh) = self.pool.create_string(s, white);
        if let Some(size) = fresh {
            self.track(id.into(), size)?;
        }
        Ok(LuaValue::string(id))
    }

    /// New function object; its environment is the running function's
    pub fn create_function(&mut self, body: FunctionBody) -> LuaResult<LuaValue> {
        let env = self.current_env();
        let white = self.gc.current_white();
        let (id, size) = self
            .pool
            .create_function(LuaFunction::new(body, Some(env)), white);
        self.track(id.into(), size)?;
        Ok(LuaValue::function(id))
    }

    pub fn create_native(&mut self, func: crate::lua_value::CFunction) -> LuaResult<LuaValue> {
        self.create_function(FunctionBody::C(func))
    }

    pub fn create_closure(
        &mut self,
        chunk: Rc<Chunk>,
        upvalues: Vec<LuaValue>,
    ) -> LuaResult<LuaValue> {
        self.create_function(FunctionBody::Lua {
            proto: chunk,
            upvalues,
        })
    }

    pub fn create_userdata<T: std::any::Any>(&mut self, data: T) -> LuaResult<LuaValue> {
        let white = self.gc.current_white();
        let mut ud = LuaUserdata::new(data);
        ud.env = Some(self.current_env());
        let (id, size) = self.pool.create_userdata(ud, white);
        self.track(id.into(), size)?;
        Ok(LuaValue::userdata(id))
    }

    pub fn create_thread(&mut self, body: Option<LuaValue>) -> LuaResult<LuaValue> {
        let env = self.current_env();
        let white = self.gc.current_white();
        let (id, size) = self.pool.create_thread(LuaThread::new(body, Some(env)), white);
        self.track(id.into(), size)?;
        Ok(LuaValue::thread(id))
    }

    // ============ Object access ============

    /// Raw table object (see `get_table` for dispatched access)
    #[inline(always)]
    pub fn table_ref(&self, id: TableId) -> Option<&LuaTable> {
        self.pool.get_table(id)
    }

    #[inline(always)]
    pub fn get_string(&self, id: StringId) -> Option<&str> {
        self.pool.get_string(id)
    }

    /// Text of a string value
    pub fn value_str(&self, value: &LuaValue) -> Option<&str> {
        value.as_string_id().and_then(|id| self.pool.get_string(id))
    }

    #[inline(always)]
    pub fn get_function(&self, id: FunctionId) -> Option<&LuaFunction> {
        self.pool.get_function(id)
    }

    #[inline(always)]
    pub fn get_userdata(&self, id: UserdataId) -> Option<&LuaUserdata> {
        self.pool.get_userdata(id)
    }

    #[inline(always)]
    pub fn get_userdata_mut(&mut self, id: UserdataId) -> Option<&mut LuaUserdata> {
        self.pool.get_userdata_mut(id)
    }

    #[inline(always)]
    pub fn get_thread(&self, id: ThreadId) -> Option<&LuaThread> {
        self.pool.get_thread(id)
    }

    /// Status updates come from the coroutine scheduler
    #[inline(always)]
    pub fn get_thread_mut(&mut self, id: ThreadId) -> Option<&mut LuaThread> {
        self.pool.get_thread_mut(id)
    }

    // ============ Raw table access ============
    //
    // Every reference stored into a table is reported to the collector
    // right after the store, one barrier call per stored reference.

    #[inline]
    pub(crate) fn barrier(&mut self, holder: GcId, referent: &LuaValue) {
        if let Some(referent) = referent.gc_id() {
            self.gc.write_barrier(&mut self.pool, holder, referent);
        }
    }

    /// Raw lookup, no metamethods
    #[inline]
    pub fn table_lookup(&self, table: TableId, key: &LuaValue) -> Option<LuaValue> {
        self.pool.get_table(table).and_then(|t| t.get(key))
    }

    /// Overwrite a live key (nil removes it). False when the key is absent.
    pub fn table_update(&mut self, table: TableId, key: &LuaValue, value: LuaValue) -> bool {
        let updated = self
            .pool
            .get_table_mut(table)
            .is_some_and(|t| t.update(key, value));
        if updated {
            self.barrier(table.into(), &value);
        }
        updated
    }

    /// Add a key that is not live in the table. Nil values are ignored.
    pub fn table_insert(&mut self, table: TableId, key: LuaValue, value: LuaValue) -> LuaResult<()> {
        if value.is_nil() {
            return Ok(());
        }
        let Some(t) = self.pool.get_table(table) else {
            debug_assert!(false, "insert into a freed table");
            return Ok(());
        };

        // Growth is charged before the table changes, so a refused
        // rehash leaves the table exactly as it was
        let old_capacity = t.capacity();
        let rebuild = t.capacity_needed(&key);
        if let Some(new_capacity) = rebuild {
            let charged = self.gc.track_resize(
                table.into(),
                old_capacity * NODE_SIZE,
                new_capacity * NODE_SIZE,
            );
            if charged.is_err() {
                return Err(self.memory_error());
            }
        }

        if let Some(t) = self.pool.get_table_mut(table) {
            let resized = t.insert(key, value);
            debug_assert_eq!(resized, rebuild.is_some());
        }
        self.barrier(table.into(), &key);
        self.barrier(table.into(), &value);
        Ok(())
    }

    /// Update-or-insert without metamethods
    pub fn raw_set(&mut self, table: TableId, key: LuaValue, value: LuaValue) -> LuaResult<()> {
        match key {
            LuaValue::Nil => return Err(self.error("table index is nil")),
            LuaValue::Number(n) if n.is_nan() => return Err(self.error("table index is NaN")),
            _ => {}
        }
        if !self.table_update(table, &key, value) {
            self.table_insert(table, key, value)?;
        }
        Ok(())
    }

    /// Raw read; absent keys read as nil
    #[inline]
    pub fn raw_get(&self, table: TableId, key: &LuaValue) -> LuaValue {
        self.table_lookup(table, key).unwrap_or_default()
    }

    #[inline]
    pub fn raw_geti(&self, table: TableId, key: i64) -> LuaValue {
        self.pool
            .get_table(table)
            .and_then(|t| t.get_int(key))
            .unwrap_or_default()
    }

    pub fn raw_seti(&mut self, table: TableId, key: i64, value: LuaValue) -> LuaResult<()> {
        self.raw_set(table, LuaValue::integer(key), value)
    }

    pub fn raw_get_str(&mut self, table: TableId, key: &str) -> LuaResult<LuaValue> {
        let key = self.create_string(key)?;
        Ok(self.raw_get(table, &key))
    }

    pub fn raw_set_str(&mut self, table: TableId, key: &str, value: LuaValue) -> LuaResult<()> {
        let key = self.create_string(key)?;
        self.raw_set(table, key, value)
    }

    /// Stateless traversal step
    pub fn table_next(
        &mut self,
        table: TableId,
        key: &LuaValue,
    ) -> LuaResult<Option<(LuaValue, LuaValue)>> {
        let Some(t) = self.pool.get_table(table) else {
            return Ok(None);
        };
        match t.next(key) {
            Ok(entry) => Ok(entry),
            Err(_) => Err(self.error("invalid key to 'next'")),
        }
    }

    /// Traversal cursor over `table`
    pub fn table_iter(&self, table: TableId) -> TableIter {
        TableIter {
            table,
            key: LuaValue::nil(),
            shape_version: None,
        }
    }

    /// Border of the table (`#t` without `__len`)
    pub fn table_len(&self, table: TableId) -> usize {
        self.pool.get_table(table).map_or(0, LuaTable::len)
    }

    /// Release the node array of a table. The header and the arena slot
    /// stay with the collector.
    pub fn destroy_table(&mut self, table: TableId) {
        if let Some(t) = self.pool.get_table_mut(table) {
            let old_capacity = t.capacity();
            t.clear_nodes();
            self.gc.track_free(table.into(), old_capacity * NODE_SIZE);
        }
    }

    // ============ Value stack and frames ============

    pub fn push_value(&mut self, value: LuaValue) -> LuaResult<()> {
        if self.stack.len() >= self.safe_option.max_stack_size {
            return Err(self.stack_overflow());
        }
        self.stack.push(value);
        Ok(())
    }

    /// First free stack slot
    #[inline(always)]
    pub fn stack_top(&self) -> usize {
        self.stack.len()
    }

    /// Number of active call frames
    #[inline(always)]
    pub fn call_stack_size(&self) -> usize {
        self.call_stack.len()
    }

    #[inline(always)]
    pub fn current_frame(&self) -> Option<&CallInfo> {
        self.call_stack.last()
    }

    /// Function of the innermost frame
    pub fn current_function(&self) -> Option<FunctionId> {
        self.current_frame().and_then(|ci| ci.func.as_function_id())
    }

    /// Argument of the running function (1-based index, Lua convention)
    pub fn get_arg(&self, index: usize) -> Option<LuaValue> {
        let frame = self.current_frame()?;
        if index == 0 || index > frame.nargs {
            return None;
        }
        self.stack.get(frame.base + index - 1).copied()
    }

    pub fn arg_count(&self) -> usize {
        self.current_frame().map_or(0, |ci| ci.nargs)
    }

    pub fn get_args(&self) -> Vec<LuaValue> {
        match self.current_frame() {
            Some(frame) => self
                .stack
                .get(frame.base..frame.top())
                .map(<[LuaValue]>::to_vec)
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// Upvalue of the running closure (0-based)
    pub fn get_upvalue(&self, index: usize) -> Option<LuaValue> {
        let func = self.current_function()?;
        self.pool.get_function(func)?.upvalues().get(index).copied()
    }

    pub fn set_upvalue(&mut self, index: usize, value: LuaValue) -> bool {
        let Some(func) = self.current_function() else {
            return false;
        };
        let slot = self
            .pool
            .get_function_mut(func)
            .and_then(LuaFunction::upvalues_mut)
            .and_then(|upvalues| upvalues.get_mut(index));
        let stored = match slot {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        };
        if stored {
            self.barrier(func.into(), &value);
        }
        stored
    }

    // ============ Errors ============

    /// Raise a runtime error with a string message
    #[cold]
    #[inline(never)]
    pub fn error(&mut self, msg: impl Into<String>) -> LuaError {
        let msg = msg.into();
        match self.create_string(&msg) {
            Ok(value) => {
                self.error_object = value;
                LuaError::RuntimeError
            }
            Err(e) => e,
        }
    }

    /// Raise a runtime error carrying an arbitrary value
    #[cold]
    pub fn error_with_value(&mut self, value: LuaValue) -> LuaError {
        self.error_object = value;
        LuaError::RuntimeError
    }

    #[cold]
    pub(crate) fn memory_error(&mut self) -> LuaError {
        self.error_object = LuaValue::string(self.memerr_msg);
        LuaError::OutOfMemory
    }

    #[cold]
    pub(crate) fn stack_overflow(&mut self) -> LuaError {
        self.error_object = LuaValue::string(self.overflow_msg);
        LuaError::StackOverflow
    }

    #[cold]
    pub(crate) fn error_in_error_handling(&mut self) -> LuaError {
        self.error_object = LuaValue::string(self.errerr_msg);
        LuaError::ErrorInErrorHandling
    }

    /// Value of the last raised error
    #[inline(always)]
    pub fn error_object(&self) -> LuaValue {
        self.error_object
    }

    /// Printable form of the last error value
    pub fn error_message(&self) -> String {
        match self.value_str(&self.error_object) {
            Some(s) => s.to_string(),
            None => format!("(error object is a {} value)", self.error_object.type_name()),
        }
    }

    pub fn clear_error(&mut self) {
        self.error_object = LuaValue::nil();
    }
}

/// Cursor-style traversal. Updating or clearing existing fields between
/// steps is allowed; adding keys is a protocol violation (debug-asserted).
#[derive(Debug, Clone, Copy)]
pub struct TableIter {
    table: TableId,
    key: LuaValue,
    shape_version: Option<u32>,
}

impl TableIter {
    pub fn next(&mut self, vm: &mut LuaVM) -> LuaResult<Option<(LuaValue, LuaValue)>> {
        if let Some(t) = vm.table_ref(self.table) {
            let version = t.shape_version();
            if let Some(seen) = self.shape_version {
                debug_assert_eq!(seen, version, "table gained keys during traversal");
            }
            self.shape_version = Some(version);
        }
        let entry = vm.table_next(self.table, &self.key)?;
        if let Some((key, _)) = entry {
            self.key = key;
        }
        Ok(entry)
    }
}
