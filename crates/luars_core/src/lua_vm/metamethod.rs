// Dispatched field access (lvm.c luaV_gettable / luaV_settable)
//
// Raw storage first. On a miss the `__index` / `__newindex` handler is
// consulted: functions are called, anything else is indexed in turn,
// at most MAXTAGLOOP times.
use crate::gc::FunctionId;
use crate::lua_value::LuaValue;
use crate::lua_vm::lua_limits::MAXTAGLOOP;
use crate::lua_vm::{LuaError, LuaResult, LuaVM, TmKind};

impl LuaVM {
    /// `obj[key]` with `__index` dispatch
    pub fn get_table(&mut self, obj: LuaValue, key: LuaValue) -> LuaResult<LuaValue> {
        let mut t = obj;
        for _ in 0..MAXTAGLOOP {
            let tm = match t {
                LuaValue::Table(id) => {
                    let Some(table) = self.pool.get_table(id) else {
                        return Ok(LuaValue::nil());
                    };
                    if let Some(value) = table.get(&key) {
                        return Ok(value);
                    }
                    table
                        .get_metatable()
                        .map(|mt| self.metatable_field(mt, TmKind::Index))
                        .filter(|tm| !tm.is_nil())
                }
                _ => {
                    let tm = self.get_metafield(&t, TmKind::Index);
                    if tm.is_nil() {
                        return Err(self.type_error(&t, "index"));
                    }
                    Some(tm)
                }
            };

            match tm {
                None => return Ok(LuaValue::nil()),
                Some(tm) if tm.is_function() => {
                    return Ok(self.call(tm, &[t, key])?.first());
                }
                Some(tm) => t = tm,
            }
        }
        Err(self.error("'__index' chain too long; possible loop"))
    }

    /// `obj[key] = value` with `__newindex` dispatch
    pub fn set_table(&mut self, obj: LuaValue, key: LuaValue, value: LuaValue) -> LuaResult<()> {
        let mut t = obj;
        for _ in 0..MAXTAGLOOP {
            let tm = match t {
                LuaValue::Table(id) => {
                    let Some(table) = self.pool.get_table(id) else {
                        return Ok(());
                    };
                    let handler = if table.get(&key).is_some() {
                        None
                    } else {
                        table
                            .get_metatable()
                            .map(|mt| self.metatable_field(mt, TmKind::NewIndex))
                            .filter(|tm| !tm.is_nil())
                    };
                    match handler {
                        Some(tm) => tm,
                        None => return self.raw_set(id, key, value),
                    }
                }
                _ => {
                    let tm = self.get_metafield(&t, TmKind::NewIndex);
                    if tm.is_nil() {
                        return Err(self.type_error(&t, "index"));
                    }
                    tm
                }
            };

            if tm.is_function() {
                self.call(tm, &[t, key, value])?;
                return Ok(());
            }
            t = tm;
        }
        Err(self.error("'__newindex' chain too long; possible loop"))
    }

    /// Global read resolved against `func`'s environment (the running
    /// function's when None, the globals table at top level)
    pub fn get_global(&mut self, func: Option<FunctionId>, name: LuaValue) -> LuaResult<LuaValue> {
        let env = self.env_of(func);
        self.get_table(LuaValue::table(env), name)
    }

    pub fn set_global(
        &mut self,
        func: Option<FunctionId>,
        name: LuaValue,
        value: LuaValue,
    ) -> LuaResult<()> {
        let env = self.env_of(func);
        self.set_table(LuaValue::table(env), name, value)
    }

    /// Global read by name in the current environment
    pub fn global(&mut self, name: &str) -> LuaResult<LuaValue> {
        let key = self.create_string(name)?;
        self.get_global(None, key)
    }

    /// Global write by name in the current environment
    pub fn set_global_str(&mut self, name: &str, value: LuaValue) -> LuaResult<()> {
        let key = self.create_string(name)?;
        self.set_global(None, key, value)
    }

    fn env_of(&self, func: Option<FunctionId>) -> crate::gc::TableId {
        match func {
            Some(f) => self
                .pool
                .get_function(f)
                .and_then(|f| f.env)
                .unwrap_or(self.globals()),
            None => self.current_env(),
        }
    }

    /// "attempt to {op} a {type} value"
    #[cold]
    pub fn type_error(&mut self, value: &LuaValue, op: &str) -> LuaError {
        let msg = format!("attempt to {} a {} value", op, value.type_name());
        self.error(msg)
    }
}
