// Function calls (ldo.c luaD_call)
use std::rc::Rc;

use crate::lua_value::{CFunction, Chunk, FunctionBody, LuaValue, MultiValue};
use crate::lua_vm::call_info::call_status::{CIST_C, CIST_CALLMT, CIST_ERRH, CIST_LUA};
use crate::lua_vm::lua_limits::EXTRA_CI;
use crate::lua_vm::{CallInfo, LuaResult, LuaVM, TmKind};

enum Callee {
    Native(CFunction),
    Lua(Rc<Chunk>),
}

impl LuaVM {
    /// Unprotected call. Non-functions go through `__call` with the
    /// original value prepended to the arguments.
    ///
    /// On error the frames stay in place for the enclosing protected call
    /// (and its handler) to see; it restores them. Without an enclosing
    /// protected call the VM is unwound to the state at entry.
    pub fn call(&mut self, func: LuaValue, args: &[LuaValue]) -> LuaResult<MultiValue> {
        let entry_depth = self.call_stack.len();
        let entry_top = self.stack.len();
        let result = self.call_frame(func, args);
        if result.is_err() && self.recovery_points.is_empty() {
            self.call_stack.truncate(entry_depth);
            self.stack.truncate(entry_top);
        }
        result
    }

    fn call_frame(&mut self, func: LuaValue, args: &[LuaValue]) -> LuaResult<MultiValue> {
        let mut status = 0;
        let mut callable = func;
        let mut self_arg = None;
        if !func.is_function() {
            let tm = self.get_metafield(&func, TmKind::Call);
            if !tm.is_function() {
                return Err(self.type_error(&func, "call"));
            }
            callable = tm;
            self_arg = Some(func);
            status |= CIST_CALLMT;
        }

        let Some(id) = callable.as_function_id() else {
            return Err(self.type_error(&func, "call"));
        };
        let callee = match self.pool.get_function(id).map(|f| &f.body) {
            Some(FunctionBody::C(f)) | Some(FunctionBody::CClosure { func: f, .. }) => {
                status |= CIST_C;
                Callee::Native(*f)
            }
            Some(FunctionBody::Lua { proto, .. }) => {
                status |= CIST_LUA;
                Callee::Lua(proto.clone())
            }
            None => return Err(self.type_error(&func, "call")),
        };

        let mut limit = self.safe_option.max_call_depth;
        if self.error_handler_depth > 0 {
            limit += EXTRA_CI;
            status |= CIST_ERRH;
        }
        if self.call_stack.len() >= limit {
            return Err(self.stack_overflow());
        }

        let func_index = self.stack.len();
        self.push_value(callable)?;
        if let Some(obj) = self_arg {
            self.push_value(obj)?;
        }
        for arg in args {
            self.push_value(*arg)?;
        }
        let base = func_index + 1;
        let nargs = self.stack.len() - base;
        let frame_depth = self.call_stack.len();
        self.call_stack
            .push(CallInfo::new(callable, base, nargs, status));

        let result = match callee {
            Callee::Native(f) => f(self),
            Callee::Lua(chunk) => match self.interpreter() {
                Some(interpreter) => interpreter.execute(self, id, &chunk),
                None => Err(self.error("no interpreter attached")),
            },
        };

        // Truncate rather than pop: a callee may have swallowed the error
        // of a nested call and left that frame behind
        if result.is_ok() {
            self.call_stack.truncate(frame_depth);
            self.stack.truncate(func_index);
        }
        result
    }
}
