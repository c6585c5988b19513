// Protected calls (ldo.c luaD_pcall)
//
// Each protected call pushes a recovery point (call depth + stack top).
// An error unwinds through `Result` up to the innermost boundary, which
// runs the error handler above the failing frames, then restores the
// snapshot and reports a status plus the error value.
use crate::lua_value::LuaValue;
use crate::lua_vm::{LuaError, LuaResult, LuaVM};

/// Outcome of a protected call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CallStatus {
    Ok,
    RuntimeError,
    MemoryError,
    ErrorInErrorHandling,
}

impl From<LuaError> for CallStatus {
    fn from(err: LuaError) -> Self {
        match err {
            LuaError::RuntimeError | LuaError::StackOverflow => CallStatus::RuntimeError,
            LuaError::OutOfMemory => CallStatus::MemoryError,
            LuaError::ErrorInErrorHandling => CallStatus::ErrorInErrorHandling,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RecoveryPoint {
    pub call_depth: usize,
    pub stack_top: usize,
}

impl LuaVM {
    /// Call `func` under a recovery point. On failure the results are the
    /// single error value (the handler's result when a handler ran).
    pub fn pcall(
        &mut self,
        func: LuaValue,
        args: &[LuaValue],
        handler: Option<LuaValue>,
    ) -> (CallStatus, Vec<LuaValue>) {
        let point = self.push_recovery_point();
        match self.call(func, args) {
            Ok(results) => {
                self.recovery_points.pop();
                (CallStatus::Ok, results.all_values())
            }
            Err(err) => {
                let status = self.handle_error(err, handler);
                self.restore(point);
                (status, vec![self.error_object])
            }
        }
    }

    /// Run host code under a recovery point. On failure the VM is restored
    /// and the error value is left in `error_object`.
    pub fn protected_run<R>(
        &mut self,
        f: impl FnOnce(&mut LuaVM) -> LuaResult<R>,
    ) -> Result<R, CallStatus> {
        let point = self.push_recovery_point();
        match f(self) {
            Ok(value) => {
                self.recovery_points.pop();
                Ok(value)
            }
            Err(err) => {
                let status = self.handle_error(err, None);
                self.restore(point);
                Err(status)
            }
        }
    }

    fn push_recovery_point(&mut self) -> RecoveryPoint {
        let point = RecoveryPoint {
            call_depth: self.call_stack.len(),
            stack_top: self.stack.len(),
        };
        self.recovery_points.push(point);
        point
    }

    fn restore(&mut self, point: RecoveryPoint) {
        self.call_stack.truncate(point.call_depth);
        self.stack.truncate(point.stack_top);
        self.recovery_points.pop();
    }

    fn handle_error(&mut self, err: LuaError, handler: Option<LuaValue>) -> CallStatus {
        let mut status = CallStatus::from(err);
        if status == CallStatus::RuntimeError
            && let Some(handler) = handler
        {
            status = self.run_error_handler(handler);
        }
        tracing::debug!(
            target: "luars_core::vm",
            ?status,
            depth = self.call_stack.len(),
            "protected call failed"
        );
        status
    }

    /// The handler receives the error value and its first result becomes
    /// the new error value
    fn run_error_handler(&mut self, handler: LuaValue) -> CallStatus {
        let error = self.error_object;
        self.error_handler_depth += 1;
        let result = self.call(handler, &[error]);
        self.error_handler_depth -= 1;
        match result {
            Ok(values) => {
                self.error_object = values.first();
                CallStatus::RuntimeError
            }
            Err(_) => {
                self.error_in_error_handling();
                CallStatus::ErrorInErrorHandling
            }
        }
    }
}
