/// Lightweight error enum - only 1 byte.
/// The error value itself lives in `LuaVM::error_object`, which keeps every
/// `LuaResult` small on the hot paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LuaError {
    /// Runtime error - value stored in vm.error_object
    #[error("runtime error")]
    RuntimeError,
    /// The collector refused an allocation
    #[error("not enough memory")]
    OutOfMemory,
    /// Call depth or value stack limit exceeded
    #[error("stack overflow")]
    StackOverflow,
    /// The error handler of a protected call failed
    #[error("error in error handling")]
    ErrorInErrorHandling,
}

pub type LuaResult<T> = Result<T, LuaError>;
