use crate::lua_vm::lua_limits::{LUAI_MAXSTACK, MAX_CALL_DEPTH};

/// Resource limits for one VM
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SafeOption {
    /// Value stack slots
    pub max_stack_size: usize,
    /// Nested calls, error handlers get EXTRA_CI on top of this
    pub max_call_depth: usize,
    /// Maximum memory limit in bytes
    pub max_memory_limit: usize,
}

impl Default for SafeOption {
    fn default() -> Self {
        Self {
            max_stack_size: LUAI_MAXSTACK,
            max_call_depth: MAX_CALL_DEPTH,
            max_memory_limit: usize::MAX,
        }
    }
}
