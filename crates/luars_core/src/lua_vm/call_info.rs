// CallInfo - one entry of the call stack (lstate.h CallInfo)

use crate::lua_value::LuaValue;

/// Call status flags (Lua's CIST_* flags)
pub mod call_status {
    /// Interpreted closure
    pub const CIST_LUA: u32 = 1 << 0;
    /// Native function or native closure
    pub const CIST_C: u32 = 1 << 1;
    /// Frame belongs to a running error handler
    pub const CIST_ERRH: u32 = 1 << 2;
    /// Reached through `__call`
    pub const CIST_CALLMT: u32 = 1 << 3;
}

#[derive(Debug, Clone, Copy)]
pub struct CallInfo {
    /// The function being run (after `__call` resolution)
    pub func: LuaValue,

    /// Stack index of the first argument
    pub base: usize,

    /// Number of arguments pushed for this frame
    pub nargs: usize,

    pub call_status: u32,
}

impl CallInfo {
    pub fn new(func: LuaValue, base: usize, nargs: usize, call_status: u32) -> Self {
        Self {
            func,
            base,
            nargs,
            call_status,
        }
    }

    #[inline(always)]
    pub fn is_lua(&self) -> bool {
        self.call_status & call_status::CIST_LUA != 0
    }

    #[inline(always)]
    pub fn is_c(&self) -> bool {
        self.call_status & call_status::CIST_C != 0
    }

    #[inline(always)]
    pub fn is_error_handler(&self) -> bool {
        self.call_status & call_status::CIST_ERRH != 0
    }

    /// One past the last argument slot
    #[inline(always)]
    pub fn top(&self) -> usize {
        self.base + self.nargs
    }
}
