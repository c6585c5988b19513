//! Centralized VM limits.
//!
//! Mirrors the `luaconf.h` / `llimits.h` split: every magic number that
//! controls core behavior lives here.

// ===== Stack =====

/// Initial value stack capacity for a new VM.
pub const BASIC_STACK_SIZE: usize = 2 * LUA_MINSTACK;

/// Minimum guaranteed stack slots available to native functions.
pub const LUA_MINSTACK: usize = 20;

/// Default maximum stack size (number of slots).
pub const LUAI_MAXSTACK: usize = 1_000_000;

/// Default maximum function call nesting depth.
pub const MAX_CALL_DEPTH: usize = 256;

/// Extra call depth granted while an error handler runs, so a handler can
/// still execute after a stack overflow.
pub const EXTRA_CI: usize = 30;

// ===== Metamethods =====

/// Maximum length of an `__index` / `__newindex` chain.
/// Longer chains are treated as loops.
pub const MAXTAGLOOP: usize = 2000;

// ===== Tables =====

/// Smallest node array a non-empty table gets.
pub const MIN_TABLE_NODES: usize = 1;

/// Above this border probe the length search switches to a linear scan.
pub const MAX_BORDER_PROBE: u64 = (i32::MAX as u64) / 2;

// ===== Strings =====

/// Maximum length of a number rendered by string coercion ("%.14g").
pub const LUAI_MAXNUMBER2STR: usize = 32;

/// Significant digits used when rendering numbers.
pub const LUAI_NUMDIGITS: usize = 14;
