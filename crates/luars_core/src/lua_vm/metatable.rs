// Metatable and environment resolution
//
// Tables and userdata carry their own metatable; every other kind shares
// one slot per type in the VM. Functions, userdata and threads carry an
// environment table.
use crate::gc::TableId;
use crate::lua_value::{LuaValue, LuaValueKind};
use crate::lua_vm::LuaVM;

/// Tag Method types (ltm.h TMS, 5.1 set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TmKind {
    Index = 0,
    NewIndex,
    Gc,
    Mode,
    Eq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Unm,
    Len,
    Lt,
    Le,
    Concat,
    Call,
}

impl TmKind {
    pub const COUNT: usize = 17;

    pub const ALL: [TmKind; TmKind::COUNT] = [
        TmKind::Index,
        TmKind::NewIndex,
        TmKind::Gc,
        TmKind::Mode,
        TmKind::Eq,
        TmKind::Add,
        TmKind::Sub,
        TmKind::Mul,
        TmKind::Div,
        TmKind::Mod,
        TmKind::Pow,
        TmKind::Unm,
        TmKind::Len,
        TmKind::Lt,
        TmKind::Le,
        TmKind::Concat,
        TmKind::Call,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            TmKind::Index => "__index",
            TmKind::NewIndex => "__newindex",
            TmKind::Gc => "__gc",
            TmKind::Mode => "__mode",
            TmKind::Eq => "__eq",
            TmKind::Add => "__add",
            TmKind::Sub => "__sub",
            TmKind::Mul => "__mul",
            TmKind::Div => "__div",
            TmKind::Mod => "__mod",
            TmKind::Pow => "__pow",
            TmKind::Unm => "__unm",
            TmKind::Len => "__len",
            TmKind::Lt => "__lt",
            TmKind::Le => "__le",
            TmKind::Concat => "__concat",
            TmKind::Call => "__call",
        }
    }
}

impl LuaVM {
    /// Metatable of any value: per instance for tables and userdata, the
    /// shared per-type slot otherwise
    pub fn get_metatable(&self, value: &LuaValue) -> Option<TableId> {
        match value {
            LuaValue::Table(id) => self.pool.get_table(*id)?.get_metatable(),
            LuaValue::Userdata(id) => self.pool.get_userdata(*id)?.get_metatable(),
            LuaValue::Nil
            | LuaValue::Boolean(_)
            | LuaValue::Number(_)
            | LuaValue::String(_)
            | LuaValue::Function(_)
            | LuaValue::Thread(_) => self.type_metatables[value.kind().index()],
        }
    }

    /// Install (or clear) a metatable. Per-instance stores fire one write
    /// barrier; the per-type slots are VM roots and fire none.
    pub fn set_metatable(&mut self, value: &LuaValue, metatable: Option<TableId>) {
        match value {
            LuaValue::Table(id) => {
                if let Some(table) = self.pool.get_table_mut(*id) {
                    table.set_metatable(metatable);
                    if let Some(mt) = metatable {
                        self.barrier((*id).into(), &LuaValue::table(mt));
                    }
                }
            }
            LuaValue::Userdata(id) => {
                if let Some(ud) = self.pool.get_userdata_mut(*id) {
                    ud.metatable = metatable;
                    if let Some(mt) = metatable {
                        self.barrier((*id).into(), &LuaValue::table(mt));
                    }
                }
            }
            LuaValue::Nil
            | LuaValue::Boolean(_)
            | LuaValue::Number(_)
            | LuaValue::String(_)
            | LuaValue::Function(_)
            | LuaValue::Thread(_) => {
                self.type_metatables[value.kind().index()] = metatable;
            }
        }
    }

    /// Shared metatable of a kind (the slot `set_metatable` writes for
    /// values without per-instance metatables)
    pub fn type_metatable(&self, kind: LuaValueKind) -> Option<TableId> {
        self.type_metatables[kind.index()]
    }

    /// Handler for `event` in the value's metatable, nil when absent
    pub fn get_metafield(&self, value: &LuaValue, event: TmKind) -> LuaValue {
        match self.get_metatable(value) {
            Some(mt) => self.metatable_field(mt, event),
            None => LuaValue::nil(),
        }
    }

    #[inline]
    pub(crate) fn metatable_field(&self, metatable: TableId, event: TmKind) -> LuaValue {
        let name = self.pool.tm_name(event);
        self.pool
            .get_table(metatable)
            .and_then(|mt| mt.get_str(name))
            .unwrap_or_default()
    }

    /// Environment of functions, userdata and threads
    pub fn get_env(&self, value: &LuaValue) -> Option<TableId> {
        match value {
            LuaValue::Function(id) => self.pool.get_function(*id)?.env,
            LuaValue::Userdata(id) => self.pool.get_userdata(*id)?.get_env(),
            LuaValue::Thread(id) => self.pool.get_thread(*id)?.get_env(),
            LuaValue::Nil
            | LuaValue::Boolean(_)
            | LuaValue::Number(_)
            | LuaValue::String(_)
            | LuaValue::Table(_) => None,
        }
    }

    /// Replace the environment. False (and no change) for kinds without one.
    pub fn set_env(&mut self, value: &LuaValue, env: TableId) -> bool {
        let stored = match value {
            LuaValue::Function(id) => self
                .pool
                .get_function_mut(*id)
                .map(|f| f.env = Some(env))
                .is_some(),
            LuaValue::Userdata(id) => self
                .pool
                .get_userdata_mut(*id)
                .map(|ud| ud.env = Some(env))
                .is_some(),
            LuaValue::Thread(id) => self
                .pool
                .get_thread_mut(*id)
                .map(|th| th.env = Some(env))
                .is_some(),
            LuaValue::Nil
            | LuaValue::Boolean(_)
            | LuaValue::Number(_)
            | LuaValue::String(_)
            | LuaValue::Table(_) => false,
        };
        if stored && let Some(holder) = value.gc_id() {
            self.barrier(holder, &LuaValue::table(env));
        }
        stored
    }

    /// Environment of the running function, the globals table at top level
    pub fn current_env(&self) -> TableId {
        self.current_function()
            .and_then(|f| self.pool.get_function(f))
            .and_then(|f| f.env)
            .unwrap_or(self.globals())
    }
}
