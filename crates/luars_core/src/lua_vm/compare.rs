// Equality and ordering (lvm.c luaV_equalval / luaV_lessthan / lessequal)
use crate::lua_value::LuaValue;
use crate::lua_vm::{LuaError, LuaResult, LuaVM, TmKind};

impl LuaVM {
    /// Identity/value equality without metamethods
    #[inline(always)]
    pub fn raw_equal(&self, a: &LuaValue, b: &LuaValue) -> bool {
        a.raw_equal(b)
    }

    /// `a == b`. Tables and userdata that are not identical consult `__eq`
    /// (first operand's handler, else the second's).
    pub fn equal(&mut self, a: &LuaValue, b: &LuaValue) -> LuaResult<bool> {
        match (a, b) {
            (LuaValue::Nil, LuaValue::Nil) => Ok(true),
            (LuaValue::Boolean(x), LuaValue::Boolean(y)) => Ok(x == y),
            (LuaValue::Number(x), LuaValue::Number(y)) => Ok(x == y),
            (LuaValue::String(x), LuaValue::String(y)) => Ok(x == y),
            (LuaValue::Function(x), LuaValue::Function(y)) => Ok(x == y),
            (LuaValue::Thread(x), LuaValue::Thread(y)) => Ok(x == y),
            (LuaValue::Table(x), LuaValue::Table(y)) if x == y => Ok(true),
            (LuaValue::Userdata(x), LuaValue::Userdata(y)) if x == y => Ok(true),
            (LuaValue::Table(_), LuaValue::Table(_))
            | (LuaValue::Userdata(_), LuaValue::Userdata(_)) => {
                let mut tm = self.get_metafield(a, TmKind::Eq);
                if tm.is_nil() {
                    tm = self.get_metafield(b, TmKind::Eq);
                }
                if tm.is_nil() {
                    return Ok(false);
                }
                Ok(self.call(tm, &[*a, *b])?.first().is_truthy())
            }
            // different kinds are never equal
            _ => Ok(false),
        }
    }

    /// `a < b`
    pub fn less_than(&mut self, a: &LuaValue, b: &LuaValue) -> LuaResult<bool> {
        match (a, b) {
            (LuaValue::Number(x), LuaValue::Number(y)) => Ok(x < y),
            (LuaValue::String(x), LuaValue::String(y)) => Ok(self.str_cmp(*x, *y).is_lt()),
            _ => match self.call_order_tm(a, b, TmKind::Lt)? {
                Some(result) => Ok(result),
                None => Err(self.compare_error(a, b)),
            },
        }
    }

    /// `a <= b`; without `__le` falls back to `not (b < a)` through `__lt`
    pub fn less_equal(&mut self, a: &LuaValue, b: &LuaValue) -> LuaResult<bool> {
        match (a, b) {
            (LuaValue::Number(x), LuaValue::Number(y)) => Ok(x <= y),
            (LuaValue::String(x), LuaValue::String(y)) => Ok(self.str_cmp(*x, *y).is_le()),
            _ => {
                if let Some(result) = self.call_order_tm(a, b, TmKind::Le)? {
                    return Ok(result);
                }
                if let Some(result) = self.call_order_tm(b, a, TmKind::Lt)? {
                    return Ok(!result);
                }
                Err(self.compare_error(a, b))
            }
        }
    }

    /// Byte-wise, locale independent
    fn str_cmp(&self, a: crate::gc::StringId, b: crate::gc::StringId) -> std::cmp::Ordering {
        let a = self.pool.get_string(a).unwrap_or_default();
        let b = self.pool.get_string(b).unwrap_or_default();
        a.as_bytes().cmp(b.as_bytes())
    }

    fn call_order_tm(
        &mut self,
        a: &LuaValue,
        b: &LuaValue,
        event: TmKind,
    ) -> LuaResult<Option<bool>> {
        let mut tm = self.get_metafield(a, event);
        if tm.is_nil() {
            tm = self.get_metafield(b, event);
        }
        if tm.is_nil() {
            return Ok(None);
        }
        let result = self.call(tm, &[*a, *b])?;
        Ok(Some(result.first().is_truthy()))
    }

    #[cold]
    fn compare_error(&mut self, a: &LuaValue, b: &LuaValue) -> LuaError {
        let (t1, t2) = (a.type_name(), b.type_name());
        if t1 == t2 {
            self.error(format!("attempt to compare two {} values", t1))
        } else {
            self.error(format!("attempt to compare {} with {}", t1, t2))
        }
    }
}
