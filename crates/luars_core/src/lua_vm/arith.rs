// Arithmetic with coercion and metamethod fallback (lvm.c Arith)
use crate::lua_value::LuaValue;
use crate::lua_vm::{LuaError, LuaResult, LuaVM, TmKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Unm,
}

impl ArithOp {
    pub fn event(self) -> TmKind {
        match self {
            ArithOp::Add => TmKind::Add,
            ArithOp::Sub => TmKind::Sub,
            ArithOp::Mul => TmKind::Mul,
            ArithOp::Div => TmKind::Div,
            ArithOp::Mod => TmKind::Mod,
            ArithOp::Pow => TmKind::Pow,
            ArithOp::Unm => TmKind::Unm,
        }
    }

    /// Raw numeric operation
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
            ArithOp::Div => a / b,
            // floored modulo: result takes the sign of the divisor
            ArithOp::Mod => a - (a / b).floor() * b,
            ArithOp::Pow => a.powf(b),
            ArithOp::Unm => -a,
        }
    }
}

impl LuaVM {
    /// `a op b` (for Unm, `b` is ignored by the numeric path and passed as
    /// `a` to the handler)
    pub fn arith(&mut self, op: ArithOp, a: &LuaValue, b: &LuaValue) -> LuaResult<LuaValue> {
        let b = if op == ArithOp::Unm { a } else { b };
        if let (Some(x), Some(y)) = (self.to_number(a), self.to_number(b)) {
            return Ok(LuaValue::number(op.apply(x, y)));
        }

        let event = op.event();
        let mut tm = self.get_metafield(a, event);
        if tm.is_nil() {
            tm = self.get_metafield(b, event);
        }
        if tm.is_nil() {
            return Err(self.arithmetic_error(a, b));
        }
        Ok(self.call(tm, &[*a, *b])?.first())
    }

    /// "attempt to perform arithmetic on a X value", naming the first
    /// operand that does not coerce to a number
    #[cold]
    pub fn arithmetic_error(&mut self, a: &LuaValue, b: &LuaValue) -> LuaError {
        let culprit = if self.to_number(a).is_none() { a } else { b };
        self.type_error(culprit, "perform arithmetic on")
    }
}
