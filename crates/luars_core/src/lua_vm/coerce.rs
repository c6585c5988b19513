// String <-> number coercion (lvm.c luaV_tonumber / luaV_tostring)
use crate::lua_value::{LuaValue, number_to_integer};
use crate::lua_vm::lua_limits::{LUAI_MAXNUMBER2STR, LUAI_NUMDIGITS};
use crate::lua_vm::{LuaResult, LuaVM};

/// Whitespace accepted around numerals (C isspace in the "C" locale)
#[inline(always)]
fn is_lua_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c')
}

/// Locale independent numeral parser: optional sign, then either a hex
/// integer (`0x1F`) or a decimal with optional fraction and exponent.
/// Surrounding whitespace is allowed; `inf`/`nan` spellings are not.
pub fn str_to_number(s: &str) -> Option<f64> {
    let s = s.trim_matches(is_lua_space);
    let (negative, body) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };

    let value = match body
        .strip_prefix("0x")
        .or_else(|| body.strip_prefix("0X"))
    {
        Some(hex) => parse_hex(hex)?,
        None => parse_decimal(body)?,
    };
    Some(if negative { -value } else { value })
}

fn parse_hex(s: &str) -> Option<f64> {
    if s.is_empty() {
        return None;
    }
    s.chars().try_fold(0.0f64, |acc, c| {
        c.to_digit(16).map(|d| acc * 16.0 + f64::from(d))
    })
}

fn parse_decimal(s: &str) -> Option<f64> {
    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(pos) => (&s[..pos], Some(&s[pos + 1..])),
        None => (s, None),
    };
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, f),
        None => (mantissa, ""),
    };

    let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !all_digits(int_part) || !all_digits(frac_part) {
        return None;
    }

    let exponent = match exponent {
        Some(e) => {
            let digits = e.strip_prefix(['+', '-']).unwrap_or(e);
            if digits.is_empty() || !all_digits(digits) {
                return None;
            }
            e
        }
        None => "0",
    };

    // Normalized form the std float parser accepts unconditionally
    let int_part = if int_part.is_empty() { "0" } else { int_part };
    let frac_part = if frac_part.is_empty() { "0" } else { frac_part };
    format!("{}.{}e{}", int_part, frac_part, exponent)
        .parse::<f64>()
        .ok()
}

/// `%.14g` rendering of a number
pub fn number_to_str(n: f64) -> String {
    if n.is_nan() {
        return if n.is_sign_negative() { "-nan" } else { "nan" }.to_string();
    }
    if n.is_infinite() {
        return if n < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    if n == 0.0 && n.is_sign_negative() {
        return "-0".to_string();
    }

    // Integral values below 10^14 print all their digits
    if let Some(i) = number_to_integer(n)
        && i.unsigned_abs() < 100_000_000_000_000
    {
        let mut buffer = itoa::Buffer::new();
        return buffer.format(i).to_string();
    }

    let precision = LUAI_NUMDIGITS - 1;
    let sci = format!("{:.*e}", precision, n);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);

    let mut out = String::with_capacity(LUAI_MAXNUMBER2STR);
    if exp < -4 || exp >= LUAI_NUMDIGITS as i32 {
        out.push_str(trim_fraction(mantissa));
        out.push('e');
        out.push(if exp < 0 { '-' } else { '+' });
        if exp.abs() < 10 {
            out.push('0');
        }
        let mut buffer = itoa::Buffer::new();
        out.push_str(buffer.format(exp.abs()));
    } else {
        let decimals = (precision as i32 - exp).max(0) as usize;
        let fixed = format!("{:.*}", decimals, n);
        out.push_str(trim_fraction(&fixed));
    }
    out
}

/// Drop trailing zeros of the fraction, and the point when nothing is left
fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

impl LuaVM {
    /// Numbers as-is, numeric strings parsed, everything else None
    pub fn to_number(&self, value: &LuaValue) -> Option<f64> {
        match value {
            LuaValue::Number(n) => Some(*n),
            LuaValue::String(_) => self.value_str(value).and_then(str_to_number),
            _ => None,
        }
    }

    /// Only nil and false are false
    #[inline(always)]
    pub fn to_boolean(&self, value: &LuaValue) -> bool {
        value.is_truthy()
    }

    /// Text of a string value, no coercion
    pub fn to_str(&self, value: &LuaValue) -> Option<&str> {
        self.value_str(value)
    }

    /// Strings as-is; numbers become new strings; others None
    pub fn to_string_coerce(&mut self, value: &LuaValue) -> LuaResult<Option<LuaValue>> {
        match value {
            LuaValue::String(_) => Ok(Some(*value)),
            LuaValue::Number(n) => {
                let text = number_to_str(*n);
                Ok(Some(self.create_string(&text)?))
            }
            _ => Ok(None),
        }
    }
}
