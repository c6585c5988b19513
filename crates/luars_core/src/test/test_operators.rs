// Tests for arithmetic and coercion
use crate::*;

#[test]
fn test_numeric_arith() {
    let mut vm = LuaVM::new(SafeOption::default());
    let n = |x: f64| LuaValue::number(x);
    assert_eq!(vm.arith(ArithOp::Add, &n(1.0), &n(2.0)).unwrap(), n(3.0));
    assert_eq!(vm.arith(ArithOp::Sub, &n(1.0), &n(2.0)).unwrap(), n(-1.0));
    assert_eq!(vm.arith(ArithOp::Mul, &n(3.0), &n(4.0)).unwrap(), n(12.0));
    assert_eq!(vm.arith(ArithOp::Div, &n(1.0), &n(4.0)).unwrap(), n(0.25));
    assert_eq!(vm.arith(ArithOp::Pow, &n(2.0), &n(10.0)).unwrap(), n(1024.0));
    assert_eq!(vm.arith(ArithOp::Unm, &n(5.0), &n(5.0)).unwrap(), n(-5.0));

    // floored modulo
    assert_eq!(vm.arith(ArithOp::Mod, &n(5.0), &n(3.0)).unwrap(), n(2.0));
    assert_eq!(vm.arith(ArithOp::Mod, &n(-5.0), &n(3.0)).unwrap(), n(1.0));
    assert_eq!(vm.arith(ArithOp::Mod, &n(5.0), &n(-3.0)).unwrap(), n(-1.0));
}

#[test]
fn test_arith_coerces_strings() {
    let mut vm = LuaVM::new(SafeOption::default());
    let ten = vm.create_string(" 10 ").unwrap();
    let hex = vm.create_string("0x10").unwrap();
    assert_eq!(
        vm.arith(ArithOp::Add, &ten, &LuaValue::integer(1)).unwrap(),
        LuaValue::integer(11)
    );
    assert_eq!(
        vm.arith(ArithOp::Mul, &ten, &hex).unwrap(),
        LuaValue::integer(160)
    );
}

#[test]
fn test_arith_error_names_the_bad_operand() {
    let mut vm = LuaVM::new(SafeOption::default());
    let t = vm.create_table(0, 0).unwrap();
    let word = vm.create_string("abc").unwrap();

    assert_eq!(
        vm.arith(ArithOp::Add, &LuaValue::integer(1), &t),
        Err(LuaError::RuntimeError)
    );
    assert_eq!(vm.error_message(), "attempt to perform arithmetic on a table value");

    assert_eq!(
        vm.arith(ArithOp::Sub, &word, &t),
        Err(LuaError::RuntimeError)
    );
    assert_eq!(vm.error_message(), "attempt to perform arithmetic on a string value");

    assert_eq!(
        vm.arith(ArithOp::Unm, &LuaValue::nil(), &LuaValue::nil()),
        Err(LuaError::RuntimeError)
    );
    assert_eq!(vm.error_message(), "attempt to perform arithmetic on a nil value");

    let _ = vm.arithmetic_error(&LuaValue::integer(1), &LuaValue::boolean(true));
    assert_eq!(vm.error_message(), "attempt to perform arithmetic on a boolean value");
}

/// __add returning the number of arguments it got, then the second one
fn add_handler(vm: &mut LuaVM) -> LuaResult<MultiValue> {
    let count = vm.arg_count() as i64;
    let rhs = vm.get_arg(2).unwrap_or_default();
    Ok(MultiValue::multiple(vec![LuaValue::integer(count), rhs]))
}

#[test]
fn test_arith_metamethod() {
    let mut vm = LuaVM::new(SafeOption::default());
    let t = vm.create_table(0, 0).unwrap();
    let mt = vm.create_table(0, 0).unwrap();
    let add = vm.create_native(add_handler).unwrap();
    vm.raw_set_str(mt.as_table_id().unwrap(), "__add", add).unwrap();
    vm.set_metatable(&t, mt.as_table_id());

    // handler found on either side; only the first result is kept
    assert_eq!(
        vm.arith(ArithOp::Add, &t, &LuaValue::integer(7)).unwrap(),
        LuaValue::integer(2)
    );
    assert_eq!(
        vm.arith(ArithOp::Add, &LuaValue::integer(7), &t).unwrap(),
        LuaValue::integer(2)
    );
    // other events are not covered by __add
    assert_eq!(
        vm.arith(ArithOp::Mul, &t, &LuaValue::integer(7)),
        Err(LuaError::RuntimeError)
    );
}

#[test]
fn test_to_number() {
    let mut vm = LuaVM::new(SafeOption::default());
    let s = vm.create_string("  1.5e2  ").unwrap();
    let bad = vm.create_string("1.5x").unwrap();
    assert_eq!(vm.to_number(&s), Some(150.0));
    assert_eq!(vm.to_number(&bad), None);
    assert_eq!(vm.to_number(&LuaValue::integer(4)), Some(4.0));
    assert_eq!(vm.to_number(&LuaValue::boolean(true)), None);
    assert_eq!(lua_vm::str_to_number("0x1F"), Some(31.0));
}

#[test]
fn test_to_string_coerce() {
    let mut vm = LuaVM::new(SafeOption::default());
    let n = vm.to_string_coerce(&LuaValue::integer(12)).unwrap().unwrap();
    assert_eq!(vm.to_str(&n), Some("12"));
    let f = vm.to_string_coerce(&LuaValue::number(0.5)).unwrap().unwrap();
    assert_eq!(vm.to_str(&f), Some("0.5"));

    let s = vm.create_string("keep").unwrap();
    assert_eq!(vm.to_string_coerce(&s).unwrap(), Some(s));
    assert_eq!(vm.to_string_coerce(&LuaValue::nil()).unwrap(), None);
    // to_str never converts
    assert_eq!(vm.to_str(&LuaValue::integer(12)), None);
}

#[test]
fn test_truthiness() {
    let mut vm = LuaVM::new(SafeOption::default());
    let empty = vm.create_string("").unwrap();
    assert!(!vm.to_boolean(&LuaValue::nil()));
    assert!(!vm.to_boolean(&LuaValue::boolean(false)));
    assert!(vm.to_boolean(&LuaValue::integer(0)));
    assert!(vm.to_boolean(&empty));
}
