// Tests for equality and ordering
use crate::*;

fn always_true(_vm: &mut LuaVM) -> LuaResult<MultiValue> {
    Ok(MultiValue::single(LuaValue::boolean(true)))
}

/// __lt / __le on tables holding their weight at index 1
fn weight_lt(vm: &mut LuaVM) -> LuaResult<MultiValue> {
    let (a, b) = weights(vm);
    Ok(MultiValue::single(LuaValue::boolean(a < b)))
}

fn weight_le(vm: &mut LuaVM) -> LuaResult<MultiValue> {
    let (a, b) = weights(vm);
    Ok(MultiValue::single(LuaValue::boolean(a <= b)))
}

fn weights(vm: &LuaVM) -> (f64, f64) {
    let weight = |vm: &LuaVM, v: Option<LuaValue>| {
        v.and_then(|v| v.as_table_id())
            .and_then(|t| vm.raw_geti(t, 1).as_number())
            .unwrap_or(0.0)
    };
    (weight(vm, vm.get_arg(1)), weight(vm, vm.get_arg(2)))
}

fn weighted(vm: &mut LuaVM, w: i64, mt: Option<gc::TableId>) -> LuaValue {
    let t = vm.create_table(1, 0).unwrap();
    vm.raw_seti(t.as_table_id().unwrap(), 1, LuaValue::integer(w))
        .unwrap();
    vm.set_metatable(&t, mt);
    t
}

#[test]
fn test_primitive_equality() {
    let mut vm = LuaVM::new(SafeOption::default());
    let a = vm.create_string("same").unwrap();
    let b = vm.create_string("same").unwrap();
    let c = vm.create_string("other").unwrap();

    assert!(vm.equal(&LuaValue::nil(), &LuaValue::nil()).unwrap());
    assert!(vm.equal(&LuaValue::integer(1), &LuaValue::number(1.0)).unwrap());
    assert!(!vm.equal(&LuaValue::number(f64::NAN), &LuaValue::number(f64::NAN)).unwrap());
    assert!(vm.equal(&a, &b).unwrap());
    assert!(!vm.equal(&a, &c).unwrap());
    // different kinds never compare equal, no coercion
    let one = vm.create_string("1").unwrap();
    assert!(!vm.equal(&one, &LuaValue::integer(1)).unwrap());
    assert!(!vm.equal(&LuaValue::nil(), &LuaValue::boolean(false)).unwrap());
}

#[test]
fn test_table_equality_needs_eq() {
    let mut vm = LuaVM::new(SafeOption::default());
    let t1 = weighted(&mut vm, 1, None);
    let t2 = weighted(&mut vm, 1, None);
    assert!(vm.equal(&t1, &t1).unwrap());
    assert!(!vm.equal(&t1, &t2).unwrap());
    assert!(!vm.raw_equal(&t1, &t2));

    let mt = vm.create_table(0, 0).unwrap();
    let eq = vm.create_native(always_true).unwrap();
    vm.raw_set_str(mt.as_table_id().unwrap(), "__eq", eq).unwrap();
    vm.set_metatable(&t1, mt.as_table_id());
    vm.set_metatable(&t2, mt.as_table_id());
    assert!(vm.equal(&t1, &t2).unwrap());
    assert!(!vm.raw_equal(&t1, &t2));
}

#[test]
fn test_eq_of_second_operand_is_used() {
    let mut vm = LuaVM::new(SafeOption::default());
    let mt = vm.create_table(0, 0).unwrap();
    let eq = vm.create_native(always_true).unwrap();
    vm.raw_set_str(mt.as_table_id().unwrap(), "__eq", eq).unwrap();

    let plain = weighted(&mut vm, 1, None);
    let with_eq = weighted(&mut vm, 2, mt.as_table_id());
    assert!(vm.equal(&plain, &with_eq).unwrap());
    assert!(vm.equal(&with_eq, &plain).unwrap());
}

#[test]
fn test_eq_not_consulted_for_other_kinds() {
    let mut vm = LuaVM::new(SafeOption::default());
    let mt = vm.create_table(0, 0).unwrap();
    let eq = vm.create_native(always_true).unwrap();
    vm.raw_set_str(mt.as_table_id().unwrap(), "__eq", eq).unwrap();
    let t = weighted(&mut vm, 1, mt.as_table_id());
    let u = vm.create_userdata(0u32).unwrap();
    vm.set_metatable(&u, mt.as_table_id());
    assert!(!vm.equal(&t, &u).unwrap());
}

#[test]
fn test_native_ordering() {
    let mut vm = LuaVM::new(SafeOption::default());
    assert!(vm.less_than(&LuaValue::integer(1), &LuaValue::integer(2)).unwrap());
    assert!(!vm.less_than(&LuaValue::integer(2), &LuaValue::integer(2)).unwrap());
    assert!(vm.less_equal(&LuaValue::integer(2), &LuaValue::integer(2)).unwrap());

    let a = vm.create_string("a").unwrap();
    let b = vm.create_string("b").unwrap();
    let ab = vm.create_string("ab").unwrap();
    let upper = vm.create_string("Z").unwrap();
    assert!(vm.less_than(&a, &b).unwrap());
    assert!(vm.less_than(&a, &ab).unwrap());
    assert!(vm.less_equal(&ab, &b).unwrap());
    // byte order, not locale order
    assert!(vm.less_than(&upper, &a).unwrap());
}

#[test]
fn test_ordering_metamethods() {
    let mut vm = LuaVM::new(SafeOption::default());
    let mt = vm.create_table(0, 0).unwrap();
    let mt_id = mt.as_table_id().unwrap();
    let lt = vm.create_native(weight_lt).unwrap();
    vm.raw_set_str(mt_id, "__lt", lt).unwrap();

    let light = weighted(&mut vm, 1, Some(mt_id));
    let heavy = weighted(&mut vm, 5, Some(mt_id));
    assert!(vm.less_than(&light, &heavy).unwrap());
    assert!(!vm.less_than(&heavy, &light).unwrap());

    // no __le: a <= b is not (b < a)
    assert!(vm.less_equal(&light, &heavy).unwrap());
    assert!(vm.less_equal(&light, &light).unwrap());
    assert!(!vm.less_equal(&heavy, &light).unwrap());

    let le = vm.create_native(weight_le).unwrap();
    vm.raw_set_str(mt_id, "__le", le).unwrap();
    assert!(vm.less_equal(&light, &heavy).unwrap());
    assert!(!vm.less_equal(&heavy, &light).unwrap());
}

#[test]
fn test_compare_errors() {
    let mut vm = LuaVM::new(SafeOption::default());
    let t1 = weighted(&mut vm, 1, None);
    let t2 = weighted(&mut vm, 2, None);
    assert_eq!(vm.less_than(&t1, &t2), Err(LuaError::RuntimeError));
    assert_eq!(vm.error_message(), "attempt to compare two table values");

    let s = vm.create_string("10").unwrap();
    assert_eq!(
        vm.less_equal(&LuaValue::integer(1), &s),
        Err(LuaError::RuntimeError)
    );
    assert_eq!(vm.error_message(), "attempt to compare number with string");
}
