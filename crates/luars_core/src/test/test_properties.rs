// Property tests for table storage against a model map
use std::collections::HashMap;

use proptest::prelude::*;

use crate::*;

#[derive(Debug, Clone)]
enum Key {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ModelKey {
    Number(u64),
    Str(usize),
    Bool(bool),
}

fn key_strategy() -> impl Strategy<Value = Key> {
    prop_oneof![
        (-20i64..200).prop_map(Key::Int),
        (-50.0f64..50.0).prop_map(Key::Float),
        "[a-e]{1,3}".prop_map(Key::Str),
        any::<bool>().prop_map(Key::Bool),
    ]
}

/// `None` deletes the key
fn ops_strategy() -> impl Strategy<Value = Vec<(Key, Option<i64>)>> {
    prop::collection::vec((key_strategy(), prop::option::weighted(0.7, any::<i64>())), 1..300)
}

/// Builds the VM key and the model key; strings are interned so the
/// model can key them by their text
struct Harness {
    vm: LuaVM,
    table: crate::gc::TableId,
    strings: Vec<String>,
    model: HashMap<ModelKey, LuaValue>,
}

impl Harness {
    fn new() -> Self {
        let mut vm = LuaVM::new(SafeOption::default());
        let table = vm.create_table(0, 0).unwrap().as_table_id().unwrap();
        Self {
            vm,
            table,
            strings: Vec::new(),
            model: HashMap::new(),
        }
    }

    fn key(&mut self, key: &Key) -> (LuaValue, ModelKey) {
        match key {
            Key::Int(i) => (LuaValue::integer(*i), ModelKey::Number((*i as f64).to_bits())),
            Key::Float(f) => {
                // -0.0 and 0.0 are the same key
                let f = if *f == 0.0 { 0.0 } else { *f };
                (LuaValue::number(f), ModelKey::Number(f.to_bits()))
            }
            Key::Str(s) => {
                let index = match self.strings.iter().position(|known| known == s) {
                    Some(index) => index,
                    None => {
                        self.strings.push(s.clone());
                        self.strings.len() - 1
                    }
                };
                (self.vm.create_string(s).unwrap(), ModelKey::Str(index))
            }
            Key::Bool(b) => (LuaValue::boolean(*b), ModelKey::Bool(*b)),
        }
    }

    fn apply(&mut self, key: &Key, value: Option<i64>) {
        let (k, mk) = self.key(key);
        let v = value.map_or(LuaValue::nil(), LuaValue::integer);
        self.vm.raw_set(self.table, k, v).unwrap();
        match value {
            Some(_) => {
                self.model.insert(mk, v);
            }
            None => {
                self.model.remove(&mk);
            }
        }
    }

    fn traverse(&mut self) -> Vec<(LuaValue, LuaValue)> {
        let mut seen = Vec::new();
        let mut key = LuaValue::nil();
        while let Some((k, v)) = self.vm.table_next(self.table, &key).unwrap() {
            seen.push((k, v));
            key = k;
        }
        seen
    }
}

proptest! {
    #[test]
    fn prop_traversal_visits_live_keys_once(ops in ops_strategy()) {
        let mut h = Harness::new();
        for (key, value) in &ops {
            h.apply(key, *value);
        }

        let seen = h.traverse();
        prop_assert_eq!(seen.len(), h.model.len());
        for (i, (k, v)) in seen.iter().enumerate() {
            prop_assert!(!v.is_nil());
            prop_assert!(seen[..i].iter().all(|(other, _)| !other.raw_equal(k)));
            prop_assert_eq!(h.vm.raw_get(h.table, k), *v);
        }
    }

    #[test]
    fn prop_lookup_matches_model(ops in ops_strategy()) {
        let mut h = Harness::new();
        for (key, value) in &ops {
            h.apply(key, *value);
        }

        for (key, _) in &ops {
            let (k, mk) = h.key(key);
            let expected = h.model.get(&mk).copied().unwrap_or_default();
            prop_assert_eq!(h.vm.raw_get(h.table, &k), expected);
        }
    }

    #[test]
    fn prop_growth_keeps_every_key(n in 1usize..2000) {
        let mut h = Harness::new();
        for i in 0..n {
            h.apply(&Key::Int(i as i64), Some(i as i64 * 3));
        }

        let capacity = h.vm.table_ref(h.table).map_or(0, |t| t.capacity());
        prop_assert!(capacity.is_power_of_two());
        prop_assert!(capacity >= n);
        for i in 0..n {
            prop_assert_eq!(h.vm.raw_geti(h.table, i as i64), LuaValue::integer(i as i64 * 3));
        }
        prop_assert_eq!(h.vm.table_len(h.table), n - 1);
    }
}
