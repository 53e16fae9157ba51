//! Property Tests
//!
//! Random operation sequences checked against a two-value model:
//! `committed` (what the store made durable) and `visible` (what `value()`
//! must return).

use crate::*;
use proptest::prelude::*;
use std::cell::Cell;
use streamstate::ScalarStateCell;

#[derive(Debug, Clone)]
enum Op {
    Set(i64),
    Flush,
    Reset,
    Read,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => any::<i64>().prop_map(Op::Set),
        2 => Just(Op::Flush),
        1 => Just(Op::Reset),
        2 => Just(Op::Read),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// value() always matches the model, whatever the operation order
    #[test]
    fn cell_matches_model(ops in prop::collection::vec(op(), 1..40), default in any::<i64>()) {
        let store = MemoryStore::new();
        let mut cell = ScalarStateCell::with_default(&store, key("model"), move || default);
        let mut committed_model: Option<i64> = None;
        let mut visible: Option<i64> = None;

        for op in ops {
            match op {
                Op::Set(v) => {
                    cell.set_value(v).unwrap();
                    visible = Some(v);
                }
                Op::Flush => {
                    cell.flush().unwrap();
                    if visible.is_some() {
                        committed_model = visible;
                    }
                }
                Op::Reset => {
                    cell.reset().unwrap();
                    visible = committed_model;
                }
                Op::Read => {
                    prop_assert_eq!(cell.value().unwrap(), visible.unwrap_or(default));
                }
            }
        }

        prop_assert_eq!(committed::<i64>(&store, cell.key()), committed_model);
    }

    /// Two reads of an empty cell call the factory twice and store nothing
    #[test]
    fn default_never_persisted(reads in 1usize..10) {
        let store = MemoryStore::new();
        let calls = Cell::new(0usize);
        let mut cell = ScalarStateCell::with_default(&store, key("default"), || {
            calls.set(calls.get() + 1);
            String::from("d")
        });
        for _ in 0..reads {
            prop_assert_eq!(cell.value().unwrap(), "d");
        }
        prop_assert_eq!(calls.get(), reads);
        prop_assert!(store.get(cell.key()).unwrap().is_none());
    }

    /// Committed bytes always decode to the last flushed value, in either encoding
    #[test]
    fn flush_persists_last_value(values in prop::collection::vec(".{0,16}", 1..10), json in any::<bool>()) {
        let store = MemoryStore::new();
        let encoding = if json { Encoding::Json } else { Encoding::MessagePack };
        let mut cell = ScalarStateCell::<String>::new(&store, key("strings")).with_encoding(encoding);
        for v in &values {
            cell.set_value(v.clone()).unwrap();
        }
        cell.flush().unwrap();

        let raw = store.get_committed(cell.key()).unwrap().unwrap();
        let decoded: String = encoding.decode(&raw).unwrap();
        prop_assert_eq!(Some(&decoded), values.last());
    }
}
