//! Flush Protocol Tests
//!
//! - sequence of resync, hooks and commit
//! - empty-cell flush
//! - hook rebinding and teardown

use crate::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use streamstate::{CellState, ScalarStateCell, Shared};

/// Value-like cells: flushing -> commit -> flushed, no resync
#[test]
fn test_value_like_flush_order() {
    init_tracing();
    let store = ProbeStore::new();
    let mut cell = ScalarStateCell::<i64>::new(&store, key("ordered"));
    cell.on_flushing(|| store.record("on_flushing"));
    cell.on_flushed(|| store.record("on_flushed"));

    cell.set_value(5).unwrap();
    store.clear_events();
    cell.flush().unwrap();

    assert_eq!(store.events(), vec!["on_flushing", "commit", "on_flushed"]);
}

/// Reference-like cells: resync strictly precedes on_flushing
#[test]
fn test_reference_like_flush_order() {
    init_tracing();
    let store = ProbeStore::new();
    let mut cell = ScalarStateCell::<Shared<Vec<i64>>>::new(&store, key("ordered"));
    cell.on_flushing(|| store.record("on_flushing"));
    cell.on_flushed(|| store.record("on_flushed"));

    cell.set_value(Shared::new(vec![1])).unwrap();
    store.clear_events();
    cell.flush().unwrap();

    assert_eq!(
        store.events(),
        vec!["set", "on_flushing", "commit", "on_flushed"]
    );
}

/// on_flushing observes the resynced value in the store
#[test]
fn test_on_flushing_sees_resynced_value() {
    let store = ProbeStore::new();
    let seen = RefCell::new(None);
    let k = key("observed");
    let mut cell = ScalarStateCell::<Shared<Vec<i64>>>::new(&store, k.clone());
    cell.on_flushing(|| *seen.borrow_mut() = store.staged::<Vec<i64>>(&k));

    let value = Shared::new(vec![1]);
    cell.set_value(value.clone()).unwrap();
    value.lock().push(2);
    cell.flush().unwrap();
    drop(cell);

    assert_eq!(seen.into_inner(), Some(vec![1, 2]));
}

/// Flushing an empty cell fires both hooks and commits nothing
#[test]
fn test_empty_flush_fires_hooks_only() {
    let store = ProbeStore::new();
    let mut cell = ScalarStateCell::<Shared<String>>::new(&store, key("empty"));
    cell.on_flushing(|| store.record("on_flushing"));
    cell.on_flushed(|| store.record("on_flushed"));

    cell.flush().unwrap();

    assert_eq!(store.events(), vec!["on_flushing", "on_flushed"]);
    assert_eq!(cell.state(), CellState::Empty);
}

/// Flush without hooks still commits
#[test]
fn test_flush_without_hooks() {
    test_across_stores(|store| {
        let mut cell = ScalarStateCell::<String>::new(store, key("plain"));
        assert!(!cell.has_on_flushing());
        assert!(!cell.has_on_flushed());

        cell.set_value("v".to_string()).unwrap();
        cell.flush().unwrap();
        assert_eq!(committed::<String>(store, cell.key()).as_deref(), Some("v"));
    });
}

/// A loaded, unchanged value is committed again without harm
#[test]
fn test_flush_after_load() {
    test_across_stores(|store| {
        {
            let mut writer = ScalarStateCell::<u32>::new(store, key("loaded"));
            writer.set_value(8).unwrap();
            writer.flush().unwrap();
        }
        let mut cell = ScalarStateCell::<u32>::new(store, key("loaded"));
        assert_eq!(cell.value().unwrap(), 8);
        cell.flush().unwrap();
        assert_eq!(cell.state(), CellState::Flushed);
        assert_eq!(committed::<u32>(store, cell.key()), Some(8));
    });
}

/// Rebinding a hook replaces the previous one
#[test]
fn test_rebinding_replaces_hook() {
    let store = MemoryStore::new();
    let first = Cell::new(0);
    let second = Cell::new(0);
    let mut cell = ScalarStateCell::<i64>::new(&store, key("rebind"));

    cell.on_flushed(|| first.set(first.get() + 1));
    cell.flush().unwrap();
    cell.on_flushed(|| second.set(second.get() + 1));
    cell.flush().unwrap();
    cell.flush().unwrap();

    assert_eq!(first.get(), 1);
    assert_eq!(second.get(), 2);
}

/// The previous hook is dropped as soon as it is replaced
#[test]
fn test_rebinding_drops_previous_hook() {
    let store = MemoryStore::new();
    let token = Rc::new(());
    let mut cell = ScalarStateCell::<i64>::new(&store, key("drop"));

    let held = Rc::clone(&token);
    cell.on_flushing(move || {
        let _ = Rc::strong_count(&held);
    });
    assert_eq!(Rc::strong_count(&token), 2);

    cell.on_flushing(|| {});
    assert_eq!(Rc::strong_count(&token), 1);
}

/// Clearing a hook stops it from firing
#[test]
fn test_clear_hooks() {
    let store = MemoryStore::new();
    let fired = Cell::new(0);
    let mut cell = ScalarStateCell::<i64>::new(&store, key("clear"));
    cell.on_flushing(|| fired.set(fired.get() + 1));
    cell.on_flushed(|| fired.set(fired.get() + 10));

    cell.clear_on_flushing();
    cell.flush().unwrap();
    assert_eq!(fired.get(), 10);

    cell.clear_on_flushed();
    cell.flush().unwrap();
    assert_eq!(fired.get(), 10);

    cell.set_on_flushed(Some(Box::new(|| fired.set(fired.get() + 100))));
    cell.flush().unwrap();
    assert_eq!(fired.get(), 110);
}

/// Reset fires no hooks
#[test]
fn test_reset_fires_no_hooks() {
    let store = ProbeStore::new();
    let mut cell = ScalarStateCell::<i64>::new(&store, key("quiet"));
    cell.on_flushing(|| store.record("on_flushing"));
    cell.on_flushed(|| store.record("on_flushed"));

    cell.set_value(1).unwrap();
    store.clear_events();
    cell.reset().unwrap();

    assert_eq!(store.events(), vec!["discard"]);
}

/// dispose is idempotent and silences both hooks
#[test]
fn test_dispose_idempotent() {
    let store = MemoryStore::new();
    let fired = Cell::new(0);
    let mut cell = ScalarStateCell::<i64>::new(&store, key("dispose"));
    cell.on_flushing(|| fired.set(fired.get() + 1));
    cell.on_flushed(|| fired.set(fired.get() + 1));

    cell.dispose();
    cell.dispose();
    assert!(!cell.has_on_flushing());
    assert!(!cell.has_on_flushed());

    cell.set_value(3).unwrap();
    cell.flush().unwrap();
    assert_eq!(fired.get(), 0);
    assert_eq!(committed::<i64>(&store, cell.key()), Some(3));
}

/// dispose leaves the resync step in place
#[test]
fn test_dispose_keeps_resync() {
    let store = MemoryStore::new();
    let mut cell = ScalarStateCell::<Shared<i64>>::new(&store, key("resync"));
    cell.dispose();

    let value = Shared::new(1);
    cell.set_value(value.clone()).unwrap();
    value.replace(2);
    cell.flush().unwrap();

    let persisted: Shared<i64> = committed(&store, cell.key()).unwrap();
    assert_eq!(persisted.snapshot(), 2);
}

/// Dropping the cell releases its hooks
#[test]
fn test_drop_releases_hooks() {
    let store = MemoryStore::new();
    let token = Rc::new(());
    {
        let mut cell = ScalarStateCell::<i64>::new(&store, key("dropped"));
        let held = Rc::clone(&token);
        cell.on_flushed(move || {
            let _ = Rc::strong_count(&held);
        });
        assert_eq!(Rc::strong_count(&token), 2);
    }
    assert_eq!(Rc::strong_count(&token), 1);
}
