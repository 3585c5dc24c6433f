use std::cell::{Cell, RefCell};
use std::rc::Rc;

use pathstore::{Notification, Path, PathError, SetOptions, Store, StoreConfig, StoreError};
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct Recorder {
    calls: Rc<RefCell<Vec<Notification>>>,
}

impl Recorder {
    fn callback(&self) -> impl Fn(&Notification) + 'static {
        let calls = Rc::clone(&self.calls);
        move |n| calls.borrow_mut().push(n.clone())
    }

    fn count(&self) -> usize {
        self.calls.borrow().len()
    }

    fn clear(&self) {
        self.calls.borrow_mut().clear();
    }

    fn states(&self) -> Vec<Value> {
        self.calls.borrow().iter().map(|n| (*n.state).clone()).collect()
    }
}

fn path(json: Value) -> Path {
    Path::from_json(&json).unwrap()
}

#[test]
fn test_scenario_nested_write_and_parent_subscriber() {
    let store = Store::new();
    store.set(Path::root(), json!({"a": 1})).unwrap();
    assert_eq!(store.get(Path::root()).unwrap(), Some(json!({"a": 1})));
    store.set(["b", "c"], json!("d")).unwrap();
    assert_eq!(
        store.get(Path::root()).unwrap(),
        Some(json!({"a": 1, "b": {"c": "d"}}))
    );

    let sub = Recorder::default();
    store.subscribe(["b"], sub.callback()).unwrap();
    store.set(["b", "c"], json!("e")).unwrap();
    assert_eq!(sub.count(), 1);
    assert_eq!(sub.states(), vec![json!({"a": 1, "b": {"c": "e"}})]);
}

#[test]
fn test_get_reads_nested_values_and_absent_marker() {
    let store = Store::new();
    store
        .set(Path::root(), json!({"a": 1, "b": {"c": "d"}, "e": ["f", "g", "h"]}))
        .unwrap();
    assert_eq!(store.get(["a"]).unwrap(), Some(json!(1)));
    assert_eq!(store.get(["b", "c"]).unwrap(), Some(json!("d")));
    assert_eq!(store.get(&json!(["e", 1])).unwrap(), Some(json!("g")));
    assert_eq!(store.get(&json!(["e", 4])).unwrap(), None);
    assert_eq!(store.get(["z"]).unwrap(), None);
    assert_eq!(store.get(["z", "y", "x"]).unwrap(), None);
}

#[test]
fn test_subscriptions_fire_for_ancestor_self_and_descendant_writes() {
    let store = Store::new();
    let sub1 = Recorder::default();
    let sub2 = Recorder::default();
    let sub3 = Recorder::default();
    store.subscribe(["a"], sub1.callback()).unwrap();
    store.subscribe(["c"], sub2.callback()).unwrap();
    store.subscribe(["a", "b"], sub3.callback()).unwrap();

    store.set(["a"], json!("b")).unwrap();
    store.set(["c"], json!("cv")).unwrap();
    store.set(["a", "b", "c"], json!("x")).unwrap();
    store.set(["a", "d", "c"], json!("x")).unwrap();

    assert_eq!(sub1.count(), 3);
    assert_eq!(sub2.count(), 1);
    assert_eq!(sub3.count(), 2);
}

#[test]
fn test_root_subscriber_sees_every_write() {
    let store = Store::new();
    let sub = Recorder::default();
    store.subscribe(Path::root(), sub.callback()).unwrap();
    store.set(["a"], json!("b")).unwrap();
    store.set(["c"], json!("cv")).unwrap();
    store.set(["a", "b", "c"], json!("x")).unwrap();
    store.set(["a", "d", "c"], json!("x")).unwrap();
    store.set(Path::root(), json!({"a": "b"})).unwrap();
    assert_eq!(sub.count(), 5);
}

#[test]
fn test_disjoint_subtree_is_not_notified() {
    let store = Store::new();
    let sub = Recorder::default();
    store.subscribe(["a", "b"], sub.callback()).unwrap();
    store.set(["c"], json!(1)).unwrap();
    store.set(["a", "x"], json!(1)).unwrap();
    assert_eq!(sub.count(), 0);
}

#[test]
fn test_overlapping_subscribers_fire_once_per_set() {
    let store = Store::new();
    let s1 = Recorder::default();
    let s2 = Recorder::default();
    store.subscribe(Path::root(), s1.callback()).unwrap();
    store.subscribe(["a"], s2.callback()).unwrap();
    store.set(["a"], json!("x")).unwrap();
    store.set(["a", "d"], json!("y")).unwrap();
    assert_eq!(s1.count(), 2);
    assert_eq!(s2.count(), 2);
}

#[test]
fn test_unsubscribe() {
    let store = Store::new();
    let sub1 = Recorder::default();
    let sub2 = Recorder::default();
    let sub3 = Recorder::default();
    let unsub1 = store.subscribe(Path::root(), sub1.callback()).unwrap();
    let unsub2 = store.subscribe(["a"], sub2.callback()).unwrap();
    let unsub3 = store.subscribe(Path::root(), sub3.callback()).unwrap();

    store.set(["a"], json!("b")).unwrap();
    assert_eq!((sub1.count(), sub2.count(), sub3.count()), (1, 1, 1));

    unsub2.unsubscribe();
    store.set(["a"], json!("d")).unwrap();
    assert_eq!((sub1.count(), sub2.count(), sub3.count()), (2, 1, 2));

    unsub1.unsubscribe();
    store.set(["e"], json!("f")).unwrap();
    assert_eq!((sub1.count(), sub2.count(), sub3.count()), (2, 1, 3));

    unsub3.unsubscribe();
    store.set(["g"], json!("h")).unwrap();
    assert_eq!((sub1.count(), sub2.count(), sub3.count()), (2, 1, 3));
    assert!(store.subscribers().is_empty());
}

#[test]
fn test_double_unsubscribe_is_noop() {
    let store = Store::new();
    let first = Recorder::default();
    let second = Recorder::default();
    let handle = store.subscribe(["a"], first.callback()).unwrap();
    store.subscribe(["a"], second.callback()).unwrap();

    handle.unsubscribe();
    handle.unsubscribe();
    assert!(!handle.is_active());
    assert_eq!(store.subscribers().count_at(&path(json!(["a"]))), 1);

    store.set(["a"], json!(1)).unwrap();
    assert_eq!(first.count(), 0);
    assert_eq!(second.count(), 1);
}

#[test]
fn test_same_callback_subscribed_twice_unsubscribes_separately() {
    let store = Store::new();
    let count = Rc::new(Cell::new(0));
    let inner = Rc::clone(&count);
    let shared: pathstore::Subscriber = Rc::new(move |_: &Notification| inner.set(inner.get() + 1));
    let at_root = store.subscribe_shared(Path::root(), Rc::clone(&shared)).unwrap();
    store.subscribe_shared(["a"], shared).unwrap();

    store.set(["a"], json!(1)).unwrap();
    assert_eq!(count.get(), 1);

    at_root.unsubscribe();
    store.set(["a"], json!(2)).unwrap();
    assert_eq!(count.get(), 2);
    store.set(["b"], json!(2)).unwrap();
    assert_eq!(count.get(), 2);
}

#[test]
fn test_batched_writes_flush_together() {
    let store = Store::new();
    let root = Recorder::default();
    store.subscribe(Path::root(), root.callback()).unwrap();

    store
        .set_with(["a"], json!(1), SetOptions::new().no_publish())
        .unwrap();
    assert_eq!(root.count(), 0);
    assert_eq!(store.get(["a"]).unwrap(), Some(json!(1)));

    store.set(["b"], json!(2)).unwrap();
    assert_eq!(root.count(), 2);
    for state in root.states() {
        assert_eq!(state, json!({"a": 1, "b": 2}));
    }
    let calls = root.calls.borrow();
    assert_eq!(calls[0].path, path(json!(["a"])));
    assert_eq!(*calls[0].old_state, json!({}));
    assert_eq!(calls[1].path, path(json!(["b"])));
    assert_eq!(*calls[1].old_state, json!({"a": 1}));
}

#[test]
fn test_batched_change_only_reaches_its_own_subscribers() {
    let store = Store::new();
    let a = Recorder::default();
    let b = Recorder::default();
    store.subscribe(["a"], a.callback()).unwrap();
    store.subscribe(["b"], b.callback()).unwrap();
    store
        .set_with(["a"], json!(1), SetOptions::new().no_publish())
        .unwrap();
    store
        .set_with(["a"], json!(2), SetOptions::new().no_publish())
        .unwrap();
    store.set(["b"], json!(3)).unwrap();
    assert_eq!(a.count(), 2);
    assert_eq!(b.count(), 1);
}

#[test]
fn test_identifier_is_forwarded() {
    let store = Store::new();
    let sub = Recorder::default();
    store.subscribe(Path::root(), sub.callback()).unwrap();
    store
        .set_with(["a"], json!(1), SetOptions::new().no_publish())
        .unwrap();
    store
        .set_with(["b"], json!(2), SetOptions::new().identifier("save"))
        .unwrap();
    store
        .set_with(["c"], json!(3), SetOptions::new().identifier("own").no_publish())
        .unwrap();
    assert_eq!(store.pending_changes()[0].identifier.as_deref(), Some("own"));
    store
        .set_with(["d"], json!(4), SetOptions::new().identifier("flush"))
        .unwrap();
    store
        .set_with(["e"], json!(5), SetOptions::new().identifier("queued").no_publish())
        .unwrap();
    store.set(["f"], json!(6)).unwrap();
    let identifiers: Vec<Option<String>> =
        sub.calls.borrow().iter().map(|n| n.identifier.clone()).collect();
    assert_eq!(
        identifiers,
        vec![
            Some("save".to_string()),
            Some("save".to_string()),
            Some("flush".to_string()),
            Some("flush".to_string()),
            None,
            None
        ]
    );
}

#[test]
fn test_notification_carries_value_and_old_state() {
    let store = Store::new();
    store.set(["n"], json!(1)).unwrap();
    let sub = Recorder::default();
    store.subscribe(["n"], sub.callback()).unwrap();
    store.set(["n"], json!(2)).unwrap();
    store.remove(["n"]).unwrap();

    let calls = sub.calls.borrow();
    assert_eq!(calls[0].value, Some(json!(2)));
    assert_eq!(*calls[0].old_state, json!({"n": 1}));
    assert_eq!(calls[1].value, None);
    assert_eq!(*calls[1].state, json!({}));
}

#[test]
fn test_remove_in_arrays_leaves_hole() {
    let store = Store::new();
    store.set(["l"], json!([1, 2, 3])).unwrap();
    store.remove("/l/1").unwrap();
    assert_eq!(store.get(["l"]).unwrap(), Some(json!([1, null, 3])));
    store.remove(["l"]).unwrap();
    assert_eq!(*store.state(), json!({}));
}

#[test]
fn test_invalid_paths_fail_fast() {
    let store = Store::new();
    let sub = Recorder::default();
    store.subscribe(Path::root(), sub.callback()).unwrap();

    let err = store.set(&json!(["a", -1]), json!(1)).unwrap_err();
    assert!(matches!(err, StoreError::Path(_)));
    assert!(store.set(&json!(["a", 1.5]), json!(1)).is_err());
    assert!(store.set(&json!(["a", true]), json!(1)).is_err());
    assert!(store.get(&json!([null])).is_err());
    assert!(store.subscribe("no-slash", |_| {}).is_err());

    let err = store.set(&json!(["a", u64::MAX]), json!(1)).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Path(PathError::IndexTooLarge { .. })
    ));
    assert!(store.set("/a/99999999999", json!(1)).is_err());
    assert!(store.set(["a", "99999999999"], json!(1)).is_err());
    assert!(store.update(&json!([u64::MAX]), |_| Some(json!(1)), SetOptions::new()).is_err());

    assert_eq!(sub.count(), 0);
    assert_eq!(*store.state(), json!({}));
}

#[test]
fn test_array_index_limit_is_configurable() {
    let store = Store::with_config(StoreConfig {
        max_array_index: 3,
        ..StoreConfig::default()
    });
    store.set(&json!(["l", 3]), json!("last")).unwrap();
    assert_eq!(store.get(["l"]).unwrap(), Some(json!([null, null, null, "last"])));

    let err = store.set(&json!(["l", 4]), json!("over")).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Path(PathError::IndexTooLarge { index: 4, max: 3 })
    ));
    assert!(store.get(&json!(["l", 4])).is_err());
    assert_eq!(store.get(["l"]).unwrap(), Some(json!([null, null, null, "last"])));
}

#[test]
fn test_stores_are_isolated() {
    let one = Store::new();
    let two = Store::new();
    let sub = Recorder::default();
    two.subscribe(Path::root(), sub.callback()).unwrap();
    one.set(["a"], json!(1)).unwrap();
    assert_eq!(two.get(["a"]).unwrap(), None);
    assert_eq!(sub.count(), 0);
}

#[test]
fn test_descendant_write_reaches_parent_subscriber() {
    let store = Store::new();
    let sub = Recorder::default();
    store.subscribe(["x"], sub.callback()).unwrap();
    store.set(["x"], json!(1)).unwrap();
    sub.clear();
    store.set(["x", "y"], json!(1)).unwrap();
    assert_eq!(sub.count(), 1);
}
