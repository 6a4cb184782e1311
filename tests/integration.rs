//! Integration tests for observed trees.

use nestwatch::{wrap, Action, Key, Node, Path, Raw, Value};
use serde_json::json;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Counts notifications and checks every reported path resolves.
#[derive(Default)]
struct Recorder {
    sets: Cell<usize>,
    deletes: Cell<usize>,
    last: RefCell<Option<(Path, Value, Action)>>,
}

impl Recorder {
    fn attach(owner: &Node) -> Rc<Recorder> {
        let recorder = Rc::new(Recorder::default());
        let sink = recorder.clone();
        let expected = owner.clone();
        owner.subscribe(move |root, path, value, action| {
            assert!(root.ptr_eq(&expected), "callback got a foreign root");
            match action {
                Action::Set => {
                    assert_eq!(root.resolve(path).as_ref(), Some(value), "path {:?}", path);
                    sink.sets.set(sink.sets.get() + 1);
                }
                Action::Delete => {
                    assert!(value.is_null());
                    assert!(root.resolve(path).is_none(), "path {:?}", path);
                    sink.deletes.set(sink.deletes.get() + 1);
                }
            }
            *sink.last.borrow_mut() = Some((path.to_vec(), value.clone(), action));
            Ok(())
        });
        recorder
    }

    fn sets(&self) -> usize {
        self.sets.get()
    }

    fn deletes(&self) -> usize {
        self.deletes.get()
    }

    fn last_path(&self) -> Path {
        self.last.borrow().as_ref().map(|(p, _, _)| p.clone()).unwrap_or_default()
    }
}

fn node(parent: &Node, key: &str) -> Node {
    parent.get(key).unwrap().as_node().unwrap().clone()
}

fn path(keys: &[&str]) -> Path {
    keys.iter().map(|k| Key::from(*k)).collect()
}

// --- Flat maps ---

#[test]
fn test_one_layered_pre_initialized() {
    let x = wrap(json!({"A": 1, "B": 2, "C": 3})).unwrap();
    let rec = Recorder::attach(&x);
    let id = x.subscription_ids()[0];

    x.set("A", 0).unwrap();
    assert_eq!(rec.sets(), 1);
    x.set("B", 4).unwrap();
    assert_eq!(rec.sets(), 2);
    x.set("C", -100).unwrap();
    assert_eq!(rec.sets(), 3);

    let a = x.get("A").unwrap().as_i64().unwrap();
    x.set("A", a + 1).unwrap();
    assert_eq!(rec.sets(), 4);

    x.unsubscribe(id);
    x.set("B", 25).unwrap();
    assert_eq!(rec.sets(), 4);
}

#[test]
fn test_one_layered_initially_empty() {
    let x = wrap(json!({})).unwrap();
    let rec = Recorder::attach(&x);
    let id = x.subscription_ids()[0];

    for (i, key) in ["A", "B", "C"].iter().enumerate() {
        x.set(*key, i as i64).unwrap();
    }
    assert_eq!(rec.sets(), 3);

    x.unsubscribe(id);
    x.set("B", 25).unwrap();
    x.set("D", 98).unwrap();
    assert_eq!(rec.sets(), 3);
}

#[test]
fn test_fan_out_to_multiple_subscribers() {
    let x = wrap(json!({})).unwrap();
    let sub_count = 10;
    let recorders: Vec<_> = (0..sub_count).map(|_| Recorder::attach(&x)).collect();
    let total = || recorders.iter().map(|r| r.sets()).sum::<usize>();
    let mut ids = x.subscription_ids();

    x.set("A", 0).unwrap();
    assert_eq!(total(), sub_count);
    x.set("B", 4).unwrap();
    assert_eq!(total(), 2 * sub_count);
    assert!(recorders.iter().all(|r| r.sets() == 2));

    for _ in 0..3 {
        x.unsubscribe(ids.pop().unwrap());
    }
    x.set("B", 25).unwrap();
    assert_eq!(total(), 2 * sub_count + (sub_count - 3));

    for id in ids {
        x.unsubscribe(id);
    }
    x.set("D", 98).unwrap();
    assert_eq!(total(), 2 * sub_count + (sub_count - 3));
}

#[test]
fn test_one_layered_delete() {
    let x = wrap(json!({"A": 1, "B": 2, "C": 3})).unwrap();
    let rec = Recorder::attach(&x);
    let id = x.subscription_ids()[0];

    x.delete("A").unwrap();
    assert_eq!(rec.deletes(), 1);
    assert_eq!(rec.sets(), 0);
    assert!(!x.contains_key("A"));

    x.delete("B").unwrap();
    assert_eq!(rec.deletes(), 2);
    assert_eq!(rec.last_path(), path(&["B"]));

    x.unsubscribe(id);
    x.delete("C").unwrap();
    assert_eq!(rec.deletes(), 2);
    assert!(!x.contains_key("C"));
}

// --- Nested maps ---

#[test]
fn test_nested_set_reports_full_path() {
    let x = wrap(json!({"A": {"B": 1}})).unwrap();
    let rec = Recorder::attach(&x);

    node(&x, "A").set("B", 10).unwrap();
    assert_eq!(rec.sets(), 1);
    assert_eq!(rec.last_path(), path(&["A", "B"]));
}

#[test]
fn test_multi_layered_general() {
    let x = wrap(json!({"A": {"B": 1, "C": {"D": 10}}, "E": {"F": 30}})).unwrap();
    let rec = Recorder::attach(&x);
    let id = x.subscription_ids()[0];

    node(&x, "A").set("B", 10).unwrap();
    assert_eq!(rec.sets(), 1);
    node(&node(&x, "A"), "C").set("D", 25).unwrap();
    assert_eq!(rec.sets(), 2);

    let m = node(&x, "A");
    m.set("B", 35).unwrap();
    assert_eq!(node(&x, "A").get("B"), Some(Value::Int(35)));
    assert_eq!(rec.sets(), 3);

    m.set("B", json!({"GREG": 28})).unwrap();
    assert_eq!(node(&x, "A").get("B"), m.get("B"));
    assert_eq!(rec.sets(), 4);

    node(&m, "B").set("GREG", 29).unwrap();
    assert_eq!(rec.sets(), 5);
    assert_eq!(rec.last_path(), path(&["A", "B", "GREG"]));

    // A fresh, unrelated map is not observed.
    let g = m;
    let m = wrap(json!({})).unwrap();
    m.set("NO", "YES").unwrap();
    assert_eq!(rec.sets(), 5);

    g.set("NO", "YES").unwrap();
    assert_eq!(rec.sets(), 6);
    g.set("NO", "YES").unwrap();
    assert_eq!(rec.sets(), 6);

    node(&x, "A").set("NO", "Maybe").unwrap();
    assert_eq!(rec.sets(), 7);
    node(&x, "E").set("F", "39").unwrap();
    assert_eq!(rec.sets(), 8);

    x.unsubscribe(id);
    node(&x, "E").set("F", "12").unwrap();
    assert_eq!(rec.sets(), 8);
    assert_eq!(node(&x, "E").subscription_count(), 0);
}

#[test]
fn test_multi_layered_delete() {
    let x = wrap(json!({"A": {"B": 1, "C": {"D": 10, "G": 32}, "J": 67}, "E": {"F": 30}}))
        .unwrap();
    let rec = Recorder::attach(&x);

    node(&x, "A").delete("B").unwrap();
    assert_eq!(rec.deletes(), 1);
    assert!(!node(&x, "A").contains_key("B"));

    node(&node(&x, "A"), "C").set("D", 98).unwrap();
    assert_eq!(rec.sets(), 1);

    let b = node(&x, "A");
    let c = node(&b, "C");
    x.delete("A").unwrap();
    assert_eq!(rec.deletes(), 2);
    assert!(!x.contains_key("A"));

    // The removed subtree no longer reaches the observer.
    b.set("D", 97).unwrap();
    c.set("G", 1).unwrap();
    assert_eq!(rec.sets(), 1);
    assert_eq!(b.subscription_count(), 0);
    assert_eq!(c.subscription_count(), 0);
}

#[test]
fn test_late_attachment_of_existing_node() {
    let m = wrap(json!({"Z": 1})).unwrap();
    let x = wrap(json!({})).unwrap();
    let rec = Recorder::attach(&x);

    x.set("K", &m).unwrap();
    node(&x, "K").set("Z", 2).unwrap();

    assert_eq!(rec.sets(), 2);
    assert_eq!(rec.last_path(), path(&["K", "Z"]));
    assert_eq!(m.get("Z"), Some(Value::Int(2)));
}

// --- Moves, sharing and cycles ---

#[test]
fn test_in_object_moves() {
    let x = wrap(json!({"A": {"B": 1, "C": {"D": 10, "G": 32}, "J": 67}, "E": {"F": 30}}))
        .unwrap();
    let rec = Recorder::attach(&x);
    let id = x.subscription_ids()[0];

    let m = node(&node(&x, "A"), "C");
    x.set("H", 98).unwrap();
    assert_eq!(rec.sets(), 1);

    x.set("H", &m).unwrap();
    assert_eq!(rec.sets(), 2);
    assert_eq!(m.subscription_path(id), Some(path(&["H"])));

    node(&x, "H").set("D", 99).unwrap();
    assert_eq!(rec.sets(), 3);
    assert_eq!(rec.last_path(), path(&["H", "D"]));

    node(&x, "A").set("C", 45).unwrap();
    assert_eq!(rec.sets(), 4);

    node(&x, "H").set("D", 73).unwrap();
    assert_eq!(rec.sets(), 5);

    x.set("N", 42).unwrap();
    assert_eq!(rec.sets(), 6);

    // Self reference.
    x.set("N", &x).unwrap();
    assert_eq!(rec.sets(), 7);
    assert_eq!(rec.last_path(), path(&["N"]));
    assert_eq!(x.subscription_path(id), Some(vec![]));

    let deep = node(&node(&node(&x, "N"), "N"), "N");
    deep.set("N", 10).unwrap();
    assert_eq!(rec.sets(), 8);
    assert_eq!(x.get("N"), Some(Value::Int(10)));

    // Cycle through an inner node.
    node(&x, "A").set("B", &x).unwrap();
    assert_eq!(rec.sets(), 9);
    let inner = node(&node(&node(&x, "A"), "B"), "A");
    inner.set("B", 29).unwrap();
    assert_eq!(rec.sets(), 10);

    x.unsubscribe(id);
    assert_eq!(m.subscription_count(), 0);
}

#[test]
fn test_self_reference_terminates() {
    let x = wrap(json!({})).unwrap();
    let rec = Recorder::attach(&x);

    x.set("N", &x).unwrap();
    assert_eq!(rec.sets(), 1);
    assert_eq!(rec.last_path(), path(&["N"]));

    node(&x, "N").set("N", 10).unwrap();
    assert_eq!(rec.sets(), 2);
    assert_eq!(x.resolve(&rec.last_path()), Some(Value::Int(10)));
}

#[test]
fn test_reassignment_reanchors() {
    let x = wrap(json!({"A": {"inner": {"v": 0}}, "B": {}})).unwrap();
    let rec = Recorder::attach(&x);
    let inner = node(&node(&x, "A"), "inner");

    node(&x, "B").set("moved", &inner).unwrap();
    assert_eq!(rec.sets(), 1);

    // Reached through the old location, reported at the new one.
    let via_old = node(&node(&x, "A"), "inner");
    via_old.set("v", 1).unwrap();
    assert_eq!(rec.sets(), 2);
    assert_eq!(rec.last_path(), path(&["B", "moved", "v"]));
}

#[test]
fn test_deleting_moved_value_detaches_it() {
    let x = wrap(json!({"A": {"B": 1, "C": {"D": 10, "G": 32}, "J": 67}, "E": {"F": 30}}))
        .unwrap();
    let rec = Recorder::attach(&x);

    let m = node(&node(&x, "A"), "C");
    x.set("H", 98).unwrap();
    x.set("H", &m).unwrap();
    node(&x, "H").set("D", 99).unwrap();
    assert_eq!(rec.sets(), 3);

    // One cached path per subscription: dropping the newest anchor drops
    // the subscription from `m`, even though A.C still holds it.
    x.delete("H").unwrap();
    node(&node(&x, "A"), "C").set("D", 120).unwrap();
    assert_eq!(rec.sets(), 3);
    assert_eq!(rec.deletes(), 1);

    // An identical write is a no-op and does not re-anchor; a real one does.
    node(&x, "A").set("C", &m).unwrap();
    assert_eq!(rec.sets(), 3);
    node(&x, "A").set("C", 0).unwrap();
    node(&x, "A").set("C", &m).unwrap();
    m.set("D", 121).unwrap();
    assert_eq!(rec.last_path(), path(&["A", "C", "D"]));
}

#[test]
fn test_moves_with_multiple_roots() {
    let x = wrap(json!({"A": {"B": 1, "C": {"D": 10, "G": 32}, "J": 67}, "E": {"F": 30}}))
        .unwrap();
    let rec_x = Recorder::attach(&x);

    let m = wrap(json!({"Z": 1})).unwrap();
    let rec_m = Recorder::attach(&m);
    m.set("L", json!({"T": 98})).unwrap();
    assert_eq!(rec_m.sets(), 1);

    node(&x, "A").set("J", &m).unwrap();
    assert_eq!(rec_x.sets(), 1);
    assert_eq!(rec_m.sets(), 1);
    assert_eq!(node(&node(&x, "A"), "J"), m);

    node(&m, "L").set("T", 99).unwrap();
    assert_eq!(rec_x.sets(), 2);
    assert_eq!(rec_m.sets(), 2);
    assert_eq!(rec_x.last_path(), path(&["A", "J", "L", "T"]));
    assert_eq!(rec_m.last_path(), path(&["L", "T"]));
}

#[test]
fn test_shared_value_reports_latest_path() {
    let x = wrap(json!({"left": {}, "right": {}})).unwrap();
    let rec = Recorder::attach(&x);
    let shared = wrap(json!({"n": 0})).unwrap();

    node(&x, "left").set("s", &shared).unwrap();
    node(&x, "right").set("s", &shared).unwrap();

    shared.set("n", 1).unwrap();
    assert_eq!(rec.sets(), 3);
    assert_eq!(rec.last_path(), path(&["right", "s", "n"]));

    // Replacing the older anchor leaves the newer one alone.
    node(&x, "left").set("s", 0).unwrap();
    shared.set("n", 2).unwrap();
    assert_eq!(rec.sets(), 5);
    assert_eq!(rec.last_path(), path(&["right", "s", "n"]));
}

// --- Sequences ---

#[test]
fn test_sequences_inside_maps() {
    let x = wrap(json!({"items": [{"name": "a"}, {"name": "b"}]})).unwrap();
    let rec = Recorder::attach(&x);
    let items = node(&x, "items");

    items.append(Raw::map([("name", "c")])).unwrap();
    assert_eq!(rec.last_path(), vec![Key::from("items"), Key::Index(2)]);

    let third = items.get(2usize).unwrap().as_node().unwrap().clone();
    third.set("name", "C").unwrap();
    assert_eq!(
        rec.last_path(),
        vec![Key::from("items"), Key::Index(2), Key::from("name")]
    );

    items.delete(0usize).unwrap();
    assert_eq!(rec.deletes(), 1);
    third.set("name", "CC").unwrap();
    assert_eq!(
        rec.last_path(),
        vec![Key::from("items"), Key::Index(1), Key::from("name")]
    );

    items.extend([json!(1), json!([2, 3])]).unwrap();
    assert_eq!(items.len(), 4);
    let popped = items.pop().unwrap();
    assert_eq!(popped.as_node().unwrap().len(), 2);
    assert_eq!(popped.as_node().unwrap().subscription_count(), 0);
}

// --- Re-entrant callbacks ---

#[test]
fn test_callback_may_mutate_tree() {
    let x = wrap(json!({"celsius": 0, "fahrenheit": 32})).unwrap();
    let rec = Recorder::attach(&x);

    x.subscribe(|root, path, value, action| {
        if action == Action::Set && path == [Key::from("celsius")] {
            let c = value.as_f64().unwrap_or_default();
            root.set("fahrenheit", c * 9.0 / 5.0 + 32.0)?;
        }
        Ok(())
    });

    x.set("celsius", 100).unwrap();
    assert_eq!(x.get("fahrenheit"), Some(Value::Float(212.0)));
    assert_eq!(rec.sets(), 2);
}

#[test]
fn test_tracing_subscriber_can_observe() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();

    let x = wrap(json!({"A": {"B": 1}})).unwrap();
    let id = x.subscribe(|_, _, _, _| Ok(()));
    node(&x, "A").set("B", 2).unwrap();
    x.set("A", 0).unwrap();
    x.unsubscribe(id);
}
