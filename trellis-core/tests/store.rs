//! Integration Tests for Mutable Stores
//!
//! End-to-end behaviour of proxies over nested plain data.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::{Duration, SystemTime};

use serde_json::json;
use trellis_core::store::{
    create_mutable, is_wrappable, unwrap, wrap, Accessor, Array, MutableObject, Object, Value,
    RAW_KEY,
};
use trellis_core::{batch, create_computed, create_memo, create_root, Error};

fn object_state(json: serde_json::Value) -> MutableObject {
    create_mutable(json).unwrap().into_object().unwrap()
}

fn number(value: Value) -> f64 {
    value.as_f64().unwrap_or(f64::NAN)
}

#[test]
fn wrapping_twice_gives_the_same_proxy() {
    let target = Value::from(Object::new().with("a", 1));
    assert!(is_wrappable(&target));
    assert_eq!(wrap(target.clone()), wrap(target.clone()));

    let state = object_state(json!({"nested": {"deep": true}}));
    assert_eq!(state.get("nested").unwrap(), state.get("nested").unwrap());
}

#[test]
fn nested_property_write_reruns_exactly_once() {
    create_root(|_| {
        let state = object_state(json!({"data": 2}));
        let seen = Rc::new(RefCell::new(Vec::new()));

        let (state_c, seen_c) = (state.clone(), seen.clone());
        create_computed(move || {
            seen_c.borrow_mut().push(number(state_c.get("data")?));
            Ok(())
        })
        .unwrap();

        state.set("data", 5).unwrap();
        assert_eq!(*seen.borrow(), vec![2.0, 5.0]);

        state.set("data", 5).unwrap();
        assert_eq!(*seen.borrow(), vec![2.0, 5.0]);
    });
}

#[test]
fn deep_writes_only_rerun_readers_of_that_path() {
    create_root(|_| {
        let state = object_state(json!({"user": {"name": "Ada", "age": 36}, "theme": "dark"}));
        let name_runs = Rc::new(Cell::new(0));
        let theme_runs = Rc::new(Cell::new(0));

        let (state_c, runs_c) = (state.clone(), name_runs.clone());
        create_computed(move || {
            let user = state_c.get("user")?;
            if let Some(user) = user.as_mutable_object() {
                user.get("name")?;
            }
            runs_c.set(runs_c.get() + 1);
            Ok(())
        })
        .unwrap();

        let (state_c, runs_c) = (state.clone(), theme_runs.clone());
        create_computed(move || {
            state_c.get("theme")?;
            runs_c.set(runs_c.get() + 1);
            Ok(())
        })
        .unwrap();

        let user = state.get("user").unwrap();
        let user = user.as_mutable_object().unwrap();
        user.set("age", 37).unwrap();
        assert_eq!((name_runs.get(), theme_runs.get()), (1, 1));

        user.set("name", "Grace").unwrap();
        assert_eq!((name_runs.get(), theme_runs.get()), (2, 1));

        state.set("theme", "light").unwrap();
        assert_eq!((name_runs.get(), theme_runs.get()), (2, 2));
    });
}

#[test]
fn push_tracks_length_and_new_index() {
    create_root(|_| {
        let state = object_state(json!({"todos": []}));
        let lengths = Rc::new(RefCell::new(Vec::new()));
        let newest = Rc::new(RefCell::new(Vec::new()));

        let (state_c, lengths_c, newest_c) = (state.clone(), lengths.clone(), newest.clone());
        create_computed(move || {
            let todos = state_c.get("todos")?;
            let Some(todos) = todos.as_mutable_array() else {
                return Err(Error::user("todos is not an array"));
            };
            let len = todos.len();
            lengths_c.borrow_mut().push(len);
            if len > 0 {
                newest_c.borrow_mut().push(todos.get(len - 1));
            }
            Ok(())
        })
        .unwrap();

        let todos = state.get("todos").unwrap();
        let todos = todos.as_mutable_array().unwrap();
        todos.push("write tests").unwrap();
        todos.push("ship").unwrap();

        assert_eq!(*lengths.borrow(), vec![0, 1, 2]);
        assert_eq!(
            *newest.borrow(),
            vec![Value::from("write tests"), Value::from("ship")]
        );
        assert_eq!(todos.raw().len(), 2);
    });
}

#[test]
fn unwrap_of_spread_keeps_frozen_nested_by_reference() {
    let frozen = Object::new().with("locked", true).freeze();
    let state = create_mutable(
        Object::new()
            .with("settings", frozen.clone())
            .with("count", 1),
    )
    .unwrap()
    .into_object()
    .unwrap();

    // Frozen values pass through reads untouched.
    let read = state.get("settings").unwrap();
    assert!(read.as_mutable().is_none());
    assert!(read.as_object().unwrap().ptr_eq(&frozen));

    let plain = unwrap(&Value::from(state.spread().unwrap()));
    let plain = plain.as_object().unwrap();
    let settings = plain.get("settings").unwrap();
    let settings = settings.as_object().unwrap();

    assert!(settings.ptr_eq(&frozen));
    assert_eq!(settings.get("locked"), Some(Value::Bool(true)));
    assert!(!settings.contains_key(RAW_KEY));
    assert!(!plain.contains_key(RAW_KEY));
}

#[test]
fn unwrap_leaves_no_proxies() {
    let state = object_state(json!({"list": [{"id": 1}, {"id": 2}], "meta": {"page": 1}}));
    let list = state.get("list").unwrap();
    let first = list.as_mutable_array().unwrap().get(0);
    state.set("first", first).unwrap();

    let plain = unwrap(&Value::from(state.clone()));
    fn assert_plain(value: &Value) {
        match value {
            Value::Mutable(_) => panic!("proxy left in unwrapped data"),
            Value::Object(object) => {
                for key in object.keys() {
                    assert_plain(&object.get(&key).unwrap_or_default());
                }
            }
            Value::Array(array) => array.to_vec().iter().for_each(assert_plain),
            _ => {}
        }
    }
    assert_plain(&plain);
    assert!(!plain.as_object().unwrap().ptr_eq(state.raw()));
}

#[test]
fn batched_writes_rerun_once_with_final_values() {
    create_root(|_| {
        let state = object_state(json!({"x": 0, "y": 0}));
        let seen = Rc::new(RefCell::new(Vec::new()));

        let (state_c, seen_c) = (state.clone(), seen.clone());
        create_computed(move || {
            let pair = (number(state_c.get("x")?), number(state_c.get("y")?));
            seen_c.borrow_mut().push(pair);
            Ok(())
        })
        .unwrap();

        batch(|| {
            state.set("x", 1)?;
            state.set("y", 2)?;
            state.set("x", 3)
        })
        .unwrap();

        assert_eq!(*seen.borrow(), vec![(0.0, 0.0), (3.0, 2.0)]);
    });
}

#[test]
fn getter_reruns_and_setter_batches() {
    create_root(|_| {
        let target = Object::new()
            .with("first", "John")
            .with("last", "Smith")
            .with_accessor(
                "full",
                Accessor::getter(|this| {
                    let first = this.get("first")?;
                    let last = this.get("last")?;
                    Ok(Value::from(format!(
                        "{} {}",
                        first.as_str().unwrap_or_default(),
                        last.as_str().unwrap_or_default()
                    )))
                })
                .with_setter(|this, value| {
                    let full = value.as_str().unwrap_or_default().to_string();
                    let (first, last) = full.split_once(' ').unwrap_or((full.as_str(), ""));
                    this.set("first", first)?;
                    this.set("last", last)
                }),
            );
        let state = create_mutable(target).unwrap().into_object().unwrap();

        let full_seen = Rc::new(RefCell::new(Vec::new()));
        let (state_c, seen_c) = (state.clone(), full_seen.clone());
        create_computed(move || {
            let full = state_c.get("full")?;
            seen_c
                .borrow_mut()
                .push(full.as_str().unwrap_or_default().to_string());
            Ok(())
        })
        .unwrap();

        state.set("first", "Jane").unwrap();
        state.set("full", "Ada Lovelace").unwrap();

        assert_eq!(
            *full_seen.borrow(),
            vec!["John Smith", "Jane Smith", "Ada Lovelace"]
        );
    });
}

#[test]
fn memo_over_store_filters_unchanged_results() {
    create_root(|_| {
        let state = object_state(json!({"items": [1, 2, 3]}));
        let state_c = state.clone();
        let total = create_memo(move || {
            let items = state_c.get("items")?;
            let sum = items
                .as_mutable_array()
                .map(|items| items.values().into_iter().map(number).sum::<f64>())
                .unwrap_or_default();
            Ok(sum)
        });

        let renders = Rc::new(Cell::new(0));
        let (total_c, renders_c) = (total.clone(), renders.clone());
        create_computed(move || {
            total_c.get()?;
            renders_c.set(renders_c.get() + 1);
            Ok(())
        })
        .unwrap();

        let items = state.get("items").unwrap();
        let items = items.as_mutable_array().unwrap();

        // Same sum, different order: the memo reruns, the reader does not.
        items.reverse().unwrap();
        assert_eq!(renders.get(), 1);

        items.push(4).unwrap();
        assert_eq!(renders.get(), 2);
        assert_eq!(total.get().unwrap(), 10.0);
    });
}

#[test]
fn enumeration_reacts_to_added_and_removed_keys() {
    create_root(|_| {
        let state = object_state(json!({"a": 1}));
        let snapshots = Rc::new(RefCell::new(Vec::new()));

        let (state_c, snapshots_c) = (state.clone(), snapshots.clone());
        create_computed(move || {
            snapshots_c.borrow_mut().push(state_c.keys());
            Ok(())
        })
        .unwrap();

        state.set("a", 2).unwrap();
        state.set("b", 3).unwrap();
        state.delete("a").unwrap();

        assert_eq!(
            *snapshots.borrow(),
            vec![vec!["a".to_string()], vec!["a".into(), "b".into()], vec!["b".to_string()]]
        );
    });
}

#[test]
fn dates_and_functions_pass_through() {
    let when = SystemTime::UNIX_EPOCH + Duration::from_secs(86_400);
    let state = create_mutable(Object::new().with("when", when)).unwrap();
    let state = state.into_object().unwrap();
    assert_eq!(state.get("when").unwrap(), Value::Date(when));

    let array = Array::from_iter([Value::Date(when)]);
    assert!(is_wrappable(&Value::from(array.clone())));
    assert!(!is_wrappable(&Value::from(array.freeze())));
}

#[test]
fn create_mutable_of_a_proxy_copies_it() {
    let original = object_state(json!({"n": 1}));
    let copy = create_mutable(original.clone()).unwrap().into_object().unwrap();

    assert_ne!(copy, original);
    copy.set("n", 2).unwrap();
    assert_eq!(original.get("n").unwrap(), Value::from(1));
}

#[test]
fn assigning_a_proxy_aliases_its_target() {
    let state = object_state(json!({"a": {"x": 1}}));
    let a = state.get("a").unwrap();
    state.set("b", a.clone()).unwrap();

    let b = state.get("b").unwrap();
    assert_eq!(a, b);

    a.as_mutable_object().unwrap().set("x", 2).unwrap();
    let b = b.as_mutable_object().unwrap();
    assert_eq!(b.get("x").unwrap(), Value::from(2));
    assert!(b.raw().ptr_eq(a.as_mutable_object().unwrap().raw()));
}

#[test]
fn reassigning_the_same_proxy_does_not_rerun() {
    create_root(|_| {
        let state = object_state(json!({"user": {"name": "Ada"}, "list": [[1]]}));
        let runs = Rc::new(Cell::new(0));

        let (state_c, runs_c) = (state.clone(), runs.clone());
        create_computed(move || {
            state_c.get("user")?;
            let list = state_c.get("list")?;
            if let Some(list) = list.as_mutable_array() {
                list.get(0);
            }
            runs_c.set(runs_c.get() + 1);
            Ok(())
        })
        .unwrap();

        let user = state.get("user").unwrap();
        state.set("user", user).unwrap();

        let list = state.get("list").unwrap();
        let list = list.as_mutable_array().unwrap();
        list.set(0, list.get(0)).unwrap();

        assert_eq!(runs.get(), 1);
    });
}
