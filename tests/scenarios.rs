// tests/scenarios.rs

use std::cell::RefCell;
use std::rc::Rc;

use tempfile::tempdir;
use tierdb::core::path_resolver::{self, Mode};
use tierdb::{
    Defaults, FileStorage, Key, MemoryStorage, Namespace, ProfileStore, Settings, Table, Value, View,
};

fn started(settings: &mut Settings) {
    settings.attach(MemoryStorage::new()).unwrap();
    settings.start().unwrap();
}

#[test]
fn creating_resolution_only_adds_missing_containers() {
    let root = Table::new();
    path_resolver::set_path(&root, "a.b.keep", Value::from(1)).unwrap();
    let a_before = root.get_table(&"a".into()).unwrap();
    let b_before = a_before.get_table(&"b".into()).unwrap();

    let (container, key) = path_resolver::resolve(
        &root,
        &path_resolver::parse_path("a.b.c.d").unwrap(),
        Mode::Create,
    )
    .unwrap()
    .unwrap();

    assert!(root.get_table(&"a".into()).unwrap().ptr_eq(&a_before));
    assert!(a_before.get_table(&"b".into()).unwrap().ptr_eq(&b_before));
    assert!(b_before.get_table(&"c".into()).unwrap().ptr_eq(&container));
    assert_eq!(key, Key::from("d"));
    assert!(container.is_empty());
    assert_eq!(b_before.get(&"keep".into()), Some(Value::from(1)));
}

#[test]
fn get_walks_stored_then_parent_then_defaults() {
    let mut defaults = Defaults::new();
    defaults.register("profile.scale", 1).unwrap();
    let store = ProfileStore::new(Table::new(), defaults);

    let child = store.profile_view("Child");
    let parent = store.profile_view("Parent");
    parent.set("scale", Value::from(2)).unwrap();
    child.set("scale", Value::from(3)).unwrap();
    child.set_parent(Some(&parent)).unwrap();

    assert_eq!(child.value("scale"), Some(Value::from(3)));
    child.remove("scale");
    assert_eq!(child.value("scale"), Some(Value::from(2)));
    child.set_parent(None).unwrap();
    assert_eq!(child.value("scale"), Some(Value::from(1)));

    let bare = View::new_root(Namespace::Profile("Bare".into()), Table::new(), None);
    assert!(bare.get("scale").is_none());
}

#[test]
fn writing_an_inherited_path_leaves_the_parent_untouched() {
    let store = ProfileStore::new(Table::new(), Defaults::new());
    let parent = store.global_view();
    parent.set_path("layout.x", Value::from(10)).unwrap();
    let child = store.profile_view("Default");
    child.set_parent(Some(&parent)).unwrap();

    let layout = child.view("layout").unwrap();
    assert!(layout.is_redirected());
    layout.set("x", Value::from(99)).unwrap();

    assert_eq!(parent.lookup_value("layout.x").unwrap(), Some(Value::from(10)));
    let own = child.to_own_table().unwrap();
    assert_eq!(
        path_resolver::get_path(&own, "layout.x").unwrap(),
        Some(Value::from(99))
    );
}

#[test]
fn remove_then_set_default_is_idempotent() {
    let mut settings = Settings::new("Addon");
    started(&mut settings);
    let store = settings.store_mut().unwrap();

    let current = store.current_profile_name("me");
    store.remove_profile(&current);
    store.set_profile("me", "Default");
    assert!(!store.remove_profile("Raid"));
    assert_eq!(store.current_profile_name("me"), "Default");
    assert!(store.has_profile("Default"));
}

#[test]
fn rename_onto_existing_name_gets_suffix_and_notifies_affected_identities() {
    let mut settings = Settings::new("Addon");
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    settings.on_profile_changed(move |new, old| {
        sink.borrow_mut().push((new.to_string(), old.to_string()));
    });
    started(&mut settings);

    let store = settings.store_mut().unwrap();
    store.set_profile("alice", "A");
    store.set_profile("bob", "B");
    store.set_profile("carol", "A");
    store.profile_view("A").set("hp", Value::from(100)).unwrap();
    events.borrow_mut().clear();

    assert_eq!(store.rename_profile("A", "B").as_deref(), Some("B (2)"));
    assert_eq!(store.profile_view("B (2)").value("hp"), Some(Value::from(100)));
    assert_eq!(store.current_profile_name("bob"), "B");
    assert_eq!(
        *events.borrow(),
        vec![
            ("B (2)".to_string(), "A".to_string()),
            ("B (2)".to_string(), "A".to_string()),
        ]
    );
}

#[test]
fn set_then_lookup_round_trips() {
    let store = ProfileStore::new(Table::new(), Defaults::new());
    let view = store.current_view("me");
    for (path, value) in [
        ("a", Value::from(1)),
        ("b.c", Value::from("text")),
        ("d[3].e", Value::from(2.5)),
        ("f[name]", Value::from(false)),
    ] {
        view.set_path(path, value.clone()).unwrap();
        assert_eq!(view.lookup_value(path).unwrap(), Some(value), "path {}", path);
    }
}

#[test]
fn raid_profile_survives_remove_and_restore() {
    let mut settings = Settings::new("Addon");
    started(&mut settings);
    let store = settings.store_mut().unwrap();

    store.set_profile("me", "Raid");
    assert!(store.has_profile("Raid"));
    store.current_view("me").set_path("frames.size", Value::from(42)).unwrap();

    store.remove_profile("Raid");
    assert_eq!(store.current_profile_name("me"), "Default");

    assert!(store.restore_profile("Raid"));
    assert_eq!(
        store.profile_view("Raid").lookup_value("frames.size").unwrap(),
        Some(Value::from(42))
    );
    assert!(!store.restore_profile("Raid"));
}

#[test]
fn append_once_survives_a_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("Addon.bin");

    let mut first = Settings::new("Addon");
    first.attach(FileStorage::new(&path)).unwrap();
    first.start().unwrap();
    {
        let store = first.store().unwrap();
        let global = store.global_view();
        assert!(store.append_once(&global, "seen", Value::from(true)).unwrap());
        assert!(!store.append_once(&global, "seen", Value::from(false)).unwrap());
        assert_eq!(global.value("seen"), Some(Value::from(true)));
    }
    first.save().unwrap();

    let mut second = Settings::new("Addon");
    second.attach(FileStorage::new(&path)).unwrap();
    let store = second.store().unwrap();
    let global = store.global_view();
    assert!(!store.append_once(&global, "seen", Value::from(false)).unwrap());
    assert_eq!(global.value("seen"), Some(Value::from(true)));
}
