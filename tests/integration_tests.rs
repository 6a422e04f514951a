//! Integration tests for Roost

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use roost::router::GuardDecision;
use roost::{
    AppContext, AuthGuard, Config, DemoState, FileStorage, MemoryStorage, NavigationOutcome,
    ResolvedRoute, RouteEntry, RouteTable, Router, Storage,
};

#[test]
fn empty_route_table_never_matches() {
    let ctx = AppContext::new(Arc::new(MemoryStorage::new()));
    for path in ["/", "/login", "/users/1", "https://example.com/x?y=1#z"] {
        assert!(!ctx.router().resolve(path).is_match());
        assert!(!ctx.router().resolve_url(path).is_match());
    }
}

#[test]
fn demo_store_defaults() {
    let ctx = AppContext::new(Arc::new(MemoryStorage::new()));
    let demo = ctx.demo_store().unwrap();
    assert_eq!(
        demo.get(),
        DemoState {
            name: "张三".to_string(),
            age: "18".to_string(),
        }
    );
}

#[test]
fn set_survives_reload() {
    let storage = MemoryStorage::new();

    let ctx = AppContext::new(Arc::new(storage.clone()));
    let demo = ctx.demo_store().unwrap();
    demo.set("name", "X").unwrap();
    assert_eq!(demo.get().name, "X");
    drop(ctx);

    let reloaded = AppContext::new(Arc::new(storage));
    let demo = reloaded.demo_store().unwrap();
    assert_eq!(demo.get().name, "X");
    assert_eq!(demo.get().age, "18");
}

#[test]
fn persisted_state_round_trips_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::open(dir.path()).unwrap();

    let ctx = AppContext::new(Arc::new(storage.clone()));
    ctx.demo_store()
        .unwrap()
        .update(|s| {
            s.name = "王五 \"quoted\" \\ slash".into();
            s.age = "0042".into();
        })
        .unwrap();
    let written = storage.get_item("demo").unwrap().unwrap();
    let before = ctx.demo_store().unwrap().get();

    let reloaded = AppContext::new(Arc::new(FileStorage::open(dir.path()).unwrap()));
    let demo = reloaded.demo_store().unwrap();
    assert_eq!(demo.get(), before);
    assert_eq!(demo.get().name.as_bytes(), before.name.as_bytes());

    demo.write_through().unwrap();
    assert_eq!(storage.get_item("demo").unwrap().unwrap(), written);
}

#[test]
fn corrupt_persisted_state_falls_back_to_defaults() {
    let storage = MemoryStorage::new();
    storage.set_item("demo", "{not json").unwrap();

    let ctx = AppContext::new(Arc::new(storage.clone()));
    let demo = ctx.demo_store().unwrap();
    assert_eq!(demo.get(), DemoState::default());

    demo.set("age", "19").unwrap();
    assert_eq!(
        storage.get_item("demo").unwrap().as_deref(),
        Some(r#"{"name":"张三","age":"19"}"#)
    );
}

#[test]
fn set_unknown_field_is_recoverable() {
    let ctx = AppContext::new(Arc::new(MemoryStorage::new()));
    let demo = ctx.demo_store().unwrap();
    assert!(demo.set("token", "abc").is_err());
    assert_eq!(demo.get(), DemoState::default());
}

#[test]
fn store_subscription_sees_every_change() {
    let ctx = AppContext::new(Arc::new(MemoryStorage::new()));
    let demo = ctx.demo_store().unwrap();
    let counter = Arc::new(AtomicUsize::new(0));
    let counter_clone = counter.clone();

    let _sub = demo.subscribe(move |_| {
        counter_clone.fetch_add(1, Ordering::SeqCst);
    });

    demo.set("name", "A").unwrap();
    demo.set("age", "20").unwrap();
    demo.reset().unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 3);
    assert_eq!(demo.get(), DemoState::default());
}

#[test]
fn guard_enabled_without_token_redirects_to_login() {
    let router = Router::new(RouteTable::new());
    router.before_each(AuthGuard::new(|| None::<String>).enabled(true));

    for path in ["/", "/home", "/deep/path?q=1"] {
        match router.push(path).unwrap() {
            NavigationOutcome::Redirected { to, .. } => assert_eq!(to.path(), "/login"),
            NavigationOutcome::Duplicated(to) => assert_eq!(to.path(), "/login"),
            other => panic!("expected redirect for {path}, got {other:?}"),
        }
    }
}

#[test]
fn guard_never_redirects_the_login_path() {
    let router = Router::new(RouteTable::new());
    router.before_each(AuthGuard::new(|| None::<String>).enabled(true));

    let outcome = router.push("/login").unwrap();
    assert!(matches!(outcome, NavigationOutcome::Committed(ref to) if to.path() == "/login"));
}

#[test]
fn guard_disabled_by_default() {
    let ctx = AppContext::from_config(&Config::default()).unwrap();
    let outcome = ctx.router().push("/private").unwrap();
    assert!(matches!(outcome, NavigationOutcome::Committed(ref to) if to.path() == "/private"));
}

#[test]
fn custom_guards_compose_with_auth_guard() {
    let storage = MemoryStorage::new();
    storage.set_item("token", "secret").unwrap();
    let router = Router::new(
        RouteTable::from_entries([
            RouteEntry::new("/", "HomeView"),
            RouteEntry::new("/admin", "AdminView").meta("role", "admin"),
        ])
        .unwrap(),
    );
    let ctx = AppContext::with_router(Arc::new(storage), router);
    ctx.auth_guard().set_enabled(true);

    ctx.router()
        .before_each(|to: &ResolvedRoute, _from: Option<&ResolvedRoute>| {
            match to.meta().and_then(|m| m.extra.get("role")) {
                Some(role) if role == "admin" => GuardDecision::Redirect("/".into()),
                _ => GuardDecision::Continue,
            }
        });

    let outcome = ctx.router().push("/admin").unwrap();
    assert_eq!(outcome.committed().unwrap().path(), "/");
}
