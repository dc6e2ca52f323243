//! Overlay resolution properties, exercised through the public `Resolver` API.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Barrier, OnceLock, Weak};
use std::thread;
use std::time::Duration;

use stratum::{
    Arity, FallbackPolicy, MemoryProvider, NamespaceHandle, NativeModule, OverlayError, Resolver,
    ResolverConfig, RuntimeError, Value,
};

fn provider(units: &[(&str, &str)]) -> Arc<MemoryProvider> {
    let provider = MemoryProvider::new();
    for (name, source) in units {
        provider.insert_script(name, source).unwrap();
    }
    Arc::new(provider)
}

fn resolver(units: &[(&str, &str)]) -> Resolver {
    Resolver::new().with_provider(provider(units))
}

fn mount(name: &str) -> NamespaceHandle {
    NamespaceHandle::mount(name)
}

/// Call `unit.name(args)`.
fn call(resolver: &Resolver, unit: &Arc<stratum::DefinitionUnit>, name: &str, args: &[Value]) -> Value {
    let function = resolver.get_attr(unit, name).unwrap();
    resolver.call(&function, args).unwrap()
}

// =============================================================================
// Precedence and isolation
// =============================================================================

#[test]
fn override_symbols_win() {
    let resolver = resolver(&[
        ("base", "let a = 1; let b = 2;"),
        ("over", "let b = 20; let c = 30;"),
    ]);
    let merged = resolver
        .shim(NamespaceHandle::base("base"), NamespaceHandle::overlay("over"), mount("m"))
        .unwrap();

    assert_eq!(merged.get("a"), Some(Value::Int(1)));
    assert_eq!(merged.get("b"), Some(Value::Int(20)));
    assert_eq!(merged.get("c"), Some(Value::Int(30)));
}

#[test]
fn layers_stay_untouched() {
    let resolver = resolver(&[
        ("base", "let a = 1; let b = 2;"),
        ("over", "import base; let b = base.b * 10; let c = 30;"),
    ]);
    let merged = resolver
        .shim(NamespaceHandle::base("base"), NamespaceHandle::overlay("over"), mount("m"))
        .unwrap();
    assert_eq!(merged.get("b"), Some(Value::Int(20)));

    let base = resolver.import("base").unwrap();
    assert_eq!(base.get("b"), Some(Value::Int(2)));
    assert!(base.get("c").is_none());
    assert!(!base.is_merged());

    // Standalone, the override sees the real base.
    let over = resolver.import("over").unwrap();
    assert_eq!(over.get("b"), Some(Value::Int(20)));
    assert!(over.get("a").is_none());
    let imported = over.get("base").unwrap();
    assert!(Arc::ptr_eq(imported.as_unit().unwrap(), &base));
}

#[test]
fn override_calls_original_through_working_copy() {
    let resolver = resolver(&[
        ("lib", "fn value() { return 1; } fn twice() { return value() * 2; }"),
        ("lib_ext", "import lib; fn value() { return lib.value() + 10; }"),
    ]);
    let merged = resolver
        .shim(NamespaceHandle::base("lib"), NamespaceHandle::overlay("lib_ext"), mount("m"))
        .unwrap();

    assert_eq!(call(&resolver, &merged, "value", &[]), Value::Int(11));
    // Base functions see the override through the merged table.
    assert_eq!(call(&resolver, &merged, "twice", &[]), Value::Int(22));

    let plain = resolver.import("lib").unwrap();
    assert_eq!(call(&resolver, &plain, "twice", &[]), Value::Int(2));
}

// =============================================================================
// Registration lifecycle
// =============================================================================

#[test]
fn registration_is_idempotent() {
    let resolver = resolver(&[("base", "let a = 1;"), ("over", "")]);
    resolver.register_paths("base", "over", "m").unwrap();
    let first = resolver.resolve(&mount("m")).unwrap();
    resolver.register_paths("base", "over", "m").unwrap();
    let second = resolver.resolve(&mount("m")).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(resolver.list_mounts().len(), 1);
}

#[test]
fn replacing_a_mount_builds_a_new_instance() {
    let resolver = resolver(&[
        ("base", "let a = 1;"),
        ("one", "let a = 10;"),
        ("two", "let a = 20;"),
    ]);
    resolver.register_paths("base", "one", "m").unwrap();
    let first = resolver.resolve(&mount("m")).unwrap();
    resolver.register_paths("base", "two", "m").unwrap();
    let second = resolver.resolve(&mount("m")).unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(first.get("a"), Some(Value::Int(10)));
    assert_eq!(second.get("a"), Some(Value::Int(20)));
}

#[test]
fn unregister_then_register_is_fresh() {
    let resolver = resolver(&[("base", "let a = 1;"), ("over", "")]);
    resolver.register_paths("base", "over", "m").unwrap();
    let first = resolver.resolve(&mount("m")).unwrap();

    resolver.unregister(&mount("m"));
    assert!(resolver.list_mounts().is_empty());
    assert!(matches!(
        resolver.resolve(&mount("m")),
        Err(OverlayError::NotMounted { .. })
    ));
    // Unknown and invalid mounts are ignored.
    resolver.unregister(&mount("m"));
    resolver.unregister(&mount(""));

    resolver.register_paths("base", "over", "m").unwrap();
    let second = resolver.resolve(&mount("m")).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(second.get("a"), Some(Value::Int(1)));
}

#[test]
fn reload_swaps_in_a_new_instance() {
    let provider = provider(&[("base", "let v = 1;"), ("over", "let w = 0;")]);
    let resolver = Resolver::new().with_provider(provider.clone());
    resolver.register_paths("base", "over", "m").unwrap();
    let old = resolver.resolve(&mount("m")).unwrap();

    provider.insert_script("base", "let v = 2;").unwrap();
    let new = resolver.reload(&mount("m")).unwrap();

    assert!(!Arc::ptr_eq(&old, &new));
    assert_eq!(old.get("v"), Some(Value::Int(1)));
    assert_eq!(new.get("v"), Some(Value::Int(2)));
    assert!(Arc::ptr_eq(&new, &resolver.resolve(&mount("m")).unwrap()));
}

// =============================================================================
// Self-mounts
// =============================================================================

#[test]
fn mount_named_after_override() {
    let resolver = resolver(&[
        ("greet", "fn hello() { return \"hello\"; }"),
        ("greet_loud", "import greet; fn hello() { return greet.hello().upper(); }"),
    ]);
    let merged = resolver
        .shim(
            NamespaceHandle::base("greet"),
            NamespaceHandle::overlay("greet_loud"),
            mount("greet_loud"),
        )
        .unwrap();
    assert_eq!(call(&resolver, &merged, "hello", &[]), Value::str("HELLO"));

    // The mount shadows the plain override from now on, and stays stable.
    let imported = resolver.import("greet_loud").unwrap();
    assert!(Arc::ptr_eq(&merged, &imported));
    assert!(Arc::ptr_eq(&merged, &resolver.resolve(&mount("greet_loud")).unwrap()));
}

#[test]
fn mount_named_after_base() {
    let resolver = resolver(&[
        ("greet", "fn hello() { return \"hello\"; } fn twice() { return hello() + hello(); }"),
        ("greet_loud", "import greet; fn hello() { return greet.hello().upper(); }"),
    ]);
    let merged = resolver
        .shim(
            NamespaceHandle::base("greet"),
            NamespaceHandle::overlay("greet_loud"),
            mount("greet"),
        )
        .unwrap();

    assert_eq!(call(&resolver, &merged, "twice", &[]), Value::str("HELLOHELLO"));
    let imported = resolver.import("greet").unwrap();
    assert!(Arc::ptr_eq(&merged, &imported));
}

// =============================================================================
// Redirection
// =============================================================================

#[test]
fn sub_namespace_override_calls_its_original() {
    let provider = MemoryProvider::new()
        .with_package("pkg", "")
        .unwrap()
        .with_script("pkg.sub", "fn f() { return 1; }")
        .unwrap()
        .with_package("ext", "")
        .unwrap()
        .with_script("ext.sub", "import pkg; fn f() { return pkg.sub.f() + 10; }")
        .unwrap();
    let resolver = Resolver::new().with_provider(provider);
    resolver.register_paths("pkg", "ext", "m").unwrap();

    let sub = resolver.import("m.sub").unwrap();
    assert_eq!(call(&resolver, &sub, "f", &[]), Value::Int(11));
    assert!(sub.table().names().iter().all(|name| !name.starts_with("_wc_")));

    let plain = resolver.import("pkg.sub").unwrap();
    assert_eq!(call(&resolver, &plain, "f", &[]), Value::Int(1));
}

#[test]
fn base_internal_references_follow_the_mount() {
    let resolver = resolver(&[
        ("pkg", "import pkg.helpers; fn run() { return pkg.helpers.greet(); }"),
        ("pkg.helpers", "fn greet() { return \"base\"; }"),
        ("pkg_over", ""),
        ("pkg_over.helpers", "fn greet() { return \"over\"; }"),
    ]);
    let merged = resolver
        .shim(NamespaceHandle::base("pkg"), NamespaceHandle::overlay("pkg_over"), mount("m"))
        .unwrap();
    assert_eq!(call(&resolver, &merged, "run", &[]), Value::str("over"));

    let helpers = resolver.get_attr(&merged, "helpers").unwrap();
    assert_eq!(helpers.as_unit().unwrap().path().to_string(), "m.helpers");

    let plain = resolver.import("pkg").unwrap();
    assert_eq!(call(&resolver, &plain, "run", &[]), Value::str("base"));
}

#[test]
fn nested_sub_namespaces_resolve_through_the_mount() {
    let resolver = resolver(&[
        ("lib.deep.leaf", "from . import sibling; fn who() { return sibling.name; }"),
        ("lib.deep.sibling", "let name = \"base sibling\";"),
        ("ext.deep.sibling", "let name = \"override sibling\";"),
    ]);
    resolver.register_paths("lib", "ext", "m").unwrap();

    let leaf = resolver.import("m.deep.leaf").unwrap();
    assert_eq!(leaf.path().to_string(), "m.deep.leaf");
    assert_eq!(call(&resolver, &leaf, "who", &[]), Value::str("override sibling"));

    let root = resolver.resolve(&mount("m")).unwrap();
    let deep = root.get("deep").unwrap();
    assert!(deep.as_unit().unwrap().get("leaf").is_some());
}

// =============================================================================
// Absent and malformed layers
// =============================================================================

#[test]
fn both_layers_absent_is_fatal() {
    let resolver = resolver(&[]);
    resolver.register_paths("nothing", "nowhere", "m").unwrap();
    let err = resolver.resolve(&mount("m")).unwrap_err();
    assert!(matches!(err, OverlayError::UnresolvableMount { .. }));
    let message = err.to_string();
    assert!(message.contains("`m`"));
    assert!(message.contains("`nothing`"));
    assert!(message.contains("`nowhere`"));
}

#[test]
fn one_absent_layer_is_enough() {
    let resolver = resolver(&[("base", "let a = 1;"), ("over", "let b = 2;")]);
    resolver.register_paths("missing", "over", "only_over").unwrap();
    resolver.register_paths("base", "missing", "only_base").unwrap();

    let only_over = resolver.resolve(&mount("only_over")).unwrap();
    assert_eq!(only_over.get("b"), Some(Value::Int(2)));
    let only_base = resolver.resolve(&mount("only_base")).unwrap();
    assert_eq!(only_base.get("a"), Some(Value::Int(1)));
}

fn malformed_base() -> Arc<MemoryProvider> {
    let provider = provider(&[("base", "let = oops"), ("over", "let b = 2;")]);
    provider
        .insert_native("base", NativeModule::new().constant("a", Value::Int(1)))
        .unwrap();
    provider
}

#[test]
fn malformed_base_falls_back_when_lenient() {
    let resolver = Resolver::new().with_provider(malformed_base());
    let merged = resolver
        .shim(NamespaceHandle::base("base"), NamespaceHandle::overlay("over"), mount("m"))
        .unwrap();
    assert_eq!(merged.get("a"), Some(Value::Int(1)));
    assert_eq!(merged.get("b"), Some(Value::Int(2)));
}

#[test]
fn malformed_base_fails_when_strict() {
    let config = ResolverConfig::new().fallback_policy(FallbackPolicy::Strict);
    let resolver = Resolver::with_config(config).with_provider(malformed_base());
    let err = resolver
        .shim(NamespaceHandle::base("base"), NamespaceHandle::overlay("over"), mount("m"))
        .unwrap_err();
    assert!(matches!(err, OverlayError::MalformedUnit { ref name, .. } if name.to_string() == "base"));
}

#[test]
fn malformed_without_native_form_fails() {
    let resolver = resolver(&[("base", "fn ("), ("over", "")]);
    let err = resolver
        .shim(NamespaceHandle::base("base"), NamespaceHandle::overlay("over"), mount("m"))
        .unwrap_err();
    assert!(matches!(err, OverlayError::MalformedUnit { .. }));
    // A failed construction leaves nothing behind.
    assert!(resolver.resolve(&mount("m")).is_err());
}

// =============================================================================
// Cycles and limits
// =============================================================================

#[test]
fn circular_plain_imports_see_partial_units() {
    let resolver = resolver(&[
        ("a", "import b; let x = 1; fn other() { return b.y; }"),
        ("b", "import a; let y = 2; fn other() { return a.x; }"),
    ]);
    let a = resolver.import("a").unwrap();
    let b = resolver.import("b").unwrap();
    assert_eq!(call(&resolver, &a, "other", &[]), Value::Int(2));
    assert_eq!(call(&resolver, &b, "other", &[]), Value::Int(1));
}

#[test]
fn nesting_limit_is_enforced() {
    let units: Vec<(String, String)> = (0..6)
        .map(|i| (format!("u{i}"), format!("import u{};", i + 1)))
        .collect();
    let provider = MemoryProvider::new();
    for (name, source) in &units {
        provider.insert_script(name, source).unwrap();
    }
    provider.insert_script("u6", "let end = true;").unwrap();

    let resolver = Resolver::with_config(ResolverConfig::new().max_depth(3)).with_provider(provider);
    let err = resolver.import("u0").unwrap_err();
    assert!(err.to_string().contains("nesting limit of 3"));
}

// =============================================================================
// Concurrency
// =============================================================================

#[test]
fn concurrent_resolution_constructs_once() {
    let constructions = Arc::new(AtomicUsize::new(0));
    let counter = constructions.clone();
    let ticker = NativeModule::new().function("tick", Arity::Exact(0), move |_| {
        Ok(Value::Int(counter.fetch_add(1, Ordering::SeqCst) as i64))
    });

    let provider = provider(&[("base", "import counter; let stamp = counter.tick();"), ("over", "")]);
    provider.insert_native("counter", ticker).unwrap();
    let resolver = Arc::new(Resolver::new().with_provider(provider));
    resolver.register_paths("base", "over", "m").unwrap();

    const THREADS: usize = 8;
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let resolver = resolver.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                resolver.resolve(&NamespaceHandle::mount("m")).unwrap()
            })
        })
        .collect();
    let units: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(constructions.load(Ordering::SeqCst), 1);
    assert!(units.iter().all(|unit| Arc::ptr_eq(unit, &units[0])));
}

/// A slot native functions use to reach the resolver that loads them.
fn resolver_slot() -> Arc<OnceLock<Weak<Resolver>>> {
    Arc::new(OnceLock::new())
}

#[test]
fn unregister_during_construction_is_not_cached() {
    let slot = resolver_slot();
    let hook = slot.clone();
    let fired = AtomicBool::new(false);
    let hooks = NativeModule::new().function("drop_mount", Arity::Exact(0), move |_| {
        if !fired.swap(true, Ordering::SeqCst)
            && let Some(resolver) = hook.get().and_then(Weak::upgrade)
        {
            resolver.unregister(&NamespaceHandle::mount("m"));
        }
        Ok(Value::Null)
    });
    let provider = provider(&[("base", "import hooks; hooks.drop_mount(); let a = 1;"), ("over", "")]);
    provider.insert_native("hooks", hooks).unwrap();
    let resolver = Arc::new(Resolver::new().with_provider(provider));
    slot.set(Arc::downgrade(&resolver)).unwrap();

    resolver.register_paths("base", "over", "m").unwrap();
    let orphan = resolver.resolve(&mount("m")).unwrap();
    assert!(resolver.list_mounts().is_empty());

    resolver.register_paths("base", "over", "m").unwrap();
    let fresh = resolver.resolve(&mount("m")).unwrap();
    assert!(!Arc::ptr_eq(&orphan, &fresh));
    assert!(Arc::ptr_eq(&fresh, &resolver.resolve(&mount("m")).unwrap()));
}

#[test]
fn unregister_racing_resolve_leaves_no_stale_entry() {
    let slot = resolver_slot();
    let inside = Arc::new(Barrier::new(2));
    let hook = slot.clone();
    let hook_inside = inside.clone();
    let hooks = NativeModule::new().function("stall", Arity::Exact(0), move |_| {
        hook_inside.wait();
        thread::sleep(Duration::from_millis(200));
        if let Some(resolver) = hook.get().and_then(Weak::upgrade) {
            resolver.unregister(&NamespaceHandle::mount("m"));
        }
        Ok(Value::Null)
    });
    let provider = provider(&[
        ("slow_base", "import hooks; hooks.stall();"),
        ("base", "let a = 1;"),
        ("over", ""),
    ]);
    provider.insert_native("hooks", hooks).unwrap();
    let resolver = Arc::new(Resolver::new().with_provider(provider));
    slot.set(Arc::downgrade(&resolver)).unwrap();
    resolver.register_paths("slow_base", "over", "slow").unwrap();
    resolver.register_paths("base", "over", "m").unwrap();

    let builder = {
        let resolver = resolver.clone();
        thread::spawn(move || resolver.resolve(&mount("slow")).map(|_| ()))
    };
    // The builder holds the resolution guard until it has unregistered `m`.
    inside.wait();
    let raced = resolver.resolve(&mount("m"));
    builder.join().unwrap().unwrap();

    assert!(matches!(raced, Err(OverlayError::NotMounted { .. })));
    let mounts: Vec<String> = resolver.list_mounts().iter().map(|m| m.to_string()).collect();
    assert_eq!(mounts, vec!["slow"]);

    resolver.register_paths("base", "over", "m").unwrap();
    let fresh = resolver.resolve(&mount("m")).unwrap();
    assert_eq!(fresh.get("a"), Some(Value::Int(1)));
}

// =============================================================================
// Attribute access
// =============================================================================

#[test]
fn missing_attributes() {
    let resolver = resolver(&[("plain", "let a = 1;")]);
    let unit = resolver.import("plain").unwrap();
    let err = resolver.get_attr(&unit, "b").unwrap_err();
    assert!(matches!(err, RuntimeError::NoAttribute { ref target, ref name } if target == "plain" && name == "b"));
}

#[test]
fn functions_outliving_their_namespace() {
    let function = {
        let resolver = resolver(&[("gone", "fn f() { return 1; }")]);
        let unit = resolver.import("gone").unwrap();
        resolver.get_attr(&unit, "f").unwrap()
    };
    let resolver = Resolver::new();
    let err = resolver.call(&function, &[]).unwrap_err();
    assert!(matches!(err, RuntimeError::DroppedNamespace { .. }));
}

#[test]
fn invalid_import_names() {
    let resolver = resolver(&[]);
    assert!(matches!(resolver.import("a..b"), Err(OverlayError::InvalidName(_))));
    assert!(matches!(resolver.import("nope"), Err(OverlayError::NotFound { .. })));
}
