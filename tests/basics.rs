use store_injector::{DiError, GetOptions, Injector, ProviderEntry, ProviderSpec, StoreCreator};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn test_lazy_and_memoized() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let store = StoreCreator::labeled("store", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        String::from("value")
    });

    let injector = Injector::builder(vec![store.clone()]).build().unwrap();
    // Nothing runs at construction
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!injector.is_materialized(&store));

    let first = injector.get(&store).unwrap();
    let second = injector.get(&store).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(Arc::ptr_eq(&first, &second));
    assert!(injector.is_materialized(&store));
}

#[test]
fn test_factory_with_dependencies() {
    #[derive(Debug)]
    struct Config {
        port: u16,
    }

    #[derive(Debug)]
    struct Server {
        config: Arc<Config>,
        name: String,
    }

    let config = StoreCreator::labeled("config", |_| Config { port: 8080 });
    let config_dep = config.clone();
    let server = StoreCreator::try_labeled("server", move |ctx| {
        Ok(Server {
            config: ctx.get_store(&config_dep)?,
            name: "MyServer".to_string(),
        })
    });

    let injector = Injector::builder([ProviderEntry::from(config.clone()), server.clone().into()])
        .build()
        .unwrap();
    let server = injector.get(&server).unwrap();

    assert_eq!(server.config.port, 8080);
    assert_eq!(server.name, "MyServer");
    assert!(Arc::ptr_eq(&server.config, &injector.get(&config).unwrap()));
}

#[test]
fn test_identity_not_name() {
    // Same label, same closure body, still two distinct creators
    let a = StoreCreator::labeled("twin", |_| 1u32);
    let b = StoreCreator::labeled("twin", |_| 1u32);

    let injector = Injector::builder(vec![a.clone()]).build().unwrap();

    assert!(injector.is_provided(&a));
    assert!(!injector.is_provided(&b));
    assert!(matches!(injector.get(&b), Err(DiError::NotFound(label)) if label == "twin"));
}

#[test]
fn test_missing_store_optional_and_required() {
    let absent = StoreCreator::labeled("absent", |_| 0u8);
    let injector = Injector::builder(Vec::<StoreCreator<u8>>::new()).build().unwrap();

    assert!(injector.get_optional(&absent).unwrap().is_none());
    assert!(injector.get_with(&absent, GetOptions::optional()).unwrap().is_none());

    let err = injector.get(&absent).unwrap_err();
    assert_eq!(err.to_string(), "Store not provided and not optional: absent");
}

#[test]
fn test_pre_seeded_use_skips_factory() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let cart = StoreCreator::labeled("cart", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        vec![0u32]
    });
    let seed = Arc::new(vec![7u32, 8]);

    let injector = Injector::builder(vec![ProviderSpec::new(cart.clone()).with_use(seed.clone())])
        .build()
        .unwrap();

    // Seeded records count as materialized from the start
    assert!(injector.is_materialized(&cart));
    assert!(Arc::ptr_eq(&injector.get(&cart).unwrap(), &seed));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_invalid_provider_entries() {
    let missing_creator = ProviderEntry::Object {
        creator: None,
        use_value: None,
        dispose_on_unmounted: Some(false),
    };
    let err = Injector::builder(vec![missing_creator]).build().unwrap_err();
    assert!(matches!(err, DiError::Config(_)));
    assert_eq!(
        err.to_string(),
        "Provider config error [{ creator: none, dispose_on_unmounted: false }]"
    );

    // A seed of the wrong type is rejected up front
    let numbers = StoreCreator::labeled("numbers", |_| 1u64);
    let wrong_seed = ProviderEntry::Object {
        creator: Some(numbers.erase()),
        use_value: Some(Arc::new("text")),
        dispose_on_unmounted: None,
    };
    assert!(matches!(
        Injector::builder(vec![wrong_seed]).build(),
        Err(DiError::Config(_))
    ));
}

#[test]
fn test_duplicate_creator_last_entry_wins() {
    let theme = StoreCreator::labeled("theme", |_| "default");
    let first = Arc::new("first");
    let last = Arc::new("last");

    let injector = Injector::builder(vec![
        ProviderSpec::new(theme.clone()).with_use(first),
        ProviderSpec::new(theme.clone()).with_use(last.clone()),
    ])
    .build()
    .unwrap();

    assert!(Arc::ptr_eq(&injector.get(&theme).unwrap(), &last));
    assert_eq!(injector.keys().count(), 1);
}

#[test]
fn test_factory_errors_propagate_and_leave_record_pending() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let counter = attempts.clone();
    let flaky = StoreCreator::try_labeled("flaky", move |_| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            Err(DiError::factory(std::io::Error::other("first try fails")))
        } else {
            Ok(5u8)
        }
    });

    let injector = Injector::builder(vec![flaky.clone()]).build().unwrap();

    let err = injector.get(&flaky).unwrap_err();
    assert_eq!(err.to_string(), "Store factory failed: first try fails");
    assert!(!injector.is_materialized(&flaky));

    assert_eq!(*injector.get(&flaky).unwrap(), 5);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn test_store_id_format() {
    let named = Injector::builder(Vec::<ProviderEntry>::new())
        .name("scopeA")
        .build()
        .unwrap();
    let unnamed = Injector::builder(Vec::<ProviderEntry>::new()).build().unwrap();
    let empty_name = Injector::builder(Vec::<ProviderEntry>::new())
        .name("")
        .build()
        .unwrap();

    assert_eq!(named.store_id("x"), format!("x~[scopeA]~<{}>", named.id()));
    assert_eq!(unnamed.store_id("x"), format!("x~<{}>", unnamed.id()));
    assert_eq!(empty_name.name(), None);
    assert_eq!(empty_name.store_id("x"), format!("x~<{}>", empty_name.id()));
}

#[test]
fn test_injector_ids_are_unique_and_increasing() {
    let a = Injector::builder(Vec::<ProviderEntry>::new()).build().unwrap();
    let b = Injector::builder(Vec::<ProviderEntry>::new()).build().unwrap();

    assert_ne!(a.id(), b.id());
    assert!(b.id() > a.id());
}

#[test]
fn test_context_exposes_owning_injector() {
    let tag = StoreCreator::try_labeled("tag", |ctx| {
        Ok((ctx.injector_id(), ctx.injector_name().map(str::to_owned), ctx.use_store_id("tag")))
    });

    let injector = Injector::builder(vec![tag.clone()]).name("root").build().unwrap();
    let tag = injector.get(&tag).unwrap();

    assert_eq!(tag.0, injector.id());
    assert_eq!(tag.1.as_deref(), Some("root"));
    assert_eq!(tag.2, format!("tag~[root]~<{}>", injector.id()));
}

#[test]
fn test_concurrent_first_access_materializes_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let slow = StoreCreator::labeled("slow", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(std::time::Duration::from_millis(20));
        42u64
    });

    let injector = Injector::builder(vec![slow.clone()]).build().unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let injector = injector.clone();
            let slow = slow.clone();
            std::thread::spawn(move || injector.get(&slow).unwrap())
        })
        .collect();
    let results: Vec<Arc<u64>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(results.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[tokio::test]
async fn test_tracing_observer_inherited_by_children() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("store_injector=debug,info"))
        .with_test_writer()
        .try_init();

    let root_store = StoreCreator::labeled("root_store", |_| 1u8);
    let child_store = StoreCreator::labeled("child_store", |_| 2u8);

    let root = Injector::builder(vec![root_store.clone()])
        .observer(Arc::new(store_injector::TracingObserver::with_label("checkout")))
        .build()
        .unwrap();
    let child = Injector::builder(vec![child_store.clone()]).parent(&root).build().unwrap();

    assert_eq!(*child.get(&child_store).unwrap(), 2);
    assert_eq!(*child.get(&root_store).unwrap(), 1);

    child.dispose().await;
    root.dispose().await;
}
