use store_injector::{
    use_store, DiError, GetOptions, ProviderEntry, ProviderSpec, StoreCreator, StoreScope,
};
use std::sync::{Arc, Mutex};

#[test]
fn test_use_store_without_injector() {
    let user = StoreCreator::labeled("user", |_| String::from("ada"));

    assert!(matches!(
        use_store(None, &user, GetOptions::required()),
        Err(DiError::NoInjector)
    ));
    assert!(use_store(None, &user, GetOptions::optional()).unwrap().is_none());
}

#[tokio::test]
async fn test_mount_update_unmount_lifecycle() {
    let events: Arc<Mutex<Vec<String>>> = Default::default();

    let tracked = |label: &'static str| {
        let events = events.clone();
        StoreCreator::labeled(label, move |ctx| {
            let events = events.clone();
            ctx.on_unmounted(move || events.lock().unwrap().push(format!("{label} down")));
            label
        })
    };
    let layout = tracked("layout");
    let sidebar = tracked("sidebar");
    let toolbar = tracked("toolbar");

    let mut scope =
        StoreScope::mount(vec![layout.clone(), sidebar.clone()], None, Some("shell")).unwrap();
    let live_layout = use_store(Some(scope.injector()), &layout, GetOptions::required())
        .unwrap()
        .unwrap();
    scope.injector().get(&sidebar).unwrap();
    assert_eq!(scope.injector().name(), Some("shell"));

    // sidebar goes away, toolbar arrives, layout survives
    scope
        .update(vec![layout.clone(), toolbar.clone()], None)
        .await
        .unwrap();
    assert_eq!(*events.lock().unwrap(), vec!["sidebar down"]);
    assert!(Arc::ptr_eq(&live_layout, &scope.injector().get(&layout).unwrap()));
    assert_eq!(scope.injector().name(), Some("shell"));
    scope.injector().get(&toolbar).unwrap();

    scope.unmount().await;
    assert_eq!(
        *events.lock().unwrap(),
        vec!["sidebar down", "layout down", "toolbar down"]
    );
}

#[tokio::test]
async fn test_nested_scopes_resolve_through_parent() {
    let locale = StoreCreator::labeled("locale", |_| "en-GB");
    let form = StoreCreator::labeled("form", |_| Vec::<String>::new());

    let app = StoreScope::mount(vec![locale.clone()], None, Some("app")).unwrap();
    let page = StoreScope::mount(vec![form.clone()], Some(app.injector()), None).unwrap();

    let resolved = use_store(Some(page.injector()), &locale, GetOptions::required())
        .unwrap()
        .unwrap();
    assert_eq!(*resolved, "en-GB");

    page.unmount().await;
    app.unmount().await;
}

#[tokio::test]
async fn test_failed_update_keeps_current_generation() {
    let seeded = StoreCreator::labeled("seeded", |_| 1u8);
    let mut scope =
        StoreScope::mount(vec![ProviderSpec::new(seeded.clone()).with_use(Arc::new(4))], None, None)
            .unwrap();
    let before = scope.injector().id();

    let broken = ProviderEntry::Object {
        creator: None,
        use_value: None,
        dispose_on_unmounted: None,
    };
    assert!(scope.update(vec![broken], None).await.is_err());

    assert_eq!(scope.injector().id(), before);
    assert_eq!(*scope.injector().get(&seeded).unwrap(), 4);
    scope.unmount().await;
}
