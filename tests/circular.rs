use store_injector::{DiError, Injector, ProviderEntry, StoreCreator};
use std::sync::{Arc, OnceLock};

#[test]
fn test_self_dependency_detected() {
    let slot: Arc<OnceLock<StoreCreator<u8>>> = Arc::new(OnceLock::new());
    let inner = slot.clone();
    let selfish = StoreCreator::try_labeled("selfish", move |ctx| {
        let me = inner.get().expect("creator installed");
        ctx.get_store(me).map(|v| *v)
    });
    slot.set(selfish.clone()).unwrap();

    let injector = Injector::builder(vec![selfish.clone()]).build().unwrap();

    match injector.get(&selfish) {
        Err(DiError::Circular(path)) => assert_eq!(path, vec!["selfish", "selfish"]),
        other => panic!("expected circular error, got {other:?}"),
    }
}

#[test]
fn test_two_store_cycle_reports_path() {
    let b_slot: Arc<OnceLock<StoreCreator<u32>>> = Arc::new(OnceLock::new());
    let b_ref = b_slot.clone();
    let a = StoreCreator::try_labeled("a", move |ctx| {
        let b = b_ref.get().expect("b installed");
        ctx.get_store(b).map(|v| *v + 1)
    });
    let a_dep = a.clone();
    let b = StoreCreator::try_labeled("b", move |ctx| ctx.get_store(&a_dep).map(|v| *v + 1));
    b_slot.set(b.clone()).unwrap();

    let injector = Injector::builder(vec![a.clone(), b.clone()]).build().unwrap();

    let err = injector.get(&a).unwrap_err();
    assert_eq!(err.to_string(), "Circular dependency: a -> b -> a");

    // The failed attempt leaves both records pending, not poisoned
    assert!(!injector.is_materialized(&a));
    assert!(!injector.is_materialized(&b));
}

#[test]
fn test_same_creator_in_parent_and_child_is_not_a_cycle() {
    // `base` is registered twice along the chain; each registration is its own record
    let base = StoreCreator::labeled("base", |_| 10u32);
    let base_dep = base.clone();
    let plus_one = StoreCreator::try_labeled("plus_one", move |ctx| ctx.get_store(&base_dep).map(|v| *v + 1));

    let parent = Injector::builder([ProviderEntry::from(base.clone()), plus_one.clone().into()])
        .build()
        .unwrap();
    let child = Injector::builder(vec![base.clone()]).parent(&parent).build().unwrap();

    assert_eq!(*child.get(&plus_one).unwrap(), 11);
}

#[test]
fn test_diamond_dependencies_are_fine() {
    let root = StoreCreator::labeled("root", |_| 1u32);
    let (r1, r2) = (root.clone(), root.clone());
    let left = StoreCreator::try_labeled("left", move |ctx| ctx.get_store(&r1).map(|v| *v * 2));
    let right = StoreCreator::try_labeled("right", move |ctx| ctx.get_store(&r2).map(|v| *v * 3));
    let (l, r) = (left.clone(), right.clone());
    let top = StoreCreator::try_labeled("top", move |ctx| {
        Ok(*ctx.get_store(&l)? + *ctx.get_store(&r)?)
    });

    let injector = Injector::builder(vec![root, left, right, top.clone()]).build().unwrap();
    assert_eq!(*injector.get(&top).unwrap(), 5);
}
