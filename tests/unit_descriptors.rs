//! Unit tests for bindings and binding descriptors.

use appcore_di::{Binding, BindingDescriptor, DiError, Key, Lifetime, ResolvePolicy, Resolver};
use std::sync::Arc;

trait Job: Send + Sync {}
struct Cleanup;
impl Job for Cleanup {}
struct Backup;
impl Job for Backup {}

appcore_di::implements!(Cleanup => dyn Job);
appcore_di::implements!(Backup => dyn Job);

#[test]
fn test_binding_identity() {
    let binding = Binding::new::<dyn Job, Cleanup, _>(|_| Cleanup);
    assert_eq!(binding.contract(), Key::of::<dyn Job>());
    assert!(binding.implementation().is::<Cleanup>());
    assert!(format!("{binding:?}").contains("Cleanup"));
}

#[test]
fn test_descriptor_keeps_order() {
    let descriptor = BindingDescriptor::new(
        Key::of::<dyn Job>(),
        Lifetime::Transient,
        vec![
            Binding::new::<dyn Job, Backup, _>(|_| Backup),
            Binding::new::<dyn Job, Cleanup, _>(|_| Cleanup),
        ],
    )
    .unwrap();

    assert_eq!(descriptor.len(), 2);
    assert!(!descriptor.is_empty());
    assert_eq!(descriptor.lifetime(), Lifetime::Transient);
    let implementations = descriptor.implementations();
    assert!(implementations[0].is::<Backup>());
    assert!(implementations[1].is::<Cleanup>());
}

#[test]
fn test_descriptor_rejects_foreign_binding() {
    let result = BindingDescriptor::new(
        Key::of::<dyn Job>(),
        Lifetime::Singleton,
        vec![Binding::new::<String, String, _>(|_| String::new())],
    );
    assert!(matches!(result, Err(DiError::NotAssignable { .. })));
}

#[test]
fn test_single_descriptor_takes_binding_contract() {
    let descriptor = BindingDescriptor::single(
        Lifetime::Singleton,
        Binding::new::<dyn Job, Cleanup, _>(|_| Cleanup),
    );
    assert_eq!(descriptor.contract(), Key::of::<dyn Job>());
    assert_eq!(descriptor.len(), 1);
}

#[test]
fn test_instance_binding_hands_out_same_object() {
    let shared = Arc::new(Cleanup);
    let registry = appcore_di::BindingRegistry::new();
    registry
        .register_transient_set::<dyn Job>(vec![Binding::instance::<dyn Job, Cleanup>(shared.clone())])
        .unwrap();
    let provider = registry.build();

    let a = provider.resolve::<dyn Job>(ResolvePolicy::BROADCAST_FRESH).unwrap().unwrap();
    let b = provider.resolve::<dyn Job>(ResolvePolicy::BROADCAST_FRESH).unwrap().unwrap();
    assert!(Arc::ptr_eq(&a[0], &b[0]));

    let expected: Arc<dyn Job> = shared;
    assert!(Arc::ptr_eq(&a[0], &expected));
}
