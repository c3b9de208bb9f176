use appcore_di::{Binding, BindingRegistry, ContainerOptions, DiError, DiResult, Resolver};
use std::error::Error as _;
use std::sync::Arc;

/// Finds the innermost `DiError` in a factory error chain.
fn root_cause(err: &DiError) -> &DiError {
    let mut current = err;
    while let Some(next) = current
        .source()
        .and_then(|s| s.downcast_ref::<DiError>())
    {
        current = next;
    }
    current
}

fn assert_cycle(err: &DiError, expected: &[&str]) {
    match root_cause(err) {
        DiError::Circular(path) => {
            assert_eq!(path.len(), expected.len(), "wrong path: {path:?}");
            for (segment, name) in path.iter().zip(expected) {
                assert!(segment.ends_with(name), "{segment} does not end with {name}");
            }
        }
        other => panic!("expected a cycle, got {other}"),
    }
}

#[test]
fn test_self_circular_dependency() {
    struct SelfReferencing;

    let registry = BindingRegistry::new();
    registry
        .register_singleton_binding(Binding::fallible::<SelfReferencing, SelfReferencing, _, _>(
            |ctx| -> DiResult<SelfReferencing> {
                ctx.get_required::<SelfReferencing>()?;
                Ok(SelfReferencing)
            },
        ))
        .unwrap();
    let provider = registry.build();

    let err = provider.get::<SelfReferencing>().err().unwrap();
    assert_cycle(&err, &["SelfReferencing", "SelfReferencing"]);
}

#[test]
fn test_two_way_cycle_reports_path() {
    struct ServiceA;
    struct ServiceB;

    let registry = BindingRegistry::new();
    registry
        .register_singleton_binding(Binding::fallible::<ServiceA, ServiceA, _, _>(
            |ctx| -> DiResult<ServiceA> {
                ctx.get_required::<ServiceB>()?;
                Ok(ServiceA)
            },
        ))
        .unwrap()
        .register_transient_set::<ServiceB>(vec![Binding::fallible::<ServiceB, ServiceB, _, _>(
            |ctx| -> DiResult<ServiceB> {
                ctx.get_required::<ServiceA>()?;
                Ok(ServiceB)
            },
        )])
        .unwrap();
    let provider = registry.build();

    let err = provider.get::<ServiceA>().err().unwrap();
    assert!(matches!(err, DiError::Factory { .. }));
    assert_cycle(&err, &["ServiceA", "ServiceB", "ServiceA"]);
}

#[test]
fn test_failed_cycle_does_not_poison_provider() {
    struct Leaf;
    struct Looping;

    let registry = BindingRegistry::new();
    registry
        .register_singleton::<Leaf, Leaf, _>(|_| Leaf)
        .unwrap()
        .register_singleton_binding(Binding::fallible::<Looping, Looping, _, _>(
            |ctx| -> DiResult<Looping> {
                ctx.get_required::<Looping>()?;
                Ok(Looping)
            },
        ))
        .unwrap();
    let provider = registry.build();

    assert!(provider.get::<Looping>().is_err());
    assert!(provider.get::<Looping>().is_err());
    // the resolution stack unwound cleanly
    let a = provider.get_required::<Leaf>().unwrap();
    let b = provider.get_required::<Leaf>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

#[test]
fn test_diamond_is_not_a_cycle() {
    struct Shared;
    struct Left(Arc<Shared>);
    struct Right(Arc<Shared>);
    struct Top(Arc<Left>, Arc<Right>);

    let registry = BindingRegistry::new();
    registry
        .register_singleton::<Shared, Shared, _>(|_| Shared)
        .unwrap()
        .register_transient::<Left, Left, _>(|ctx| Left(ctx.get_required::<Shared>().unwrap()))
        .unwrap()
        .register_transient::<Right, Right, _>(|ctx| Right(ctx.get_required::<Shared>().unwrap()))
        .unwrap()
        .register_transient::<Top, Top, _>(|ctx| {
            Top(
                ctx.get_required::<Left>().unwrap(),
                ctx.get_required::<Right>().unwrap(),
            )
        })
        .unwrap();

    let top = registry.build().get_required::<Top>().unwrap();
    assert!(Arc::ptr_eq(&top.0 .0, &top.1 .0));
}

#[test]
fn test_depth_limit() {
    struct Level1;
    struct Level2;
    struct Level3;

    let registry = BindingRegistry::with_options(ContainerOptions::new().max_depth(2));
    registry
        .register_transient_set::<Level1>(vec![Binding::fallible::<Level1, Level1, _, _>(
            |ctx| -> DiResult<Level1> {
                ctx.get_required::<Level2>()?;
                Ok(Level1)
            },
        )])
        .unwrap()
        .register_transient_set::<Level2>(vec![Binding::fallible::<Level2, Level2, _, _>(
            |ctx| -> DiResult<Level2> {
                ctx.get_required::<Level3>()?;
                Ok(Level2)
            },
        )])
        .unwrap()
        .register_transient::<Level3, Level3, _>(|_| Level3)
        .unwrap();
    let provider = registry.build();

    let err = provider.get::<Level1>().err().unwrap();
    assert!(matches!(root_cause(&err), DiError::DepthExceeded(2)));

    // two levels fit
    assert!(provider.get::<Level2>().unwrap().is_some());
}

#[test]
fn test_same_contract_across_containers_is_not_a_cycle() {
    struct Settings(&'static str);

    let parent_registry = BindingRegistry::new();
    parent_registry
        .register_singleton::<Settings, Settings, _>(|_| Settings("parent"))
        .unwrap();
    let parent = parent_registry.build();

    let child_registry = BindingRegistry::new();
    let upstream = parent.clone();
    child_registry
        .register_singleton_binding(Binding::fallible::<Settings, Settings, _, _>(
            move |_| -> DiResult<Settings> {
                let inherited = upstream.get_required::<Settings>()?;
                Ok(Settings(inherited.0))
            },
        ))
        .unwrap();
    let child = child_registry.build();

    assert_eq!(child.get_required::<Settings>().unwrap().0, "parent");
}

#[test]
fn test_cycle_through_another_container_is_still_reported() {
    struct Loop;

    let registry = BindingRegistry::new();
    registry
        .register_singleton_binding(Binding::fallible::<Loop, Loop, _, _>(
            |ctx| -> DiResult<Loop> {
                ctx.get_required::<Loop>()?;
                Ok(Loop)
            },
        ))
        .unwrap();
    let provider = registry.build();

    let outer_registry = BindingRegistry::new();
    let inner = provider.clone();
    outer_registry
        .register_transient_set::<Loop>(vec![Binding::fallible::<Loop, Loop, _, _>(
            move |_| -> DiResult<Loop> {
                inner.get_required::<Loop>()?;
                Ok(Loop)
            },
        )])
        .unwrap();

    let err = outer_registry.build().get::<Loop>().err().unwrap();
    assert_cycle(&err, &["Loop", "Loop"]);
}
