use appcore_di::{
    activation_fn, Activation, ActivationLog, Binding, BindingRegistry, ContainerOptions, DiError,
    Key, ResolvePolicy, Resolver,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

trait Handler: Send + Sync {
    fn id(&self) -> u8;
}

struct Audit;
impl Handler for Audit {
    fn id(&self) -> u8 {
        1
    }
}

struct Billing;
impl Handler for Billing {
    fn id(&self) -> u8 {
        2
    }
}

appcore_di::implements!(Audit => dyn Handler);
appcore_di::implements!(Billing => dyn Handler);

fn handler_chain(registry: &BindingRegistry) {
    registry
        .register_transient_set::<dyn Handler>(vec![
            Binding::new::<dyn Handler, Audit, _>(|_| Audit),
            Binding::new::<dyn Handler, Billing, _>(|_| Billing),
        ])
        .unwrap();
}

#[test]
fn test_activation_fires_once_per_cached_instance() {
    let log = Arc::new(ActivationLog::new());
    let registry = BindingRegistry::new();
    registry.add_activation_handler(log.clone());
    handler_chain(&registry);
    let provider = registry.build();

    for _ in 0..3 {
        provider.resolve::<dyn Handler>(ResolvePolicy::BROADCAST_CACHED).unwrap();
    }

    assert_eq!(log.len(), 2);
    assert_eq!(log.count_of::<Audit>(), 1);
    assert_eq!(log.count_of::<Billing>(), 1);
}

#[test]
fn test_activation_fires_on_every_fresh_resolution() {
    let log = Arc::new(ActivationLog::new());
    let registry = BindingRegistry::new();
    registry.add_activation_handler(log.clone());
    handler_chain(&registry);
    let provider = registry.build();

    for _ in 0..3 {
        provider.resolve::<dyn Handler>(ResolvePolicy::BROADCAST_FRESH).unwrap();
    }

    assert_eq!(log.count_of::<Audit>(), 3);
    assert_eq!(log.count_of::<Billing>(), 3);

    // first-wins touches only the head
    log.clear();
    provider.resolve::<dyn Handler>(ResolvePolicy::FIRST_WINS).unwrap();
    assert_eq!(log.count_of::<Audit>(), 1);
    assert_eq!(log.count_of::<Billing>(), 0);
}

#[test]
fn test_activation_sees_requested_contract_and_concrete_instance() {
    let log = Arc::new(ActivationLog::new());
    let ids = Arc::new(Mutex::new(Vec::new()));
    let sink = ids.clone();

    let registry = BindingRegistry::new();
    registry.add_activation_handler(log.clone());
    registry.add_activation_handler(activation_fn(move |a: &Activation<'_>| {
        if let Some(handler) = a.downcast::<dyn Handler>() {
            sink.lock().push(handler.id());
        }
        assert!(a.concrete::<Audit>().is_some() || a.concrete::<Billing>().is_some());
        Ok(())
    }));
    handler_chain(&registry);
    registry.build().get_all::<dyn Handler>().unwrap();

    assert_eq!(*ids.lock(), vec![1, 2]);
    let entries = log.entries();
    assert!(entries.iter().all(|(contract, _)| *contract == Key::of::<dyn Handler>()));
}

#[test]
fn test_handlers_run_in_registration_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let (first, second) = (order.clone(), order.clone());

    let registry = BindingRegistry::new();
    registry.add_activation_handler(activation_fn(move |_: &Activation<'_>| {
        first.lock().push("first");
        Ok(())
    }));
    registry.add_activation_handler(activation_fn(move |_: &Activation<'_>| {
        second.lock().push("second");
        Ok(())
    }));
    registry
        .register_singleton::<Audit, Audit, _>(|_| Audit)
        .unwrap();

    registry.build().get_required::<Audit>().unwrap();
    assert_eq!(*order.lock(), vec!["first", "second"]);
}

#[test]
fn test_failing_handler_aborts_and_nothing_is_cached() {
    let fail = Arc::new(AtomicUsize::new(1));
    let gate = fail.clone();
    let built = Arc::new(AtomicUsize::new(0));
    let counter = built.clone();

    let registry = BindingRegistry::new();
    registry.add_activation_handler(activation_fn(move |_: &Activation<'_>| {
        if gate.load(Ordering::SeqCst) > 0 {
            gate.fetch_sub(1, Ordering::SeqCst);
            return Err("not started".into());
        }
        Ok(())
    }));
    registry
        .register_singleton::<Audit, Audit, _>(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Audit
        })
        .unwrap();
    let provider = registry.build();

    let err = provider.get::<Audit>().err().unwrap();
    assert!(matches!(err, DiError::Activation { .. }));
    assert!(err.to_string().contains("not started"));

    // the retry builds again, so the failed instance never reached the cache
    let a = provider.get_required::<Audit>().unwrap();
    let b = provider.get_required::<Audit>().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(built.load(Ordering::SeqCst), 2);
}

#[test]
fn test_same_activation_handler_is_added_once() {
    let log = Arc::new(ActivationLog::new());
    let registry = BindingRegistry::new();

    assert!(registry.add_activation_handler(log.clone()));
    assert!(!registry.add_activation_handler(log.clone()));
    assert_eq!(registry.activation_handler_count(), 1);
}

#[test]
fn test_logging_handler_is_installed_by_options() {
    let registry = BindingRegistry::with_options(ContainerOptions::new().log_activations(true));
    assert_eq!(registry.activation_handler_count(), 1);

    registry.register_singleton::<Audit, Audit, _>(|_| Audit).unwrap();
    assert!(registry.build().get::<Audit>().unwrap().is_some());
}

#[derive(Clone, Default)]
struct CapturedOutput(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for CapturedOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn test_activation_events_reach_subscriber() {
    let output = CapturedOutput::default();
    let writer = output.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter("appcore_di=debug")
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let loggers = tracing::subscriber::with_default(subscriber, || {
        let registry = BindingRegistry::with_options(
            ContainerOptions::new().host("activation-test").log_activations(true),
        );
        handler_chain(&registry);
        registry.build().get_all::<dyn Handler>().unwrap()
    });
    assert_eq!(loggers.len(), 2);

    let text = String::from_utf8(output.0.lock().clone()).unwrap();
    let events: Vec<&str> = text.lines().filter(|l| l.contains("instance activated")).collect();
    assert_eq!(events.len(), 2, "captured: {text}");
    assert!(events.iter().all(|l| l.contains("activation-test")));
    assert!(events[0].contains("Audit"));
    assert!(events[1].contains("Billing"));
}
