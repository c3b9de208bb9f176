//! Tests for modular binding registration.

use appcore_di::{BindingModule, BindingRegistry, DiError, DiResult, ExclusiveContract, Key, Resolver};
use std::sync::Arc;

#[derive(Debug)]
struct Config {
    name: String,
    value: u32,
}

#[derive(Debug)]
struct DatabaseService {
    config: Arc<Config>,
    connection_id: String,
}

trait Repository: Send + Sync {
    fn table(&self) -> &'static str;
}

struct UserRepository {
    db: Arc<DatabaseService>,
}

impl Repository for UserRepository {
    fn table(&self) -> &'static str {
        "users"
    }
}

appcore_di::implements!(UserRepository => dyn Repository);

struct ConfigModule;

impl BindingModule for ConfigModule {
    fn register(self, registry: &BindingRegistry) -> DiResult<()> {
        registry.register_singleton::<Config, Config, _>(|_| Config {
            name: "test-config".to_string(),
            value: 42,
        })?;
        Ok(())
    }
}

struct DataModule {
    prefix: &'static str,
}

impl BindingModule for DataModule {
    fn register(self, registry: &BindingRegistry) -> DiResult<()> {
        let prefix = self.prefix;
        registry
            .register_singleton::<DatabaseService, DatabaseService, _>(move |ctx| {
                let config = ctx.get_required::<Config>().unwrap();
                DatabaseService {
                    connection_id: format!("{prefix}-{}", config.value),
                    config,
                }
            })?
            .add_transient::<dyn Repository, UserRepository, _>(|ctx| UserRepository {
                db: ctx.get_required::<DatabaseService>().unwrap(),
            })?;
        Ok(())
    }
}

#[test]
fn test_modules_compose() {
    let registry = BindingRegistry::new();
    registry
        .install(ConfigModule)
        .unwrap()
        .install(DataModule { prefix: "conn" })
        .unwrap();

    assert_eq!(registry.len(), 3);
    let provider = registry.build();

    let repo = provider.get_required::<dyn Repository>().unwrap();
    assert_eq!(repo.table(), "users");

    let db = provider.get_required::<DatabaseService>().unwrap();
    assert_eq!(db.connection_id, "conn-42");
    assert_eq!(db.config.name, "test-config");
}

#[test]
fn test_module_order_does_not_matter_for_lazy_dependencies() {
    let registry = BindingRegistry::new();
    registry
        .install(DataModule { prefix: "late" })
        .unwrap()
        .install(ConfigModule)
        .unwrap();

    let db = registry.build().get_required::<DatabaseService>().unwrap();
    assert_eq!(db.connection_id, "late-42");
}

#[test]
fn test_closure_module() {
    let registry = BindingRegistry::new();
    registry
        .install(|r: &BindingRegistry| -> DiResult<()> {
            r.register_singleton::<u32, u32, _>(|_| 7)?;
            Ok(())
        })
        .unwrap();

    assert_eq!(*registry.build().get_required::<u32>().unwrap(), 7);
}

#[test]
fn test_module_error_propagates_and_earlier_registrations_stay() {
    struct Conflicting;

    impl BindingModule for Conflicting {
        fn register(self, registry: &BindingRegistry) -> DiResult<()> {
            registry
                .add_transient::<dyn Repository, UserRepository, _>(|ctx| UserRepository {
                    db: ctx.get_required::<DatabaseService>().unwrap(),
                })?
                .add_transient::<dyn Repository, UserRepository, _>(|ctx| UserRepository {
                    db: ctx.get_required::<DatabaseService>().unwrap(),
                })?;
            Ok(())
        }
    }

    let registry = BindingRegistry::new();
    registry.add_constraint_handler(Arc::new(ExclusiveContract::new().with::<dyn Repository>()));

    let err = registry.install(Conflicting).err().unwrap();
    assert!(matches!(err, DiError::ConstraintViolation { .. }));

    let bound = registry.bound_implementations(&Key::of::<dyn Repository>()).unwrap();
    assert_eq!(bound.len(), 1);
}

#[test]
fn test_shared_registry_across_threads() {
    let registry = Arc::new(BindingRegistry::new());

    let handles: Vec<_> = [0u8, 1u8]
        .into_iter()
        .map(|n| {
            let registry = registry.clone();
            std::thread::spawn(move || {
                if n == 0 {
                    registry.install(ConfigModule).map(|_| ())
                } else {
                    registry.install(DataModule { prefix: "mt" }).map(|_| ())
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap().unwrap();
    }

    let db = registry.build().get_required::<DatabaseService>().unwrap();
    assert_eq!(db.connection_id, "mt-42");
}
