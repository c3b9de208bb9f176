//! Startup pre-warming of singleton contracts.
//!
//! The host's startup sequencer enumerates everything that has to exist at
//! boot and instantiates it before accepting work. Pre-warming walks the
//! singleton-tagged contracts in registration order, so the first real
//! request never pays for construction and a broken factory is reported
//! at startup rather than mid-flight.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::lifetime::{Cardinality, Lifetime, ResolvePolicy};
use crate::provider::ServiceProvider;
use crate::traits::ResolverCore;

/// Outcome of pre-warming one contract.
#[derive(Debug, Clone)]
pub struct ReadinessResult {
    /// The contract that was materialized
    pub key: Key,
    pub success: bool,
    /// Rendered error if materialization failed
    pub error: Option<String>,
    pub duration: Duration,
}

impl ReadinessResult {
    pub fn success(key: Key, duration: Duration) -> Self {
        Self {
            key,
            success: true,
            error: None,
            duration,
        }
    }

    pub fn failure(key: Key, error: String, duration: Duration) -> Self {
        Self {
            key,
            success: false,
            error: Some(error),
            duration,
        }
    }
}

/// Results of a pre-warm pass.
#[derive(Debug, Clone, Default)]
pub struct ReadinessReport {
    pub services: Vec<ReadinessResult>,
    pub total_duration: Duration,
}

impl ReadinessReport {
    pub fn all_ready(&self) -> bool {
        self.services.iter().all(|r| r.success)
    }

    pub fn ready_count(&self) -> usize {
        self.services.iter().filter(|r| r.success).count()
    }

    pub fn failed_count(&self) -> usize {
        self.services.iter().filter(|r| !r.success).count()
    }

    pub fn failures(&self) -> Vec<&ReadinessResult> {
        self.services.iter().filter(|r| !r.success).collect()
    }
}

impl ServiceProvider {
    /// Materializes every statically registered singleton contract.
    ///
    /// Each contract is resolved first-wins and cached, exactly as a later
    /// `get` would. A failure is recorded and the pass continues with the
    /// next contract. Transient contracts are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use appcore_di::BindingRegistry;
    ///
    /// struct Cache;
    /// struct Pool;
    ///
    /// let registry = BindingRegistry::new();
    /// registry.register_singleton::<Cache, Cache, _>(|_| Cache).unwrap();
    /// registry.register_singleton::<Pool, Pool, _>(|_| Pool).unwrap();
    ///
    /// let provider = registry.build();
    /// let report = provider.prewarm();
    /// assert!(report.all_ready());
    /// assert_eq!(report.ready_count(), 2);
    /// ```
    pub fn prewarm(&self) -> ReadinessReport {
        let started = Instant::now();
        let mut services = Vec::new();

        for key in self.singleton_contracts() {
            let t0 = Instant::now();
            match self.resolve_erased(&key, ResolvePolicy::SINGLETON) {
                Ok(_) => services.push(ReadinessResult::success(key, t0.elapsed())),
                Err(err) => {
                    warn!(contract = key.display_name(), error = %err, "prewarm failed");
                    services.push(ReadinessResult::failure(key, err.to_string(), t0.elapsed()));
                }
            }
        }

        let report = ReadinessReport {
            services,
            total_duration: started.elapsed(),
        };
        info!(
            host = %self.host(),
            ready = report.ready_count(),
            failed = report.failed_count(),
            elapsed_ms = report.total_duration.as_millis() as u64,
            "prewarm finished"
        );
        report
    }

    /// Materializes every singleton contract, stopping at the first failure.
    pub fn ensure_ready(&self) -> DiResult<()> {
        for key in self.singleton_contracts() {
            self.resolve_by_lifetime(&key, Cardinality::First)?
                .ok_or(DiError::NotFound(key.display_name()))?;
        }
        Ok(())
    }

    fn singleton_contracts(&self) -> Vec<Key> {
        let inner = self.inner();
        inner
            .order
            .iter()
            .filter(|key| {
                inner
                    .snapshot
                    .get(*key)
                    .is_some_and(|d| d.lifetime() == Lifetime::Singleton)
            })
            .copied()
            .collect()
    }
}
