use std::sync::{Arc, RwLock};

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use shared_database::supabase::SupabaseClient;
use shared_utils::clock::Clock;

use crate::models::{Professional, Service};
use crate::state::AppState;

/// Read-through cache over the professional and service listings.
///
/// Listing staleness up to the TTL is acceptable: the cache only feeds the
/// browse/read path, never the final booking conflict check. Owned by the
/// process (lives in `AppState`) with an injected clock, so expiry is
/// testable and tests cannot pollute each other through module state.
pub struct CatalogCache {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    professionals: RwLock<Option<CacheEntry<Vec<Professional>>>>,
    services: RwLock<Option<CacheEntry<Vec<Service>>>>,
}

struct CacheEntry<T> {
    fetched_at: DateTime<Utc>,
    value: T,
}

pub const CATALOG_TTL_MINUTES: i64 = 5;

impl CatalogCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(clock, Duration::minutes(CATALOG_TTL_MINUTES))
    }

    pub fn with_ttl(clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            clock,
            ttl,
            professionals: RwLock::new(None),
            services: RwLock::new(None),
        }
    }

    pub fn cached_professionals(&self) -> Option<Vec<Professional>> {
        self.read_fresh(&self.professionals)
    }

    pub fn store_professionals(&self, professionals: Vec<Professional>) {
        self.store(&self.professionals, professionals);
    }

    pub fn cached_services(&self) -> Option<Vec<Service>> {
        self.read_fresh(&self.services)
    }

    pub fn store_services(&self, services: Vec<Service>) {
        self.store(&self.services, services);
    }

    /// Drop both listings; the next read goes to the store.
    pub fn invalidate(&self) {
        *lock_write(&self.professionals) = None;
        *lock_write(&self.services) = None;
    }

    fn read_fresh<T: Clone>(&self, slot: &RwLock<Option<CacheEntry<T>>>) -> Option<T> {
        let guard = slot.read().unwrap_or_else(|e| e.into_inner());
        let entry = guard.as_ref()?;
        if self.clock.now() - entry.fetched_at < self.ttl {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    fn store<T>(&self, slot: &RwLock<Option<CacheEntry<T>>>, value: T) {
        *lock_write(slot) = Some(CacheEntry {
            fetched_at: self.clock.now(),
            value,
        });
    }
}

fn lock_write<T>(slot: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    slot.write().unwrap_or_else(|e| e.into_inner())
}

pub struct ProfessionalService {
    supabase: Arc<SupabaseClient>,
    catalog: Arc<CatalogCache>,
}

impl ProfessionalService {
    pub fn new(state: &AppState) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(&state.config)),
            catalog: state.catalog.clone(),
        }
    }

    /// Active professionals, cached for a few minutes.
    pub async fn list_professionals(&self) -> Result<Vec<Professional>> {
        if let Some(cached) = self.catalog.cached_professionals() {
            debug!("Serving professional listing from cache");
            return Ok(cached);
        }

        let result: Vec<Value> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/professionals?isActive=eq.true&order=name.asc",
                None,
            )
            .await?;

        let professionals: Vec<Professional> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<_, _>>()?;

        self.catalog.store_professionals(professionals.clone());
        Ok(professionals)
    }

    /// Uncached single-professional read.
    pub async fn get_professional(&self, professional_id: &str) -> Result<Option<Professional>> {
        let path = format!(
            "/rest/v1/professionals?id=eq.{}",
            urlencoding::encode(professional_id)
        );
        let result: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        match result.into_iter().next() {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Active services, cached for a few minutes.
    pub async fn list_services(&self) -> Result<Vec<Service>> {
        if let Some(cached) = self.catalog.cached_services() {
            debug!("Serving service listing from cache");
            return Ok(cached);
        }

        let result: Vec<Value> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/services?isActive=eq.true&order=name.asc",
                None,
            )
            .await?;

        let services: Vec<Service> = result
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<_, _>>()?;

        self.catalog.store_services(services.clone());
        Ok(services)
    }

    pub fn invalidate_catalog(&self) {
        self.catalog.invalidate();
    }
}
