// Catalog loading: local cache first, network second, background refresh
use crate::client::traits::CatalogApi;
use crate::config::AppConfig;
use crate::model::{ApiError, ConfigData};
use crate::storage::{CatalogCache, LocalStore};
use chrono::Duration;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Cache,
    ConfigData,
    /// `/coffee-machines` + `/specs`, used when `/config-data` fails.
    Fallback,
}

/// Result of `DataLoader::load`.
///
/// `refresh` is set when cached data was served; it yields fresh data once
/// the backend reports a different version.
pub struct LoadOutcome {
    pub data: ConfigData,
    pub source: DataSource,
    pub refresh: Option<JoinHandle<Option<ConfigData>>>,
}

/// Cached data is stale unless both versions are known and equal.
pub fn needs_refresh(cached: Option<&str>, remote: Option<&str>) -> bool {
    match (cached, remote) {
        (Some(c), Some(r)) => c != r,
        _ => true,
    }
}

/// Fetches the catalog, falling back to the two-request form.
pub async fn fetch_catalog<A: CatalogApi + ?Sized>(api: &A) -> Result<(ConfigData, DataSource), ApiError> {
    match api.config_data().await {
        Ok(data) => Ok((data, DataSource::ConfigData)),
        Err(e) => {
            warn!("⚠️ config-data failed ({}), falling back to machines + specs", e);
            let (machines, specs) = futures::try_join!(api.coffee_machines(), api.specs())?;
            Ok((
                ConfigData {
                    machines,
                    specs,
                    version: None,
                },
                DataSource::Fallback,
            ))
        }
    }
}

pub struct DataLoader<A: CatalogApi + 'static> {
    api: Arc<A>,
    store: Arc<Mutex<LocalStore>>,
    ttl: Duration,
    check_version: bool,
}

impl<A: CatalogApi + 'static> DataLoader<A> {
    pub fn new(api: Arc<A>, store: Arc<Mutex<LocalStore>>, config: &AppConfig) -> Self {
        Self {
            api,
            store,
            ttl: config.cache_ttl(),
            check_version: config.check_version,
        }
    }

    pub async fn load(&self) -> Result<LoadOutcome, ApiError> {
        let cached = {
            let store = self.store.lock().await;
            CatalogCache::load(&store, self.ttl)
        };

        if let Some(data) = cached {
            info!("💾 Found cached data (version {:?})", data.version);
            let refresh = self
                .check_version
                .then(|| self.spawn_refresh(data.version.clone()));
            return Ok(LoadOutcome {
                data,
                source: DataSource::Cache,
                refresh,
            });
        }

        let (data, source) = fetch_catalog(self.api.as_ref()).await?;
        CatalogCache::save(&*self.store.lock().await, &data);
        Ok(LoadOutcome {
            data,
            source,
            refresh: None,
        })
    }

    fn spawn_refresh(&self, cached_version: Option<String>) -> JoinHandle<Option<ConfigData>> {
        let api = Arc::clone(&self.api);
        let store = Arc::clone(&self.store);

        tokio::spawn(async move {
            let remote = match api.config_version().await {
                Ok(v) => v,
                Err(e) => {
                    warn!("⚠️ Failed to check cache version, using cached data: {}", e);
                    return None;
                }
            };
            if !needs_refresh(cached_version.as_deref(), remote.as_deref()) {
                debug!("✓ Cache is up to date");
                return None;
            }

            info!("🔄 Cache outdated ({:?} → {:?}), refreshing data", cached_version, remote);
            match fetch_catalog(api.as_ref()).await {
                Ok((data, _)) => {
                    CatalogCache::save(&*store.lock().await, &data);
                    Some(data)
                }
                Err(e) => {
                    warn!("⚠️ Background refresh failed: {}", e);
                    None
                }
            }
        })
    }
}
