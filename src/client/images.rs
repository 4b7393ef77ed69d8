use crate::catalog::Catalog;
use crate::client::fetcher::{USER_AGENT, send_checked};
use crate::model::ApiError;
use crate::resolver::image::variant_image_urls;
use futures::future::join_all;
use reqwest::Client;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Tags image loads so that only the most recently issued one is applied.
#[derive(Debug, Default)]
pub struct ImageLoadSequencer {
    latest: AtomicU64,
}

impl ImageLoadSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a load and returns its ticket; older tickets become stale.
    pub fn begin(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_current(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }

    /// Passes `value` through only if `ticket` is still the latest one.
    pub fn complete<T>(&self, ticket: u64, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            debug!("Dropping stale image load #{}", ticket);
            None
        }
    }
}

/// Warms up every image a catalog can show.
pub struct ImagePreloader {
    client: Client,
    loaded: Arc<Mutex<HashSet<String>>>,
}

impl ImagePreloader {
    pub fn new(timeout: std::time::Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            loaded: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    /// URLs of all variants, first occurrence wins.
    pub fn catalog_urls(catalog: &Catalog, backend_base: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        catalog
            .machines
            .iter()
            .flat_map(|m| variant_image_urls(m, backend_base))
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }

    pub async fn is_loaded(&self, url: &str) -> bool {
        self.loaded.lock().await.contains(url)
    }

    /// Absolute http(s) URLs only; inline `data:` and relative sources are skipped.
    pub fn is_fetchable(url: &str) -> bool {
        url.starts_with("http://") || url.starts_with("https://")
    }

    /// Fetches the URLs not loaded yet, concurrently. Returns how many succeeded.
    pub async fn preload(&self, urls: &[String]) -> usize {
        let pending: Vec<String> = {
            let loaded = self.loaded.lock().await;
            urls.iter()
                .filter(|u| Self::is_fetchable(u) && !loaded.contains(*u))
                .cloned()
                .collect()
        };
        if pending.is_empty() {
            return 0;
        }
        info!("🖼️ Preloading {} images", pending.len());

        let tasks = pending.into_iter().map(|url| {
            let client = self.client.clone();
            let loaded = Arc::clone(&self.loaded);
            async move {
                match send_checked(client.get(&url)).await {
                    Ok(response) => match response.bytes().await {
                        Ok(_) => {
                            loaded.lock().await.insert(url);
                            true
                        }
                        Err(e) => {
                            warn!("Image body failed for {}: {}", url, e);
                            false
                        }
                    },
                    Err(e) => {
                        warn!("Image preload failed for {}: {}", url, e);
                        false
                    }
                }
            }
        });

        let ok = join_all(tasks).await.into_iter().filter(|ok| *ok).count();
        info!("✅ Preloaded {} images", ok);
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConfigData, DesignImageConfig, DesignImages, Machine};

    #[test]
    fn only_latest_ticket_applies() {
        let seq = ImageLoadSequencer::new();
        let first = seq.begin();
        let second = seq.begin();
        assert!(!seq.is_current(first));
        assert_eq!(seq.complete(first, "old.png"), None);
        assert_eq!(seq.complete(second, "new.png"), Some("new.png"));
    }

    #[test]
    fn catalog_urls_are_deduplicated() {
        let designs = DesignImages::default().insert(
            "black",
            "blue",
            DesignImageConfig {
                main_image: Some("/img/a.png".into()),
                ..Default::default()
            },
        );
        let data = ConfigData {
            machines: vec![
                Machine {
                    id: 1,
                    main_image: Some("/img/a.png".into()),
                    design_images: Some(designs),
                    ..Default::default()
                },
                Machine {
                    id: 2,
                    main_image: Some("https://cdn.example/b.png".into()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let urls = ImagePreloader::catalog_urls(&Catalog::from_data(&data), "https://shop.example");
        assert_eq!(urls, vec!["https://shop.example/img/a.png", "https://cdn.example/b.png"]);
    }

    #[tokio::test]
    async fn preload_skips_known_urls() {
        let preloader = ImagePreloader::new(std::time::Duration::from_secs(1)).unwrap();
        preloader.loaded.lock().await.insert("https://shop.example/a.png".into());
        assert!(preloader.is_loaded("https://shop.example/a.png").await);
        assert_eq!(preloader.preload(&["https://shop.example/a.png".to_string()]).await, 0);
    }

    #[tokio::test]
    async fn preload_skips_inline_and_relative_sources() {
        let preloader = ImagePreloader::new(std::time::Duration::from_secs(1)).unwrap();
        let urls = vec![
            "data:image/png;base64,iVBORw0KGgo=".to_string(),
            "//cdn.example/a.png".to_string(),
            "/img/b.png".to_string(),
        ];
        assert_eq!(preloader.preload(&urls).await, 0);
        for url in &urls {
            assert!(!preloader.is_loaded(url).await);
        }
        assert!(ImagePreloader::is_fetchable("https://cdn.example/a.png"));
        assert!(ImagePreloader::is_fetchable("http://cdn.example/a.png"));
    }
}
