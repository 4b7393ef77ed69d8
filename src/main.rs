use cz_configurator::client::admin::{AdminClient, BrowserStatus, FileBrowser, auto_populate_candidates};
use cz_configurator::client::{ApiClient, ImagePreloader};
use cz_configurator::config::{AppConfig, load_config};
use cz_configurator::configurator::{Configurator, VariantView};
use cz_configurator::loader::DataLoader;
use cz_configurator::storage::{LocalStore, SelectionStore};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("😱 Panic occurred: {:?}", panic_info);
    }));

    // Load configuration from file
    let config: Arc<AppConfig> = match load_config("config.json") {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => {
            error!("Config load error: {}", e);
            return;
        }
    };

    // Local storage (SQLite) shared behind a Mutex
    let store = match LocalStore::new(&config.database_path) {
        Ok(s) => Arc::new(Mutex::new(s)),
        Err(e) => {
            error!("Failed to initialize storage: {:?}", e);
            return;
        }
    };

    let api = match ApiClient::new(&config) {
        Ok(api) => Arc::new(api),
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return;
        }
    };

    let loader = DataLoader::new(Arc::clone(&api), Arc::clone(&store), &config);
    let outcome = match loader.load().await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Не удалось загрузить конфигуратор: {}", e);
            return;
        }
    };
    info!("Catalog loaded from {:?}", outcome.source);

    let mut configurator = Configurator::new(&outcome.data, config.backend_origin());
    let saved = match &config.selection {
        Some(selection) => Some(selection.clone()),
        None => SelectionStore::load(&*store.lock().await),
    };
    let view = configurator.start(saved.as_ref());
    log_view(&view);
    configurator.save_selection(&*store.lock().await);
    // Image loads still in flight, oldest first
    let mut pending = vec![(view.load_ticket, view.main_image)];

    if let Some(refresh) = outcome.refresh {
        match refresh.await {
            Ok(Some(fresh)) => {
                let view = configurator.reload(&fresh);
                log_view(&view);
                configurator.save_selection(&*store.lock().await);
                pending.push((view.load_ticket, view.main_image));
            }
            Ok(None) => info!("✓ Cache is up to date"),
            Err(e) => warn!("Background refresh task failed: {}", e),
        }
    }

    match ImagePreloader::new(config.request_timeout()) {
        Ok(preloader) => {
            let urls = ImagePreloader::catalog_urls(configurator.catalog(), config.backend_origin());
            preloader.preload(&urls).await;
        }
        Err(e) => warn!("Image preloader unavailable: {}", e),
    }

    for (ticket, src) in pending {
        if let Some(src) = configurator.apply_image(ticket, src) {
            info!("🖼️ Showing image: {}", if src.is_empty() { "—" } else { src.as_str() });
        }
    }

    if let Some(credentials) = &config.admin {
        run_admin(&config, credentials, &configurator, Arc::clone(&store)).await;
    }
}

fn log_view(view: &VariantView) {
    match view.variant_id {
        Some(id) => info!(
            "🧩 Variant {} | {} | image: {} | OZON: {}",
            id,
            view.price_text,
            if view.main_image.is_empty() { "—" } else { view.main_image.as_str() },
            view.ozon.label
        ),
        None => warn!("No variant matches the current selection"),
    }
}

/// Opens the admin session and reports what the panel would show.
async fn run_admin(
    config: &AppConfig,
    credentials: &cz_configurator::config::AdminCredentials,
    configurator: &Configurator,
    store: Arc<Mutex<LocalStore>>,
) {
    let admin = match AdminClient::new(config) {
        Ok(admin) => admin,
        Err(e) => {
            warn!("Admin client unavailable: {}", e);
            return;
        }
    };
    if let Err(e) = admin.login(credentials).await {
        warn!("Admin login failed: {}", e);
        return;
    }

    let candidates = auto_populate_candidates(&configurator.catalog().machines, configurator.specs());
    info!("Specs missing for {} catalog values", candidates.len());
    for (category, name) in &candidates {
        info!("  {} / {}", category.as_str(), name);
    }

    let browser = FileBrowser::open(&admin, store).await;
    match &browser.status {
        BrowserStatus::Ready(summary) => info!("📁 {}: {}", browser.path, summary),
        BrowserStatus::Error(message) => warn!("📁 {}: {}", browser.path, message),
        BrowserStatus::Idle => {}
    }
}
