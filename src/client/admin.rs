// Admin panel client: catalog CRUD and the file-storage browser
use crate::catalog::SpecIndex;
use crate::client::fetcher::{USER_AGENT, read_json, send_checked};
use crate::config::{AdminCredentials, AppConfig};
use crate::model::{ApiError, Machine, SpecCategory};
use crate::normalizer::{is_skip_value, norm_val};
use crate::storage::{BrowserPathStore, LocalStore};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Generic `{"detail": ...}` answer of the admin endpoints.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AdminResponse {
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub deleted: Option<u64>,
    #[serde(default)]
    pub requested: Option<u64>,
    #[serde(default)]
    pub created: Option<u64>,
}

/// Machine create/update form. Empty fields are sent as empty strings,
/// which the backend treats as "unchanged" on update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MachineForm {
    pub name: String,
    pub model: String,
    pub frame: String,
    pub frame_color: String,
    pub refrigerator: String,
    pub terminal: String,
    pub price: String,
    pub ozon_link: String,
    pub graphic_link: String,
    pub main_image: String,
    pub main_image_path: String,
    pub gallery_folder: String,
    pub description: String,
    pub clear_main_image: bool,
    pub clear_main_image_path: bool,
    pub clear_gallery_folder: bool,
}

impl MachineForm {
    /// Pre-fills the form from an existing row.
    pub fn from_machine(m: &Machine) -> Self {
        let s = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            name: m.name.clone(),
            model: s(&m.model),
            frame: s(&m.frame),
            frame_color: s(&m.frame_color),
            refrigerator: s(&m.refrigerator),
            terminal: s(&m.terminal),
            price: m.price.map(|p| p.to_string()).unwrap_or_default(),
            ozon_link: s(&m.ozon_link),
            graphic_link: s(&m.graphic_link),
            main_image: s(&m.main_image),
            main_image_path: s(&m.main_image_path),
            gallery_folder: s(&m.gallery_folder),
            description: s(&m.description),
            ..Default::default()
        }
    }

    pub fn fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("name", self.name.clone()),
            ("model", self.model.clone()),
            ("frame", self.frame.clone()),
            ("frame_color", self.frame_color.clone()),
            ("refrigerator", self.refrigerator.clone()),
            ("terminal", self.terminal.clone()),
            ("price", self.price.trim().to_string()),
            ("ozon_link", self.ozon_link.clone()),
            ("graphic_link", self.graphic_link.clone()),
            ("main_image", self.main_image.clone()),
            ("main_image_path", self.main_image_path.clone()),
            ("gallery_folder", self.gallery_folder.clone()),
            ("description", self.description.clone()),
        ];
        for (flag, on) in [
            ("clear_main_image", self.clear_main_image),
            ("clear_main_image_path", self.clear_main_image_path),
            ("clear_gallery_folder", self.clear_gallery_folder),
        ] {
            if on {
                fields.push((flag, "1".to_string()));
            }
        }
        fields
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpecForm {
    pub category: SpecCategory,
    pub name: String,
    pub specs_text: String,
}

impl SpecForm {
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("category", self.category.as_str().to_string()),
            ("name", self.name.trim().to_string()),
            ("specs_text", self.specs_text.clone()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Dir,
    File,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BrowserItem {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
}

impl BrowserItem {
    /// Full path of the item inside `folder`.
    pub fn full_path(&self, folder: &str) -> String {
        match self.path.as_deref().filter(|p| !p.is_empty()) {
            Some(p) => p.to_string(),
            None => join_path(folder, &self.name),
        }
    }
}

/// Body of `GET /admin/seafile-browser`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BrowserListing {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub items: Vec<BrowserItem>,
}

impl BrowserListing {
    pub fn dirs(&self) -> impl Iterator<Item = &BrowserItem> {
        self.items.iter().filter(|i| i.kind == ItemKind::Dir)
    }

    pub fn files(&self) -> impl Iterator<Item = &BrowserItem> {
        self.items.iter().filter(|i| i.kind == ItemKind::File)
    }

    pub fn summary(&self) -> String {
        format!("{} папок, {} файлов", self.dirs().count(), self.files().count())
    }

    /// Items whose name contains `query`, case-insensitively.
    pub fn filter(&self, query: &str) -> Vec<&BrowserItem> {
        let q = norm_val(query);
        self.dirs()
            .chain(self.files())
            .filter(|i| q.is_empty() || i.name.to_lowercase().contains(&q))
            .collect()
    }
}

/// Body of `GET /admin/seafile-file`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileLink {
    #[serde(default)]
    pub path: String,
    pub link: String,
}

pub fn join_path(folder: &str, name: &str) -> String {
    format!("{}/{}", folder.trim_end_matches('/'), name.trim_start_matches('/'))
}

pub fn parent_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(i) => trimmed[..i].to_string(),
    }
}

/// `(label, path)` for every segment of `path`.
pub fn breadcrumb(path: &str) -> Vec<(String, String)> {
    let mut acc = String::new();
    path.split('/')
        .filter(|p| !p.is_empty())
        .map(|part| {
            acc.push('/');
            acc.push_str(part);
            (part.to_string(), acc.clone())
        })
        .collect()
}

/// `(category, name)` pairs the catalog implies but no spec covers yet.
pub fn auto_populate_candidates(machines: &[Machine], specs: &SpecIndex) -> Vec<(SpecCategory, String)> {
    let mut out: Vec<(SpecCategory, String)> = Vec::new();
    for category in SpecCategory::ALL {
        for m in machines {
            let Some(value) = category.value_of(m).map(str::trim) else {
                continue;
            };
            if is_skip_value(Some(value)) || norm_val(value) == "да" {
                continue;
            }
            if specs.contains(category, value) || out.iter().any(|(c, v)| *c == category && v == value) {
                continue;
            }
            out.push((category, value.to_string()));
        }
    }
    out
}

#[derive(Serialize)]
struct BulkIds<'a> {
    ids: &'a [i64],
}

pub struct AdminClient {
    client: Client,
    base: String,
}

impl AdminClient {
    pub fn new(config: &AppConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout())
            .cookie_store(true)
            .build()?;
        Ok(Self {
            client,
            base: config.backend_origin().to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    /// Opens the admin session; the cookie is kept by the client.
    pub async fn login(&self, credentials: &AdminCredentials) -> Result<(), ApiError> {
        let form = [
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
        ];
        send_checked(self.client.post(self.url("login")).form(&form)).await?;
        info!("🔐 Admin session opened for {}", credentials.username);
        Ok(())
    }

    async fn post_form(&self, path: &str, fields: &[(&'static str, String)]) -> Result<AdminResponse, ApiError> {
        let response = send_checked(self.client.post(self.url(path)).form(fields)).await?;
        read_json(response).await
    }

    async fn post_empty(&self, path: &str) -> Result<AdminResponse, ApiError> {
        let response = send_checked(self.client.post(self.url(path))).await?;
        read_json(response).await
    }

    /// Creates a machine, or updates it when `id` is set.
    pub async fn save_machine(&self, id: Option<i64>, form: &MachineForm) -> Result<AdminResponse, ApiError> {
        let path = match id {
            Some(id) => format!("admin/machine/{id}"),
            None => "admin/machine".to_string(),
        };
        self.post_form(&path, &form.fields()).await
    }

    pub async fn delete_machine(&self, id: i64) -> Result<AdminResponse, ApiError> {
        self.post_empty(&format!("admin/machine/{id}/delete")).await
    }

    pub async fn bulk_delete_machines(&self, ids: &[i64]) -> Result<AdminResponse, ApiError> {
        self.bulk_delete("admin/machines/bulk-delete", ids).await
    }

    pub async fn save_spec(&self, id: Option<i64>, form: &SpecForm) -> Result<AdminResponse, ApiError> {
        let path = match id {
            Some(id) => format!("admin/spec/{id}"),
            None => "admin/spec".to_string(),
        };
        self.post_form(&path, &form.fields()).await
    }

    pub async fn delete_spec(&self, id: i64) -> Result<AdminResponse, ApiError> {
        self.post_empty(&format!("admin/spec/{id}/delete")).await
    }

    pub async fn bulk_delete_specs(&self, ids: &[i64]) -> Result<AdminResponse, ApiError> {
        self.bulk_delete("admin/specs/bulk-delete", ids).await
    }

    pub async fn auto_populate_specs(&self) -> Result<AdminResponse, ApiError> {
        self.post_empty("admin/specs/auto-populate").await
    }

    async fn bulk_delete(&self, path: &str, ids: &[i64]) -> Result<AdminResponse, ApiError> {
        if ids.is_empty() {
            return Ok(AdminResponse::default());
        }
        let response = send_checked(self.client.post(self.url(path)).json(&BulkIds { ids })).await?;
        read_json(response).await
    }

    pub async fn browse(&self, path: &str) -> Result<BrowserListing, ApiError> {
        let request = self
            .client
            .get(self.url("admin/seafile-browser"))
            .query(&[("path", path)]);
        let response = send_checked(request).await?;
        let mut listing: BrowserListing = read_json(response).await?;
        if listing.path.is_empty() {
            listing.path = "/".to_string();
        }
        Ok(listing)
    }

    pub async fn file_link(&self, path: &str) -> Result<FileLink, ApiError> {
        let request = self
            .client
            .get(self.url("admin/seafile-file"))
            .query(&[("path", path)]);
        let response = send_checked(request).await?;
        let mut link: FileLink = read_json(response).await?;
        if link.path.is_empty() {
            link.path = path.to_string();
        }
        Ok(link)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BrowserStatus {
    Idle,
    Ready(String),
    Error(String),
}

/// Folder navigation on top of `AdminClient`, remembering the last folder.
pub struct FileBrowser<'a> {
    client: &'a AdminClient,
    store: Arc<Mutex<LocalStore>>,
    pub path: String,
    pub listing: BrowserListing,
    pub status: BrowserStatus,
}

impl<'a> FileBrowser<'a> {
    pub async fn open(client: &'a AdminClient, store: Arc<Mutex<LocalStore>>) -> Self {
        let path = BrowserPathStore::recall(&*store.lock().await);
        let mut browser = Self {
            client,
            store,
            path: path.clone(),
            listing: BrowserListing::default(),
            status: BrowserStatus::Idle,
        };
        browser.load(&path).await;
        browser
    }

    /// Loads `path`; failures only change the status line.
    pub async fn load(&mut self, path: &str) {
        match self.client.browse(path).await {
            Ok(listing) => {
                self.path = listing.path.clone();
                BrowserPathStore::remember(&*self.store.lock().await, &self.path);
                self.status = BrowserStatus::Ready(listing.summary());
                self.listing = listing;
            }
            Err(e) => {
                error!("File browser failed for {}: {}", path, e);
                self.status = BrowserStatus::Error("Ошибка загрузки".to_string());
            }
        }
    }

    pub async fn up(&mut self) {
        let parent = parent_path(&self.path);
        self.load(&parent).await;
    }

    pub async fn enter(&mut self, dir: BrowserItem) {
        let target = dir.full_path(&self.path);
        self.load(&target).await;
    }

    /// Direct link for a file of the current folder.
    pub async fn pick_file(&self, file: &BrowserItem) -> Result<FileLink, ApiError> {
        self.client.file_link(&file.full_path(&self.path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Spec;

    fn item(name: &str, kind: ItemKind) -> BrowserItem {
        BrowserItem {
            name: name.into(),
            kind,
            path: None,
            size: None,
        }
    }

    #[test]
    fn machine_form_sends_clear_flags_only_when_set() {
        let mut form = MachineForm {
            name: "Rio".into(),
            price: " 125000 ".into(),
            ..Default::default()
        };
        let fields = form.fields();
        assert!(fields.contains(&("price", "125000".to_string())));
        assert!(!fields.iter().any(|(k, _)| k.starts_with("clear_")));

        form.clear_gallery_folder = true;
        assert!(form.fields().contains(&("clear_gallery_folder", "1".to_string())));
    }

    #[test]
    fn machine_form_prefills_from_row() {
        let m = Machine {
            id: 4,
            name: "Rio".into(),
            frame: Some("Каркас".into()),
            price: Some(1500.0),
            ..Default::default()
        };
        let form = MachineForm::from_machine(&m);
        assert_eq!(form.frame, "Каркас");
        assert_eq!(form.price, "1500");
        assert_eq!(form.model, "");
    }

    #[test]
    fn listing_splits_and_filters() {
        let listing: BrowserListing = serde_json::from_str(
            r#"{"path": "/img", "items": [
                {"name": "Rio.webp", "type": "file", "size": 10},
                {"name": "frames", "type": "dir"},
                {"name": "bar.png", "type": "file"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(listing.summary(), "1 папок, 2 файлов");
        let names: Vec<&str> = listing.filter("RIO").iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["Rio.webp"]);
        let all: Vec<&str> = listing.filter("").iter().map(|i| i.name.as_str()).collect();
        assert_eq!(all, vec!["frames", "Rio.webp", "bar.png"]);
    }

    #[test]
    fn paths_and_breadcrumbs() {
        assert_eq!(join_path("/", "a"), "/a");
        assert_eq!(join_path("/img/", "a.png"), "/img/a.png");
        assert_eq!(parent_path("/img/frames"), "/img");
        assert_eq!(parent_path("/img"), "/");
        assert_eq!(parent_path("/"), "/");
        assert_eq!(
            breadcrumb("/img/frames/"),
            vec![
                ("img".to_string(), "/img".to_string()),
                ("frames".to_string(), "/img/frames".to_string())
            ]
        );
        assert_eq!(item("x.png", ItemKind::File).full_path("/img"), "/img/x.png");
    }

    #[test]
    fn candidates_skip_known_specs_and_placeholders() {
        let machines = vec![
            Machine {
                id: 1,
                name: "Rio".into(),
                frame: Some("Каркас 1".into()),
                refrigerator: Some("нет".into()),
                terminal: Some("да".into()),
                ..Default::default()
            },
            Machine {
                id: 2,
                name: "Rio".into(),
                frame: Some("Каркас 2".into()),
                ..Default::default()
            },
        ];
        let specs = SpecIndex::new(&[Spec {
            category: "frame".into(),
            name: "Каркас 1".into(),
            ..Default::default()
        }]);
        let candidates = auto_populate_candidates(&machines, &specs);
        assert_eq!(
            candidates,
            vec![
                (SpecCategory::CoffeeMachine, "Rio".to_string()),
                (SpecCategory::Frame, "Каркас 2".to_string()),
            ]
        );
    }

    #[test]
    fn admin_response_tolerates_partial_bodies() {
        let r: AdminResponse = serde_json::from_str(r#"{"detail": "Удалено", "deleted": 2, "requested": 3}"#).unwrap();
        assert_eq!(r.deleted, Some(2));
        assert_eq!(r.id, None);
    }
}
