use crate::model::{ConfigData, Selection, StorageError};
use crate::utils::{is_expired, now_millis};
use chrono::Duration;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const SELECTION_KEY: &str = "cz-conf-selection";
pub const DATA_CACHE_KEY: &str = "cz-conf-cache-v2";
pub const FILE_BROWSER_PATH_KEY: &str = "seafile_last_path";

/// Key/value blob store, the native stand-in for browser local storage.
pub struct LocalStore {
    conn: Connection,
}

impl LocalStore {
    /// Открывает хранилище и создаёт таблицу при необходимости
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS local_storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )?;

        Ok(Self { conn })
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_storage WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO local_storage (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM local_storage WHERE key = ?1", params![key])?;
        Ok(())
    }

    pub fn get_json<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get_item(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)?;
        self.set_item(key, &raw)
    }
}

/// Last selection, restored verbatim on the next session.
pub struct SelectionStore;

impl SelectionStore {
    pub fn save(store: &LocalStore, selection: &Selection) {
        if let Err(e) = store.set_json(SELECTION_KEY, selection) {
            warn!("Failed to save selection: {}", e);
        }
    }

    pub fn load(store: &LocalStore) -> Option<Selection> {
        store.get_json(SELECTION_KEY).unwrap_or_else(|e| {
            warn!("Failed to read saved selection: {}", e);
            None
        })
    }
}

/// Timestamped catalog snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData {
    pub timestamp: i64,
    pub data: ConfigData,
}

pub struct CatalogCache;

impl CatalogCache {
    /// Cached payload while it is younger than `ttl`; any failure is a miss.
    pub fn load(store: &LocalStore, ttl: Duration) -> Option<ConfigData> {
        let cached: CachedData = match store.get_json(DATA_CACHE_KEY) {
            Ok(Some(c)) => c,
            Ok(None) => return None,
            Err(e) => {
                warn!("Ignoring unreadable catalog cache: {}", e);
                return None;
            }
        };
        if cached.timestamp <= 0 || is_expired(cached.timestamp, ttl, now_millis()) {
            info!("Catalog cache expired");
            return None;
        }
        Some(cached.data)
    }

    pub fn save(store: &LocalStore, data: &ConfigData) {
        let entry = CachedData {
            timestamp: now_millis(),
            data: data.clone(),
        };
        if let Err(e) = store.set_json(DATA_CACHE_KEY, &entry) {
            warn!("Failed to save catalog cache: {}", e);
        }
    }
}

/// Folder last opened in the admin file browser.
pub struct BrowserPathStore;

impl BrowserPathStore {
    pub fn remember(store: &LocalStore, path: &str) {
        if let Err(e) = store.set_item(FILE_BROWSER_PATH_KEY, path) {
            warn!("Failed to remember browser path: {}", e);
        }
    }

    pub fn recall(store: &LocalStore) -> String {
        match store.get_item(FILE_BROWSER_PATH_KEY) {
            Ok(Some(path)) if !path.is_empty() => path,
            Ok(_) => "/".to_string(),
            Err(e) => {
                warn!("Failed to read browser path: {}", e);
                "/".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Machine;

    #[test]
    fn items_round_trip() {
        let store = LocalStore::open_in_memory().unwrap();
        assert_eq!(store.get_item("k").unwrap(), None);
        store.set_item("k", "v1").unwrap();
        store.set_item("k", "v2").unwrap();
        assert_eq!(store.get_item("k").unwrap().as_deref(), Some("v2"));
        store.remove_item("k").unwrap();
        assert_eq!(store.get_item("k").unwrap(), None);
    }

    #[test]
    fn selection_survives_a_fresh_reader() {
        let store = LocalStore::open_in_memory().unwrap();
        let selection = Selection {
            machine: "Rio".into(),
            frame: "Каркас 1".into(),
            frame_color: "black".into(),
            insert_color: "blue".into(),
            fridge: "Liebherr".into(),
            terminal: "Vendotek".into(),
        };
        SelectionStore::save(&store, &selection);
        assert_eq!(SelectionStore::load(&store), Some(selection));
    }

    #[test]
    fn corrupt_selection_is_a_miss() {
        let store = LocalStore::open_in_memory().unwrap();
        store.set_item(SELECTION_KEY, "{not json").unwrap();
        assert_eq!(SelectionStore::load(&store), None);
    }

    #[test]
    fn catalog_cache_respects_ttl() {
        let store = LocalStore::open_in_memory().unwrap();
        let data = ConfigData {
            machines: vec![Machine {
                id: 1,
                name: "Rio".into(),
                ..Default::default()
            }],
            specs: vec![],
            version: Some("7".into()),
        };
        CatalogCache::save(&store, &data);
        assert_eq!(CatalogCache::load(&store, Duration::hours(24)), Some(data.clone()));

        let stale = CachedData {
            timestamp: now_millis() - Duration::hours(25).num_milliseconds(),
            data,
        };
        store.set_json(DATA_CACHE_KEY, &stale).unwrap();
        assert_eq!(CatalogCache::load(&store, Duration::hours(24)), None);
    }

    #[test]
    fn browser_path_defaults_to_root() {
        let store = LocalStore::open_in_memory().unwrap();
        assert_eq!(BrowserPathStore::recall(&store), "/");
        BrowserPathStore::remember(&store, "/images/machines");
        assert_eq!(BrowserPathStore::recall(&store), "/images/machines");
    }

    #[test]
    fn set_item_replaces_and_schema_is_key_value() {
        let store = LocalStore::open_in_memory().unwrap();
        store.set_item("k", "v1").unwrap();
        store.set_item("k", "v2").unwrap();
        assert_eq!(store.get_item("k").unwrap().as_deref(), Some("v2"));

        let mut stmt = store.conn.prepare("PRAGMA table_info(local_storage)").unwrap();
        let columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(columns, vec!["key", "value"]);
    }
}
