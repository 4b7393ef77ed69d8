pub mod sqlite;

pub use sqlite::{BrowserPathStore, CatalogCache, LocalStore, SelectionStore};
