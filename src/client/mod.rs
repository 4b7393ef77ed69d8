pub mod admin;
pub mod fetcher;
pub mod images;
pub mod traits;

pub use admin::{AdminClient, FileBrowser};
pub use fetcher::ApiClient;
pub use images::{ImageLoadSequencer, ImagePreloader};
pub use traits::CatalogApi;
