// Adapters layer: concrete implementations for external systems (http, storage, dataset links)

pub mod dataset_link;
pub mod http;
pub mod storage;

pub use dataset_link::DatasetLink;
pub use http::HttpSource;
pub use storage::LocalStorage;
