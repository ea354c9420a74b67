pub mod companion_api;
pub mod http_client;

pub use companion_api::CompanionApi;
pub use http_client::HttpCompanionClient;
