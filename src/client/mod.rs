// Client module - rate-limited SpaceTraders API client
pub mod api;

pub use api::SpaceMerchantClient;
