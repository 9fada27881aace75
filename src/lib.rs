// SpaceMerchants - rate-limited SpaceTraders API client
// Library-first: the CLI binary is a thin consumer of the session type

pub mod client;
pub mod config;
pub mod limiter;
pub mod logging;
pub mod models;
pub mod session;

// Re-export commonly used types
pub use models::{
    agent::Agent,
    contract::Contract,
    faction::Faction,
    ship::Ship,
    system::System,
    waypoint::Waypoint,
};

pub use client::SpaceMerchantClient;
pub use config::MerchantConfig;
pub use limiter::{AcquireError, LimiterError, RateLimiter, RatePermit};
pub use session::SpaceMerchants;

// Constants
pub const API_BASE_URL: &str = "https://api.spacetraders.io/v2";
pub const AGENT_TOKEN_FILE: &str = "AGENT_TOKEN";

// API quota the limiter defaults to: 2 requests per 1s window
pub const DEFAULT_RATE_CAPACITY: u32 = 2;
pub const DEFAULT_RATE_INTERVAL_MS: u64 = 1000;
