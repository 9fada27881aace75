use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Standard response body: the interesting payload sits under `data`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// List response body: a page of entries plus paging metadata.
#[derive(Debug, Deserialize)]
pub struct Paged<T> {
    pub data: Vec<T>,
    pub meta: PageMeta,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy)]
pub struct PageMeta {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

/// Root endpoint payload: server status, version and reset schedule.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
    pub status: String,
    pub version: String,
    pub reset_date: NaiveDate,
    pub server_resets: ServerResets,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerResets {
    pub next: DateTime<Utc>,
    pub frequency: String,
}

/// Payload from accepting, delivering to, or fulfilling a contract.
#[derive(Debug, Deserialize, Clone)]
pub struct ContractUpdate {
    pub contract: crate::models::Contract,
    pub agent: Option<crate::models::Agent>,
    pub cargo: Option<crate::models::Cargo>,
}

/// Payload from purchasing a ship at a shipyard.
#[derive(Debug, Deserialize, Clone)]
pub struct ShipPurchase {
    pub agent: crate::models::Agent,
    pub ship: crate::models::Ship,
    pub transaction: crate::models::ShipyardTransaction,
}

/// Payload from orbit/dock: just the refreshed route state.
#[derive(Debug, Deserialize, Clone)]
pub struct NavOnly {
    pub nav: crate::models::Navigation,
}
