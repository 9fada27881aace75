use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct System {
    pub symbol: String,
    pub sector_symbol: String,
    #[serde(rename = "type")]
    pub system_type: String,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub waypoints: Vec<SystemWaypoint>,
    #[serde(default)]
    pub factions: Vec<SystemFaction>,
}

/// Abbreviated waypoint entry embedded in a system record. The full record
/// comes from the waypoint endpoints.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SystemWaypoint {
    pub symbol: String,
    #[serde(rename = "type")]
    pub waypoint_type: String,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub orbitals: Vec<Orbital>,
    pub orbits: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Orbital {
    pub symbol: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SystemFaction {
    pub symbol: String,
}
