use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Ship {
    pub symbol: String,
    pub registration: Registration,
    pub nav: Navigation,
    pub crew: Crew,
    pub frame: Frame,
    pub reactor: Reactor,
    pub engine: Engine,
    pub cooldown: Option<Cooldown>,
    pub modules: Vec<Module>,
    pub mounts: Vec<Mount>,
    pub cargo: Cargo,
    pub fuel: Fuel,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    pub faction_symbol: String,
    pub role: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Navigation {
    pub system_symbol: String,
    pub waypoint_symbol: String,
    pub route: Route,
    pub status: String,
    pub flight_mode: String,
}

impl Navigation {
    pub fn is_docked(&self) -> bool {
        self.status == "DOCKED"
    }

    pub fn is_in_transit(&self) -> bool {
        self.status == "IN_TRANSIT"
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub destination: RouteWaypoint,
    pub origin: RouteWaypoint,
    pub departure_time: DateTime<Utc>,
    pub arrival: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RouteWaypoint {
    pub symbol: String,
    #[serde(rename = "type")]
    pub waypoint_type: String,
    pub system_symbol: String,
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Crew {
    pub current: i32,
    pub required: i32,
    pub capacity: i32,
    pub rotation: String,
    pub morale: i32,
    pub wages: i32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub symbol: String,
    pub name: String,
    pub description: String,
    pub condition: Option<f64>,
    pub integrity: Option<f64>,
    pub module_slots: i32,
    pub mounting_points: i32,
    pub fuel_capacity: i32,
    pub requirements: Requirements,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Reactor {
    pub symbol: String,
    pub name: String,
    pub description: String,
    pub condition: Option<f64>,
    pub power_output: i32,
    pub requirements: Requirements,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Engine {
    pub symbol: String,
    pub name: String,
    pub description: String,
    pub condition: Option<f64>,
    pub speed: i32,
    pub requirements: Requirements,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Module {
    pub symbol: String,
    pub capacity: Option<i32>,
    pub range: Option<i32>,
    pub name: String,
    pub description: String,
    pub requirements: Requirements,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Mount {
    pub symbol: String,
    pub name: String,
    pub description: Option<String>,
    pub strength: Option<i32>,
    pub deposits: Option<Vec<String>>,
    pub requirements: Requirements,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Requirements {
    pub power: Option<i32>,
    pub crew: Option<i32>,
    pub slots: Option<i32>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Cooldown {
    pub ship_symbol: String,
    pub total_seconds: i32,
    pub remaining_seconds: i32,
    pub expiration: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Cargo {
    pub capacity: i32,
    pub units: i32,
    pub inventory: Vec<CargoItem>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CargoItem {
    pub symbol: String,
    pub name: String,
    pub description: String,
    pub units: i32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Fuel {
    pub current: i32,
    pub capacity: i32,
    pub consumed: Option<FuelConsumed>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FuelConsumed {
    pub amount: i32,
    pub timestamp: DateTime<Utc>,
}

/// Payload returned by navigate/warp: updated fuel and route.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct NavigationUpdate {
    pub fuel: Fuel,
    pub nav: Navigation,
}
