use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::system::Orbital;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    pub symbol: String,
    #[serde(rename = "type")]
    pub waypoint_type: String,
    pub system_symbol: String,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub orbitals: Vec<Orbital>,
    pub orbits: Option<String>,
    #[serde(default)]
    pub traits: Vec<WaypointTrait>,
    #[serde(default)]
    pub modifiers: Vec<WaypointModifier>,
    pub chart: Option<Chart>,
    pub faction: Option<WaypointFaction>,
    #[serde(default)]
    pub is_under_construction: bool,
}

impl Waypoint {
    pub fn has_trait(&self, trait_symbol: &str) -> bool {
        self.traits.iter().any(|t| t.symbol == trait_symbol)
    }

    pub fn has_shipyard(&self) -> bool {
        self.has_trait("SHIPYARD")
    }

    pub fn has_marketplace(&self) -> bool {
        self.has_trait("MARKETPLACE")
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WaypointTrait {
    pub symbol: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WaypointModifier {
    pub symbol: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    pub waypoint_symbol: Option<String>,
    pub submitted_by: Option<String>,
    pub submitted_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WaypointFaction {
    pub symbol: String,
}
