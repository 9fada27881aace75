use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::ship::{Engine, Frame, Module, Mount, Reactor};

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    pub symbol: String,
    pub exports: Vec<TradeGood>,
    pub imports: Vec<TradeGood>,
    pub exchange: Vec<TradeGood>,
    // Only present while one of the agent's ships is at the waypoint
    pub transactions: Option<Vec<MarketTransaction>>,
    pub trade_goods: Option<Vec<MarketTradeGood>>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TradeGood {
    pub symbol: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MarketTradeGood {
    pub symbol: String,
    pub trade_volume: i32,
    pub supply: String,
    pub activity: Option<String>,
    pub purchase_price: i32,
    pub sell_price: i32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MarketTransaction {
    pub waypoint_symbol: String,
    pub ship_symbol: String,
    pub trade_symbol: String,
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub units: i32,
    pub price_per_unit: i32,
    pub total_price: i32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Shipyard {
    pub symbol: String,
    pub ship_types: Vec<ShipyardShipType>,
    pub transactions: Option<Vec<ShipyardTransaction>>,
    pub ships: Option<Vec<ShipyardShip>>,
    pub modifications_fee: i32,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ShipyardShipType {
    #[serde(rename = "type")]
    pub ship_type: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ShipyardTransaction {
    pub waypoint_symbol: String,
    pub ship_symbol: Option<String>,
    pub ship_type: Option<String>,
    pub price: i32,
    pub agent_symbol: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ShipyardShip {
    #[serde(rename = "type")]
    pub ship_type: String,
    pub name: String,
    pub description: String,
    pub purchase_price: i32,
    pub frame: Frame,
    pub reactor: Reactor,
    pub engine: Engine,
    pub modules: Vec<Module>,
    pub mounts: Vec<Mount>,
    pub crew: Option<ShipyardCrew>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ShipyardCrew {
    pub required: i32,
    pub capacity: i32,
}
