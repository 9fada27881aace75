use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Faction {
    pub symbol: String,
    pub name: String,
    pub description: String,
    // Hidden factions do not expose a headquarters
    pub headquarters: Option<String>,
    pub traits: Vec<FactionTrait>,
    pub is_recruiting: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FactionTrait {
    pub symbol: String,
    pub name: String,
    pub description: String,
}
