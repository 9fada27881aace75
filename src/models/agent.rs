use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    // Absent when looking at another agent's public record
    pub account_id: Option<String>,
    pub symbol: String,
    pub headquarters: String,
    pub credits: i64,
    pub starting_faction: String,
    pub ship_count: i32,
}

impl Agent {
    /// System portion of the headquarters waypoint, e.g. "X1-AB12" from
    /// "X1-AB12-C34".
    pub fn headquarters_system(&self) -> String {
        self.headquarters
            .split('-')
            .take(2)
            .collect::<Vec<&str>>()
            .join("-")
    }
}
