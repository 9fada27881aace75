use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::limiter::RateLimiter;
use crate::log_trace;
use crate::models::*;
use crate::API_BASE_URL;

type ClientResult<T> = Result<T, Box<dyn std::error::Error>>;

/// One instance per session. Every outbound request, whatever the verb,
/// first acquires a permit from the session's rate limiter.
#[derive(Clone)]
pub struct SpaceMerchantClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    limiter: Arc<RateLimiter>,
}

impl SpaceMerchantClient {
    /// Client with the SpaceTraders base URL and default rate quota.
    /// Pass `None` to use only the unauthenticated endpoints.
    pub fn new(token: Option<String>) -> ClientResult<Self> {
        Self::with_limiter(token, RateLimiter::with_api_defaults())
    }

    pub fn with_limiter(token: Option<String>, limiter: RateLimiter) -> ClientResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = &token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(SpaceMerchantClient {
            http,
            base_url: API_BASE_URL.to_string(),
            token,
            limiter: Arc::new(limiter),
        })
    }

    pub fn set_base_url(&mut self, base_url: &str) {
        self.base_url = base_url.trim_end_matches('/').to_string();
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Shut down the rate limiter; pending acquires fail with `Closed`.
    pub fn close(&self) {
        self.limiter.close();
    }

    fn require_token(&self) -> ClientResult<()> {
        if self.token.is_none() {
            return Err("this endpoint requires an agent token".into());
        }
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        if path.is_empty() {
            self.base_url.clone()
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(format!("request failed with status {}: {}", status, body).into());
        }
        Ok(serde_json::from_str(&body)?)
    }

    // Raw-payload variant: tolerates the empty bodies some endpoints return
    async fn parse_raw(response: reqwest::Response) -> ClientResult<Value> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(format!("request failed with status {}: {}", status, body).into());
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    // HTTP verb helpers. Each one holds a permit for exactly the duration
    // of its request; the permit is never reused across calls.

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> ClientResult<T> {
        let _permit = self.limiter.acquire().await?;
        log_trace!("GET {}", path);
        let response = self.http.get(self.url(path)).query(query).send().await?;
        Self::parse(response).await
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: Value) -> ClientResult<T> {
        let _permit = self.limiter.acquire().await?;
        log_trace!("POST {}", path);
        let response = self.http.post(self.url(path)).json(&body).send().await?;
        Self::parse(response).await
    }

    async fn post_raw(&self, path: &str, body: Value) -> ClientResult<Value> {
        let _permit = self.limiter.acquire().await?;
        log_trace!("POST {}", path);
        let response = self.http.post(self.url(path)).json(&body).send().await?;
        Self::parse_raw(response).await
    }

    async fn get_raw(&self, path: &str) -> ClientResult<Value> {
        let _permit = self.limiter.acquire().await?;
        log_trace!("GET {}", path);
        let response = self.http.get(self.url(path)).send().await?;
        Self::parse_raw(response).await
    }

    async fn patch_json<T: DeserializeOwned>(&self, path: &str, body: Value) -> ClientResult<T> {
        let _permit = self.limiter.acquire().await?;
        log_trace!("PATCH {}", path);
        let response = self.http.patch(self.url(path)).json(&body).send().await?;
        Self::parse(response).await
    }

    // Server operations

    /// Status of the game server, including the reset schedule.
    pub async fn get_status(&self) -> ClientResult<ServerStatus> {
        self.get_json("", &[]).await
    }

    /// Register a new agent. Returns the raw payload; the bearer token for
    /// the new agent sits under `data.token`.
    pub async fn register(
        &self,
        callsign: &str,
        faction: &str,
        email: Option<&str>,
    ) -> ClientResult<Value> {
        let mut body = json!({ "symbol": callsign, "faction": faction });
        if let Some(email) = email {
            body["email"] = json!(email);
        }
        self.post_raw("register", body).await
    }

    // Agent operations

    pub async fn get_agent(&self) -> ClientResult<Agent> {
        self.require_token()?;
        let envelope: Envelope<Agent> = self.get_json("my/agent", &[]).await?;
        Ok(envelope.data)
    }

    pub async fn list_agents(&self, limit: i64, page: i64) -> ClientResult<Paged<Agent>> {
        self.get_json("agents", &paging(limit, page)).await
    }

    pub async fn get_public_agent(&self, agent_symbol: &str) -> ClientResult<Agent> {
        let envelope: Envelope<Agent> = self
            .get_json(&format!("agents/{}", agent_symbol), &[])
            .await?;
        Ok(envelope.data)
    }

    // Contract operations

    pub async fn list_contracts(&self, limit: i64, page: i64) -> ClientResult<Paged<Contract>> {
        self.require_token()?;
        self.get_json("my/contracts", &paging(limit, page)).await
    }

    pub async fn get_contract(&self, contract_id: &str) -> ClientResult<Contract> {
        self.require_token()?;
        let envelope: Envelope<Contract> = self
            .get_json(&format!("my/contracts/{}", contract_id), &[])
            .await?;
        Ok(envelope.data)
    }

    pub async fn accept_contract(&self, contract_id: &str) -> ClientResult<ContractUpdate> {
        self.require_token()?;
        let envelope: Envelope<ContractUpdate> = self
            .post_json(&format!("my/contracts/{}/accept", contract_id), json!({}))
            .await?;
        Ok(envelope.data)
    }

    pub async fn deliver_contract_cargo(
        &self,
        contract_id: &str,
        ship_symbol: &str,
        trade_symbol: &str,
        units: i32,
    ) -> ClientResult<ContractUpdate> {
        self.require_token()?;
        let body = json!({
            "shipSymbol": ship_symbol,
            "tradeSymbol": trade_symbol,
            "units": units
        });
        let envelope: Envelope<ContractUpdate> = self
            .post_json(&format!("my/contracts/{}/deliver", contract_id), body)
            .await?;
        Ok(envelope.data)
    }

    pub async fn fulfill_contract(&self, contract_id: &str) -> ClientResult<ContractUpdate> {
        self.require_token()?;
        let envelope: Envelope<ContractUpdate> = self
            .post_json(&format!("my/contracts/{}/fulfill", contract_id), json!({}))
            .await?;
        Ok(envelope.data)
    }

    pub async fn negotiate_contract(&self, ship_symbol: &str) -> ClientResult<Value> {
        self.require_token()?;
        self.post_raw(
            &format!("my/ships/{}/negotiate/contract", ship_symbol),
            json!({}),
        )
        .await
    }

    // Faction operations

    pub async fn list_factions(&self, limit: i64, page: i64) -> ClientResult<Paged<Faction>> {
        self.get_json("factions", &paging(limit, page)).await
    }

    pub async fn get_faction(&self, faction_symbol: &str) -> ClientResult<Faction> {
        let envelope: Envelope<Faction> = self
            .get_json(&format!("factions/{}", faction_symbol), &[])
            .await?;
        Ok(envelope.data)
    }

    // Fleet operations

    pub async fn list_ships(&self, limit: i64, page: i64) -> ClientResult<Paged<Ship>> {
        self.require_token()?;
        self.get_json("my/ships", &paging(limit, page)).await
    }

    pub async fn get_ship(&self, ship_symbol: &str) -> ClientResult<Ship> {
        self.require_token()?;
        let envelope: Envelope<Ship> = self
            .get_json(&format!("my/ships/{}", ship_symbol), &[])
            .await?;
        Ok(envelope.data)
    }

    pub async fn purchase_ship(
        &self,
        ship_type: &str,
        waypoint_symbol: &str,
    ) -> ClientResult<ShipPurchase> {
        self.require_token()?;
        let body = json!({
            "shipType": ship_type,
            "waypointSymbol": waypoint_symbol
        });
        let envelope: Envelope<ShipPurchase> = self.post_json("my/ships", body).await?;
        Ok(envelope.data)
    }

    pub async fn get_ship_cargo(&self, ship_symbol: &str) -> ClientResult<Cargo> {
        self.require_token()?;
        let envelope: Envelope<Cargo> = self
            .get_json(&format!("my/ships/{}/cargo", ship_symbol), &[])
            .await?;
        Ok(envelope.data)
    }

    pub async fn orbit_ship(&self, ship_symbol: &str) -> ClientResult<Navigation> {
        self.require_token()?;
        let envelope: Envelope<NavOnly> = self
            .post_json(&format!("my/ships/{}/orbit", ship_symbol), json!({}))
            .await?;
        Ok(envelope.data.nav)
    }

    pub async fn dock_ship(&self, ship_symbol: &str) -> ClientResult<Navigation> {
        self.require_token()?;
        let envelope: Envelope<NavOnly> = self
            .post_json(&format!("my/ships/{}/dock", ship_symbol), json!({}))
            .await?;
        Ok(envelope.data.nav)
    }

    pub async fn refine_materials(&self, ship_symbol: &str, produce: &str) -> ClientResult<Value> {
        self.require_token()?;
        self.post_raw(
            &format!("my/ships/{}/refine", ship_symbol),
            json!({ "produce": produce }),
        )
        .await
    }

    pub async fn create_chart(&self, ship_symbol: &str) -> ClientResult<Value> {
        self.require_token()?;
        self.post_raw(&format!("my/ships/{}/chart", ship_symbol), json!({}))
            .await
    }

    /// Raw cooldown payload; `null` when the ship has no active cooldown.
    pub async fn get_ship_cooldown(&self, ship_symbol: &str) -> ClientResult<Value> {
        self.require_token()?;
        self.get_raw(&format!("my/ships/{}/cooldown", ship_symbol))
            .await
    }

    pub async fn create_survey(&self, ship_symbol: &str) -> ClientResult<Value> {
        self.require_token()?;
        self.post_raw(&format!("my/ships/{}/survey", ship_symbol), json!({}))
            .await
    }

    pub async fn extract_resources(&self, ship_symbol: &str) -> ClientResult<Value> {
        self.require_token()?;
        self.post_raw(&format!("my/ships/{}/extract", ship_symbol), json!({}))
            .await
    }

    pub async fn extract_resources_with_survey(
        &self,
        ship_symbol: &str,
        survey: &Value,
    ) -> ClientResult<Value> {
        self.require_token()?;
        self.post_raw(
            &format!("my/ships/{}/extract/survey", ship_symbol),
            survey.clone(),
        )
        .await
    }

    pub async fn siphon_resources(&self, ship_symbol: &str) -> ClientResult<Value> {
        self.require_token()?;
        self.post_raw(&format!("my/ships/{}/siphon", ship_symbol), json!({}))
            .await
    }

    pub async fn jettison_cargo(
        &self,
        ship_symbol: &str,
        trade_symbol: &str,
        units: i32,
    ) -> ClientResult<Value> {
        self.require_token()?;
        self.post_raw(
            &format!("my/ships/{}/jettison", ship_symbol),
            json!({ "symbol": trade_symbol, "units": units }),
        )
        .await
    }

    pub async fn jump_ship(&self, ship_symbol: &str, waypoint_symbol: &str) -> ClientResult<Value> {
        self.require_token()?;
        self.post_raw(
            &format!("my/ships/{}/jump", ship_symbol),
            json!({ "waypointSymbol": waypoint_symbol }),
        )
        .await
    }

    pub async fn navigate_ship(
        &self,
        ship_symbol: &str,
        waypoint_symbol: &str,
    ) -> ClientResult<NavigationUpdate> {
        self.require_token()?;
        let envelope: Envelope<NavigationUpdate> = self
            .post_json(
                &format!("my/ships/{}/navigate", ship_symbol),
                json!({ "waypointSymbol": waypoint_symbol }),
            )
            .await?;
        Ok(envelope.data)
    }

    pub async fn warp_ship(
        &self,
        ship_symbol: &str,
        waypoint_symbol: &str,
    ) -> ClientResult<NavigationUpdate> {
        self.require_token()?;
        let envelope: Envelope<NavigationUpdate> = self
            .post_json(
                &format!("my/ships/{}/warp", ship_symbol),
                json!({ "waypointSymbol": waypoint_symbol }),
            )
            .await?;
        Ok(envelope.data)
    }

    pub async fn get_ship_nav(&self, ship_symbol: &str) -> ClientResult<Navigation> {
        self.require_token()?;
        let envelope: Envelope<Navigation> = self
            .get_json(&format!("my/ships/{}/nav", ship_symbol), &[])
            .await?;
        Ok(envelope.data)
    }

    pub async fn patch_ship_nav(
        &self,
        ship_symbol: &str,
        flight_mode: &str,
    ) -> ClientResult<Navigation> {
        self.require_token()?;
        let envelope: Envelope<Navigation> = self
            .patch_json(
                &format!("my/ships/{}/nav", ship_symbol),
                json!({ "flightMode": flight_mode }),
            )
            .await?;
        Ok(envelope.data)
    }

    pub async fn sell_cargo(
        &self,
        ship_symbol: &str,
        trade_symbol: &str,
        units: i32,
    ) -> ClientResult<Value> {
        self.require_token()?;
        self.post_raw(
            &format!("my/ships/{}/sell", ship_symbol),
            json!({ "symbol": trade_symbol, "units": units }),
        )
        .await
    }

    pub async fn purchase_cargo(
        &self,
        ship_symbol: &str,
        trade_symbol: &str,
        units: i32,
    ) -> ClientResult<Value> {
        self.require_token()?;
        self.post_raw(
            &format!("my/ships/{}/purchase", ship_symbol),
            json!({ "symbol": trade_symbol, "units": units }),
        )
        .await
    }

    pub async fn transfer_cargo(
        &self,
        from_ship: &str,
        trade_symbol: &str,
        units: i32,
        to_ship: &str,
    ) -> ClientResult<Value> {
        self.require_token()?;
        self.post_raw(
            &format!("my/ships/{}/transfer", from_ship),
            json!({
                "tradeSymbol": trade_symbol,
                "units": units,
                "shipSymbol": to_ship
            }),
        )
        .await
    }

    pub async fn scan_systems(&self, ship_symbol: &str) -> ClientResult<Value> {
        self.require_token()?;
        self.post_raw(&format!("my/ships/{}/scan/systems", ship_symbol), json!({}))
            .await
    }

    pub async fn scan_waypoints(&self, ship_symbol: &str) -> ClientResult<Value> {
        self.require_token()?;
        self.post_raw(
            &format!("my/ships/{}/scan/waypoints", ship_symbol),
            json!({}),
        )
        .await
    }

    /// Refuel from the local market, or from cargo when `from_cargo` is set.
    /// `units: None` fills the tank.
    pub async fn refuel_ship(
        &self,
        ship_symbol: &str,
        units: Option<i32>,
        from_cargo: bool,
    ) -> ClientResult<Value> {
        self.require_token()?;
        let mut body = json!({ "fromCargo": from_cargo });
        if let Some(units) = units {
            body["units"] = json!(units);
        }
        self.post_raw(&format!("my/ships/{}/refuel", ship_symbol), body)
            .await
    }

    pub async fn get_mounts(&self, ship_symbol: &str) -> ClientResult<Vec<Mount>> {
        self.require_token()?;
        let envelope: Envelope<Vec<Mount>> = self
            .get_json(&format!("my/ships/{}/mounts", ship_symbol), &[])
            .await?;
        Ok(envelope.data)
    }

    pub async fn install_mount(&self, ship_symbol: &str, mount_symbol: &str) -> ClientResult<Value> {
        self.require_token()?;
        self.post_raw(
            &format!("my/ships/{}/mounts/install", ship_symbol),
            json!({ "symbol": mount_symbol }),
        )
        .await
    }

    pub async fn remove_mount(&self, ship_symbol: &str, mount_symbol: &str) -> ClientResult<Value> {
        self.require_token()?;
        self.post_raw(
            &format!("my/ships/{}/mounts/remove", ship_symbol),
            json!({ "symbol": mount_symbol }),
        )
        .await
    }

    // System and waypoint operations

    pub async fn list_systems(&self, limit: i64, page: i64) -> ClientResult<Paged<System>> {
        self.get_json("systems", &paging(limit, page)).await
    }

    pub async fn get_system(&self, system_symbol: &str) -> ClientResult<System> {
        let envelope: Envelope<System> = self
            .get_json(&format!("systems/{}", system_symbol), &[])
            .await?;
        Ok(envelope.data)
    }

    /// One page of waypoints, optionally filtered by trait and type.
    pub async fn list_waypoints(
        &self,
        system_symbol: &str,
        limit: i64,
        page: i64,
        traits: &[&str],
        waypoint_type: Option<&str>,
    ) -> ClientResult<Paged<Waypoint>> {
        let mut query = paging(limit, page);
        for t in traits {
            query.push(("traits", t.to_string()));
        }
        if let Some(wp_type) = waypoint_type {
            query.push(("type", wp_type.to_string()));
        }
        self.get_json(&format!("systems/{}/waypoints", system_symbol), &query)
            .await
    }

    pub async fn get_waypoint(
        &self,
        system_symbol: &str,
        waypoint_symbol: &str,
    ) -> ClientResult<Waypoint> {
        let envelope: Envelope<Waypoint> = self
            .get_json(
                &format!("systems/{}/waypoints/{}", system_symbol, waypoint_symbol),
                &[],
            )
            .await?;
        Ok(envelope.data)
    }

    pub async fn get_market(
        &self,
        system_symbol: &str,
        waypoint_symbol: &str,
    ) -> ClientResult<Market> {
        let envelope: Envelope<Market> = self
            .get_json(
                &format!(
                    "systems/{}/waypoints/{}/market",
                    system_symbol, waypoint_symbol
                ),
                &[],
            )
            .await?;
        Ok(envelope.data)
    }

    pub async fn get_shipyard(
        &self,
        system_symbol: &str,
        waypoint_symbol: &str,
    ) -> ClientResult<Shipyard> {
        let envelope: Envelope<Shipyard> = self
            .get_json(
                &format!(
                    "systems/{}/waypoints/{}/shipyard",
                    system_symbol, waypoint_symbol
                ),
                &[],
            )
            .await?;
        Ok(envelope.data)
    }

    pub async fn get_jump_gate(
        &self,
        system_symbol: &str,
        waypoint_symbol: &str,
    ) -> ClientResult<Value> {
        self.get_raw(&format!(
            "systems/{}/waypoints/{}/jump-gate",
            system_symbol, waypoint_symbol
        ))
        .await
    }

    pub async fn get_construction_site(
        &self,
        system_symbol: &str,
        waypoint_symbol: &str,
    ) -> ClientResult<Value> {
        self.get_raw(&format!(
            "systems/{}/waypoints/{}/construction",
            system_symbol, waypoint_symbol
        ))
        .await
    }

    pub async fn supply_construction_site(
        &self,
        system_symbol: &str,
        waypoint_symbol: &str,
        ship_symbol: &str,
        trade_symbol: &str,
        units: i32,
    ) -> ClientResult<Value> {
        self.require_token()?;
        self.post_raw(
            &format!(
                "systems/{}/waypoints/{}/construction/supply",
                system_symbol, waypoint_symbol
            ),
            json!({
                "shipSymbol": ship_symbol,
                "tradeSymbol": trade_symbol,
                "units": units
            }),
        )
        .await
    }
}

fn paging(limit: i64, page: i64) -> Vec<(&'static str, String)> {
    vec![("limit", limit.to_string()), ("page", page.to_string())]
}
