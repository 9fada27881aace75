// Session module - per-session owner of one client (and its rate limiter)
use crate::client::SpaceMerchantClient;
use crate::log_debug;
use crate::models::{Agent, Contract, Faction, ServerStatus, Ship, Waypoint};

type SessionResult<T> = Result<T, Box<dyn std::error::Error>>;

const PAGE_LIMIT: i64 = 20;

/// High-level entry point: owns the client for the lifetime of one play
/// session and caches the slow-moving server data (status, faction list).
pub struct SpaceMerchants {
    pub client: SpaceMerchantClient,
    status: Option<ServerStatus>,
    factions: Vec<Faction>,
}

impl SpaceMerchants {
    pub fn new(token: Option<String>) -> SessionResult<Self> {
        Ok(Self {
            client: SpaceMerchantClient::new(token)?,
            status: None,
            factions: Vec::new(),
        })
    }

    pub fn with_client(client: SpaceMerchantClient) -> Self {
        Self {
            client,
            status: None,
            factions: Vec::new(),
        }
    }

    /// Server status, fetched once and cached for the session.
    pub async fn status(&mut self) -> SessionResult<&ServerStatus> {
        if self.status.is_none() {
            self.status = Some(self.client.get_status().await?);
        }
        Ok(self.status.as_ref().unwrap())
    }

    /// The agent this session is authenticated as.
    pub async fn me(&self) -> SessionResult<Agent> {
        self.client.get_agent().await
    }

    /// All factions; the list never changes within a server reset, so it is
    /// cached after the first call. Pass `force` to refresh anyway.
    pub async fn factions(&mut self, force: bool) -> SessionResult<&[Faction]> {
        if force || self.factions.is_empty() {
            self.factions = self.collect_factions().await?;
        }
        Ok(&self.factions)
    }

    async fn collect_factions(&self) -> SessionResult<Vec<Faction>> {
        let mut factions: Vec<Faction> = Vec::new();
        let mut page = 1;
        loop {
            let batch = self.client.list_factions(PAGE_LIMIT, page).await?;
            log_debug!(
                "factions | page {} | {} of {}",
                page,
                factions.len() + batch.data.len(),
                batch.meta.total
            );
            let total = batch.meta.total as usize;
            let empty = batch.data.is_empty();
            factions.extend(batch.data);
            if factions.len() >= total || empty {
                break;
            }
            page += 1;
        }
        Ok(factions)
    }

    /// The full fleet, following pagination until `meta.total` ships are in.
    pub async fn all_ships(&self) -> SessionResult<Vec<Ship>> {
        let mut ships: Vec<Ship> = Vec::new();
        let mut page = 1;
        loop {
            let batch = self.client.list_ships(PAGE_LIMIT, page).await?;
            log_debug!("ships | page {} | total {}", page, batch.meta.total);
            let total = batch.meta.total as usize;
            let empty = batch.data.is_empty();
            ships.extend(batch.data);
            if ships.len() >= total || empty {
                break;
            }
            page += 1;
        }
        Ok(ships)
    }

    /// Every contract offered to or held by the agent.
    pub async fn all_contracts(&self) -> SessionResult<Vec<Contract>> {
        let mut contracts: Vec<Contract> = Vec::new();
        let mut page = 1;
        loop {
            let batch = self.client.list_contracts(PAGE_LIMIT, page).await?;
            log_debug!("contracts | page {} | total {}", page, batch.meta.total);
            let total = batch.meta.total as usize;
            let empty = batch.data.is_empty();
            contracts.extend(batch.data);
            if contracts.len() >= total || empty {
                break;
            }
            page += 1;
        }
        Ok(contracts)
    }

    /// Every waypoint in a system, optionally filtered by trait.
    pub async fn all_waypoints(
        &self,
        system_symbol: &str,
        traits: &[&str],
    ) -> SessionResult<Vec<Waypoint>> {
        let mut waypoints: Vec<Waypoint> = Vec::new();
        let mut page = 1;
        loop {
            let batch = self
                .client
                .list_waypoints(system_symbol, PAGE_LIMIT, page, traits, None)
                .await?;
            log_debug!(
                "waypoints | {} | page {} | total {}",
                system_symbol,
                page,
                batch.meta.total
            );
            let total = batch.meta.total as usize;
            let empty = batch.data.is_empty();
            waypoints.extend(batch.data);
            if waypoints.len() >= total || empty {
                break;
            }
            page += 1;
        }
        Ok(waypoints)
    }

    /// Waypoints in a system that carry a shipyard.
    pub async fn shipyard_waypoints(&self, system_symbol: &str) -> SessionResult<Vec<Waypoint>> {
        self.all_waypoints(system_symbol, &["SHIPYARD"]).await
    }

    /// End the session: shuts the rate limiter down so its refill task and
    /// any parked waiters do not outlive the session.
    pub fn close(&self) {
        self.client.close();
    }
}

impl Drop for SpaceMerchants {
    fn drop(&mut self) {
        self.close();
    }
}
