// SpaceMerchants CLI - thin consumer of the session library
use clap::{Parser, Subcommand};
use std::fs;

use spacemerchants::logging::set_log_level;
use spacemerchants::{MerchantConfig, SpaceMerchantClient, SpaceMerchants};

#[derive(Parser)]
#[command(name = "spacemerchants", about = "Rate-limited SpaceTraders API client")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "spacemerchants.toml")]
    config: String,

    /// Increase log verbosity (-v info is the default, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show server status and reset schedule
    Status,
    /// Show the authenticated agent
    Agent,
    /// List every ship in the fleet
    Fleet,
    /// List every contract held by the agent
    Contracts,
    /// List all factions
    Factions,
    /// Register a new agent and print the raw response (including the token)
    Register {
        callsign: String,
        #[arg(default_value = "COSMIC")]
        faction: String,
        #[arg(long)]
        email: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = MerchantConfig::load_or_create(&cli.config)?;
    let log_level = if cli.verbose > 0 {
        cli.verbose + 1
    } else {
        config.logging.level
    };
    set_log_level(log_level);

    let token = load_token(&config.api.token_file);
    let limiter = config.build_limiter()?;
    let mut client = SpaceMerchantClient::with_limiter(token, limiter)?;
    client.set_base_url(&config.api.base_url);
    let mut session = SpaceMerchants::with_client(client);

    match cli.command {
        Command::Status => {
            let status = session.status().await?;
            println!("SpaceTraders {} - {}", status.version, status.status);
            println!("  Last reset: {}", status.reset_date);
            println!(
                "  Next reset: {} ({})",
                status.server_resets.next, status.server_resets.frequency
            );
        }
        Command::Agent => {
            let agent = session.me().await?;
            println!("Agent {}", agent.symbol);
            println!("  Headquarters: {}", agent.headquarters);
            println!("  Credits: {}", agent.credits);
            println!("  Ships: {}", agent.ship_count);
            println!("  Faction: {}", agent.starting_faction);
        }
        Command::Fleet => {
            let ships = session.all_ships().await?;
            println!("Fleet: {} ship(s)", ships.len());
            for ship in &ships {
                println!(
                    "  {} [{}] at {} ({})",
                    ship.symbol, ship.registration.role, ship.nav.waypoint_symbol, ship.nav.status
                );
            }
        }
        Command::Contracts => {
            let contracts = session.all_contracts().await?;
            println!("Contracts: {}", contracts.len());
            for contract in &contracts {
                println!(
                    "  {} [{}] accepted={} fulfilled={} pays {}",
                    contract.id,
                    contract.contract_type,
                    contract.accepted,
                    contract.fulfilled,
                    contract.total_payment()
                );
            }
        }
        Command::Factions => {
            let factions = session.factions(false).await?;
            for faction in factions {
                println!(
                    "  {} - {}{}",
                    faction.symbol,
                    faction.name,
                    if faction.is_recruiting {
                        " (recruiting)"
                    } else {
                        ""
                    }
                );
            }
        }
        Command::Register {
            callsign,
            faction,
            email,
        } => {
            let response = session
                .client
                .register(&callsign, &faction, email.as_deref())
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            eprintln!("note: save data.token to {} to authenticate", config.api.token_file);
        }
    }

    Ok(())
}

fn load_token(token_file: &str) -> Option<String> {
    fs::read_to_string(token_file)
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
