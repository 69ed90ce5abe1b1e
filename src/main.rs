use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ringside::api::{build_router, AppState};
use ringside::config::AppConfig;
use ringside::engine::check_completion;
use ringside::models::{CompetitionKind, EntityId};
use ringside::pipeline::Pipeline;
use ringside::storage::{FightSource, JsonlStore, SnapshotStore, StorageConfig};

#[derive(Parser)]
#[command(name = "ringside")]
#[command(about = "Fight league derived-state engine: standings, streaks, rankings")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Data directory path (overrides config)
    #[arg(long)]
    data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server with the trigger pipeline worker
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port number (overrides config)
        #[arg(long)]
        port: Option<u16>,

        /// League competition id the completion gate reports against
        #[arg(long, default_value = "league")]
        league_competition: String,
    },

    /// Print the latest standings snapshot of a division
    Standings {
        #[arg(long)]
        competition: String,

        #[arg(long)]
        season: u32,

        #[arg(long)]
        division: u32,
    },

    /// Rebuild streak and head-to-head state from the full ledger
    Replay {
        /// Competition that triggered the rebuild (logging only)
        #[arg(long, default_value = "league")]
        competition: String,
    },

    /// Check a league season and its linked cups for completion
    Check {
        #[arg(long, default_value = "league")]
        competition: String,

        #[arg(long)]
        league_season: u32,
    },

    /// Recalculate and promote a new global ranking snapshot
    RecalcRankings {
        /// League competition id used when assembling resumes
        #[arg(long, default_value = "league")]
        league_competition: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting ringside v{}", env!("CARGO_PKG_VERSION"));

    let config_path = PathBuf::from(&cli.config);
    let mut config = if config_path.exists() {
        AppConfig::from_file(&config_path)?
    } else {
        AppConfig::default()
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = PathBuf::from(dir);
    }

    let store = Arc::new(JsonlStore::new(StorageConfig::new(config.data_dir.clone())));

    match cli.command {
        Commands::Serve {
            host,
            port,
            league_competition,
        } => {
            let pipeline = Arc::new(Pipeline::new(
                store.clone(),
                store.clone(),
                config.scoring.clone(),
                EntityId::from(league_competition.as_str()),
            ));

            let (events, rx) = tokio::sync::mpsc::channel(64);
            tokio::spawn(pipeline.run(rx));

            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let state = AppState {
                store,
                events,
                config: Arc::new(config),
            };

            let app = build_router(state);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Standings {
            competition,
            season,
            division,
        } => {
            let snapshot = store
                .latest_standings_snapshot(&EntityId::from(competition.as_str()), season, division)
                .await?;
            match snapshot {
                Some(snapshot) => {
                    println!(
                        "{} S{} D{} after {} ({} fighters)",
                        competition,
                        snapshot.season,
                        snapshot.division,
                        snapshot.fight_identifier,
                        snapshot.total_fighters_count
                    );
                    println!(
                        "{:>4}  {:<20} {:>6} {:>5} {:>7}",
                        "rank", "fighter", "fights", "wins", "points"
                    );
                    for row in &snapshot.standings {
                        println!(
                            "{:>4}  {:<20} {:>6} {:>5} {:>7}",
                            row.rank, row.fighter_id, row.fights_count, row.wins, row.points
                        );
                    }
                }
                None => println!(
                    "No standings for {} season {} division {}",
                    competition, season, division
                ),
            }
        }
        Commands::Replay { competition } => {
            let pipeline = Pipeline::new(
                store.clone(),
                store.clone(),
                config.scoring.clone(),
                EntityId::from(competition.as_str()),
            );
            let fighters = pipeline
                .on_season_data_changed(&EntityId::from(competition.as_str()))
                .await?;
            println!("Streak state rebuilt for {} fighters", fighters);
        }
        Commands::Check {
            competition,
            league_season,
        } => {
            let league = store
                .league_season(&EntityId::from(competition.as_str()), league_season)
                .await?;
            match league {
                Some(league) => {
                    let cc = store
                        .cup_season(CompetitionKind::ChampionsCup, &league.season_id)
                        .await?;
                    let ic = store
                        .cup_season(CompetitionKind::InvictaCup, &league.season_id)
                        .await?;
                    let report = check_completion(&league, cc.as_ref(), ic.as_ref());
                    println!("Season {}: {}", league_season, report.reason);
                }
                None => println!(
                    "No league season {} registered for {}",
                    league_season, competition
                ),
            }
        }
        Commands::RecalcRankings { league_competition } => {
            let pipeline = Pipeline::new(
                store.clone(),
                store.clone(),
                config.scoring.clone(),
                EntityId::from(league_competition.as_str()),
            );
            let snapshot = pipeline.recalculate_rankings().await?;
            println!(
                "Promoted ranking snapshot {} ({} fighters)",
                snapshot.id,
                snapshot.entries.len()
            );
            for entry in &snapshot.entries {
                println!(
                    "{:>4}  {:<20} {:>8.2}",
                    entry.rank, entry.fighter_id, entry.score
                );
            }
        }
    }

    Ok(())
}
