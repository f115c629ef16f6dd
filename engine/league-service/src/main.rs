//! Fantasy League command-line front end
//!
//! Read commands print league state; mutating commands log in as a team
//! first. With the in-memory backend every run starts from the seed league,
//! so `demo` walks through a full trade and add/drop in one process.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use league_core::{
    LeagueService, PlayerFilter, PlayerId, ProposalId, Session, TeamId, TradeProposal,
};
use league_service::{initialize_logging_with_config, load_configuration, start_league};

#[derive(Parser)]
#[command(name = "fantasy-league")]
#[command(about = "Fantasy football league manager: rosters, trades and weekly matchups")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// League standings
    Standings,

    /// A team's roster
    Roster { team: String },

    /// A team's matchup for a week (current week by default)
    Matchup {
        team: String,
        #[arg(short, long)]
        week: Option<u32>,
    },

    /// Player pool
    Players {
        /// free or all
        #[arg(short, long, default_value = "free")]
        filter: PlayerFilter,
    },

    /// Season calendar
    Weeks,

    /// Trade proposals waiting on the team
    Pending {
        team: String,
        #[arg(short, long)]
        password: String,
    },

    /// Add a free agent and drop a rostered player
    AddDrop {
        team: String,
        #[arg(short, long)]
        password: String,
        #[arg(long)]
        add: i64,
        #[arg(long)]
        drop: i64,
    },

    /// Set a team's starters and bench
    SetLineup {
        team: String,
        #[arg(short, long)]
        password: String,
        #[arg(long, value_delimiter = ',')]
        starters: Vec<i64>,
        #[arg(long, value_delimiter = ',')]
        bench: Vec<i64>,
    },

    /// Propose a trade to another team
    Propose {
        team: String,
        #[arg(short, long)]
        password: String,
        #[arg(long)]
        to: String,
        #[arg(long, value_delimiter = ',')]
        offer: Vec<i64>,
        #[arg(long, value_delimiter = ',')]
        request: Vec<i64>,
    },

    /// Accept a pending trade addressed to the team
    Accept {
        team: String,
        #[arg(short, long)]
        password: String,
        id: i64,
    },

    /// Reject a pending trade addressed to the team
    Reject {
        team: String,
        #[arg(short, long)]
        password: String,
        id: i64,
    },

    /// Run a trade and an add/drop against the seed league
    Demo,

    /// Write the default configuration to a file
    InitConfig { path: PathBuf },

    /// Write the built-in league as a JSON seed file
    ExportSeed { path: PathBuf },
}

fn ids(raw: &[i64]) -> Vec<PlayerId> {
    raw.iter().copied().map(PlayerId).collect()
}

fn team_id(league: &LeagueService, name: &str) -> Result<TeamId> {
    league.cache().team_by_name(name).map(|t| t.id).ok_or_else(|| anyhow!("Unknown team: {name}"))
}

async fn login(league: &LeagueService, team: &str, password: &str) -> Result<Session> {
    league.login(team, password).await.with_context(|| format!("Login failed for {team}"))
}

fn player_label(league: &LeagueService, id: PlayerId) -> String {
    match league.cache().player(id) {
        Some(p) => format!("{} ({} {}, #{})", p.name, p.position, p.nfl_team, p.id),
        None => format!("#{id}"),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_roster(league: &LeagueService, team: TeamId, json: bool) -> Result<()> {
    let roster = league.roster(team).ok_or_else(|| anyhow!("Team {team} has no roster"))?;
    if json {
        return print_json(&roster);
    }
    println!("Starters:");
    for id in &roster.starters {
        println!("  {}", player_label(league, *id));
    }
    println!("Bench:");
    for id in &roster.bench {
        println!("  {}", player_label(league, *id));
    }
    Ok(())
}

fn print_proposals(league: &LeagueService, proposals: &[TradeProposal], json: bool) -> Result<()> {
    if json {
        return print_json(&proposals);
    }
    if proposals.is_empty() {
        println!("No pending trades");
    }
    for p in proposals {
        let from = league.cache().team(p.proposing_team_id).map(|t| t.name).unwrap_or_default();
        let offered: Vec<String> = p.offered.iter().map(|id| player_label(league, *id)).collect();
        let requested: Vec<String> = p.requested.iter().map(|id| player_label(league, *id)).collect();
        println!("#{} from {}: {} for {}", p.id, from, offered.join(", "), requested.join(", "));
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = load_configuration(cli.config.as_deref())?;

    // Commands that do not need a running league
    match &cli.command {
        Commands::InitConfig { path } => {
            league_service::config::save_config(&config, path)?;
            println!("Wrote default configuration to {}", path.display());
            return Ok(());
        }
        Commands::ExportSeed { path } => {
            league_store::LeagueSeed::default_league().to_file(path)?;
            println!("Wrote seed league to {}", path.display());
            return Ok(());
        }
        Commands::Demo => {
            config.store.backend = league_store::StoreBackend::Memory;
        }
        _ => {}
    }

    initialize_logging_with_config(&config.logging)?;
    info!("Starting {} v{}", config.league.league_name, env!("CARGO_PKG_VERSION"));
    let league = start_league(&config).await?;
    let json = cli.json;

    match cli.command {
        Commands::Standings => {
            let teams = league.standings();
            if json {
                return print_json(&teams);
            }
            for (rank, team) in teams.iter().enumerate() {
                println!("{:>2}. {:<12} {:>7}  {:>7.1} PF", rank + 1, team.name, team.record(), team.points_for);
            }
        }
        Commands::Roster { team } => {
            let id = team_id(&league, &team)?;
            print_roster(&league, id, json)?;
        }
        Commands::Matchup { team, week } => {
            let id = team_id(&league, &team)?;
            let week = week.unwrap_or_else(|| league.current_week());
            let view = league.team_matchup(id, week).ok_or_else(|| anyhow!("Unknown team: {team}"))?;
            if json {
                return print_json(&view);
            }
            println!("Week {} ({})", view.week, view.status);
            let opponent = view.opponent.as_ref();
            println!(
                "{} {:.1} (proj {:.1})  vs  {} {:.1} (proj {:.1})",
                view.mine.team.name,
                view.mine.actual_total,
                view.mine.projected_total,
                opponent.map(|o| o.team.name.as_str()).unwrap_or("BYE"),
                opponent.map_or(0.0, |o| o.actual_total),
                opponent.map_or(0.0, |o| o.projected_total),
            );
            for row in &view.comparison {
                let mine = row.mine.as_ref().map(|p| p.name.as_str()).unwrap_or("-");
                let theirs = row.theirs.as_ref().map(|p| p.name.as_str()).unwrap_or("-");
                println!("  {:<24} {:>5.1}  |  {:>5.1} {}", mine, row.my_score, row.their_score, theirs);
            }
            for card in &view.other_matchups {
                println!(
                    "{} {:.1} vs {} {:.1}",
                    card.home.team.name, card.home.actual_total, card.away.team.name, card.away.actual_total
                );
            }
        }
        Commands::Players { filter } => {
            let pool = league.player_pool(filter);
            if json {
                return print_json(&pool);
            }
            for entry in &pool {
                println!(
                    "{:<28} {:<3} {:<4} {:>5.1}  {}",
                    entry.player.name,
                    entry.player.position,
                    entry.player.nfl_team,
                    entry.player.projected_points,
                    entry.owner.as_deref().unwrap_or("Free agent")
                );
            }
        }
        Commands::Weeks => {
            if json {
                return print_json(&league.weeks());
            }
            for window in league.weeks() {
                println!(
                    "Week {:>2}  {}  {}  {}",
                    window.week,
                    window.start.format("%Y-%m-%d"),
                    window.end.format("%Y-%m-%d"),
                    league.week_status(window.week)
                );
            }
        }
        Commands::Pending { team, password } => {
            let session = login(&league, &team, &password).await?;
            let pending = league.pending_trades(session.handle).await?;
            print_proposals(&league, &pending, json)?;
        }
        Commands::AddDrop { team, password, add, drop } => {
            let session = login(&league, &team, &password).await?;
            league.add_drop(session.handle, session.team_id, PlayerId(add), PlayerId(drop)).await?;
            print_roster(&league, session.team_id, json)?;
        }
        Commands::SetLineup { team, password, starters, bench } => {
            let session = login(&league, &team, &password).await?;
            league.save_roster(session.handle, session.team_id, ids(&starters), ids(&bench)).await?;
            print_roster(&league, session.team_id, json)?;
        }
        Commands::Propose { team, password, to, offer, request } => {
            let session = login(&league, &team, &password).await?;
            let receiver = team_id(&league, &to)?;
            let proposal = league
                .propose_trade(session.handle, session.team_id, receiver, ids(&offer), ids(&request))
                .await?;
            print_proposals(&league, &[proposal], json)?;
        }
        Commands::Accept { team, password, id } => {
            let session = login(&league, &team, &password).await?;
            let proposal = league.accept_trade(session.handle, ProposalId(id)).await?;
            println!("Trade #{} {}", proposal.id, proposal.status);
            print_roster(&league, session.team_id, json)?;
        }
        Commands::Reject { team, password, id } => {
            let session = login(&league, &team, &password).await?;
            if league.reject_trade(session.handle, ProposalId(id)).await? {
                println!("Trade #{id} rejected");
            } else {
                println!("Trade #{id} was already settled");
            }
        }
        Commands::Demo => demo(&league, &config.league.auth.league_password).await?,
        Commands::InitConfig { .. } | Commands::ExportSeed { .. } => {}
    }

    Ok(())
}

/// Swarchis trades a tight end to Gabriel, who then picks up a free agent
async fn demo(league: &LeagueService, password: &str) -> Result<()> {
    let swarchis = login(league, "Swarchis", password).await?;
    let gabriel = login(league, "Gabriel", password).await?;

    let proposal = league
        .propose_trade(swarchis.handle, swarchis.team_id, gabriel.team_id, ids(&[401]), ids(&[402]))
        .await?;
    println!("Swarchis offers {} for {}", player_label(league, PlayerId(401)), player_label(league, PlayerId(402)));

    let accepted = league.accept_trade(gabriel.handle, proposal.id).await?;
    println!("Trade #{} {}", accepted.id, accepted.status);

    league.add_drop(gabriel.handle, gabriel.team_id, PlayerId(105), PlayerId(102)).await?;
    println!("Gabriel adds {} and drops {}", player_label(league, PlayerId(105)), player_label(league, PlayerId(102)));

    for session in [&swarchis, &gabriel] {
        println!("\n{}", session.team_name);
        print_roster(league, session.team_id, false)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    run(cli).await
}
