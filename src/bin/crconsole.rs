use anyhow::{anyhow, bail, Context, Result};
use chicken_road_admin::dates::{Clock, SystemClock};
use chicken_road_admin::domains::{Agents, Bets, Domain, Players, Users};
use chicken_road_admin::format::{format_amount, format_datetime, format_percent};
use chicken_road_admin::reconcile::{ExternalSeed, FilterReconciler};
use chicken_road_admin::store::{FetchStatus, StoreState};
use chicken_road_admin::{AdminConsole, Config, CreateAgentRequest, FilterSet, QuickRange};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "crconsole")]
#[command(about = "Chicken Road admin console", long_about = None)]
struct Cli {
    /// Path to config.toml (default: ./config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct ListArgs {
    /// Quick date range: today, this-week, this-month, this-year, last-month, last-two-months
    #[arg(short, long)]
    range: Option<QuickRange>,
    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    from: Option<String>,
    /// End date (YYYY-MM-DD)
    #[arg(long)]
    to: Option<String>,
    /// Field filter as key=value, repeatable (e.g. -f status=WON)
    #[arg(short, long = "filter")]
    filters: Vec<String>,
    /// Deep-link query string, e.g. "agentId=agent007"
    #[arg(long)]
    seed: Option<String>,
    #[arg(long)]
    page: Option<u32>,
    #[arg(long)]
    limit: Option<u32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show who the configured credentials belong to
    Whoami,
    /// Dashboard overview
    Dashboard,
    /// List bets with totals
    Bets(ListArgs),
    /// Show one bet
    Bet { id: String },
    /// Player summary report
    Players(ListArgs),
    /// Agent report
    Agents(ListArgs),
    /// List users
    Users(ListArgs),
    /// Agent management
    #[command(subcommand)]
    Agent(AgentCommand),
    /// Game configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum AgentCommand {
    List,
    Show {
        agent_id: String,
    },
    Create {
        agent_id: String,
        #[arg(long)]
        cert: String,
        #[arg(long)]
        ip: String,
        #[arg(long)]
        callback_url: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "INR")]
        currency: String,
        #[arg(long)]
        whitelisted: bool,
        /// Allowed game code, repeatable
        #[arg(long = "game")]
        games: Vec<String>,
    },
    Delete {
        agent_id: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    List,
    Set { key: String, value: String },
    Delete { key: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => {
            dotenv::dotenv().ok();
            let mut config = Config::from_path(path)?;
            config.apply_overrides(|key| std::env::var(key).ok());
            config
        }
        None => Config::new()?,
    };

    let console = AdminConsole::new(config.console)?;
    let admin = console.login_from_config().await?;
    info!("Signed in as {} ({:?})", admin.username, admin.role);

    let result = run(&console, cli.command).await;
    if let Err(err) = console.logout().await {
        info!("Logout: {}", err);
    }
    result
}

async fn run(console: &AdminConsole, command: Commands) -> Result<()> {
    match command {
        Commands::Whoami => {
            let admin = console.verify_session().await?;
            println!("{} {:?} agent={}", admin.username, admin.role, admin.agent_id.unwrap_or_default());
        }
        Commands::Dashboard => {
            console.load_dashboard().await?;
            let state = console.dashboard().snapshot();
            let stats = state
                .value
                .ok_or_else(|| anyhow!(state.error.unwrap_or_else(|| "no data".into())))?;
            println!("Users         {} ({} active)", stats.total_users, stats.active_users);
            println!("Agents        {}", stats.total_agents);
            println!("Bets          {}", stats.total_bets);
            println!("Bet volume    {}", format_amount(stats.total_bet_volume));
            println!("Win amount    {}", format_amount(stats.total_win_amount));
            println!("Net revenue   {}", format_amount(stats.net_revenue));
            for entry in stats.recent_activity.iter().take(10) {
                println!("  {} {} {}", entry.timestamp, entry.kind, entry.description);
            }
        }
        Commands::Bets(args) => {
            let mut view = console.bets_view()?;
            let state = run_list(&mut view, &args).await?;
            print_bets(&state);
        }
        Commands::Bet { id } => {
            console.select_bet(&id).await?;
            let state = console.selected_bet().snapshot();
            let bet = state
                .value
                .ok_or_else(|| anyhow!(state.error.unwrap_or_else(|| "bet not found".into())))?;
            println!("{:#?}", bet);
        }
        Commands::Players(args) => {
            let mut view = console.player_summary_view()?;
            let state = run_list(&mut view, &args).await?;
            print_players(&state);
        }
        Commands::Agents(args) => {
            let mut view = console.agent_report_view()?;
            let state = run_list(&mut view, &args).await?;
            print_agents(&state);
        }
        Commands::Users(args) => {
            let mut view = console.users_view()?;
            let state = run_list(&mut view, &args).await?;
            print_users(&state);
        }
        Commands::Agent(command) => run_agent(console, command).await?,
        Commands::Config(command) => run_config(console, command).await?,
    }
    Ok(())
}

/// Drives a list view the way the screen would: seed, edit, commit, page.
async fn run_list<D: Domain>(
    view: &mut FilterReconciler<D>,
    args: &ListArgs,
) -> Result<StoreState<D>> {
    let mut fetched = false;
    if let Some(seed) = &args.seed {
        view.seed_from_external(ExternalSeed::from_query(seed)).await?;
        fetched = true;
    }

    for filter in &args.filters {
        let (key, value) = filter
            .split_once('=')
            .ok_or_else(|| anyhow!("filter {:?} is not key=value", filter))?;
        view.set_draft_field(key.trim(), value)?;
    }
    if let Some(from) = &args.from {
        view.set_draft_field(<D::Filters as FilterSet>::FROM_KEY, from)?;
    }
    if let Some(to) = &args.to {
        view.set_draft_field(<D::Filters as FilterSet>::TO_KEY, to)?;
    }

    if let Some(range) = args.range {
        view.apply_quick_range(range).await?;
    } else if view.is_dirty() || !fetched {
        view.commit().await?;
    }
    if let Some(limit) = args.limit {
        view.change_limit(limit).await?;
    }
    if let Some(page) = args.page {
        view.change_page(page).await?;
    }

    let state = view.store().snapshot();
    if state.phase != chicken_road_admin::store::StorePhase::Ready {
        bail!(
            "loading {} failed: {}",
            D::NAME,
            state.error.unwrap_or_else(|| "unknown error".into())
        );
    }
    if let Some(range) = view.active_quick_range() {
        println!("Range: {}", range.label());
    }
    Ok(state)
}

fn print_page_footer<D: Domain>(state: &StoreState<D>) {
    let p = state.pagination;
    println!(
        "Page {}/{} ({} rows, {} per page)",
        p.page,
        p.total_pages.max(1),
        p.total,
        p.limit
    );
}

fn print_bets(state: &StoreState<Bets>) {
    let offset = *SystemClock.now().offset();
    println!(
        "{:<24} {:<12} {:<12} {:<10} {:>12} {:>12} {:<9} {}",
        "ID", "USER", "AGENT", "LEVEL", "STAKE", "WIN", "STATUS", "PLACED"
    );
    for bet in &state.rows {
        println!(
            "{:<24} {:<12} {:<12} {:<10} {:>12} {:>12} {:<9} {}",
            bet.id,
            bet.user_id,
            bet.agent_id,
            bet.difficulty,
            format_amount(bet.bet_amount),
            bet.win_amount.map(format_amount).unwrap_or_else(|| "-".into()),
            bet.status,
            format_datetime(&bet.bet_placed_at, &offset)
        );
    }
    if let Some(totals) = &state.totals {
        println!(
            "Totals: {} bets, staked {}, won {}, net revenue {}",
            totals.total_bets,
            format_amount(totals.total_bet_amount),
            format_amount(totals.total_win_amount),
            format_amount(totals.net_revenue)
        );
    }
    print_page_footer(state);
}

fn print_players(state: &StoreState<Players>) {
    println!(
        "{:<16} {:<12} {:<14} {:>8} {:>14} {:>14} {:>14}",
        "PLAYER", "PLATFORM", "GAME", "BETS", "STAKE", "PLAYER W/L", "TOTAL W/L"
    );
    for row in &state.rows {
        println!(
            "{:<16} {:<12} {:<14} {:>8} {:>14} {:>14} {:>14}",
            row.player_id,
            row.platform,
            row.game,
            row.bet_count,
            format_amount(row.bet_amount),
            format_amount(row.player_win_loss),
            format_amount(row.total_win_loss)
        );
    }
    if let Some(totals) = &state.totals {
        println!(
            "Totals: {} players, {} bets, staked {}, player W/L {}, total W/L {}",
            totals.total_players,
            totals.total_bet_count,
            format_amount(totals.total_bet_amount),
            format_amount(totals.total_player_win_loss),
            format_amount(totals.total_win_loss)
        );
    }
    print_page_footer(state);
}

fn print_agents(state: &StoreState<Agents>) {
    println!(
        "{:<14} {:<12} {:<14} {:>8} {:>14} {:>14} {:>9} {:>14}",
        "AGENT", "PLATFORM", "GAME", "BETS", "STAKE", "TOTAL W/L", "MARGIN", "COMPANY W/L"
    );
    for row in &state.rows {
        println!(
            "{:<14} {:<12} {:<14} {:>8} {:>14} {:>14} {:>9} {:>14}",
            row.agent_id,
            row.platform,
            row.game,
            row.bet_count,
            format_amount(row.bet_amount),
            format_amount(row.total_win_loss),
            format_percent(row.margin_percent),
            format_amount(row.company_total_win_loss)
        );
    }
    if let Some(totals) = &state.totals {
        println!(
            "Totals: {} bets, staked {}, W/L {}, margin {}, company W/L {}",
            totals.total_bet_count,
            format_amount(totals.total_bet_amount),
            format_amount(totals.total_win_loss),
            format_percent(totals.total_margin_percent),
            format_amount(totals.company_total_win_loss)
        );
    }
    print_page_footer(state);
}

fn print_users(state: &StoreState<Users>) {
    let offset = *SystemClock.now().offset();
    println!(
        "{:<16} {:<14} {:<16} {:<8} {:>12} {}",
        "USER", "AGENT", "NAME", "CCY", "LIMIT", "CREATED"
    );
    for user in &state.rows {
        println!(
            "{:<16} {:<14} {:<16} {:<8} {:>12} {}",
            user.user_id,
            user.agent_id,
            user.username.as_deref().unwrap_or("-"),
            user.currency,
            format_amount(user.bet_limit),
            format_datetime(&user.created_at, &offset)
        );
    }
    print_page_footer(state);
}

async fn run_agent(console: &AdminConsole, command: AgentCommand) -> Result<()> {
    match command {
        AgentCommand::List => {
            if console.load_agent_directory().await? != FetchStatus::Applied {
                bail!(console
                    .agent_directory()
                    .snapshot()
                    .error
                    .unwrap_or_else(|| "failed to load agents".into()));
            }
            for agent in console.agent_directory().value().unwrap_or_default() {
                println!(
                    "{:<20} {:<16} {:<6} whitelisted={} games={}",
                    agent.agent_id,
                    agent.agent_ip_address,
                    agent.currency.as_deref().unwrap_or("-"),
                    agent.is_whitelisted,
                    agent.allowed_game_codes.join(",")
                );
            }
        }
        AgentCommand::Show { agent_id } => {
            console.select_agent(&agent_id).await?;
            let state = console.selected_agent().snapshot();
            let agent = state
                .value
                .ok_or_else(|| anyhow!(state.error.unwrap_or_else(|| "agent not found".into())))?;
            println!("{:#?}", agent);
        }
        AgentCommand::Create {
            agent_id,
            cert,
            ip,
            callback_url,
            password,
            currency,
            whitelisted,
            games,
        } => {
            let mut request = CreateAgentRequest::new(agent_id, cert, ip, callback_url, password);
            request.currency = currency;
            request.is_whitelisted = whitelisted;
            request.allowed_game_codes = games;
            console
                .create_agent(&request)
                .await
                .context("creating agent")?;
            println!("Agent created successfully");
        }
        AgentCommand::Delete { agent_id } => {
            console.delete_agent(&agent_id).await?;
            println!("Agent {} deleted", agent_id);
        }
    }
    Ok(())
}

async fn run_config(console: &AdminConsole, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::List => {
            console.load_configs().await?;
            let state = console.configs().snapshot();
            if let Some(error) = state.error {
                bail!(error);
            }
            for entry in state.value.unwrap_or_default() {
                println!("{:<32} {}", entry.key, entry.value);
            }
        }
        ConfigCommand::Set { key, value } => {
            console.load_configs().await?;
            let exists = console
                .configs()
                .value()
                .is_some_and(|entries| entries.iter().any(|e| e.key == key));
            if exists {
                console.update_config(&key, &value).await?;
            } else {
                console.create_config(&key, &value).await?;
            }
            println!("{} = {}", key, value);
        }
        ConfigCommand::Delete { key } => {
            console.delete_config(&key).await?;
            println!("{} deleted", key);
        }
    }
    Ok(())
}
