use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use configuration::{MAX_ARCHIVE_COUNT, Settings};
use gateway::{
    CampaignFromQueryRequest, ContactGateway, CountRequest, RoutedSelectRequest, RoutedTable,
    SelectRequest,
};
use serde_json::{Map, Value as JsonValue};
use std::net::SocketAddr;
use std::path::PathBuf;

/// The main entry point for the contact gateway.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse();

    let settings = configuration::load_settings(cli.config.as_deref())?;
    // Held until exit so buffered log lines are flushed.
    let _log_guard = configuration::init_tracing(&settings.logging)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Serve(args) => handle_serve(args, &settings).await,
        Commands::Select(args) => handle_select(args, &settings).await,
        Commands::Count(args) => handle_count(args, &settings).await,
        Commands::SelectRouted(args) => handle_select_routed(args, &settings).await,
        Commands::CampaignFromQuery(args) => handle_campaign_from_query(args, &settings).await,
        Commands::ResolveTables(args) => handle_resolve_tables(args, &settings),
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Guarded data access over the Postgres and Oracle contact databases.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults to ./contact-gateway.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve every operation over HTTP.
    Serve(ServeArgs),
    /// Read rows from an allowlisted Postgres table.
    Select(SelectArgs),
    /// Count rows in an allowlisted Postgres table.
    Count(CountArgs),
    /// Read contacts or transactions from the client's own database.
    SelectRouted(RoutedArgs),
    /// Create a campaign from the transactions matching a query.
    CampaignFromQuery(CampaignArgs),
    /// Print the live and archive transaction tables for a pair of database links.
    ResolveTables(ResolveArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

#[derive(Clone, Copy, ValueEnum)]
enum RoutedTableArg {
    Contact,
    Transaction,
}

impl From<RoutedTableArg> for RoutedTable {
    fn from(table: RoutedTableArg) -> Self {
        match table {
            RoutedTableArg::Contact => RoutedTable::Contact,
            RoutedTableArg::Transaction => RoutedTable::Transaction,
        }
    }
}

#[derive(Parser)]
struct ServeArgs {
    /// Overrides `server.addr` (e.g. "0.0.0.0:3000").
    #[arg(long)]
    addr: Option<SocketAddr>,
}

#[derive(Parser)]
struct SelectArgs {
    /// The logical table name (e.g. "contact").
    #[arg(long)]
    table: String,

    /// A JSON filter mapping, e.g. '{"state": "TX", "paymentbalance": [">", 100]}'.
    #[arg(long, value_parser = parse_json)]
    filters: Option<JsonValue>,

    /// Comma-separated column list.
    #[arg(long, value_delimiter = ',')]
    columns: Option<Vec<String>>,

    #[arg(long)]
    limit: Option<i64>,

    #[arg(long)]
    offset: Option<i64>,

    /// "<column>" or "<column> ASC|DESC".
    #[arg(long)]
    order_by: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

#[derive(Parser)]
struct CountArgs {
    #[arg(long)]
    table: String,

    #[arg(long, value_parser = parse_json)]
    filters: Option<JsonValue>,
}

#[derive(Parser)]
struct RoutedArgs {
    /// The client whose database links decide where the read goes.
    #[arg(long)]
    client_id: i64,

    #[arg(long, value_enum)]
    table: RoutedTableArg,

    #[arg(long, value_parser = parse_json)]
    filters: Option<JsonValue>,

    #[arg(long, value_delimiter = ',')]
    columns: Option<Vec<String>>,

    #[arg(long)]
    limit: Option<i64>,

    #[arg(long)]
    order_by: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,
}

#[derive(Parser)]
struct CampaignArgs {
    /// The real client id (not a skill id).
    #[arg(long)]
    client_id: i64,

    /// Transaction filters. A `client_id` key here names a skill.
    #[arg(long, value_parser = parse_object)]
    filters: Map<String, JsonValue>,

    /// Campaign settings such as filename, am_option or contact_source.
    #[arg(long, value_parser = parse_object)]
    campaign_data: Option<Map<String, JsonValue>>,

    /// Copy at most this many transactions.
    #[arg(long)]
    max_records: Option<i64>,
}

#[derive(Parser)]
struct ResolveArgs {
    #[arg(long)]
    dialing_db: String,

    #[arg(long)]
    reporting_db: Option<String>,

    /// Defaults to `routing.archive_count`.
    #[arg(long)]
    archive_count: Option<u32>,

    /// The reference date (format: YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,
}

fn parse_json(raw: &str) -> Result<JsonValue, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {e}"))
}

fn parse_object(raw: &str) -> Result<Map<String, JsonValue>, String> {
    match parse_json(raw)? {
        JsonValue::Object(map) => Ok(map),
        _ => Err("expected a JSON object".to_string()),
    }
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_serve(args: ServeArgs, settings: &Settings) -> anyhow::Result<()> {
    let addr = match args.addr {
        Some(addr) => addr,
        None => settings.server.addr.parse()?,
    };
    let gateway = ContactGateway::connect(settings).await?;
    web_server::run_server(gateway, addr).await
}

async fn handle_select(args: SelectArgs, settings: &Settings) -> anyhow::Result<()> {
    let gateway = ContactGateway::connect(settings).await?;
    let rows = gateway
        .select(&SelectRequest {
            table: args.table,
            filters: args.filters,
            columns: args.columns,
            limit: args.limit,
            offset: args.offset,
            order_by: args.order_by,
        })
        .await?;
    print_rows(&rows, args.format)
}

async fn handle_count(args: CountArgs, settings: &Settings) -> anyhow::Result<()> {
    let gateway = ContactGateway::connect(settings).await?;
    let count = gateway
        .count(&CountRequest {
            table: args.table,
            filters: args.filters,
        })
        .await?;
    println!("{count}");
    Ok(())
}

async fn handle_select_routed(args: RoutedArgs, settings: &Settings) -> anyhow::Result<()> {
    let gateway = ContactGateway::connect(settings).await?;
    let rows = gateway
        .select_routed(&RoutedSelectRequest {
            client_id: args.client_id,
            table: args.table.into(),
            filters: args.filters,
            columns: args.columns,
            limit: args.limit,
            order_by: args.order_by,
        })
        .await?;
    print_rows(&rows, args.format)
}

async fn handle_campaign_from_query(args: CampaignArgs, settings: &Settings) -> anyhow::Result<()> {
    let gateway = ContactGateway::connect(settings).await?;
    let outcome = gateway
        .create_campaign_from_query(&CampaignFromQueryRequest {
            client_id: args.client_id,
            query_filters: args.filters,
            campaign_data: args.campaign_data,
            max_records: args.max_records,
        })
        .await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn handle_resolve_tables(args: ResolveArgs, settings: &Settings) -> anyhow::Result<()> {
    let archive_count = args
        .archive_count
        .unwrap_or(settings.routing.archive_count)
        .min(MAX_ARCHIVE_COUNT);
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let tables = query_builder::resolve_transaction_tables(
        &args.dialing_db,
        args.reporting_db.as_deref(),
        archive_count,
        date,
    )?;
    for table in tables {
        println!("{table}");
    }
    Ok(())
}

// ==============================================================================
// Output
// ==============================================================================

fn print_rows(rows: &[Map<String, JsonValue>], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
        OutputFormat::Table => println!("{}", rows_table(rows)),
    }
    Ok(())
}

fn cell(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One column per key of the first row, in select-list order.
fn rows_table(rows: &[Map<String, JsonValue>]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    if let Some(first) = rows.first() {
        table.set_header(first.keys().cloned().collect::<Vec<_>>());
    }
    for row in rows {
        table.add_row(row.values().map(cell).collect::<Vec<_>>());
    }
    table
}
