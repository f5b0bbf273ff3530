//! lineview CLI: Command-line interface for the execution events dashboard

use chrono::{DateTime, Local, TimeZone, Utc};
use clap::{Parser, Subcommand};
use lineview_engine::{
    build_ticks, filter_events, parse_picker_date, ApiError, Config, EventSource,
    ExecutionEvent, ExecutionEventsClient, ExecutionEventsPage, FetchParams, NavigationTarget,
    TimeInterval,
};
use std::fmt::Display;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Browse lineage execution events in the terminal
#[derive(Parser, Debug)]
#[command(name = "lineview")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: .lineview/config.json)
    #[arg(long, global = true, env = "LINEVIEW_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the lineage REST API
    #[arg(long, global = true, env = "LINEVIEW_API_URL")]
    api_url: Option<String>,

    /// Base URL of the lineage web UI
    #[arg(long, global = true, env = "LINEVIEW_UI_BASE_URL")]
    ui_base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Open the dashboard (default when no command specified)
    Tui {
        /// Browse built-in sample rows instead of the server
        #[arg(long)]
        sample: bool,
    },

    /// Fetch one page of execution events and print it
    Events {
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        from: String,

        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        to: String,

        /// Row offset of the page
        #[arg(long, default_value = "0")]
        offset: u64,

        /// Only print rows containing this text
        #[arg(long)]
        query: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Use built-in sample rows instead of the server
        #[arg(long)]
        sample: bool,
    },

    /// Print the slider ticks for a date range
    Ticks {
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        from: String,

        /// Last day (YYYY-MM-DD)
        #[arg(long)]
        to: String,

        /// Interpret dates in UTC instead of local time
        #[arg(long)]
        utc: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the lineage overview URL for a data source
    Link {
        /// Data source URI
        #[arg(long)]
        datasource: String,

        /// Application ID
        #[arg(long)]
        app_id: String,
    },

    /// Write the default config file
    Init,
}

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);

    let config = match load_config(&cli, &config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let command = cli.command.unwrap_or(Commands::Tui { sample: false });
    let result = match command {
        Commands::Tui { sample } => cmd_tui(config, sample),
        Commands::Events {
            from,
            to,
            offset,
            query,
            json,
            sample,
        } => {
            init_stderr_logging();
            cmd_events(&config, &from, &to, offset, query.as_deref(), json, sample)
        }
        Commands::Ticks {
            from,
            to,
            utc,
            json,
        } => {
            init_stderr_logging();
            if utc {
                cmd_ticks(&from, &to, &Utc, json)
            } else {
                cmd_ticks(&from, &to, &Local, json)
            }
        }
        Commands::Link { datasource, app_id } => cmd_link(&config, datasource, app_id),
        Commands::Init => cmd_init(&config_path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Load the config file and apply command-line overrides.
fn load_config(cli: &Cli, path: &Path) -> Result<Config, lineview_engine::ConfigError> {
    let mut config = Config::load_or_default(path)?;
    if let Some(api_url) = &cli.api_url {
        config.api_url.clone_from(api_url);
    }
    if let Some(ui_base_url) = &cli.ui_base_url {
        config.ui_base_url.clone_from(ui_base_url);
    }
    Ok(config)
}

// =============================================================================
// LOGGING
// =============================================================================

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env("LINEVIEW_LOG").unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Log to stderr; one-shot commands keep stdout for their output.
fn init_stderr_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
}

/// Log to a file; the dashboard owns the terminal.
fn init_file_logging(path: &Path) {
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
        }
        Err(_) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_writer(std::io::sink)
                .try_init();
        }
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

fn event_source(config: &Config, sample: bool) -> Result<EventSource, ApiError> {
    if sample {
        return Ok(EventSource::Sample);
    }
    let client = ExecutionEventsClient::new(config.api_url.clone(), config.request_timeout())?;
    Ok(EventSource::Remote(client))
}

fn cmd_tui(config: Config, sample: bool) -> CliResult {
    init_file_logging(&config.log_file);
    let source = event_source(&config, sample)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(lineview_tui::run_tui(config, source))
}

/// Interval from the start of `from` to the start of `to`, in `tz`.
fn day_interval<Tz: TimeZone>(
    from: &str,
    to: &str,
    tz: &Tz,
) -> Result<TimeInterval, lineview_engine::InputError> {
    let start = parse_picker_date(from, tz)?;
    let end = parse_picker_date(to, tz)?;
    Ok(TimeInterval::ordered(
        start.timestamp_millis(),
        end.timestamp_millis(),
    ))
}

fn cmd_events(
    config: &Config,
    from: &str,
    to: &str,
    offset: u64,
    query: Option<&str>,
    json: bool,
    sample: bool,
) -> CliResult {
    let range = day_interval(from, to, &Local)?;
    let params = FetchParams::new(range, Utc::now().timestamp_millis(), offset);
    let source = event_source(config, sample)?;
    info!(source = %source.describe(), offset, "fetching one page");

    let rt = tokio::runtime::Runtime::new()?;
    let page = rt.block_on(source.fetch(&params, config.page_size()))?;
    let page = narrow_page(page, query.unwrap_or(""));

    if json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    if page.elements.is_empty() {
        println!("No execution events");
        return Ok(());
    }
    for event in &page.elements {
        println!("{}", event_line(event, &Local));
    }
    println!(
        "\n{} row(s) shown, offset {}, {} total",
        page.elements.len(),
        page.offset,
        page.total_count
    );
    Ok(())
}

/// Keep the rows of `page` matching `query`.
fn narrow_page(page: ExecutionEventsPage, query: &str) -> ExecutionEventsPage {
    let keep = filter_events(&page.elements, query);
    let mut rows = page.elements.into_iter().map(Some).collect::<Vec<_>>();
    let elements = keep
        .into_iter()
        .filter_map(|index| rows.get_mut(index).and_then(Option::take))
        .collect();
    ExecutionEventsPage {
        elements,
        offset: page.offset,
        total_count: page.total_count,
    }
}

fn event_line<Tz: TimeZone>(event: &ExecutionEvent, tz: &Tz) -> String
where
    Tz::Offset: Display,
{
    let when = tz
        .timestamp_millis_opt(event.timestamp)
        .single()
        .map_or_else(|| event.timestamp.to_string(), |dt| dt.format("%Y-%m-%d %H:%M").to_string());
    format!(
        "{when}  {:<8} {:<20} {:<20} {:<8} {:<9} {}",
        event.framework_name,
        event.application_name,
        event.application_id,
        event.datasource_type,
        event.write_mode,
        event.datasource
    )
}

fn cmd_ticks<Tz: TimeZone>(from: &str, to: &str, tz: &Tz, json: bool) -> CliResult
where
    Tz::Offset: Display,
{
    let interval = day_interval(from, to, tz)?;
    let ticks = build_ticks(&interval, tz);

    if json {
        println!("{}", serde_json::to_string_pretty(&ticks)?);
        return Ok(());
    }

    for tick in &ticks {
        let when: Option<DateTime<Tz>> = tz.timestamp_millis_opt(tick.value).single();
        let when = when.map_or_else(
            || tick.value.to_string(),
            |dt| dt.format("%Y-%m-%d").to_string(),
        );
        let legend = tick
            .legend
            .as_ref()
            .map(|legend| legend.lines().join(" "))
            .unwrap_or_default();
        println!("{when}  {legend}");
    }
    println!("\n{} tick(s)", ticks.len());
    Ok(())
}

fn cmd_link(config: &Config, datasource: String, app_id: String) -> CliResult {
    let url = NavigationTarget::lineage_overview(datasource, app_id).resolve(&config.ui_base_url)?;
    println!("{url}");
    Ok(())
}

fn cmd_init(config_path: &Path) -> CliResult {
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
        return Ok(());
    }

    Config::default().save(config_path)?;
    println!("Created {}", config_path.display());
    println!("\nEdit it to point lineview at your lineage server");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineview_engine::sample_page;

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::try_parse_from(["lineview"]).unwrap();
        assert_eq!(cli.command, None);
    }

    #[test]
    fn test_parse_events_command() {
        let cli = Cli::try_parse_from([
            "lineview", "events", "--from", "2024-01-01", "--to", "2024-01-31", "--query",
            "sales", "--sample",
        ])
        .unwrap();

        assert_eq!(
            cli.command,
            Some(Commands::Events {
                from: "2024-01-01".into(),
                to: "2024-01-31".into(),
                offset: 0,
                query: Some("sales".into()),
                json: false,
                sample: true,
            })
        );
    }

    #[test]
    fn test_global_overrides_after_subcommand() {
        let cli = Cli::try_parse_from([
            "lineview",
            "link",
            "--datasource",
            "s3://lake/x",
            "--app-id",
            "app-1",
            "--ui-base-url",
            "https://lineage.example.com/ui",
        ])
        .unwrap();

        assert_eq!(cli.ui_base_url.as_deref(), Some("https://lineage.example.com/ui"));
    }

    #[test]
    fn test_load_config_applies_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"api_url": "http://old:8080/consumer", "page_size": 25}"#,
        )
        .unwrap();
        let cli = Cli::try_parse_from(["lineview", "--api-url", "http://lineage:8080/consumer"])
            .unwrap();

        let config = load_config(&cli, &path).unwrap();

        assert_eq!(config.api_url, "http://lineage:8080/consumer");
        assert_eq!(config.page_size, 25);
        assert_eq!(config.ui_base_url, Config::default().ui_base_url);
    }

    #[test]
    fn test_narrow_page_keeps_paging_metadata() {
        let page = sample_page(0, 10);

        let narrowed = narrow_page(page, "parquet");

        assert_eq!(narrowed.elements.len(), 3);
        assert_eq!(narrowed.total_count, 7);
        assert!(narrowed
            .elements
            .iter()
            .all(|event| event.datasource.contains("parquet")));
    }

    #[test]
    fn test_event_line_formats_in_zone() {
        let page = sample_page(0, 1);

        let line = event_line(&page.elements[0], &Utc);

        assert!(line.starts_with("2024-01-02 09:00  Spark"));
        assert!(line.ends_with("hdfs://warehouse/marketing/raw.parquet"));
    }

    #[test]
    fn test_day_interval_orders_dates() {
        let interval = day_interval("2024-01-05", "2024-01-01", &Utc).unwrap();

        assert_eq!(interval.start_ms(), 1_704_067_200_000);
        assert_eq!(interval.end_ms(), 1_704_412_800_000);
    }

    #[test]
    fn test_init_writes_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".lineview").join("config.json");

        cmd_init(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }
}
