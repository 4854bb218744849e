use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, error};

use vcfo_metrics::config::{Config, LoggingConfig};
use vcfo_metrics::metrics::{MetricQuery, RollUpType};
use vcfo_metrics::resources::{KindFilter, PropertyCondition, ResourceType, SearchFilter};
use vcfo_metrics::startup::{self, StartupLogger};
use vcfo_metrics::MonitoringService;

#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = vcfo_metrics::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    /// Target instance name (defaults to the first configured instance)
    #[arg(short, long, global = true)]
    instance: Option<String>,

    #[command(subcommand)]
    command: Command,
}

/// Time window, either relative (`--last 6h`) or absolute epoch milliseconds
#[derive(Args, Debug, Default)]
struct Window {
    /// Relative window ending now, e.g. 30m, 6h, 7d, 2w
    #[arg(long, conflicts_with_all = ["begin", "end"])]
    last: Option<String>,

    /// Window start, epoch milliseconds
    #[arg(long, requires = "end")]
    begin: Option<i64>,

    /// Window end, epoch milliseconds
    #[arg(long, requires = "begin")]
    end: Option<i64>,
}

impl Window {
    fn resolve(&self) -> Result<(Option<i64>, Option<i64>)> {
        match &self.last {
            Some(last) => {
                let span = parse_relative(last)?;
                let end = Utc::now().timestamp_millis();
                Ok((Some(end - span.num_milliseconds()), Some(end)))
            }
            None => Ok((self.begin, self.end)),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List configured instances (no credentials)
    Instances,

    /// Time series for one resource
    Metrics {
        resource_id: String,
        /// Metric key, repeatable
        #[arg(short = 'k', long = "stat-key")]
        stat_keys: Vec<String>,
        #[command(flatten)]
        window: Window,
        /// Roll-up (AVG, SUM, MIN, MAX, NONE, LATEST, COUNT)
        #[arg(long)]
        roll_up: Option<RollUpType>,
    },

    /// Latest value for one or more resources
    Latest {
        #[arg(required = true)]
        resource_ids: Vec<String>,
        #[arg(short = 'k', long = "stat-key")]
        stat_keys: Vec<String>,
    },

    /// Bulk query over several resources and keys in one round trip
    Query {
        #[arg(required = true)]
        resource_ids: Vec<String>,
        #[arg(short = 'k', long = "stat-key")]
        stat_keys: Vec<String>,
        #[command(flatten)]
        window: Window,
        #[arg(long)]
        roll_up: Option<RollUpType>,
    },

    /// Metric keys available on a resource (empty on failure)
    StatKeys { resource_id: String },

    /// Free-text resource search
    Search {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        adapter_kind: Option<String>,
        #[arg(long)]
        resource_kind: Option<String>,
    },

    /// Structured query over property conditions, all of which must hold
    QueryResources {
        /// Condition as key=value, repeatable
        #[arg(long = "where", required = true)]
        conditions: Vec<String>,
    },

    /// Project resources, optionally filtered by name
    Projects { names: Vec<String> },

    /// Cluster resources, optionally filtered by name
    Clusters { names: Vec<String> },

    /// First resource with a name (null when not found)
    Find {
        name: String,
        /// project, vm, cluster or supervisor-namespace
        #[arg(long = "type")]
        resource_type: Option<ResourceType>,
    },

    /// First resource whose property equals a value (null when not found)
    FindByProperty { key: String, value: String },

    /// Full details of one resource
    Details { resource_id: String },
}

impl Cli {
    /// The `--log-level` override, rejected before any subscriber sees it
    fn checked_log_level(&self) -> Result<Option<&str>> {
        if let Some(level) = &self.log_level {
            LoggingConfig::validate_level(level)?;
        }
        Ok(self.log_level.as_deref())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = cli.checked_log_level()?;

    // .env and override diagnostics are emitted while loading
    let mut resolution = tracing::subscriber::with_default(
        startup::bootstrap_subscriber(log_level),
        || Config::load_with_resolution(&cli.config),
    )
    .with_context(|| format!("Failed to load configuration from {:?}", cli.config))?;
    if let Some(level) = log_level {
        resolution.config.logging.level = level.to_string();
    }

    startup::init_logging(&resolution.config.logging)?;
    StartupLogger::display_startup_info(&resolution, vcfo_metrics::VERSION);

    let service = MonitoringService::new(resolution.config)?;

    run(cli.command, &service, cli.instance.as_deref())
        .await
        .map_err(|e| {
            error!("Command failed: {}", e);
            e
        })
}

async fn run(command: Command, service: &MonitoringService, instance: Option<&str>) -> Result<()> {
    match command {
        Command::Instances => print_json(&service.get_instances()),

        Command::Metrics {
            resource_id,
            stat_keys,
            window,
            roll_up,
        } => {
            let (begin, end) = window.resolve()?;
            let response = service
                .get_resource_metrics(&resource_id, &stat_keys, begin, end, roll_up, instance)
                .await?;
            print_json(&response)
        }

        Command::Latest {
            resource_ids,
            stat_keys,
        } => {
            let response = service
                .get_latest_resource_metrics(&resource_ids, &stat_keys, instance)
                .await?;
            print_json(&response)
        }

        Command::Query {
            resource_ids,
            stat_keys,
            window,
            roll_up,
        } => {
            let (begin, end) = window.resolve()?;
            let query = MetricQuery {
                begin,
                end,
                roll_up_type: roll_up,
                ..MetricQuery::new(resource_ids, stat_keys)
            };
            let response = service.query_resource_metrics(&query, instance).await?;
            print_json(&response)
        }

        Command::StatKeys { resource_id } => {
            print_json(&service.get_available_metrics(&resource_id, instance).await)
        }

        Command::Search {
            name,
            adapter_kind,
            resource_kind,
        } => {
            let filter = SearchFilter {
                name: name.as_deref(),
                adapter_kind: adapter_kind.as_deref(),
                resource_kind: resource_kind.as_deref(),
            };
            print_json(&service.search_resources(filter, instance).await?)
        }

        Command::QueryResources { conditions } => {
            let conditions = conditions
                .iter()
                .map(|c| parse_condition(c))
                .collect::<Result<Vec<_>>>()?;
            print_json(&service.query_resources(conditions, instance).await?)
        }

        Command::Projects { names } => {
            let filter = KindFilter {
                name: names,
                ..Default::default()
            };
            print_json(&service.query_project_resources(filter, instance).await?)
        }

        Command::Clusters { names } => {
            let filter = KindFilter {
                name: names,
                ..Default::default()
            };
            print_json(&service.query_cluster_resources(filter, instance).await?)
        }

        Command::Find {
            name,
            resource_type,
        } => print_json(
            &service
                .find_resource_by_name(&name, instance, resource_type)
                .await,
        ),

        Command::FindByProperty { key, value } => print_json(
            &service
                .find_resource_by_property(&key, &value, instance)
                .await,
        ),

        Command::Details { resource_id } => {
            print_json(&service.get_resource_details(&resource_id, instance).await?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse a relative span such as `90s`, `30m`, `6h`, `7d` or `2w`
fn parse_relative(input: &str) -> Result<Duration> {
    let input = input.trim();
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| anyhow!("Missing unit in '{}' (use s, m, h, d or w)", input))?;
    let (amount, unit) = input.split_at(split);

    let amount: i64 = amount
        .parse()
        .with_context(|| format!("Invalid amount in '{}'", input))?;
    let unit_secs = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        "w" => 7 * 24 * 60 * 60,
        other => return Err(anyhow!("Unknown unit '{}' (use s, m, h, d or w)", other)),
    };

    let span = amount
        .checked_mul(unit_secs)
        .and_then(Duration::try_seconds)
        .ok_or_else(|| anyhow!("Window '{}' is too large", input))?;
    if span <= Duration::zero() {
        return Err(anyhow!("Window '{}' must be positive", input));
    }

    debug!("Relative window '{}' spans {}ms", input, span.num_milliseconds());
    Ok(span)
}

fn parse_condition(input: &str) -> Result<PropertyCondition> {
    let (key, value) = input
        .split_once('=')
        .ok_or_else(|| anyhow!("Condition '{}' must be key=value", input))?;
    if key.trim().is_empty() {
        return Err(anyhow!("Condition '{}' has an empty key", input));
    }
    Ok(PropertyCondition::eq(key.trim(), value.trim()))
}
