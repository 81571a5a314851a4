use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use oneview_index::config::{base_url, Config, PASSWORD_ENV};
use oneview_index::oneview::http::DEFAULT_API_VERSION;
use oneview_index::resource::{
    AggregatedQuery, IndexResources, IndexResourcesQuery, QueryValue, ResourceClient,
    DEFAULT_CHILD_LIMIT, INDEX_RESOURCES_URI,
};
use oneview_index::{format_api_error, Credentials, OneViewClient};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Search and inspect OneView index resources
#[derive(Parser, Debug)]
#[command(name = "ovindex", version, about, long_about = None)]
struct Args {
    /// Appliance host name or address (overrides ONEVIEW_HOST and the config file)
    #[arg(long)]
    host: Option<String>,

    /// Login user name
    #[arg(short, long)]
    user: Option<String>,

    /// Login password
    #[arg(short, long, env = PASSWORD_ENV, hide_env_values = true)]
    password: Option<String>,

    /// Login domain
    #[arg(long)]
    domain: Option<String>,

    /// X-API-Version to send (queried from the appliance when omitted)
    #[arg(long)]
    api_version: Option<u32>,

    /// Skip TLS certificate verification
    #[arg(long)]
    insecure: bool,

    /// Persist the resolved connection settings to the config file
    #[arg(long)]
    save: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    output: OutputFormat,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List index resources
    List(ListArgs),
    /// Get index resources by URI suffix, e.g. `/<resource-id>`
    Get {
        #[arg(required = true)]
        uris: Vec<String>,
    },
    /// Get an aggregated view of index resources
    Aggregated(AggregatedArgs),
}

#[derive(ClapArgs, Debug)]
struct ListArgs {
    #[arg(long)]
    category: Vec<String>,
    #[arg(long)]
    fields: Vec<String>,
    #[arg(long)]
    filter: Vec<String>,
    #[arg(long)]
    query: Vec<String>,
    #[arg(long)]
    reference_uri: Vec<String>,
    #[arg(long)]
    sort: Vec<String>,
    #[arg(long)]
    user_query: Vec<String>,
    #[arg(long)]
    view: Vec<String>,
    #[arg(long, default_value_t = 0)]
    padding: i64,
    #[arg(long, default_value_t = 0)]
    start: i64,
    /// Maximum number of items; -1 fetches everything
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    count: i64,
}

impl ListArgs {
    fn into_query(self) -> IndexResourcesQuery {
        IndexResourcesQuery {
            category: QueryValue::from_repeated(self.category),
            fields: QueryValue::from_repeated(self.fields),
            filter: QueryValue::from_repeated(self.filter),
            padding: self.padding,
            query: QueryValue::from_repeated(self.query),
            reference_uri: QueryValue::from_repeated(self.reference_uri),
            sort: QueryValue::from_repeated(self.sort),
            user_query: QueryValue::from_repeated(self.user_query),
            view: QueryValue::from_repeated(self.view),
            start: self.start,
            count: self.count,
        }
    }
}

#[derive(ClapArgs, Debug)]
struct AggregatedArgs {
    #[arg(long, required = true)]
    attribute: Vec<String>,
    #[arg(long)]
    category: String,
    #[arg(long, default_value_t = DEFAULT_CHILD_LIMIT)]
    child_limit: i64,
    #[arg(long)]
    filter: Vec<String>,
    #[arg(long)]
    query: Vec<String>,
    #[arg(long)]
    user_query: Vec<String>,
}

impl AggregatedArgs {
    fn into_query(self) -> Result<AggregatedQuery> {
        let attribute = QueryValue::from_repeated(self.attribute)
            .context("At least one --attribute is required")?;

        let mut query = AggregatedQuery::new(attribute, self.category);
        query.child_limit = self.child_limit;
        query.filter = QueryValue::from_repeated(self.filter);
        query.query = QueryValue::from_repeated(self.query);
        query.user_query = QueryValue::from_repeated(self.user_query);
        Ok(query)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Failed to open log file {:?}: {}", log_path, e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("ovindex started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("ovindex").join("ovindex.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".ovindex").join("ovindex.log");
    }
    PathBuf::from("ovindex.log")
}

fn render(value: &Value, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value).context("Failed to render JSON"),
        OutputFormat::Yaml => serde_yaml::to_string(value).context("Failed to render YAML"),
    }
}

/// Merge CLI flags over the stored configuration
fn resolve_config(args: &Args) -> Config {
    let stored = Config::load();
    Config {
        host: args.host.clone().or_else(|| stored.effective_host()),
        username: Some(args.user.clone().unwrap_or_else(|| stored.effective_username())),
        auth_login_domain: args.domain.clone().or(stored.auth_login_domain),
        api_version: args.api_version.or(stored.api_version),
        insecure: args.insecure || stored.insecure,
    }
}

async fn connect(config: &Config, password: &str) -> Result<OneViewClient> {
    let host = config
        .host
        .as_deref()
        .context("No appliance configured. Use --host or set ONEVIEW_HOST")?;
    let username = config.username.as_deref().unwrap_or("administrator");

    let credentials = Credentials::new(username, password).with_domain(config.auth_login_domain.as_deref());

    let mut client = OneViewClient::new(
        &base_url(host),
        credentials,
        config.api_version.unwrap_or(DEFAULT_API_VERSION),
        config.insecure,
    )?;

    if config.api_version.is_none() {
        if let Err(e) = client.negotiate_api_version().await {
            tracing::warn!("Failed to read appliance API version, using {}: {}", DEFAULT_API_VERSION, e);
        }
    }

    Ok(client)
}

/// A fully parsed request, built before any connection is made
enum Request {
    List(IndexResourcesQuery),
    Get(Vec<String>),
    Aggregated(AggregatedQuery),
}

impl TryFrom<Command> for Request {
    type Error = anyhow::Error;

    fn try_from(command: Command) -> Result<Self> {
        Ok(match command {
            Command::List(list) => Request::List(list.into_query()),
            Command::Get { uris } => Request::Get(uris),
            Command::Aggregated(aggregated) => Request::Aggregated(aggregated.into_query()?),
        })
    }
}

async fn execute(index: &IndexResources<ResourceClient>, request: &Request) -> Result<Value> {
    match request {
        Request::List(query) => index.get_all(query).await.map(Value::Array),
        Request::Get(uris) => {
            let fetches = uris.iter().map(|uri| index.get(uri));
            let mut items = futures::future::try_join_all(fetches).await?;
            if items.len() == 1 {
                Ok(items.remove(0))
            } else {
                Ok(Value::Array(items))
            }
        },
        Request::Aggregated(query) => index.get_aggregated(query).await,
    }
}

async fn run(args: Args) -> Result<()> {
    let config = resolve_config(&args);

    if args.save {
        config.save().context("Failed to save configuration")?;
    }

    let password = args
        .password
        .clone()
        .with_context(|| format!("No password given. Use --password or set {}", PASSWORD_ENV))?;

    let request = Request::try_from(args.command)?;

    let client = connect(&config, &password).await?;
    tracing::info!(
        "Using appliance: {} (API version {})",
        client.http.url(""),
        client.http.api_version()
    );

    let index = IndexResources::new(ResourceClient::new(client.clone(), INDEX_RESOURCES_URI));
    let result = execute(&index, &request).await;

    if let Err(e) = client.logout().await {
        tracing::warn!("Failed to log out: {}", e);
    }

    println!("{}", render(&result?, args.output)?);
    Ok(())
}

/// Report the outcome and flush the log file before the process exits
fn finish(result: Result<()>, log_guard: Option<WorkerGuard>) -> ExitCode {
    let code = match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("ovindex failed: {:?}", err);
            eprintln!("Error: {}", format_api_error(&err));
            ExitCode::FAILURE
        },
    };

    drop(log_guard);
    code
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let log_guard = setup_logging(args.log_level);

    let result = run(args).await;
    finish(result, log_guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_args_repeat_into_many() {
        let args = Args::parse_from([
            "ovindex", "--host", "ov", "list", "--category", "server-hardware", "--fields", "name",
            "--fields", "status", "--count", "-1",
        ]);

        let Command::List(list) = args.command else {
            panic!("expected list command");
        };
        let query = list.into_query();

        assert_eq!(query.category, Some(QueryValue::from("server-hardware")));
        assert_eq!(query.fields, Some(QueryValue::from(vec!["name", "status"])));
        assert_eq!(query.filter, None);
        assert_eq!(query.count, -1);
    }

    #[test]
    fn test_aggregated_args_defaults() {
        let args = Args::parse_from([
            "ovindex", "aggregated", "--attribute", "power", "--category", "server",
        ]);

        let Command::Aggregated(aggregated) = args.command else {
            panic!("expected aggregated command");
        };
        let query = aggregated.into_query().unwrap();

        assert_eq!(query.child_limit, DEFAULT_CHILD_LIMIT);
        assert_eq!(
            query.to_uri(),
            "/rest/index/resources/aggregated?attribute=power&category=server&childLimit=6"
        );
    }

    #[test]
    fn test_render_yaml() {
        let value = serde_json::json!({"name": "enclosure-1"});
        let yaml = render(&value, OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("name: enclosure-1"));
    }

    #[tokio::test]
    async fn test_bad_request_fails_before_connecting() {
        let args = Args {
            host: Some("http://127.0.0.1:9".to_string()),
            user: None,
            password: Some("secret".to_string()),
            domain: None,
            api_version: Some(800),
            insecure: false,
            save: false,
            output: OutputFormat::Json,
            log_level: LogLevel::Off,
            command: Command::Aggregated(AggregatedArgs {
                attribute: Vec::new(),
                category: "server".to_string(),
                child_limit: DEFAULT_CHILD_LIMIT,
                filter: Vec::new(),
                query: Vec::new(),
                user_query: Vec::new(),
            }),
        };

        let err = run(args).await.unwrap_err();
        assert_eq!(err.to_string(), "At least one --attribute is required");
    }

    #[derive(Clone, Default)]
    struct SharedSink(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_finish_flushes_log_before_exit() {
        use std::io::Write;

        let sink = SharedSink::default();
        let (mut writer, guard) = tracing_appender::non_blocking(sink.clone());
        writer.write_all(b"ovindex failed\n").unwrap();

        let code = finish(Err(anyhow::anyhow!("boom")), Some(guard));

        assert_eq!(format!("{:?}", code), format!("{:?}", ExitCode::FAILURE));
        assert_eq!(sink.0.lock().unwrap().as_slice(), b"ovindex failed\n");
    }

    #[test]
    fn test_finish_success() {
        let code = finish(Ok(()), None);
        assert_eq!(format!("{:?}", code), format!("{:?}", ExitCode::SUCCESS));
    }
}
