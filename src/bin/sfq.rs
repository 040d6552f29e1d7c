//! `sfq`: query a Salesforce org from the command line.
//!
//! ```sh
//! sfq login
//! sfq query "Case.Priority = 'High'" --select Subject,Status --limit 20
//! sfq count "IsClosed = FALSE" --from Case
//! sfq get Case 1234 -f Subject -f Status
//! ```
//!
//! `query` prints one JSON object per line; `get` prints `Field: value`
//! lines.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{ArgAction, Parser, Subcommand};
use sftools::auth::{
    Credentials, DeviceFlowAuth, ErrorKind as AuthErrorKind, FileProfileStore, OAuthConfig,
    ProfileStore, SfConfig, DEFAULT_APPROVAL_TIMEOUT, PRODUCTION_PROFILE,
};
use sftools::query::{Session, Sf, SfOptions, Soql};
use tracing::debug;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "sfq", version)]
#[command(about = "Query Salesforce objects", long_about = None)]
struct Cli {
    /// Connection profile to use.
    #[arg(short, long, global = true, default_value = PRODUCTION_PROFILE, env = "SF_PROFILE")]
    profile: String,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Select all fields (FIELDS(ALL)) unless fields are given.
    #[arg(long, global = true)]
    preload_fields: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Authorize this tool with the device flow and save the tokens.
    Login,
    /// Refresh the saved access token.
    Refresh,
    /// Print every record matching a filter, one JSON object per line.
    Query {
        /// WHERE expression; without --from it must start with `Object.Field`.
        filter: String,
        /// Fields to select (repeat or comma-separate).
        #[arg(short, long, value_delimiter = ',')]
        select: Vec<String>,
        /// Object to query.
        #[arg(long)]
        from: Option<String>,
        /// Maximum number of records.
        #[arg(short, long, default_value_t = 0)]
        limit: u32,
        /// Ordering (repeat or comma-separate).
        #[arg(long, value_delimiter = ',')]
        order_by: Vec<String>,
    },
    /// Print the number of records matching a filter.
    Count {
        filter: String,
        #[arg(long)]
        from: Option<String>,
    },
    /// Show fields of one object, looked up by Id or a type-specific key
    /// (case number for Case, alias for User).
    Get {
        /// Object type, for example `Case`.
        sftype: String,
        key: String,
        /// Field to display (repeatable, default all fields).
        #[arg(short, long = "field")]
        fields: Vec<String>,
        /// Print field names (default if more than one field).
        #[arg(long, action = ArgAction::SetTrue, conflicts_with = "no_label")]
        label: bool,
        /// Do not print field names (default if only one field).
        #[arg(long, action = ArgAction::SetTrue)]
        no_label: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "sftools=debug,sfq=debug,warn" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .init();
}

async fn run(cli: Cli) -> CliResult<()> {
    let store = FileProfileStore::new()?;
    let config = SfConfig::load(&store, &cli.profile)?;
    debug!(profile = %cli.profile, config = ?config, "Loaded profile");

    let sf = match cli.command {
        Command::Login => return login(&store, &cli.profile, &config).await,
        _ => {
            let session = Session::from_config(&config)?
                .with_store(Arc::new(store), cli.profile.clone());
            Sf::new(
                session,
                SfOptions::default().with_preload_fields(cli.preload_fields),
            )
        }
    };

    match cli.command {
        Command::Login => {}
        Command::Refresh => {
            sf.refresh().await?;
            eprintln!("Access token refreshed");
        }
        Command::Query {
            filter,
            select,
            from,
            limit,
            order_by,
        } => {
            let mut soql = build_soql(&sf, &filter, from.as_deref())?.with_limit(limit);
            if !select.is_empty() {
                soql.add_select(select);
                soql.set_preload_fields(Some(false));
            }
            if !order_by.is_empty() {
                soql.set_order_by(order_by);
            }
            for record in sf.query(&soql).await? {
                println!("{}", serde_json::to_string(&record)?);
            }
        }
        Command::Count { filter, from } => {
            let soql = build_soql(&sf, &filter, from.as_deref())?;
            println!("{}", sf.query_count(&soql).await?);
        }
        Command::Get {
            sftype,
            key,
            fields,
            label,
            no_label,
        } => {
            let object = sf
                .resolve_type(&sftype)
                .await?
                .get(&key)
                .await?
                .ok_or_else(|| format!("No {sftype} found for '{key}'"))?;
            let label = match (label, no_label) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            for line in object.dump_fields(fields.as_slice(), label).await? {
                println!("{line}");
            }
        }
    }
    Ok(())
}

/// The query for `filter`, from `from` if given, otherwise inferred from
/// the filter's leading `Object.Field`.
fn build_soql(sf: &Sf, filter: &str, from: Option<&str>) -> CliResult<Soql> {
    let soql = match from {
        Some(from) => Soql::new()
            .with_from(from)?
            .with_filter(filter)
            .with_preload_fields(sf.preload_fields()),
        None => sf.soql(filter)?,
    };
    Ok(soql)
}

async fn login(store: &FileProfileStore, profile: &str, config: &SfConfig) -> CliResult<()> {
    let auth = DeviceFlowAuth::new(OAuthConfig::new(config.client_id()?), config.instance_url()?)?;
    let verification = auth.request_verification().await?;

    eprintln!("Open this URL to authorize sfq:");
    eprintln!("  {}", verification.verification_url()?);
    eprintln!("User code: {}", verification.user_code);

    let token = auth
        .wait_for_approval(&verification, DEFAULT_APPROVAL_TIMEOUT)
        .await?
        .ok_or("Timed out waiting for authorization")?;

    let creds = token.to_credentials(&config.instance_url()?, config.api_version());
    let mut file = store.load(profile)?.unwrap_or_default();
    file.access_token = Some(creds.access_token().to_string());
    if let Some(refresh_token) = creds.refresh_token() {
        file.refresh_token = Some(refresh_token.to_string());
    }

    match store.save(profile, &file) {
        Ok(()) => {
            eprintln!("Saved tokens to profile '{profile}'");
            Ok(())
        }
        Err(err) => match err.kind {
            AuthErrorKind::ReadOnly(content) => {
                eprintln!("Profile '{profile}' is read-only; update it with:");
                println!("{content}");
                Ok(())
            }
            _ => Err(err.into()),
        },
    }
}
