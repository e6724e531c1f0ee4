//! gcontacts CLI
//!
//! Command-line interface for the Google Contacts feed API.
//!
//! # Usage
//!
//! ```bash
//! # List the first page of contacts
//! gcontacts --client-id ID --client-secret SECRET -A auth.json fetch_feed
//!
//! # Show a single contact as raw XML
//! CLIENT_ID=ID CLIENT_SECRET=SECRET gcontacts -A auth.json --raw fetch abc123
//!
//! # Change a contact's nickname
//! gcontacts -A auth.json update_nickname abc123 "Al"
//! ```
//!
//! The auth file is JSON with at least a refresh token, e.g.
//! `{"refresh_token": "XYZ"}`. The access token is cached back into it.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gcontacts_core::{
    ContactQuery, ContactsClient, CredentialStore, DefaultAuthManager, Entry, Feed,
    FileCredentialStore, GroupQuery, KeyringCredentialStore, OAuthClientConfig,
    RefreshTokenExchanger, ReqwestTransport,
};
use std::io::Write;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

mod config;

use config::CliConfig;

/// Keyring service name credentials are filed under.
const KEYRING_SERVICE: &str = "gcontacts";

type Client = ContactsClient<
    DefaultAuthManager<Box<dyn CredentialStore>, RefreshTokenExchanger>,
    ReqwestTransport,
>;

#[derive(Parser)]
#[command(name = "gcontacts")]
#[command(about = "Command-line client for the Google Contacts feed API")]
#[command(version)]
struct Cli {
    /// Client ID from the Google Developer Console
    #[arg(long, env = "CLIENT_ID", global = true, hide_env_values = true)]
    client_id: Option<String>,

    /// Client secret from the Google Developer Console
    #[arg(long, env = "CLIENT_SECRET", global = true, hide_env_values = true)]
    client_secret: Option<String>,

    /// Path to JSON file with refresh_token, e.g. {"refresh_token": "XYZ"}
    #[arg(short = 'A', long, global = true)]
    auth_file: Option<PathBuf>,

    /// Read credentials from the OS keyring entry for this user instead of a file
    #[arg(long, global = true, conflicts_with = "auth_file")]
    keyring_user: Option<String>,

    /// Display the raw XML response
    #[arg(long, global = true)]
    raw: bool,

    /// Path to a config file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a page of the contacts feed
    #[command(name = "fetch_feed")]
    FetchFeed {
        /// Free-text search
        #[arg(short, long)]
        query: Option<String>,

        /// Page size
        #[arg(long)]
        max_results: Option<u32>,

        /// 1-based index of the first entry
        #[arg(long)]
        start_index: Option<u32>,

        /// Only contacts in this group (group URI)
        #[arg(long)]
        group: Option<String>,

        /// Fetch every contact in one page
        #[arg(long, conflicts_with = "max_results")]
        all: bool,
    },

    /// Fetch a single contact
    #[command(name = "fetch")]
    Fetch {
        /// Contact URI or local ID
        id: String,
    },

    /// Change a contact's nickname
    #[command(name = "update_nickname")]
    UpdateNickname {
        /// Contact URI or local ID
        id: String,

        /// New nickname
        value: String,
    },

    /// Fetch a page of the contact groups feed
    #[command(name = "fetch_groups")]
    FetchGroups {
        /// Free-text search
        #[arg(short, long)]
        query: Option<String>,

        /// Page size
        #[arg(long)]
        max_results: Option<u32>,

        /// 1-based index of the first entry
        #[arg(long)]
        start_index: Option<u32>,
    },

    /// Download a contact photo
    #[command(name = "fetch_image")]
    FetchImage {
        /// Photo link href
        href: String,

        /// Write the image here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::load_config(cli.config.as_deref())?;
    init_logging(cli.verbose, &config.log_level);

    if let Some(path) = &config.config_path {
        debug!("Loaded configuration from {:?}", path);
    }

    let client = build_client(&cli, &config)?;

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, cancelling request...");
                cancel.cancel();
            }
        })
    };

    let result = run(&cli, &client, &cancel).await;
    ctrl_c.abort();
    result
}

fn init_logging(verbose: bool, level: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn build_client(cli: &Cli, config: &CliConfig) -> Result<Client> {
    let client_id = cli
        .client_id
        .clone()
        .or_else(|| config.client_id.clone())
        .context("client ID is required (--client-id, CLIENT_ID or config file)")?;
    let client_secret = cli
        .client_secret
        .clone()
        .or_else(|| config.client_secret.clone())
        .context("client secret is required (--client-secret, CLIENT_SECRET or config file)")?;

    let mut oauth = OAuthClientConfig::new(client_id, client_secret);
    if let Some(token_url) = &config.token_url {
        oauth = oauth.with_token_url(token_url.clone());
    }

    let store: Box<dyn CredentialStore> = match &cli.keyring_user {
        Some(user) => {
            debug!("Using keyring credentials for {}", user);
            Box::new(KeyringCredentialStore::try_new(KEYRING_SERVICE, user)?)
        }
        None => {
            let path = cli
                .auth_file
                .clone()
                .or_else(|| config.auth_file.clone())
                .or_else(FileCredentialStore::default_path)
                .context("auth file is required (-A or config file)")?;
            debug!("Using credential file {:?}", path);
            Box::new(FileCredentialStore::new(path))
        }
    };

    let auth = DefaultAuthManager::new(store, RefreshTokenExchanger::new(oauth));
    Ok(ContactsClient::with_reqwest(auth, config.client.clone())?)
}

async fn run(cli: &Cli, client: &Client, cancel: &CancellationToken) -> Result<()> {
    match &cli.command {
        Commands::FetchFeed {
            query,
            max_results,
            start_index,
            group,
            all,
        } => {
            let mut request = if *all {
                ContactQuery::everything()
            } else {
                ContactQuery::new()
            };
            if let Some(query) = query {
                request = request.with_query(query.clone());
            }
            if let Some(max_results) = max_results {
                request = request.with_max_results(*max_results);
            }
            if let Some(start_index) = start_index {
                request = request.with_start_index(*start_index);
            }
            if let Some(group) = group {
                request = request.with_group(group.clone());
            }

            if cli.raw {
                let body = client
                    .fetch_feed_raw(&request, cancel)
                    .await
                    .context("failed to fetch contacts feed")?;
                print_raw(&body);
            } else {
                let feed = client
                    .fetch_feed(&request, cancel)
                    .await
                    .context("failed to fetch contacts feed")?;
                print_feed(&feed);
            }
        }

        Commands::Fetch { id } => {
            if cli.raw {
                let body = client
                    .fetch_contact_raw(id, cancel)
                    .await
                    .with_context(|| format!("failed to fetch contact {}", id))?;
                print_raw(&body);
            } else {
                let entry = client
                    .fetch_contact(id, cancel)
                    .await
                    .with_context(|| format!("failed to fetch contact {}", id))?;
                print_entry("ENTRY", &entry);
            }
        }

        Commands::UpdateNickname { id, value } => {
            if cli.raw {
                bail!("update_nickname doesn't support --raw");
            }

            let mut entry = client
                .fetch_contact(id, cancel)
                .await
                .with_context(|| format!("failed to fetch contact {}", id))?;
            print_entry("ORIGINAL ENTRY", &entry);

            entry.nickname = value.clone();
            let updated = client
                .save(&entry, cancel)
                .await
                .with_context(|| format!("failed to save contact {}", id))?;
            print_entry("UPDATED ENTRY", &updated);
        }

        Commands::FetchGroups {
            query,
            max_results,
            start_index,
        } => {
            let mut request = GroupQuery::default();
            request.query = query.clone();
            if let Some(max_results) = max_results {
                request.max_results = *max_results;
            }
            if let Some(start_index) = start_index {
                request.start_index = *start_index;
            }

            if cli.raw {
                let body = client
                    .fetch_groups_raw(&request, cancel)
                    .await
                    .context("failed to fetch groups feed")?;
                print_raw(&body);
            } else {
                let feed = client
                    .fetch_groups(&request, cancel)
                    .await
                    .context("failed to fetch groups feed")?;
                print_feed(&feed);
            }
        }

        Commands::FetchImage { href, output } => {
            let image = client
                .fetch_contact_image(href, cancel)
                .await
                .with_context(|| format!("failed to fetch image {}", href))?;
            info!(
                "Fetched {} bytes ({})",
                image.data.len(),
                image.content_type.as_deref().unwrap_or("unknown type")
            );

            match output {
                Some(path) => std::fs::write(path, &image.data)
                    .with_context(|| format!("failed to write image to {:?}", path))?,
                None => {
                    let mut stdout = std::io::stdout().lock();
                    stdout.write_all(&image.data)?;
                    stdout.flush()?;
                }
            }
        }
    }

    Ok(())
}

fn print_raw(body: &[u8]) {
    println!("{}", String::from_utf8_lossy(body));
}

fn print_feed(feed: &Feed) {
    println!(
        "{} entries (total {}, start index {})",
        feed.entries.len(),
        feed.total_results,
        feed.start_index
    );
    for (i, entry) in feed.entries.iter().enumerate() {
        print_entry(&format!("ENTRY {}", i), entry);
    }
}

fn print_entry(heading: &str, entry: &Entry) {
    println!("{}:", heading);
    println!("{:#?}\n", entry);
}
