//! skosrec CLI: query a SKOS vocabulary through the reconciliation protocol.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use serde_json::json;

use skos_reconcile::config::ServiceConfig;
use skos_reconcile::dispatch::{Dispatcher, RequestParams, Scope};
use skos_reconcile::vocab::{VocabularyClient, VocabularySource};

#[derive(Parser)]
#[command(
    name = "skosrec",
    version,
    about = "Reconciliation protocol client for SKOS vocabularies"
)]
struct Cli {
    /// Path to a TOML service config.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Vocabulary API base URL (overrides config and environment).
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Vocabulary id.
    #[arg(long, global = true, default_value = "yso")]
    vocab: String,

    /// Language code (defaults to the configured default language).
    #[arg(long, global = true)]
    lang: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the service metadata document for the vocabulary.
    Metadata,

    /// Reconcile one query text to candidate concepts.
    Search {
        text: String,

        /// Restrict candidates to this type (URI or `skos:` name).
        #[arg(long = "type")]
        type_filter: Option<String>,

        /// Maximum number of candidates.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Autocomplete entity names.
    Suggest {
        prefix: String,

        /// Offset into the result list.
        #[arg(long, default_value = "0")]
        cursor: usize,
    },

    /// Extend entities with SKOS properties.
    Extend {
        /// Entity URIs (comma-separated).
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<String>,

        /// Property ids (comma-separated), e.g. "uri,narrower,altLabel".
        #[arg(long, value_delimiter = ',', required = true)]
        properties: Vec<String>,

        /// Maximum values per property and entity.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List the properties available for extension.
    Properties {
        #[arg(long = "type")]
        type_id: Option<String>,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// Preview one concept.
    Preview {
        uri: String,

        /// Print the HTML fragment instead of JSON.
        #[arg(long)]
        html: bool,
    },

    /// Preferred label of one concept.
    Label { uri: String },

    /// Direct broader concepts.
    Broader { uri: String },

    /// Direct narrower concepts.
    Narrower { uri: String },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
    Ok(())
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = ServiceConfig::resolve(cli.config.as_deref(), cli.api_url.as_deref())?;
    let lang = cli.lang.unwrap_or_else(|| config.default_language.clone());
    let service_url = config
        .public_url
        .clone()
        .unwrap_or_else(|| format!("http://{}:{}", config.bind, config.port));
    let client = VocabularyClient::new(&config)?;
    let dispatcher = Dispatcher::new(config, client);

    let scope = Scope {
        vocid: &cli.vocab,
        lang: &lang,
        service_url: &service_url,
    };

    match cli.command {
        Commands::Metadata => print_json(&dispatcher.metadata(&scope)?)?,

        Commands::Search {
            text,
            type_filter,
            limit,
        } => {
            let queries = json!({ "q0": { "query": text, "type": type_filter, "limit": limit } });
            let params = RequestParams::new().with("queries", &queries.to_string());
            print_json(&dispatcher.reconcile(&scope, &params)?)?;
        }

        Commands::Suggest { prefix, cursor } => {
            let params = RequestParams::new()
                .with("prefix", &prefix)
                .with("cursor", &cursor.to_string());
            print_json(&dispatcher.suggest(&scope, &params)?)?;
        }

        Commands::Extend {
            ids,
            properties,
            limit,
        } => {
            let properties: Vec<_> = properties
                .iter()
                .map(|id| match limit {
                    Some(limit) => json!({ "id": id, "settings": { "limit": limit } }),
                    None => json!({ "id": id }),
                })
                .collect();
            let extend = json!({ "ids": ids, "properties": properties });
            let params = RequestParams::new().with("extend", &extend.to_string());
            print_json(&dispatcher.reconcile(&scope, &params)?)?;
        }

        Commands::Properties { type_id, limit } => {
            let mut params = RequestParams::new();
            if let Some(type_id) = &type_id {
                params = params.with("type", type_id);
            }
            if let Some(limit) = limit {
                params = params.with("limit", &limit.to_string());
            }
            print_json(&dispatcher.propose_properties(&params)?)?;
        }

        Commands::Preview { uri, html } => {
            let preview = dispatcher.preview(&scope, &RequestParams::new().with("id", &uri))?;
            if html {
                print!("{}", preview.to_html());
            } else {
                print_json(&preview)?;
            }
        }

        Commands::Label { uri } => match dispatcher.source().label(&cli.vocab, &uri, &lang)? {
            Some(label) => println!("{label}"),
            None => miette::bail!("<{uri}> has no preferred label in \"{lang}\""),
        },

        Commands::Broader { uri } => {
            let related = dispatcher.source().broader(&cli.vocab, &uri, &lang)?;
            print_json(&related)?;
        }

        Commands::Narrower { uri } => {
            let related = dispatcher.source().narrower(&cli.vocab, &uri, &lang)?;
            print_json(&related)?;
        }
    }

    Ok(())
}
