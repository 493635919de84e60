//! MindGraph CLI: inspect and maintain a mind-map graph store.
//!
//! Usage:
//!   mindgraph [--config file] [--db path] tags <uri>
//!   mindgraph subgraph <uri> [--depth n]
//!   mindgraph centers <owner|public|public-of|patterns|friends|friend> [user] [--skip n] [--limit n]
//!   mindgraph admin <refresh-references|sweep|reindex [--user u]>
//!
//! Results are printed as JSON on stdout.

use clap::{Parser, Subcommand, ValueEnum};
use mindgraph::{
    Config, GraphElement, GraphError, GraphIndexer, GraphResult, Identifier, LogFormat, MindGraph,
    Uri,
};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "mindgraph",
    version,
    about = "Mind-map knowledge graph: tags, subgraphs and centered elements"
)]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the tags of an element
    Tags {
        /// Element uri
        uri: String,
    },
    /// Extract the neighborhood of a vertex
    Subgraph {
        /// Focus vertex uri
        uri: String,
        /// Maximum hop distance; the configured default when omitted
        #[arg(long)]
        depth: Option<u32>,
    },
    /// List recently centered elements
    Centers {
        #[arg(value_enum)]
        variant: CenterVariant,
        /// User the variant applies to
        user: Option<String>,
        #[arg(long, default_value_t = 0)]
        skip: usize,
        /// Page size; the configured one when omitted
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Whole-graph maintenance
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CenterVariant {
    /// Everything a user owns
    Owner,
    /// Public elements of everyone
    Public,
    /// Public elements of one user
    PublicOf,
    /// Public patterns
    Patterns,
    /// Elements shared by a user's confirmed friends
    Friends,
    /// Elements one friend shares
    Friend,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Recount the references to every identifier
    RefreshReferences,
    /// Delete identifiers nothing is tagged with
    Sweep,
    /// Print every element as one JSON line per index call
    Reindex {
        /// Restrict to one user's elements
        #[arg(long)]
        user: Option<String>,
    },
}

/// Indexer writing one JSON line per call
struct JsonLinesIndexer<W> {
    out: Mutex<W>,
}

#[derive(Serialize)]
#[serde(tag = "index", rename_all = "camelCase")]
enum IndexLine<'a> {
    Vertex { element: &'a GraphElement },
    Relation { element: &'a GraphElement },
    Schema { element: &'a GraphElement },
    Property { element: &'a GraphElement, schema: &'a Uri },
    Meta { identifier: &'a Identifier },
}

impl<W: Write> JsonLinesIndexer<W> {
    fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    fn emit(&self, line: IndexLine<'_>) -> GraphResult<()> {
        let json = serde_json::to_string(&line).map_err(|e| GraphError::Indexing(e.to_string()))?;
        let mut out = self
            .out
            .lock()
            .map_err(|_| GraphError::Indexing("stdout lock poisoned".into()))?;
        writeln!(out, "{}", json).map_err(|e| GraphError::Indexing(e.to_string()))
    }
}

impl<W: Write> GraphIndexer for JsonLinesIndexer<W> {
    fn index_vertex(&self, vertex: &GraphElement) -> GraphResult<()> {
        self.emit(IndexLine::Vertex { element: vertex })
    }

    fn index_relation(&self, edge: &GraphElement) -> GraphResult<()> {
        self.emit(IndexLine::Relation { element: edge })
    }

    fn index_schema(&self, schema: &GraphElement) -> GraphResult<()> {
        self.emit(IndexLine::Schema { element: schema })
    }

    fn index_property(&self, property: &GraphElement, schema: &GraphElement) -> GraphResult<()> {
        self.emit(IndexLine::Property {
            element: property,
            schema: schema.uri(),
        })
    }

    fn index_meta(&self, identifier: &Identifier) -> GraphResult<()> {
        self.emit(IndexLine::Meta { identifier })
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_env("MINDGRAPH_LOG")
        .unwrap_or_else(|_| EnvFilter::new("mindgraph=info"));
    let format = match std::env::var("MINDGRAPH_LOG_FORMAT").as_deref() {
        Ok("json") => LogFormat::Json,
        Ok(_) => LogFormat::Text,
        Err(_) => format,
    };

    // Logs go to stderr so stdout stays machine-readable
    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn load_config(cli: &Cli) -> Result<Config, String> {
    let base = match &cli.config {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    };
    let mut config = base
        .and_then(|c| c.with_env_overrides(|name| std::env::var(name).ok()))
        .map_err(|e| e.to_string())?;
    if let Some(db) = &cli.db {
        config.db_path = Some(db.clone());
    }
    Ok(config)
}

fn print_json(value: &impl Serialize) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{}", json);
    Ok(())
}

fn require_user(variant: &str, user: Option<String>) -> Result<String, String> {
    user.ok_or_else(|| format!("'centers {}' needs a user", variant))
}

fn cmd_centers(
    graph: &MindGraph,
    variant: CenterVariant,
    user: Option<String>,
    skip: usize,
    limit: Option<usize>,
) -> Result<(), String> {
    let mut query = graph.centered_elements().skip(skip);
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    let page = match variant {
        CenterVariant::Owner => query.for_owner(&require_user("owner", user)?),
        CenterVariant::Public => query.all_public(),
        CenterVariant::PublicOf => query.public_of_user(&require_user("public-of", user)?),
        CenterVariant::Patterns => query.all_patterns(),
        CenterVariant::Friends => query.friends_feed(&require_user("friends", user)?),
        CenterVariant::Friend => query.for_a_friend(&require_user("friend", user)?),
    }
    .map_err(|e| e.to_string())?;
    print_json(&page)
}

fn cmd_admin(graph: &MindGraph, action: AdminAction) -> Result<(), String> {
    let admin = graph.admin();
    match action {
        AdminAction::RefreshReferences => {
            let corrected = admin
                .refresh_number_of_references_to_all_identifiers()
                .map_err(|e| e.to_string())?;
            print_json(&serde_json::json!({ "corrected": corrected }))
        }
        AdminAction::Sweep => {
            let removed = admin
                .remove_metas_having_zero_references()
                .map_err(|e| e.to_string())?;
            print_json(&serde_json::json!({ "removed": removed }))
        }
        AdminAction::Reindex { user } => {
            let indexer = JsonLinesIndexer::new(std::io::stdout());
            let report = match user {
                Some(user) => admin.reindex_all_for_user(&user, &indexer),
                None => admin.reindex_all(&indexer),
            }
            .map_err(|e| e.to_string())?;
            tracing::info!(?report, "reindex finished");
            Ok(())
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config = load_config(&cli)?;
    init_tracing(config.log_format);

    let graph =
        MindGraph::open(config).map_err(|e| format!("Failed to open database: {}", e))?;

    match cli.command {
        Commands::Tags { uri } => {
            let tags = graph
                .identification()
                .get_tags(&Uri::from(uri))
                .map_err(|e| e.to_string())?;
            print_json(&tags)
        }
        Commands::Subgraph { uri, depth } => {
            let depth = depth.unwrap_or(graph.config().default_depth);
            let subgraph = graph
                .extractor()
                .extract(&Uri::from(uri), depth)
                .map_err(|e| e.to_string())?;
            print_json(&subgraph)
        }
        Commands::Centers {
            variant,
            user,
            skip,
            limit,
        } => cmd_centers(&graph, variant, user, skip, limit),
        Commands::Admin { action } => cmd_admin(&graph, action),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
