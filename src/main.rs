// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use pubmed_rag::utils::logging::{format_error, format_info, format_success, format_warning};
use pubmed_rag::{
    Config, CsvReportWriter, GeminiClient, IngestionPipeline, LanceDbClient, PubMedClient,
    QueryPipeline, RetryPolicy, Validator,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "pubmed_rag")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "Question answering over PubMed abstracts with LanceDB and Gemini", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch abstracts for topics from PubMed and store their embeddings
    Ingest {
        /// Topic to ingest; repeat for several. Defaults to the configured topics
        #[arg(short, long = "topic", value_name = "TOPIC")]
        topics: Vec<String>,

        #[arg(long, value_name = "NUM")]
        max_results: Option<usize>,
    },

    /// Answer questions from the stored abstracts and write a CSV report
    Query {
        /// Question to answer; repeat for several. Defaults to the configured questions
        #[arg(short, long = "question", value_name = "QUESTION")]
        questions: Vec<String>,

        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[arg(long, value_name = "K")]
        top_k: Option<usize>,

        /// Skip the pause between questions
        #[arg(long)]
        no_delay: bool,
    },

    /// Show the abstracts nearest to a piece of text
    Search {
        /// Search query text
        query: String,

        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },

    Stats,

    Reset {
        #[arg(long)]
        confirm: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    pubmed_rag::utils::logging::init_logger(cli.color, cli.verbose);
    colored::control::set_override(cli.color);

    info!("PubMed RAG Pipeline");
    info!("Loading configuration from: {}", cli.config.display());

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        Config::load(None).context("Failed to load configuration")?
    };

    match cli.command {
        Commands::Ingest {
            topics,
            max_results,
        } => {
            cmd_ingest(&config, topics, max_results).await?;
        }
        Commands::Query {
            questions,
            output,
            top_k,
            no_delay,
        } => {
            cmd_query(&config, questions, output, top_k, no_delay).await?;
        }
        Commands::Search { query, limit } => {
            cmd_search(&config, &query, limit).await?;
        }
        Commands::Stats => {
            cmd_stats(&config).await?;
        }
        Commands::Reset { confirm } => {
            cmd_reset(&config, confirm).await?;
        }
    }

    Ok(())
}

async fn connect_store(config: &Config) -> Result<LanceDbClient> {
    let client = LanceDbClient::new(config.store.clone())
        .await
        .context("Failed to create LanceDB client")?;

    if !client.ping().await? {
        error!("Cannot connect to LanceDB");
        return Err(anyhow::anyhow!("Database connection failed"));
    }

    Ok(client)
}

fn gemini_client(config: &Config) -> Result<Arc<GeminiClient>> {
    let client = GeminiClient::new(&config.gemini).context("Failed to create Gemini client")?;
    Ok(Arc::new(client))
}

async fn cmd_ingest(config: &Config, topics: Vec<String>, max_results: Option<usize>) -> Result<()> {
    info!("Starting ingestion pipeline");
    let start_time = Instant::now();

    let gemini = gemini_client(config)?;

    let topics = if topics.is_empty() {
        config.pipeline.topics.clone()
    } else {
        topics
    };
    Validator::validate_all_not_empty("topic", &topics)?;

    let max_results = max_results.unwrap_or(config.pubmed.max_results);
    Validator::validate_positive("max_results", max_results)?;
    let source = PubMedClient::new(config.pubmed.clone()).context("Failed to create PubMed client")?;
    let store = connect_store(config).await?;

    let pipeline = IngestionPipeline::new(
        store.clone(),
        Arc::new(source),
        gemini,
        RetryPolicy::from_config(&config.retry),
        max_results,
    );

    let stats = pipeline.run(&topics).await.context("Ingestion failed")?;

    let elapsed = start_time.elapsed();
    info!("Ingestion complete in {:.2}s", elapsed.as_secs_f64());

    let total = store.document_count().await?;
    let summary = format!(
        "{} documents upserted from {} topics ({} stored in total)",
        stats.documents_upserted,
        stats.items_processed,
        total
    );
    if stats.items_failed > 0 {
        println!(
            "{}",
            format_warning(&format!("{}; {} topics failed", summary, stats.items_failed))
        );
    } else {
        println!("{}", format_success(&summary));
    }

    Ok(())
}

async fn cmd_query(
    config: &Config,
    questions: Vec<String>,
    output: Option<PathBuf>,
    top_k: Option<usize>,
    no_delay: bool,
) -> Result<()> {
    info!("Starting query pipeline");
    let start_time = Instant::now();

    let gemini = gemini_client(config)?;

    let questions = if questions.is_empty() {
        config.pipeline.questions.clone()
    } else {
        questions
    };
    Validator::validate_all_not_empty("question", &questions)?;

    let top_k = top_k.unwrap_or(config.pipeline.top_k);
    Validator::validate_positive("top_k", top_k)?;

    let delay = if no_delay {
        Duration::ZERO
    } else {
        Duration::from_secs(config.pipeline.question_delay_secs)
    };

    let store = connect_store(config).await?;
    let pipeline = QueryPipeline::new(
        store,
        gemini.clone(),
        gemini,
        RetryPolicy::from_config(&config.retry),
        top_k,
    )
    .with_question_delay(delay);

    let run = pipeline.run(&questions).await.context("Query failed")?;

    let report_path = output.unwrap_or_else(|| config.pipeline.report_path.clone());
    let writer = CsvReportWriter::new(report_path);
    let written = writer.write(&run.records).context("Failed to write report")?;

    let elapsed = start_time.elapsed();
    info!("Query complete in {:.2}s", elapsed.as_secs_f64());

    println!(
        "{}",
        format_success(&format!(
            "{} of {} questions answered, report written to {}",
            written,
            questions.len(),
            writer.path().display()
        ))
    );
    if run.stats.items_skipped > 0 {
        println!(
            "{}",
            format_warning(&format!(
                "{} questions skipped (no query embedding)",
                run.stats.items_skipped
            ))
        );
    }
    if run.stats.answers_unavailable > 0 {
        println!(
            "{}",
            format_warning(&format!(
                "{} answers recorded as Error",
                run.stats.answers_unavailable
            ))
        );
    }

    Ok(())
}

async fn cmd_search(config: &Config, query: &str, limit: usize) -> Result<()> {
    Validator::validate_not_empty("query", query)?;
    Validator::validate_positive("limit", limit)?;
    info!("Searching for: {}", query);

    let gemini = gemini_client(config)?;
    let store = connect_store(config).await?;

    let pipeline = QueryPipeline::new(
        store,
        gemini.clone(),
        gemini,
        RetryPolicy::from_config(&config.retry),
        limit,
    );
    let collection = pipeline
        .open_collection()
        .await
        .context("Failed to open collection")?;

    let results = pipeline
        .retrieve(&collection, query, limit)
        .await
        .context("Search failed")?;

    if results.is_empty() {
        println!("{}", format_warning("No matching documents"));
        return Ok(());
    }

    println!(
        "{}",
        format_info(&format!("{} results for \"{}\"", results.len(), query))
    );
    for (i, result) in results.iter().enumerate() {
        println!("\n{}. {}", i + 1, result.format_summary(300));
    }

    Ok(())
}

async fn cmd_stats(config: &Config) -> Result<()> {
    info!("Gathering statistics");

    let store = connect_store(config).await?;

    println!("Store:      {}", config.store.uri);
    println!("Collection: {}", store.collection_name());

    if !store.collection_exists().await? {
        println!(
            "{}",
            format_warning("Collection does not exist yet; run `ingest` first")
        );
        return Ok(());
    }

    match store.get_collection(&config.gemini.embedding_model).await {
        Ok(collection) => {
            let spec = collection.spec();
            println!("Documents:  {}", collection.count().await?);
            println!("Dimension:  {}", spec.dimension);
            println!("Distance:   {}", spec.distance.as_str());
            println!("Model:      {}", spec.embedding_model);
        }
        Err(e) => {
            println!("Documents:  {}", store.document_count().await?);
            println!("{}", format_error(&e.to_string()));
        }
    }

    Ok(())
}

async fn cmd_reset(config: &Config, confirm: bool) -> Result<()> {
    if !confirm {
        error!("This will delete all stored abstracts. Use --confirm to proceed");
        return Ok(());
    }

    warn!("Resetting collection - all data will be lost");

    let store = connect_store(config).await?;
    let dropped = store
        .drop_collection()
        .await
        .context("Failed to drop collection")?;

    if dropped {
        println!(
            "{}",
            format_success(&format!("Collection '{}' dropped", store.collection_name()))
        );
    } else {
        println!(
            "{}",
            format_info(&format!(
                "Collection '{}' does not exist, nothing to reset",
                store.collection_name()
            ))
        );
    }

    Ok(())
}
