//! Batch ingestion binary: load PDFs, chunk semantically, embed, and rebuild
//! the destination pgvector collection.

use std::sync::Arc;

use chunksmith::semantic_chunking::{EmbeddingProvider, OpenAiEmbeddingProvider};
use chunksmith::stores::PgVectorStore;
use chunksmith::{IngestError, PipelineConfig, pipeline};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("ingestion failed: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), IngestError> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = PipelineConfig::from_env()?;
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(OpenAiEmbeddingProvider::new(
        &config.api_key,
        &config.api_base_url,
        &config.embedding_model,
    )?);
    let store = PgVectorStore::connect(&config.database_url).await?;

    let report = pipeline::run(&config, provider, &store).await?;

    println!("\nIngestion complete");
    println!("  documents loaded : {}", report.documents_loaded);
    println!("  documents skipped: {}", report.documents_failed);
    println!("  chunks written   : {}", report.chunks_written);
    println!("  collection       : {}", config.collection);
    println!(
        "  duration         : {}.{:03}s",
        report.duration.as_secs(),
        report.duration.subsec_millis()
    );

    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let subscriber = FmtSubscriber::builder().with_env_filter("info").finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
