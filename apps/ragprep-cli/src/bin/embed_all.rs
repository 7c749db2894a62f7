use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use ragprep_core::blob::FsBlobStore;
use ragprep_core::config::Config;
use ragprep_core::traits::ThreadSleeper;
use ragprep_core::types::BatchRequest;
use ragprep_embed::BatchEmbedder;

fn main() -> anyhow::Result<()> {
    ragprep_core::logging::init();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.embed_settings()?;
    let blobs = Arc::new(FsBlobStore::new(std::env::current_dir()?));
    let embedder = BatchEmbedder::from_settings(&settings, blobs, Arc::new(ThreadSleeper))?;

    println!("Batch Embedder\n==============");
    println!("Corpus: {}/{}", settings.corpus_location, settings.corpus_key);
    println!("Model: {} (batch size {})", settings.model_id, settings.batch_size);

    let first = embedder.handle(BatchRequest { batch_index: 0, batch_size: None })?;
    let total = first.total_batches;
    if total == 0 {
        println!("Corpus is empty, nothing to embed");
        return Ok(());
    }

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({eta})")?
            .progress_chars("#>-"),
    );
    pb.inc(1);

    let mut embedded = first.docs_embedded;
    let mut written = usize::from(first.output_key.is_some());
    for batch_index in 1..total {
        let result = embedder.handle(BatchRequest { batch_index, batch_size: None })?;
        embedded += result.docs_embedded;
        written += usize::from(result.output_key.is_some());
        pb.inc(1);
    }
    pb.finish_with_message("done");

    println!("\n✅ Embedded {} documents into {} batch files", embedded, written);
    println!("📊 Output under {}/{}", settings.output_location, settings.output_prefix);
    Ok(())
}
