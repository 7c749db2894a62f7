use std::io::Read;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use ragprep_core::blob::FsBlobStore;
use ragprep_core::config::Config;
use ragprep_core::traits::ThreadSleeper;
use ragprep_core::types::BatchRequest;
use ragprep_embed::BatchEmbedder;

/// Embed one batch of the corpus. The event is `{"batch_index": N, "batch_size": M}`,
/// read from the argument or from stdin when omitted.
#[derive(Parser, Debug)]
#[command(name = "ragprep-embed-batch", version)]
struct Args {
    /// Batch event as JSON
    event: Option<String>,
}

fn main() -> anyhow::Result<()> {
    ragprep_core::logging::init();
    let args = Args::parse();

    let raw = match args.event {
        Some(event) => event,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).context("reading event from stdin")?;
            buf
        }
    };
    let request: BatchRequest = if raw.trim().is_empty() {
        BatchRequest::default()
    } else {
        serde_json::from_str(&raw).context("parsing batch event")?
    };

    let settings = Config::load()?.embed_settings()?;
    let blobs = Arc::new(FsBlobStore::new(std::env::current_dir()?));
    let embedder = BatchEmbedder::from_settings(&settings, blobs, Arc::new(ThreadSleeper))?;
    let result = embedder.handle(request)?;
    println!("{}", serde_json::to_string(&result)?);
    Ok(())
}
