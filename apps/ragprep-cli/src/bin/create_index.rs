use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use ragprep_core::traits::ThreadSleeper;
use ragprep_index::schema::{
    DEFAULT_EF_CONSTRUCTION, DEFAULT_EF_SEARCH, DEFAULT_ENGINE, DEFAULT_HNSW_M, DEFAULT_SPACE_TYPE,
};
use ragprep_index::{IndexParams, IndexProvisioner, ProvisionOutcome};

/// Create the k-NN vector index on a search collection, waiting for the
/// collection to come up first. Safe to re-run.
#[derive(Parser, Debug)]
#[command(name = "ragprep-create-index", version)]
struct Args {
    /// Collection endpoint, with or without scheme
    #[arg(long)]
    endpoint: String,

    #[arg(long)]
    index_name: String,

    /// Embedding vector dimension
    #[arg(long)]
    dimension: u32,

    #[arg(long, default_value = DEFAULT_ENGINE)]
    engine: String,

    #[arg(long, default_value = DEFAULT_SPACE_TYPE)]
    space_type: String,

    #[arg(long, default_value_t = DEFAULT_HNSW_M)]
    hnsw_m: u32,

    #[arg(long, default_value_t = DEFAULT_EF_CONSTRUCTION)]
    ef_construction: u32,

    #[arg(long, default_value_t = DEFAULT_EF_SEARCH)]
    ef_search: u32,

    /// Falls back to AWS_REGION, then AWS_DEFAULT_REGION
    #[arg(long)]
    region: Option<String>,

    /// Bearer token sent with every request
    #[arg(long, env = "SEARCH_AUTH_TOKEN", hide_env_values = true)]
    auth_token: Option<String>,

    #[arg(long, default_value_t = 30)]
    max_wait_retries: u32,

    #[arg(long, default_value_t = 10)]
    poll_interval_secs: u64,
}

fn main() -> anyhow::Result<()> {
    ragprep_core::logging::init();
    let args = Args::parse();

    let params = IndexParams {
        engine: args.engine,
        space_type: args.space_type,
        hnsw_m: args.hnsw_m,
        ef_construction: args.ef_construction,
        ef_search: args.ef_search,
        max_wait_retries: args.max_wait_retries,
        poll_interval: Duration::from_secs(args.poll_interval_secs),
        ..IndexParams::new(args.index_name, args.dimension)
    };
    let provisioner = IndexProvisioner::connect(
        &args.endpoint,
        args.region.as_deref(),
        args.auth_token.as_deref(),
        Arc::new(ThreadSleeper),
        params,
    )?;
    let (state, result) = provisioner.run_with_state();
    match result.map_err(|e| anyhow::anyhow!("provisioning stopped in state {state:?}: {e}"))? {
        ProvisionOutcome::Created(_) => println!("✅ Index created"),
        ProvisionOutcome::AlreadyExists => println!("✅ Index already exists"),
    }
    Ok(())
}
