use std::sync::Arc;
use std::time::Duration;

use ragprep_core::error::{Error, Result};
use ragprep_core::traits::Sleeper;
use serde_json::Value;
use tracing::{debug, info};

use crate::api::{ApiError, HttpIndicesApi, IndicesApi, REQUEST_TIMEOUT};
use crate::readiness::{ReadinessPoller, DEFAULT_INTERVAL, DEFAULT_MAX_RETRIES};
use crate::schema::{
    IndexSchema, DEFAULT_EF_CONSTRUCTION, DEFAULT_EF_SEARCH, DEFAULT_ENGINE, DEFAULT_HNSW_M, DEFAULT_SPACE_TYPE,
};

/// Progress of one provisioning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionState {
    Unknown,
    Polling,
    Ready,
    Created,
    AlreadyExists,
    Forbidden,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionEvent {
    StartPolling,
    ProbeOk,
    ProbeForbidden,
    RetriesExhausted,
    IndexExists,
    IndexMissing,
}

impl ProvisionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Created | Self::AlreadyExists | Self::Forbidden | Self::TimedOut)
    }

    /// Transition table of a run. Events that do not apply leave the state
    /// unchanged.
    pub fn next(self, event: ProvisionEvent) -> Self {
        use ProvisionEvent as E;
        match (self, event) {
            (Self::Unknown, E::StartPolling) => Self::Polling,
            (Self::Polling, E::ProbeOk) => Self::Ready,
            (Self::Polling, E::ProbeForbidden) => Self::Forbidden,
            (Self::Polling, E::RetriesExhausted) => Self::TimedOut,
            (Self::Ready, E::IndexExists) => Self::AlreadyExists,
            (Self::Ready, E::IndexMissing) => Self::Created,
            (state, _) => state,
        }
    }
}

/// Successful end of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum ProvisionOutcome {
    /// Carries the service's creation response.
    Created(Value),
    AlreadyExists,
}

impl ProvisionOutcome {
    pub fn state(&self) -> ProvisionState {
        match self {
            Self::Created(_) => ProvisionState::Created,
            Self::AlreadyExists => ProvisionState::AlreadyExists,
        }
    }
}

/// Everything a provisioning run needs besides the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexParams {
    pub index_name: String,
    pub dimension: u32,
    pub engine: String,
    pub space_type: String,
    pub hnsw_m: u32,
    pub ef_construction: u32,
    pub ef_search: u32,
    pub max_wait_retries: u32,
    pub poll_interval: Duration,
}

impl IndexParams {
    pub fn new(index_name: impl Into<String>, dimension: u32) -> Self {
        Self {
            index_name: index_name.into(),
            dimension,
            engine: DEFAULT_ENGINE.to_string(),
            space_type: DEFAULT_SPACE_TYPE.to_string(),
            hnsw_m: DEFAULT_HNSW_M,
            ef_construction: DEFAULT_EF_CONSTRUCTION,
            ef_search: DEFAULT_EF_SEARCH,
            max_wait_retries: DEFAULT_MAX_RETRIES,
            poll_interval: DEFAULT_INTERVAL,
        }
    }

    pub fn schema(&self) -> IndexSchema {
        IndexSchema::build(
            self.dimension,
            &self.engine,
            &self.space_type,
            self.hnsw_m,
            self.ef_construction,
            self.ef_search,
        )
    }

    fn validate(&self) -> Result<()> {
        if self.index_name.trim().is_empty() {
            return Err(Error::InvalidConfig("index name is empty".to_string()));
        }
        if self.dimension == 0 {
            return Err(Error::InvalidConfig("dimension must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// `explicit`, else `AWS_REGION`, else `AWS_DEFAULT_REGION`. Blank values
/// count as unset.
pub fn resolve_region(explicit: Option<&str>, lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
    let present = |r: &String| !r.trim().is_empty();
    explicit
        .map(str::to_string)
        .filter(present)
        .or_else(|| lookup("AWS_REGION").filter(present))
        .or_else(|| lookup("AWS_DEFAULT_REGION").filter(present))
        .ok_or_else(|| {
            Error::InvalidConfig("Unable to determine region. Set --region or AWS_DEFAULT_REGION.".to_string())
        })
}

fn api_error(err: ApiError) -> Error {
    match err {
        ApiError::Forbidden { status, message } => Error::Permission { status, message },
        other => Error::SearchApi(other.to_string()),
    }
}

/// Create `index_name` unless it already exists. Re-running against an
/// existing index succeeds without issuing a create.
pub fn create_if_absent(api: &dyn IndicesApi, index_name: &str, schema: &IndexSchema) -> Result<ProvisionOutcome> {
    if api.exists(index_name).map_err(api_error)? {
        info!("Index '{index_name}' already exists, skipping creation");
        return Ok(ProvisionOutcome::AlreadyExists);
    }
    let body = schema
        .to_json()
        .map_err(|e| Error::InvalidConfig(format!("unserializable index schema: {e}")))?;
    info!(
        "Index body:\n{}",
        serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string())
    );
    let response = api.create(index_name, &body).map_err(api_error)?;
    info!("Index created successfully: {response}");
    Ok(ProvisionOutcome::Created(response))
}

pub struct IndexProvisioner {
    api: Box<dyn IndicesApi>,
    sleeper: Arc<dyn Sleeper>,
    params: IndexParams,
}

impl IndexProvisioner {
    pub fn new(api: Box<dyn IndicesApi>, sleeper: Arc<dyn Sleeper>, params: IndexParams) -> Self {
        Self { api, sleeper, params }
    }

    /// Resolve the region and build an HTTPS client for `endpoint`.
    pub fn connect(
        endpoint: &str,
        region: Option<&str>,
        auth_token: Option<&str>,
        sleeper: Arc<dyn Sleeper>,
        params: IndexParams,
    ) -> Result<Self> {
        let region = resolve_region(region, |k| std::env::var(k).ok())?;
        info!("Creating vector index '{}' on {} ({})", params.index_name, endpoint, region);
        info!(
            "  dimension={}, engine={}, space_type={}",
            params.dimension, params.engine, params.space_type
        );
        info!(
            "  hnsw_m={}, ef_construction={}, ef_search={}",
            params.hnsw_m, params.ef_construction, params.ef_search
        );
        let api = HttpIndicesApi::new(endpoint, auth_token, REQUEST_TIMEOUT)
            .map_err(|e| Error::InvalidConfig(format!("{e:#}")))?;
        Ok(Self::new(Box::new(api), sleeper, params))
    }

    pub fn run(&self) -> Result<ProvisionOutcome> {
        self.run_with_state().1
    }

    /// Like [`run`](Self::run), also reporting the state the run ended in.
    /// A run stopped by invalid parameters ends in `Unknown`; a failed create
    /// ends in `Ready`.
    pub fn run_with_state(&self) -> (ProvisionState, Result<ProvisionOutcome>) {
        let mut state = ProvisionState::Unknown;
        let result = self.drive(&mut state);
        info!(index = %self.params.index_name, "Provisioning finished in state {state:?}");
        (state, result)
    }

    fn drive(&self, state: &mut ProvisionState) -> Result<ProvisionOutcome> {
        self.params.validate()?;
        self.advance(state, ProvisionEvent::StartPolling);

        info!("Waiting for collection to be responsive...");
        let poller = ReadinessPoller::new(self.api.as_ref(), self.sleeper.clone());
        let polled = poller.wait_ready(
            &self.params.index_name,
            self.params.max_wait_retries,
            self.params.poll_interval,
        );
        if let Err(e) = polled {
            let event = match e {
                Error::Permission { .. } => ProvisionEvent::ProbeForbidden,
                _ => ProvisionEvent::RetriesExhausted,
            };
            self.advance(state, event);
            return Err(e);
        }
        self.advance(state, ProvisionEvent::ProbeOk);

        let outcome = create_if_absent(self.api.as_ref(), &self.params.index_name, &self.params.schema())?;
        let event = match outcome {
            ProvisionOutcome::AlreadyExists => ProvisionEvent::IndexExists,
            ProvisionOutcome::Created(_) => ProvisionEvent::IndexMissing,
        };
        self.advance(state, event);
        Ok(outcome)
    }

    fn advance(&self, state: &mut ProvisionState, event: ProvisionEvent) {
        let to = state.next(event);
        debug!(index = %self.params.index_name, "provisioning {state:?} -> {to:?} on {event:?}");
        *state = to;
    }
}
