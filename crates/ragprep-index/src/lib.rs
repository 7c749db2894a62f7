//! Provisioning of the k-NN vector index on a managed search collection.
//!
//! Typical flow:
//! 1) Resolve region and connect to the collection endpoint
//! 2) Poll with an existence probe until the collection answers
//! 3) Create the index from [`schema::IndexSchema`] unless it already exists

pub mod api;
pub mod provision;
pub mod readiness;
pub mod schema;

pub use api::{ApiError, HttpIndicesApi, IndicesApi};
pub use provision::{
    create_if_absent, resolve_region, IndexParams, IndexProvisioner, ProvisionEvent, ProvisionOutcome, ProvisionState,
};
pub use readiness::ReadinessPoller;
pub use schema::IndexSchema;
