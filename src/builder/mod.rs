//! Model-compilation backends.
//!
//! ```text
//!              STAN_BACKEND ──► selection ──► BackendRegistry::resolve
//!                                                     │
//!                         ┌───────────────────────────┴─────┐
//!                         ▼                                 ▼
//!                 ┌───────────────┐                 ┌───────────────┐
//!                 │ PyStanBuilder │                 │CmdStanBuilder │
//!                 └───────┬───────┘                 └───────┬───────┘
//!                         ▼                                 ▼
//!                <model>_model.pkl                 <model>_model.bin
//! ```
//!
//! - **BackendId** - closed set of backend names (in `backend.rs`)
//! - **ModelBuilder** - capability each backend implements (in `model_builder.rs`)
//! - **BackendRegistry** - name to builder lookup (in `registry.rs`)
//! - **Artifacts** - on-disk naming contract and build report (in `artifacts.rs`)

pub mod artifacts;
pub mod backend;
pub mod cmdstan;
pub mod errors;
pub mod events;
pub mod model_builder;
pub mod pystan;
pub mod registry;

pub use artifacts::{artifact_name, available_backends, discover_artifacts, BuildInfo};
pub use backend::{BackendId, BackendIdParseError};
pub use cmdstan::CmdStanBuilder;
pub use errors::{BuildError, ConfigurationError};
pub use events::BuildEvent;
pub use model_builder::{BackendAvailability, ModelBuilder};
pub use pystan::PyStanBuilder;
pub use registry::{get_backend_summaries, BackendRegistry, BackendSummary};
