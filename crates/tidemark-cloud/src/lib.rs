//! Tidemark Cloud Core
//!
//! Provider-neutral building blocks for declarative cloud resources:
//! lifecycle traits, provider configuration, flattened state, and the
//! state waiter that lifecycle handlers use to block until a remote
//! resource settles.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │              host (plan / apply)                 │
//! └─────────────────┬───────────────────────────────┘
//!                   │ Config / ResourceState
//! ┌─────────────────▼───────────────────────────────┐
//! │                tidemark-cloud                    │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │   trait Resource / trait DataSource       │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐  ┌──────────────┐            │
//! │  │ State Waiter │  │ ProviderConf │            │
//! │  └──────────────┘  └──────────────┘            │
//! └───────┬─────────────────────────────────────────┘
//!         │
//! ┌───────▼───────┐
//! │ tidemark-     │
//! │ cloud-aws     │
//! └───────────────┘
//! ```

pub mod action;
pub mod config;
pub mod error;
pub mod provider;
pub mod state;
pub mod waiter;

// Re-exports
pub use action::{Change, Operation};
pub use config::{ProviderConfig, TimeoutSettings, find_config_file};
pub use error::{BoxError, CloudError, Result, WaitError};
pub use provider::{DataSource, OperationContext, ProviderMeta, Resource, Timeouts};
pub use state::ResourceState;
pub use waiter::{PollOutcome, PollPolicy, Refreshed, StatusClass, StatusSnapshot, wait_for_state};
pub use tokio_util::sync::CancellationToken;
