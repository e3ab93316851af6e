//! # Alertmanager Silence
//!
//! Create, list and delete [Prometheus Alertmanager](https://prometheus.io/docs/alerting/latest/alertmanager/)
//! silences identified by their label set.
//!
//! ## Features
//!
//! - Build and post exact-match silences from a `key=value,...` label string
//! - List active silences, optionally filtered by labels
//! - Delete every active silence whose matchers are exactly the given labels,
//!   with all deletions running concurrently
//! - A separate timeout for every request, with failures aggregated into one
//!   error
//!
//! Silences are matched by their label [`Signature`], which does not depend
//! on the order of labels or matchers.
//!
//! ## Example
//!
//! ```rust,no_run
//! use alertmanager_silence::{Mode, Orchestrator, SilenceConfig};
//! use url::Url;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SilenceConfig::new(Url::parse("http://localhost:9093")?, Mode::Delete)
//!         .with_labels("severity=critical,team=core")
//!         .with_timeout(Duration::from_secs(3));
//!
//!     Orchestrator::new(config)?.run(&mut std::io::stdout()).await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
mod dispatch;
mod errors;
mod labels;
mod orchestrator;
mod reconcile;
mod repository;
mod transport;
mod types;

pub use dispatch::{aggregate, dispatch, fan_out};
pub use errors::{Result, SilenceError};
pub use labels::{parse_labels, LabelSet, Signature};
pub use orchestrator::{run, Mode, Orchestrator, SilenceConfig};
pub use reconcile::select_matching;
pub use repository::{build_silence, SilenceRepository};
pub use transport::Transport;
pub use types::{
    zero_timestamp, CreateSilenceResponse, CreatedSilence, Matcher, Silence, SilenceState,
    SilenceStatus, SilencesResponse,
};
