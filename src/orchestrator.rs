use std::fmt::{Display, Formatter};
use std::io::Write;
use std::str::FromStr;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::dispatch::aggregate;
use crate::errors::{Result, SilenceError};
use crate::labels::LabelSet;
use crate::reconcile::select_matching;
use crate::repository::{build_silence, SilenceRepository};
use crate::transport::Transport;

/// Operation requested by the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Create,
    Delete,
    Show,
}

impl FromStr for Mode {
    type Err = SilenceError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "create" => Ok(Mode::Create),
            "delete" => Ok(Mode::Delete),
            "show" => Ok(Mode::Show),
            other => Err(SilenceError::UnrecognizedMode(other.to_string())),
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Create => write!(f, "create"),
            Mode::Delete => write!(f, "delete"),
            Mode::Show => write!(f, "show"),
        }
    }
}

/// Everything one invocation needs
///
/// # Example
///
/// ```rust
/// use alertmanager_silence::{Mode, SilenceConfig};
/// use std::time::Duration;
/// use url::Url;
///
/// let config = SilenceConfig::new(Url::parse("http://localhost:9093").unwrap(), Mode::Create)
///     .with_labels("severity=critical,team=core")
///     .with_timeout(Duration::from_secs(5))
///     .with_silence_period_hours(4)
///     .with_comment("OPS-1234 maintenance");
///
/// assert_eq!(config.creator, "auto-silencer");
/// ```
#[derive(Debug, Clone)]
pub struct SilenceConfig {
    /// Base URL of the Alertmanager instance
    pub url: Url,
    /// Budget for each individual request
    pub timeout: Duration,
    pub mode: Mode,
    /// Raw `key=value,...` label string
    pub labels: String,
    pub silence_period_hours: u32,
    pub creator: String,
    pub comment: String,
}

impl SilenceConfig {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);
    pub const DEFAULT_SILENCE_PERIOD_HOURS: u32 = 2;
    pub const DEFAULT_AUTHOR: &'static str = "auto-silencer";

    pub fn new(url: Url, mode: Mode) -> Self {
        Self {
            url,
            timeout: Self::DEFAULT_TIMEOUT,
            mode,
            labels: String::new(),
            silence_period_hours: Self::DEFAULT_SILENCE_PERIOD_HOURS,
            creator: Self::DEFAULT_AUTHOR.to_string(),
            comment: Self::DEFAULT_AUTHOR.to_string(),
        }
    }

    pub fn with_labels(mut self, labels: &str) -> Self {
        self.labels = labels.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_silence_period_hours(mut self, hours: u32) -> Self {
        self.silence_period_hours = hours;
        self
    }

    pub fn with_creator(mut self, creator: &str) -> Self {
        self.creator = creator.to_string();
        self
    }

    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = comment.to_string();
        self
    }
}

/// Runs one create, delete or show operation against Alertmanager
#[derive(Clone)]
pub struct Orchestrator {
    config: SilenceConfig,
    repository: SilenceRepository,
}

impl Orchestrator {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: SilenceConfig) -> Result<Self> {
        Ok(Self::with_transport(config, Transport::new()?))
    }

    pub fn with_transport(config: SilenceConfig, transport: Transport) -> Self {
        let repository = SilenceRepository::new(transport, config.url.clone(), config.timeout);
        Self { config, repository }
    }

    pub fn config(&self) -> &SilenceConfig {
        &self.config
    }

    /// Execute the configured mode, writing progress and results to `out`
    ///
    /// # Errors
    ///
    /// Returns a validation error before any request when create or delete is
    /// given no usable labels. Otherwise returns the first request error, or
    /// for delete an [`SilenceError::Aggregate`] of every failed call.
    #[instrument(name = "Orchestrator::run", skip_all, fields(mode = %self.config.mode))]
    pub async fn run<W: Write>(&self, out: &mut W) -> Result<()> {
        let labels = LabelSet::parse(&self.config.labels);

        match self.config.mode {
            Mode::Create => {
                require_labels(&labels, Mode::Create)?;
                self.create(&labels, out).await
            }
            Mode::Delete => {
                require_labels(&labels, Mode::Delete)?;
                self.delete(&labels, out).await
            }
            Mode::Show => self.show(&labels, out).await,
        }
    }

    async fn create<W: Write>(&self, labels: &LabelSet, out: &mut W) -> Result<()> {
        let silence = build_silence(
            self.config.silence_period_hours,
            labels,
            &self.config.creator,
            &self.config.comment,
        );

        writeln!(out, "Creating silence {}", silence.summary())?;

        if let Some(id) = self.repository.create(&silence).await? {
            writeln!(out, "Silence created with ID: {id}")?;
        }
        Ok(())
    }

    async fn show<W: Write>(&self, labels: &LabelSet, out: &mut W) -> Result<()> {
        for silence in self.repository.query_active(labels).await? {
            writeln!(out, "{silence}")?;
        }
        Ok(())
    }

    async fn delete<W: Write>(&self, labels: &LabelSet, out: &mut W) -> Result<()> {
        let active = self.repository.query_active(labels).await?;
        let matched = select_matching(&labels.signature(), active);

        if matched.is_empty() {
            debug!("No active silence has exactly the requested labels");
            writeln!(out, "No silences to delete with given labels")?;
            return Ok(());
        }

        for silence in &matched {
            writeln!(out, "Deleting silence {}", silence.summary())?;
        }

        let ids: Vec<String> = matched.iter().map(|s| s.id().to_string()).collect();
        let outcomes = self.repository.delete_all(&ids).await;

        match aggregate(outcomes) {
            Ok(deleted) => {
                info!(deleted, "Silences deleted");
                Ok(())
            }
            Err(err) => {
                if let SilenceError::Aggregate(errors) = &err {
                    warn!(
                        failed = errors.len(),
                        timed_out = errors.iter().filter(|e| e.is_timeout()).count(),
                        requested = ids.len(),
                        "Some silences could not be deleted"
                    );
                }
                Err(err)
            }
        }
    }
}

fn require_labels(labels: &LabelSet, mode: Mode) -> Result<()> {
    if labels.is_empty() {
        return Err(SilenceError::Validation(format!(
            "Parameter labels cannot be empty in mode: {mode}"
        )));
    }
    Ok(())
}

/// Build an [`Orchestrator`] for `config` and run it
///
/// # Errors
///
/// See [`Orchestrator::run`].
pub async fn run<W: Write>(config: SilenceConfig, out: &mut W) -> Result<()> {
    Orchestrator::new(config)?.run(out).await
}
