//! Command-line argument parsing with clap.

use std::time::Duration;

use clap::Parser;
use url::Url;

use crate::errors::{Result, SilenceError};
use crate::orchestrator::{Mode, SilenceConfig};

/// Create, show or delete Alertmanager silences by label set.
#[derive(Parser, Debug, Clone)]
#[command(name = "alertmanager-silence")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Work mode: create/delete/show silence.
    #[arg(short, long, default_value = "show")]
    pub mode: String,

    /// Period for silenced alerts in hours.
    #[arg(long, default_value_t = SilenceConfig::DEFAULT_SILENCE_PERIOD_HOURS)]
    pub silence_period: u32,

    /// Comma separated silence matching labels, eg. key1=value1,key2=value2.
    #[arg(short, long, default_value = "")]
    pub labels: String,

    /// Creator of the silence.
    #[arg(short, long, env = "SILENCE_CREATOR", default_value = SilenceConfig::DEFAULT_AUTHOR)]
    pub creator: String,

    /// Comment attached to the silence. Recommended to add the ticket reference.
    #[arg(
        short = 'C',
        long,
        env = "SILENCE_COMMENT",
        default_value = SilenceConfig::DEFAULT_AUTHOR
    )]
    pub comment: String,

    /// Alertmanager URL.
    #[arg(
        short,
        long,
        alias = "URL",
        env = "ALERTMANAGER_URL",
        default_value = "http://127.0.0.1"
    )]
    pub url: String,

    /// Alertmanager connection timeout in seconds, applied to each request.
    #[arg(short, long, env = "ALERTMANAGER_TIMEOUT", default_value_t = 3)]
    pub timeout: u64,
}

impl Cli {
    /// Validate the raw flags into a [`SilenceConfig`]
    ///
    /// # Errors
    ///
    /// Returns an error for an unrecognized mode or an unparsable URL.
    pub fn into_config(self) -> Result<SilenceConfig> {
        let mode: Mode = self.mode.parse()?;
        let url = Url::parse(&self.url).map_err(|source| SilenceError::InvalidUrl {
            url: self.url.clone(),
            source,
        })?;

        Ok(SilenceConfig::new(url, mode)
            .with_labels(&self.labels)
            .with_timeout(Duration::from_secs(self.timeout))
            .with_silence_period_hours(self.silence_period)
            .with_creator(&self.creator)
            .with_comment(&self.comment))
    }
}
