//! Runtime configuration.
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. built-in defaults (a 1m BTCUSDT kline stream, SMA 20, HTML chart),
//! 2. an optional TOML file,
//! 3. environment variables (`F_NAME` for the output file), typically loaded
//!    from a `.env` file first.
//!
//! ```toml
//! [feed]
//! url = "wss://stream.binance.com:9443/ws"
//! symbol = "btcusdt"
//! interval = "1m"
//! request_id = 1
//! # channels = ["btcusdt@kline_1m"]   # overrides symbol/interval
//!
//! [indicator]
//! window = 20
//! mode = "append"        # or "upsert"
//! # max_history = 5000
//!
//! [output]
//! file = "btcusdt_candles.html"
//! format = "html"        # or "json"
//! title = "BTCUSDT Candles"
//! ```
//!
//! Credentials (`API_KEY`, `API_SECRET`) are only ever read from the
//! environment and are held as [`SecretString`]s.

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;
use shared_utils::env::{get_env_var_or, get_non_empty_env_var};
use snafu::{Backtrace, ResultExt, Snafu, ensure};
use tracing::debug;

use crate::{
    engine::{DEFAULT_SMA_WINDOW, EngineOptions, EngineOptionsError, IndicatorEngine, SeriesMode},
    feed::{
        SubscriptionRequest,
        client::DEFAULT_WS_URL,
        subscription::kline_channel,
    },
    models::timeframe::TimeFrame,
    render::{ChartRenderer, JsonFrameRenderer, PlotlyHtmlRenderer},
};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConfigError {
    #[snafu(display("Failed to read config file {}: {source}", path.display()))]
    Read {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Failed to parse config: {source}"))]
    Parse {
        source: toml::de::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Invalid indicator settings: {source}"))]
    Indicator {
        source: EngineOptionsError,
        backtrace: Backtrace,
    },

    #[snafu(display("Invalid setting `{key}`: {message}"))]
    Invalid {
        key: &'static str,
        message: String,
        backtrace: Backtrace,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StreamConfig {
    pub feed: FeedSettings,
    pub indicator: IndicatorSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeedSettings {
    pub url: String,
    pub symbol: String,
    pub interval: TimeFrame,
    pub request_id: u64,
    /// Explicit channel list; when set, `symbol`/`interval` do not pick the channel.
    pub channels: Option<Vec<String>>,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_WS_URL.to_string(),
            symbol: "btcusdt".to_string(),
            interval: TimeFrame::default(),
            request_id: 1,
            channels: None,
        }
    }
}

impl FeedSettings {
    pub fn channels(&self) -> Vec<String> {
        match &self.channels {
            Some(channels) => channels.clone(),
            None => vec![kline_channel(&self.symbol, self.interval)],
        }
    }

    pub fn subscription(&self) -> SubscriptionRequest {
        SubscriptionRequest::subscribe(self.channels(), self.request_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndicatorSettings {
    pub window: usize,
    pub mode: SeriesMode,
    pub max_history: Option<usize>,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            window: DEFAULT_SMA_WINDOW,
            mode: SeriesMode::Append,
            max_history: None,
        }
    }
}

impl IndicatorSettings {
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            window: self.window,
            mode: self.mode,
            max_history: self.max_history,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Html,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputSettings {
    pub file: Option<PathBuf>,
    pub format: OutputFormat,
    pub title: Option<String>,
}

impl StreamConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).context(ParseSnafu)
    }

    /// Defaults, then `path` (if any), then environment overrides; validated.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).context(ReadSnafu { path })?;
                debug!(path = %path.display(), "loaded config file");
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_overrides(get_non_empty_env_var);
        config.validate()?;
        Ok(config)
    }

    /// Applies environment-style overrides read through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(file) = lookup("F_NAME") {
            self.output.file = Some(PathBuf::from(file));
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.feed.url.trim();
        ensure!(
            url.starts_with("ws://") || url.starts_with("wss://"),
            InvalidSnafu {
                key: "feed.url",
                message: format!("expected a ws:// or wss:// URL, got {url:?}"),
            }
        );

        let channels = self.feed.channels();
        ensure!(
            !channels.is_empty() && channels.iter().all(|c| !c.trim().is_empty()),
            InvalidSnafu {
                key: "feed.channels",
                message: "at least one non-empty channel is required",
            }
        );
        if self.feed.channels.is_none() {
            ensure!(
                !self.feed.symbol.trim().is_empty(),
                InvalidSnafu {
                    key: "feed.symbol",
                    message: "must not be empty",
                }
            );
        }

        if let Some(file) = &self.output.file {
            ensure!(
                !file.as_os_str().is_empty(),
                InvalidSnafu {
                    key: "output.file",
                    message: "must not be empty",
                }
            );
        }

        self.indicator
            .engine_options()
            .validate()
            .context(IndicatorSnafu)
    }

    pub fn output_file(&self) -> PathBuf {
        self.output.file.clone().unwrap_or_else(|| {
            let ext = match self.output.format {
                OutputFormat::Html => "html",
                OutputFormat::Json => "json",
            };
            PathBuf::from(format!("{}_candles.{ext}", self.feed.symbol.trim().to_lowercase()))
        })
    }

    pub fn chart_title(&self) -> String {
        self.output
            .title
            .clone()
            .unwrap_or_else(|| format!("{} Candles", self.feed.symbol.trim().to_uppercase()))
    }

    pub fn engine(&self) -> Result<IndicatorEngine, ConfigError> {
        IndicatorEngine::new(
            self.feed.symbol.trim().to_lowercase(),
            self.feed.interval,
            self.indicator.engine_options(),
        )
        .context(IndicatorSnafu)
    }

    pub fn renderer(&self) -> Box<dyn ChartRenderer> {
        let path = self.output_file();
        match self.output.format {
            OutputFormat::Html => Box::new(PlotlyHtmlRenderer::new(path, self.chart_title())),
            OutputFormat::Json => Box::new(JsonFrameRenderer::new(path)),
        }
    }
}

/// Exchange credentials. Empty values mean "connect anonymously".
#[derive(Debug)]
pub struct Credentials {
    pub api_key: SecretString,
    pub api_secret: SecretString,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            api_key: SecretString::new(get_env_var_or("API_KEY", "").into()),
            api_secret: SecretString::new(get_env_var_or("API_SECRET", "").into()),
        }
    }
}

/// Loads a `.env` file from the working directory or its parents, if present.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => debug!("no .env file found"),
        Err(e) => tracing::warn!(error = %e, "failed to load .env"),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use secrecy::ExposeSecret;
    use serial_test::serial;

    use super::*;

    #[test]
    fn defaults_match_the_public_btcusdt_stream() {
        let config = StreamConfig::default();
        config.validate().unwrap();
        assert_eq!(config.feed.url, DEFAULT_WS_URL);
        assert_eq!(config.feed.channels(), vec!["btcusdt@kline_1m"]);
        assert_eq!(config.indicator.window, 20);
        assert_eq!(config.indicator.mode, SeriesMode::Append);
        assert_eq!(config.output_file(), PathBuf::from("btcusdt_candles.html"));
        assert_eq!(config.chart_title(), "BTCUSDT Candles");
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = StreamConfig::from_toml_str(
            r#"
            [feed]
            symbol = "ethusdt"
            interval = "5m"

            [indicator]
            mode = "upsert"
            max_history = 100

            [output]
            format = "json"
            "#,
        )
        .unwrap();
        config.validate().unwrap();

        assert_eq!(config.feed.url, DEFAULT_WS_URL);
        assert_eq!(config.feed.channels(), vec!["ethusdt@kline_5m"]);
        assert_eq!(config.indicator.window, 20);
        assert_eq!(config.indicator.mode, SeriesMode::Upsert);
        assert_eq!(config.indicator.max_history, Some(100));
        assert_eq!(config.output_file(), PathBuf::from("ethusdt_candles.json"));
    }

    #[test]
    fn explicit_channels_are_sent_verbatim() {
        let config = StreamConfig::from_toml_str(
            r#"
            [feed]
            channels = ["BTCUSDT@kline_1m", "custom-channel"]
            request_id = 42
            "#,
        )
        .unwrap();
        let sub = config.feed.subscription();
        assert_eq!(sub.params, vec!["BTCUSDT@kline_1m", "custom-channel"]);
        assert_eq!(sub.id, 42);
    }

    #[test]
    fn unknown_keys_and_bad_intervals_are_rejected() {
        assert!(matches!(
            StreamConfig::from_toml_str("[feed]\nsymbl = \"x\""),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            StreamConfig::from_toml_str("[feed]\ninterval = \"2m\""),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn validation_catches_bad_values() {
        let mut config = StreamConfig::default();
        config.feed.url = "https://example.com".into();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "feed.url", .. })
        ));

        let mut config = StreamConfig::default();
        config.feed.channels = Some(vec![]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { key: "feed.channels", .. })
        ));

        let mut config = StreamConfig::default();
        config.indicator.max_history = Some(3);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Indicator { .. })
        ));
    }

    #[test]
    fn f_name_overrides_output_file() {
        let mut config = StreamConfig::default();
        config.apply_overrides(|key| (key == "F_NAME").then(|| "live.html".to_string()));
        assert_eq!(config.output_file(), PathBuf::from("live.html"));

        let mut config = StreamConfig::default();
        config.apply_overrides(|_| None);
        assert_eq!(config.output_file(), PathBuf::from("btcusdt_candles.html"));
    }

    #[test]
    #[serial]
    fn load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[indicator]\nwindow = 5").unwrap();
        let config = StreamConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.indicator.window, 5);

        let missing = StreamConfig::load(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(missing, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn credentials_debug_does_not_leak() {
        let creds = Credentials {
            api_key: SecretString::new("super-secret".into()),
            api_secret: SecretString::new("also-secret".into()),
        };
        let shown = format!("{creds:?}");
        assert!(!shown.contains("super-secret"));
        assert_eq!(creds.api_key.expose_secret(), "super-secret");
    }

    #[test]
    #[serial]
    fn environment_supplies_output_file_and_credentials() {
        // SAFETY: serialized with every other test that touches the environment.
        unsafe {
            std::env::set_var("F_NAME", "from_env.html");
            std::env::set_var("API_KEY", "env-key");
            std::env::remove_var("API_SECRET");
        }

        let config = StreamConfig::load(None).unwrap();
        assert_eq!(config.output_file(), PathBuf::from("from_env.html"));

        let creds = Credentials::from_env();
        assert_eq!(creds.api_key.expose_secret(), "env-key");
        assert_eq!(creds.api_secret.expose_secret(), "");

        unsafe {
            std::env::remove_var("F_NAME");
            std::env::remove_var("API_KEY");
        }
    }
}
