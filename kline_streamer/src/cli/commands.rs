use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::logging::LogFormat;

#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a TOML config file; defaults are used for anything it omits
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log output format: pretty, compact or json
    #[arg(long, default_value = "pretty")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect to the live kline stream and redraw the chart on every update
    Stream,

    /// Feed recorded raw messages (one JSON message per line) through the engine
    Replay {
        /// File of recorded messages
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_replay_with_options() {
        let cli = Cli::try_parse_from([
            "kline-streamer",
            "--config",
            "stream.toml",
            "--log-format",
            "json",
            "replay",
            "--input",
            "events.jsonl",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("stream.toml")));
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(matches!(
            cli.command,
            Commands::Replay { input } if input == PathBuf::from("events.jsonl")
        ));
    }

    #[test]
    fn stream_needs_no_arguments() {
        let cli = Cli::try_parse_from(["kline-streamer", "stream"]).unwrap();
        assert!(cli.config.is_none());
        assert_eq!(cli.log_format, LogFormat::Pretty);
        assert!(matches!(cli.command, Commands::Stream));
    }
}
