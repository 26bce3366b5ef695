//! CLI argument definitions for funkwache-daemon.
//!
//! Uses `clap` v4 derive macros to parse command-line arguments.

use std::path::PathBuf;

use clap::Parser;

/// Funkwache BOS radio alarm monitoring daemon.
///
/// Supervises the rtl_fm | multimon-ng decoder chain, turns decoded
/// telegram lines into structured alarm events and fans them out to
/// the configured output plugins.
#[derive(Parser, Debug)]
#[command(name = "funkwache-daemon")]
#[command(version, about, long_about = None)]
pub struct DaemonCli {
    /// Path to funkwache.toml configuration file.
    #[arg(short, long, default_value = "/etc/funkwache/funkwache.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Override log format (json, pretty).
    ///
    /// Takes precedence over the config file and environment variables.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Read decoder lines from stdin instead of spawning the decoder
    /// chain (for piping recorded multimon-ng dumps).
    #[arg(long)]
    pub stdin: bool,

    /// Validate configuration file and exit without starting the daemon.
    #[arg(long)]
    pub validate: bool,

    /// Override PID file path (takes precedence over config file).
    #[arg(long)]
    pub pid_file: Option<String>,
}
