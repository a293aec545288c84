//! CLI subcommand definitions.
//!
//! Uses clap derive to define the subcommand hierarchy:
//! - `start` (default) -- start the poll server
//! - `version` -- print build/version info

use clap::{Parser, Subcommand};

/// Pollbox poll server.
#[derive(Parser, Debug)]
#[command(
    name = "pollbox",
    version = env!("CARGO_PKG_VERSION"),
    about = "Pollbox, an in-memory timed poll server"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the poll server (default when no subcommand is given).
    Start {
        /// Bind host (overrides POLLBOX_HOST; default 0.0.0.0).
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides POLLBOX_PORT; default 8088).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print version, build date, and git commit information.
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_default_to_no_subcommand() {
        let cli = Cli::try_parse_from(["pollbox"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_start_with_overrides() {
        let cli = Cli::try_parse_from(["pollbox", "start", "--host", "127.0.0.1", "-p", "9000"])
            .unwrap();
        match cli.command {
            Some(Command::Start { host, port }) => {
                assert_eq!(host.as_deref(), Some("127.0.0.1"));
                assert_eq!(port, Some(9000));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
