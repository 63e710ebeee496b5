//! Command-line flags for the `ztadmin` server.
//!
//! Flags override the layered configuration file and environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// ztadmin -- web dashboard for a ZeroTier network controller
#[derive(Debug, Parser)]
#[command(
    name = "ztadmin",
    version,
    about = "Serve the ztadmin dashboard API",
    long_about = "Serves the dashboard API for administering a ZeroTier network controller.\n\n\
        Settings come from compiled defaults, then the TOML config file, then\n\
        ZTADMIN_* environment variables, then these flags."
)]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:3000
    #[arg(long, short = 'b', value_name = "ADDR")]
    pub bind: Option<SocketAddr>,

    /// Directory for controller.json, users.json and member-names.json
    #[arg(long, short = 'd', value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_overrides() {
        let cli = Cli::try_parse_from([
            "ztadmin",
            "--bind",
            "0.0.0.0:8080",
            "-d",
            "/srv/ztadmin",
            "-vv",
            "--log-json",
        ])
        .unwrap();
        assert_eq!(cli.bind, Some("0.0.0.0:8080".parse().unwrap()));
        assert_eq!(cli.data_dir, Some(PathBuf::from("/srv/ztadmin")));
        assert_eq!(cli.verbose, 2);
        assert!(cli.log_json);
        assert!(!cli.print_config);
    }

    #[test]
    fn rejects_bad_bind_address() {
        assert!(Cli::try_parse_from(["ztadmin", "--bind", "localhost"]).is_err());
    }
}
