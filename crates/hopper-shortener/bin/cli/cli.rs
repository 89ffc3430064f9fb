use clap::{Parser, Subcommand, ValueEnum};
use hopper_core::BucketWidth;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const STORAGE_BACKEND_ENV: &str = "HOPPER_STORAGE_BACKEND";
pub const SQLITE_DSN_ENV: &str = "HOPPER_SQLITE_DSN";
pub const REDB_PATH_ENV: &str = "HOPPER_REDB_PATH";
pub const CODEC_SALT_ENV: &str = "HOPPER_CODEC_SALT";
pub const CODEC_MIN_LENGTH_ENV: &str = "HOPPER_CODEC_MIN_LENGTH";
pub const BASE_URL_ENV: &str = "HOPPER_BASE_URL";
pub const LOG_FORMAT_ENV: &str = "HOPPER_LOG_FORMAT";

pub const DEFAULT_REDB_PATH: &str = "hopper.redb";
pub const DEFAULT_CODEC_SALT: &str = "5c1e0b6a9d3f47e2b8a4c07f61d92e3b";
pub const DEFAULT_BASE_URL: &str = "https://hop.per";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "sqlite")]
    Sqlite,
    #[value(name = "redb")]
    Redb,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Sqlite => write!(f, "sqlite"),
            StorageBackendArg::Redb => write!(f, "redb"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "hopper", version, about = "Shorten URLs and count their visits")]
pub struct CLI {
    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::Redb
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = SQLITE_DSN_ENV, required_if_eq("storage", "sqlite"))]
    pub sqlite_dsn: Option<String>,

    #[arg(long, env = REDB_PATH_ENV, default_value = DEFAULT_REDB_PATH)]
    pub redb_path: PathBuf,

    /// Salt of the public id codec. Changing it invalidates every issued id.
    #[arg(
        long,
        env = CODEC_SALT_ENV,
        default_value = DEFAULT_CODEC_SALT,
        hide_env_values = true
    )]
    pub salt: String,

    #[arg(long, env = CODEC_MIN_LENGTH_ENV, default_value_t = hopper_core::DEFAULT_MIN_LENGTH)]
    pub min_length: usize,

    /// Prefix of the short URLs printed by `create` and `read`.
    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Shorten a URL
    Create {
        target: String,
        /// One of 301, 302, 307, 308. Defaults to 302 when omitted.
        #[arg(long, short, default_value_t = 0, hide_default_value = true)]
        redirect: u16,
    },
    /// Show a link and its visits without recording a visit
    Read {
        id: String,
        #[arg(long, default_value_t = BucketWidth::Hour)]
        per: BucketWidth,
    },
    /// Record a visit and print where the link redirects
    Visit { id: String },
    /// Count a link's visits per bucket
    Stats {
        id: String,
        #[arg(long, default_value_t = BucketWidth::Hour)]
        per: BucketWidth,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        CLI::command().debug_assert();
    }

    #[test]
    fn parses_create_with_defaults() {
        let cli = CLI::try_parse_from(["hopper", "create", "https://example.com"]).unwrap();

        assert_eq!(cli.storage, StorageBackendArg::Redb);
        assert_eq!(cli.redb_path, PathBuf::from(DEFAULT_REDB_PATH));
        assert_eq!(cli.min_length, 3);
        assert_eq!(
            cli.command,
            Command::Create {
                target: "https://example.com".to_string(),
                redirect: 0,
            }
        );
    }

    #[test]
    fn parses_stats_width() {
        let cli = CLI::try_parse_from(["hopper", "stats", "abc", "--per", "1s"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Stats {
                id: "abc".to_string(),
                per: BucketWidth::Second,
            }
        );

        assert!(CLI::try_parse_from(["hopper", "stats", "abc", "--per", "90s"]).is_err());
    }

    #[test]
    fn sqlite_requires_dsn() {
        let err = CLI::try_parse_from(["hopper", "--storage", "sqlite", "visit", "abc"]);
        assert!(err.is_err());

        let cli = CLI::try_parse_from([
            "hopper",
            "--storage",
            "sqlite",
            "--sqlite-dsn",
            "sqlite::memory:",
            "visit",
            "abc",
        ])
        .unwrap();
        assert_eq!(cli.storage, StorageBackendArg::Sqlite);
        assert_eq!(cli.sqlite_dsn.as_deref(), Some("sqlite::memory:"));
    }
}
