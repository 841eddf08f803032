use std::path::PathBuf;

use clap::Parser;

use crate::store::ReadStrategy;

/// Serve single lines of a large text file over HTTP
#[derive(Debug, Clone, Parser)]
#[command(name = "line_server")]
#[command(author, version, about)]
pub struct Config {
    /// The file to serve. Gets indexed once on startup and must not change afterwards
    #[arg(long, short, env = "FILE_TO_SERVE")]
    pub file: PathBuf,

    /// Host address to bind to
    #[arg(long, env = "LINE_SERVER_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(long, short, env = "LINE_SERVER_PORT", default_value = "8000")]
    pub port: u16,

    /// How lines are read from the file
    #[arg(long, value_enum, env = "LINE_SERVER_STRATEGY", default_value_t = ReadStrategy::Positional)]
    pub strategy: ReadStrategy,
}

impl Config {
    /// Returns the address the server listens on
    #[inline]
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["line_server", "--file", "data.txt"]).unwrap();
        assert_eq!(config.file, PathBuf::from("data.txt"));
        assert_eq!(config.strategy, ReadStrategy::Positional);
        assert_eq!(config.server_addr(), "127.0.0.1:8000");
    }

    #[test]
    fn test_args() {
        let config = Config::try_parse_from([
            "line_server",
            "-f",
            "data.txt",
            "--host",
            "0.0.0.0",
            "-p",
            "9000",
            "--strategy",
            "locked",
        ])
        .unwrap();
        assert_eq!(config.strategy, ReadStrategy::Locked);
        assert_eq!(config.server_addr(), "0.0.0.0:9000");

        assert!(Config::try_parse_from(["line_server", "-f", "x", "--strategy", "mmap"]).is_err());
    }
}
