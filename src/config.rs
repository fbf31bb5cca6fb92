//! Run configuration, merged from three layers. Later layers win:
//!
//! 1. built-in defaults, with the input encoding taken from `$ENCODING`,
//! 2. the `.exprrc` JSON file in the working directory (or `--config`),
//! 3. command line arguments.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::cli::{Cli, Encoding};

pub const RC_FILE: &str = ".exprrc";
pub const ENCODING_VAR: &str = "ENCODING";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Unreadable { path: PathBuf, source: io::Error },

    #[error("malformed config file {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("unsupported encoding: {0}")]
    UnsupportedEncoding(String),
}

/// Contents of an rc file. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RcFile {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub ast_output: Option<PathBuf>,
    pub encoding: Option<String>,
}

impl RcFile {
    pub fn parse(path: &Path, json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|source| ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a file the user asked for explicitly, failing if it is missing.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(path, &json)
    }

    /// Load the implicit rc file. It is optional, so any problem with it
    /// falls back to an empty configuration.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(rc) => rc,
            Err(ConfigError::Unreadable { source, .. }) => {
                debug!("not using {}: {source}", path.display());
                Self::default()
            }
            Err(err) => {
                warn!("ignoring {err}");
                Self::default()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub ast_output: Option<PathBuf>,
    pub encoding: Encoding,
}

impl Config {
    /// Build the configuration for this process: environment, rc file, then `cli`.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let rc = match &cli.config {
            Some(path) => RcFile::load(path)?,
            None => RcFile::load_or_default(Path::new(RC_FILE)),
        };

        let env_encoding = env::var(ENCODING_VAR).ok();

        Self::merge(env_encoding.as_deref(), rc, cli)
    }

    pub fn merge(env_encoding: Option<&str>, rc: RcFile, cli: &Cli) -> Result<Self, ConfigError> {
        let encoding = match (cli.encoding, rc.encoding.as_deref().or(env_encoding)) {
            (Some(encoding), _) => encoding,
            (None, Some(name)) => name
                .parse()
                .map_err(|_| ConfigError::UnsupportedEncoding(name.to_string()))?,
            (None, None) => Encoding::Utf8,
        };

        let config = Self {
            input: cli.file.clone().or(rc.input),
            output: cli.output.clone().or(rc.output),
            ast_output: cli.ast_output.clone().or(rc.ast_output),
            encoding,
        };

        debug!("resolved {config:?}");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("exprc").chain(args.iter().copied()))
    }

    fn rc(json: &str) -> RcFile {
        RcFile::parse(Path::new(RC_FILE), json).unwrap()
    }

    #[test]
    fn defaults() {
        let config = Config::merge(None, RcFile::default(), &cli(&[])).unwrap();

        assert_eq!(
            config,
            Config {
                input: None,
                output: None,
                ast_output: None,
                encoding: Encoding::Utf8,
            }
        );
    }

    #[test]
    fn rc_file_keys() {
        let rc = rc(r#"{ "input": "a.expr", "output": "a.js", "astOutput": "a.json", "encoding": "ascii" }"#);
        let config = Config::merge(None, rc, &cli(&[])).unwrap();

        assert_eq!(config.input, Some(PathBuf::from("a.expr")));
        assert_eq!(config.output, Some(PathBuf::from("a.js")));
        assert_eq!(config.ast_output, Some(PathBuf::from("a.json")));
        assert_eq!(config.encoding, Encoding::Ascii);
    }

    #[test]
    fn command_line_wins() {
        let rc = rc(r#"{ "input": "a.expr", "output": "a.js", "encoding": "ascii" }"#);
        let config = Config::merge(Some("latin1"), rc, &cli(&["b.expr", "-e", "utf-8"])).unwrap();

        assert_eq!(config.input, Some(PathBuf::from("b.expr")));
        assert_eq!(config.output, Some(PathBuf::from("a.js")));
        assert_eq!(config.encoding, Encoding::Utf8);
    }

    #[test]
    fn environment_encoding_is_the_lowest_layer() {
        let config = Config::merge(Some("latin1"), RcFile::default(), &cli(&[])).unwrap();
        assert_eq!(config.encoding, Encoding::Latin1);

        let config = Config::merge(Some("latin1"), rc(r#"{ "encoding": "utf8" }"#), &cli(&[])).unwrap();
        assert_eq!(config.encoding, Encoding::Utf8);
    }

    #[test]
    fn unknown_encoding_names() {
        let err = Config::merge(Some("ebcdic"), RcFile::default(), &cli(&[])).unwrap_err();

        assert!(matches!(err, ConfigError::UnsupportedEncoding(ref name) if name == "ebcdic"));
    }

    #[test]
    fn malformed_rc_files() {
        assert!(matches!(
            RcFile::parse(Path::new(RC_FILE), "{ input: "),
            Err(ConfigError::Malformed { .. })
        ));
        assert!(RcFile::parse(Path::new(RC_FILE), r#"{ "output": 3 }"#).is_err());
    }

    #[test]
    fn missing_rc_files() {
        let path = Path::new("definitely/not/here/.exprrc");

        assert!(matches!(RcFile::load(path), Err(ConfigError::Unreadable { .. })));
        assert_eq!(RcFile::load_or_default(path), RcFile::default());
    }

    #[test]
    fn unknown_rc_keys_are_ignored() {
        assert_eq!(rc(r#"{ "theme": "dark" }"#), RcFile::default());
    }
}
