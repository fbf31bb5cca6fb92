use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use thiserror::Error;

use crate::backend::js_backend::{generate, BackendError};
use crate::config::{Config, ConfigError};
use crate::frontend::{
    ast::Node,
    parser::{parse, ParserError},
};

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("{} is not valid {encoding} text", .path.display())]
    Undecodable { path: PathBuf, encoding: String },

    #[error("no input file given")]
    NoInput,

    #[error("--from-ast needs an input file")]
    FromAstWithoutInput,

    #[error("malformed AST JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Parse(#[from] ParserError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// What the binary does once its configuration is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Compile the configured input file, which holds AST JSON if `from_ast`.
    File { from_ast: bool },
    /// Compile expressions read line by line from standard input.
    Interactive,
}

impl Mode {
    // Interactive input is always expression text, so `--from-ast` without
    // an input file is refused instead of being dropped.
    pub fn select(config: &Config, from_ast: bool) -> Result<Mode, CompileError> {
        match (&config.input, from_ast) {
            (Some(_), from_ast) => Ok(Mode::File { from_ast }),
            (None, true) => Err(CompileError::FromAstWithoutInput),
            (None, false) => Ok(Mode::Interactive),
        }
    }
}

/// Output of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    pub ast: Node,
    pub code: String,
}

/// Run the whole pipeline over `src` in memory.
pub fn compile_str(src: &str) -> Result<Compiled, CompileError> {
    let ast = parse(src)?;
    let code = generate(&ast)?;

    Ok(Compiled { ast, code })
}

/// Compile the configured input file and write whichever outputs are
/// configured. With `from_ast` the input is AST JSON and parsing is skipped.
///
/// The AST is written before code generation starts, so it is still
/// available when generation fails.
pub fn compile_file(config: &Config, from_ast: bool) -> Result<Compiled, CompileError> {
    let input = config.input.as_deref().ok_or(CompileError::NoInput)?;

    let bytes = fs::read(input).map_err(|source| CompileError::Read {
        path: input.to_path_buf(),
        source,
    })?;

    let text = config
        .encoding
        .decode(&bytes)
        .ok_or_else(|| CompileError::Undecodable {
            path: input.to_path_buf(),
            encoding: config.encoding.to_string(),
        })?;

    info!("compiling {} ({} bytes)", input.display(), bytes.len());

    let ast = if from_ast {
        Node::from_json(&text)?
    } else {
        parse(&text)?
    };

    match &config.ast_output {
        Some(path) => write_output(path, &ast.to_json()?)?,
        None => warn!("--ast-output was not set"),
    }

    let code = generate(&ast)?;

    match &config.output {
        Some(path) => write_output(path, &code)?,
        None => warn!("--output was not set"),
    }

    Ok(Compiled { ast, code })
}

fn write_output(path: &Path, contents: &str) -> Result<(), CompileError> {
    fs::write(path, contents).map_err(|source| CompileError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    info!("wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Encoding;

    #[test]
    fn compiling_strings() {
        let compiled = compile_str("(1+2)*3").unwrap();

        assert_eq!(compiled.code, "console.log((1 + 2) * 3);\n");
        assert_eq!(compiled.ast, parse("(1+2)*3").unwrap());
    }

    #[test]
    fn compiling_bad_strings() {
        assert!(matches!(compile_str("1 +"), Err(CompileError::Parse(ParserError::UnexpectedEOI))));
        assert_eq!(compile_str("1 + x").unwrap_err().to_string(), "unexpected token: x");
    }

    #[test]
    fn compiling_without_input() {
        let config = Config {
            input: None,
            output: None,
            ast_output: None,
            encoding: Encoding::Utf8,
        };

        assert!(matches!(compile_file(&config, false), Err(CompileError::NoInput)));
    }

    #[test]
    fn selecting_modes() {
        let mut config = Config {
            input: None,
            output: None,
            ast_output: None,
            encoding: Encoding::Utf8,
        };

        assert_eq!(Mode::select(&config, false).unwrap(), Mode::Interactive);

        let err = Mode::select(&config, true).unwrap_err();
        assert!(matches!(err, CompileError::FromAstWithoutInput));
        assert_eq!(err.to_string(), "--from-ast needs an input file");

        config.input = Some(PathBuf::from("ast.json"));
        assert_eq!(Mode::select(&config, true).unwrap(), Mode::File { from_ast: true });
        assert_eq!(Mode::select(&config, false).unwrap(), Mode::File { from_ast: false });
    }
}
