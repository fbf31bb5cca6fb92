use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{builder::PossibleValue, Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// A positional file containing the arithmetic expression to compile, if not given (here or in .exprrc), starts interactive mode instead
    pub file: Option<PathBuf>,

    /// File to write the generated JavaScript to
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// File to write the AST to, as JSON
    #[arg(short, long = "ast-output")]
    pub ast_output: Option<PathBuf>,

    /// Character encoding of the input file (defaults to $ENCODING, then utf-8)
    #[arg(short, long, value_enum, ignore_case = true)]
    pub encoding: Option<Encoding>,

    /// Treat the input file as a previously written AST and only generate code from it
    #[arg(long)]
    pub from_ast: bool,

    /// In interactive mode, prints out the AST as JSON after every line entered
    #[arg(long)]
    pub inspect_tree: bool,

    /// Read defaults from this file instead of ./.exprrc
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Ascii,
    Latin1,
}

impl ValueEnum for Encoding {
    fn value_variants<'a>() -> &'a [Self] {
        &[Encoding::Utf8, Encoding::Ascii, Encoding::Latin1]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        Some(match self {
            Encoding::Utf8 => PossibleValue::new("utf-8").alias("utf8").help("Unicode, the default"),
            Encoding::Ascii => PossibleValue::new("ascii")
                .alias("us-ascii")
                .help("7-bit ASCII, other bytes are rejected"),
            Encoding::Latin1 => PossibleValue::new("latin1")
                .aliases(["iso-8859-1", "binary"])
                .help("One character per byte"),
        })
    }
}

// Encoding names also come from .exprrc and the environment, where clap
// is not involved.
impl FromStr for Encoding {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(name.trim(), true)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_possible_value() {
            Some(value) => write!(f, "{}", value.get_name()),
            None => write!(f, "{self:?}"),
        }
    }
}

impl Encoding {
    /// Decode raw input bytes, `None` when they are not valid in this encoding.
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Encoding::Utf8 => {
                let text = std::str::from_utf8(bytes).ok()?;
                // Editors like to leave a byte order mark in front
                Some(text.strip_prefix('\u{feff}').unwrap_or(text).to_string())
            }
            Encoding::Ascii => bytes
                .is_ascii()
                .then(|| bytes.iter().copied().map(char::from).collect()),
            Encoding::Latin1 => Some(bytes.iter().copied().map(char::from).collect()),
        }
    }
}
