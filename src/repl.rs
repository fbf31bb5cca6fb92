use std::io::{self, BufRead, Write};

use crate::compile::{compile_str, Compiled};

// Reads one expression per line and prints the JavaScript it compiles to.
// Errors are reported and the loop carries on; it ends at end of input.
pub fn compile_driver<R, W, E>(mut input: R, mut output: W, mut errors: E, inspect_tree: bool) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    E: Write,
{
    let mut input_buf = String::new();

    loop {
        write!(output, "Ready >> ")?;
        output.flush()?;

        input_buf.clear();
        if input.read_line(&mut input_buf)? == 0 {
            writeln!(output)?;
            return Ok(());
        }

        if input_buf.trim().is_empty() {
            continue;
        }

        match compile_str(&input_buf) {
            Ok(Compiled { ast, code }) => {
                if inspect_tree {
                    match ast.to_json() {
                        Ok(json) => writeln!(output, "{json}")?,
                        Err(err) => writeln!(errors, "Error: {err}")?,
                    }
                }

                write!(output, "{code}")?;
            }

            Err(err) => writeln!(errors, "Error: {err}")?,
        }
    }
}
