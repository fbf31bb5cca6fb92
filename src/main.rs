use std::io;
use std::process;

use clap::Parser;
use env_logger::Env;
use log::info;

use exprc::cli::Cli;
use exprc::compile::{compile_file, CompileError, Mode};
use exprc::config::Config;
use exprc::repl::compile_driver;

fn run(cli: &Cli) -> Result<(), CompileError> {
    let config = Config::resolve(cli)?;

    match Mode::select(&config, cli.from_ast)? {
        Mode::File { from_ast } => {
            compile_file(&config, from_ast)?;
        }
        Mode::Interactive => {
            info!("no input file, starting interactive mode");
            compile_driver(io::stdin().lock(), io::stdout(), io::stderr(), cli.inspect_tree)?;
        }
    }

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Err(err) = run(&cli) {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}
