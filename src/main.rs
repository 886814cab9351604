//! prompty - command line entry point.
//!
//! With no arguments, waits for the global hotkey and prints the prompt tree
//! each time it fires. See `prompty help` for the other commands.

use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    color_eyre::install()?;
    prompty::logging::init()?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    prompty::cli::execute_cli(&args)
}
