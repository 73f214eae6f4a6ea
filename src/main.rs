#![forbid(unsafe_code)]

//! c2s: code-to-specification dashboard CLI entry point.

use clap::Parser;

mod cli_app;

fn main() {
    let args = cli_app::Cli::parse();
    if let Err(e) = cli_app::run(&args) {
        eprintln!("c2s: {e}");
        std::process::exit(e.exit_code());
    }
}
