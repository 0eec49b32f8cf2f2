// These Clippy lints are disabled because this is a CLI binary, not a library:
// - print_stderr: the final error goes to stderr.
// - exit: Calling `std::process::exit()` is standard for CLI apps to signal failure to the shell.
#![allow(clippy::print_stderr, clippy::exit)]

use clap::Parser;
use fna_cli::{Cli, exit_code, logging, run, usage_exit_code};
use fna_media::SystemRunner;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = usage_exit_code(&err);
            if let Err(print_err) = err.print() {
                eprintln!("Error: {print_err}");
            }
            std::process::exit(code);
        }
    };
    logging::init(cli.verbose);

    let mut stdout = std::io::stdout().lock();
    if let Err(e) = run(cli, &SystemRunner, &mut stdout) {
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code(&e));
    }
}
