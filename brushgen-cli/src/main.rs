//! brushgen - generate brush geometry as a map file
//!
//! Builds a single primitive or the stairs preset and writes it either into
//! a func_group or into worldspawn. Run with `--help` for the options.

use std::process::ExitCode;

use brushgen_cli::{logging, run, Options, USAGE};

fn main() -> ExitCode {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    let result = Options::from_args(&args).and_then(|options| run(&options));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            if matches!(err, brushgen_cli::CliError::Usage(_)) {
                eprint!("{}", USAGE);
            }
            ExitCode::FAILURE
        }
    }
}
