//! imgdedup - duplicate image finder and remover.
//!
//! Entry point for the imgdedup CLI.

use clap::Parser;
use imgdedup::{
    cli::Cli,
    error::{ExitCode, StructuredError},
    similarity::OracleError,
};

fn main() {
    let cli = Cli::parse();
    let json_errors = cli.json_errors;

    match imgdedup::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            // Ctrl+C during encode/match surfaces as an oracle error; it gets
            // the conventional 130 rather than a general failure.
            let exit_code = if err
                .downcast_ref::<OracleError>()
                .is_some_and(|e| matches!(e, OracleError::Interrupted))
            {
                ExitCode::Interrupted
            } else {
                ExitCode::GeneralError
            };

            if json_errors {
                let structured = StructuredError::new(&err, exit_code);
                if let Ok(json) = serde_json::to_string_pretty(&structured) {
                    eprintln!("{json}");
                } else {
                    eprintln!("[{}] Error: {err:#}", exit_code.code_prefix());
                }
            } else {
                eprintln!("[{}] Error: {err:#}", exit_code.code_prefix());
            }

            std::process::exit(exit_code.as_i32());
        }
    }
}
