//! Run the bootstrap against this process and print the JSON report.

use std::process::ExitCode;

use paddle_bootstrap::{bootstrap, BootstrapOptions, ProcessEnv, ShellRunner};

fn main() -> ExitCode {
    env_logger::init();

    let env = ProcessEnv;
    let options = BootstrapOptions::from_env(&env);
    let outcome = match bootstrap(&options, &env, &ShellRunner) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let (runtime, advisories) = outcome.into_parts();
    if let Err(e) = runtime.sync_prim_flags(&env) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    match runtime.report(&advisories).to_json() {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: failed to serialize report: {e}");
            ExitCode::FAILURE
        }
    }
}
