use std::process::ExitCode;

fn main() -> ExitCode {
    pretty_env_logger::init_custom_env("TFSHARD_LOG");

    match tfshard::run() {
        Ok(()) => ExitCode::SUCCESS,
        // clap has already printed the usage message.
        Err(tfshard::TfshardError::Usage) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}
