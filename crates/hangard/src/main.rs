use std::process::ExitCode;

use hangar_config::ConfigError;

fn main() -> ExitCode {
    let error = match hangard::run() {
        Ok(_cause) => return ExitCode::SUCCESS,
        Err(error) => error,
    };
    match error.config_error() {
        Some(config_error) => {
            let ConfigError::Invalid(usage) = config_error;
            let _ = usage.print();
            if config_error.is_informational() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
        None => {
            eprintln!("hangard: {error}");
            ExitCode::FAILURE
        }
    }
}
