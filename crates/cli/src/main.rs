use std::process::ExitCode;

fn main() -> ExitCode {
    sensorquote_cli::run()
}
