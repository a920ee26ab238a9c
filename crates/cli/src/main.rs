use std::process::ExitCode;

fn main() -> ExitCode {
    tourfare_cli::run()
}
