use std::process::ExitCode;

fn main() -> ExitCode {
    brandlens_cli::run()
}
