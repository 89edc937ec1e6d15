use std::process::ExitCode;

fn main() -> ExitCode {
    codelabel::cli::run_labeler(std::env::args().skip(1))
}
