use std::process::ExitCode;

fn main() -> ExitCode {
    codelabel::cli::run_finder(std::env::args().skip(1))
}
