use std::process::ExitCode;

fn main() -> ExitCode {
    envconf_cli::run()
}
