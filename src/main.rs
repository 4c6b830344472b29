use std::process::ExitCode;

fn main() -> ExitCode {
    match tessera::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tessera::ui::output::error(format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
