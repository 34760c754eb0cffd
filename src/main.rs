use std::process::ExitCode;

fn main() -> ExitCode {
    match wurzel_rs::demo::registry() {
        Ok(registry) => wurzel_cli::main_with(&registry),
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
