use std::process;

fn main() {
    match hype_cli::run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("hype: {err:#}");
            process::exit(hype_cli::ExitCode::Failure as i32);
        }
    }
}
