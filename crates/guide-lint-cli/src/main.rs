use std::process;

fn main() {
    match guide_lint_cli::run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("guide-lint error: {err:#}");
            process::exit(2);
        }
    }
}
