//! Entry point for the `schoolrun` command-line interface.
#![forbid(unsafe_code)]

#[expect(
    clippy::print_stderr,
    reason = "the binary reports fatal errors on stderr"
)]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    if let Err(err) = schoolrun_cli::run() {
        eprintln!("schoolrun: {err}");
        std::process::exit(1);
    }
}
