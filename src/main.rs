use clap::Parser;
use barsim::cli::{run, Cli};
use env_logger::{Builder, Env};

fn main() -> std::process::ExitCode {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
    run(Cli::parse())
}
