use clap::Parser;
use leanbox::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
