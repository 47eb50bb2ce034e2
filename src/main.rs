use clap::Parser;
use daypick::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
