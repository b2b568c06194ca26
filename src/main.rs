use clap::Parser;
use zrevert::cli::{Cli, init_logging, run};

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);
    run(cli)
}
