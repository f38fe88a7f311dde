mod cli;
mod logging;

use anyhow::Result;
use clap::Parser; // needed for Cli::parse()
use tokio::runtime::Runtime;

use cli::commands::run_cli;
use cli::opts::Cli;

fn main() -> Result<()> {
    let args = Cli::parse();
    logging::init_tracing(args.verbose);

    let rt = Runtime::new()?;
    rt.block_on(run_cli(args))
}
