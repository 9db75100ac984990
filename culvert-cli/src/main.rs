//! Culvert CLI - size stream-crossing culverts and manage field cards.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "culvert-cli",
    version,
    about = "Culvert sizing for forestry stream crossings"
)]
struct Cli {
    #[command(subcommand)]
    command: culvert_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("[Culvert] cli: {:?}", cli.command);
    culvert_cmd::run(cli.command)
}
