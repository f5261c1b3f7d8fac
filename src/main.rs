use clap::Parser;
use deploykit::cli::Cli;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    cli.init_logging()?;

    // Execute command
    cli.execute()?;

    Ok(())
}
