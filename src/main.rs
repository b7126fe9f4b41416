use clap::Parser;

use profile_sync::cli::{self, Cli};
use profile_sync::logging::init_tracing;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let notices = cli::run(cli).await?;
    if notices > 0 {
        std::process::exit(1);
    }
    Ok(())
}
