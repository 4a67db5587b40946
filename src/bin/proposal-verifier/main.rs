pub mod cli;
pub mod commands;

use proposal_verifier::errors::Result;
use tracing_subscriber::filter::Directive;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let directive = "proposal_verifier=info"
        .parse::<Directive>()
        .map_err(anyhow::Error::from)?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .compact()
        .with_file(false)
        .with_line_number(false)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_cli_args();
    let config = args.verifier_config()?;

    if let Err(e) = commands::run(args.command, &config).await {
        tracing::error!(error = %e, "Command failed");
        return Err(e);
    }

    Ok(())
}
