use std::time::Duration;

use nai::NaiClient;
use tracing::info;

use super::build_params;
use crate::cli::GenerateArgs;
use crate::error::Result;
use crate::output;

pub async fn execute(args: &GenerateArgs, verbose: bool) -> Result<()> {
    let params = build_params(&args.params)?;

    let client = NaiClient::with_config(args.credentials.credentials(), args.connection.config());
    client.init(args.connection.session_options()).await?;

    let result = client.generate(&params, args.host, verbose, args.opus).await;
    client.close(Some(Duration::ZERO)).await;
    let assets = result?;

    let paths = output::save_assets(&args.output, &assets)?;
    info!(target = "nai", count = paths.len(), dir = %args.output.display(), "images saved");
    for path in paths {
        println!("{}", path.display());
    }
    Ok(())
}
