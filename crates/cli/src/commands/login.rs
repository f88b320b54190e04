use nai::NaiClient;
use tracing::info;

use crate::cli::{ConnectionArgs, CredentialArgs};
use crate::error::Result;

pub async fn execute(credentials: &CredentialArgs, connection: &ConnectionArgs) -> Result<()> {
    info!(target = "nai", user = %credentials.username, "requesting access token");

    let client = NaiClient::with_config(credentials.credentials(), connection.config());
    let token = client.access_token().await?;

    println!("{token}");
    Ok(())
}
