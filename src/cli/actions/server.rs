use crate::auth::AuthConfig;
use crate::cli::actions::Action;
use crate::kunci::new;
use anyhow::{Context, Result};
use tracing::info;
use url::Url;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            store_url,
            max_fails,
            lock_seconds,
        } => {
            // Validate early; log host only, the URL may carry credentials.
            let url = Url::parse(&store_url).context("Invalid store URL")?;
            info!(
                host = url.host_str().unwrap_or("localhost"),
                "Using account store"
            );

            let config = AuthConfig::new()
                .with_max_fails(max_fails)
                .with_lock_seconds(lock_seconds);

            new(port, &store_url, &config).await?;
        }
    }

    Ok(())
}
