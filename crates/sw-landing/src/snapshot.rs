use sw_client::WrapperClient;
use sw_client::types::PublicConfig;
use tracing::debug;

/// Fetch the public config snapshot. Any failure yields `None` and the
/// landing page simply omits the section.
pub async fn fetch_public_config(client: &WrapperClient, url: &str) -> Option<PublicConfig> {
    match client.public_config_from(url).await {
        Ok(config) => Some(config),
        Err(e) => {
            debug!(url, "Live config not available: {e}");
            None
        }
    }
}
