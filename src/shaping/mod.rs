//! Request shaping: pure functions from typed tool arguments to the exact
//! `OutboundRequest` the catalogue expects, plus the matching response
//! reshaping. Nothing in here touches the network.

pub mod duplicate;
pub mod edit;
pub mod lookup;
pub mod records;
pub mod schema;
pub mod search;

use crate::config::GatewayConfig;
use crate::errors::ToolError;
use url::Url;

/// Builds `<api>/records/<uuid>/<suffix..>` with the uuid percent-encoded as a
/// single path segment.
pub(crate) fn record_url(
    config: &GatewayConfig,
    uuid: &str,
    suffix: &[&str],
) -> Result<String, ToolError> {
    let uuid = uuid.trim();
    if uuid.is_empty() {
        return Err(ToolError::invalid_params("uuid must be a non-empty string"));
    }
    let mut url = Url::parse(&config.api_url("records"))
        .map_err(|_| ToolError::internal("Invalid catalogue API URL"))?;
    url.path_segments_mut()
        .map_err(|_| ToolError::internal("Catalogue API URL cannot carry a path"))?
        .push(uuid)
        .extend(suffix);
    Ok(url.to_string())
}
