use crate::config::GatewayConfig;
use crate::errors::ToolError;
use crate::services::transport::OutboundRequest;
use crate::shaping::record_url;

pub fn shape_get_record(
    config: &GatewayConfig,
    uuid: &str,
    approved: bool,
) -> Result<OutboundRequest, ToolError> {
    Ok(OutboundRequest::get(record_url(config, uuid, &[])?)
        .with_query("approved", approved.to_string())
        .with_accept("application/json"))
}

pub fn shape_export(config: &GatewayConfig, uuid: &str) -> Result<OutboundRequest, ToolError> {
    Ok(OutboundRequest::get(record_url(config, uuid, &["formatters", "xml"])?)
        .with_accept("application/xml"))
}

pub fn shape_list(config: &GatewayConfig, collection: &str) -> OutboundRequest {
    OutboundRequest::get(config.api_url(collection)).with_accept("application/json")
}

/// `PUT` adds, `DELETE` removes; the tag ids travel as the JSON body either way.
pub fn shape_tags(
    config: &GatewayConfig,
    uuid: &str,
    tag_ids: &[u64],
    add: bool,
) -> Result<OutboundRequest, ToolError> {
    if tag_ids.is_empty() {
        return Err(ToolError::invalid_params("tagIds must contain at least one id"));
    }
    let url = record_url(config, uuid, &["tags"])?;
    let request = if add {
        OutboundRequest::put(url)
    } else {
        OutboundRequest::delete(url)
    };
    Ok(request
        .with_accept("application/json")
        .with_json(serde_json::json!(tag_ids)))
}
