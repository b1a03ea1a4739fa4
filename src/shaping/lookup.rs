use crate::config::GatewayConfig;
use crate::constants::search::BUCKET;
use crate::errors::ToolError;
use crate::services::transport::OutboundRequest;
use crate::shaping::record_url;
use crate::shaping::search::search_url;
use serde_json::{json, Value};

/// Exact match on the internal id, tried as the raw field, the keyword
/// sub-field, and the document `_id`.
pub fn build_lookup_query(id: &str) -> Value {
    json!({
        "from": 0,
        "size": 1,
        "query": {
            "bool": {
                "should": [
                    { "term": { "id": id } },
                    { "term": { "id.keyword": id } },
                    { "ids": { "values": [id] } }
                ],
                "minimum_should_match": 1
            }
        }
    })
}

pub fn shape_index_lookup(config: &GatewayConfig, id: &str) -> OutboundRequest {
    OutboundRequest::post(search_url(config))
        .with_query("bucket", BUCKET)
        .with_accept("application/json")
        .with_json(build_lookup_query(id))
}

pub fn shape_direct_fetch(config: &GatewayConfig, id: &str) -> Result<OutboundRequest, ToolError> {
    Ok(OutboundRequest::get(record_url(config, id, &[])?).with_accept("application/json"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupHit {
    pub uuid: String,
    pub title: Option<String>,
}

pub fn parse_lookup_hit(body: &Value) -> Option<LookupHit> {
    let hit = body
        .get("hits")
        .and_then(|h| h.get("hits"))
        .and_then(|h| h.as_array())
        .and_then(|hits| hits.first())?;
    let source = hit.get("_source");
    let uuid = source
        .and_then(|s| s.get("uuid"))
        .or_else(|| hit.get("_id"))
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())?
        .to_string();
    let title = source
        .and_then(|s| s.get("resourceTitleObject"))
        .and_then(|t| t.get("default"))
        .and_then(|t| t.as_str())
        .map(|s| s.to_string());
    Some(LookupHit { uuid, title })
}

/// Direct fetches return the record document; its uuid sits under a few
/// different keys depending on the endpoint version.
pub fn parse_direct_record(body: &Value) -> Option<String> {
    ["uuid", "metadataUuid"]
        .iter()
        .find_map(|key| body.get(*key).and_then(|v| v.as_str()))
        .or_else(|| {
            body.get("geonet:info")
                .and_then(|info| info.get("uuid"))
                .and_then(|v| v.as_str())
        })
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

pub fn found_payload(id: &str, uuid: &str, title: Option<&str>, source: &str) -> Value {
    json!({
        "found": true,
        "id": id,
        "uuid": uuid,
        "title": title,
        "source": source,
    })
}

pub fn not_found_payload(id: &str) -> Value {
    json!({
        "found": false,
        "id": id,
        "message": format!(
            "No record with internal id {} was found. Newly created records can take a moment to reach the search index; retry shortly.",
            id
        ),
    })
}
