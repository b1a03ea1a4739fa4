use crate::config::GatewayConfig;
use crate::constants::search::{BUCKET, DEFAULT_SIZE, FACET_BUCKETS};
use crate::services::transport::OutboundRequest;
use crate::tools::SearchArgs;
use serde_json::{json, Map, Value};

#[derive(Debug, Clone)]
pub struct SearchPlan {
    pub request: OutboundRequest,
    pub from: u64,
    pub effective_size: u64,
    pub with_facets: bool,
}

pub fn search_url(config: &GatewayConfig) -> String {
    config.api_url("search/records/_search")
}

pub fn effective_size(requested: Option<u64>, max: u64) -> u64 {
    requested.unwrap_or(DEFAULT_SIZE.min(max)).min(max)
}

/// Anything that does not start with "desc" (any case) sorts ascending.
pub fn normalize_sort_order(raw: Option<&str>) -> &'static str {
    match raw {
        Some(order) if order.trim().to_lowercase().starts_with("desc") => "desc",
        _ => "asc",
    }
}

pub fn build_search_body(args: &SearchArgs, from: u64, size: u64) -> Value {
    let mut body = Map::new();
    body.insert("from".to_string(), json!(from));
    body.insert("size".to_string(), json!(size));

    if let Some(text) = args.query.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        body.insert(
            "query".to_string(),
            json!({ "query_string": { "query": text, "default_operator": "AND" } }),
        );
    }

    let facets = args
        .facets
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>();
    if !facets.is_empty() {
        let mut aggs = Map::new();
        for facet in facets {
            aggs.insert(
                facet.to_string(),
                json!({ "terms": { "field": facet, "size": FACET_BUCKETS } }),
            );
        }
        body.insert("aggs".to_string(), Value::Object(aggs));
    }

    if let Some(field) = args.sort_by.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
        let order = normalize_sort_order(args.sort_order.as_deref());
        body.insert("sort".to_string(), json!([{ field: { "order": order } }]));
    }

    Value::Object(body)
}

pub fn shape_search(config: &GatewayConfig, args: &SearchArgs) -> SearchPlan {
    let from = args.from.unwrap_or(0);
    let effective_size = effective_size(args.size, config.max_search_size());
    let body = build_search_body(args, from, effective_size);
    let request = OutboundRequest::post(search_url(config))
        .with_query("bucket", BUCKET)
        .with_accept("application/json")
        .with_json(body);
    SearchPlan {
        request,
        from,
        effective_size,
        with_facets: args.facets.iter().any(|f| !f.trim().is_empty()),
    }
}

/// `hits.total` is `{value, relation}` on current indexes and a bare number on
/// older ones.
pub fn total_hits(body: &Value) -> u64 {
    let total = body.get("hits").and_then(|h| h.get("total"));
    total
        .and_then(|t| t.get("value"))
        .and_then(|v| v.as_u64())
        .or_else(|| total.and_then(|t| t.as_u64()))
        .unwrap_or(0)
}

pub fn format_search_response(body: &Value, plan: &SearchPlan) -> Value {
    let total = total_hits(body);
    let items = body
        .get("hits")
        .and_then(|h| h.get("hits"))
        .and_then(|h| h.as_array())
        .map(|hits| {
            hits.iter()
                .take(plan.effective_size as usize)
                .cloned()
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    let returned = items.len();

    let mut out = Map::new();
    out.insert("total".to_string(), json!(total));
    out.insert("from".to_string(), json!(plan.from));
    out.insert("returned".to_string(), json!(returned));
    if total > plan.effective_size {
        out.insert(
            "notice".to_string(),
            Value::String(format!(
                "Results limited to {} of {} total matches. Use 'from' to page through the remaining results.",
                returned, total
            )),
        );
    }
    out.insert("items".to_string(), Value::Array(items));
    if plan.with_facets {
        if let Some(aggs) = body.get("aggregations") {
            out.insert("aggregations".to_string(), aggs.clone());
        }
    }
    Value::Object(out)
}
