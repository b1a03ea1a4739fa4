use crate::config::GatewayConfig;
use crate::constants::schema::{
    ISO19115_3_MARKERS, ISO19115_3_TITLE_XPATH, ISO19139_MARKERS, ISO19139_TITLE_XPATH,
};
use crate::errors::ToolError;
use crate::services::transport::OutboundRequest;
use crate::shaping::record_url;

/// The two mutually exclusive ISO dialects a record can be stored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVariant {
    Iso19139,
    Iso19115Part3,
}

impl SchemaVariant {
    /// Looks for a namespace-qualified root marker. The newer dialect is
    /// checked first because its documents may still reference gmd/gco.
    pub fn detect(content: &str) -> Option<Self> {
        if ISO19115_3_MARKERS.iter().any(|m| content.contains(m)) {
            return Some(SchemaVariant::Iso19115Part3);
        }
        if ISO19139_MARKERS.iter().any(|m| content.contains(m)) {
            return Some(SchemaVariant::Iso19139);
        }
        None
    }

    pub fn detect_or_default(content: Option<&str>) -> Self {
        content
            .and_then(Self::detect)
            .unwrap_or(SchemaVariant::Iso19115Part3)
    }

    pub fn title_xpath(self) -> &'static str {
        match self {
            SchemaVariant::Iso19139 => ISO19139_TITLE_XPATH,
            SchemaVariant::Iso19115Part3 => ISO19115_3_TITLE_XPATH,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SchemaVariant::Iso19139 => "iso19139",
            SchemaVariant::Iso19115Part3 => "iso19115-3",
        }
    }
}

pub fn shape_schema_probe(config: &GatewayConfig, uuid: &str) -> Result<OutboundRequest, ToolError> {
    Ok(OutboundRequest::get(record_url(config, uuid, &["formatters", "xml"])?)
        .with_accept("application/xml"))
}
