use crate::config::GatewayConfig;
use crate::errors::ToolError;
use crate::mcp::catalog::tool_catalog;
use crate::services::dispatcher::Dispatcher;
use crate::services::logger::Logger;
use crate::services::transport::{HttpTransport, ReqwestTransport};
use crate::tools::ToolId;
use std::sync::Arc;

pub struct App {
    pub logger: Logger,
    pub config: Arc<GatewayConfig>,
    pub dispatcher: Arc<Dispatcher>,
}

impl App {
    /// Every catalog entry must map to a `ToolId` and every `ToolId` must be
    /// listed, otherwise calls would be advertised but never dispatched.
    fn validate_tool_wiring() -> Result<(), ToolError> {
        let mut missing = Vec::new();
        for tool in tool_catalog().iter() {
            if ToolId::from_name(&tool.name).is_none() {
                missing.push(tool.name.clone());
            }
        }
        for id in ToolId::ALL {
            if !tool_catalog().iter().any(|tool| tool.name == id.name()) {
                missing.push(id.name().to_string());
            }
        }
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        Err(ToolError::internal("Tool wiring is incomplete")
            .with_hint(
                "This is a server wiring bug: tool_catalog.json and ToolId must list the same tools.",
            )
            .with_details(serde_json::json!({ "missing_tools": missing })))
    }

    pub fn initialize() -> Result<Self, ToolError> {
        let logger = Logger::new("geonetwork");
        let config = GatewayConfig::from_env()?;
        let transport = Arc::new(ReqwestTransport::new(logger.clone(), config.timeout_ms())?);
        Self::with_transport(logger, config, transport)
    }

    pub fn with_transport(
        logger: Logger,
        config: GatewayConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, ToolError> {
        Self::validate_tool_wiring()?;
        let config = Arc::new(config);
        logger.info(
            "catalogue gateway configured",
            Some(&serde_json::json!({
                "api": config.api_base(),
                "credentials": config.has_credentials(),
                "max_search_size": config.max_search_size(),
            })),
        );
        let dispatcher = Arc::new(Dispatcher::new(logger.clone(), config.clone(), transport));
        Ok(Self {
            logger,
            config,
            dispatcher,
        })
    }
}
