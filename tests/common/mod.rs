#![allow(dead_code)]

use async_trait::async_trait;
use geonetwork_mcp::config::GatewayConfig;
use geonetwork_mcp::errors::ToolError;
use geonetwork_mcp::services::dispatcher::Dispatcher;
use geonetwork_mcp::services::logger::{LogLevel, Logger};
use geonetwork_mcp::services::transport::{HttpResponse, HttpTransport, OutboundRequest};
use once_cell::sync::Lazy;
use reqwest::Method;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

pub static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub const API: &str = "http://catalogue.test/geonetwork/srv/api";

struct Route {
    method: Method,
    fragment: String,
    response: Result<HttpResponse, ToolError>,
}

/// Scripted transport: the first route whose method matches and whose
/// fragment occurs in the URL answers. Unmatched requests get a 404.
#[derive(Default)]
pub struct MockTransport {
    routes: StdMutex<Vec<Route>>,
    requests: StdMutex<Vec<OutboundRequest>>,
    calls: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: Method, fragment: &str, response: HttpResponse) -> &Self {
        self.routes.lock().unwrap().push(Route {
            method,
            fragment: fragment.to_string(),
            response: Ok(response),
        });
        self
    }

    pub fn fail(&self, method: Method, fragment: &str, error: ToolError) -> &Self {
        self.routes.lock().unwrap().push(Route {
            method,
            fragment: fragment.to_string(),
            response: Err(error),
        });
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, method: Method, fragment: &str) -> Vec<OutboundRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.url.contains(fragment))
            .collect()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: OutboundRequest) -> Result<HttpResponse, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let routes = self.routes.lock().unwrap();
        routes
            .iter()
            .find(|route| route.method == request.method && request.url.contains(&route.fragment))
            .map(|route| route.response.clone())
            .unwrap_or_else(|| Ok(HttpResponse::new(404, "no route")))
    }
}

pub fn quiet_logger() -> Logger {
    Logger::with_level("test", LogLevel::Error)
}

pub fn anonymous_config() -> GatewayConfig {
    GatewayConfig::new(API).unwrap()
}

pub fn privileged_config() -> GatewayConfig {
    anonymous_config().with_credentials("editor", "s3cret")
}

pub fn dispatcher(config: GatewayConfig, transport: Arc<MockTransport>) -> Dispatcher {
    Dispatcher::new(quiet_logger(), Arc::new(config), transport)
}

/// Successful sign-in: a redirect carrying the primary session cookie.
pub fn signin_redirect() -> HttpResponse {
    HttpResponse::new(302, "")
        .with_cookie("JSESSIONID=node0abc; Path=/geonetwork; HttpOnly")
}

/// Registers a working two-step login (sign-in, then the `/me` probe).
pub fn script_login(mock: &MockTransport) {
    mock.on(Method::POST, "/geonetwork/signin", signin_redirect());
    mock.on(
        Method::GET,
        "/srv/api/me",
        HttpResponse::new(200, "{}").with_cookie("SESSION=app123; Path=/geonetwork"),
    );
}

pub fn search_hits(count: usize, total: u64) -> HttpResponse {
    let hits: Vec<serde_json::Value> = (0..count)
        .map(|i| serde_json::json!({ "_id": format!("uuid-{}", i), "_source": { "uuid": format!("uuid-{}", i) } }))
        .collect();
    HttpResponse::new(
        200,
        serde_json::json!({ "hits": { "total": { "value": total, "relation": "eq" }, "hits": hits } })
            .to_string(),
    )
}
