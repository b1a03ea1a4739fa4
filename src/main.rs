#[tokio::main]
async fn main() {
    if let Err(err) = geonetwork_mcp::mcp::server::run_stdio().await {
        eprintln!("geonetwork-mcp: {}", err);
        if let Some(hint) = err.hint.as_deref() {
            eprintln!("hint: {}", hint);
        }
        std::process::exit(1);
    }
}
