#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use risk_schedule::{Project, http_api, load_project_from_json};

    let addr: SocketAddr = std::env::var("RISK_SCHEDULE_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;

    let project = match std::env::var("RISK_SCHEDULE_PROJECT") {
        Ok(path) => load_project_from_json(&path)?,
        Err(_) => Project::new(),
    };

    println!("risk-schedule HTTP API listening on http://{addr}");
    http_api::serve(addr, project).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
