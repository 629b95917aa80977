use axum::http::StatusCode;
use mock_server::MockOptions;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    // MOCK_ROOT_STATUS=503 simulates a reachable but failing server.
    let root_status = std::env::var("MOCK_ROOT_STATUS")
        .ok()
        .and_then(|code| code.parse::<u16>().ok())
        .and_then(|code| StatusCode::from_u16(code).ok())
        .unwrap_or(StatusCode::OK);

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    println!("release mock listening on {addr} (GET / -> {root_status})");
    mock_server::run_with(listener, MockOptions { root_status }).await
}
