use axum::{http::StatusCode, response::Html, routing::get, Router};

const INDEX: &str = "<!DOCTYPE html>\n\
<html>\n\
<head><title>nqbot</title></head>\n\
<body>\n\
  <h1>nqbot</h1>\n\
  <p>Number queue bot is running.</p>\n\
</body>\n\
</html>\n";

async fn index() -> Html<&'static str> {
    Html(INDEX)
}

async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

pub async fn serve(port: u16) -> anyhow::Result<()> {
    let app = Router::new()
        .route("/", get(index))
        .route("/health", get(health_check));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "health server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
