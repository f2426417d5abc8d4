#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = OK, description = "Service is up", content_type = "text/plain", body = String)
    ))]
pub async fn index_handler() -> &'static str {
    "Weather Search: OK"
}
