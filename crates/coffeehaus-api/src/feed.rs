use axum::Json;

use coffeehaus_types::api::HealthResponse;
use coffeehaus_types::feed::sample_posts;
use coffeehaus_types::models::Post;

pub async fn get_feed() -> Json<Vec<Post>> {
    Json(sample_posts())
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}
