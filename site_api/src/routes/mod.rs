mod accessibility;
mod blog;
mod cron;
mod health;
mod og;
mod quiz;
mod revalidate;

use axum::{
    Router,
    routing::{get, post},
};

use crate::AppState;

pub use cron::cron_authorized;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/tools/accessibility-test", post(accessibility::accessibility_test))
        .route("/api/cron/generate-blog", get(cron::generate_blog))
        .route("/api/blog", get(blog::list_posts))
        .route("/api/blog/{slug}", get(blog::get_post))
        .route("/api/og", get(og::og_image))
        .route("/api/quiz/scores", get(quiz::leaderboard).post(quiz::save_score))
        .route("/api/revalidate", post(revalidate::revalidate))
        .with_state(state)
}
