mod dto;
pub mod handlers;
pub mod repo;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

// The original API parks period routes under the /expense prefix; the
// expense line items live one level deeper at /expense/items.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/expense/",
            get(handlers::list_periods).post(handlers::create_period),
        )
        .route(
            "/expense/:id",
            get(handlers::get_period)
                .patch(handlers::update_period)
                .delete(handlers::delete_period),
        )
}
