mod env;
mod extract;
mod global_state;
mod middleware;
mod response;
mod utils;
mod routes;

use axum::Router;

pub use routes::{
    admin_routes,
    auth_routes,
    catalog_routes,
    progress_routes,
    user_routes,
};

pub use env::ApiServerEnv;
pub use global_state::GlobalState;
pub use utils::setup_tracing;
pub use middleware::{authenticate, admin_only, AuthUser};
pub use response::{AppError, AppSuccess, GenericResponse};
pub use extract::JsonBody;

/// Every route, mounted under `/api`, with state applied.
pub fn api_router(state: GlobalState) -> Router {
    let api = Router::new()
        .merge(auth_routes(&state))
        .merge(catalog_routes())
        .merge(progress_routes(&state))
        .merge(user_routes(&state))
        .merge(admin_routes(&state));

    Router::new()
        .nest("/api", api)
        .with_state(state)
}
