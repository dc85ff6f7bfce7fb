mod admin;
mod auth;
mod catalog;
mod progress;
mod user;

pub use admin::admin_routes;
pub use auth::auth_routes;
pub use catalog::catalog_routes;
pub use progress::progress_routes;
pub use user::user_routes;
