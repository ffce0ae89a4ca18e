mod auth;
mod health_check;
mod posts;

pub use auth::{get_current_user, login, logout, refresh, register};
pub use health_check::health_check;
pub use posts::{create_post, delete_post, get_all_posts, get_post, update_post};
