mod auth;
mod health_check;

pub use auth::{delete_profile, get_current_user, login, refresh, sign_up};
pub use health_check::health_check;
