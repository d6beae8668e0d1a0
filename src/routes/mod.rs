mod auth;
mod health_check;
mod heroes;

pub use auth::{get_current_account, login, logout, refresh, register};
pub use health_check::health_check;
pub use heroes::{create_hero, delete_hero, get_hero, list_heroes, update_hero};
