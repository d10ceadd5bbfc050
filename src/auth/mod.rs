//! User authentication: password hashing, private auth cookies, the log in
//! and registration pages, and the middleware that protects routes.

mod cookie;
mod forgot_password;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod register;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use forgot_password::get_forgot_password_page;
pub use log_in::{get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{AuthState, auth_guard, auth_guard_hx};
pub use password::{PasswordHash, ValidatedPassword};
pub use register::{get_register_page, register_user};
