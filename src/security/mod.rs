pub mod password;
pub mod sanitize;

pub use password::PasswordHasher;
pub use sanitize::{Safelist, Sanitizer};
