//! Delivery seam for issued temporary passwords.
//!
//! Actual delivery (email, chat, ...) lives outside this service; the default
//! implementation only records that a temp password was issued and never logs
//! the secret itself.

use tracing::info;

pub trait TempPasswordNotifier: Send + Sync {
    fn deliver(&self, email: &str, temp_password: &str);
}

pub struct LogNotifier;

impl TempPasswordNotifier for LogNotifier {
    fn deliver(&self, email: &str, _temp_password: &str) {
        info!(email, "temporary password issued, handing off for delivery");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_notifier_accepts_a_delivery() {
        // Smoke test: delivery must not panic and must not need a runtime.
        LogNotifier.deliver("jane@example.com", "secret");
    }
}
