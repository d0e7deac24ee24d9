//! Outbound transport adapters.
//!
//! A `Transport` delivers an ordered sequence of reply fragments to one
//! identity. The console transport backs the CLI; the WhatsApp adapter
//! is a stub around the provider API shape (in production it would call
//! the Twilio message endpoint per fragment).

use async_trait::async_trait;
use riad_config::WhatsappConfig;
use riad_core::conversation::UserId;
use riad_core::error::GatewayError;
use tracing::info;

#[async_trait]
pub trait Transport: Send + Sync {
    /// Transport name for logs and error messages.
    fn name(&self) -> &str;

    /// Deliver fragments in order. Callers guarantee no concurrent
    /// delivery for the same identity.
    async fn deliver(&self, user: &UserId, fragments: &[String]) -> Result<(), GatewayError>;
}

/// Prints replies to stdout — the CLI's transport.
pub struct ConsoleTransport;

#[async_trait]
impl Transport for ConsoleTransport {
    fn name(&self) -> &str {
        "console"
    }

    async fn deliver(&self, _user: &UserId, fragments: &[String]) -> Result<(), GatewayError> {
        for fragment in fragments {
            println!("\n🤖 {fragment}");
        }
        Ok(())
    }
}

/// WhatsApp transport adapter (stub).
///
/// In production this would POST each fragment to the provider's message
/// API with the configured credentials. Without credentials it logs the
/// send in simulation mode, like a dry run.
pub struct WhatsappTransport {
    config: WhatsappConfig,
}

impl WhatsappTransport {
    pub fn new(config: WhatsappConfig) -> Self {
        Self { config }
    }

    /// Allowlist check. Empty list = deny all, ["*"] = allow all.
    pub fn is_allowed(&self, number: &str) -> bool {
        if self.config.allowed_numbers.is_empty() {
            return false;
        }
        if self.config.allowed_numbers.iter().any(|n| n == "*") {
            return true;
        }
        self.config.allowed_numbers.iter().any(|n| n == number)
    }

    fn is_configured(&self) -> bool {
        self.config.account_sid.is_some()
            && self.config.auth_token.is_some()
            && self.config.from_number.is_some()
    }
}

#[async_trait]
impl Transport for WhatsappTransport {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn deliver(&self, user: &UserId, fragments: &[String]) -> Result<(), GatewayError> {
        if !self.is_allowed(&user.0) {
            return Err(GatewayError::DeliveryFailed {
                transport: "whatsapp".into(),
                reason: format!("recipient {user} not in allowlist"),
            });
        }

        for (i, fragment) in fragments.iter().enumerate() {
            if self.is_configured() {
                // In production: POST to the provider API here
                info!(
                    to = %user,
                    part = i + 1,
                    parts = fragments.len(),
                    chars = fragment.chars().count(),
                    "WhatsApp send (stub)"
                );
            } else {
                info!(to = %user, part = i + 1, "WhatsApp send simulated (no credentials)");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(allowed: Vec<String>) -> WhatsappConfig {
        WhatsappConfig {
            account_sid: Some("AC-test".into()),
            auth_token: Some("token".into()),
            from_number: Some("+14155238886".into()),
            allowed_numbers: allowed,
        }
    }

    #[test]
    fn allowlist_empty_denies() {
        let transport = WhatsappTransport::new(config(vec![]));
        assert!(!transport.is_allowed("+212600000001"));
    }

    #[test]
    fn allowlist_wildcard_allows_all() {
        let transport = WhatsappTransport::new(config(vec!["*".into()]));
        assert!(transport.is_allowed("+212600000001"));
    }

    #[test]
    fn allowlist_specific_numbers() {
        let transport = WhatsappTransport::new(config(vec!["+212600000001".into()]));
        assert!(transport.is_allowed("+212600000001"));
        assert!(!transport.is_allowed("+212600000002"));
    }

    #[tokio::test]
    async fn deliver_to_disallowed_number_fails() {
        let transport = WhatsappTransport::new(config(vec![]));
        let err = transport
            .deliver(&UserId::from("+212600000001"), &["salut".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::DeliveryFailed { .. }));
    }

    #[tokio::test]
    async fn deliver_stub_succeeds_for_allowed() {
        let transport = WhatsappTransport::new(config(vec!["*".into()]));
        transport
            .deliver(&UserId::from("+212600000001"), &["salut".into(), "ça va ?".into()])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn console_transport_delivers() {
        ConsoleTransport
            .deliver(&UserId::from("local"), &["salut".into()])
            .await
            .unwrap();
    }
}
