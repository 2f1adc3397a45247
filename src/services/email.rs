//! Confirmation email over SMTP.
//!
//! Delivery is best-effort: the webhook handler logs and swallows send
//! failures, the order stays completed.

use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SmtpConfig;
use crate::domain::value_objects::Money;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),
    #[error("Invalid email address: {0}")]
    InvalidAddress(#[from] lettre::address::AddressError),
}

#[derive(Clone)]
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl Mailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, lettre::transport::smtp::Error> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();
        Ok(Self { transport, from_address: config.from_address.clone() })
    }

    pub async fn send_order_confirmation(
        &self,
        to: &str,
        order_id: Uuid,
        details: &str,
        amount: &Money,
    ) -> Result<(), EmailError> {
        let message = Message::builder()
            .from(self.from_address.parse()?)
            .to(to.parse()?)
            .subject("Payment Confirmation - Electech")
            .header(ContentType::TEXT_PLAIN)
            .body(confirmation_body(order_id, details, amount))?;
        self.transport.send(message).await?;
        Ok(())
    }
}

fn confirmation_body(order_id: Uuid, details: &str, amount: &Money) -> String {
    let id = order_id.simple().to_string();
    // Short order reference, like the one shown on the orders page.
    let short_ref = &id[id.len() - 6..];
    format!(
        "Thank you for your purchase!\n\n\
         Order Details:\n\
         - Order ID: {short_ref}\n\
         {details}\n\
         - Total: {} {}\n\n\
         Your order is now available in your orders page.\n\
         Thank you for shopping with Electech!",
        amount.currency(),
        amount.amount(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn confirmation_body_lists_reference_and_total() {
        let order_id = Uuid::new_v4();
        let amount = Money::new(Decimal::new(49900, 2), "INR");
        let body = confirmation_body(order_id, "- Product: Headphones (black)", &amount);
        assert!(body.contains("INR 499.00"));
        assert!(body.contains("- Product: Headphones (black)"));
        let id = order_id.simple().to_string();
        assert!(body.contains(&id[id.len() - 6..]));
    }
}
