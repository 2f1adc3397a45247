//! Outbound integrations: payment gateway, email.
pub mod email;
pub mod payments;
