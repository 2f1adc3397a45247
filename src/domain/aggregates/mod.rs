//! Aggregates module
pub mod cart;
pub mod order;
pub mod product;

pub use cart::{Cart, CartError, CartLine};
pub use order::{Order, OrderError, OrderStatus, PaymentMethod, Purchase};
pub use product::{Product, ProductError, Variant};
