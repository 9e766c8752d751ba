#![forbid(unsafe_code)]
//! Gearshop domain model.
//!
//! Everything here is plain data plus validation. No I/O, no async: the
//! store and server crates own those concerns.

mod cart;
mod order;
mod product;
mod rating;

pub use cart::{cart_total, validate_cart, Cart, CartError, CartLine};
pub use order::{Order, OrderId, OrderStatus, PaymentMethod};
pub use product::{Catalog, ParseError, Product, ProductId, ID_MAX_LEN, TITLE_MAX_LEN};
pub use rating::Rating;

pub const CRATE_NAME: &str = "gearshop-model";
