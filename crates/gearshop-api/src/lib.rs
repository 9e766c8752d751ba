#![forbid(unsafe_code)]
//! Wire contracts for the gearshop HTTP surface.
//!
//! The server crate depends on this for everything a client can observe:
//! error codes, their HTTP status mapping, and request payload validation.

mod error_mapping;
mod errors;
mod params;

pub use error_mapping::map_error;
pub use errors::{ApiError, ApiErrorCode};
pub use params::{
    parse_order_id, validate_create_order, validate_rating, CreateOrderRequest, OrderIntent,
    RatingRequest,
};

pub const CRATE_NAME: &str = "gearshop-api";
