#![forbid(unsafe_code)]
//! Commerce model SSOT.
//!
//! ```compile_fail
//! use pluggin_model::OrderStatus;
//!
//! fn exhaustive_match(s: OrderStatus) -> &'static str {
//!     match s {
//!         OrderStatus::Pending => "p",
//!         OrderStatus::Processing => "pr",
//!         OrderStatus::Completed => "c",
//!     }
//! }
//! ```

mod customer;
mod money;
mod order;
mod product;

pub use customer::{
    parse_email, CustomerName, EmailAddress, NewsletterSubscriber, Profile, Role,
    ShippingAddress, ShippingAddressDraft, CUSTOMER_NAME_MAX_LEN, EMAIL_MAX_LEN,
};
pub use money::{Price, PRICE_MAX_MINOR_UNITS};
pub use order::{LineItem, Order, OrderStatus, LINE_ITEM_MAX_QUANTITY};
pub use product::{
    derive_sold_out, Product, ProductCategory, ProductDraft, ValidationError,
    PRODUCT_NAME_MAX_LEN,
};

pub const CRATE_NAME: &str = "pluggin-model";
