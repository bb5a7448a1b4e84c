use crate::money::Price;
use crate::product::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Ceiling on a single line item's quantity. Keeps `price * quantity` exact
/// (see [`crate::PRICE_MAX_MINOR_UNITS`]) and rejects obviously hostile
/// carts before they reach the store.
pub const LINE_ITEM_MAX_QUANTITY: u32 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ValidationError(format!("unknown order status: {other}"))),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One committed order row. An order references exactly one product;
/// multi-item carts become N orders sharing a checkout batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Order {
    pub id: i64,
    /// `None` only for historical rows whose product was later deleted.
    pub product_id: Option<i64>,
    pub quantity: u32,
    /// Price captured at the moment of purchase; later catalog price edits
    /// never rewrite it.
    pub total_price: Price,
    pub customer_name: String,
    pub user_id: Option<String>,
    pub status: OrderStatus,
    pub created_at: i64,
}

/// One `(product, quantity, unit price)` triple of a checkout batch, already
/// validated: quantity positive and bounded, price non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineItem {
    product_id: i64,
    quantity: u32,
    unit_price: Price,
}

impl LineItem {
    pub fn parse(
        product_id: i64,
        quantity: i64,
        unit_price_minor_units: i64,
    ) -> Result<Self, ValidationError> {
        if product_id <= 0 {
            return Err(ValidationError(format!(
                "product id must be positive, got {product_id}"
            )));
        }
        if quantity <= 0 {
            return Err(ValidationError(format!(
                "quantity must be a positive integer, got {quantity}"
            )));
        }
        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|q| *q <= LINE_ITEM_MAX_QUANTITY)
            .ok_or_else(|| {
                ValidationError(format!(
                    "quantity exceeds maximum of {LINE_ITEM_MAX_QUANTITY}"
                ))
            })?;
        let unit_price = Price::from_minor_units(unit_price_minor_units)?;
        Ok(Self {
            product_id,
            quantity,
            unit_price,
        })
    }

    #[must_use]
    pub fn product_id(self) -> i64 {
        self.product_id
    }

    #[must_use]
    pub fn quantity(self) -> u32 {
        self.quantity
    }

    #[must_use]
    pub fn unit_price(self) -> Price {
        self.unit_price
    }

    /// `unit_price * quantity`; exact under the parse bounds.
    pub fn total_price(self) -> Result<Price, ValidationError> {
        self.unit_price.line_total(self.quantity)
    }
}
