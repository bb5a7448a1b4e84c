use crate::product::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Upper bound on a unit price, in minor currency units. Together with
/// [`crate::LINE_ITEM_MAX_QUANTITY`] this keeps every `price * quantity`
/// product inside `i64` without runtime overflow checks on the hot path.
pub const PRICE_MAX_MINOR_UNITS: i64 = 1_000_000_000_000;

/// An amount of money in minor currency units (e.g. cents). Never negative.
///
/// Stored and transmitted as a plain integer; float money does not exist in
/// this codebase.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    pub fn from_minor_units(minor: i64) -> Result<Self, ValidationError> {
        if minor < 0 {
            return Err(ValidationError("price must not be negative".to_string()));
        }
        if minor > PRICE_MAX_MINOR_UNITS {
            return Err(ValidationError(format!(
                "price exceeds maximum of {PRICE_MAX_MINOR_UNITS} minor units"
            )));
        }
        Ok(Self(minor))
    }

    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }

    #[must_use]
    pub fn minor_units(self) -> i64 {
        self.0
    }

    /// Unit price times a line quantity. The bounds enforced by
    /// [`Price::from_minor_units`] and line-item parsing make the
    /// multiplication exact; the checked form is kept as a hard stop against
    /// future bound changes.
    pub fn line_total(self, quantity: u32) -> Result<Self, ValidationError> {
        self.0
            .checked_mul(i64::from(quantity))
            .map(Self)
            .ok_or_else(|| ValidationError("line total overflows".to_string()))
    }
}

impl Display for Price {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
