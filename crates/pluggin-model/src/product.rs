use crate::money::Price;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError(pub String);

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ValidationError {}

pub const PRODUCT_NAME_MAX_LEN: usize = 200;
const IMAGE_URL_MAX_LEN: usize = 2048;

/// Catalog categories. Fixed enumeration; `category` is optional on a
/// product because legacy rows predate categorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductCategory {
    Hoodie,
    Tee,
    Jacket,
    Pant,
    Skate,
}

impl ProductCategory {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "hoodie" => Ok(Self::Hoodie),
            "tee" => Ok(Self::Tee),
            "jacket" => Ok(Self::Jacket),
            "pant" => Ok(Self::Pant),
            "skate" => Ok(Self::Skate),
            other => Err(ValidationError(format!("unknown category: {other}"))),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hoodie => "hoodie",
            Self::Tee => "tee",
            Self::Jacket => "jacket",
            Self::Pant => "pant",
            Self::Skate => "skate",
        }
    }
}

impl Display for ProductCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sold-out is a derived flag: stock at zero always means sold out, and an
/// admin may additionally force the flag on while stock remains.
#[must_use]
pub fn derive_sold_out(quantity: u32, forced: bool) -> bool {
    quantity == 0 || forced
}

/// A catalog row. `quantity` is unsigned on purpose: stock below zero cannot
/// be represented, so the "never decrement below zero" rule is a type fact
/// here and a `CHECK` constraint in the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: Price,
    pub image: String,
    pub quantity: u32,
    pub is_sold_out: bool,
    pub discount_percentage: Option<u8>,
    pub is_on_sale: bool,
    pub category: Option<ProductCategory>,
    pub created_at: i64,
}

impl Product {
    /// Holds after every constructor and every store mutation.
    #[must_use]
    pub fn sold_out_flag_consistent(&self) -> bool {
        !(self.quantity == 0 && !self.is_sold_out)
    }
}

/// Validated input for creating or replacing a product. The stored
/// `is_sold_out` is re-derived from `quantity` and `force_sold_out` on every
/// write; a draft cannot clear the flag while stock is zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub price: Price,
    pub image: String,
    pub quantity: u32,
    pub discount_percentage: Option<u8>,
    pub is_on_sale: bool,
    pub category: Option<ProductCategory>,
    pub force_sold_out: bool,
}

impl ProductDraft {
    #[allow(clippy::too_many_arguments)]
    pub fn parse(
        name: &str,
        price_minor_units: i64,
        image: &str,
        quantity: i64,
        discount_percentage: Option<i64>,
        is_on_sale: bool,
        category: Option<&str>,
        force_sold_out: bool,
    ) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError("product name must not be empty".to_string()));
        }
        if name.len() > PRODUCT_NAME_MAX_LEN {
            return Err(ValidationError(format!(
                "product name exceeds max length {PRODUCT_NAME_MAX_LEN}"
            )));
        }
        let image = image.trim();
        if image.len() > IMAGE_URL_MAX_LEN {
            return Err(ValidationError(format!(
                "image url exceeds max length {IMAGE_URL_MAX_LEN}"
            )));
        }
        let price = Price::from_minor_units(price_minor_units)?;
        if quantity < 0 {
            return Err(ValidationError("quantity must not be negative".to_string()));
        }
        let quantity = u32::try_from(quantity)
            .map_err(|_| ValidationError("quantity out of range".to_string()))?;
        let discount_percentage = match discount_percentage {
            None => None,
            Some(pct) => {
                if !(0..=100).contains(&pct) {
                    return Err(ValidationError(
                        "discount percentage must be between 0 and 100".to_string(),
                    ));
                }
                Some(pct as u8)
            }
        };
        let category = match category {
            None => None,
            Some(raw) => Some(ProductCategory::parse(raw)?),
        };
        Ok(Self {
            name: name.to_string(),
            price,
            image: image.to_string(),
            quantity,
            discount_percentage,
            is_on_sale,
            category,
            force_sold_out,
        })
    }

    #[must_use]
    pub fn sold_out(&self) -> bool {
        derive_sold_out(self.quantity, self.force_sold_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(quantity: i64, force: bool) -> ProductDraft {
        ProductDraft::parse("Box Logo Hoodie", 45_000, "", quantity, None, false, None, force)
            .expect("draft")
    }

    #[test]
    fn category_parse_round_trips() {
        for raw in ["hoodie", "tee", "jacket", "pant", "skate"] {
            let parsed = ProductCategory::parse(raw).expect("category");
            assert_eq!(parsed.as_str(), raw);
        }
        assert!(ProductCategory::parse("sock").is_err());
    }

    #[test]
    fn category_parse_is_case_insensitive() {
        assert_eq!(
            ProductCategory::parse(" Hoodie ").expect("category"),
            ProductCategory::Hoodie
        );
    }

    #[test]
    fn sold_out_is_derived_from_stock_or_forced() {
        assert!(derive_sold_out(0, false));
        assert!(derive_sold_out(3, true));
        assert!(!derive_sold_out(3, false));
        assert!(draft(0, false).sold_out());
        assert!(draft(5, true).sold_out());
        assert!(!draft(5, false).sold_out());
    }

    #[test]
    fn draft_rejects_bad_inputs() {
        assert!(
            ProductDraft::parse("", 100, "", 1, None, false, None, false).is_err(),
            "empty name"
        );
        assert!(
            ProductDraft::parse("x", -1, "", 1, None, false, None, false).is_err(),
            "negative price"
        );
        assert!(
            ProductDraft::parse("x", 100, "", -1, None, false, None, false).is_err(),
            "negative quantity"
        );
        assert!(
            ProductDraft::parse("x", 100, "", 1, Some(101), false, None, false).is_err(),
            "discount above 100"
        );
        assert!(
            ProductDraft::parse("x", 100, "", 1, None, false, Some("sock"), false).is_err(),
            "unknown category"
        );
    }

    #[test]
    fn consistency_check_flags_zero_stock_without_flag() {
        let mut p = Product {
            id: 1,
            name: "Tee".to_string(),
            price: Price::from_minor_units(1000).expect("price"),
            image: String::new(),
            quantity: 0,
            is_sold_out: true,
            discount_percentage: None,
            is_on_sale: false,
            category: Some(ProductCategory::Tee),
            created_at: 0,
        };
        assert!(p.sold_out_flag_consistent());
        p.is_sold_out = false;
        assert!(!p.sold_out_flag_consistent());
        p.quantity = 2;
        assert!(p.sold_out_flag_consistent());
    }
}
