// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckoutItemDto {
    pub product_id: i64,
    pub quantity: i64,
    /// Unit price in minor currency units, as locked in the client's cart.
    pub price: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckoutRequestDto {
    pub items: Vec<CheckoutItemDto>,
    pub customer_name: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderDto {
    pub id: i64,
    pub product_id: Option<i64>,
    pub quantity: u32,
    pub total_price: i64,
    pub customer_name: String,
    pub user_id: Option<String>,
    pub status: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckoutResponseDto {
    pub success: bool,
    pub orders: Vec<OrderDto>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductDto {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub image: String,
    pub quantity: u32,
    pub is_sold_out: bool,
    pub discount_percentage: Option<u8>,
    pub is_on_sale: bool,
    pub category: Option<String>,
    pub created_at: i64,
}

/// Create/replace payload for the admin catalog surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductUpsertDto {
    pub name: String,
    pub price: i64,
    #[serde(default)]
    pub image: String,
    pub quantity: i64,
    #[serde(default)]
    pub discount_percentage: Option<i64>,
    #[serde(default)]
    pub is_on_sale: bool,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_sold_out: bool,
}

// No deny_unknown_fields here: serde forbids it alongside #[serde(flatten)].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminOrderDto {
    #[serde(flatten)]
    pub order: OrderDto,
    pub product_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderStatusUpdateDto {
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShippingAddressRequestDto {
    pub order_id: i64,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub address: String,
    pub city: String,
    pub zip_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShippingAddressResponseDto {
    pub success: bool,
    pub id: i64,
    pub order_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewsletterSubscribeDto {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubscribeResponseDto {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OtpSendRequestDto {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OtpVerifyRequestDto {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserDto {
    pub id: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionDto {
    pub token: String,
    pub expires_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OtpVerifyResponseDto {
    pub success: bool,
    pub user: UserDto,
    pub session: SessionDto,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_request_parses_the_documented_shape() {
        let raw = r#"{
            "items": [{"product_id": 3, "quantity": 2, "price": 45000}],
            "customer_name": "Ada",
            "user_id": "user-1"
        }"#;
        let req: CheckoutRequestDto = serde_json::from_str(raw).expect("parse");
        assert_eq!(req.items.len(), 1);
        assert_eq!(req.items[0].product_id, 3);
        assert_eq!(req.items[0].price, 45_000);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let raw = r#"{"email": "a@b.com", "extra": true}"#;
        assert!(serde_json::from_str::<OtpSendRequestDto>(raw).is_err());
    }

    #[test]
    fn upsert_defaults_optional_fields() {
        let raw = r#"{"name": "Tee", "price": 12000, "quantity": 3}"#;
        let dto: ProductUpsertDto = serde_json::from_str(raw).expect("parse");
        assert_eq!(dto.image, "");
        assert_eq!(dto.discount_percentage, None);
        assert!(!dto.is_on_sale);
        assert!(!dto.is_sold_out);
        assert_eq!(dto.category, None);
    }

    #[test]
    fn admin_order_flattens_order_fields() {
        let dto = AdminOrderDto {
            order: OrderDto {
                id: 1,
                product_id: Some(2),
                quantity: 1,
                total_price: 500,
                customer_name: "Ada".to_string(),
                user_id: None,
                status: "pending".to_string(),
                created_at: 0,
            },
            product_name: Some("Tee".to_string()),
        };
        let value = serde_json::to_value(&dto).expect("json");
        assert_eq!(value["id"], 1);
        assert_eq!(value["product_name"], "Tee");
    }
}
