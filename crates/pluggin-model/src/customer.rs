use crate::product::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const EMAIL_MAX_LEN: usize = 254;
pub const CUSTOMER_NAME_MAX_LEN: usize = 120;
const ADDRESS_FIELD_MAX_LEN: usize = 300;
const PHONE_MAX_LEN: usize = 20;

pub fn parse_email(input: &str) -> Result<EmailAddress, ValidationError> {
    EmailAddress::parse(input)
}

/// A normalized (trimmed, lowercased) email address. Normalization happens
/// at the boundary so OTP lookups, role grants and subscriber uniqueness all
/// agree on one spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
#[non_exhaustive]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim().to_ascii_lowercase();
        if s.is_empty() {
            return Err(ValidationError("email must not be empty".to_string()));
        }
        if s.len() > EMAIL_MAX_LEN {
            return Err(ValidationError(format!(
                "email exceeds max length {EMAIL_MAX_LEN}"
            )));
        }
        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ValidationError(
                "email must not contain whitespace or control characters".to_string(),
            ));
        }
        let Some((local, domain)) = s.split_once('@') else {
            return Err(ValidationError("email must contain '@'".to_string()));
        };
        if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.contains("..")
        {
            return Err(ValidationError(format!("malformed email address: {s}")));
        }
        Ok(Self(s))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for EmailAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display name attached to an order. Free-form, but never empty and never
/// control characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[non_exhaustive]
pub struct CustomerName(String);

impl CustomerName {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let s = input.trim();
        if s.is_empty() {
            return Err(ValidationError("customer name must not be empty".to_string()));
        }
        if s.len() > CUSTOMER_NAME_MAX_LEN {
            return Err(ValidationError(format!(
                "customer name exceeds max length {CUSTOMER_NAME_MAX_LEN}"
            )));
        }
        if s.chars().any(char::is_control) {
            return Err(ValidationError(
                "customer name must not contain control characters".to_string(),
            ));
        }
        Ok(Self(s.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CustomerName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim() {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            other => Err(ValidationError(format!("unknown role: {other}"))),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

/// A stored shipping address, one-to-one with the order it ships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShippingAddress {
    pub id: i64,
    pub order_id: i64,
    pub name: String,
    pub email: EmailAddress,
    pub phone: Option<String>,
    pub address: String,
    pub city: String,
    pub zip_code: String,
    pub created_at: i64,
}

/// Validated shipping-address input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingAddressDraft {
    pub order_id: i64,
    pub name: String,
    pub email: EmailAddress,
    pub phone: Option<String>,
    pub address: String,
    pub city: String,
    pub zip_code: String,
}

impl ShippingAddressDraft {
    #[allow(clippy::too_many_arguments)]
    pub fn parse(
        order_id: i64,
        name: &str,
        email: &str,
        phone: Option<&str>,
        address: &str,
        city: &str,
        zip_code: &str,
    ) -> Result<Self, ValidationError> {
        if order_id <= 0 {
            return Err(ValidationError(format!(
                "order id must be positive, got {order_id}"
            )));
        }
        let name = required_field("name", name, CUSTOMER_NAME_MAX_LEN)?;
        let email = EmailAddress::parse(email)?;
        let address = required_field("address", address, ADDRESS_FIELD_MAX_LEN)?;
        let city = required_field("city", city, ADDRESS_FIELD_MAX_LEN)?;
        let zip_code = required_field("zip code", zip_code, 32)?;
        let phone = match phone.map(str::trim).filter(|p| !p.is_empty()) {
            None => None,
            Some(p) => {
                if p.len() > PHONE_MAX_LEN
                    || !p.chars().all(|c| c.is_ascii_digit() || c == '+' || c == ' ' || c == '-')
                {
                    return Err(ValidationError(format!("malformed phone number: {p}")));
                }
                Some(p.to_string())
            }
        };
        Ok(Self {
            order_id,
            name,
            email,
            phone,
            address,
            city,
            zip_code,
        })
    }
}

fn required_field(label: &str, value: &str, max_len: usize) -> Result<String, ValidationError> {
    let v = value.trim();
    if v.is_empty() {
        return Err(ValidationError(format!("{label} must not be empty")));
    }
    if v.len() > max_len {
        return Err(ValidationError(format!("{label} exceeds max length {max_len}")));
    }
    Ok(v.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewsletterSubscriber {
    pub id: i64,
    pub email: EmailAddress,
    pub created_at: i64,
}

/// An authenticated identity created on first OTP verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Profile {
    pub id: String,
    pub email: EmailAddress,
    pub username: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_parse_normalizes_case_and_whitespace() {
        let e = EmailAddress::parse("  Buyer@Example.COM ").expect("email");
        assert_eq!(e.as_str(), "buyer@example.com");
    }

    #[test]
    fn email_parse_rejects_malformed_addresses() {
        for raw in ["", "no-at-sign", "@x.com", "a@", "a@nodot", "a b@x.com", "a@x..com"] {
            assert!(EmailAddress::parse(raw).is_err(), "accepted {raw:?}");
        }
    }

    #[test]
    fn customer_name_rejects_empty_and_control() {
        assert!(CustomerName::parse("   ").is_err());
        assert!(CustomerName::parse("a\nb").is_err());
        assert_eq!(CustomerName::parse(" Jean Luc ").expect("name").as_str(), "Jean Luc");
    }

    #[test]
    fn role_round_trips() {
        assert_eq!(Role::parse("admin").expect("role"), Role::Admin);
        assert_eq!(Role::parse("user").expect("role"), Role::User);
        assert!(Role::parse("root").is_err());
    }

    #[test]
    fn shipping_draft_validates_fields() {
        let ok = ShippingAddressDraft::parse(
            5,
            "Ada",
            "ada@example.com",
            Some("+250 788 123 456"),
            "12 Main St",
            "Kigali",
            "00000",
        );
        assert!(ok.is_ok());
        assert!(ShippingAddressDraft::parse(0, "Ada", "a@x.com", None, "s", "c", "z").is_err());
        assert!(ShippingAddressDraft::parse(5, "", "a@x.com", None, "s", "c", "z").is_err());
        assert!(
            ShippingAddressDraft::parse(5, "Ada", "a@x.com", Some("call-me!"), "s", "c", "z")
                .is_err()
        );
        let blank_phone =
            ShippingAddressDraft::parse(5, "Ada", "a@x.com", Some("  "), "s", "c", "z")
                .expect("draft");
        assert_eq!(blank_phone.phone, None);
    }
}
