#![forbid(unsafe_code)]

mod convert;
mod dto;
mod error_mapping;
mod errors;

pub use convert::{order_dto, product_dto};
pub use dto::{
    AdminOrderDto, CheckoutItemDto, CheckoutRequestDto, CheckoutResponseDto,
    NewsletterSubscribeDto, OrderDto, OrderStatusUpdateDto, OtpSendRequestDto,
    OtpVerifyRequestDto, OtpVerifyResponseDto, ProductDto, ProductUpsertDto, SessionDto,
    ShippingAddressRequestDto, ShippingAddressResponseDto, SubscribeResponseDto, UserDto,
};
pub use error_mapping::{map_error_status, ApiErrorMapping};
pub use errors::{ApiError, ApiErrorCode};

pub const CRATE_NAME: &str = "pluggin-api";
pub const API_VERSION: &str = "v1";
