// SPDX-License-Identifier: Apache-2.0

use crate::dto::{OrderDto, ProductDto};
use pluggin_model::{Order, Product, ProductCategory};

#[must_use]
pub fn product_dto(product: &Product) -> ProductDto {
    ProductDto {
        id: product.id,
        name: product.name.clone(),
        price: product.price.minor_units(),
        image: product.image.clone(),
        quantity: product.quantity,
        is_sold_out: product.is_sold_out,
        discount_percentage: product.discount_percentage,
        is_on_sale: product.is_on_sale,
        category: product.category.map(|c: ProductCategory| c.as_str().to_string()),
        created_at: product.created_at,
    }
}

#[must_use]
pub fn order_dto(order: &Order) -> OrderDto {
    OrderDto {
        id: order.id,
        product_id: order.product_id,
        quantity: order.quantity,
        total_price: order.total_price.minor_units(),
        customer_name: order.customer_name.clone(),
        user_id: order.user_id.clone(),
        status: order.status.as_str().to_string(),
        created_at: order.created_at,
    }
}
