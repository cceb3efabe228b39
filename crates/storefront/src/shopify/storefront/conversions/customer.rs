//! Customer type conversion functions.

use indecisive_wear_core::MoneyError;

use crate::shopify::types::{Customer, Order};

use super::super::responses::{RawCustomer, RawOrder};
use super::convert_money;

pub fn convert_customer(customer: RawCustomer) -> Result<Customer, MoneyError> {
    Ok(Customer {
        id: customer.id,
        email: customer.email,
        first_name: customer.first_name,
        last_name: customer.last_name,
        display_name: customer.display_name,
        orders: customer
            .orders
            .into_nodes()
            .into_iter()
            .map(convert_order)
            .collect::<Result<_, _>>()?,
    })
}

fn convert_order(order: RawOrder) -> Result<Order, MoneyError> {
    Ok(Order {
        id: order.id,
        name: order.name,
        processed_at: order.processed_at,
        financial_status: order.financial_status,
        fulfillment_status: order.fulfillment_status,
        total: convert_money(&order.total_price)?,
        item_count: order.line_items.into_nodes().iter().map(|i| i.quantity).sum(),
        status_url: order.status_url,
    })
}
