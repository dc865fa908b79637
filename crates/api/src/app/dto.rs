use std::str::FromStr;

use axum::http::StatusCode;
use serde::Deserialize;

use pizzeria_core::Money;
use pizzeria_customers::{AddressId, CustomerId};
use pizzeria_infra::{ClosedShift, DetailsPatch, NewOrder};
use pizzeria_orders::{DeliveryMethod, LineRequest, OrderStatus, PaymentMethod, PaymentStatus};
use pizzeria_register::CashShift;

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct OpenShiftRequest {
    pub start_amount: Money,
}

#[derive(Debug, Deserialize)]
pub struct CloseShiftRequest {
    pub end_amount: Money,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: Option<CustomerId>,
    pub address_id: Option<AddressId>,
    pub manual_address: Option<String>,
    pub delivery_method: DeliveryMethod,
    pub payment_method: PaymentMethod,
    pub payment_status: Option<PaymentStatus>,
    pub note: Option<String>,
    #[serde(default)]
    pub items: Vec<LineRequest>,
}

impl From<CreateOrderRequest> for NewOrder {
    fn from(body: CreateOrderRequest) -> Self {
        NewOrder {
            customer_id: body.customer_id,
            address_id: body.address_id,
            manual_address: body.manual_address,
            delivery_method: body.delivery_method,
            payment_method: body.payment_method,
            payment_status: body.payment_status,
            note: body.note,
            items: body.items,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub order_status: OrderStatus,
    pub payment_status: Option<PaymentStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateDetailsRequest {
    pub payment_status: Option<PaymentStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub delivery_method: Option<DeliveryMethod>,
}

impl From<UpdateDetailsRequest> for DetailsPatch {
    fn from(body: UpdateDetailsRequest) -> Self {
        DetailsPatch {
            payment_status: body.payment_status,
            payment_method: body.payment_method,
            delivery_method: body.delivery_method,
        }
    }
}

// -------------------------
// Response mapping
// -------------------------

pub fn shift_to_json(shift: &CashShift) -> serde_json::Value {
    serde_json::json!({
        "id": shift.id_typed().to_string(),
        "status": shift.status(),
        "started_at": shift.started_at(),
        "ended_at": shift.ended_at(),
        "start_amount": shift.start_amount(),
        "end_amount": shift.end_amount(),
    })
}

pub fn closed_shift_to_json(closed: &ClosedShift) -> serde_json::Value {
    let mut body = shift_to_json(&closed.shift);
    body["delivered_orders"] = serde_json::json!(closed.delivered_orders);
    body
}

/// Parse a path identifier, answering 400 when it is not a UUID.
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr,
{
    raw.parse()
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid id: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pizzeria_catalog::ProductId;
    use pizzeria_orders::OrderId;

    #[test]
    fn create_order_body_accepts_string_money_and_vocabulary() {
        let body: CreateOrderRequest = serde_json::from_value(serde_json::json!({
            "delivery_method": "DELIVERY",
            "payment_method": "CASH",
            "manual_address": "Sarmiento 1450",
            "items": [{ "product_id": ProductId::generate().to_string(), "quantity": 2 }]
        }))
        .unwrap();

        let order = NewOrder::from(body);
        assert_eq!(order.delivery_method, DeliveryMethod::Delivery);
        assert_eq!(order.payment_status, None);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].quantity, 2);
    }

    #[test]
    fn amounts_parse_from_strings() {
        let body: OpenShiftRequest =
            serde_json::from_value(serde_json::json!({ "start_amount": "1000.00" })).unwrap();
        assert_eq!(body.start_amount, Money::from_minor(100_000));
    }

    #[test]
    fn malformed_ids_are_rejected() {
        assert!(parse_id::<OrderId>("nope").is_err());
        let id = OrderId::generate();
        assert_eq!(parse_id::<OrderId>(&id.to_string()).ok(), Some(id));
    }
}
