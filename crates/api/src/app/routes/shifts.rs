use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use pizzeria_infra::PosError;
use pizzeria_register::CashShiftId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::TenantContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(open_shift).get(list_shifts))
        .route("/open", get(get_open_shift))
        .route("/close", put(close_shift))
        .route("/:id", get(get_shift))
        .route("/:id/orders", get(shift_orders))
        .route("/:id/summary", get(shift_summary))
}

pub async fn open_shift(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Json(body): Json<dto::OpenShiftRequest>,
) -> axum::response::Response {
    match services.shifts.open(tenant.tenant_id(), body.start_amount).await {
        Ok(shift) => (StatusCode::CREATED, Json(dto::shift_to_json(&shift))).into_response(),
        Err(e) => errors::pos_error_to_response(e),
    }
}

pub async fn close_shift(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Json(body): Json<dto::CloseShiftRequest>,
) -> axum::response::Response {
    match services.shifts.close(tenant.tenant_id(), body.end_amount).await {
        Ok(closed) => (StatusCode::OK, Json(dto::closed_shift_to_json(&closed))).into_response(),
        Err(e) => errors::pos_error_to_response(e),
    }
}

pub async fn list_shifts(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> axum::response::Response {
    match services.shifts.list_all(tenant.tenant_id()).await {
        Ok(shifts) => {
            let items = shifts.iter().map(dto::shift_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::pos_error_to_response(e),
    }
}

/// A register UI polls this; "no shift" is a 404 here rather than a conflict.
pub async fn get_open_shift(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
) -> axum::response::Response {
    match services.shifts.get_open(tenant.tenant_id()).await {
        Ok(shift) => (StatusCode::OK, Json(dto::shift_to_json(&shift))).into_response(),
        Err(e @ PosError::NoOpenShift) => {
            errors::json_error(StatusCode::NOT_FOUND, e.code(), e.to_string())
        }
        Err(e) => errors::pos_error_to_response(e),
    }
}

pub async fn get_shift(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let shift_id: CashShiftId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.shifts.get_by_id(tenant.tenant_id(), shift_id).await {
        Ok(shift) => (StatusCode::OK, Json(dto::shift_to_json(&shift))).into_response(),
        Err(e) => errors::pos_error_to_response(e),
    }
}

pub async fn shift_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let shift_id: CashShiftId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.shifts.orders_of(tenant.tenant_id(), shift_id).await {
        Ok(orders) => {
            let items = services.orders.present_all(tenant.tenant_id(), &orders).await;
            (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::pos_error_to_response(e),
    }
}

pub async fn shift_summary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let shift_id: CashShiftId = match dto::parse_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.shifts.summary(tenant.tenant_id(), shift_id).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => errors::pos_error_to_response(e),
    }
}
