use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use pizzeria_infra::PosError;

pub fn pos_error_status(err: &PosError) -> StatusCode {
    match err {
        PosError::ItemNotFound(_)
        | PosError::CustomerNotFound(_)
        | PosError::AddressNotFound(_)
        | PosError::OrderNotFound(_)
        | PosError::ShiftNotFound(_) => StatusCode::NOT_FOUND,
        PosError::NoOpenShift | PosError::ShiftAlreadyOpen => StatusCode::CONFLICT,
        PosError::InvalidLineComposition(_)
        | PosError::InvalidAmount(_)
        | PosError::InvalidQuantity(_)
        | PosError::EmptyOrder
        | PosError::Validation(_)
        | PosError::Invariant(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PosError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn pos_error_to_response(err: PosError) -> axum::response::Response {
    let status = pos_error_status(&err);
    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
    }
    json_error(status, err.code(), err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pizzeria_core::StoreError;

    #[test]
    fn error_families_map_to_stable_statuses() {
        assert_eq!(pos_error_status(&PosError::NoOpenShift), StatusCode::CONFLICT);
        assert_eq!(pos_error_status(&PosError::ShiftAlreadyOpen), StatusCode::CONFLICT);
        assert_eq!(pos_error_status(&PosError::EmptyOrder), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            pos_error_status(&PosError::InvalidLineComposition("line 1".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            pos_error_status(&PosError::Store(StoreError::backend("begin", "down"))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
