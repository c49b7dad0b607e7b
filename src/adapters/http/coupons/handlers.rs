//! HTTP handlers for coupon endpoints.

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::AppState;
use crate::application::coupon_admin::{CreateCouponCommand, UpdateCouponCommand};
use crate::domain::coupon::Discount;
use crate::domain::foundation::{CouponId, DomainError, ErrorCode, Timestamp};

use super::dto::{
    CancelCouponResponse, CouponResponse, CreateCouponRequest, SuccessResponse,
    UpdateCouponRequest, ValidateCouponRequest, ValidateCouponResponse,
};

/// Business rejections that surface as `valid: false` instead of an HTTP
/// error, matching what the storefront expects.
fn is_soft_rejection(code: ErrorCode) -> bool {
    matches!(
        code,
        ErrorCode::CouponNotFound
            | ErrorCode::CouponInactive
            | ErrorCode::CouponExpired
            | ErrorCode::UsageLimitReached
    )
}

fn parse_expiry(raw: &str) -> Result<Timestamp, DomainError> {
    raw.parse::<DateTime<Utc>>()
        .map(Timestamp::from_datetime)
        .map_err(|_| DomainError::new(ErrorCode::ValidationFailed, "Invalid date format"))
}

// ════════════════════════════════════════════════════════════════════════════════
// Public endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/coupons/validate - Validate a code and mint a single-use token.
pub async fn validate_coupon(
    State(state): State<AppState>,
    Json(request): Json<ValidateCouponRequest>,
) -> Result<impl IntoResponse, ApiError> {
    match state.ledger.validate(&request.code).await {
        Ok(outcome) => Ok(Json(ValidateCouponResponse::valid(outcome))),
        Err(err) if is_soft_rejection(err.code) => {
            Ok(Json(ValidateCouponResponse::rejected(err.message)))
        }
        Err(err) => Err(err.into()),
    }
}

/// POST /api/coupons/cancel/{token} - Cancel a pending reservation.
pub async fn cancel_coupon(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.ledger.cancel_pending(&token).await {
        Ok(()) => Ok(Json(CancelCouponResponse {
            success: true,
            error: None,
            message: Some("Coupon usage canceled".to_string()),
        })),
        Err(err) if matches!(err.code, ErrorCode::TokenInvalid | ErrorCode::StateConflict) => {
            Ok(Json(CancelCouponResponse {
                success: false,
                error: Some(err.message),
                message: None,
            }))
        }
        Err(err) => Err(err.into()),
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Admin endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/coupons - Create a coupon (admin).
pub async fn create_coupon(
    State(state): State<AppState>,
    Json(request): Json<CreateCouponRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let discount =
        Discount::from_parts(&request.kind, request.value).map_err(DomainError::from)?;
    let coupon = state
        .coupon_admin
        .create(CreateCouponCommand {
            code: request.code,
            discount,
            valid_to: parse_expiry(&request.valid_to)?,
            is_active: request.is_active,
            max_uses: request.max_uses,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(CouponResponse::from(coupon))))
}

/// GET /api/coupons - List all coupons (admin).
pub async fn list_coupons(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let coupons = state.coupon_admin.list().await?;
    let response: Vec<CouponResponse> = coupons.into_iter().map(CouponResponse::from).collect();
    Ok(Json(response))
}

/// PUT /api/coupons/{id} - Partially update a coupon (admin).
pub async fn update_coupon(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCouponRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let discount = match (request.kind.as_deref(), request.value) {
        (Some(kind), Some(value)) => {
            Some(Discount::from_parts(kind, value).map_err(DomainError::from)?)
        }
        (None, None) => None,
        _ => {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                "Discount type and value must be updated together",
            )
            .into())
        }
    };

    let valid_to = match request.valid_to.as_deref() {
        Some(raw) => Some(parse_expiry(raw)?),
        None => None,
    };

    let coupon = state
        .coupon_admin
        .update(
            &CouponId::from_uuid(id),
            UpdateCouponCommand {
                discount,
                valid_to,
                is_active: request.is_active,
                max_uses: request.max_uses,
            },
        )
        .await?;

    Ok(Json(CouponResponse::from(coupon)))
}

/// DELETE /api/coupons/{id} - Delete a coupon (admin).
pub async fn delete_coupon(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.coupon_admin.delete(&CouponId::from_uuid(id)).await?;
    Ok(Json(SuccessResponse { success: true }))
}
