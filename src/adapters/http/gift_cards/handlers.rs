//! HTTP handlers for gift card endpoints.

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::AppState;
use crate::application::checkout::OpenCheckoutCommand;
use crate::application::voucher::SearchKind;
use crate::domain::foundation::{DomainError, ErrorCode, Money, Timestamp, VoucherId};
use crate::domain::voucher::{BuyerInfo, VoucherStatus};

use super::dto::{
    CheckoutStatusResponse, CreateCheckoutRequest, CreateCheckoutResponse, ExtendExpiryRequest,
    ExtendExpiryResponse, ForceStatusRequest, GiftCardResponse, SearchGiftCardsRequest,
    SearchGiftCardsResponse, SuccessResponse, UpdateRecipientRequest, UpdateRecipientResponse,
    VerifyGiftCardResponse,
};

fn parse_expiry(raw: &str) -> Result<Timestamp, DomainError> {
    raw.parse::<DateTime<Utc>>()
        .map(Timestamp::from_datetime)
        .map_err(|_| DomainError::new(ErrorCode::ValidationFailed, "Invalid date format"))
}

// ════════════════════════════════════════════════════════════════════════════════
// Public endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/gift-cards/create-checkout - Open a purchase and hand the
/// buyer over to the hosted checkout.
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(request): Json<CreateCheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let buyer = BuyerInfo::new(
        request.buyer_firstname,
        request.buyer_lastname,
        request.buyer_email,
        request.buyer_phone,
    )
    .map_err(DomainError::from)?;
    let amount = Money::from_eur(request.amount).map_err(DomainError::from)?;

    let outcome = state
        .open_checkout
        .execute(OpenCheckoutCommand {
            amount,
            buyer,
            recipient_name: request.recipient_name,
            personal_message: request.personal_message,
            coupon_token: request.coupon_token,
        })
        .await?;

    Ok(Json(CreateCheckoutResponse {
        url: outcome.checkout_url,
        session_id: outcome.session_id,
    }))
}

/// GET /api/gift-cards/status/{session_id} - Poll payment status. Confirms
/// (and activates) server-side when the gateway reports payment.
pub async fn get_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let status = state.confirm_checkout.execute(&session_id).await?;

    Ok(Json(CheckoutStatusResponse {
        payment_status: status.payment_status.as_str().to_string(),
        status: status.session_status,
        gift_card: GiftCardResponse::from(status.voucher),
    }))
}

/// GET /api/gift-cards/verify/{code} - Public code lookup. Unknown codes
/// return `found: false` rather than a 404.
pub async fn verify_gift_card(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    match state.verify_voucher.execute(&code).await {
        Ok(voucher) => Ok(Json(VerifyGiftCardResponse::found(voucher))),
        Err(err) if err.code == ErrorCode::VoucherNotFound => {
            Ok(Json(VerifyGiftCardResponse::not_found()))
        }
        Err(err) => Err(err.into()),
    }
}

/// POST /api/gift-cards/search - Public search by exact code or by
/// recipient/buyer name substring. An unknown search type is a soft
/// `found: false` envelope, not a 400.
pub async fn search_gift_cards(
    State(state): State<AppState>,
    Json(request): Json<SearchGiftCardsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = match SearchKind::parse(&request.search_type) {
        Some(kind) => kind,
        None => return Ok(Json(SearchGiftCardsResponse::invalid_type())),
    };
    let vouchers = state.search_vouchers.execute(&request.query, kind).await?;
    Ok(Json(SearchGiftCardsResponse::hits(vouchers)))
}

/// POST /api/webhooks/stripe - Gateway webhook receiver.
pub async fn handle_stripe_webhook(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| DomainError::validation("Stripe-Signature", "Missing Stripe-Signature header"))?;

    state.process_webhook.execute(&body, signature).await?;

    Ok(StatusCode::OK)
}

// ════════════════════════════════════════════════════════════════════════════════
// Admin endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/gift-cards/list - All gift cards, newest first (admin).
pub async fn list_gift_cards(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let mut vouchers = state.voucher_admin.list().await?;
    vouchers.sort_by(|a, b| b.created_at.as_datetime().cmp(a.created_at.as_datetime()));
    let response: Vec<GiftCardResponse> =
        vouchers.into_iter().map(GiftCardResponse::from).collect();
    Ok(Json(response))
}

/// GET /api/gift-cards/{id} - Single gift card (admin).
pub async fn get_gift_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let voucher = state.voucher_admin.get(&VoucherId::from_uuid(id)).await?;
    Ok(Json(GiftCardResponse::from(voucher)))
}

/// POST /api/gift-cards/{id}/activate - Issue a code for a pending gift
/// card (admin). Idempotent: an already active card is returned unchanged.
pub async fn activate_gift_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let voucher = state
        .activate_voucher
        .execute(&VoucherId::from_uuid(id))
        .await?;
    Ok(Json(GiftCardResponse::from(voucher)))
}

/// POST /api/gift-cards/{id}/redeem - Mark an active gift card as spent
/// (admin).
pub async fn redeem_gift_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let voucher = state
        .redeem_voucher
        .execute(&VoucherId::from_uuid(id))
        .await?;
    Ok(Json(GiftCardResponse::from(voucher)))
}

/// DELETE /api/gift-cards/{id} - Remove an abandoned pending purchase
/// (admin).
pub async fn delete_gift_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.voucher_admin.delete(&VoucherId::from_uuid(id)).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// PATCH /api/gift-cards/{id}/extend-expiry - Push the expiry out (admin).
pub async fn extend_expiry(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ExtendExpiryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let new_expiry = parse_expiry(&request.new_expiry_date)?;
    let voucher = state
        .voucher_admin
        .extend_expiry(&VoucherId::from_uuid(id), new_expiry)
        .await?;

    let new_expiry_date = voucher
        .expires_at
        .map(|ts| ts.as_datetime().to_rfc3339())
        .unwrap_or_default();
    Ok(Json(ExtendExpiryResponse {
        success: true,
        new_expiry_date,
    }))
}

/// PATCH /api/gift-cards/{id}/update-recipient - Correct the recipient
/// name (admin).
pub async fn update_recipient(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRecipientRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let voucher = state
        .voucher_admin
        .update_recipient(&VoucherId::from_uuid(id), &request.recipient_name)
        .await?;

    Ok(Json(UpdateRecipientResponse {
        success: true,
        recipient_name: voucher.recipient_name.unwrap_or_default(),
    }))
}

/// POST /api/gift-cards/{id}/resend-email - Re-send the issuance email
/// (admin).
pub async fn resend_email(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .voucher_admin
        .resend_notification(&VoucherId::from_uuid(id))
        .await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// PATCH /api/gift-cards/{id} - Force a lifecycle status (admin, support
/// interventions only).
pub async fn force_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ForceStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let status = VoucherStatus::parse(&request.status)?;
    let voucher = state
        .voucher_admin
        .force_status(&VoucherId::from_uuid(id), status)
        .await?;
    Ok(Json(GiftCardResponse::from(voucher)))
}
