use axum::Json;
use axum::extract::{Path, State};

use serde::{Deserialize, Serialize};

use crate::application::{AccountingService, AppError};
use crate::domain::Points;

#[derive(Deserialize)]
pub struct PointsRequest {
    pub user_id: String,
    pub amount: Points,
}

#[derive(Deserialize)]
pub struct ReferralRequest {
    pub user_id: String,
    pub referral_id: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub user_id: String,
    pub points: Points,
}

#[derive(Serialize)]
pub struct ReferralResponse {
    pub message: &'static str,
    pub points: Points,
    pub referrals: Vec<String>,
}

/// GET `/`: health check.
pub async fn home_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        message: "Points ledger backend running",
    })
}

/// GET `/points/{user_id}`: current balance, zero for unknown users.
pub async fn points_handler(
    State(service): State<AccountingService>,
    Path(user_id): Path<String>,
) -> Result<Json<BalanceResponse>, AppError> {
    let points = service.get_balance(&user_id).await?;
    Ok(Json(BalanceResponse { user_id, points }))
}

/// POST `/add_points`: credit points, respond with the new balance.
pub async fn add_points_handler(
    State(service): State<AccountingService>,
    Json(payload): Json<PointsRequest>,
) -> Result<Json<BalanceResponse>, AppError> {
    let points = service.add_points(&payload.user_id, payload.amount).await?;
    Ok(Json(BalanceResponse {
        user_id: payload.user_id,
        points,
    }))
}

/// POST `/referral`: credit the referral bonus to the referrer once per
/// referred user.
pub async fn referral_handler(
    State(service): State<AccountingService>,
    Json(payload): Json<ReferralRequest>,
) -> Result<Json<ReferralResponse>, AppError> {
    let result = service
        .apply_referral(&payload.user_id, &payload.referral_id)
        .await?;

    let message = if result.newly_added {
        "Referral added"
    } else {
        "Already referred"
    };

    Ok(Json(ReferralResponse {
        message,
        points: result.points,
        referrals: result.referrals,
    }))
}
