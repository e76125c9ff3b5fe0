mod common;

use chrono::Duration;

use common::*;
use printshop::{common::error::AppError, models::auth::UserRole};

#[tokio::test]
async fn issued_token_resolves_to_the_active_user() {
    let Some(ctx) = setup().await else { return };
    let operator_id = seed_user(&ctx.pool, UserRole::Operator).await;

    let token = ctx
        .state
        .auth_service
        .issue_token(operator_id, Duration::hours(1))
        .expect("token");
    let user = ctx
        .state
        .auth_service
        .validate_token(&token)
        .await
        .expect("validate");

    assert_eq!(user.id, operator_id);
    assert_eq!(user.role, UserRole::Operator);
}

#[tokio::test]
async fn deactivated_user_is_rejected() {
    let Some(ctx) = setup().await else { return };
    let owner_id = seed_user(&ctx.pool, UserRole::Owner).await;
    let token = ctx
        .state
        .auth_service
        .issue_token(owner_id, Duration::hours(1))
        .expect("token");

    sqlx::query("UPDATE users SET is_active = FALSE WHERE id = $1")
        .bind(owner_id)
        .execute(&ctx.pool)
        .await
        .expect("deactivate");

    let err = ctx.state.auth_service.validate_token(&token).await.unwrap_err();
    assert!(matches!(err, AppError::UserNotFound));
}

#[tokio::test]
async fn tampered_or_expired_tokens_are_invalid() {
    let Some(ctx) = setup().await else { return };
    let auth = &ctx.state.auth_service;

    let expired = auth
        .issue_token(ctx.user_id, Duration::hours(-2))
        .expect("token");
    assert!(matches!(
        auth.validate_token(&expired).await.unwrap_err(),
        AppError::InvalidToken
    ));

    assert!(matches!(
        auth.validate_token("nao.e.um.jwt").await.unwrap_err(),
        AppError::InvalidToken
    ));
}
