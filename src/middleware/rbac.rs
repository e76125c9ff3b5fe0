// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    common::error::{ApiError, AppError},
    middleware::i18n::Locale,
    models::auth::{User, UserRole},
};

/// 1. O Trait que define um conjunto de cargos autorizados
pub trait RoleSet: Send + Sync + 'static {
    fn roles() -> &'static [UserRole];

    fn allows(role: UserRole) -> bool {
        Self::roles().contains(&role)
    }
}

/// 2. O Extractor (Guardião). Exige um usuário já resolvido pelo `auth_guard`.
pub struct RequireRole<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleSet,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let locale = Locale::from_headers(&parts.headers);

        let user = parts
            .extensions
            .get::<User>()
            .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale))?;

        if !T::allows(user.role) {
            tracing::debug!(user = %user.username, role = ?user.role, "Cargo sem acesso à rota");
            return Err(AppError::Forbidden.to_api_error(&locale));
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// CONJUNTOS DE CARGOS (TIPOS)
// ---

/// Caixa: registrar pedidos e orçamentos.
pub struct CheckoutRoles;
impl RoleSet for CheckoutRoles {
    fn roles() -> &'static [UserRole] {
        &[UserRole::Owner, UserRole::Admin, UserRole::Kasir]
    }
}

/// Produção: avançar o status do pedido.
pub struct StatusRoles;
impl RoleSet for StatusRoles {
    fn roles() -> &'static [UserRole] {
        &[UserRole::Owner, UserRole::Admin, UserRole::Kasir, UserRole::Operator]
    }
}

/// Estoque: cadastro, reposição, ajuste e conferência de materiais.
pub struct StockRoles;
impl RoleSet for StockRoles {
    fn roles() -> &'static [UserRole] {
        &[UserRole::Owner, UserRole::Admin, UserRole::Operator]
    }
}
