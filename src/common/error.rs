// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::middleware::i18n::Locale;

// SQLSTATEs do Postgres que nos interessam na fronteira do banco.
const PG_UNIQUE_VIOLATION: &str = "23505";
const PG_SERIALIZATION_FAILURE: &str = "40001";
const PG_DEADLOCK_DETECTED: &str = "40P01";

/// As categorias de erro visíveis ao cliente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Transient,
    Unauthorized,
    Forbidden,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Transient => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Requisição malformada: {0}")]
    MalformedRequest(String),

    #[error("Telefone inválido: {0}")]
    InvalidPhone(String),

    #[error("Dados do cliente ausentes: {0}")]
    MissingCustomerField(&'static str),

    #[error("Cliente não encontrado para o pedido")]
    CustomerReferenceNotFound,

    #[error("Algumas variantes não foram encontradas")]
    VariantsNotFound,

    #[error("Produto e variante não correspondem")]
    VariantProductMismatch,

    #[error("Produto inativo: {0}")]
    ProductInactive(String),

    #[error("Produto exige comprimento e largura: {0}")]
    DimensionsRequired(String),

    #[error("Receita aponta para material inativo")]
    RecipeMaterialUnavailable,

    #[error("Estoque insuficiente: {0}")]
    InsufficientStock(String),

    #[error("Material sumiu durante o checkout")]
    MaterialVanished,

    #[error("Estoque insuficiente para a redução")]
    AdjustmentBelowZero,

    #[error("Quantidade deve ser positiva")]
    NonPositiveQuantity,

    #[error("Quantidade fora do intervalo suportado")]
    QuantityOutOfRange,

    #[error("Valor não pode ser negativo: {0}")]
    NegativeAmount(&'static str),

    #[error("O status do pedido não pode voltar")]
    StatusRegression,

    #[error("O status do pedido deve avançar um passo por vez")]
    StatusSkip,

    #[error("O pedido já está neste status")]
    StatusUnchanged,

    #[error("Pedido ainda não quitado")]
    OrderNotSettled,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(String),

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Conflito de serialização na transação")]
    SerializationConflict,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Acesso negado")]
    Forbidden,

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    // Variante para erros de banco que não têm tradução de negócio
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),
}

// A tradução de sqlx::Error não é um #[from] simples: a fronteira com o banco
// decide aqui o que é conflito, o que é transitório e o que é interno.
impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = e {
            return AppError::ResourceNotFound("row".into());
        }
        if let Some(db_err) = e.as_database_error() {
            match db_err.code().as_deref() {
                Some(PG_UNIQUE_VIOLATION) => {
                    let constraint = db_err.constraint().unwrap_or_default().to_string();
                    return AppError::UniqueConstraintViolation(constraint);
                }
                Some(PG_SERIALIZATION_FAILURE) | Some(PG_DEADLOCK_DETECTED) => {
                    return AppError::SerializationConflict;
                }
                _ => {}
            }
        }
        AppError::DatabaseError(e)
    }
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::ValidationError(_)
            | AppError::MalformedRequest(_)
            | AppError::InvalidPhone(_)
            | AppError::MissingCustomerField(_)
            | AppError::CustomerReferenceNotFound
            | AppError::VariantsNotFound
            | AppError::VariantProductMismatch
            | AppError::ProductInactive(_)
            | AppError::DimensionsRequired(_)
            | AppError::RecipeMaterialUnavailable
            | AppError::InsufficientStock(_)
            | AppError::MaterialVanished
            | AppError::AdjustmentBelowZero
            | AppError::NonPositiveQuantity
            | AppError::QuantityOutOfRange
            | AppError::NegativeAmount(_)
            | AppError::StatusRegression
            | AppError::StatusSkip
            | AppError::StatusUnchanged
            | AppError::OrderNotSettled => ErrorKind::Validation,
            AppError::ResourceNotFound(_) => ErrorKind::NotFound,
            AppError::UniqueConstraintViolation(_) => ErrorKind::Conflict,
            AppError::SerializationConflict => ErrorKind::Transient,
            AppError::InvalidToken | AppError::UserNotFound | AppError::JwtError(_) => {
                ErrorKind::Unauthorized
            }
            AppError::Forbidden => ErrorKind::Forbidden,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => ErrorKind::Internal,
        }
    }

    /// Mensagem para o usuário final. Indonésio é o idioma da loja; inglês é a alternativa.
    fn user_message(&self, locale: &Locale) -> String {
        let en = locale.is_english();
        let pick = |id: String, en_text: String| if en { en_text } else { id };

        match self {
            AppError::ValidationError(_) => pick(
                "Validasi request gagal".into(),
                "One or more fields are invalid.".into(),
            ),
            AppError::MalformedRequest(_) => pick(
                "Format request tidak valid".into(),
                "The request is malformed.".into(),
            ),
            AppError::InvalidPhone(_) => pick(
                "Format nomor telepon pelanggan tidak valid".into(),
                "Customer phone number format is invalid".into(),
            ),
            AppError::MissingCustomerField(field) => pick(
                format!("Data pelanggan '{}' wajib diisi", field),
                format!("Customer field '{}' is required", field),
            ),
            AppError::CustomerReferenceNotFound => pick(
                "Pelanggan tidak ditemukan".into(),
                "Customer not found".into(),
            ),
            AppError::VariantsNotFound => pick(
                "Sebagian varian bahan tidak ditemukan".into(),
                "Some material variants were not found".into(),
            ),
            AppError::VariantProductMismatch => pick(
                "Produk dan varian tidak cocok".into(),
                "Product and variant do not match".into(),
            ),
            AppError::ProductInactive(name) => pick(
                format!("Produk \"{}\" sudah tidak aktif", name),
                format!("Product \"{}\" is no longer active", name),
            ),
            AppError::DimensionsRequired(name) => pick(
                format!("Produk \"{}\" membutuhkan panjang dan lebar", name),
                format!("Product \"{}\" requires length and width", name),
            ),
            AppError::RecipeMaterialUnavailable => pick(
                "Resep bahan mengacu ke bahan yang tidak aktif".into(),
                "A recipe refers to an inactive material".into(),
            ),
            AppError::InsufficientStock(name) => pick(
                format!("Stok bahan \"{}\" tidak mencukupi", name),
                format!("Insufficient stock for material \"{}\"", name),
            ),
            AppError::MaterialVanished => pick(
                "Bahan tidak ditemukan saat proses checkout".into(),
                "Material disappeared during checkout".into(),
            ),
            AppError::AdjustmentBelowZero => pick(
                "Stok tidak mencukupi untuk pengurangan".into(),
                "Stock is not enough for this reduction".into(),
            ),
            AppError::NonPositiveQuantity => pick(
                "Jumlah harus lebih dari nol".into(),
                "Quantity must be greater than zero".into(),
            ),
            AppError::QuantityOutOfRange => pick(
                "Jumlah di luar batas yang didukung".into(),
                "Quantity is outside the supported range".into(),
            ),
            AppError::NegativeAmount(field) => pick(
                format!("Nilai '{}' tidak boleh negatif", field),
                format!("'{}' must not be negative", field),
            ),
            AppError::StatusRegression => pick(
                "Status pesanan tidak boleh mundur".into(),
                "Order status cannot move backwards".into(),
            ),
            AppError::StatusSkip => pick(
                "Status pesanan harus naik bertahap".into(),
                "Order status must advance one step at a time".into(),
            ),
            AppError::StatusUnchanged => pick(
                "Pesanan sudah berada pada status ini".into(),
                "Order is already in this status".into(),
            ),
            AppError::OrderNotSettled => pick(
                "Pesanan belum lunas. Pilih metode pembayaran selain piutang untuk pelunasan".into(),
                "Order not yet paid. Choose a payment method other than receivable to settle it".into(),
            ),
            AppError::ResourceNotFound(what) => {
                let (id_name, en_name) = match what.as_str() {
                    "order" => ("Pesanan", "Order"),
                    "customer" => ("Pelanggan", "Customer"),
                    "material" => ("Bahan", "Material"),
                    _ => ("Data", "Record"),
                };
                pick(
                    format!("{} tidak ditemukan", id_name),
                    format!("{} not found", en_name),
                )
            }
            AppError::UniqueConstraintViolation(_) => pick(
                "Data duplikat, nilai unik sudah digunakan".into(),
                "Duplicate data, a unique value is already in use".into(),
            ),
            AppError::SerializationConflict => pick(
                "Transaksi bentrok dengan transaksi lain, silakan coba lagi".into(),
                "The transaction conflicted with another one, please retry".into(),
            ),
            AppError::InvalidToken | AppError::JwtError(_) => pick(
                "Token autentikasi tidak valid".into(),
                "Authentication token is invalid or missing".into(),
            ),
            AppError::UserNotFound => pick("Sesi tidak valid".into(), "Invalid session".into()),
            AppError::Forbidden => pick(
                "Role Anda tidak memiliki akses".into(),
                "Your role does not have access".into(),
            ),
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => pick(
                "Terjadi kesalahan pada server".into(),
                "An unexpected error occurred.".into(),
            ),
        }
    }

    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let kind = self.kind();

        if kind == ErrorKind::Internal {
            // O detalhe vai para o log, nunca para a resposta.
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(json!(details))
            }
            AppError::MalformedRequest(reason) => Some(json!({ "reason": reason })),
            AppError::UniqueConstraintViolation(constraint) if !constraint.is_empty() => {
                Some(json!({ "constraint": constraint }))
            }
            _ => None,
        };

        ApiError {
            status: kind.status(),
            kind,
            error: self.user_message(locale),
            details,
        }
    }
}

/// Resposta de erro já renderizada para o cliente.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub kind: ErrorKind,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "success": false,
            "kind": self.kind,
            "error": self.error,
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

// Sem idioma explícito (ex.: erros vindos de middleware), usa o padrão da loja.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default()).into_response()
    }
}
