//! Request/response types for the Harvest family-payment API.
//!
//! This crate is the single source of truth for the JSON shapes exchanged with
//! the backend. Paths are relative to the `/api` prefix.

use serde::{Deserialize, Serialize};

// ─── Endpoints ───────────────────────────────────────────────────────────────

pub const TOKEN_PATH: &str = "/token/";
pub const FAMILIES_PATH: &str = "/families/";
pub const ADD_FAMILY_PAYMENT_PATH: &str = "/add-family-payment/";
pub const UPDATE_FAMILY_PAYMENT_PATH: &str = "/update-family-payment/";

// ─── Shared Enums ────────────────────────────────────────────────────────────

/// How a payment was made.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    BankTransfer,
    Cash,
    Check,
    CreditCard,
}

impl PaymentMethod {
    pub const ALL: [Self; 4] = [Self::BankTransfer, Self::Cash, Self::Check, Self::CreditCard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BankTransfer => "bank_transfer",
            Self::Cash => "cash",
            Self::Check => "check",
            Self::CreditCard => "credit_card",
        }
    }

    /// Human-readable label used in forms.
    pub fn label(&self) -> &'static str {
        match self {
            Self::BankTransfer => "Bank Transfer",
            Self::Cash => "Cash",
            Self::Check => "Check",
            Self::CreditCard => "Credit Card",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Auth ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Successful token exchange. Only `access` is used; the backend also issues
/// a refresh token which this client ignores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Error body of a non-2xx response.
///
/// The auth and list endpoints answer with `{detail}`, the payment endpoints
/// with `{error}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// The server-provided reason, preferring `error` over `detail`.
    pub fn message(&self) -> Option<&str> {
        self.error
            .as_deref()
            .or(self.detail.as_deref())
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

// ─── Families ────────────────────────────────────────────────────────────────

/// One row of the families summary, aggregated server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilySummary {
    pub id: i64,
    pub family_name: String,
    #[serde(default)]
    pub child_count: i64,
    /// Decimal sum of all payments. Serialized by the backend as a string
    /// (`"150.00"`), absent or `null` for a family without payments.
    #[serde(default)]
    pub total_amount_paid: Option<serde_json::Value>,
    /// ISO-8601 timestamp of the most recent payment.
    #[serde(default)]
    pub last_payment_date: Option<String>,
}

impl FamilySummary {
    /// Parsed `total_amount_paid`; `None` when missing or not a number.
    pub fn total_paid(&self) -> Option<f64> {
        match self.total_amount_paid.as_ref()? {
            serde_json::Value::Number(n) => n.as_f64(),
            serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FamilyListResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub data: Vec<FamilySummary>,
}

// ─── Payments ────────────────────────────────────────────────────────────────

/// Create a family together with its first payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddFamilyPaymentRequest {
    pub family_name: String,
    pub child_count: u32,
    pub amount: f64,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddFamilyPaymentResponse {
    pub family_id: i64,
    pub payment_id: i64,
}

/// Record an additional payment for an existing family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateFamilyPaymentRequest {
    pub family_id: i64,
    pub amount: f64,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateFamilyPaymentResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payment_method_uses_snake_case_on_the_wire() {
        let body = serde_json::to_value(UpdateFamilyPaymentRequest {
            family_id: 4,
            amount: 12.5,
            payment_method: PaymentMethod::CreditCard,
        })
        .unwrap();
        assert_eq!(body["payment_method"], "credit_card");

        let parsed: PaymentMethod = serde_json::from_value(json!("bank_transfer")).unwrap();
        assert_eq!(parsed, PaymentMethod::BankTransfer);
    }

    #[test]
    fn payment_method_cycles_through_all_variants() {
        let mut method = PaymentMethod::default();
        for _ in 0..PaymentMethod::ALL.len() {
            method = method.next();
        }
        assert_eq!(method, PaymentMethod::BankTransfer);
        assert_eq!(PaymentMethod::BankTransfer.prev(), PaymentMethod::CreditCard);
    }

    #[test]
    fn family_summary_accepts_decimal_strings_and_nulls() {
        let list: FamilyListResponse = serde_json::from_value(json!({
            "status": "success",
            "data": [
                {"id": 1, "family_name": "Smith", "child_count": 2,
                 "total_amount_paid": "100.50", "last_payment_date": "2026-01-05T10:00:00Z"},
                {"id": 2, "family_name": "Jones", "child_count": 1,
                 "total_amount_paid": null, "last_payment_date": null},
                {"id": 3, "family_name": "Lee", "child_count": 0,
                 "total_amount_paid": "abc"}
            ]
        }))
        .unwrap();

        assert_eq!(list.data.len(), 3);
        assert_eq!(list.data[0].total_paid(), Some(100.5));
        assert_eq!(list.data[1].total_paid(), None);
        assert_eq!(list.data[2].total_paid(), None);
        assert_eq!(list.data[2].last_payment_date, None);
    }

    #[test]
    fn error_body_prefers_error_then_detail() {
        let body: ErrorBody = serde_json::from_value(json!({"detail": "No active account"})).unwrap();
        assert_eq!(body.message(), Some("No active account"));

        let body: ErrorBody =
            serde_json::from_value(json!({"error": "Invalid amount", "detail": "x"})).unwrap();
        assert_eq!(body.message(), Some("Invalid amount"));

        let body: ErrorBody = serde_json::from_value(json!({"error": "  "})).unwrap();
        assert_eq!(body.message(), None);
    }
}
