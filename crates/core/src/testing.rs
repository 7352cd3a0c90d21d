use harvest_api::FamilySummary;
use serde_json::Value;

/// Family row with a decimal-string total, the way the backend sends it.
pub fn family(id: i64, name: &str, total: &str) -> FamilySummary {
    FamilySummary {
        id,
        family_name: name.to_string(),
        child_count: 1,
        total_amount_paid: Some(Value::String(total.to_string())),
        last_payment_date: Some("2026-01-05T10:00:00Z".to_string()),
    }
}

/// Family that has never paid.
pub fn family_without_payments(id: i64, name: &str) -> FamilySummary {
    FamilySummary {
        id,
        family_name: name.to_string(),
        child_count: 0,
        total_amount_paid: None,
        last_payment_date: None,
    }
}

/// `GET /families/` body for the given rows.
pub fn families_body(families: &[FamilySummary]) -> Value {
    serde_json::json!({
        "status": "success",
        "data": families,
    })
}
