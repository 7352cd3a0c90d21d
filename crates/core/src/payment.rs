//! Create and record-payment form drafts, their validation, and the calls
//! that submit them.

use harvest_api::{
    AddFamilyPaymentRequest, AddFamilyPaymentResponse, PaymentMethod, UpdateFamilyPaymentRequest,
    UpdateFamilyPaymentResponse,
};
use harvest_api_client::{ApiClient, ApiError, Transport};
use tracing::info;

pub const REQUIRED_FIELDS_MESSAGE: &str = "All fields are required";
pub const AMOUNT_REQUIRED_MESSAGE: &str = "Please enter an amount";
pub const INVALID_CHILD_COUNT_MESSAGE: &str = "Number of children must be a whole number";
pub const INVALID_AMOUNT_MESSAGE: &str = "Amount must be a number of zero or more";
pub const PAYMENT_RECORDED_MESSAGE: &str = "Payment recorded successfully!";

pub fn created_message(resp: &AddFamilyPaymentResponse) -> String {
    format!(
        "Payment created successfully! Family ID: {}, Payment ID: {}",
        resp.family_id, resp.payment_id
    )
}

/// Raw text of the create form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatePaymentDraft {
    pub family_name: String,
    pub child_count: String,
    pub amount: String,
    pub payment_method: PaymentMethod,
}

impl CreatePaymentDraft {
    pub fn validate(&self) -> Result<AddFamilyPaymentRequest, ApiError> {
        let family_name = self.family_name.trim();
        let child_count = self.child_count.trim();
        let amount = self.amount.trim();
        if family_name.is_empty() || child_count.is_empty() || amount.is_empty() {
            return Err(missing(REQUIRED_FIELDS_MESSAGE));
        }

        let child_count = child_count
            .parse::<u32>()
            .map_err(|_| missing(INVALID_CHILD_COUNT_MESSAGE))?;

        Ok(AddFamilyPaymentRequest {
            family_name: family_name.to_string(),
            child_count,
            amount: parse_amount(amount)?,
            payment_method: self.payment_method,
        })
    }
}

/// Raw text of the record-payment form for one existing family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatePaymentDraft {
    pub family_id: i64,
    pub family_name: String,
    pub amount: String,
    pub payment_method: PaymentMethod,
}

impl UpdatePaymentDraft {
    /// Fresh draft; recorded payments default to cash.
    pub fn new(family_id: i64, family_name: impl Into<String>) -> Self {
        Self {
            family_id,
            family_name: family_name.into(),
            amount: String::new(),
            payment_method: PaymentMethod::Cash,
        }
    }

    pub fn validate(&self) -> Result<UpdateFamilyPaymentRequest, ApiError> {
        let amount = self.amount.trim();
        if amount.is_empty() {
            return Err(missing(AMOUNT_REQUIRED_MESSAGE));
        }
        Ok(UpdateFamilyPaymentRequest {
            family_id: self.family_id,
            amount: parse_amount(amount)?,
            payment_method: self.payment_method,
        })
    }
}

fn parse_amount(raw: &str) -> Result<f64, ApiError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| missing(INVALID_AMOUNT_MESSAGE))
}

fn missing(message: &str) -> ApiError {
    ApiError::MissingField(message.to_string())
}

/// Validate and submit a new family with its first payment.
pub async fn create<T: Transport>(
    client: &ApiClient<T>,
    draft: &CreatePaymentDraft,
) -> Result<AddFamilyPaymentResponse, ApiError> {
    let request = draft.validate()?;
    let resp = client.add_family_payment(&request).await?;
    info!(
        family_id = resp.family_id,
        payment_id = resp.payment_id,
        method = %request.payment_method,
        "family payment created"
    );
    Ok(resp)
}

/// Validate and submit an additional payment for an existing family.
pub async fn update<T: Transport>(
    client: &ApiClient<T>,
    draft: &UpdatePaymentDraft,
) -> Result<UpdateFamilyPaymentResponse, ApiError> {
    let request = draft.validate()?;
    let resp = client.update_family_payment(&request).await?;
    info!(
        family_id = request.family_id,
        payment_id = ?resp.payment_id,
        method = %request.payment_method,
        "payment recorded"
    );
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_api_client::testing::StubTransport;
    use serde_json::json;

    fn draft(name: &str, children: &str, amount: &str) -> CreatePaymentDraft {
        CreatePaymentDraft {
            family_name: name.into(),
            child_count: children.into(),
            amount: amount.into(),
            payment_method: PaymentMethod::Cash,
        }
    }

    #[test]
    fn create_draft_defaults_to_bank_transfer() {
        assert_eq!(
            CreatePaymentDraft::default().payment_method,
            PaymentMethod::BankTransfer
        );
    }

    #[test]
    fn create_requires_every_field() {
        for d in [draft("", "2", "75"), draft("Lee", " ", "75"), draft("Lee", "2", "")] {
            assert_eq!(d.validate(), Err(missing(REQUIRED_FIELDS_MESSAGE)));
        }
    }

    #[test]
    fn create_rejects_bad_numbers() {
        assert_eq!(
            draft("Lee", "-1", "75").validate(),
            Err(missing(INVALID_CHILD_COUNT_MESSAGE))
        );
        assert_eq!(
            draft("Lee", "2.5", "75").validate(),
            Err(missing(INVALID_CHILD_COUNT_MESSAGE))
        );
        assert_eq!(
            draft("Lee", "2", "-3").validate(),
            Err(missing(INVALID_AMOUNT_MESSAGE))
        );
        assert_eq!(
            draft("Lee", "2", "lots").validate(),
            Err(missing(INVALID_AMOUNT_MESSAGE))
        );
    }

    #[test]
    fn create_builds_request_from_trimmed_text() {
        let req = draft("  Lee ", "0", "75.00").validate().unwrap();
        assert_eq!(req.family_name, "Lee");
        assert_eq!(req.child_count, 0);
        assert_eq!(req.amount, 75.0);
        assert_eq!(req.payment_method, PaymentMethod::Cash);
    }

    #[test]
    fn update_draft_defaults_to_cash_and_requires_amount() {
        let d = UpdatePaymentDraft::new(3, "Smith");
        assert_eq!(d.payment_method, PaymentMethod::Cash);
        assert_eq!(d.validate(), Err(missing(AMOUNT_REQUIRED_MESSAGE)));
    }

    #[test]
    fn created_message_names_both_ids() {
        let msg = created_message(&AddFamilyPaymentResponse {
            family_id: 7,
            payment_id: 3,
        });
        assert_eq!(msg, "Payment created successfully! Family ID: 7, Payment ID: 3");
    }

    #[tokio::test]
    async fn invalid_draft_sends_nothing() {
        let stub = StubTransport::new();
        let client = ApiClient::with_transport(stub.clone());

        let err = update(&client, &UpdatePaymentDraft::new(3, "Smith"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::MissingField(_)));
        assert_eq!(stub.call_count(), 0);
    }

    #[tokio::test]
    async fn update_submits_parsed_amount() {
        let stub = StubTransport::new();
        let client = ApiClient::with_transport(stub.clone());
        stub.push_json(200, json!({"status": "success", "payment_id": 11}));
        let mut d = UpdatePaymentDraft::new(3, "Smith");
        d.amount = "20.25".into();

        let resp = update(&client, &d).await.unwrap();

        assert_eq!(resp.payment_id, Some(11));
        let body = stub.calls()[0].body.clone().unwrap();
        assert_eq!(body["family_id"], 3);
        assert_eq!(body["amount"], 20.25);
        assert_eq!(body["payment_method"], "cash");
    }
}
