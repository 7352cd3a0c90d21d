use harvest_api::{AddFamilyPaymentResponse, FamilySummary, UpdateFamilyPaymentResponse};
use harvest_api_client::{ApiClient, ApiError, Transport};
use harvest_core::payment::{self, CreatePaymentDraft, UpdatePaymentDraft};
use harvest_core::{Credential, auth, summary};

/// Commands that require async I/O (network calls).
#[derive(Debug, Clone)]
pub enum AsyncCommand {
    Login { username: String, password: String },
    FetchFamilies { generation: u64 },
    CreatePayment(CreatePaymentDraft),
    UpdatePayment(UpdatePaymentDraft),
}

impl AsyncCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login { .. } => "login",
            Self::FetchFamilies { .. } => "fetch-families",
            Self::CreatePayment(_) => "create-payment",
            Self::UpdatePayment(_) => "update-payment",
        }
    }
}

/// Results returned by async commands.
#[derive(Debug)]
pub enum CommandResult {
    Login(Result<Credential, ApiError>),
    Families {
        generation: u64,
        result: Result<Vec<FamilySummary>, ApiError>,
    },
    Created(Result<AddFamilyPaymentResponse, ApiError>),
    Updated(Result<UpdateFamilyPaymentResponse, ApiError>),
}

impl CommandResult {
    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Self::Login(r) => r.as_ref().err(),
            Self::Families { result, .. } => result.as_ref().err(),
            Self::Created(r) => r.as_ref().err(),
            Self::Updated(r) => r.as_ref().err(),
        }
    }
}

/// A command stamped with the navigator epoch it was issued under.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub epoch: u64,
    pub command: AsyncCommand,
}

/// A finished command, carrying the epoch of its [`Dispatch`].
#[derive(Debug)]
pub struct Completion {
    pub epoch: u64,
    pub result: CommandResult,
}

pub async fn execute<T: Transport>(cmd: AsyncCommand, client: &ApiClient<T>) -> CommandResult {
    match cmd {
        AsyncCommand::Login { username, password } => {
            CommandResult::Login(auth::authenticate(client, &username, &password).await)
        }
        AsyncCommand::FetchFamilies { generation } => CommandResult::Families {
            generation,
            result: summary::list(client).await,
        },
        AsyncCommand::CreatePayment(draft) => {
            CommandResult::Created(payment::create(client, &draft).await)
        }
        AsyncCommand::UpdatePayment(draft) => {
            CommandResult::Updated(payment::update(client, &draft).await)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_api_client::testing::StubTransport;
    use serde_json::json;

    #[tokio::test]
    async fn fetch_carries_generation_through() {
        let stub = StubTransport::new();
        stub.push_json(200, json!({"status": "success", "data": []}));
        let client = ApiClient::with_transport(stub);

        let result = execute(AsyncCommand::FetchFamilies { generation: 4 }, &client).await;

        match result {
            CommandResult::Families { generation, result } => {
                assert_eq!(generation, 4);
                assert!(result.unwrap().is_empty());
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn login_failure_surfaces_error() {
        let stub = StubTransport::new();
        stub.push_failure("connection refused");
        let client = ApiClient::with_transport(stub);

        let result = execute(
            AsyncCommand::Login {
                username: "admin".into(),
                password: "pw".into(),
            },
            &client,
        )
        .await;

        assert!(matches!(result.error(), Some(ApiError::Unreachable(_))));
    }
}
