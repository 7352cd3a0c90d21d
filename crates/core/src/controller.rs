//! The one owner of session, navigation and summary state.
//!
//! Front ends either call the async helpers here directly or run the network
//! half themselves (with a clone of [`Controller::client`]) and feed the
//! outcome back through the synchronous `complete_*`/`finish_*`/`on_*`
//! methods.

use std::sync::Arc;

use harvest_api::{AddFamilyPaymentResponse, FamilySummary, UpdateFamilyPaymentResponse};
use harvest_api_client::{ApiClient, ApiError, ReqwestTransport, Transport};
use tracing::{debug, info, warn};

use crate::auth;
use crate::navigator::{NavError, NavEvent, Navigator, Screen, Transition};
use crate::payment::{self, CreatePaymentDraft, UpdatePaymentDraft};
use crate::session::{
    Credential, SESSION_EXPIRED_MESSAGE, Session, SessionError, SessionStore, SharedSession,
};
use crate::storage::KeyValueStore;
use crate::summary::{self, SummaryProvider};

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Navigation(#[from] NavError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ControllerError {
    /// The API error behind this failure, if any.
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }
}

pub struct Controller<T: Transport = ReqwestTransport> {
    client: ApiClient<T>,
    session: SharedSession,
    navigator: Navigator,
    summary: SummaryProvider,
    notice: Option<String>,
}

impl<T: Transport> Controller<T> {
    /// Restore any persisted session, wire it into the client, and pick the
    /// first screen.
    pub fn new(client: ApiClient<T>, storage: Box<dyn KeyValueStore>) -> Self {
        let mut store = SessionStore::new(storage);
        let authenticated = store.restore();
        let session = SharedSession::new(store);
        if client.install_hooks(Arc::new(session.clone())).is_some() {
            debug!("replaced previously installed session hooks");
        }
        let navigator = Navigator::new(authenticated);
        info!(screen = navigator.screen().name(), "controller started");
        Self {
            client,
            session,
            navigator,
            summary: SummaryProvider::new(),
            notice: None,
        }
    }

    pub fn client(&self) -> &ApiClient<T> {
        &self.client
    }

    pub fn session(&self) -> Session {
        self.session.snapshot()
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn screen(&self) -> &Screen {
        self.navigator.screen()
    }

    pub fn summary(&self) -> &SummaryProvider {
        &self.summary
    }

    /// Success message carried back to the summary after a submission.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Hide the session banner.
    pub fn dismiss_error(&mut self) {
        self.session.lock().dismiss_error();
    }

    // ── Session ───────────────────────────────────────────────────────────

    pub fn complete_login(&mut self, credential: Credential) -> Result<Transition, ControllerError> {
        self.session.lock().login(credential)?;
        self.navigate(NavEvent::LoginSucceeded)
    }

    /// Clear the session and return to login. Memory is always cleared; a
    /// storage failure is reported afterwards.
    pub fn logout(&mut self) -> Result<(), ControllerError> {
        let cleared = self.session.lock().logout();
        if self.navigator.screen().requires_session() {
            self.navigator.dispatch(NavEvent::Logout)?;
        }
        self.reset_views();
        cleared.map_err(Into::into)
    }

    /// Route a failed call. `SessionExpired` forces the login screen; the
    /// session itself was already torn down by the client's hooks.
    pub fn handle_api_error(&mut self, err: ApiError) -> ApiError {
        if err.is_session_expired() {
            let mut store = self.session.lock();
            // Still authenticated means no hooks saw the 401.
            if store.session().is_authenticated() {
                if let Err(e) = store.expire(SESSION_EXPIRED_MESSAGE) {
                    warn!("session cleared in memory but not on disk: {e}");
                }
            }
            drop(store);
            if let Err(e) = self.navigator.dispatch(NavEvent::SessionExpired) {
                debug!("{e}");
            }
            self.reset_views();
        }
        err
    }

    // ── Navigation ────────────────────────────────────────────────────────

    pub fn navigate(&mut self, event: NavEvent) -> Result<Transition, ControllerError> {
        let transition = self.navigator.dispatch(event)?;
        if transition.enters_summary() {
            self.summary.invalidate();
        }
        if transition.from == Screen::Summary {
            self.notice = None;
        }
        Ok(transition)
    }

    pub fn on_create_succeeded(
        &mut self,
        resp: &AddFamilyPaymentResponse,
    ) -> Result<Transition, ControllerError> {
        let transition = self.navigate(NavEvent::CreateSucceeded)?;
        self.notice = Some(payment::created_message(resp));
        Ok(transition)
    }

    pub fn on_update_succeeded(&mut self) -> Result<Transition, ControllerError> {
        let transition = self.navigate(NavEvent::UpdateSucceeded)?;
        self.notice = Some(payment::PAYMENT_RECORDED_MESSAGE.to_string());
        Ok(transition)
    }

    fn reset_views(&mut self) {
        self.summary = SummaryProvider::new();
        self.notice = None;
    }

    // ── Summary ───────────────────────────────────────────────────────────

    pub fn summary_needs_fetch(&self) -> bool {
        *self.navigator.screen() == Screen::Summary
            && self.summary.needs_fetch(self.navigator.refresh_generation())
    }

    /// Mark a fetch as started. Returns the generation to hand back to
    /// [`Self::finish_refresh`], or `None` off the summary screen.
    pub fn begin_refresh(&mut self) -> Option<u64> {
        if *self.navigator.screen() != Screen::Summary {
            return None;
        }
        let generation = self.navigator.refresh_generation();
        self.summary.begin_fetch(generation);
        Some(generation)
    }

    pub fn finish_refresh(
        &mut self,
        generation: u64,
        result: Result<Vec<FamilySummary>, ApiError>,
    ) {
        match result {
            Err(ApiError::SessionExpired) => {
                self.handle_api_error(ApiError::SessionExpired);
            }
            result => {
                self.summary.finish_fetch(generation, result);
            }
        }
    }

    // ── Async flows ───────────────────────────────────────────────────────

    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), ControllerError> {
        let credential = auth::authenticate(&self.client, username, password).await?;
        self.complete_login(credential)?;
        Ok(())
    }

    pub async fn refresh_summary(&mut self) -> Result<(), ControllerError> {
        let Some(generation) = self.begin_refresh() else {
            return Ok(());
        };
        let result = summary::list(&self.client).await;
        let failure = result.as_ref().err().cloned();
        self.finish_refresh(generation, result);
        match failure {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    pub async fn submit_create(
        &mut self,
        draft: &CreatePaymentDraft,
    ) -> Result<AddFamilyPaymentResponse, ControllerError> {
        match payment::create(&self.client, draft).await {
            Ok(resp) => {
                self.on_create_succeeded(&resp)?;
                Ok(resp)
            }
            Err(e) => Err(self.handle_api_error(e).into()),
        }
    }

    pub async fn submit_update(
        &mut self,
        draft: &UpdatePaymentDraft,
    ) -> Result<UpdateFamilyPaymentResponse, ControllerError> {
        match payment::update(&self.client, draft).await {
            Ok(resp) => {
                self.on_update_succeeded()?;
                Ok(resp)
            }
            Err(e) => Err(self.handle_api_error(e).into()),
        }
    }
}

impl<T: Transport> Drop for Controller<T> {
    fn drop(&mut self) {
        self.client.eject_hooks();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use harvest_api_client::testing::StubTransport;
    use serde_json::json;

    fn controller() -> (Controller<StubTransport>, StubTransport) {
        let stub = StubTransport::new();
        let client = ApiClient::with_transport(stub.clone());
        (Controller::new(client, Box::new(MemoryStore::new())), stub)
    }

    fn logged_in() -> (Controller<StubTransport>, StubTransport) {
        let (mut c, stub) = controller();
        c.complete_login(Credential::new("jwt", Some("admin".into())))
            .unwrap();
        (c, stub)
    }

    #[test]
    fn fresh_store_starts_on_login() {
        let (c, _) = controller();
        assert_eq!(c.screen(), &Screen::Login);
        assert!(!c.session().is_authenticated());
        assert!(!c.summary_needs_fetch());
    }

    #[test]
    fn login_lands_on_summary_and_requests_a_fetch() {
        let (c, _) = logged_in();
        assert_eq!(c.screen(), &Screen::Summary);
        assert!(c.summary_needs_fetch());
    }

    #[test]
    fn illegal_navigation_is_reported() {
        let (mut c, _) = logged_in();
        let err = c.navigate(NavEvent::Cancel).unwrap_err();
        assert!(matches!(err, ControllerError::Navigation(_)));
        assert_eq!(c.screen(), &Screen::Summary);
    }

    #[test]
    fn logout_from_a_form_returns_to_login() {
        let (mut c, _) = logged_in();
        c.navigate(NavEvent::AddNew).unwrap();
        c.logout().unwrap();
        assert_eq!(c.screen(), &Screen::Login);
        assert_eq!(c.session().last_error(), None);
    }

    #[test]
    fn session_expired_without_hooks_still_tears_down() {
        let (mut c, _) = logged_in();
        c.client().eject_hooks();

        c.handle_api_error(ApiError::SessionExpired);

        assert_eq!(c.screen(), &Screen::Login);
        assert_eq!(c.session().last_error(), Some(SESSION_EXPIRED_MESSAGE));
    }

    #[test]
    fn other_errors_leave_screen_alone() {
        let (mut c, _) = logged_in();
        c.navigate(NavEvent::AddNew).unwrap();
        let err = c.handle_api_error(ApiError::Rejected("Invalid amount".into()));
        assert_eq!(err, ApiError::Rejected("Invalid amount".into()));
        assert_eq!(c.screen(), &Screen::CreateForm);
    }

    #[tokio::test]
    async fn update_success_sets_notice_and_refresh() {
        let (mut c, stub) = logged_in();
        stub.push_json(200, json!({"status": "success", "payment_id": 5}));
        c.navigate(NavEvent::SelectRecord {
            family_id: 3,
            family_name: "Smith".into(),
        })
        .unwrap();
        let mut draft = UpdatePaymentDraft::new(3, "Smith");
        draft.amount = "10".into();

        c.submit_update(&draft).await.unwrap();

        assert_eq!(c.screen(), &Screen::Summary);
        assert_eq!(c.notice(), Some(payment::PAYMENT_RECORDED_MESSAGE));
        assert_eq!(c.navigator().refresh_generation(), 1);
        assert_eq!(stub.calls()[0].bearer.as_deref(), Some("jwt"));
    }

    #[tokio::test]
    async fn leaving_summary_clears_notice() {
        let (mut c, stub) = logged_in();
        stub.push_json(200, json!({"family_id": 1, "payment_id": 2}));
        c.navigate(NavEvent::AddNew).unwrap();
        let draft = CreatePaymentDraft {
            family_name: "Lee".into(),
            child_count: "1".into(),
            amount: "5".into(),
            ..Default::default()
        };
        c.submit_create(&draft).await.unwrap();
        assert!(c.notice().is_some());

        c.navigate(NavEvent::AddNew).unwrap();
        assert_eq!(c.notice(), None);
    }

    #[test]
    fn dropping_controller_ejects_hooks() {
        let (c, _) = controller();
        let client = c.client().clone();
        assert!(client.http().has_hooks());
        drop(c);
        assert!(!client.http().has_hooks());
    }
}
