use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use harvest_api_client::{ApiError, ReqwestTransport, Transport};
use harvest_core::payment::{CreatePaymentDraft, UpdatePaymentDraft};
use harvest_core::summary::SummaryRow;
use harvest_core::{Controller, NavEvent, Screen, auth};
use tracing::{debug, warn};

use crate::async_ops::{AsyncCommand, CommandResult, Completion, Dispatch};

/// Flash message severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Error,
    Info,
}

/// State for the username/password login form.
#[derive(Debug, Default)]
pub struct LoginState {
    pub field_index: usize, // 0=username, 1=password
    pub username: String,
    pub password: String,
    pub error: Option<String>,
    pub submitting: bool,
}

/// Create form fields, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateField {
    FamilyName,
    ChildCount,
    Amount,
    Method,
}

impl CreateField {
    pub const ALL: [Self; 4] = [Self::FamilyName, Self::ChildCount, Self::Amount, Self::Method];
}

#[derive(Debug, Default)]
pub struct CreateFormState {
    pub field_index: usize,
    pub draft: CreatePaymentDraft,
    pub error: Option<String>,
    pub submitting: bool,
}

impl CreateFormState {
    pub fn field(&self) -> CreateField {
        CreateField::ALL[self.field_index.min(CreateField::ALL.len() - 1)]
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.field() {
            CreateField::FamilyName => Some(&mut self.draft.family_name),
            CreateField::ChildCount => Some(&mut self.draft.child_count),
            CreateField::Amount => Some(&mut self.draft.amount),
            CreateField::Method => None,
        }
    }
}

/// Record-payment form fields, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditField {
    Amount,
    Method,
}

#[derive(Debug)]
pub struct EditFormState {
    pub field: EditField,
    pub draft: UpdatePaymentDraft,
    pub error: Option<String>,
    pub submitting: bool,
}

impl EditFormState {
    pub fn new(family_id: i64, family_name: &str) -> Self {
        Self {
            field: EditField::Amount,
            draft: UpdatePaymentDraft::new(family_id, family_name),
            error: None,
            submitting: false,
        }
    }
}

pub struct App<T: Transport = ReqwestTransport> {
    pub controller: Controller<T>,
    pub server_url: String,

    pub login: LoginState,
    pub create_form: CreateFormState,
    pub edit_form: Option<EditFormState>,

    pub search_query: String,
    pub searching: bool,
    pub selected: usize,

    pub flash_message: Option<(String, FlashLevel)>,
    pub pending_command: Option<Dispatch>,
}

impl<T: Transport> App<T> {
    pub fn new(controller: Controller<T>, server_url: impl Into<String>) -> Self {
        Self {
            controller,
            server_url: server_url.into(),
            login: LoginState::default(),
            create_form: CreateFormState::default(),
            edit_form: None,
            search_query: String::new(),
            searching: false,
            selected: 0,
            flash_message: None,
            pending_command: None,
        }
    }

    pub fn screen(&self) -> &Screen {
        self.controller.screen()
    }

    /// Rows currently visible in the summary table.
    pub fn visible_rows(&self) -> Vec<SummaryRow> {
        self.controller.summary().rows(&self.search_query)
    }

    pub fn selected_row(&self) -> Option<SummaryRow> {
        self.visible_rows().into_iter().nth(self.selected)
    }

    // ── Command dispatch ──────────────────────────────────────────────

    fn dispatch(&mut self, command: AsyncCommand) {
        let epoch = self.controller.navigator().epoch();
        debug!(command = command.name(), epoch, "dispatching");
        self.pending_command = Some(Dispatch { epoch, command });
    }

    pub fn take_pending(&mut self) -> Option<Dispatch> {
        self.pending_command.take()
    }

    /// Per-frame housekeeping: start a summary fetch when one is due.
    pub fn tick(&mut self) {
        if self.pending_command.is_some() || !self.controller.summary_needs_fetch() {
            return;
        }
        if let Some(generation) = self.controller.begin_refresh() {
            self.dispatch(AsyncCommand::FetchFamilies { generation });
        }
    }

    fn retry_summary(&mut self) {
        if self.controller.summary().is_loading() {
            self.flash_info("Already loading");
            return;
        }
        if let Some(generation) = self.controller.begin_refresh() {
            self.dispatch(AsyncCommand::FetchFamilies { generation });
        }
    }

    pub fn apply_command_result(&mut self, completion: Completion) {
        let Completion { epoch, result } = completion;

        if let Some(ApiError::SessionExpired) = result.error() {
            self.controller.handle_api_error(ApiError::SessionExpired);
            self.reset_forms();
            return;
        }

        if epoch != self.controller.navigator().epoch() {
            debug!(
                epoch,
                current = self.controller.navigator().epoch(),
                "discarding result for a screen that is no longer shown"
            );
            if matches!(result, CommandResult::Login(_)) {
                self.login.submitting = false;
            }
            return;
        }

        match result {
            CommandResult::Login(Ok(credential)) => {
                self.login.submitting = false;
                match self.controller.complete_login(credential) {
                    Ok(_) => {
                        self.login = LoginState::default();
                        self.search_query.clear();
                        self.selected = 0;
                    }
                    Err(e) => {
                        warn!("could not store session: {e}");
                        self.login.error = Some(e.to_string());
                    }
                }
            }
            CommandResult::Login(Err(e)) => {
                self.login.submitting = false;
                self.login.error = Some(e.to_string());
            }

            CommandResult::Families { generation, result } => {
                self.controller.finish_refresh(generation, result);
                self.clamp_selection();
            }

            CommandResult::Created(Ok(resp)) => {
                self.create_form.submitting = false;
                if let Err(e) = self.controller.on_create_succeeded(&resp) {
                    self.flash_error(e.to_string());
                }
            }
            CommandResult::Created(Err(e)) => {
                self.create_form.submitting = false;
                self.create_form.error = Some(e.to_string());
            }

            CommandResult::Updated(Ok(_)) => {
                if let Err(e) = self.controller.on_update_succeeded() {
                    self.flash_error(e.to_string());
                }
                self.edit_form = None;
            }
            CommandResult::Updated(Err(e)) => {
                if let Some(form) = self.edit_form.as_mut() {
                    form.submitting = false;
                    form.error = Some(e.to_string());
                }
            }
        }
    }

    fn reset_forms(&mut self) {
        self.login.submitting = false;
        self.create_form = CreateFormState::default();
        self.edit_form = None;
        self.searching = false;
        self.search_query.clear();
        self.selected = 0;
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_rows().len();
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }

    // ── Navigation ────────────────────────────────────────────────────

    fn navigate(&mut self, event: NavEvent) {
        match self.controller.navigate(event) {
            Ok(transition) => match transition.to {
                Screen::CreateForm => self.create_form = CreateFormState::default(),
                Screen::EditForm {
                    family_id,
                    ref family_name,
                } => self.edit_form = Some(EditFormState::new(family_id, family_name)),
                Screen::Summary => self.edit_form = None,
                Screen::Login => {}
            },
            Err(e) => debug!("{e}"),
        }
    }

    fn logout(&mut self) {
        if let Err(e) = self.controller.logout() {
            self.flash_error(e.to_string());
        }
        self.reset_forms();
        self.login = LoginState::default();
    }

    // ── Keys ──────────────────────────────────────────────────────────

    /// Handle one key press. Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        self.flash_message = None;

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => return true,
                KeyCode::Char('l') => {
                    if self.screen().requires_session() {
                        self.logout();
                    }
                    return false;
                }
                _ => {}
            }
        }

        let screen = self.screen().clone();
        match screen {
            Screen::Login => self.handle_login_key(key.code),
            Screen::Summary => {
                if self.searching {
                    self.handle_search_key(key.code)
                } else {
                    self.handle_summary_key(key.code)
                }
            }
            Screen::CreateForm => self.handle_create_key(key.code),
            Screen::EditForm { .. } => self.handle_edit_key(key.code),
        }
    }

    fn handle_login_key(&mut self, key: KeyCode) -> bool {
        if self.login.submitting {
            return false;
        }
        match key {
            KeyCode::Esc => {
                if self.login.error.take().is_none() {
                    self.controller.dismiss_error();
                }
            }
            KeyCode::Tab | KeyCode::Down | KeyCode::BackTab | KeyCode::Up => {
                self.login.field_index = 1 - self.login.field_index.min(1);
            }
            KeyCode::Backspace => {
                self.login.error = None;
                self.login_field_mut().pop();
            }
            KeyCode::Char(c) => {
                self.login.error = None;
                self.login_field_mut().push(c);
            }
            KeyCode::Enter => self.submit_login(),
            _ => {}
        }
        false
    }

    fn login_field_mut(&mut self) -> &mut String {
        if self.login.field_index == 0 {
            &mut self.login.username
        } else {
            &mut self.login.password
        }
    }

    fn submit_login(&mut self) {
        if let Err(e) = auth::validate_credentials(&self.login.username, &self.login.password) {
            self.login.error = Some(e.to_string());
            return;
        }
        self.login.error = None;
        self.login.submitting = true;
        self.dispatch(AsyncCommand::Login {
            username: self.login.username.clone(),
            password: self.login.password.clone(),
        });
    }

    fn handle_search_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Esc => {
                self.searching = false;
                self.search_query.clear();
            }
            KeyCode::Enter => {
                self.searching = false;
            }
            KeyCode::Backspace => {
                self.search_query.pop();
            }
            KeyCode::Char(c) => {
                self.search_query.push(c);
            }
            _ => return false,
        }
        self.selected = 0;
        false
    }

    fn handle_summary_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('q') => return true,
            KeyCode::Char('j') | KeyCode::Down => {
                if self.selected + 1 < self.visible_rows().len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Char('/') => {
                self.controller.dismiss_notice();
                self.searching = true;
            }
            KeyCode::Char('a') => self.navigate(NavEvent::AddNew),
            KeyCode::Char('r') => self.retry_summary(),
            KeyCode::Enter => {
                if let Some(row) = self.selected_row() {
                    self.navigate(NavEvent::SelectRecord {
                        family_id: row.family_id,
                        family_name: row.family_name,
                    });
                }
            }
            KeyCode::Esc | KeyCode::Char('x') => self.controller.dismiss_notice(),
            _ => {}
        }
        false
    }

    fn handle_create_key(&mut self, key: KeyCode) -> bool {
        let form = &mut self.create_form;
        if form.submitting {
            return false;
        }
        let field_count = CreateField::ALL.len();
        match key {
            KeyCode::Esc => {
                if form.error.take().is_none() {
                    self.navigate(NavEvent::Cancel);
                }
            }
            KeyCode::Tab | KeyCode::Down => form.field_index = (form.field_index + 1) % field_count,
            KeyCode::BackTab | KeyCode::Up => {
                form.field_index = (form.field_index + field_count - 1) % field_count;
            }
            KeyCode::Left if form.field() == CreateField::Method => {
                form.draft.payment_method = form.draft.payment_method.prev();
            }
            KeyCode::Right | KeyCode::Char(' ') if form.field() == CreateField::Method => {
                form.draft.payment_method = form.draft.payment_method.next();
            }
            KeyCode::Backspace => {
                form.error = None;
                if let Some(text) = form.text_mut() {
                    text.pop();
                }
            }
            KeyCode::Char(c) => {
                form.error = None;
                if let Some(text) = form.text_mut() {
                    text.push(c);
                }
            }
            KeyCode::Enter => match form.draft.validate() {
                Ok(_) => {
                    form.error = None;
                    form.submitting = true;
                    let draft = form.draft.clone();
                    self.dispatch(AsyncCommand::CreatePayment(draft));
                }
                Err(e) => form.error = Some(e.to_string()),
            },
            _ => {}
        }
        false
    }

    fn handle_edit_key(&mut self, key: KeyCode) -> bool {
        let Some(form) = self.edit_form.as_mut() else {
            return false;
        };
        if form.submitting {
            return false;
        }
        match key {
            KeyCode::Esc => {
                if form.error.take().is_none() {
                    self.navigate(NavEvent::Cancel);
                }
            }
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Down | KeyCode::Up => {
                form.field = match form.field {
                    EditField::Amount => EditField::Method,
                    EditField::Method => EditField::Amount,
                };
            }
            KeyCode::Left if form.field == EditField::Method => {
                form.draft.payment_method = form.draft.payment_method.prev();
            }
            KeyCode::Right | KeyCode::Char(' ') if form.field == EditField::Method => {
                form.draft.payment_method = form.draft.payment_method.next();
            }
            KeyCode::Backspace if form.field == EditField::Amount => {
                form.error = None;
                form.draft.amount.pop();
            }
            KeyCode::Char(c) if form.field == EditField::Amount => {
                form.error = None;
                form.draft.amount.push(c);
            }
            KeyCode::Enter => match form.draft.validate() {
                Ok(_) => {
                    form.error = None;
                    form.submitting = true;
                    let draft = form.draft.clone();
                    self.dispatch(AsyncCommand::UpdatePayment(draft));
                }
                Err(e) => form.error = Some(e.to_string()),
            },
            _ => {}
        }
        false
    }

    pub fn flash_error(&mut self, msg: impl Into<String>) {
        self.flash_message = Some((msg.into(), FlashLevel::Error));
    }

    pub fn flash_info(&mut self, msg: impl Into<String>) {
        self.flash_message = Some((msg.into(), FlashLevel::Info));
    }
}
