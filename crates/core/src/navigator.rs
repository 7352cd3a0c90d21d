//! Which screen is showing, and the events that move between screens.

use tracing::debug;

/// The four screens. Exactly one is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Login,
    Summary,
    CreateForm,
    EditForm { family_id: i64, family_name: String },
}

impl Screen {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Summary => "summary",
            Self::CreateForm => "create-form",
            Self::EditForm { .. } => "edit-form",
        }
    }

    /// Screens that are only reachable with a credential.
    pub fn requires_session(&self) -> bool {
        !matches!(self, Self::Login)
    }

    pub fn is_form(&self) -> bool {
        matches!(self, Self::CreateForm | Self::EditForm { .. })
    }
}

/// Everything that can move the navigator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEvent {
    LoginSucceeded,
    Logout,
    AddNew,
    SelectRecord { family_id: i64, family_name: String },
    Cancel,
    CreateSucceeded,
    UpdateSucceeded,
    SessionExpired,
}

impl NavEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoginSucceeded => "login-succeeded",
            Self::Logout => "logout",
            Self::AddNew => "add-new",
            Self::SelectRecord { .. } => "select-record",
            Self::Cancel => "cancel",
            Self::CreateSucceeded => "create-succeeded",
            Self::UpdateSucceeded => "update-succeeded",
            Self::SessionExpired => "session-expired",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavError {
    #[error("{event} is not allowed on the {screen} screen")]
    IllegalTransition {
        screen: &'static str,
        event: &'static str,
    },
}

/// Outcome of an accepted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: Screen,
    pub to: Screen,
    /// The refresh generation was bumped; the summary must refetch.
    pub refreshed: bool,
}

impl Transition {
    /// Entering the summary always means a fresh fetch.
    pub fn enters_summary(&self) -> bool {
        self.to == Screen::Summary
    }
}

/// Finite-state controller over [`Screen`].
///
/// `refresh_generation` only ever grows; the summary provider compares it
/// against the generation it last loaded. `epoch` grows on every accepted
/// event so in-flight results can tell whether their screen is still current.
#[derive(Debug, Clone)]
pub struct Navigator {
    screen: Screen,
    refresh_generation: u64,
    epoch: u64,
}

impl Navigator {
    /// Start on the summary when a session was restored, otherwise on login.
    pub fn new(authenticated: bool) -> Self {
        Self {
            screen: if authenticated {
                Screen::Summary
            } else {
                Screen::Login
            },
            refresh_generation: 0,
            epoch: 0,
        }
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn refresh_generation(&self) -> u64 {
        self.refresh_generation
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn dispatch(&mut self, event: NavEvent) -> Result<Transition, NavError> {
        let (to, refreshed) = match (&self.screen, event) {
            (_, NavEvent::SessionExpired) => (Screen::Login, false),
            (Screen::Login, NavEvent::LoginSucceeded) => (Screen::Summary, false),
            (screen, NavEvent::Logout) if screen.requires_session() => (Screen::Login, false),
            (Screen::Summary, NavEvent::AddNew) => (Screen::CreateForm, false),
            (
                Screen::Summary,
                NavEvent::SelectRecord {
                    family_id,
                    family_name,
                },
            ) => (
                Screen::EditForm {
                    family_id,
                    family_name,
                },
                false,
            ),
            (screen, NavEvent::Cancel) if screen.is_form() => (Screen::Summary, false),
            (Screen::CreateForm, NavEvent::CreateSucceeded) => (Screen::Summary, true),
            (Screen::EditForm { .. }, NavEvent::UpdateSucceeded) => (Screen::Summary, true),
            (screen, event) => {
                return Err(NavError::IllegalTransition {
                    screen: screen.name(),
                    event: event.name(),
                });
            }
        };

        if refreshed {
            self.refresh_generation += 1;
        }
        self.epoch += 1;
        let from = std::mem::replace(&mut self.screen, to.clone());
        debug!(
            from = from.name(),
            to = to.name(),
            refresh = self.refresh_generation,
            "screen transition"
        );
        Ok(Transition {
            from,
            to,
            refreshed,
        })
    }
}
