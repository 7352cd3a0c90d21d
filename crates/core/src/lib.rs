//! Session, navigation and summary logic for the Harvest payment client.
//!
//! Everything here is front-end agnostic; the TUI drives it through
//! [`Controller`].

pub mod auth;
pub mod controller;
pub mod navigator;
pub mod payment;
pub mod session;
pub mod storage;
pub mod summary;

pub use controller::{Controller, ControllerError};
pub use navigator::{NavError, NavEvent, Navigator, Screen, Transition};
pub use session::{Credential, Session, SessionError, SessionStore, SharedSession};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};

#[cfg(any(test, feature = "testing"))]
pub mod testing;
