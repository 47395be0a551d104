//! Application state module

use std::{fmt, sync::Arc};

use crate::domain::email::EmailService;

/// Global application state
#[derive(Clone)]
pub struct AppState<E: EmailService> {
    /// Email service
    pub emails: Arc<E>,
}

impl<E: EmailService> AppState<E> {
    /// Create a new application state
    pub fn new(emails: E) -> Self {
        Self {
            emails: Arc::new(emails),
        }
    }
}

impl<E: EmailService> fmt::Debug for AppState<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("emails", &"EmailService")
            .finish()
    }
}
