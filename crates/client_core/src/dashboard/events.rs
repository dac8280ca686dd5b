//! Events emitted by the patient dashboard for whatever renders it.

use shared::domain::PatientId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardEvent {
    Notice(Notification),
    PatientsChanged { count: usize },
    LoadingChanged(bool),
    /// The form was populated for editing and should be brought into view.
    FocusForm,
    ConfirmDeleteRequested { id: PatientId },
    ConfirmDeleteDismissed,
}
