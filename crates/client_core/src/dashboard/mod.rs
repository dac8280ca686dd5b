//! Patient list controller: owns the local patient list, the form and the
//! pending delete, and reconciles them with the remote collection.

pub mod events;
pub mod form;

use std::sync::Arc;

use shared::domain::{PatientId, PatientRecord};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::{
    error::{user_message, ErrorContext, DELETE_FAILED},
    PatientApi,
};

use events::{DashboardEvent, Notification};
use form::{FormError, FormState};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created,
    Updated,
    /// Rejected locally; no request was sent.
    Invalid(FormError),
    /// Rejected by the server or the transport; the form is kept.
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    NothingStaged,
    Deleted(PatientId),
    /// The server refused or could not be reached; the local removal was
    /// rolled back and a full reload attempted.
    Reconciled {
        id: PatientId,
        message: String,
        reloaded: bool,
    },
}

/// A local removal awaiting server confirmation.
#[derive(Debug)]
struct PendingRemoval {
    index: usize,
    record: PatientRecord,
}

impl PendingRemoval {
    /// Removes the record with `id` from `list`, if present.
    fn apply(list: &mut Vec<PatientRecord>, id: &PatientId) -> Option<Self> {
        let index = list.iter().position(|record| &record.id == id)?;
        let record = list.remove(index);
        Some(Self { index, record })
    }

    fn rollback(self, list: &mut Vec<PatientRecord>) {
        let index = self.index.min(list.len());
        list.insert(index, self.record);
    }
}

pub struct PatientDashboard {
    api: Arc<dyn PatientApi>,
    patients: Vec<PatientRecord>,
    form: FormState,
    loading: bool,
    error: Option<String>,
    pending_delete: Option<PatientId>,
    events: broadcast::Sender<DashboardEvent>,
}

impl PatientDashboard {
    /// An unmounted dashboard with empty state. Nothing is fetched.
    pub fn new(api: Arc<dyn PatientApi>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            api,
            patients: Vec::new(),
            form: FormState::default(),
            loading: false,
            error: None,
            pending_delete: None,
            events,
        }
    }

    /// Creates fresh dashboard state and performs the initial load.
    pub async fn mount(api: Arc<dyn PatientApi>) -> Self {
        let mut dashboard = Self::new(api);
        dashboard.load().await;
        dashboard
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<DashboardEvent> {
        self.events.subscribe()
    }

    pub fn patients(&self) -> &[PatientRecord] {
        &self.patients
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Submit, edit and delete controls are disabled while a call is out.
    pub fn controls_enabled(&self) -> bool {
        !self.loading
    }

    /// The message for the error banner, if the last operation failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn pending_delete(&self) -> Option<&PatientId> {
        self.pending_delete.as_ref()
    }

    pub fn confirmation_open(&self) -> bool {
        self.pending_delete.is_some()
    }

    /// Replaces the local list with the server's collection. Returns whether
    /// the list was refreshed; on failure the previous list is kept.
    pub async fn load(&mut self) -> bool {
        self.set_loading(true);
        self.error = None;

        let result = self.api.list_patients().await;
        let refreshed = match result {
            Ok(patients) => {
                self.patients = patients;
                self.emit(DashboardEvent::PatientsChanged {
                    count: self.patients.len(),
                });
                true
            }
            Err(err) => {
                warn!(error = %err, "failed to load patients");
                self.fail(user_message(&err, ErrorContext::Load));
                false
            }
        };

        self.set_loading(false);
        refreshed
    }

    /// Creates or updates a patient from the form, then resyncs the list.
    pub async fn submit(&mut self) -> SubmitOutcome {
        if let Err(invalid) = self.form.validate() {
            self.fail(invalid.to_string());
            return SubmitOutcome::Invalid(invalid);
        }

        self.set_loading(true);
        let payload = self.form.to_payload();
        let edit_id = self.form.edit_id.clone();

        let result = match &edit_id {
            Some(id) => self.api.update_patient(id, &payload).await,
            None => self.api.create_patient(&payload).await,
        };

        let outcome = match result {
            Ok(_) => {
                let (outcome, notice) = match &edit_id {
                    Some(id) => {
                        info!(patient_id = %id, "patient updated");
                        (SubmitOutcome::Updated, "Patient updated successfully!")
                    }
                    None => {
                        info!("patient created");
                        (SubmitOutcome::Created, "Patient added successfully!")
                    }
                };
                self.notify(Notification::success(notice));
                self.form.clear();
                self.load().await;
                outcome
            }
            Err(err) => {
                warn!(error = %err, editing = edit_id.is_some(), "patient submit failed");
                let message = user_message(&err, ErrorContext::Submit);
                self.fail(message.clone());
                SubmitOutcome::Failed { message }
            }
        };

        self.set_loading(false);
        outcome
    }

    /// Stages `id` for deletion and opens the confirmation prompt.
    pub fn request_delete(&mut self, id: PatientId) {
        self.pending_delete = Some(id.clone());
        self.emit(DashboardEvent::ConfirmDeleteRequested { id });
    }

    pub fn cancel_delete(&mut self) {
        if self.pending_delete.take().is_some() {
            self.emit(DashboardEvent::ConfirmDeleteDismissed);
        }
    }

    /// Deletes the staged patient: the record is removed locally, the server
    /// is asked to confirm, and a refusal rolls the removal back and reloads.
    pub async fn confirm_delete(&mut self) -> DeleteOutcome {
        let Some(id) = self.pending_delete.take() else {
            return DeleteOutcome::NothingStaged;
        };

        self.set_loading(true);
        let removal = PendingRemoval::apply(&mut self.patients, &id);

        let result = self.api.delete_patient(&id).await;
        let outcome = match result {
            Ok(()) => {
                info!(patient_id = %id, "patient deleted");
                self.emit(DashboardEvent::PatientsChanged {
                    count: self.patients.len(),
                });
                self.notify(Notification::success("Patient deleted successfully!"));
                DeleteOutcome::Deleted(id)
            }
            Err(err) => {
                warn!(patient_id = %id, error = %err, "delete failed; reloading patients");
                if let Some(removal) = removal {
                    removal.rollback(&mut self.patients);
                }
                let message = user_message(&err, ErrorContext::Delete);
                self.notify(Notification::error(message.clone()));
                let reloaded = self.load().await;
                self.error.get_or_insert_with(|| DELETE_FAILED.to_string());
                DeleteOutcome::Reconciled {
                    id,
                    message,
                    reloaded,
                }
            }
        };

        self.emit(DashboardEvent::ConfirmDeleteDismissed);
        self.set_loading(false);
        outcome
    }

    /// Copies `record` into the form for editing.
    pub fn enter_edit_mode(&mut self, record: &PatientRecord) {
        self.form.load_record(record);
        self.emit(DashboardEvent::FocusForm);
    }

    pub fn cancel_edit(&mut self) {
        self.form.clear();
    }

    fn set_loading(&mut self, loading: bool) {
        if self.loading != loading {
            self.loading = loading;
            self.emit(DashboardEvent::LoadingChanged(loading));
        }
    }

    fn fail(&mut self, message: String) {
        self.notify(Notification::error(message.clone()));
        self.error = Some(message);
    }

    fn notify(&self, notification: Notification) {
        self.emit(DashboardEvent::Notice(notification));
    }

    fn emit(&self, event: DashboardEvent) {
        // No subscribers is fine; the view may not be listening yet.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "../tests/dashboard_tests.rs"]
mod tests;
