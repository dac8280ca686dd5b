//! Client core for the hospital desk: REST transport, token storage, the
//! login/registration flows and the patient list controller.

use async_trait::async_trait;
use shared::{
    domain::{PatientId, PatientRecord},
    protocol::{LoginRequest, LoginResponse, PatientPayload, RegisterRequest},
};

pub mod auth;
pub mod dashboard;
pub mod error;
pub mod session;
pub mod transport;

pub use dashboard::{
    events::{DashboardEvent, NoticeLevel, Notification},
    form::{FormError, FormState},
    DeleteOutcome, PatientDashboard, SubmitOutcome,
};
pub use error::{user_message, ClientError, ErrorContext};
pub use session::TokenStore;
pub use transport::{ApiEndpoints, HttpBackend};

/// The remote patient collection.
#[async_trait]
pub trait PatientApi: Send + Sync {
    async fn list_patients(&self) -> Result<Vec<PatientRecord>, ClientError>;
    /// Returns the created record when the server echoes one back.
    async fn create_patient(
        &self,
        payload: &PatientPayload,
    ) -> Result<Option<PatientRecord>, ClientError>;
    async fn update_patient(
        &self,
        id: &PatientId,
        payload: &PatientPayload,
    ) -> Result<Option<PatientRecord>, ClientError>;
    async fn delete_patient(&self, id: &PatientId) -> Result<(), ClientError>;
}

/// The remote auth service.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError>;
    async fn register(&self, request: &RegisterRequest) -> Result<(), ClientError>;
}
