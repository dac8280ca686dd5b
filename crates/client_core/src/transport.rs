//! HTTP implementation of [`PatientApi`] and [`AuthApi`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::Serialize;
use shared::{
    domain::{PatientId, PatientRecord},
    error::ApiErrorBody,
    protocol::{LoginRequest, LoginResponse, PatientPayload, RegisterRequest},
};
use tracing::debug;
use url::Url;

use crate::{session::TokenStore, AuthApi, ClientError, PatientApi};

const PATIENTS_PATH: &str = "patients";
const LOGIN_PATH: &str = "api/auth/login";
const REGISTER_PATH: &str = "api/auth/register";

/// Base URLs of the two remote services. They may point at different hosts.
#[derive(Debug, Clone)]
pub struct ApiEndpoints {
    pub patients_base: Url,
    pub auth_base: Url,
}

impl ApiEndpoints {
    pub fn parse(patients_base: &str, auth_base: &str) -> Result<Self, ClientError> {
        Ok(Self {
            patients_base: Url::parse(patients_base.trim())?,
            auth_base: Url::parse(auth_base.trim())?,
        })
    }

    /// Same resource path for listing, updating and deleting.
    pub fn patients(&self) -> Result<Url, ClientError> {
        join(&self.patients_base, PATIENTS_PATH)
    }

    pub fn patient(&self, id: &PatientId) -> Result<Url, ClientError> {
        let mut url = self.patients()?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .push(id.as_str());
        Ok(url)
    }

    pub fn login(&self) -> Result<Url, ClientError> {
        join(&self.auth_base, LOGIN_PATH)
    }

    pub fn register(&self) -> Result<Url, ClientError> {
        join(&self.auth_base, REGISTER_PATH)
    }
}

/// Joins `path` under `base`, keeping any path prefix the base carries.
fn join(base: &Url, path: &str) -> Result<Url, ClientError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    Ok(base.join(path)?)
}

pub struct HttpBackend {
    http: Client,
    endpoints: ApiEndpoints,
    tokens: TokenStore,
}

impl HttpBackend {
    pub fn new(
        endpoints: ApiEndpoints,
        tokens: TokenStore,
        timeout: Option<Duration>,
    ) -> Result<Self, ClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self::with_client(builder.build()?, endpoints, tokens))
    }

    pub fn with_client(http: Client, endpoints: ApiEndpoints, tokens: TokenStore) -> Self {
        Self {
            http,
            endpoints,
            tokens,
        }
    }

    pub fn endpoints(&self) -> &ApiEndpoints {
        &self.endpoints
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    async fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(method = %method, path = url.path(), "outgoing request");
        let builder = self.http.request(method, url);
        match self.tokens.get().await {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: &B,
    ) -> Result<Response, ClientError> {
        let response = self.request(method, url).await.json(body).send().await?;
        check_status(response).await
    }

    async fn send_patient(
        &self,
        method: Method,
        url: Url,
        payload: &PatientPayload,
    ) -> Result<Option<PatientRecord>, ClientError> {
        let response = self.send_json(method, url, payload).await?;
        let body = response.bytes().await?;
        let echoed = serde_json::from_slice::<PatientRecord>(&body).ok();
        if echoed.is_none() {
            debug!("mutation response did not echo a patient record");
        }
        Ok(echoed)
    }
}

/// Turns a non-2xx response into a [`ClientError`] carrying the server's
/// `{error}` or `{message}` detail when one can be decoded.
async fn check_status(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let detail = match response.bytes().await {
        Ok(body) => serde_json::from_slice::<ApiErrorBody>(&body)
            .ok()
            .and_then(|body| body.detail().map(str::to_owned)),
        Err(err) => {
            debug!(error = %err, "failed to read error response body");
            None
        }
    };
    Err(ClientError::from_status(status.as_u16(), detail))
}

#[async_trait]
impl PatientApi for HttpBackend {
    async fn list_patients(&self) -> Result<Vec<PatientRecord>, ClientError> {
        let url = self.endpoints.patients()?;
        let response = self.request(Method::GET, url).await.send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn create_patient(
        &self,
        payload: &PatientPayload,
    ) -> Result<Option<PatientRecord>, ClientError> {
        let url = self.endpoints.patients()?;
        self.send_patient(Method::POST, url, payload).await
    }

    async fn update_patient(
        &self,
        id: &PatientId,
        payload: &PatientPayload,
    ) -> Result<Option<PatientRecord>, ClientError> {
        let url = self.endpoints.patient(id)?;
        self.send_patient(Method::PUT, url, payload).await
    }

    async fn delete_patient(&self, id: &PatientId) -> Result<(), ClientError> {
        let url = self.endpoints.patient(id)?;
        let response = self.request(Method::DELETE, url).await.send().await?;
        check_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl AuthApi for HttpBackend {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError> {
        let url = self.endpoints.login()?;
        let response = self.send_json(Method::POST, url, request).await?;
        Ok(response.json().await?)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<(), ClientError> {
        let url = self.endpoints.register()?;
        self.send_json(Method::POST, url, request).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
