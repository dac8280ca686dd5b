use super::*;
use async_trait::async_trait;
use shared::protocol::LoginResponse;
use tokio::sync::Mutex;

use crate::ClientError;

struct FakeAuthApi {
    password: String,
    register_error: Mutex<Option<ClientError>>,
    registered: Mutex<Vec<RegisterRequest>>,
    logins: Mutex<u32>,
}

impl FakeAuthApi {
    fn accepting(password: &str) -> Arc<Self> {
        Arc::new(Self {
            password: password.into(),
            register_error: Mutex::new(None),
            registered: Mutex::new(Vec::new()),
            logins: Mutex::new(0),
        })
    }
}

#[async_trait]
impl AuthApi for FakeAuthApi {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ClientError> {
        *self.logins.lock().await += 1;
        if request.password == self.password {
            Ok(LoginResponse {
                access_token: format!("token-for-{}", request.email),
            })
        } else {
            Err(ClientError::from_status(
                401,
                Some("Invalid email or password".into()),
            ))
        }
    }

    async fn register(&self, request: &RegisterRequest) -> Result<(), ClientError> {
        if let Some(err) = self.register_error.lock().await.take() {
            return Err(err);
        }
        self.registered.lock().await.push(request.clone());
        Ok(())
    }
}

fn registration() -> RegistrationForm {
    RegistrationForm {
        name: "Nia".into(),
        email: "nia@x.com".into(),
        password: "secret1".into(),
        age: String::new(),
        ailment: String::new(),
    }
}

#[tokio::test]
async fn login_stores_the_issued_token() {
    let tokens = TokenStore::new();
    let flow = AuthFlow::new(FakeAuthApi::accepting("pw"), tokens.clone());

    flow.login(&LoginForm {
        email: " a@x.com ".into(),
        password: "pw".into(),
    })
    .await
    .expect("login");

    assert_eq!(tokens.get().await.as_deref(), Some("token-for-a@x.com"));

    flow.logout().await;
    assert!(!tokens.is_signed_in().await);
}

#[tokio::test]
async fn failed_login_passes_server_message_and_keeps_token_empty() {
    let tokens = TokenStore::new();
    let flow = AuthFlow::new(FakeAuthApi::accepting("pw"), tokens.clone());

    let failure = flow
        .login(&LoginForm {
            email: "a@x.com".into(),
            password: "nope".into(),
        })
        .await
        .expect_err("rejected");
    assert_eq!(failure.message, "Invalid email or password");
    assert!(!tokens.is_signed_in().await);
}

#[tokio::test]
async fn blank_login_form_is_rejected_locally() {
    let api = FakeAuthApi::accepting("pw");
    let flow = AuthFlow::new(api.clone(), TokenStore::new());

    let failure = flow
        .login(&LoginForm::default())
        .await
        .expect_err("blank");
    assert_eq!(failure.message, "Missing required fields");
    assert_eq!(*api.logins.lock().await, 0);
}

#[tokio::test]
async fn register_omits_blank_optional_fields() {
    let api = FakeAuthApi::accepting("pw");
    let flow = AuthFlow::new(api.clone(), TokenStore::new());

    flow.register(&registration()).await.expect("register");

    let mut form = registration();
    form.age = "40".into();
    form.ailment = " asthma ".into();
    flow.register(&form).await.expect("register");

    let registered = api.registered.lock().await;
    assert_eq!(registered[0].age, None);
    assert_eq!(registered[0].ailment, None);
    assert_eq!(registered[1].age, Some(40));
    assert_eq!(registered[1].ailment.as_deref(), Some("asthma"));
}

#[tokio::test]
async fn register_enforces_password_length() {
    let api = FakeAuthApi::accepting("pw");
    let flow = AuthFlow::new(api.clone(), TokenStore::new());

    let mut form = registration();
    form.password = "12345".into();
    let failure = flow.register(&form).await.expect_err("short password");
    assert_eq!(failure.message, "Password must be at least 6 characters");
    assert!(api.registered.lock().await.is_empty());
}

#[tokio::test]
async fn register_failure_prefers_error_detail_then_fallback() {
    let api = FakeAuthApi::accepting("pw");
    let flow = AuthFlow::new(api.clone(), TokenStore::new());

    *api.register_error.lock().await = Some(ClientError::from_status(
        409,
        Some("Email already registered".into()),
    ));
    let failure = flow.register(&registration()).await.expect_err("conflict");
    assert_eq!(failure.message, "Email already registered");

    *api.register_error.lock().await = Some(ClientError::from_status(502, None));
    let failure = flow.register(&registration()).await.expect_err("gateway");
    assert_eq!(failure.message, "Registration failed. Please try again.");
}
