use serde::{Deserialize, Serialize};

/// Body of `POST /patients` and `PUT /patients/{id}`.
///
/// `age` is `null` on the wire when the form text was not a number.
/// `password` is omitted entirely when `None`, which the update endpoint
/// reads as "leave unchanged".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientPayload {
    pub name: String,
    pub age: Option<i64>,
    pub ailment: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ailment: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn update_payload_without_password_has_no_password_key() {
        let payload = PatientPayload {
            name: "A".into(),
            age: Some(31),
            ailment: "cold".into(),
            email: "a@x.com".into(),
            password: None,
        };
        assert_eq!(
            serde_json::to_value(&payload).expect("encode"),
            json!({"name": "A", "age": 31, "ailment": "cold", "email": "a@x.com"})
        );
    }

    #[test]
    fn non_numeric_age_is_sent_as_null() {
        let payload = PatientPayload {
            name: "A".into(),
            age: None,
            ailment: "cold".into(),
            email: "a@x.com".into(),
            password: Some("pw".into()),
        };
        let encoded = serde_json::to_value(&payload).expect("encode");
        assert!(encoded["age"].is_null());
        assert_eq!(encoded["password"], "pw");
    }

    #[test]
    fn login_response_reads_camel_case_token() {
        let body: LoginResponse =
            serde_json::from_str(r#"{"accessToken":"tok-1"}"#).expect("decode");
        assert_eq!(body.access_token, "tok-1");
    }
}
