use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "hms-desk.toml";
pub const DEFAULT_API_URL: &str = "http://localhost:5000";
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub patients_url: String,
    pub auth_url: String,
    pub data_dir: PathBuf,
    pub request_timeout_secs: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hms-desk");
        Self {
            patients_url: DEFAULT_API_URL.into(),
            auth_url: DEFAULT_API_URL.into(),
            data_dir,
            request_timeout_secs: None,
        }
    }
}

impl Settings {
    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileSettings {
    patients_url: Option<String>,
    auth_url: Option<String>,
    data_dir: Option<PathBuf>,
    request_timeout_secs: Option<u64>,
}

/// Defaults, then the config file, then the environment.
///
/// An explicitly named config file must exist; the default one is optional.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(CONFIG_FILE), false),
    };
    if required || path.exists() {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?;
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.patients_url {
        settings.patients_url = v;
    }
    if let Some(v) = file_cfg.auth_url {
        settings.auth_url = v;
    }
    if let Some(v) = file_cfg.data_dir {
        settings.data_dir = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = Some(v);
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("HMS_PATIENTS_URL") {
        settings.patients_url = v;
    }
    if let Some(v) = var("APP__PATIENTS_URL") {
        settings.patients_url = v;
    }

    if let Some(v) = var("HMS_AUTH_URL") {
        settings.auth_url = v;
    }
    if let Some(v) = var("APP__AUTH_URL") {
        settings.auth_url = v;
    }

    if let Some(v) = var("HMS_DATA_DIR") {
        settings.data_dir = PathBuf::from(v);
    }

    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = Some(parsed);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn file_overrides_defaults() {
        let mut settings = Settings::default();
        apply_file(
            &mut settings,
            r#"
patients_url = "http://hospital.local:5000"
request_timeout_secs = 10
"#,
        )
        .expect("apply");

        assert_eq!(settings.patients_url, "http://hospital.local:5000");
        assert_eq!(settings.auth_url, DEFAULT_API_URL);
        assert_eq!(settings.request_timeout(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn rejects_unknown_file_keys() {
        let mut settings = Settings::default();
        assert!(apply_file(&mut settings, "patient_url = \"typo\"").is_err());
    }

    #[test]
    fn app_prefixed_env_wins_over_short_form() {
        let mut settings = Settings::default();
        apply_env(
            &mut settings,
            env_of(&[
                ("HMS_AUTH_URL", "https://auth-a"),
                ("APP__AUTH_URL", "https://auth-b"),
                ("HMS_DATA_DIR", "/tmp/hms"),
                ("APP__REQUEST_TIMEOUT_SECS", "not-a-number"),
            ]),
        );

        assert_eq!(settings.auth_url, "https://auth-b");
        assert_eq!(settings.data_dir, PathBuf::from("/tmp/hms"));
        assert_eq!(settings.request_timeout_secs, None);
        assert_eq!(settings.session_path(), PathBuf::from("/tmp/hms/session.json"));
    }

    #[test]
    fn zero_timeout_means_transport_default() {
        let settings = Settings {
            request_timeout_secs: Some(0),
            ..Settings::default()
        };
        assert_eq!(settings.request_timeout(), None);
    }

    #[test]
    fn explicitly_named_config_must_exist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("absent.toml");
        assert!(load_settings(Some(&missing)).is_err());

        let present = dir.path().join("present.toml");
        fs::write(&present, "auth_url = \"https://auth.example.com\"\n").expect("write");
        let settings = load_settings(Some(&present)).expect("load");
        if std::env::var("HMS_AUTH_URL").is_err() && std::env::var("APP__AUTH_URL").is_err() {
            assert_eq!(settings.auth_url, "https://auth.example.com");
        }
    }
}
