use std::{path::PathBuf, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use client_core::{
    auth::{AuthFlow, LoginForm, RegistrationForm, REGISTRATION_SUCCEEDED},
    ApiEndpoints, DeleteOutcome, FormState, HttpBackend, PatientDashboard, SubmitOutcome,
    TokenStore,
};
use shared::domain::PatientId;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod config;
mod screens;
mod session;

use config::{load_settings, Settings};
use screens::{flush_notices, render_patients};
use session::SessionFile;

#[derive(Parser, Debug)]
#[command(name = "hms-desk", about = "Hospital desk: sign in and manage patient records")]
struct Args {
    /// Config file (defaults to ./hms-desk.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    patients_url: Option<String>,
    #[arg(long, global = true)]
    auth_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "")]
        age: String,
        #[arg(long, default_value = "")]
        ailment: String,
    },
    Logout,
    #[command(subcommand)]
    Patients(PatientCommand),
}

#[derive(Subcommand, Debug)]
enum PatientCommand {
    List,
    Add(NewPatient),
    Edit {
        id: String,
        #[command(flatten)]
        changes: PatientChanges,
    },
    Delete {
        id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(ClapArgs, Debug)]
struct NewPatient {
    #[arg(long)]
    name: String,
    #[arg(long)]
    age: String,
    #[arg(long)]
    ailment: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
}

#[derive(ClapArgs, Debug)]
struct PatientChanges {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    age: Option<String>,
    #[arg(long)]
    ailment: Option<String>,
    #[arg(long)]
    email: Option<String>,
    /// Leave out to keep the current password.
    #[arg(long)]
    password: Option<String>,
}

impl PatientChanges {
    fn apply(self, form: &mut FormState) {
        if let Some(v) = self.name {
            form.name = v;
        }
        if let Some(v) = self.age {
            form.age = v;
        }
        if let Some(v) = self.ailment {
            form.ailment = v;
        }
        if let Some(v) = self.email {
            form.email = v;
        }
        if let Some(v) = self.password {
            form.password = v;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(v) = args.patients_url {
        settings.patients_url = v;
    }
    if let Some(v) = args.auth_url {
        settings.auth_url = v;
    }

    debug!(
        patients_url = %settings.patients_url,
        auth_url = %settings.auth_url,
        "settings loaded"
    );

    let session = SessionFile::new(settings.session_path());
    let tokens = match session.load()? {
        Some(token) => TokenStore::with_token(token),
        None => TokenStore::new(),
    };
    let backend = Arc::new(connect(&settings, tokens.clone())?);

    match args.command {
        Command::Login { email, password } => {
            let flow = AuthFlow::new(backend, tokens.clone());
            flow.login(&LoginForm { email, password }).await?;
            let token = tokens
                .get()
                .await
                .ok_or_else(|| anyhow!("login succeeded without a token"))?;
            session.save(&token)?;
            debug!(path = %session.path().display(), "session saved");
            println!("Signed in.");
        }
        Command::Register {
            name,
            email,
            password,
            age,
            ailment,
        } => {
            let flow = AuthFlow::new(backend, tokens);
            let form = RegistrationForm {
                name,
                email,
                password,
                age,
                ailment,
            };
            flow.register(&form).await?;
            println!("{REGISTRATION_SUCCEEDED}");
            println!("Sign in with `hms-desk login`.");
        }
        Command::Logout => {
            AuthFlow::new(backend, tokens).logout().await;
            session.clear()?;
            println!("Signed out.");
        }
        Command::Patients(command) => run_patients(backend, command).await?,
    }

    Ok(())
}

fn connect(settings: &Settings, tokens: TokenStore) -> Result<HttpBackend> {
    let endpoints = ApiEndpoints::parse(&settings.patients_url, &settings.auth_url)
        .context("invalid service url")?;
    HttpBackend::new(endpoints, tokens, settings.request_timeout())
        .context("failed to build http client")
}

async fn run_patients(backend: Arc<HttpBackend>, command: PatientCommand) -> Result<()> {
    let mut dashboard = PatientDashboard::new(backend);
    let mut rx = dashboard.subscribe_events();

    let loaded = dashboard.load().await;
    flush_notices(&mut rx);
    if !loaded {
        bail!("could not load patients");
    }

    match command {
        PatientCommand::List => {}
        PatientCommand::Add(new) => {
            *dashboard.form_mut() = FormState {
                name: new.name,
                age: new.age,
                ailment: new.ailment,
                email: new.email,
                password: new.password,
                edit_id: None,
            };
            submit(&mut dashboard, &mut rx).await?;
        }
        PatientCommand::Edit { id, changes } => {
            let id = PatientId::new(id);
            let record = dashboard
                .patients()
                .iter()
                .find(|record| record.id == id)
                .cloned()
                .ok_or_else(|| anyhow!("no patient with id {id}"))?;
            dashboard.enter_edit_mode(&record);
            changes.apply(dashboard.form_mut());
            submit(&mut dashboard, &mut rx).await?;
        }
        PatientCommand::Delete { id, yes } => {
            let id = PatientId::new(id);
            let label = dashboard
                .patients()
                .iter()
                .find(|record| record.id == id)
                .map(|record| record.name.clone())
                .unwrap_or_else(|| id.to_string());

            dashboard.request_delete(id);
            if !yes && !confirm(&format!("Delete patient {label}?")).await? {
                dashboard.cancel_delete();
                println!("Cancelled.");
                return Ok(());
            }

            let outcome = dashboard.confirm_delete().await;
            flush_notices(&mut rx);
            if let DeleteOutcome::Reconciled { .. } = outcome {
                print!("{}", render_patients(dashboard.patients()));
                bail!("delete failed");
            }
        }
    }

    print!("{}", render_patients(dashboard.patients()));
    Ok(())
}

async fn submit(
    dashboard: &mut PatientDashboard,
    rx: &mut tokio::sync::broadcast::Receiver<client_core::DashboardEvent>,
) -> Result<()> {
    let outcome = dashboard.submit().await;
    flush_notices(rx);
    match outcome {
        SubmitOutcome::Created | SubmitOutcome::Updated => Ok(()),
        SubmitOutcome::Invalid(_) | SubmitOutcome::Failed { .. } => {
            bail!("patient was not saved")
        }
    }
}

async fn confirm(prompt: &str) -> Result<bool> {
    println!("{prompt} [y/N]");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("failed to read confirmation")?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}
