//! One-shot command line operations that run without the TUI.

use std::io::{self, Write};

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

use studyaid_core::config::env_password;
use studyaid_core::models::RegisterRequest;
use studyaid_core::{Config, LoginOutcome, SessionState, SyncLoop};

use crate::services::Services;

/// Parsed command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Tui,
    Status,
    Login,
    Logout,
    Register,
    ResetPassword,
    Help,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        match args.get(1).map(String::as_str) {
            None => Ok(Command::Tui),
            Some("--status") => Ok(Command::Status),
            Some("--login") => Ok(Command::Login),
            Some("--logout") => Ok(Command::Logout),
            Some("--register") => Ok(Command::Register),
            Some("--reset-password") => Ok(Command::ResetPassword),
            Some("-h") | Some("--help") => Ok(Command::Help),
            Some(other) => Err(anyhow!("Unknown argument '{}'. Try --help.", other)),
        }
    }
}

pub const USAGE: &str = "\
Usage: studyaid [COMMAND]

With no command, opens the terminal client.

Commands:
  --status           Show whether a session is stored and the cookie is set
  --login            Sign in (STUDYAID_EMAIL / STUDYAID_PASSWORD or prompt)
  --logout           Remove the session cookie and the stored token
  --register         Create an account
  --reset-password   Request a reset token and choose a new password
  -h, --help         Show this help
";

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;

    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

fn prompt_with_default(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(default) if !default.is_empty() => {
            let value = prompt(&format!("{} [{}]", label, default))?;
            Ok(if value.is_empty() { default.to_string() } else { value })
        }
        _ => prompt(label),
    }
}

fn prompt_password(label: &str) -> Result<String> {
    Ok(rpassword::prompt_password(format!("{}: ", label))?)
}

fn prompt_new_password() -> Result<String> {
    let password = prompt_password("New password")?;
    let confirm = prompt_password("Confirm password")?;
    if password != confirm {
        return Err(anyhow!("Passwords do not match"));
    }
    Ok(password)
}

pub async fn run(command: Command, config: &mut Config) -> Result<()> {
    match command {
        Command::Status => status(config).await,
        Command::Login => login(config).await,
        Command::Logout => logout(config).await,
        Command::Register => register(config).await,
        Command::ResetPassword => reset_password(config).await,
        Command::Help => {
            print!("{}", USAGE);
            Ok(())
        }
        Command::Tui => Err(anyhow!("The terminal client is not a one-shot command")),
    }
}

async fn status(config: &Config) -> Result<()> {
    let services = Services::build(config)?;
    let router = &services.router;

    // Bring the stored copy in line with the cookie before reporting
    let outcome = SyncLoop::new(router.store().clone(), router.mirror().clone())
        .reconcile()
        .await;
    info!(?outcome, "Reconciled for status");

    let token = router.store().get().await;
    let cookie = router.mirror().read().is_some();
    let state = if token.is_some() {
        SessionState::Authenticated
    } else {
        SessionState::Unauthenticated
    };

    println!("Session:      {}", state.label());
    println!("Stored token: {}", if token.is_some() { "present" } else { "absent" });
    println!("Cookie:       {}", if cookie { "present" } else { "absent" });
    println!("Web origin:   {}", router.mirror().origin());
    println!("API:          {}", services.api.base_url());
    println!("Storage:      {:?}", router.store().storage().kind());
    println!(
        "Jar cookies:  {} ({})",
        services.jar.len(),
        if services.jar.is_persistent() { "on disk" } else { "in memory" }
    );

    if let Some(token) = token {
        match services.api.current_user(&token).await {
            Ok(user) => println!("Signed in as: {} <{}> ({})", user.username, user.email, user.role()),
            Err(e) => {
                warn!(error = %e, "Profile fetch failed");
                println!("Profile:      unavailable ({})", e.user_message());
            }
        }
    }
    Ok(())
}

async fn login(config: &mut Config) -> Result<()> {
    let services = Services::build(config)?;

    let email = match config.last_email.clone() {
        Some(email) if env_password().is_some() => email,
        default => prompt_with_default("Email", default.as_deref())?,
    };
    let password = match env_password() {
        Some(password) => password,
        None => prompt_password("Password")?,
    };

    let outcome = services
        .router
        .login(&services.api, &email, &password)
        .await
        .map_err(|e| anyhow!(e.user_message()))?;

    config.last_email = Some(email.clone());
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }

    match outcome {
        LoginOutcome::SignedIn { user: Some(user) } => {
            println!("Signed in as {} <{}>", user.username, user.email)
        }
        LoginOutcome::SignedIn { user: None } => println!("Signed in as {}", email),
        LoginOutcome::Discarded => println!("Login was cancelled"),
    }
    Ok(())
}

async fn logout(config: &Config) -> Result<()> {
    let services = Services::build(config)?;
    let was_signed_in = services.router.store().is_present().await
        || services.router.mirror().read().is_some();

    services.router.logout().await;

    if was_signed_in {
        println!("Signed out");
    } else {
        println!("No session to sign out of");
    }
    Ok(())
}

async fn register(config: &Config) -> Result<()> {
    let services = Services::build(config)?;

    let request = RegisterRequest {
        username: prompt("Username")?,
        email: prompt_with_default("Email", config.last_email.as_deref())?,
        password: prompt_new_password()?,
    };
    request.validate().map_err(|e| anyhow!(e.to_string()))?;

    let user = services
        .api
        .register(&request)
        .await
        .map_err(|e| anyhow!(e.user_message()))
        .context("Registration failed")?;

    println!("Account created for {}. Sign in with --login.", user.username);
    Ok(())
}

async fn reset_password(config: &Config) -> Result<()> {
    let services = Services::build(config)?;

    let email = prompt_with_default("Email", config.last_email.as_deref())?;
    let issued = services
        .api
        .request_password_reset(&email)
        .await
        .map_err(|e| anyhow!(e.user_message()))
        .context("Reset request failed")?;
    if !issued.message.is_empty() {
        println!("{}", issued.message);
    }

    let password = prompt_new_password()?;
    let done = services
        .api
        .reset_password(&issued.token, &password)
        .await
        .map_err(|e| anyhow!(e.user_message()))
        .context("Password reset failed")?;

    if done.message.is_empty() {
        println!("Password changed");
    } else {
        println!("{}", done.message);
    }
    Ok(())
}
