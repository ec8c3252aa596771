//! Command handlers and terminal output.

use chefbot_client::storage::SessionStorage;
use chefbot_client::{ChefBotClient, ClientError, ClientResult, SessionState};
use chefbot_core::api_error::RecoveryAction;
use chefbot_core::recipe::AnalyzeResult;
use chefbot_core::user::UserRecord;

use crate::cli::Command;

/// Run one command against `client`, printing its result to stdout.
pub async fn run<S: SessionStorage>(client: &ChefBotClient<S>, command: Command) -> ClientResult<()> {
    let session = client.session();

    match command {
        Command::Signup(creds) => {
            let s = session.signup(&creds.email, &creds.password).await?;
            println!("Account created. {}", signed_in_line(s.user.as_ref(), &creds.email));
        }
        Command::Login(creds) => {
            let s = session.login(&creds.email, &creds.password).await?;
            println!("{}", signed_in_line(s.user.as_ref(), &creds.email));
        }
        Command::Logout => {
            session.logout().await?;
            println!("Signed out.");
        }
        Command::Whoami => {
            let user = session.refresh_profile().await?;
            println!("{}", format_user(&user));
        }
        Command::Status => {
            let config = client.config();
            println!("API:       {}", config.base_url);
            if config.fallback_url != config.base_url {
                println!("Fallback:  {}", config.fallback_url);
            }
            println!(
                "Attempts:  {} primary + 1 fallback, {}s each",
                config.primary_attempts(),
                config.request_timeout.as_secs()
            );
            println!("Platform:  {}", config.platform);
            println!(
                "Google:    {}",
                if config.oauth_client_id().is_some() { "configured" } else { "not configured" }
            );
            println!("Data dir:  {}", config.data_dir.display());

            let state = session.state().await?;
            println!("Session:   {}", state_label(state));
            if let Some(s) = session.current_session().await? {
                if let Some(expires_at) = s.expires_at {
                    println!("Expires:   {}", expires_at.to_rfc3339());
                }
            }
            if let Some(user) = session.current_user().await? {
                println!("{}", format_user(&user));
            }
        }
        Command::Analyze { image, prompt } => {
            let result = client.analyze_image(&image, prompt.as_deref()).await?;
            print!("{}", format_analysis(&result));
        }
        Command::Health => {
            let body = client.health().await?;
            println!("{body}");
        }
    }

    Ok(())
}

/// One-paragraph failure message including the suggested next step.
pub fn describe_error(err: &ClientError) -> String {
    let message = match err {
        ClientError::Http {
            detail: Some(detail),
            status,
            ..
        } => format!("Request failed ({status}): {detail}"),
        other => other.to_string(),
    };
    match err.suggested_action() {
        Some(action) => format!("{message}\n{}", recovery_hint(action)),
        None => message,
    }
}

pub fn recovery_hint(action: RecoveryAction) -> &'static str {
    match action {
        RecoveryAction::SwitchToLogin => "This email already has an account. Try `chefbot login`.",
        RecoveryAction::SwitchToSignup => {
            "Check your email and password, or create an account with `chefbot signup`."
        }
        RecoveryAction::Reauthenticate => "Your session has ended. Sign in again with `chefbot login`.",
        RecoveryAction::UpgradePlan => "You have used this month's analyses. Upgrade your plan to continue.",
        RecoveryAction::RetryLater => "The server may be waking up. Try again in a minute.",
    }
}

pub fn format_analysis(result: &AnalyzeResult) -> String {
    let mut out = String::new();

    if result.ingredients.is_empty() {
        out.push_str("No ingredients detected.\n");
    } else {
        out.push_str(&format!("Ingredients: {}\n", result.ingredients.join(", ")));
    }

    for (i, recipe) in result.recipes.iter().enumerate() {
        let mut meta = Vec::new();
        if let Some(mins) = recipe.time_mins {
            meta.push(format!("{mins} min"));
        }
        if let Some(difficulty) = recipe.difficulty {
            meta.push(difficulty.label().to_string());
        }

        out.push('\n');
        if meta.is_empty() {
            out.push_str(&format!("{}. {}\n", i + 1, recipe.title));
        } else {
            out.push_str(&format!("{}. {} ({})\n", i + 1, recipe.title, meta.join(", ")));
        }
        if !recipe.ingredients.is_empty() {
            out.push_str(&format!("   Uses: {}\n", recipe.ingredients.join(", ")));
        }
        for (n, step) in recipe.steps.iter().enumerate() {
            out.push_str(&format!("   {}) {step}\n", n + 1));
        }
    }

    let ready = result.cookable_recipes().len();
    if ready > 0 && ready < result.recipes.len() {
        out.push_str(&format!("\n{ready} of these use only what you have.\n"));
    }

    out
}

pub fn format_user(user: &UserRecord) -> String {
    let mut line = format!(
        "User:      {} (plan: {})",
        user.email().unwrap_or("<unknown>"),
        user.plan()
    );
    if let Some(usage) = user.monthly_usage() {
        match user.usage_month() {
            Some(month) => line.push_str(&format!(", {usage} analyses in {month}")),
            None => line.push_str(&format!(", {usage} analyses this month")),
        }
    }
    line
}

fn signed_in_line(user: Option<&UserRecord>, fallback_email: &str) -> String {
    let email = user.and_then(|u| u.email()).unwrap_or(fallback_email);
    format!("Signed in as {email}.")
}

fn state_label(state: SessionState) -> &'static str {
    match state {
        SessionState::Anonymous => "signed out",
        SessionState::Authenticated => "signed in",
        SessionState::Expired => "expired (refreshes on next use)",
    }
}
