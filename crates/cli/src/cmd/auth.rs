//! Login, logout and identity commands.

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Args;
use reportdesk_auth::Identity;
use reportdesk_client::ReportClient;

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account name (prompted when omitted)
    #[arg(short, long)]
    pub username: Option<String>,
}

pub async fn run_login(client: &ReportClient, args: LoginArgs) -> Result<()> {
    let username = match args.username {
        Some(name) => name,
        None => prompt("Username: ")?,
    };
    if username.is_empty() {
        anyhow::bail!("a username is required");
    }

    print!("Password: ");
    io::stdout().flush()?;
    let password = rpassword::read_password().context("failed to read password")?;

    // The rejection itself was already reported by the pipeline.
    let identity = client
        .login(&username, &password)
        .await
        .context("login failed")?;

    println!("Logged in as {}", describe(&identity));
    Ok(())
}

pub async fn run_logout(client: &ReportClient) -> Result<()> {
    if !client.is_authenticated() {
        println!("Not logged in");
        return Ok(());
    }
    client.logout().await;
    println!("Logged out successfully");
    Ok(())
}

pub async fn run_whoami(client: &ReportClient) -> Result<()> {
    if !client.is_authenticated() {
        println!("Not logged in");
        println!("\nRun 'reportdesk login' to authenticate");
        return Ok(());
    }

    client
        .initialize()
        .await
        .context("stored session is no longer valid")?;

    let Some(identity) = client.identity() else {
        println!("Not logged in");
        return Ok(());
    };
    println!("Logged in as: {}", describe(&identity));
    println!("API server: {}", client.config().endpoint_root());
    if !identity.permissions().is_empty() {
        let permissions: Vec<&str> = identity.permissions().iter().map(|p| p.as_str()).collect();
        println!("Permissions: {}", permissions.join(", "));
    }
    Ok(())
}

fn describe(identity: &Identity) -> String {
    let roles: Vec<&str> = identity.roles().iter().map(|r| r.as_str()).collect();
    let roles = if roles.is_empty() {
        "no roles".to_string()
    } else {
        roles.join(", ")
    };
    if identity.display_name() == identity.username() {
        format!("{} [{roles}]", identity.username())
    } else {
        format!("{} ({}) [{roles}]", identity.display_name(), identity.username())
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use reportdesk_auth::RoleCode;

    use super::*;

    #[test]
    fn describe_includes_nickname_and_roles() {
        let identity = Identity::new(
            "alice",
            Some("Alice".to_string()),
            [RoleCode::new("REPORT_USER")],
            [],
        );
        assert_eq!(describe(&identity), "Alice (alice) [REPORT_USER]");

        let bare = Identity::new("bob", None, [], []);
        assert_eq!(describe(&bare), "bob [no roles]");
    }
}
