//! The terminal as the pipeline's front end.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use reportdesk_client::{Interaction, ReauthPrompt};

pub struct TerminalInteraction;

#[async_trait]
impl Interaction for TerminalInteraction {
    fn notify_error(&self, message: &str) {
        eprintln!("error: {message}");
    }

    async fn confirm_reauthentication(&self, prompt: &ReauthPrompt) -> bool {
        let question = format!(
            "{}: {} [{} = y / {} = n] ",
            prompt.title, prompt.message, prompt.confirm_label, prompt.cancel_label
        );
        let answer = tokio::task::spawn_blocking(move || read_answer(&question)).await;
        match answer {
            Ok(Ok(line)) => is_yes(&line),
            Ok(Err(err)) => {
                tracing::warn!("could not read confirmation: {err}");
                false
            }
            Err(err) => {
                tracing::warn!("confirmation prompt aborted: {err}");
                false
            }
        }
    }

    fn reload_to(&self, location: &str) {
        eprintln!("Session cleared ({location}). Run 'reportdesk login' to sign in again.");
    }
}

fn read_answer(question: &str) -> io::Result<String> {
    let mut stderr = io::stderr();
    write!(stderr, "{question}")?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
