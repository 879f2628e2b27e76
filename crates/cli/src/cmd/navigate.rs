//! Route commands: guard decisions and the visible menu.

use anyhow::{Context, Result};
use clap::Args;
use reportdesk_auth::RouteNode;
use reportdesk_auth::route::join_paths;
use reportdesk_client::{GuardDecision, ReportClient};

#[derive(Args, Debug)]
pub struct NavigateArgs {
    /// Target location, e.g. /report/template or /report/records?page=2
    pub path: String,

    /// Location the navigation starts from
    #[arg(long)]
    pub from: Option<String>,

    /// Print the decision as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(client: &ReportClient, args: NavigateArgs) -> Result<()> {
    let decision = client.navigate(&args.path, args.from.as_deref()).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
        return Ok(());
    }

    match decision {
        GuardDecision::Allow { path, title } => {
            println!("allow    {path}");
            println!("title    {title}");
        }
        GuardDecision::Redirect(redirect) => {
            println!("redirect {}", redirect.location());
            println!("reason   {:?}", redirect.reason);
        }
    }
    Ok(())
}

pub async fn run_menu(client: &ReportClient) -> Result<()> {
    client
        .initialize()
        .await
        .context("stored session is no longer valid")?;

    let menu = client.visible_menu();
    let mut lines = Vec::new();
    render("/", &menu, 0, &mut lines);
    for line in lines {
        println!("{line}");
    }
    Ok(())
}

fn render(parent: &str, nodes: &[RouteNode], depth: usize, out: &mut Vec<String>) {
    for node in nodes {
        let full = join_paths(parent, &node.path);
        // Grouping nodes without a label lift their children to this level.
        match &node.title {
            Some(title) => {
                out.push(format!("{}{title}  {full}", "  ".repeat(depth)));
                render(&full, &node.children, depth + 1, out);
            }
            None => render(&full, &node.children, depth, out),
        }
    }
}
