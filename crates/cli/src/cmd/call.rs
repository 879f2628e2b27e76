//! Raw API calls through the request pipeline.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use reportdesk_client::{Endpoint, Method, ReportClient};
use serde_json::Value;

#[derive(Args, Debug)]
pub struct CallArgs {
    /// HTTP method (GET, POST, PUT, DELETE)
    pub method: Method,

    /// Path below the API base, e.g. /report/template/page
    pub path: String,

    /// JSON payload (query parameters for GET, request body otherwise)
    #[arg(short, long)]
    pub data: Option<String>,

    /// The endpoint returns a file instead of a response envelope
    #[arg(long)]
    pub binary: bool,

    /// Where to write a binary response (default: report size only)
    #[arg(short, long, requires = "binary")]
    pub output: Option<PathBuf>,
}

pub async fn run(client: &ReportClient, args: CallArgs) -> Result<()> {
    let payload = args
        .data
        .as_deref()
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("--data must be valid JSON")?;

    let mut endpoint = Endpoint::new(args.method, args.path);
    if args.binary {
        endpoint = endpoint.binary();
    }

    if args.binary {
        let file = client
            .fetch_binary(&endpoint, payload)
            .await
            .with_context(|| format!("{endpoint} failed"))?;
        let kind = file.content_type.as_deref().unwrap_or("application/octet-stream");
        match args.output {
            Some(path) => {
                std::fs::write(&path, &file.bytes)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                println!("wrote {} bytes ({kind}) to {}", file.bytes.len(), path.display());
            }
            None => println!("received {} bytes ({kind})", file.bytes.len()),
        }
    } else {
        let data = client
            .call_value(&endpoint, payload)
            .await
            .with_context(|| format!("{endpoint} failed"))?;
        println!("{}", serde_json::to_string_pretty(&data)?);
    }
    Ok(())
}
