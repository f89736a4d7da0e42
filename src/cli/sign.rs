use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use clap::Args;
use payguard_agent_auth::{decode_signing_key, RequestSigner, SignedRequestEnvelope};
use payguard_core_types::{AgentId, KeyId};
use url::Url;

#[derive(Args, Clone)]
pub struct SignArgs {
    /// Key id registered for the agent
    #[arg(long)]
    pub kid: String,

    /// Base64 Ed25519 secret key (as printed by `keygen`)
    #[arg(long, env = "PAYGUARD_AGENT_SECRET", hide_env_values = true)]
    pub secret: String,

    /// HTTP method
    #[arg(long, default_value = "POST")]
    pub method: String,

    /// Absolute request URL; its authority becomes the signed host
    #[arg(long)]
    pub url: String,

    /// Inline request body
    #[arg(long, conflicts_with = "body_file")]
    pub body: Option<String>,

    /// Read the request body from a file
    #[arg(long = "body-file", value_name = "FILE")]
    pub body_file: Option<PathBuf>,

    /// Agent id sent in `x-agent-id` (defaults to the key id)
    #[arg(long = "agent-id")]
    pub agent_id: Option<String>,

    /// Unix timestamp to sign with (defaults to now)
    #[arg(long)]
    pub timestamp: Option<i64>,
}

pub fn cmd_sign(args: SignArgs) -> Result<()> {
    let headers = signed_headers(&args)?;
    for (name, value) in headers {
        println!("{name}: {value}");
    }
    Ok(())
}

/// Header lines an agent must attach, `host` first.
pub fn signed_headers(args: &SignArgs) -> Result<Vec<(String, String)>> {
    let url = Url::parse(&args.url).with_context(|| format!("parsing url {}", args.url))?;
    let host = match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        (None, _) => bail!("url {} has no host", args.url),
    };
    let path_and_query = match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    };

    let body = match (&args.body, &args.body_file) {
        (Some(inline), _) => inline.clone().into_bytes(),
        (None, Some(path)) => std::fs::read(path)
            .with_context(|| format!("reading body from {}", path.display()))?,
        (None, None) => Vec::new(),
    };

    let signing_key = decode_signing_key(args.secret.trim()).context("decoding --secret")?;
    let agent_id = args.agent_id.clone().unwrap_or_else(|| args.kid.clone());
    let signer = RequestSigner::new(KeyId::new(&args.kid), AgentId::new(agent_id), signing_key);

    let mut envelope =
        SignedRequestEnvelope::new(args.method.as_str(), path_and_query, host.clone())
            .with_body(body);
    let timestamp = args.timestamp.unwrap_or_else(|| Utc::now().timestamp());
    signer
        .sign(&mut envelope, timestamp)
        .map_err(|err| anyhow!("signing request: {err}"))?;

    let mut lines = vec![("host".to_string(), host)];
    lines.extend(
        envelope
            .headers()
            .map(|(name, value)| (name.to_string(), value.to_string())),
    );
    Ok(lines)
}
