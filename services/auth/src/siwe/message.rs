//! EIP-4361 message construction and parsing.
//!
//! The rendered text is hashed during verification, so construction must be
//! byte-exact: same line order, same timestamp formatting, every time.

use chrono::{DateTime, SecondsFormat, Utc};

/// Fields of an EIP-4361 message.
#[derive(Debug, Clone)]
pub struct SiweMessage {
    pub domain: String,
    pub address: String,
    pub statement: Option<String>,
    pub uri: String,
    pub chain_id: u64,
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
    pub expiration_time: Option<DateTime<Utc>>,
    pub not_before: Option<DateTime<Utc>>,
    pub request_id: Option<String>,
    pub resources: Vec<String>,
}

fn rfc3339(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Render the message in the exact EIP-4361 line order: greeting with
/// domain + address, blank line, optional statement followed by a blank
/// line, then the field lines.
pub fn build_message(msg: &SiweMessage) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push(format!(
        "{} wants you to sign in with your Ethereum account:",
        msg.domain
    ));
    lines.push(msg.address.clone());
    lines.push(String::new());
    if let Some(statement) = &msg.statement {
        lines.push(statement.clone());
        lines.push(String::new());
    }
    lines.push(format!("URI: {}", msg.uri));
    lines.push("Version: 1".to_owned());
    lines.push(format!("Chain ID: {}", msg.chain_id));
    lines.push(format!("Nonce: {}", msg.nonce));
    lines.push(format!("Issued At: {}", rfc3339(&msg.issued_at)));
    if let Some(exp) = &msg.expiration_time {
        lines.push(format!("Expiration Time: {}", rfc3339(exp)));
    }
    if let Some(nbf) = &msg.not_before {
        lines.push(format!("Not Before: {}", rfc3339(nbf)));
    }
    if let Some(request_id) = &msg.request_id {
        lines.push(format!("Request ID: {}", request_id));
    }
    if !msg.resources.is_empty() {
        lines.push("Resources:".to_owned());
        for resource in &msg.resources {
            lines.push(format!("- {}", resource));
        }
    }
    lines.join("\n")
}

/// Extract the value of the `Nonce:` line, or `None` if absent.
pub fn parse_nonce(message: &str) -> Option<&str> {
    message
        .lines()
        .find_map(|line| line.strip_prefix("Nonce: "))
        .map(str::trim)
        .filter(|nonce| !nonce.is_empty())
}
