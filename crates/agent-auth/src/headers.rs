use crate::encoding;
use crate::errors::AuthError;

pub const AGENT_ID_HEADER: &str = "x-agent-id";
pub const TIMESTAMP_HEADER: &str = "x-timestamp";
pub const NONCE_HEADER: &str = "x-nonce";
pub const CONTENT_DIGEST_HEADER: &str = "content-digest";
pub const SIGNATURE_HEADER: &str = "signature";
pub const HOST_HEADER: &str = "host";
pub const REQUEST_TARGET: &str = "(request-target)";

pub const SIGNATURE_ALGORITHM: &str = "ed25519";

/// Pseudo and real headers every signature must cover.
pub const MANDATORY_SIGNED_HEADERS: [&str; 5] = [
    REQUEST_TARGET,
    HOST_HEADER,
    AGENT_ID_HEADER,
    TIMESTAMP_HEADER,
    NONCE_HEADER,
];

/// Parsed `signature` header: `keyId="..",alg="..",headers="a b c",signature="<b64>"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignatureParams {
    pub key_id: String,
    pub alg: String,
    /// Signed header names in signer order, lowercased.
    pub headers: Vec<String>,
    pub signature: Vec<u8>,
}

impl SignatureParams {
    pub fn parse(raw: &str) -> Result<Self, AuthError> {
        let mut key_id = None;
        let mut alg = None;
        let mut headers = None;
        let mut signature = None;

        for (name, value) in split_params(raw)? {
            let slot = match name.as_str() {
                "keyid" => &mut key_id,
                "alg" | "algorithm" => &mut alg,
                "headers" => &mut headers,
                "signature" => &mut signature,
                _ => continue,
            };
            if slot.replace(value).is_some() {
                return Err(AuthError::InvalidHeaderFormat(format!(
                    "duplicate signature parameter {name}"
                )));
            }
        }

        let key_id = require_param(key_id, "keyId")?;
        let alg = require_param(alg, "alg")?.to_ascii_lowercase();
        let headers: Vec<String> = require_param(headers, "headers")?
            .split_ascii_whitespace()
            .map(|name| name.to_ascii_lowercase())
            .collect();
        if headers.is_empty() {
            return Err(AuthError::InvalidHeaderFormat(
                "signature parameter headers is empty".into(),
            ));
        }
        let signature = encoding::decode(&require_param(signature, "signature")?).map_err(
            |err| AuthError::InvalidHeaderFormat(format!("signature is not base64: {err}")),
        )?;

        Ok(Self {
            key_id,
            alg,
            headers,
            signature,
        })
    }

    pub fn covers(&self, header: &str) -> bool {
        self.headers.iter().any(|name| name == header)
    }

    /// Renders the header value in the form [`SignatureParams::parse`] accepts.
    pub fn to_header_value(&self) -> String {
        format!(
            "keyId=\"{}\",alg=\"{}\",headers=\"{}\",signature=\"{}\"",
            self.key_id,
            self.alg,
            self.headers.join(" "),
            encoding::encode(&self.signature)
        )
    }
}

fn require_param(value: Option<String>, name: &str) -> Result<String, AuthError> {
    match value {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(AuthError::InvalidHeaderFormat(format!(
            "signature parameter {name} is missing"
        ))),
    }
}

/// Splits `k="v",k2="v2"` into lowercased keys and unquoted values. Values may contain commas.
fn split_params(raw: &str) -> Result<Vec<(String, String)>, AuthError> {
    let malformed = || AuthError::InvalidHeaderFormat("malformed signature header".into());
    let mut params = Vec::new();
    let mut rest = raw.trim();

    while !rest.is_empty() {
        let eq = rest.find('=').ok_or_else(malformed)?;
        let name = rest[..eq].trim().to_ascii_lowercase();
        if name.is_empty() {
            return Err(malformed());
        }
        let after = rest[eq + 1..].trim_start();
        let quoted = after.strip_prefix('"').ok_or_else(malformed)?;
        let close = quoted.find('"').ok_or_else(malformed)?;
        params.push((name, quoted[..close].to_string()));

        rest = quoted[close + 1..].trim_start();
        if let Some(next) = rest.strip_prefix(',') {
            rest = next.trim_start();
            if rest.is_empty() {
                return Err(malformed());
            }
        } else if !rest.is_empty() {
            return Err(malformed());
        }
    }

    Ok(params)
}

/// Epoch seconds; a leading `+` or fractional part is rejected.
pub fn parse_timestamp(raw: &str) -> Result<i64, AuthError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.starts_with('+') {
        return Err(AuthError::InvalidHeaderFormat(
            "x-timestamp must be an integer".into(),
        ));
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| AuthError::InvalidHeaderFormat("x-timestamp must be an integer".into()))
}

pub fn validate_nonce(raw: &str) -> Result<(), AuthError> {
    match encoding::decode_lenient(raw) {
        Ok(bytes) if !bytes.is_empty() => Ok(()),
        _ => Err(AuthError::InvalidHeaderFormat(
            "x-nonce must be base64".into(),
        )),
    }
}
