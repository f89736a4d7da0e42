use crate::envelope::SignedRequestEnvelope;
use crate::errors::AuthError;
use crate::headers::{HOST_HEADER, REQUEST_TARGET};

/// Builds the signing string: one `name: value` line per signed header, in signer order, joined
/// by `\n` with no trailing newline. `(request-target)` and `host` come from the transport.
pub fn signing_string(
    envelope: &SignedRequestEnvelope,
    signed_headers: &[String],
) -> Result<String, AuthError> {
    let mut lines = Vec::with_capacity(signed_headers.len());
    for name in signed_headers {
        let value = match name.as_str() {
            REQUEST_TARGET => envelope.request_target(),
            HOST_HEADER => envelope.host().to_string(),
            other => envelope
                .header(other)
                .map(|value| value.trim().to_string())
                .ok_or_else(|| {
                    AuthError::InvalidHeaderFormat(format!("signed header {other} is absent"))
                })?,
        };
        lines.push(format!("{name}: {value}"));
    }
    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn lines_follow_signer_order() {
        let env = SignedRequestEnvelope::new("POST", "/v1/transfers?x=1", "gw.example")
            .with_header("x-nonce", "bm9uY2U=")
            .with_header("x-agent-id", "agent-1")
            .with_header("host", "spoofed.example");
        let out = signing_string(
            &env,
            &names(&["x-nonce", "(request-target)", "host", "x-agent-id"]),
        )
        .unwrap();
        assert_eq!(
            out,
            "x-nonce: bm9uY2U=\n(request-target): post /v1/transfers?x=1\nhost: gw.example\nx-agent-id: agent-1"
        );
    }

    #[test]
    fn absent_signed_header_is_a_format_error() {
        let env = SignedRequestEnvelope::new("GET", "/", "h");
        assert!(matches!(
            signing_string(&env, &names(&["x-custom"])),
            Err(AuthError::InvalidHeaderFormat(_))
        ));
    }
}
