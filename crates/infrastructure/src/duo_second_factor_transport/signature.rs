//! Request signing for the second-factor API (HMAC-SHA512, version 5).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use rolegate_core::{AppError, AppResult};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};

type HmacSha512 = Hmac<Sha512>;

/// Parts of a JSON `POST` covered by the signature.
pub(super) struct CanonicalRequest<'a> {
    pub date: &'a str,
    pub host: &'a str,
    pub path: &'a str,
    pub body: &'a str,
}

impl CanonicalRequest<'_> {
    fn to_canonical_string(&self) -> String {
        // Parameters travel in the body, so the query line stays empty. No
        // X-Duo-* headers are sent, so the header digest covers an empty string.
        [
            self.date.to_owned(),
            "POST".to_owned(),
            self.host.to_lowercase(),
            self.path.to_owned(),
            String::new(),
            sha512_hex(self.body.as_bytes()),
            sha512_hex(b""),
        ]
        .join("\n")
    }
}

/// Returns the `Authorization` header value for a request.
pub(super) fn authorization_header(
    request: &CanonicalRequest<'_>,
    integration_key: &str,
    secret_key: &SecretString,
) -> AppResult<String> {
    let mut mac = HmacSha512::new_from_slice(secret_key.expose_secret().as_bytes())
        .map_err(|error| AppError::Internal(format!("invalid signing key: {error}")))?;
    mac.update(request.to_canonical_string().as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(format!(
        "Basic {}",
        STANDARD.encode(format!("{integration_key}:{signature}"))
    ))
}

fn sha512_hex(bytes: &[u8]) -> String {
    hex::encode(Sha512::digest(bytes))
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use hmac::Mac;
    use secrecy::SecretString;

    use super::{CanonicalRequest, HmacSha512, authorization_header};

    const EMPTY_SHA512: &str = "cf83e1357eefb8bdf1542850d66d8007d620e4050b5715dc83f4a921d36ce9ce47d0d13c5d85f2b0ff8318d2877eec2f63b931bd47417a81a538327af927da3e";

    fn request<'a>(body: &'a str) -> CanonicalRequest<'a> {
        CanonicalRequest {
            date: "Tue, 21 Aug 2012 17:29:18 +0000",
            host: "API-XXXXXXXX.duosecurity.com",
            path: "/auth/v2/auth",
            body,
        }
    }

    #[test]
    fn canonical_string_signs_post_with_empty_query() {
        let canonical = request("").to_canonical_string();
        let lines: Vec<&str> = canonical.split('\n').collect();

        assert_eq!(lines.len(), 7);
        assert_eq!(lines[1], "POST");
        assert_eq!(lines[2], "api-xxxxxxxx.duosecurity.com");
        assert_eq!(lines[3], "/auth/v2/auth");
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], EMPTY_SHA512);
        assert_eq!(lines[6], EMPTY_SHA512);
    }

    #[test]
    fn authorization_header_is_basic_ikey_and_hex_hmac() {
        let body = r#"{"device":"auto","factor":"auto","username":"alice"}"#;
        let header = authorization_header(
            &request(body),
            "DIWJ8X6AEYOR5OMC6TQ1",
            &SecretString::from("Zh5eGmUq9zpfQnyUIu5OL9iWoMMv5ZNmk3zLJ4Ep".to_owned()),
        );
        let Ok(header) = header else {
            panic!("signing should succeed");
        };

        let encoded = header.strip_prefix("Basic ").unwrap_or_default();
        let decoded = STANDARD
            .decode(encoded)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .unwrap_or_default();
        let (integration_key, signature) = decoded.split_once(':').unwrap_or_default();

        assert_eq!(integration_key, "DIWJ8X6AEYOR5OMC6TQ1");
        assert_eq!(signature.len(), 128);

        let Ok(mut mac) =
            HmacSha512::new_from_slice(b"Zh5eGmUq9zpfQnyUIu5OL9iWoMMv5ZNmk3zLJ4Ep")
        else {
            panic!("hmac accepts any key length");
        };
        mac.update(request(body).to_canonical_string().as_bytes());
        assert_eq!(signature, hex::encode(mac.finalize().into_bytes()));
    }

    #[test]
    fn body_changes_signature() {
        let secret = SecretString::from("secret".to_owned());
        let first = authorization_header(&request(r#"{"username":"alice"}"#), "IKEY", &secret).ok();
        let second = authorization_header(&request(r#"{"username":"bob"}"#), "IKEY", &secret).ok();

        assert!(first.is_some());
        assert_ne!(first, second);
    }
}
