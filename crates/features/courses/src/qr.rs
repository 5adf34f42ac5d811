//! Signed, time-limited check-in codes.
//!
//! Payload layout: `rollcall:v1:<token>.<signature>`, both parts URL-safe base64 without
//! padding. `<token>` is the postcard encoding of [`CheckInToken`]; `<signature>` is the
//! Ed25519 signature over exactly those bytes.

use crate::error::CourseError;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use qrcode::QrCode;
use qrcode::render::svg;
use rollcall_domain::config::QrConfig;
use rollcall_domain::constants::QR_PAYLOAD_PREFIX;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroize;

const SEED_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// Claims encoded in a course QR code. Times are Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInToken {
    pub course_id: String,
    pub issued_at: i64,
    pub expires_at: i64,
    pub nonce: [u8; NONCE_LEN],
}

/// A token together with its printable payload.
#[derive(Debug, Clone)]
pub struct SignedCheckInToken {
    pub token: CheckInToken,
    pub payload: String,
}

/// Mints and verifies check-in tokens.
#[derive(Clone)]
pub struct QrSigner {
    signing: SigningKey,
    verifying: VerifyingKey,
    ttl_ms: i64,
    skew_ms: i64,
    size_px: u32,
}

impl fmt::Debug for QrSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QrSigner")
            .field("verifying", &hex::encode(self.verifying.as_bytes()))
            .field("ttl_ms", &self.ttl_ms)
            .field("skew_ms", &self.skew_ms)
            .finish_non_exhaustive()
    }
}

impl QrSigner {
    /// Builds the signer from `security.qr`. Without a seed a random key is generated, so codes
    /// issued before a restart stop verifying.
    ///
    /// # Errors
    /// [`CourseError::Validation`] for a malformed seed or a zero TTL.
    pub fn from_config(config: &QrConfig) -> Result<Self, CourseError> {
        if config.ttl_seconds == 0 {
            return Err(CourseError::validation("security.qr.ttl_seconds must be positive"));
        }

        let mut seed = match config.signing_seed.as_deref() {
            Some(hex_seed) => decode_seed(hex_seed)?,
            None => {
                tracing::warn!("No security.qr.signing_seed configured; using an ephemeral key");
                random_bytes::<SEED_LEN>()?
            },
        };
        let signing = SigningKey::from_bytes(&seed);
        seed.zeroize();

        Ok(Self {
            verifying: signing.verifying_key(),
            signing,
            ttl_ms: seconds_to_ms(config.ttl_seconds),
            skew_ms: seconds_to_ms(config.clock_skew_seconds),
            size_px: config.size_px,
        })
    }

    #[must_use]
    pub const fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying
    }

    /// Signs a token for `course_id` valid from `now_ms` for the configured TTL.
    ///
    /// # Errors
    /// [`CourseError::Internal`] if randomness or encoding fails.
    pub fn sign(&self, course_id: &str, now_ms: i64) -> Result<SignedCheckInToken, CourseError> {
        let token = CheckInToken {
            course_id: course_id.to_owned(),
            issued_at: now_ms,
            expires_at: now_ms.saturating_add(self.ttl_ms),
            nonce: random_bytes::<NONCE_LEN>()?,
        };
        let bytes = postcard::to_stdvec(&token).map_err(|e| CourseError::Internal {
            message: e.to_string().into(),
            context: Some("Encoding check-in token".into()),
        })?;
        let signature = self.signing.sign(&bytes);

        let payload = format!(
            "{QR_PAYLOAD_PREFIX}{}.{}",
            URL_SAFE_NO_PAD.encode(&bytes),
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        );
        Ok(SignedCheckInToken { token, payload })
    }

    /// Decodes and authenticates a scanned payload.
    ///
    /// # Errors
    /// * [`CourseError::InvalidToken`] for a foreign prefix, malformed encoding, a bad signature
    ///   or a token issued further in the future than the clock-skew leeway.
    /// * [`CourseError::ExpiredToken`] once `expires_at` has passed.
    pub fn verify(&self, payload: &str, now_ms: i64) -> Result<CheckInToken, CourseError> {
        let body = payload
            .trim()
            .strip_prefix(QR_PAYLOAD_PREFIX)
            .ok_or_else(|| CourseError::invalid_token("not a rollcall check-in code"))?;
        let (token_b64, signature_b64) = body
            .split_once('.')
            .ok_or_else(|| CourseError::invalid_token("missing signature"))?;

        let bytes = URL_SAFE_NO_PAD
            .decode(token_b64)
            .map_err(|_| CourseError::invalid_token("token is not valid base64"))?;
        let signature_bytes = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| CourseError::invalid_token("signature is not valid base64"))?;
        let signature = Signature::from_slice(&signature_bytes)
            .map_err(|_| CourseError::invalid_token("signature has the wrong length"))?;

        self.verifying
            .verify(&bytes, &signature)
            .map_err(|_| CourseError::invalid_token("signature does not match"))?;

        let token: CheckInToken = postcard::from_bytes(&bytes)
            .map_err(|_| CourseError::invalid_token("token is not readable"))?;

        if token.issued_at > now_ms.saturating_add(self.skew_ms) {
            return Err(CourseError::invalid_token("token is issued in the future"));
        }
        if now_ms > token.expires_at {
            return Err(CourseError::ExpiredToken {
                message: "ask the professor for a fresh code".into(),
                context: None,
            });
        }
        Ok(token)
    }

    /// Renders `payload` as a standalone SVG document.
    ///
    /// # Errors
    /// [`CourseError::Internal`] if the payload does not fit in a QR code.
    pub fn render_svg(&self, payload: &str) -> Result<String, CourseError> {
        let code = QrCode::new(payload.as_bytes()).map_err(|e| CourseError::Internal {
            message: e.to_string().into(),
            context: Some("Rendering QR code".into()),
        })?;
        Ok(code
            .render::<svg::Color<'_>>()
            .min_dimensions(self.size_px, self.size_px)
            .dark_color(svg::Color("#000000"))
            .light_color(svg::Color("#ffffff"))
            .build())
    }
}

fn decode_seed(hex_seed: &str) -> Result<[u8; SEED_LEN], CourseError> {
    let mut raw = hex::decode(hex_seed.trim()).map_err(|_| {
        CourseError::validation("security.qr.signing_seed must be hexadecimal")
    })?;
    let seed = <[u8; SEED_LEN]>::try_from(raw.as_slice()).map_err(|_| {
        CourseError::validation(format!("security.qr.signing_seed must be {} hex chars", SEED_LEN * 2))
    });
    raw.zeroize();
    seed
}

fn random_bytes<const N: usize>() -> Result<[u8; N], CourseError> {
    let mut bytes = [0u8; N];
    getrandom::fill(&mut bytes).map_err(|e| CourseError::Internal {
        message: e.to_string().into(),
        context: Some("Reading system randomness".into()),
    })?;
    Ok(bytes)
}

fn seconds_to_ms(seconds: u64) -> i64 {
    i64::try_from(seconds.saturating_mul(1000)).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
    const NOW: i64 = 1_760_000_000_000;

    fn signer(seed: Option<&str>) -> QrSigner {
        QrSigner::from_config(&QrConfig {
            signing_seed: seed.map(str::to_owned),
            ..QrConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn signed_payload_verifies() {
        let signer = signer(Some(SEED));
        let signed = signer.sign("course-1", NOW).unwrap();

        assert!(signed.payload.starts_with(QR_PAYLOAD_PREFIX));
        assert_eq!(signed.token.expires_at - signed.token.issued_at, 900_000);

        let token = signer.verify(&signed.payload, NOW + 1_000).unwrap();
        assert_eq!(token, signed.token);
    }

    #[test]
    fn same_seed_same_key() {
        assert_eq!(signer(Some(SEED)).verifying_key(), signer(Some(SEED)).verifying_key());
        assert_ne!(signer(None).verifying_key(), signer(None).verifying_key());
    }

    #[test]
    fn tampered_token_is_rejected() {
        let signer = signer(Some(SEED));
        let signed = signer.sign("course-1", NOW).unwrap();

        let forged = CheckInToken { course_id: "course-2".into(), ..signed.token.clone() };
        let forged_b64 = URL_SAFE_NO_PAD.encode(postcard::to_stdvec(&forged).unwrap());
        let (_, signature) = signed.payload.rsplit_once('.').unwrap();
        let payload = format!("{QR_PAYLOAD_PREFIX}{forged_b64}.{signature}");

        let err = signer.verify(&payload, NOW).unwrap_err();
        assert!(matches!(err, CourseError::InvalidToken { .. }), "{err}");
    }

    #[test]
    fn foreign_key_is_rejected() {
        let signed = signer(Some(SEED)).sign("course-1", NOW).unwrap();
        let err = signer(None).verify(&signed.payload, NOW).unwrap_err();
        assert!(matches!(err, CourseError::InvalidToken { .. }));
    }

    #[test]
    fn expiry_and_future_issue_are_enforced() {
        let signer = signer(Some(SEED));
        let signed = signer.sign("course-1", NOW).unwrap();

        let expired = signer.verify(&signed.payload, signed.token.expires_at + 1).unwrap_err();
        assert!(matches!(expired, CourseError::ExpiredToken { .. }));

        // Default skew is 30 s.
        assert!(signer.verify(&signed.payload, NOW - 29_000).is_ok());
        let early = signer.verify(&signed.payload, NOW - 31_000).unwrap_err();
        assert!(matches!(early, CourseError::InvalidToken { .. }));
    }

    #[test]
    fn malformed_payloads_are_rejected() {
        let signer = signer(Some(SEED));
        for payload in [
            "",
            "course-1",
            "rollcall:v2:abc.def",
            "rollcall:v1:no-signature",
            "rollcall:v1:!!!.???",
            "rollcall:v1:AAAA.AAAA",
        ] {
            let err = signer.verify(payload, NOW).unwrap_err();
            assert!(matches!(err, CourseError::InvalidToken { .. }), "{payload}: {err}");
        }
    }

    #[test]
    fn bad_seeds_fail() {
        for seed in ["zz", "abcd"] {
            let err = QrSigner::from_config(&QrConfig {
                signing_seed: Some(seed.into()),
                ..QrConfig::default()
            })
            .unwrap_err();
            assert!(matches!(err, CourseError::Validation { .. }));
        }

        let zero_ttl = QrSigner::from_config(&QrConfig { ttl_seconds: 0, ..QrConfig::default() });
        assert!(zero_ttl.is_err());
    }

    #[test]
    fn renders_svg() {
        let signer = signer(Some(SEED));
        let signed = signer.sign("course-1", NOW).unwrap();
        let svg = signer.render_svg(&signed.payload).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn debug_hides_the_signing_key() {
        let rendered = format!("{:?}", signer(Some(SEED)));
        assert!(!rendered.contains(SEED));
    }
}
