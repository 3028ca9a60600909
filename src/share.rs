//! Share tokens: an attendance record packed into a URL path segment.
//!
//! A token is the JSON object `{"t": total, "a": attended}` encoded with the
//! URL-safe base64 alphabet. Tokens are not signed; anyone can mint one.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::models::{AttendanceRecord, RecordError};

/// Emits `=` padding, accepts tokens with or without it.
const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

pub const SHARE_PATH: &str = "check/";

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token is not url-safe base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error("token payload is malformed: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("token holds an impossible record: {0}")]
    Record(#[from] RecordError),
}

#[derive(Deserialize)]
struct SharePayload {
    t: u32,
    a: u32,
}

pub fn encode(record: &AttendanceRecord) -> String {
    let payload = json!({ "t": record.total(), "a": record.attended() }).to_string();
    TOKEN_ENGINE.encode(payload)
}

pub fn try_decode(token: &str) -> Result<AttendanceRecord, TokenError> {
    let bytes = TOKEN_ENGINE.decode(token)?;
    let payload: SharePayload = serde_json::from_slice(&bytes)?;
    Ok(AttendanceRecord::new(
        i64::from(payload.t),
        i64::from(payload.a),
    )?)
}

/// Decodes `token` into `(total, attended)`.
///
/// Any failure yields `(0, 0)`, which callers treat the same as an empty
/// record. Use [`try_decode`] to tell the failure kinds apart.
pub fn decode(token: &str) -> (u32, u32) {
    match try_decode(token) {
        Ok(record) => (record.total(), record.attended()),
        Err(err) => {
            tracing::debug!(error = %err, "rejected share token");
            (0, 0)
        }
    }
}

pub fn share_url(base_url: &str, token: &str) -> String {
    format!("{}/{}{}", base_url.trim_end_matches('/'), SHARE_PATH, token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(total: i64, attended: i64) -> AttendanceRecord {
        AttendanceRecord::new(total, attended).unwrap()
    }

    #[test]
    fn round_trips_across_ranges() {
        for total in [0i64, 1, 100, 100_000] {
            for attended in 0..=total {
                let token = encode(&record(total, attended));
                assert_eq!(decode(&token), (total as u32, attended as u32));
            }
        }
    }

    #[test]
    fn tokens_need_no_url_escaping() {
        for (total, attended) in [(1, 0), (63, 62), (4_294_967_295, 4_294_967_294)] {
            let token = encode(&record(total, attended));
            assert!(token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '=')));
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let first = encode(&record(42, 37));
        let second = encode(&record(42, 37));
        assert_eq!(first, second);
    }

    #[test]
    fn accepts_tokens_with_spaced_json_and_missing_padding() {
        // {"t": 10, "a": 5}
        assert_eq!(decode("eyJ0IjogMTAsICJhIjogNX0="), (10, 5));
        assert_eq!(decode("eyJ0IjogMTAsICJhIjogNX0"), (10, 5));
        // {"t":120,"a":96}
        assert_eq!(decode("eyJ0IjoxMjAsImEiOjk2fQ=="), (120, 96));
    }

    #[test]
    fn garbage_decodes_to_sentinel() {
        assert_eq!(decode(""), (0, 0));
        assert_eq!(decode("!!not*base64!!"), (0, 0));
        assert_eq!(decode("\u{1F600}\u{0}\u{7f}"), (0, 0));
        assert!(matches!(try_decode("%%%%"), Err(TokenError::Encoding(_))));
    }

    #[test]
    fn malformed_payloads_are_told_apart() {
        let not_json = TOKEN_ENGINE.encode("hello");
        assert!(matches!(try_decode(&not_json), Err(TokenError::Payload(_))));

        let missing_field = TOKEN_ENGINE.encode(r#"{"t": 10}"#);
        assert!(matches!(
            try_decode(&missing_field),
            Err(TokenError::Payload(_))
        ));

        let negative = TOKEN_ENGINE.encode(r#"{"t": 10, "a": -1}"#);
        assert!(matches!(try_decode(&negative), Err(TokenError::Payload(_))));

        let impossible = TOKEN_ENGINE.encode(r#"{"t": 3, "a": 9}"#);
        assert!(matches!(
            try_decode(&impossible),
            Err(TokenError::Record(RecordError::AttendedExceedsTotal))
        ));
        assert_eq!(decode(&impossible), (0, 0));
    }

    #[test]
    fn share_url_joins_base_and_token() {
        assert_eq!(
            share_url("http://localhost:5000/", "abc="),
            "http://localhost:5000/check/abc="
        );
        assert_eq!(
            share_url("https://attendance.example.com", "abc="),
            "https://attendance.example.com/check/abc="
        );
    }
}
