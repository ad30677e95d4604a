// Bearer tokens issued by the external API
//
// Tokens are opaque here: no decoding, no signature check, no expiry. The
// external API is the only judge of whether one is still good.

use std::fmt;

use serde_json::Value;

/// Opaque bearer token
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Parse a stored value; empty strings are not tokens
    pub fn from_stored(value: String) -> Option<Self> {
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Raw token value, for the Authorization header and the session store only
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(***)")
    }
}

/// Find the token in a login/register body
///
/// Checked in order: `token`, `access_token`, `data.token`.
pub fn extract_token(body: &Value) -> Option<BearerToken> {
    let candidates = [
        body.get("token"),
        body.get("access_token"),
        body.get("data").and_then(|data| data.get("token")),
    ];

    candidates
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .find(|token| !token.trim().is_empty())
        .map(BearerToken::new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_lookup_order() {
        let body = json!({"token": "first", "access_token": "second", "data": {"token": "third"}});
        assert_eq!(extract_token(&body).unwrap().expose(), "first");

        let body = json!({"access_token": "second", "data": {"token": "third"}});
        assert_eq!(extract_token(&body).unwrap().expose(), "second");

        let body = json!({"data": {"token": "third"}});
        assert_eq!(extract_token(&body).unwrap().expose(), "third");
    }

    #[test]
    fn test_empty_or_non_string_tokens_are_ignored() {
        assert!(extract_token(&json!({"token": ""})).is_none());
        assert!(extract_token(&json!({"token": 42})).is_none());
        assert!(extract_token(&json!({"data": [1, 2]})).is_none());
        assert_eq!(
            extract_token(&json!({"token": "", "access_token": "fallback"}))
                .unwrap()
                .expose(),
            "fallback"
        );
    }

    #[test]
    fn test_debug_output_hides_value() {
        let token = BearerToken::new("super-secret");
        assert!(!format!("{:?}", token).contains("super-secret"));
    }

    #[test]
    fn test_from_stored_rejects_blank() {
        assert!(BearerToken::from_stored(String::new()).is_none());
        assert!(BearerToken::from_stored("   ".to_string()).is_none());
        assert!(BearerToken::from_stored("abc".to_string()).is_some());
    }

    proptest! {
        #[test]
        fn prop_nested_token_is_found(token in "[A-Za-z0-9|]{1,64}") {
            let body = json!({"data": {"token": token.clone(), "user": {"id": 1}}});
            prop_assert_eq!(extract_token(&body).map(|t| t.expose().to_string()), Some(token));
        }
    }
}
