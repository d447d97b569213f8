// Bearer-token authentication.
//
// The backend issues a token at sign-in (outside this crate). Every
// request carries it as `Authorization: Bearer <token>`; the header is
// installed once as a default header on the `reqwest::Client`.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Build the default header map carrying the bearer token.
///
/// The header value is marked sensitive so it never shows up in
/// `Debug` output or request logs.
pub fn bearer_headers(token: &SecretString) -> Result<HeaderMap, Error> {
    let raw = token.expose_secret().trim();
    if raw.is_empty() {
        return Err(Error::Authentication {
            message: "no token configured".into(),
        });
    }

    let mut value =
        HeaderValue::from_str(&format!("Bearer {raw}")).map_err(|_| Error::Authentication {
            message: "token contains characters not allowed in an HTTP header".into(),
        })?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builds_sensitive_bearer_header() {
        let token = SecretString::from("abc.def.ghi".to_string());
        let headers = bearer_headers(&token).unwrap();
        let value = headers.get(AUTHORIZATION).unwrap();
        assert!(value.is_sensitive());
        assert_eq!(value.to_str().unwrap(), "Bearer abc.def.ghi");
    }

    #[test]
    fn rejects_blank_token() {
        let token = SecretString::from("   ".to_string());
        assert!(matches!(
            bearer_headers(&token),
            Err(Error::Authentication { .. })
        ));
    }

    #[test]
    fn rejects_header_breaking_token() {
        let token = SecretString::from("abc\ndef".to_string());
        assert!(bearer_headers(&token).is_err());
    }
}
