//! Merchant credentials.
//!
//! Credentials are loaded once and shared read-only. Three sources are
//! supported:
//!
//! - the process environment via [`Credentials::from_env`], after loading a
//!   `.env` file when one exists;
//! - a TOML file via [`Credentials::load_from`] or [`Credentials::from_toml_str`],
//!   where string values may reference environment variables as `$VAR` or
//!   `${VAR}`;
//! - any serde format, since [`Credentials`] implements `Deserialize`.
//!
//! # Example Configuration
//!
//! ```toml
//! client_key = "$PLATON_CLIENT_KEY"
//! client_pass = "${PLATON_CLIENT_PASS}"
//! payment_url = "https://secure.platononline.com/post-unq/"
//! term_url_3ds = "https://shop.example/3ds-return"
//! ```

use serde::{Deserialize, Serialize};
use serde_with::{NoneAsEmptyString, serde_as};
use std::fmt;
use std::path::Path;
use url::Url;

use crate::catalog::Field;
use crate::error::ConfigError;
use crate::params::{ParameterSet, Parameters};

/// Environment key of the merchant account key.
pub const CLIENT_KEY: &str = "CLIENT_KEY";
/// Environment key of the merchant password used for signatures.
pub const CLIENT_PASS: &str = "CLIENT_PASS";
/// Environment key of the gateway endpoint.
pub const PAYMENT_URL: &str = "PAYMENT_URL";
/// Environment key of the 3-D Secure return URL.
pub const TERM_URL_3DS: &str = "TERM_URL_3DS";
/// Environment key of the order-state endpoint.
pub const STATE_URL: &str = "STATE_URL";

/// Merchant credentials and endpoints.
#[serde_as]
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account key, sent as `client_key` (or `key` for web payments).
    #[serde(alias = "CLIENT_KEY")]
    client_key: String,

    /// Password, used only to compute signatures. Never serialized.
    #[serde(alias = "CLIENT_PASS", skip_serializing)]
    client_pass: String,

    /// Gateway endpoint for all operations.
    #[serde(alias = "PAYMENT_URL")]
    payment_url: Url,

    /// Where the payer returns after 3-D Secure. Sent with sale-like actions.
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default, alias = "TERM_URL_3DS")]
    term_url_3ds: Option<Url>,

    /// Endpoint for order-state queries; falls back to `payment_url`.
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default, alias = "STATE_URL")]
    state_url: Option<Url>,
}

impl Credentials {
    /// Creates validated credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Empty`] when the key or password is empty.
    pub fn new(
        client_key: impl Into<String>,
        client_pass: impl Into<String>,
        payment_url: Url,
    ) -> Result<Self, ConfigError> {
        let credentials = Self {
            client_key: client_key.into(),
            client_pass: client_pass.into(),
            payment_url,
            term_url_3ds: None,
            state_url: None,
        };
        credentials.validate()?;
        Ok(credentials)
    }

    /// Sets the 3-D Secure return URL.
    #[must_use]
    pub fn with_term_url_3ds(mut self, url: Url) -> Self {
        self.term_url_3ds = Some(url);
        self
    }

    /// Sets the order-state endpoint.
    #[must_use]
    pub fn with_state_url(mut self, url: Url) -> Self {
        self.state_url = Some(url);
        self
    }

    /// Loads credentials from the process environment.
    ///
    /// A `.env` file in the working directory (or a parent) is loaded first
    /// when present; variables already set in the environment win.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required key is missing or empty, or a
    /// URL is malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is not an error.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads credentials through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`Credentials::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));
        let optional_url = |key: &'static str| -> Result<Option<Url>, ConfigError> {
            match lookup(key) {
                Some(value) if !value.trim().is_empty() => parse_url(key, &value).map(Some),
                _ => Ok(None),
            }
        };

        let credentials = Self {
            client_key: required(CLIENT_KEY)?,
            client_pass: required(CLIENT_PASS)?,
            payment_url: parse_url(PAYMENT_URL, &required(PAYMENT_URL)?)?,
            term_url_3ds: optional_url(TERM_URL_3DS)?,
            state_url: optional_url(STATE_URL)?,
        };
        credentials.validate()?;
        Ok(credentials)
    }

    /// Parses credentials from TOML, expanding `$VAR` / `${VAR}` references
    /// from the process environment first.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] for malformed input and
    /// [`ConfigError::Empty`] for empty credentials.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::from_toml_with(content, |key| std::env::var(key).ok())
    }

    fn from_toml_with<F>(content: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let expanded = expand_vars(content, lookup);
        let credentials: Self = toml::from_str(&expanded)?;
        credentials.validate()?;
        Ok(credentials)
    }

    /// Loads credentials from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise
    /// see [`Credentials::from_toml_str`].
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Checks that the key and password are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Empty`] naming the first empty key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_key.trim().is_empty() {
            return Err(ConfigError::Empty(CLIENT_KEY));
        }
        if self.client_pass.is_empty() {
            return Err(ConfigError::Empty(CLIENT_PASS));
        }
        Ok(())
    }

    /// Account key.
    #[must_use]
    pub fn client_key(&self) -> &str {
        &self.client_key
    }

    /// Signature password.
    #[must_use]
    pub fn client_pass(&self) -> &str {
        &self.client_pass
    }

    /// Gateway endpoint.
    #[must_use]
    pub const fn payment_url(&self) -> &Url {
        &self.payment_url
    }

    /// 3-D Secure return URL, if configured.
    #[must_use]
    pub const fn term_url_3ds(&self) -> Option<&Url> {
        self.term_url_3ds.as_ref()
    }

    /// Order-state endpoint, falling back to the payment endpoint.
    #[must_use]
    pub fn state_url(&self) -> &Url {
        self.state_url.as_ref().unwrap_or(&self.payment_url)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_key", &self.client_key)
            .field("client_pass", &"<redacted>")
            .field("payment_url", &self.payment_url.as_str())
            .field("term_url_3ds", &self.term_url_3ds.as_ref().map(Url::as_str))
            .field("state_url", &self.state_url.as_ref().map(Url::as_str))
            .finish()
    }
}

/// Contributes `client_key`.
impl Parameters for Credentials {
    fn parameters(&self) -> ParameterSet {
        ParameterSet::new().with(Field::ClientKey, self.client_key.as_str())
    }
}

fn parse_url(key: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value.trim()).map_err(|source| ConfigError::InvalidUrl { key, source })
}

/// Expands `$VAR` and `${VAR}` patterns through `lookup`.
///
/// Unresolved variables are left as-is.
fn expand_vars<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }

        let braced = chars.peek() == Some(&'{');
        if braced {
            chars.next();
        }

        let mut name = String::new();
        let mut closed = false;
        while let Some(&c) = chars.peek() {
            if braced && c == '}' {
                chars.next();
                closed = true;
                break;
            }
            if !braced && !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            name.push(c);
            chars.next();
        }

        match lookup(&name) {
            Some(value) if !name.is_empty() && (closed || !braced) => result.push_str(&value),
            _ => {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&name);
                if closed {
                    result.push('}');
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_serialize_omits_password() {
        let credentials = Credentials::new(
            "k",
            "very-secret",
            Url::parse("https://secure.platononline.com/post-unq/").unwrap(),
        )
        .unwrap();
        let json = serde_json::to_value(&credentials).unwrap();
        assert_eq!(json["client_key"], "k");
        assert!(json.get("client_pass").is_none());
        assert!(!json.to_string().contains("very-secret"));
    }

    #[test]
    fn test_from_lookup() {
        let creds = Credentials::from_lookup(lookup(&[
            (CLIENT_KEY, "key-1"),
            (CLIENT_PASS, "secret"),
            (PAYMENT_URL, "https://gateway.test/post/"),
            (TERM_URL_3DS, "https://shop.test/3ds"),
        ]))
        .unwrap();
        assert_eq!(creds.client_key(), "key-1");
        assert_eq!(creds.client_pass(), "secret");
        assert_eq!(creds.term_url_3ds().unwrap().as_str(), "https://shop.test/3ds");
        assert_eq!(creds.state_url(), creds.payment_url());
    }

    #[test]
    fn test_missing_and_empty_keys() {
        let err = Credentials::from_lookup(lookup(&[(CLIENT_KEY, "k")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(CLIENT_PASS)));

        let err = Credentials::from_lookup(lookup(&[
            (CLIENT_KEY, "  "),
            (CLIENT_PASS, "p"),
            (PAYMENT_URL, "https://gateway.test/"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Empty(CLIENT_KEY)));
    }

    #[test]
    fn test_invalid_url() {
        let err = Credentials::from_lookup(lookup(&[
            (CLIENT_KEY, "k"),
            (CLIENT_PASS, "p"),
            (PAYMENT_URL, "not a url"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { key: PAYMENT_URL, .. }));
    }

    #[test]
    fn test_toml_with_expansion() {
        let content = r#"
            client_key = "$KEY"
            client_pass = "${PASS}"
            payment_url = "https://gateway.test/post/"
            term_url_3ds = ""
        "#;
        let creds =
            Credentials::from_toml_with(content, lookup(&[("KEY", "k-1"), ("PASS", "p-1")]))
                .unwrap();
        assert_eq!(creds.client_key(), "k-1");
        assert_eq!(creds.client_pass(), "p-1");
        assert!(creds.term_url_3ds().is_none());
    }

    #[test]
    fn test_toml_accepts_uppercase_keys() {
        let content = r#"
            CLIENT_KEY = "k"
            CLIENT_PASS = "p"
            PAYMENT_URL = "https://gateway.test/"
            STATE_URL = "https://gateway.test/state"
        "#;
        let creds = Credentials::from_toml_with(content, |_| None).unwrap();
        assert_eq!(creds.state_url().as_str(), "https://gateway.test/state");
    }

    #[test]
    fn test_toml_empty_pass_rejected() {
        let content = r#"
            client_key = "k"
            client_pass = "$UNSET_PASS"
            payment_url = "https://gateway.test/"
        "#;
        // Unresolved variables stay literal, so only a truly empty value fails.
        assert!(Credentials::from_toml_with(content, |_| None).is_ok());
        let content = content.replace("$UNSET_PASS", "");
        assert!(matches!(
            Credentials::from_toml_with(&content, |_| None),
            Err(ConfigError::Empty(CLIENT_PASS))
        ));
    }

    #[test]
    fn test_expand_vars() {
        let vars = lookup(&[("A", "1"), ("B_2", "two")]);
        assert_eq!(expand_vars("x=$A, y=${B_2}", &vars), "x=1, y=two");
        assert_eq!(expand_vars("$MISSING ${MISSING}", &vars), "$MISSING ${MISSING}");
        assert_eq!(expand_vars("cost: 5$", &vars), "cost: 5$");
        assert_eq!(expand_vars("${A", &vars), "${A");
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::new("k", "very-secret", Url::parse("https://g.test/").unwrap())
            .unwrap();
        let debug = format!("{creds:?}");
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_contributes_client_key() {
        let creds = Credentials::new("k", "p", Url::parse("https://g.test/").unwrap()).unwrap();
        assert_eq!(creds.parameters().text(Field::ClientKey), Some("k"));
    }
}
