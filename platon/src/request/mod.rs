//! Typed request models and their composition into signed requests.
//!
//! An [`Operation`] is a validated model for one gateway action. [`compose`]
//! turns it into a [`GatewayRequest`]: the `action`, `client_key` and model
//! parameters merged in that order, `term_url_3ds` appended where the action
//! needs it, and the signature inserted last.
//!
//! ```
//! use platon::amount::Amount;
//! use platon::config::Credentials;
//! use platon::request::{PayerIdentity, CaptureRequest, compose};
//! use url::Url;
//!
//! let credentials = Credentials::new(
//!     "CLIENT-KEY",
//!     "secret",
//!     Url::parse("https://secure.platononline.com/post-unq/").unwrap(),
//! )
//! .unwrap();
//! let capture = CaptureRequest::new("T-1", PayerIdentity::new("a@b.c", "4111111111111111"))
//!     .with_amount(Amount::try_from(10_u32).unwrap());
//!
//! let request = compose(&capture, &credentials).unwrap();
//! assert_eq!(
//!     request.params.fields().map(|f| f.wire_name()).collect::<Vec<_>>(),
//!     ["action", "client_key", "trans_id", "amount", "hash"],
//! );
//! ```

mod models;
mod operations;
mod web;

pub use models::*;
pub use operations::*;
pub use web::*;

#[cfg(feature = "telemetry")]
use tracing::instrument;
use url::Url;

use crate::catalog::{Action, Field, HttpMethod};
use crate::config::Credentials;
use crate::error::{ConfigError, Error, ValidationError};
use crate::params::{ParameterSet, Parameters};
use crate::query::encode_query;
use crate::signature::SignatureTable;

/// A request model for one gateway action.
pub trait Operation: Parameters {
    /// The action this model requests.
    fn action(&self) -> Action;

    /// Checks the model before composition.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }

    /// Values the signature reads but that are not transmitted.
    fn signing_parameters(&self) -> ParameterSet {
        ParameterSet::new()
    }
}

/// A composed and signed server-to-server request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayRequest {
    /// Action that produced this request; responses are resolved against it.
    pub action: Action,
    /// HTTP method, fixed per action.
    pub method: HttpMethod,
    /// Endpoint without the query string.
    pub url: Url,
    /// Signed parameters, in wire order.
    pub params: ParameterSet,
}

impl GatewayRequest {
    /// Form-encoded parameters.
    #[must_use]
    pub fn query(&self) -> String {
        encode_query(&self.params)
    }

    /// Request body: the encoded parameters for `POST`, nothing for `GET`.
    #[must_use]
    pub fn body(&self) -> Option<String> {
        (self.method != HttpMethod::Get).then(|| self.query())
    }

    /// URL to send to: for `GET`, the endpoint with the encoded parameters
    /// appended after any query it already carries.
    #[must_use]
    pub fn target_url(&self) -> Url {
        let mut url = self.url.clone();
        if self.method == HttpMethod::Get {
            let query = match url.query() {
                Some(existing) if !existing.is_empty() => format!("{existing}&{}", self.query()),
                _ => self.query(),
            };
            url.set_query(Some(&query));
        }
        url
    }
}

/// Composes and signs `operation` with the default signature table.
///
/// # Errors
///
/// See [`compose_with`].
pub fn compose<O: Operation>(operation: &O, credentials: &Credentials) -> Result<GatewayRequest, Error> {
    compose_with(operation, credentials, SignatureTable::standard())
}

/// Composes and signs `operation` with a caller-supplied signature table.
///
/// # Errors
///
/// - [`Error::Configuration`] when the credentials are unusable or the action
///   needs a 3-D Secure return URL and none is configured;
/// - [`Error::Validation`] when the model is invalid, the action is
///   callback-only, or a signature field is missing.
#[cfg_attr(
    feature = "telemetry",
    instrument(name = "platon.compose", skip_all, err, fields(action = %operation.action()))
)]
pub fn compose_with<O: Operation>(
    operation: &O,
    credentials: &Credentials,
    table: &SignatureTable,
) -> Result<GatewayRequest, Error> {
    credentials.validate()?;
    let action = operation.action();
    if !action.is_client_initiated() {
        return Err(ValidationError::NotClientInitiated(action).into());
    }
    operation.validate()?;

    let mut params = ParameterSet::from_parts(&[&action, credentials, operation]);
    if action.needs_term_url() && !params.contains(Field::TermUrl3ds) {
        let term_url = credentials
            .term_url_3ds()
            .ok_or(ConfigError::Missing(crate::config::TERM_URL_3DS))?;
        params.insert(Field::TermUrl3ds, term_url.as_str());
    }
    table.sign_with(&mut params, &operation.signing_parameters(), credentials.client_pass())?;

    let url = match action {
        Action::GetTransStatusByOrder => credentials.state_url().clone(),
        _ => credentials.payment_url().clone(),
    };

    #[cfg(feature = "telemetry")]
    tracing::debug!(fields = params.len(), "Composed gateway request");

    Ok(GatewayRequest {
        action,
        method: action.http_method(),
        url,
        params,
    })
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::{Card, Order, Payer, SaleRequest};
    use crate::amount::Amount;
    use crate::config::Credentials;
    use url::Url;

    pub const SECRET: &str = "d2a9e1c43f";

    pub fn credentials() -> Credentials {
        Credentials::new(
            "CLIENT-KEY",
            SECRET,
            Url::parse("https://secure.platononline.com/post-unq/").unwrap(),
        )
        .unwrap()
        .with_term_url_3ds(Url::parse("https://shop.example/3ds").unwrap())
        .with_state_url(Url::parse("https://secure.platononline.com/state/").unwrap())
    }

    pub fn payer() -> Payer {
        Payer {
            first_name: "Leo".to_owned(),
            last_name: "Ernser".to_owned(),
            address: "1 Main St".to_owned(),
            country: "UA".to_owned(),
            city: "Kyiv".to_owned(),
            zip: "01001".to_owned(),
            email: "a@b.c".to_owned(),
            phone: "380501234567".to_owned(),
            ip: "192.0.2.1".to_owned(),
            ..Payer::default()
        }
    }

    pub fn sale() -> SaleRequest {
        SaleRequest::new(
            Order::new("O-1", Amount::try_from(15.5_f64).unwrap(), "UAH", "Order #1"),
            Card::new("4111111111111111", 1, 2030, "123"),
            payer(),
        )
    }

    pub fn md5_upper(input: &str) -> String {
        use md5::{Digest, Md5};
        hex::encode(Md5::digest(input.to_uppercase().as_bytes()))
    }
}
