//! Decoded gateway responses.
//!
//! Every response resolves to exactly one [`ResponseVariant`], chosen by the
//! `result` discriminator. Variants are plain immutable values; each carries
//! only the fields that exist together for that outcome.

mod resolver;

pub use resolver::{resolve, resolve_detailed};

use serde::{Deserialize, Serialize};
use url::{Url, form_urlencoded};

use crate::amount::Amount;
use crate::catalog::{Action, Field, HttpMethod, ResultCode, Status, TransactionType};
use crate::describe::{Describe, Description};
use crate::error::{Error, GatewayError};
use crate::params::ParameterSet;

/// Fields shared by every sale-like response. Empty wire strings are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SaleReference {
    /// Merchant order id.
    pub order_id: Option<String>,
    /// Gateway transaction id.
    pub trans_id: Option<String>,
    /// Transaction date as reported.
    pub trans_date: Option<String>,
    /// Statement descriptor.
    pub descriptor: Option<String>,
    /// Amount, when echoed.
    pub amount: Option<Amount>,
    /// Currency, when echoed.
    pub currency: Option<String>,
    /// Schedule id of schedule operations.
    pub schedule_id: Option<String>,
    /// Transaction history of `GET_TRANS_DETAILS`; empty otherwise.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub transactions: Vec<TransactionRecord>,
}

/// One entry of an order's transaction history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Transaction date.
    #[serde(default)]
    pub date: Option<String>,
    /// Transaction kind.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// Outcome of this transaction (`success`, `fail`, ...).
    #[serde(default)]
    pub status: Option<String>,
    /// Amount moved.
    #[serde(default)]
    pub amount: Option<Amount>,
}

/// `SUCCESS` / `ACCEPTED` without a transaction status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuccessResponse {
    /// Originating action.
    pub action: Action,
    /// `SUCCESS` or `ACCEPTED`.
    pub result: ResultCode,
    /// Sale fields.
    pub sale: SaleReference,
    /// Token for later recurring sales, where the action returns one.
    pub recurring_token: Option<String>,
}

/// `SUCCESS` / `ACCEPTED` with a transaction status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusResponse {
    /// Originating action.
    pub action: Action,
    /// `SUCCESS` or `ACCEPTED`.
    pub result: ResultCode,
    /// Sale fields.
    pub sale: SaleReference,
    /// Transaction status.
    pub status: Status,
    /// Token for later recurring sales, where the action returns one.
    pub recurring_token: Option<String>,
}

/// `DECLINED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclinedResponse {
    /// Originating action.
    pub action: Action,
    /// Sale fields.
    pub sale: SaleReference,
    /// Transaction status.
    pub status: Status,
    /// Why the issuer or gateway declined.
    pub decline_reason: String,
}

/// `REDIRECT`: the payer must pass a 3-D Secure or Apple Pay challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectResponse {
    /// Originating action.
    pub action: Action,
    /// Sale fields.
    pub sale: SaleReference,
    /// Transaction status, usually `3DS`.
    pub status: Status,
    /// Challenge endpoint.
    pub redirect_url: Url,
    /// Parameters to forward to the challenge endpoint, keyed by catalog
    /// field.
    pub redirect_params: ParameterSet,
    /// The same parameters exactly as received: original spelling and
    /// order, names outside the catalog included. Replayed verbatim.
    pub received_params: Vec<(String, String)>,
    /// Method to forward them with.
    pub redirect_method: HttpMethod,
}

impl RedirectResponse {
    /// Builds the request that continues the challenge.
    ///
    /// The received parameters travel in the body for every method but
    /// `GET`, where they are appended to any query already on the URL.
    #[must_use]
    pub fn replay_request(&self) -> ReplayRequest {
        let mut url = self.redirect_url.clone();
        let body = if self.redirect_method == HttpMethod::Get {
            if !self.received_params.is_empty() {
                url.query_pairs_mut().extend_pairs(&self.received_params);
            }
            None
        } else {
            Some(
                form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(&self.received_params)
                    .finish(),
            )
        };
        ReplayRequest {
            method: self.redirect_method,
            url,
            body,
        }
    }
}

/// A request the payer's browser (or the transport) sends to continue a
/// challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Target URL, including the query for `GET`.
    pub url: Url,
    /// Form-encoded body.
    pub body: Option<String>,
}

/// The closed set of response shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum ResponseVariant {
    /// Completed or accepted, no status companion.
    Success(SuccessResponse),
    /// Completed or accepted, with a status.
    SuccessWithStatus(StatusResponse),
    /// Challenge required.
    Redirect(RedirectResponse),
    /// Declined.
    Declined(DeclinedResponse),
    /// Gateway error envelope.
    Error(GatewayError),
}

impl ResponseVariant {
    /// Originating action, for every variant but [`ResponseVariant::Error`].
    #[must_use]
    pub const fn action(&self) -> Option<Action> {
        match self {
            Self::Success(r) => Some(r.action),
            Self::SuccessWithStatus(r) => Some(r.action),
            Self::Redirect(r) => Some(r.action),
            Self::Declined(r) => Some(r.action),
            Self::Error(_) => None,
        }
    }

    /// Transaction status, when the variant has one.
    #[must_use]
    pub const fn status(&self) -> Option<Status> {
        match self {
            Self::SuccessWithStatus(r) => Some(r.status),
            Self::Redirect(r) => Some(r.status),
            Self::Declined(r) => Some(r.status),
            Self::Success(_) | Self::Error(_) => None,
        }
    }

    /// Sale fields, for every variant but [`ResponseVariant::Error`].
    #[must_use]
    pub const fn sale(&self) -> Option<&SaleReference> {
        match self {
            Self::Success(r) => Some(&r.sale),
            Self::SuccessWithStatus(r) => Some(&r.sale),
            Self::Redirect(r) => Some(&r.sale),
            Self::Declined(r) => Some(&r.sale),
            Self::Error(_) => None,
        }
    }

    /// Turns the error variant into `Err` for `?`-style handling.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Server`] for [`ResponseVariant::Error`].
    pub fn into_result(self) -> Result<Self, Error> {
        match self {
            Self::Error(err) => Err(Error::Server(err)),
            other => Ok(other),
        }
    }
}

/// A field the resolver saw but did not use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Unexpected {
    /// A marker field of another variant.
    Field(Field),
    /// A redirect parameter outside the catalog. It is not replayed.
    RedirectParam(String),
    /// The response names another action than the request.
    ActionMismatch {
        /// Action of the request.
        expected: Action,
        /// Action named by the response.
        received: Action,
    },
}

/// A resolved variant plus everything that was ignored on the way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// The resolved variant.
    pub variant: ResponseVariant,
    /// Ignored fields, in the order they were found.
    pub unexpected: Vec<Unexpected>,
}

/// Whether a success companion field belongs to an action's response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Must be present.
    Required,
    /// May be present.
    Optional,
    /// Must not be present; reported as unexpected when it is.
    Absent,
}

/// Companion fields of a success response, keyed by action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuccessCompanions {
    /// The `status` field.
    pub status: Presence,
    /// The `recurring_token` field.
    pub recurring_token: Presence,
}

impl SuccessCompanions {
    /// Looks up the companions of `action`.
    #[must_use]
    pub const fn for_action(action: Action) -> Self {
        use Presence::{Absent, Optional, Required};

        let (status, recurring_token) = match action {
            Action::Sale | Action::TokenSale | Action::ApplePay | Action::RecurringSale => {
                (Required, Optional)
            }
            Action::Capture | Action::GetTransStatus | Action::GetTransStatusByOrder => {
                (Required, Absent)
            }
            Action::CreditVoid | Action::GetTransDetails | Action::Deschedule => {
                (Optional, Absent)
            }
            Action::Schedule => (Absent, Absent),
            Action::Chargeback | Action::SecondChargeback | Action::SecondPresentment => {
                (Required, Absent)
            }
        };
        Self {
            status,
            recurring_token,
        }
    }
}

impl Describe for SaleReference {
    fn describe(&self) -> String {
        Description::new("SaleReference")
            .optional("order_id", self.order_id.as_deref())
            .optional("trans_id", self.trans_id.as_deref())
            .optional("trans_date", self.trans_date.as_deref())
            .optional("descriptor", self.descriptor.as_deref())
            .optional("amount", self.amount)
            .optional("currency", self.currency.as_deref())
            .finish()
    }
}

impl Describe for ResponseVariant {
    fn describe(&self) -> String {
        match self {
            Self::Success(r) => Description::new("Success")
                .field("action", r.action)
                .field("result", r.result)
                .field("sale", r.sale.describe())
                .optional("recurring_token", r.recurring_token.as_deref())
                .finish(),
            Self::SuccessWithStatus(r) => Description::new("SuccessWithStatus")
                .field("action", r.action)
                .field("result", r.result)
                .field("status", r.status)
                .field("sale", r.sale.describe())
                .optional("recurring_token", r.recurring_token.as_deref())
                .finish(),
            Self::Redirect(r) => Description::new("Redirect")
                .field("action", r.action)
                .field("status", r.status)
                .field("redirect_url", &r.redirect_url)
                .field("redirect_method", r.redirect_method)
                .field("redirect_params", r.redirect_params.len())
                .finish(),
            Self::Declined(r) => Description::new("Declined")
                .field("action", r.action)
                .field("status", r.status)
                .field("decline_reason", &r.decline_reason)
                .field("sale", r.sale.describe())
                .finish(),
            Self::Error(err) => Description::new("Error")
                .field("kind", err.kind)
                .field("code", err.code)
                .field("message", &err.message)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redirect(method: HttpMethod) -> RedirectResponse {
        RedirectResponse {
            action: Action::Sale,
            sale: SaleReference::default(),
            status: Status::Secure3d,
            redirect_url: Url::parse("https://bank.example/3ds").unwrap(),
            redirect_params: ParameterSet::new()
                .with(Field::PaReq, "abc")
                .with(Field::Md, "1"),
            received_params: vec![
                ("PaReq".to_owned(), "abc".to_owned()),
                ("MD".to_owned(), "1".to_owned()),
            ],
            redirect_method: method,
        }
    }

    #[test]
    fn test_post_replay_carries_body() {
        let replay = redirect(HttpMethod::Post).replay_request();
        assert_eq!(replay.method, HttpMethod::Post);
        assert_eq!(replay.url.as_str(), "https://bank.example/3ds");
        assert_eq!(replay.body.as_deref(), Some("PaReq=abc&MD=1"));
    }

    #[test]
    fn test_get_replay_uses_query() {
        let replay = redirect(HttpMethod::Get).replay_request();
        assert_eq!(replay.body, None);
        assert_eq!(replay.url.as_str(), "https://bank.example/3ds?PaReq=abc&MD=1");
    }

    #[test]
    fn test_get_replay_keeps_existing_query() {
        let mut response = redirect(HttpMethod::Get);
        response.redirect_url = Url::parse("https://acs.example/challenge?session=abc").unwrap();
        response.received_params = vec![("MD".to_owned(), "1".to_owned())];
        let replay = response.replay_request();
        assert_eq!(
            replay.url.as_str(),
            "https://acs.example/challenge?session=abc&MD=1"
        );
    }

    #[test]
    fn test_companion_table() {
        let sale = SuccessCompanions::for_action(Action::Sale);
        assert_eq!(sale.status, Presence::Required);
        assert_eq!(sale.recurring_token, Presence::Optional);
        let schedule = SuccessCompanions::for_action(Action::Schedule);
        assert_eq!(schedule.status, Presence::Absent);
    }

    #[test]
    fn test_into_result_maps_error_variant() {
        let variant = ResponseVariant::Error(GatewayError::from_server("bad hash", 0));
        let err = variant.into_result().unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::FromServer);
    }

    #[test]
    fn test_variant_serializes_with_tag() {
        let variant = ResponseVariant::Declined(DeclinedResponse {
            action: Action::Sale,
            sale: SaleReference::default(),
            status: Status::Declined,
            decline_reason: "insufficient_funds".to_owned(),
        });
        let json = serde_json::to_value(&variant).unwrap();
        assert_eq!(json["variant"], "declined");
        assert_eq!(json["status"], "DECLINED");
        assert!(variant.describe().contains("insufficient_funds"));
    }
}
