//! Hosted payment page requests.
//!
//! A web sale is a form POST that lands the buyer on the gateway's payment
//! page. It uses its own field names (`key`, `payment`, `data`, `url`) and
//! is signed into `sign` instead of `hash`.

use base64::prelude::*;
use url::Url;

use super::models::{RecurringWeb, WebPayer, WebSaleOptions, WebScheduleOptions, require, validate_currency};
use crate::amount::Amount;
use crate::catalog::{Field, HttpMethod, PaymentType, YesNo};
use crate::config::Credentials;
use crate::error::{Error, ValidationError};
use crate::params::{ParameterSet, Parameters};
use crate::query::encode_query;
use crate::signature::SignatureTable;

/// Product sold through the payment page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Price.
    pub amount: Amount,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Description shown to the buyer.
    pub description: String,
    /// Start a recurring chain with this payment.
    pub recurring: bool,
}

impl Product {
    /// Creates a one-off product.
    #[must_use]
    pub fn new(amount: Amount, currency: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            amount,
            currency: currency.into(),
            description: description.into(),
            recurring: false,
        }
    }

    /// Base64 of the product JSON, the `data` field.
    #[must_use]
    pub fn encoded(&self) -> String {
        let mut json = serde_json::json!({
            "amount": self.amount.to_wire(),
            "description": self.description,
            "currency": self.currency,
        });
        if self.recurring {
            json["recurring"] = YesNo::Yes.as_str().into();
        }
        BASE64_STANDARD.encode(json.to_string())
    }
}

/// Payment-page sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebSaleRequest {
    /// Payment method.
    pub payment: PaymentType,
    /// Product being sold.
    pub product: Product,
    /// Where the buyer returns after paying.
    pub success_url: Url,
    /// Merchant order id.
    pub order_id: Option<String>,
    /// Prefilled buyer data.
    pub payer: WebPayer,
    /// Stored recurring reference; required for [`PaymentType::Rf`].
    pub recurring: Option<RecurringWeb>,
    /// Recurring schedule started by this payment.
    pub schedule: Option<WebScheduleOptions>,
    /// Page options and pass-through values.
    pub options: WebSaleOptions,
    /// Ask the gateway for a card token.
    pub req_token: bool,
}

impl WebSaleRequest {
    /// Creates a card payment.
    #[must_use]
    pub fn new(product: Product, success_url: Url) -> Self {
        Self {
            payment: PaymentType::Cc,
            product,
            success_url,
            order_id: None,
            payer: WebPayer::default(),
            recurring: None,
            schedule: None,
            options: WebSaleOptions::default(),
            req_token: false,
        }
    }

    /// Creates a one-click payment on a stored recurring reference.
    #[must_use]
    pub fn one_click(product: Product, recurring: RecurringWeb, success_url: Url) -> Self {
        Self {
            payment: PaymentType::Rf,
            recurring: Some(recurring),
            ..Self::new(product, success_url)
        }
    }

    /// Sets the merchant order id.
    #[must_use]
    pub fn with_order_id(mut self, order_id: impl Into<String>) -> Self {
        self.order_id = Some(order_id.into());
        self
    }

    /// Checks the payment method against the recurring reference and the
    /// product fields.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] naming the offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.payment, &self.recurring) {
            (PaymentType::Rf, None) => return Err(ValidationError::MissingField(Field::RcId)),
            (PaymentType::Rf, Some(recurring)) => {
                require(Field::RcId, &recurring.first_trans_id)?;
                require(Field::RcToken, &recurring.token)?;
            }
            (_, Some(_)) => {
                return Err(ValidationError::InvalidValue {
                    field: Field::RcId,
                    reason: format!("not used with {} payments", self.payment),
                });
            }
            (_, None) => {}
        }
        if let Some(order_id) = &self.order_id {
            require(Field::Order, order_id)?;
        }
        validate_currency(Field::Currency, &self.product.currency)?;
        require(Field::Description, &self.product.description)
    }
}

impl Parameters for WebSaleRequest {
    fn parameters(&self) -> ParameterSet {
        let set = self
            .payment
            .parameters()
            .with(Field::Data, self.product.encoded())
            .with(Field::Url, self.success_url.as_str())
            .with_opt(Field::Order, self.order_id.as_deref());
        let set = ParameterSet::from_parts(&[
            &set,
            &self.recurring,
            &self.payer,
            &self.schedule,
            &self.options,
        ]);
        set.with_opt(Field::ReqToken, self.req_token.then_some(YesNo::Yes))
    }
}

/// A signed payment-page form, always sent as `POST`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebPaymentForm {
    /// Payment method.
    pub payment: PaymentType,
    /// Payment page endpoint.
    pub url: Url,
    /// Signed form fields.
    pub params: ParameterSet,
}

impl WebPaymentForm {
    /// HTTP method of the form.
    pub const METHOD: HttpMethod = HttpMethod::Post;

    /// Form-encoded body.
    #[must_use]
    pub fn body(&self) -> String {
        encode_query(&self.params)
    }
}

/// Composes and signs a web sale with the default signature table.
///
/// # Errors
///
/// See [`compose_web_with`].
pub fn compose_web(request: &WebSaleRequest, credentials: &Credentials) -> Result<WebPaymentForm, Error> {
    compose_web_with(request, credentials, SignatureTable::standard())
}

/// Composes and signs a web sale.
///
/// # Errors
///
/// Returns [`Error::Configuration`] for unusable credentials and
/// [`Error::Validation`] for an invalid request or missing signature field.
pub fn compose_web_with(
    request: &WebSaleRequest,
    credentials: &Credentials,
    table: &SignatureTable,
) -> Result<WebPaymentForm, Error> {
    credentials.validate()?;
    request.validate()?;
    let mut params = ParameterSet::new()
        .with(Field::Key, credentials.client_key())
        .merged(&request.parameters());
    table.sign(&mut params, credentials.client_pass())?;

    #[cfg(feature = "telemetry")]
    tracing::debug!(payment = %request.payment, fields = params.len(), "Composed web payment form");

    Ok(WebPaymentForm {
        payment: request.payment,
        url: credentials.payment_url().clone(),
        params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::test_support::{SECRET, credentials, md5_upper};

    fn product() -> Product {
        Product::new(Amount::try_from(1_u32).unwrap(), "UAH", "Test")
    }

    fn success_url() -> Url {
        Url::parse("https://shop.example/ok").unwrap()
    }

    fn rev(s: &str) -> String {
        s.chars().rev().collect()
    }

    #[test]
    fn test_product_data_is_base64_json() {
        let decoded = BASE64_STANDARD.decode(product().encoded()).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(json["amount"], "1.00");
        assert_eq!(json["currency"], "UAH");
        assert!(json.get("recurring").is_none());
    }

    #[test]
    fn test_card_payment_form() {
        let request = WebSaleRequest::new(product(), success_url()).with_order_id("O-1");
        let form = compose_web(&request, &credentials()).unwrap();
        let names: Vec<_> = form.params.fields().map(|f| f.wire_name()).collect();
        assert_eq!(names, ["key", "payment", "data", "url", "order", "sign"]);

        let data = product().encoded();
        let expected = md5_upper(&format!(
            "{}{}{}{}{}",
            rev("CLIENT-KEY"),
            "CC",
            rev(&data),
            rev("https://shop.example/ok"),
            rev(SECRET)
        ));
        assert_eq!(form.params.text(Field::Sign), Some(expected.as_str()));
        assert!(form.body().starts_with("key=CLIENT-KEY&payment=CC&data="));
    }

    #[test]
    fn test_one_click_requires_recurring_reference() {
        let mut request = WebSaleRequest::one_click(
            product(),
            RecurringWeb::new("T-1", "TOKEN"),
            success_url(),
        );
        let form = compose_web(&request, &credentials()).unwrap();
        assert_eq!(form.params.text(Field::RcId), Some("T-1"));
        assert_eq!(form.payment, PaymentType::Rf);

        request.recurring = None;
        assert!(matches!(
            compose_web(&request, &credentials()),
            Err(Error::Validation(ValidationError::MissingField(Field::RcId)))
        ));
    }

    #[test]
    fn test_card_payment_rejects_recurring_reference() {
        let mut request = WebSaleRequest::new(product(), success_url());
        request.recurring = Some(RecurringWeb::new("T-1", "TOKEN"));
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_optional_blocks_are_omitted() {
        let mut request = WebSaleRequest::new(product(), success_url());
        request.schedule = Some(WebScheduleOptions {
            initial_delay: 0,
            period: 30,
            repeat_times: 0,
        });
        request.options = WebSaleOptions::default().with_ext(2, "campaign");
        let params = request.parameters();
        assert!(params.contains(Field::Period));
        assert!(!params.contains(Field::Times));
        assert!(!params.contains(Field::Lang));
        assert_eq!(params.text(Field::Ext2), Some("campaign"));
    }
}
