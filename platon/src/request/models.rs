//! Composable request sub-models.
//!
//! Each sub-model contributes a disjoint group of fields through
//! [`Parameters`], so operations assemble their payload by merging blocks that
//! know nothing about each other.

use serde::Serialize;

use crate::amount::Amount;
use crate::catalog::Field;
use crate::describe::{Describe, Description, mask_card_number};
use crate::error::ValidationError;
use crate::params::{ParameterSet, Parameters};

/// Fails with [`ValidationError::MissingField`] when `value` is blank.
pub(crate) fn require(field: Field, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

/// Fails when `value` is longer than `max` characters.
pub(crate) fn max_len(field: Field, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::InvalidValue {
            field,
            reason: format!("longer than {max} characters"),
        });
    }
    Ok(())
}

/// Payment card data.
#[derive(Clone, PartialEq, Eq)]
pub struct Card {
    /// Primary account number.
    pub number: String,
    /// Expiry month, 1-12.
    pub exp_month: u8,
    /// Four-digit expiry year.
    pub exp_year: u16,
    /// CVV2/CVC2, three or four digits.
    pub cvv2: String,
}

impl Card {
    /// Creates card data.
    #[must_use]
    pub fn new(number: impl Into<String>, exp_month: u8, exp_year: u16, cvv2: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            exp_month,
            exp_year,
            cvv2: cvv2.into(),
        }
    }

    /// Checks number, expiry and CVV2 formats.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidValue`] naming the offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_card_number(Field::CardNumber, &self.number)?;
        if !(1..=12).contains(&self.exp_month) {
            return Err(ValidationError::InvalidValue {
                field: Field::CardExpMonth,
                reason: format!("month {} is outside 1-12", self.exp_month),
            });
        }
        if !(1000..=9999).contains(&self.exp_year) {
            return Err(ValidationError::InvalidValue {
                field: Field::CardExpYear,
                reason: "year must have four digits".to_owned(),
            });
        }
        let cvv_ok =
            (3..=4).contains(&self.cvv2.len()) && self.cvv2.chars().all(|c| c.is_ascii_digit());
        if !cvv_ok {
            return Err(ValidationError::InvalidValue {
                field: Field::CardCvv2,
                reason: "must be 3 or 4 digits".to_owned(),
            });
        }
        Ok(())
    }
}

pub(crate) fn validate_card_number(field: Field, number: &str) -> Result<(), ValidationError> {
    require(field, number)?;
    let digits_ok = (12..=19).contains(&number.len()) && number.chars().all(|c| c.is_ascii_digit());
    if !digits_ok {
        return Err(ValidationError::InvalidValue {
            field,
            reason: "card number must be 12 to 19 digits".to_owned(),
        });
    }
    Ok(())
}

impl std::fmt::Debug for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Card")
            .field("number", &mask_card_number(&self.number))
            .field("exp_month", &self.exp_month)
            .field("exp_year", &self.exp_year)
            .finish_non_exhaustive()
    }
}

impl Parameters for Card {
    fn parameters(&self) -> ParameterSet {
        ParameterSet::new()
            .with(Field::CardNumber, self.number.as_str())
            .with(Field::CardExpMonth, format!("{:02}", self.exp_month))
            .with(Field::CardExpYear, format!("{:04}", self.exp_year))
            .with(Field::CardCvv2, self.cvv2.as_str())
    }
}

impl Describe for Card {
    fn describe(&self) -> String {
        Description::new("Card")
            .field("number", mask_card_number(&self.number))
            .field("exp_month", self.exp_month)
            .field("exp_year", self.exp_year)
            .finish()
    }
}

/// Order data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    /// Merchant-side order id, up to 255 characters.
    pub id: Option<String>,
    /// Amount to charge.
    pub amount: Amount,
    /// ISO 4217 currency code.
    pub currency: Option<String>,
    /// Description, up to 1024 characters.
    pub description: String,
}

impl Order {
    /// Creates an order with an id and currency, as sales require.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        amount: Amount,
        currency: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            amount,
            currency: Some(currency.into()),
            description: description.into(),
        }
    }

    /// Creates an order without id or currency, as schedules use.
    #[must_use]
    pub fn amount_only(amount: Amount, description: impl Into<String>) -> Self {
        Self {
            id: None,
            amount,
            currency: None,
            description: description.into(),
        }
    }

    /// Checks lengths and the currency code.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] naming the offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(id) = &self.id {
            require(Field::OrderId, id)?;
            max_len(Field::OrderId, id, 255)?;
        }
        if let Some(currency) = &self.currency {
            validate_currency(Field::OrderCurrency, currency)?;
        }
        require(Field::OrderDescription, &self.description)?;
        max_len(Field::OrderDescription, &self.description, 1024)
    }

    /// Validates and additionally requires the id and currency.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] when either is absent.
    pub fn validate_full(&self) -> Result<(), ValidationError> {
        if self.id.is_none() {
            return Err(ValidationError::MissingField(Field::OrderId));
        }
        if self.currency.is_none() {
            return Err(ValidationError::MissingField(Field::OrderCurrency));
        }
        self.validate()
    }
}

pub(crate) fn validate_currency(field: Field, currency: &str) -> Result<(), ValidationError> {
    if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase()) {
        return Ok(());
    }
    Err(ValidationError::InvalidValue {
        field,
        reason: format!("{currency:?} is not an ISO 4217 code"),
    })
}

impl Parameters for Order {
    fn parameters(&self) -> ParameterSet {
        ParameterSet::new()
            .with_opt(Field::OrderId, self.id.as_deref())
            .with(Field::OrderAmount, self.amount)
            .with_opt(Field::OrderCurrency, self.currency.as_deref())
            .with(Field::OrderDescription, self.description.as_str())
    }
}

impl Describe for Order {
    fn describe(&self) -> String {
        Description::new("Order")
            .optional("id", self.id.as_deref())
            .field("amount", self.amount)
            .optional("currency", self.currency.as_deref())
            .field("description", &self.description)
            .finish()
    }
}

/// Payer data for server-to-server sales.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Payer {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Middle name.
    pub middle_name: Option<String>,
    /// Birth date, `YYYY-MM-DD`.
    pub birth_date: Option<String>,
    /// Street address.
    pub address: String,
    /// Second address line.
    pub address2: Option<String>,
    /// ISO 3166-1 alpha-2 country code.
    pub country: String,
    /// State or region.
    pub state: Option<String>,
    /// City.
    pub city: String,
    /// Postal code.
    pub zip: String,
    /// E-mail address.
    pub email: String,
    /// Phone number.
    pub phone: String,
    /// IPv4 or IPv6 address of the payer.
    pub ip: String,
}

impl Payer {
    /// Checks that required fields are present.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] for the first blank field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(Field::PayerFirstName, &self.first_name)?;
        require(Field::PayerLastName, &self.last_name)?;
        require(Field::PayerAddress, &self.address)?;
        require(Field::PayerCountry, &self.country)?;
        if self.country.len() != 2 {
            return Err(ValidationError::InvalidValue {
                field: Field::PayerCountry,
                reason: "must be an ISO 3166-1 alpha-2 code".to_owned(),
            });
        }
        require(Field::PayerCity, &self.city)?;
        require(Field::PayerZip, &self.zip)?;
        require(Field::PayerEmail, &self.email)?;
        require(Field::PayerPhone, &self.phone)?;
        require(Field::PayerIp, &self.ip)
    }
}

impl Parameters for Payer {
    fn parameters(&self) -> ParameterSet {
        ParameterSet::new()
            .with(Field::PayerFirstName, self.first_name.as_str())
            .with(Field::PayerLastName, self.last_name.as_str())
            .with_opt(Field::PayerMiddleName, self.middle_name.as_deref())
            .with_opt(Field::PayerBirthDate, self.birth_date.as_deref())
            .with(Field::PayerAddress, self.address.as_str())
            .with_opt(Field::PayerAddress2, self.address2.as_deref())
            .with(Field::PayerCountry, self.country.as_str())
            .with_opt(Field::PayerState, self.state.as_deref())
            .with(Field::PayerCity, self.city.as_str())
            .with(Field::PayerZip, self.zip.as_str())
            .with(Field::PayerEmail, self.email.as_str())
            .with(Field::PayerPhone, self.phone.as_str())
            .with(Field::PayerIp, self.ip.as_str())
    }
}

impl Describe for Payer {
    fn describe(&self) -> String {
        Description::new("Payer")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .optional("middle_name", self.middle_name.as_deref())
            .optional("birth_date", self.birth_date.as_deref())
            .field("address", &self.address)
            .optional("address2", self.address2.as_deref())
            .field("country", &self.country)
            .optional("state", self.state.as_deref())
            .field("city", &self.city)
            .field("zip", &self.zip)
            .field("email", &self.email)
            .field("phone", &self.phone)
            .field("ip", &self.ip)
            .finish()
    }
}

/// Buyer data shown on the hosted payment page. Every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WebPayer {
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
    /// Street address.
    pub address: Option<String>,
    /// Country code.
    pub country: Option<String>,
    /// State or region.
    pub state: Option<String>,
    /// City.
    pub city: Option<String>,
    /// Postal code.
    pub zip: Option<String>,
    /// E-mail address.
    pub email: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
}

impl Parameters for WebPayer {
    fn parameters(&self) -> ParameterSet {
        ParameterSet::new()
            .with_opt(Field::FirstName, self.first_name.as_deref())
            .with_opt(Field::LastName, self.last_name.as_deref())
            .with_opt(Field::Address, self.address.as_deref())
            .with_opt(Field::Country, self.country.as_deref())
            .with_opt(Field::State, self.state.as_deref())
            .with_opt(Field::City, self.city.as_deref())
            .with_opt(Field::Zip, self.zip.as_deref())
            .with_opt(Field::Email, self.email.as_deref())
            .with_opt(Field::Phone, self.phone.as_deref())
    }
}

/// Payer material that enters a signature but is not sent.
///
/// Capture, refund, status and recurring operations are signed over the payer
/// e-mail and card number of the original sale.
#[derive(Clone, PartialEq, Eq)]
pub struct PayerIdentity {
    /// E-mail used in the original sale.
    pub email: String,
    /// Card number used in the original sale.
    pub card_number: String,
}

impl PayerIdentity {
    /// Creates signing material.
    #[must_use]
    pub fn new(email: impl Into<String>, card_number: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            card_number: card_number.into(),
        }
    }

    /// Checks both values are present.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] naming the offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(Field::PayerEmail, &self.email)?;
        validate_card_number(Field::CardNumber, &self.card_number)
    }
}

impl std::fmt::Debug for PayerIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayerIdentity")
            .field("email", &self.email)
            .field("card_number", &mask_card_number(&self.card_number))
            .finish()
    }
}

impl Parameters for PayerIdentity {
    fn parameters(&self) -> ParameterSet {
        ParameterSet::new()
            .with(Field::PayerEmail, self.email.as_str())
            .with(Field::CardNumber, self.card_number.as_str())
    }
}

impl Describe for PayerIdentity {
    fn describe(&self) -> String {
        Description::new("PayerIdentity")
            .field("email", &self.email)
            .field("card_number", mask_card_number(&self.card_number))
            .finish()
    }
}

/// Reference to the primary transaction of a recurring chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recurring {
    /// Gateway id of the primary transaction.
    pub first_trans_id: String,
    /// Token returned with the primary transaction.
    pub token: String,
}

impl Recurring {
    /// Creates a recurring reference.
    #[must_use]
    pub fn new(first_trans_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            first_trans_id: first_trans_id.into(),
            token: token.into(),
        }
    }

    /// Checks both values are present.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] for a blank value.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(Field::RecurringFirstTransId, &self.first_trans_id)?;
        require(Field::RecurringToken, &self.token)
    }
}

impl Parameters for Recurring {
    fn parameters(&self) -> ParameterSet {
        ParameterSet::new()
            .with(Field::RecurringFirstTransId, self.first_trans_id.as_str())
            .with(Field::RecurringToken, self.token.as_str())
    }
}

impl Describe for Recurring {
    fn describe(&self) -> String {
        Description::new("Recurring")
            .field("first_trans_id", &self.first_trans_id)
            .field("token", &self.token)
            .finish()
    }
}

/// Recurring reference in the web payment form (`rc_id` / `rc_token`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurringWeb {
    /// Gateway id of the primary transaction.
    pub first_trans_id: String,
    /// Token returned with the primary transaction.
    pub token: String,
}

impl RecurringWeb {
    /// Creates a web recurring reference.
    #[must_use]
    pub fn new(first_trans_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            first_trans_id: first_trans_id.into(),
            token: token.into(),
        }
    }
}

impl Parameters for RecurringWeb {
    fn parameters(&self) -> ParameterSet {
        ParameterSet::new()
            .with(Field::RcId, self.first_trans_id.as_str())
            .with(Field::RcToken, self.token.as_str())
    }
}

/// Schedule options for `SCHEDULE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScheduleOptions {
    /// Days before the first payment; `None` pays as soon as possible.
    pub init_delay_days: Option<u32>,
    /// Number of payments; `0` means unlimited and omits `times`.
    pub repeat_times: u32,
}

impl Parameters for ScheduleOptions {
    fn parameters(&self) -> ParameterSet {
        ParameterSet::new()
            .with_opt(Field::InitPeriod, self.init_delay_days)
            .with_opt(Field::Times, (self.repeat_times > 0).then_some(self.repeat_times))
    }
}

/// Recurring options of a web payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WebScheduleOptions {
    /// Days before the first recurring payment.
    pub initial_delay: u32,
    /// Days between recurring payments.
    pub period: u32,
    /// Number of payments; `0` means unlimited and omits `times`.
    pub repeat_times: u32,
}

impl Parameters for WebScheduleOptions {
    fn parameters(&self) -> ParameterSet {
        ParameterSet::new()
            .with(Field::InitialDelay, self.initial_delay)
            .with(Field::Period, self.period)
            .with_opt(Field::Times, (self.repeat_times > 0).then_some(self.repeat_times))
    }
}

const EXT_FIELDS: [Field; 10] = [
    Field::Ext1,
    Field::Ext2,
    Field::Ext3,
    Field::Ext4,
    Field::Ext5,
    Field::Ext6,
    Field::Ext7,
    Field::Ext8,
    Field::Ext9,
    Field::Ext10,
];

/// Optional payment page settings and merchant pass-through values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WebSaleOptions {
    /// Page language, ISO 639-1.
    pub lang: Option<String>,
    /// Where the buyer lands after repeated failures.
    pub error_url: Option<String>,
    /// Payment page id, for accounts with several pages.
    pub form_id: Option<String>,
    /// `ext1` to `ext10`, echoed back in callbacks.
    pub ext: [Option<String>; 10],
}

impl WebSaleOptions {
    /// Sets `ext{index}` (1-based). Out-of-range indexes are ignored.
    #[must_use]
    pub fn with_ext(mut self, index: usize, value: impl Into<String>) -> Self {
        if let Some(slot) = index.checked_sub(1).and_then(|i| self.ext.get_mut(i)) {
            *slot = Some(value.into());
        }
        self
    }
}

impl Parameters for WebSaleOptions {
    fn parameters(&self) -> ParameterSet {
        let base = ParameterSet::new()
            .with_opt(Field::Lang, self.lang.as_deref())
            .with_opt(Field::ErrorUrl, self.error_url.as_deref())
            .with_opt(Field::FormId, self.form_id.as_deref());
        EXT_FIELDS
            .iter()
            .zip(&self.ext)
            .fold(base, |set, (field, value)| set.with_opt(*field, value.as_deref()))
    }
}

/// Payment channel (sub-account).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Channel {
    /// Channel id; `None` uses the account default.
    pub id: Option<String>,
}

impl Channel {
    /// Selects a channel.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()) }
    }
}

impl Parameters for Channel {
    fn parameters(&self) -> ParameterSet {
        ParameterSet::new().with_opt(Field::ChannelId, self.id.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn test_card() -> Card {
        Card::new("4111111111111111", 1, 2030, "123")
    }

    #[test]
    fn test_card_parameters_pad_month() {
        let params = test_card().parameters();
        assert_eq!(params.text(Field::CardExpMonth), Some("01"));
        assert_eq!(params.text(Field::CardExpYear), Some("2030"));
        assert_eq!(params.len(), 4);
    }

    #[rstest]
    #[case(Card::new("4111", 1, 2030, "123"), Field::CardNumber)]
    #[case(Card::new("4111x11111111111", 1, 2030, "123"), Field::CardNumber)]
    #[case(Card::new("4111111111111111", 13, 2030, "123"), Field::CardExpMonth)]
    #[case(Card::new("4111111111111111", 1, 30, "123"), Field::CardExpYear)]
    #[case(Card::new("4111111111111111", 1, 2030, "12"), Field::CardCvv2)]
    fn test_card_validation(#[case] card: Card, #[case] field: Field) {
        assert!(matches!(
            card.validate(),
            Err(ValidationError::InvalidValue { field: f, .. }) if f == field
        ));
    }

    #[test]
    fn test_card_debug_is_masked() {
        let debug = format!("{:?}", test_card());
        assert!(debug.contains("411111******1111"));
        assert!(!debug.contains("123"));
    }

    #[test]
    fn test_order_omits_absent_id_and_currency() {
        let order = Order::amount_only(Amount::try_from(15_u32).unwrap(), "monthly");
        let params = order.parameters();
        assert_eq!(
            params.fields().collect::<Vec<_>>(),
            vec![Field::OrderAmount, Field::OrderDescription]
        );
        assert_eq!(params.text(Field::OrderAmount), Some("15.00"));
        assert!(matches!(
            order.validate_full(),
            Err(ValidationError::MissingField(Field::OrderId))
        ));
    }

    #[test]
    fn test_order_validation() {
        let mut order = Order::new("O1", Amount::ZERO, "uah", "d");
        assert!(order.validate().is_err());
        order.currency = Some("UAH".to_owned());
        assert!(order.validate().is_ok());
        order.description = "x".repeat(1025);
        assert!(order.validate().is_err());
    }

    #[test]
    fn test_schedule_options_omission() {
        let unlimited = ScheduleOptions {
            init_delay_days: None,
            repeat_times: 0,
        };
        assert!(unlimited.parameters().is_empty());

        let limited = ScheduleOptions {
            init_delay_days: Some(2),
            repeat_times: 3,
        };
        let params = limited.parameters();
        assert_eq!(params.get(Field::InitPeriod), Some(&2_u32.into()));
        assert_eq!(params.get(Field::Times), Some(&3_u32.into()));
    }

    #[test]
    fn test_web_schedule_omits_zero_times() {
        let options = WebScheduleOptions {
            initial_delay: 1,
            period: 30,
            repeat_times: 0,
        };
        let params = options.parameters();
        assert!(!params.contains(Field::Times));
        assert!(params.contains(Field::Period));
    }

    #[test]
    fn test_web_sale_options_ext() {
        let options = WebSaleOptions::default()
            .with_ext(1, "first")
            .with_ext(10, "last")
            .with_ext(11, "ignored")
            .with_ext(0, "ignored");
        let params = options.parameters();
        assert_eq!(params.len(), 2);
        assert_eq!(params.text(Field::Ext1), Some("first"));
        assert_eq!(params.text(Field::Ext10), Some("last"));
    }

    #[test]
    fn test_web_payer_uses_web_field_names() {
        let payer = WebPayer {
            last_name: Some("Ernser".to_owned()),
            ..WebPayer::default()
        };
        assert_eq!(payer.parameters().text(Field::LastName), Some("Ernser"));
        assert_eq!(crate::query::encode_query(&payer.parameters()), "lastName=Ernser");
    }

    #[test]
    fn test_payer_identity_describe_masks() {
        let identity = PayerIdentity::new("a@b.c", "4111111111111111");
        assert!(identity.describe().contains("411111******1111"));
        assert!(identity.validate().is_ok());
    }

    #[test]
    fn test_payer_validation() {
        let payer = Payer {
            first_name: "Leo".to_owned(),
            ..Payer::default()
        };
        assert!(matches!(
            payer.validate(),
            Err(ValidationError::MissingField(Field::PayerLastName))
        ));
    }
}
