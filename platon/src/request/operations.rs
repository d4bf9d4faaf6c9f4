//! One model per server-to-server action.

use super::Operation;
use super::models::{
    Card, Channel, Order, Payer, PayerIdentity, Recurring, ScheduleOptions, require,
    validate_card_number,
};
use crate::amount::Amount;
use crate::catalog::{Action, Field, YesNo};
use crate::describe::{Describe, Description, mask_card_number};
use crate::error::ValidationError;
use crate::params::{ParameterSet, Parameters};

/// `Y` flags are sent, `N` flags are omitted.
fn flag(set: ParameterSet, field: Field, on: bool) -> ParameterSet {
    set.with_opt(field, on.then_some(YesNo::Yes))
}

/// `SALE`: charges a card, or authorizes it when `auth` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleRequest {
    /// Order being paid.
    pub order: Order,
    /// Card data.
    pub card: Card,
    /// Payer data.
    pub payer: Payer,
    /// Sub-account.
    pub channel: Channel,
    /// Authorize only; a later [`CaptureRequest`] settles the funds.
    pub auth: bool,
    /// Answer immediately with `ACCEPTED` and report the outcome by callback.
    pub asynchronous: bool,
    /// Make this the primary transaction of a recurring chain.
    pub recurring_init: bool,
    /// Ask the gateway for a card token.
    pub req_token: bool,
}

impl SaleRequest {
    /// Creates a one-step sale.
    #[must_use]
    pub fn new(order: Order, card: Card, payer: Payer) -> Self {
        Self {
            order,
            card,
            payer,
            channel: Channel::default(),
            auth: false,
            asynchronous: false,
            recurring_init: false,
            req_token: false,
        }
    }

    /// Authorize only.
    #[must_use]
    pub const fn authorize_only(mut self) -> Self {
        self.auth = true;
        self
    }

    /// Starts a recurring chain.
    #[must_use]
    pub const fn recurring_init(mut self) -> Self {
        self.recurring_init = true;
        self
    }
}

impl Parameters for SaleRequest {
    fn parameters(&self) -> ParameterSet {
        let set = ParameterSet::from_parts(&[&self.channel, &self.order, &self.card, &self.payer]);
        let set = flag(set, Field::Auth, self.auth);
        let set = flag(set, Field::Async, self.asynchronous);
        let set = flag(set, Field::RecurringInit, self.recurring_init);
        flag(set, Field::ReqToken, self.req_token)
    }
}

impl Operation for SaleRequest {
    fn action(&self) -> Action {
        Action::Sale
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.order.validate_full()?;
        self.card.validate()?;
        self.payer.validate()
    }
}

impl Describe for SaleRequest {
    fn describe(&self) -> String {
        Description::new("SaleRequest")
            .field("order", self.order.describe())
            .field("card", self.card.describe())
            .field("payer", self.payer.describe())
            .optional("channel_id", self.channel.id.as_deref())
            .field("auth", YesNo::from(self.auth))
            .field("async", YesNo::from(self.asynchronous))
            .field("recurring_init", YesNo::from(self.recurring_init))
            .field("req_token", YesNo::from(self.req_token))
            .finish()
    }
}

/// `TOKEN_SALE`: charges a card stored behind a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSaleRequest {
    /// Order being paid.
    pub order: Order,
    /// Token returned by an earlier sale with `req_token`.
    pub card_token: String,
    /// Payer data.
    pub payer: Payer,
    /// Card number behind the token; signed, never sent.
    pub card_number: String,
    /// Sub-account.
    pub channel: Channel,
    /// Authorize only.
    pub auth: bool,
    /// Answer immediately and report by callback.
    pub asynchronous: bool,
}

impl TokenSaleRequest {
    /// Creates a token sale.
    #[must_use]
    pub fn new(
        order: Order,
        card_token: impl Into<String>,
        card_number: impl Into<String>,
        payer: Payer,
    ) -> Self {
        Self {
            order,
            card_token: card_token.into(),
            payer,
            card_number: card_number.into(),
            channel: Channel::default(),
            auth: false,
            asynchronous: false,
        }
    }
}

impl Parameters for TokenSaleRequest {
    fn parameters(&self) -> ParameterSet {
        let set = ParameterSet::from_parts(&[&self.channel, &self.order])
            .with(Field::CardToken, self.card_token.as_str())
            .merged(&self.payer.parameters());
        let set = flag(set, Field::Auth, self.auth);
        flag(set, Field::Async, self.asynchronous)
    }
}

impl Operation for TokenSaleRequest {
    fn action(&self) -> Action {
        Action::TokenSale
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.order.validate_full()?;
        require(Field::CardToken, &self.card_token)?;
        validate_card_number(Field::CardNumber, &self.card_number)?;
        self.payer.validate()
    }

    fn signing_parameters(&self) -> ParameterSet {
        ParameterSet::new().with(Field::CardNumber, self.card_number.as_str())
    }
}

impl Describe for TokenSaleRequest {
    fn describe(&self) -> String {
        Description::new("TokenSaleRequest")
            .field("order", self.order.describe())
            .field("card_token", &self.card_token)
            .field("card_number", mask_card_number(&self.card_number))
            .field("payer", self.payer.describe())
            .finish()
    }
}

macro_rules! by_transaction {
    ($(#[$meta:meta])* $name:ident => $action:expr, partial: [$($partial:ident)?]) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            /// Gateway id of the transaction.
            pub trans_id: String,
            /// Payer of the original sale; signed, never sent.
            pub identity: PayerIdentity,
            $(
                #[doc = "Partial amount; the full amount when `None`."]
                pub $partial: Option<Amount>,
            )?
        }

        impl $name {
            /// Creates the request.
            #[must_use]
            pub fn new(trans_id: impl Into<String>, identity: PayerIdentity) -> Self {
                Self {
                    trans_id: trans_id.into(),
                    identity,
                    $($partial: None,)?
                }
            }
        }

        impl Operation for $name {
            fn action(&self) -> Action {
                $action
            }

            fn validate(&self) -> Result<(), ValidationError> {
                require(Field::TransId, &self.trans_id)?;
                self.identity.validate()
            }

            fn signing_parameters(&self) -> ParameterSet {
                self.identity.parameters()
            }
        }
    };
}

by_transaction! {
    /// `CAPTURE`: settles an authorization, fully or partially.
    CaptureRequest => Action::Capture, partial: [amount]
}

by_transaction! {
    /// `CREDITVOID`: reverses or refunds a sale, fully or partially.
    CreditVoidRequest => Action::CreditVoid, partial: [amount]
}

by_transaction! {
    /// `GET_TRANS_STATUS`: fetches the status of a transaction.
    TransStatusRequest => Action::GetTransStatus, partial: []
}

by_transaction! {
    /// `GET_TRANS_DETAILS`: fetches the transaction history of an order.
    TransDetailsRequest => Action::GetTransDetails, partial: []
}

impl CaptureRequest {
    /// Captures only `amount`.
    #[must_use]
    pub const fn with_amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }
}

impl CreditVoidRequest {
    /// Refunds only `amount`.
    #[must_use]
    pub const fn with_amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }
}

impl Parameters for CaptureRequest {
    fn parameters(&self) -> ParameterSet {
        ParameterSet::new()
            .with(Field::TransId, self.trans_id.as_str())
            .with_opt(Field::Amount, self.amount)
    }
}

impl Parameters for CreditVoidRequest {
    fn parameters(&self) -> ParameterSet {
        ParameterSet::new()
            .with(Field::TransId, self.trans_id.as_str())
            .with_opt(Field::Amount, self.amount)
    }
}

impl Parameters for TransStatusRequest {
    fn parameters(&self) -> ParameterSet {
        ParameterSet::new().with(Field::TransId, self.trans_id.as_str())
    }
}

impl Parameters for TransDetailsRequest {
    fn parameters(&self) -> ParameterSet {
        ParameterSet::new().with(Field::TransId, self.trans_id.as_str())
    }
}

impl Describe for CaptureRequest {
    fn describe(&self) -> String {
        Description::new("CaptureRequest")
            .field("trans_id", &self.trans_id)
            .optional("amount", self.amount)
            .field("identity", self.identity.describe())
            .finish()
    }
}

impl Describe for CreditVoidRequest {
    fn describe(&self) -> String {
        Description::new("CreditVoidRequest")
            .field("trans_id", &self.trans_id)
            .optional("amount", self.amount)
            .field("identity", self.identity.describe())
            .finish()
    }
}

/// `GET_TRANS_STATUS_BY_ORDER`: fetches the status of a merchant order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransStatusByOrderRequest {
    /// Merchant order id.
    pub order_id: String,
}

impl TransStatusByOrderRequest {
    /// Creates the request.
    #[must_use]
    pub fn new(order_id: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
        }
    }
}

impl Parameters for TransStatusByOrderRequest {
    fn parameters(&self) -> ParameterSet {
        ParameterSet::new().with(Field::OrderId, self.order_id.as_str())
    }
}

impl Operation for TransStatusByOrderRequest {
    fn action(&self) -> Action {
        Action::GetTransStatusByOrder
    }

    fn validate(&self) -> Result<(), ValidationError> {
        require(Field::OrderId, &self.order_id)
    }
}

/// `RECURRING_SALE`: charges again using the card of a primary transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurringSaleRequest {
    /// Order being paid.
    pub order: Order,
    /// Primary transaction reference.
    pub recurring: Recurring,
    /// Payer of the primary transaction; signed, never sent.
    pub identity: PayerIdentity,
    /// Sub-account.
    pub channel: Channel,
    /// Authorize only.
    pub auth: bool,
    /// Answer immediately and report by callback.
    pub asynchronous: bool,
}

impl RecurringSaleRequest {
    /// Creates a recurring sale.
    #[must_use]
    pub fn new(order: Order, recurring: Recurring, identity: PayerIdentity) -> Self {
        Self {
            order,
            recurring,
            identity,
            channel: Channel::default(),
            auth: false,
            asynchronous: false,
        }
    }
}

impl Parameters for RecurringSaleRequest {
    fn parameters(&self) -> ParameterSet {
        let set = ParameterSet::from_parts(&[&self.channel, &self.order, &self.recurring]);
        let set = flag(set, Field::Auth, self.auth);
        flag(set, Field::Async, self.asynchronous)
    }
}

impl Operation for RecurringSaleRequest {
    fn action(&self) -> Action {
        Action::RecurringSale
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.order.validate_full()?;
        self.recurring.validate()?;
        self.identity.validate()
    }

    fn signing_parameters(&self) -> ParameterSet {
        self.identity.parameters()
    }
}

impl Describe for RecurringSaleRequest {
    fn describe(&self) -> String {
        Description::new("RecurringSaleRequest")
            .field("order", self.order.describe())
            .field("recurring", self.recurring.describe())
            .field("identity", self.identity.describe())
            .finish()
    }
}

/// `SCHEDULE`: charges a recurring chain periodically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRequest {
    /// Amount and description of each payment. Id and currency are not sent.
    pub order: Order,
    /// Primary transaction reference.
    pub recurring: Recurring,
    /// Days between payments.
    pub period: u32,
    /// First-payment delay and number of payments.
    pub options: ScheduleOptions,
    /// Payer of the primary transaction; signed, never sent.
    pub identity: PayerIdentity,
}

impl ScheduleRequest {
    /// Creates an unlimited schedule starting as soon as possible.
    #[must_use]
    pub fn new(order: Order, recurring: Recurring, period: u32, identity: PayerIdentity) -> Self {
        Self {
            order,
            recurring,
            period,
            options: ScheduleOptions::default(),
            identity,
        }
    }

    /// Sets the first-payment delay and number of payments.
    #[must_use]
    pub const fn with_options(mut self, options: ScheduleOptions) -> Self {
        self.options = options;
        self
    }
}

impl Parameters for ScheduleRequest {
    fn parameters(&self) -> ParameterSet {
        ParameterSet::new()
            .with(Field::OrderAmount, self.order.amount)
            .with(Field::OrderDescription, self.order.description.as_str())
            .merged(&self.recurring.parameters())
            .with(Field::Period, self.period)
            .merged(&self.options.parameters())
    }
}

impl Operation for ScheduleRequest {
    fn action(&self) -> Action {
        Action::Schedule
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.order.validate()?;
        self.recurring.validate()?;
        if self.period == 0 {
            return Err(ValidationError::InvalidValue {
                field: Field::Period,
                reason: "period must be at least one day".to_owned(),
            });
        }
        self.identity.validate()
    }

    fn signing_parameters(&self) -> ParameterSet {
        self.identity.parameters()
    }
}

impl Describe for ScheduleRequest {
    fn describe(&self) -> String {
        Description::new("ScheduleRequest")
            .field("order", self.order.describe())
            .field("recurring", self.recurring.describe())
            .field("period", self.period)
            .optional("init_period", self.options.init_delay_days)
            .field("times", self.options.repeat_times)
            .finish()
    }
}

/// `DESCHEDULE`: disables a schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescheduleRequest {
    /// Primary transaction reference.
    pub recurring: Recurring,
    /// Id returned by the `SCHEDULE` response.
    pub schedule_id: String,
    /// Payer of the primary transaction; signed, never sent.
    pub identity: PayerIdentity,
}

impl DescheduleRequest {
    /// Creates the request.
    #[must_use]
    pub fn new(recurring: Recurring, schedule_id: impl Into<String>, identity: PayerIdentity) -> Self {
        Self {
            recurring,
            schedule_id: schedule_id.into(),
            identity,
        }
    }
}

impl Parameters for DescheduleRequest {
    fn parameters(&self) -> ParameterSet {
        self.recurring
            .parameters()
            .with(Field::ScheduleId, self.schedule_id.as_str())
    }
}

impl Operation for DescheduleRequest {
    fn action(&self) -> Action {
        Action::Deschedule
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.recurring.validate()?;
        require(Field::ScheduleId, &self.schedule_id)?;
        self.identity.validate()
    }

    fn signing_parameters(&self) -> ParameterSet {
        self.identity.parameters()
    }
}

/// `APPLEPAY`: charges an Apple Pay payment token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplePaySaleRequest {
    /// Order being paid; id and currency are required.
    pub order: Order,
    /// Payment data produced by `PassKit`, as a JSON string.
    pub payment_token: String,
    /// Payer e-mail.
    pub payer_email: String,
    /// Payer IP address.
    pub payer_ip: Option<String>,
    /// Sub-account.
    pub channel: Channel,
}

impl ApplePaySaleRequest {
    /// Creates the request.
    #[must_use]
    pub fn new(order: Order, payment_token: impl Into<String>, payer_email: impl Into<String>) -> Self {
        Self {
            order,
            payment_token: payment_token.into(),
            payer_email: payer_email.into(),
            payer_ip: None,
            channel: Channel::default(),
        }
    }
}

impl Parameters for ApplePaySaleRequest {
    fn parameters(&self) -> ParameterSet {
        ParameterSet::from_parts(&[&self.channel, &self.order])
            .with(Field::PayerEmail, self.payer_email.as_str())
            .with_opt(Field::PayerIp, self.payer_ip.as_deref())
            .with(Field::PaymentToken, self.payment_token.as_str())
    }
}

impl Operation for ApplePaySaleRequest {
    fn action(&self) -> Action {
        Action::ApplePay
    }

    fn validate(&self) -> Result<(), ValidationError> {
        self.order.validate_full()?;
        require(Field::PaymentToken, &self.payment_token)?;
        require(Field::PayerEmail, &self.payer_email)
    }
}
