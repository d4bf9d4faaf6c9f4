use super::{Field, wire_enum};
use crate::params::{ParameterSet, Parameters};

wire_enum! {
    /// Operation requested of the gateway.
    ///
    /// `Chargeback`, `SecondChargeback` and `SecondPresentment` are created by
    /// the gateway itself and only ever arrive in callbacks.
    pub enum Action as "action" {
        /// Creates a CAPTURE transaction.
        Capture => "CAPTURE",
        /// A CHARGEBACK was created by the gateway.
        Chargeback => "CHARGEBACK",
        /// Creates a REVERSAL or REFUND transaction.
        CreditVoid => "CREDITVOID",
        /// Disables a recurring schedule.
        Deschedule => "DESCHEDULE",
        /// Fetches order details.
        GetTransDetails => "GET_TRANS_DETAILS",
        /// Fetches the status of a transaction.
        GetTransStatus => "GET_TRANS_STATUS",
        /// Charges again using a previous transaction's card data.
        RecurringSale => "RECURRING_SALE",
        /// Creates a SALE (or AUTH) transaction.
        Sale => "SALE",
        /// Creates a SALE from a stored card token.
        TokenSale => "TOKEN_SALE",
        /// Creates a recurring schedule.
        Schedule => "SCHEDULE",
        /// A SECOND_CHARGEBACK was created by the gateway.
        SecondChargeback => "SECOND_CHARGEBACK",
        /// A SECOND_PRESENTMENT was created by the gateway.
        SecondPresentment => "SECOND_PRESENTMENT",
        /// Creates a SALE from an Apple Pay token.
        ApplePay => "APPLEPAY",
        /// Fetches the status of a transaction by merchant order id.
        GetTransStatusByOrder => "GET_TRANS_STATUS_BY_ORDER",
    }
}

impl Action {
    /// HTTP method used to send this action. Status queries are `GET`,
    /// everything that changes state is `POST`.
    #[must_use]
    pub const fn http_method(&self) -> HttpMethod {
        match self {
            Self::GetTransStatus | Self::GetTransStatusByOrder | Self::GetTransDetails => {
                HttpMethod::Get
            }
            _ => HttpMethod::Post,
        }
    }

    /// Returns `false` for actions that only the gateway can create.
    #[must_use]
    pub const fn is_client_initiated(&self) -> bool {
        !matches!(
            self,
            Self::Chargeback | Self::SecondChargeback | Self::SecondPresentment
        )
    }

    /// Returns `true` when the gateway expects `term_url_3ds` with this action.
    #[must_use]
    pub const fn needs_term_url(&self) -> bool {
        matches!(self, Self::Sale | Self::TokenSale | Self::ApplePay)
    }
}

impl Parameters for Action {
    fn parameters(&self) -> ParameterSet {
        ParameterSet::new().with(Field::Action, self.as_str())
    }
}

wire_enum! {
    /// Top-level outcome the gateway attaches to every response.
    pub enum ResultCode as "result" {
        /// Accepted, will complete later.
        Accepted => "ACCEPTED",
        /// The action was unsuccessful.
        Declined => "DECLINED",
        /// The request was not validated.
        Error => "ERROR",
        /// The payer must complete an out-of-band challenge.
        Redirect => "REDIRECT",
        /// The action completed.
        Success => "SUCCESS",
    }
}

wire_enum! {
    /// Actual state of a transaction on the gateway.
    pub enum Status as "status" {
        /// Chargeback was made.
        Chargeback => "CHARGEBACK",
        /// Unsuccessful transaction.
        Declined => "DECLINED",
        /// Awaiting CAPTURE.
        Pending => "PENDING",
        /// Refund was made.
        Refund => "REFUND",
        /// Reversal was made.
        Reversal => "REVERSAL",
        /// Second chargeback was made.
        SecondChargeback => "SECOND_CHARGEBACK",
        /// Second presentment was made.
        SecondPresentment => "SECOND_PRESENTMENT",
        /// Awaiting 3-D Secure validation.
        Secure3d => "3DS",
        /// Successful transaction.
        Settled => "SETTLED",
        /// Schedule disabled.
        Disabled => "DISABLED",
        /// Schedule enabled.
        Enabled => "ENABLED",
    }
}

wire_enum! {
    /// HTTP verbs the gateway may ask a redirect to be replayed with.
    pub enum HttpMethod as "HTTP method" {
        Options => "OPTIONS",
        Get => "GET",
        Head => "HEAD",
        Post => "POST",
        Put => "PUT",
        Patch => "PATCH",
        Delete => "DELETE",
        Trace => "TRACE",
        Connect => "CONNECT",
    }
}

wire_enum! {
    /// `Y`/`N` switch used by option fields such as `auth` and `async`.
    #[derive(Default)]
    pub enum YesNo as "option" {
        /// `N`
        #[default]
        No => "N",
        /// `Y`
        Yes => "Y",
    }
}

impl From<bool> for YesNo {
    fn from(value: bool) -> Self {
        if value { Self::Yes } else { Self::No }
    }
}

wire_enum! {
    /// Web payment method code.
    pub enum PaymentType as "payment type" {
        /// Payment card.
        Cc => "CC",
        /// One-click payment on a stored recurring id.
        Rf => "RF",
        /// Card payment with tokenization.
        Cct => "CCT",
        /// Card-to-account transfer.
        C2a => "C2A",
        /// Card-to-account transfer with tokenization.
        C2at => "C2AT",
    }
}

impl Parameters for PaymentType {
    fn parameters(&self) -> ParameterSet {
        ParameterSet::new().with(Field::Payment, self.as_str())
    }
}

wire_enum! {
    /// Transaction kind reported by detail queries.
    pub enum TransactionType as "transaction type" {
        /// Authorization without capture (first DMS stage).
        Auth => "AUTH",
        /// Capture of an authorization (second DMS stage).
        Capture => "CAPTURE",
        /// Dispute under consideration.
        Chargeback => "CHARGEBACK",
        /// Payer is filling in the payment page.
        Initialize => "INIT",
        /// Refund.
        Refund => "REFUND",
        /// Hold released back to the payer.
        Reversal => "REVERSAL",
        /// Immediate payment.
        Sale => "SALE",
        /// Arbitration stage of a dispute.
        SecondChargeback => "SECOND CHARGEBACK",
        /// Second presentment of a dispute.
        SecondPresentment => "SECOND PRESENTMENT",
        /// 3-D Secure verification.
        Secure3d => "3DS",
    }
}
