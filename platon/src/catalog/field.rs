use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

macro_rules! fields {
    (
        $(
            $(#[$vmeta:meta])*
            $variant:ident = $id:literal => $wire:literal,
        )+
    ) => {
        /// A gateway wire field.
        ///
        /// Each member carries a stable integer id ([`Field::id`]) and one
        /// canonical wire name ([`Field::wire_name`]). Request-only,
        /// response-only and shared fields live in the same enumeration so
        /// both directions are checked against one closed catalog.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u16)]
        pub enum Field {
            $(
                $(#[$vmeta])*
                $variant = $id,
            )+
        }

        impl Field {
            /// Every field, in id order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Returns the canonical wire name.
            #[must_use]
            pub const fn wire_name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }

            /// Looks a field up by its exact wire name.
            #[must_use]
            pub fn from_wire_name(name: &str) -> Option<Self> {
                match name {
                    $($wire => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

fields! {
    /// Requested operation, see [`Action`](crate::catalog::Action).
    Action = 1 => "action",
    /// Buyer street address (web payments).
    Address = 2 => "address",
    /// Partial capture / refund amount, `XXXX.XX`.
    Amount = 3 => "amount",
    /// Asynchronous mode flag (`Y`/`N`).
    Async = 4 => "async",
    /// Authorize without capture (`Y`/`N`).
    Auth = 5 => "auth",
    /// Card verification value, 3-4 digits.
    CardCvv2 = 6 => "card_cvv2",
    /// Card expiry month, `XX`.
    CardExpMonth = 7 => "card_exp_month",
    /// Card expiry year, `XXXX`.
    CardExpYear = 8 => "card_exp_year",
    /// Primary account number.
    CardNumber = 9 => "card_number",
    /// Payment channel (sub-account).
    ChannelId = 10 => "channel_id",
    /// Buyer city (web payments).
    City = 11 => "city",
    /// Merchant account key.
    ClientKey = 12 => "client_key",
    /// Buyer country (web payments).
    Country = 13 => "country",
    /// Product currency (web payments).
    Currency = 14 => "currency",
    /// Base64 product data (web payments).
    Data = 15 => "data",
    /// Product name (web payments).
    Description = 16 => "description",
    /// Buyer e-mail (web payments).
    Email = 17 => "email",
    /// Return URL after repeated failures (web payments).
    ErrorUrl = 18 => "error_url",
    Ext1 = 19 => "ext1",
    Ext2 = 20 => "ext2",
    Ext3 = 21 => "ext3",
    Ext4 = 22 => "ext4",
    Ext5 = 23 => "ext5",
    Ext6 = 24 => "ext6",
    Ext7 = 25 => "ext7",
    Ext8 = 26 => "ext8",
    Ext9 = 27 => "ext9",
    Ext10 = 28 => "ext10",
    /// Buyer first name (web payments).
    FirstName = 29 => "first_name",
    /// Payment page identifier (web payments).
    FormId = 30 => "formid",
    /// Request signature for server-to-server operations.
    Hash = 31 => "hash",
    /// Delay in days before the first scheduled payment.
    InitPeriod = 32 => "init_period",
    /// Delay in days before the first web recurring payment.
    InitialDelay = 33 => "initial_delay",
    /// Merchant key (web payments).
    Key = 34 => "key",
    /// Payment page language, ISO 639-1.
    Lang = 35 => "lang",
    /// Buyer last name (web payments).
    LastName = 36 => "lastName",
    /// 3-D Secure merchant data.
    Md = 37 => "MD",
    /// Order id (web payments).
    Order = 38 => "order",
    /// Request token.
    ReqToken = 39 => "req_token",
    /// Transaction amount, `XXXX.XX`.
    OrderAmount = 40 => "order_amount",
    /// Transaction currency, ISO 4217.
    OrderCurrency = 41 => "order_currency",
    /// Transaction description, up to 1024 characters.
    OrderDescription = 42 => "order_description",
    /// Merchant-side order id, up to 255 characters.
    OrderId = 43 => "order_id",
    /// 3-D Secure payer authentication request.
    PaReq = 44 => "paReq",
    PayerAddress = 45 => "payer_address",
    PayerAddress2 = 46 => "payer_address2",
    PayerBirthDate = 47 => "payer_birth_date",
    PayerCity = 48 => "payer_city",
    /// ISO 3166-1 alpha-2 country code.
    PayerCountry = 49 => "payer_country",
    PayerEmail = 50 => "payer_email",
    PayerFirstName = 51 => "payer_first_name",
    PayerIp = 52 => "payer_ip",
    PayerMiddleName = 53 => "payer_middle_name",
    PayerLastName = 54 => "payer_last_name",
    PayerPhone = 55 => "payer_phone",
    PayerState = 56 => "payer_state",
    PayerZip = 57 => "payer_zip",
    /// Web payment method code, see [`PaymentType`](crate::catalog::PaymentType).
    Payment = 58 => "payment",
    /// Wallet payment token (Apple Pay).
    PaymentToken = 59 => "payment_token",
    /// Days between scheduled payments.
    Period = 60 => "period",
    /// Buyer phone (web payments).
    Phone = 61 => "phone",
    /// Recurring id for web one-click payments.
    RcId = 62 => "rc_id",
    /// Recurring token for web one-click payments.
    RcToken = 63 => "rc_token",
    /// Initialize a recurring chain (`Y`/`N`). The misspelling is the gateway's.
    RecurringInit = 64 => "reccuring_init",
    /// Web flag enabling further recurring payments.
    Recurring = 65 => "recurring",
    /// Gateway id of the primary transaction of a recurring chain.
    RecurringFirstTransId = 66 => "recurring_first_trans_id",
    /// Token issued with the primary transaction of a recurring chain.
    RecurringToken = 67 => "recurring_token",
    /// Product selected by default (web payments).
    Selected = 68 => "selected",
    /// Request signature for web payments.
    Sign = 69 => "sign",
    /// Buyer region code (web payments).
    State = 70 => "state",
    /// 3-D Secure return URL inside redirect parameters.
    TermUrl = 71 => "TermUrl",
    /// URL the customer returns to after 3-D Secure.
    TermUrl3ds = 72 => "term_url_3ds",
    /// Number of scheduled payments; absent means unlimited.
    Times = 73 => "times",
    /// Gateway transaction id.
    TransId = 74 => "trans_id",
    /// Success return URL (web payments).
    Url = 75 => "url",
    /// Buyer zip (web payments).
    Zip = 76 => "zip",
    CardToken = 77 => "card_token",
    BankId = 78 => "bank_id",
    PayerId = 79 => "payer_id",
    /// Outcome discriminator of a response.
    Result = 80 => "result",
    /// Transaction status of a response.
    Status = 81 => "status",
    /// Transaction date of a response.
    TransDate = 82 => "trans_date",
    /// Statement descriptor of a response.
    Descriptor = 83 => "descriptor",
    /// Reason attached to a declined response.
    DeclineReason = 84 => "decline_reason",
    /// Target of a redirect response.
    RedirectUrl = 85 => "redirect_url",
    /// Form parameters of a redirect response.
    RedirectParams = 86 => "redirect_params",
    /// HTTP method of a redirect response.
    RedirectMethod = 87 => "redirect_method",
    /// Message of an error response.
    ErrorMessage = 88 => "error_message",
    /// Numeric code of an error response.
    ErrorCode = 89 => "error_code",
    /// Schedule id returned by schedule operations.
    ScheduleId = 90 => "schedule_id",
    /// Transaction history of a details response.
    Transactions = 91 => "transactions",
}

impl Field {
    /// Returns the stable integer id.
    #[must_use]
    pub const fn id(&self) -> u16 {
        *self as u16
    }

    /// Looks a field up ignoring ASCII case.
    ///
    /// Only used for redirect parameters echoed by card issuers, which do not
    /// agree on casing (`PaReq` vs `paReq`). Exact matches win.
    #[must_use]
    pub fn from_wire_name_ignore_case(name: &str) -> Option<Self> {
        Self::from_wire_name(name).or_else(|| {
            Self::ALL
                .iter()
                .copied()
                .find(|field| field.wire_name().eq_ignore_ascii_case(name))
        })
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl Serialize for Field {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.wire_name())
    }
}

impl<'de> Deserialize<'de> for Field {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_wire_name(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown field {s:?}")))
    }
}
