//! Request signatures.
//!
//! The gateway authenticates requests with an MD5 digest over a fixed,
//! operation-dependent sequence of values plus the client password. Each
//! sequence is a [`SignatureRecipe`]; the closed mapping from operation to
//! recipe is a [`SignatureTable`].
//!
//! The default table follows the gateway's published formulas:
//!
//! | key                                   | target | parts |
//! |---------------------------------------|--------|-------|
//! | `SALE`, `TOKEN_SALE`                  | `hash` | `rev(payer_email)`, secret, `rev(card fingerprint)` |
//! | `CAPTURE`, `CREDITVOID`, `GET_TRANS_STATUS`, `GET_TRANS_DETAILS` | `hash` | `rev(payer_email)`, secret, `trans_id`, `rev(card fingerprint)` |
//! | `RECURRING_SALE`, `SCHEDULE`, `DESCHEDULE` | `hash` | `rev(payer_email)`, secret, `recurring_first_trans_id`, `rev(card fingerprint)` |
//! | `GET_TRANS_STATUS_BY_ORDER`           | `hash` | `rev(order_id)`, secret |
//! | `APPLEPAY`                            | `hash` | `rev(payer_email)`, secret, `order_id` |
//! | web `CC`, `CCT`, `C2A`, `C2AT`        | `sign` | `rev(key)`, `rev(payment)`, `rev(data)`, `rev(url)`, `rev(secret)` |
//! | web `RF`                              | `sign` | `rev(key)`, `rev(payment)`, `rev(rc_id)`, `rev(rc_token)`, `rev(url)`, `rev(secret)` |
//!
//! Every recipe upper-cases the concatenation before hashing. The digest is
//! rendered as lowercase hex. Integrations whose account uses a different
//! formula override entries with [`SignatureTable::with_recipe`].

use md5::{Digest, Md5};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::catalog::{Action, Field, PaymentType};
use crate::error::{ConfigError, Error, ValidationError};
use crate::params::{ParamValue, ParameterSet};

/// Where a signature part reads its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// The text stored under this field.
    Field(Field),
    /// First six and last four characters of the card number in this field.
    CardFingerprint(Field),
    /// The client password.
    Secret,
}

/// One element of a signature concatenation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SignaturePart {
    /// Value source.
    pub source: Source,
    /// Reverse the value (by characters) before concatenating.
    pub reversed: bool,
}

impl SignaturePart {
    /// A field value, as stored.
    #[must_use]
    pub const fn field(field: Field) -> Self {
        Self {
            source: Source::Field(field),
            reversed: false,
        }
    }

    /// A card fingerprint of the given card-number field.
    #[must_use]
    pub const fn fingerprint(field: Field) -> Self {
        Self {
            source: Source::CardFingerprint(field),
            reversed: false,
        }
    }

    /// The client password.
    #[must_use]
    pub const fn secret() -> Self {
        Self {
            source: Source::Secret,
            reversed: false,
        }
    }

    /// Marks the part as reversed.
    #[must_use]
    pub const fn reversed(mut self) -> Self {
        self.reversed = true;
        self
    }
}

/// Ordered list of parts digested into a signature field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureRecipe {
    target: Field,
    parts: Vec<SignaturePart>,
    uppercase: bool,
}

impl SignatureRecipe {
    /// Creates a recipe that writes its digest into `target`.
    ///
    /// Recipes upper-case the concatenation by default.
    #[must_use]
    pub fn new(target: Field, parts: impl Into<Vec<SignaturePart>>) -> Self {
        Self {
            target,
            parts: parts.into(),
            uppercase: true,
        }
    }

    /// Sets whether the concatenation is upper-cased before hashing.
    #[must_use]
    pub const fn with_uppercase(mut self, uppercase: bool) -> Self {
        self.uppercase = uppercase;
        self
    }

    /// Field the digest is stored under.
    #[must_use]
    pub const fn target(&self) -> Field {
        self.target
    }

    /// Parts in concatenation order.
    #[must_use]
    pub fn parts(&self) -> &[SignaturePart] {
        &self.parts
    }

    /// Fields the recipe reads, in order.
    pub fn required_fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.parts.iter().filter_map(|part| match part.source {
            Source::Field(field) | Source::CardFingerprint(field) => Some(field),
            Source::Secret => None,
        })
    }

    /// Concatenates the parts. Fails on the first missing field.
    fn canonical(
        &self,
        key: SignatureKey,
        params: &ParameterSet,
        secret: &str,
    ) -> Result<String, ValidationError> {
        let mut out = String::new();
        for part in &self.parts {
            let value = match part.source {
                Source::Secret => secret.to_owned(),
                Source::Field(field) => signed_text(key, params, field)?,
                Source::CardFingerprint(field) => {
                    card_fingerprint(field, &signed_text(key, params, field)?)?
                }
            };
            if part.reversed {
                out.extend(value.chars().rev());
            } else {
                out.push_str(&value);
            }
        }
        if self.uppercase {
            out = out.to_uppercase();
        }
        Ok(out)
    }

    /// Computes the lowercase-hex MD5 digest for `params`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingSignatureField`] when a field read by
    /// the recipe is absent or empty.
    pub fn digest(
        &self,
        key: SignatureKey,
        params: &ParameterSet,
        secret: &str,
    ) -> Result<String, ValidationError> {
        let canonical = self.canonical(key, params, secret)?;
        Ok(hex::encode(Md5::digest(canonical.as_bytes())))
    }
}

fn signed_text(
    key: SignatureKey,
    params: &ParameterSet,
    field: Field,
) -> Result<String, ValidationError> {
    params
        .get(field)
        .and_then(ParamValue::to_wire_text)
        .filter(|text| !text.is_empty())
        .ok_or(ValidationError::MissingSignatureField { key, field })
}

/// First six plus last four characters of a card number.
fn card_fingerprint(field: Field, number: &str) -> Result<String, ValidationError> {
    let chars: Vec<char> = number.chars().collect();
    if chars.len() < 10 {
        return Err(ValidationError::InvalidValue {
            field,
            reason: "card number is too short to fingerprint".to_owned(),
        });
    }
    Ok(chars[..6].iter().chain(&chars[chars.len() - 4..]).collect())
}

/// Selects a recipe: the action of a server-to-server request, or the payment
/// type of a web payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignatureKey {
    /// Server-to-server operation.
    Action(Action),
    /// Web payment method.
    WebPayment(PaymentType),
}

impl SignatureKey {
    /// Reads the key from a parameter set, preferring `action` over `payment`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingSignatureKey`] when neither field is
    /// present and [`ValidationError::InvalidValue`] for an unknown value.
    pub fn of(params: &ParameterSet) -> Result<Self, ValidationError> {
        let invalid = |field: Field, err: crate::catalog::UnknownWireValue| {
            ValidationError::InvalidValue {
                field,
                reason: err.to_string(),
            }
        };
        if let Some(action) = params.text(Field::Action) {
            return action
                .parse()
                .map(Self::Action)
                .map_err(|e| invalid(Field::Action, e));
        }
        if let Some(payment) = params.text(Field::Payment) {
            return payment
                .parse()
                .map(Self::WebPayment)
                .map_err(|e| invalid(Field::Payment, e));
        }
        Err(ValidationError::MissingSignatureKey)
    }
}

impl fmt::Display for SignatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Action(action) => write!(f, "action {action}"),
            Self::WebPayment(payment) => write!(f, "web payment {payment}"),
        }
    }
}

/// Closed mapping from [`SignatureKey`] to [`SignatureRecipe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureTable {
    recipes: BTreeMap<SignatureKey, SignatureRecipe>,
}

static DEFAULT_TABLE: LazyLock<SignatureTable> = LazyLock::new(SignatureTable::gateway_default);

impl Default for SignatureTable {
    fn default() -> Self {
        DEFAULT_TABLE.clone()
    }
}

impl SignatureTable {
    /// A table with no recipes.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            recipes: BTreeMap::new(),
        }
    }

    /// Shared instance of the default table.
    #[must_use]
    pub fn standard() -> &'static Self {
        &DEFAULT_TABLE
    }

    fn gateway_default() -> Self {
        use SignaturePart as P;

        let email = P::field(Field::PayerEmail).reversed();
        let card = P::fingerprint(Field::CardNumber).reversed();
        let secret = P::secret();

        let sale = SignatureRecipe::new(Field::Hash, [email, secret, card]);
        let by_trans = SignatureRecipe::new(
            Field::Hash,
            [email, secret, P::field(Field::TransId), card],
        );
        let by_first_trans = SignatureRecipe::new(
            Field::Hash,
            [email, secret, P::field(Field::RecurringFirstTransId), card],
        );
        let by_order = SignatureRecipe::new(
            Field::Hash,
            [P::field(Field::OrderId).reversed(), secret],
        );
        let apple_pay = SignatureRecipe::new(
            Field::Hash,
            [email, secret, P::field(Field::OrderId)],
        );
        let web = SignatureRecipe::new(
            Field::Sign,
            [
                P::field(Field::Key).reversed(),
                P::field(Field::Payment).reversed(),
                P::field(Field::Data).reversed(),
                P::field(Field::Url).reversed(),
                secret.reversed(),
            ],
        );
        let web_one_click = SignatureRecipe::new(
            Field::Sign,
            [
                P::field(Field::Key).reversed(),
                P::field(Field::Payment).reversed(),
                P::field(Field::RcId).reversed(),
                P::field(Field::RcToken).reversed(),
                P::field(Field::Url).reversed(),
                secret.reversed(),
            ],
        );

        let mut table = Self::empty();
        for action in [Action::Sale, Action::TokenSale] {
            table = table.with_recipe(SignatureKey::Action(action), sale.clone());
        }
        for action in [
            Action::Capture,
            Action::CreditVoid,
            Action::GetTransStatus,
            Action::GetTransDetails,
        ] {
            table = table.with_recipe(SignatureKey::Action(action), by_trans.clone());
        }
        for action in [Action::RecurringSale, Action::Schedule, Action::Deschedule] {
            table = table.with_recipe(SignatureKey::Action(action), by_first_trans.clone());
        }
        for payment in [
            PaymentType::Cc,
            PaymentType::Cct,
            PaymentType::C2a,
            PaymentType::C2at,
        ] {
            table = table.with_recipe(SignatureKey::WebPayment(payment), web.clone());
        }
        table
            .with_recipe(SignatureKey::Action(Action::GetTransStatusByOrder), by_order)
            .with_recipe(SignatureKey::Action(Action::ApplePay), apple_pay)
            .with_recipe(SignatureKey::WebPayment(PaymentType::Rf), web_one_click)
    }

    /// Adds or replaces the recipe for `key`.
    #[must_use]
    pub fn with_recipe(mut self, key: SignatureKey, recipe: SignatureRecipe) -> Self {
        self.recipes.insert(key, recipe);
        self
    }

    /// Returns the recipe for `key`.
    #[must_use]
    pub fn recipe(&self, key: SignatureKey) -> Option<&SignatureRecipe> {
        self.recipes.get(&key)
    }

    /// Computes the signature for `params`, selecting the recipe from the
    /// set's `action` or `payment` field.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Configuration`] for an empty secret and with
    /// [`Error::Validation`] when the key is missing, has no recipe, or a
    /// field read by the recipe is absent.
    pub fn compute(&self, params: &ParameterSet, secret: &str) -> Result<String, Error> {
        let (_, digest) = self.resolve(params, secret)?;
        Ok(digest)
    }

    fn resolve(&self, params: &ParameterSet, secret: &str) -> Result<(Field, String), Error> {
        if secret.is_empty() {
            return Err(ConfigError::Empty(crate::config::CLIENT_PASS).into());
        }
        let key = SignatureKey::of(params)?;
        let recipe = self
            .recipe(key)
            .ok_or(ValidationError::NoSignatureRecipe(key))?;
        let digest = recipe.digest(key, params, secret)?;
        Ok((recipe.target(), digest))
    }

    /// Signs `params` in place.
    ///
    /// # Errors
    ///
    /// See [`SignatureTable::compute`]. On error `params` is left unchanged.
    pub fn sign(&self, params: &mut ParameterSet, secret: &str) -> Result<(), Error> {
        self.sign_with(params, &ParameterSet::new(), secret)
    }

    /// Signs `params` in place, also reading values from `signing_only`.
    ///
    /// `signing_only` holds material the recipe needs but that is not sent,
    /// such as the payer e-mail of a capture. Its entries never end up in
    /// `params`.
    ///
    /// # Errors
    ///
    /// See [`SignatureTable::compute`]. On error `params` is left unchanged.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "platon.sign", skip_all, err, fields(fields = params.len()))
    )]
    pub fn sign_with(
        &self,
        params: &mut ParameterSet,
        signing_only: &ParameterSet,
        secret: &str,
    ) -> Result<(), Error> {
        let material = params.merged(signing_only);
        let (target, digest) = self.resolve(&material, secret)?;
        params.insert(target, digest);
        Ok(())
    }
}

/// Computes a signature with the default table.
///
/// # Errors
///
/// See [`SignatureTable::compute`].
pub fn compute_signature(params: &ParameterSet, secret: &str) -> Result<String, Error> {
    SignatureTable::standard().compute(params, secret)
}

/// Signs `params` in place with the default table.
///
/// # Errors
///
/// See [`SignatureTable::compute`].
pub fn sign(params: &mut ParameterSet, secret: &str) -> Result<(), Error> {
    SignatureTable::standard().sign(params, secret)
}
