//! Closed catalog of wire fields and controlled vocabularies.
//!
//! Every name the gateway sends or receives is a member of one of the
//! enumerations in this module. Wire strings are a derived view: equality and
//! identity are always by enum member, never by string.
//!
//! - [`Field`] - every request and response field, with a stable integer id
//! - [`Action`] - the operation requested of the gateway
//! - [`ResultCode`] - top-level outcome of a response
//! - [`Status`] - finer-grained transaction state
//! - [`HttpMethod`] - HTTP verbs used for redirects and dispatch
//! - [`YesNo`] - `Y`/`N` option flags
//! - [`PaymentType`] - web payment method codes
//! - [`TransactionType`] - transaction kinds reported by detail queries

/// Error returned when a wire string does not name any member of a vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {vocabulary} value: {value:?}")]
pub struct UnknownWireValue {
    /// Name of the vocabulary that was searched.
    pub vocabulary: &'static str,
    /// The string that failed to match.
    pub value: String,
}

/// Declares a closed vocabulary whose members map one-to-one onto wire strings.
///
/// Generates `ALL`, `as_str`, `Display`, `FromStr` and serde impls that go
/// through the wire string.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident as $label:literal {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $wire:literal,
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $name {
            /// Every member, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Returns the canonical wire string.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::catalog::UnknownWireValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    _ => Err($crate::catalog::UnknownWireValue {
                        vocabulary: $label,
                        value: s.to_owned(),
                    }),
                }
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let s = <::std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
                s.parse().map_err(::serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use wire_enum;

mod field;
mod vocab;

pub use field::Field;
pub use vocab::{Action, HttpMethod, PaymentType, ResultCode, Status, TransactionType, YesNo};
