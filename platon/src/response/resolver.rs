//! Discriminator-driven decoding of response bytes.

use serde::Deserialize;
use serde_json::{Map, Value};
#[cfg(feature = "telemetry")]
use tracing::instrument;
use url::Url;

use super::{
    DeclinedResponse, Presence, RedirectResponse, Resolution, ResponseVariant, SaleReference,
    StatusResponse, SuccessCompanions, SuccessResponse, TransactionRecord, Unexpected,
};
use crate::amount::Amount;
use crate::catalog::{Action, Field, HttpMethod, ResultCode, Status};
use crate::error::{GatewayError, ParseError};
use crate::params::ParameterSet;

/// Fields whose presence identifies a variant. Each variant owns some of
/// them; the others are reported as unexpected.
const MARKERS: [Field; 6] = [
    Field::ErrorMessage,
    Field::DeclineReason,
    Field::RedirectUrl,
    Field::RedirectParams,
    Field::RedirectMethod,
    Field::RecurringToken,
];

/// Resolves `bytes` produced by a request for `action`.
///
/// # Errors
///
/// Returns [`ParseError`] when the bytes are not a JSON object, `result` is
/// missing or unknown, or a field required by the selected variant is absent
/// or malformed.
pub fn resolve(bytes: &[u8], action: Action) -> Result<ResponseVariant, ParseError> {
    resolve_detailed(bytes, action).map(|resolution| resolution.variant)
}

/// Like [`resolve`], also returning the fields that were ignored.
///
/// # Errors
///
/// See [`resolve`].
#[cfg_attr(
    feature = "telemetry",
    instrument(name = "platon.resolve", skip_all, err, fields(action = %action))
)]
pub fn resolve_detailed(bytes: &[u8], action: Action) -> Result<Resolution, ParseError> {
    let value: Value = serde_json::from_slice(bytes)?;
    let Value::Object(object) = value else {
        return Err(ParseError::NotAnObject);
    };
    let mut reader = Reader {
        object: &object,
        unexpected: Vec::new(),
    };

    let result: ResultCode = reader.required(Field::Result)?.parse()?;
    if let Some(received) = reader.text(Field::Action)? {
        let received: Action = received.parse()?;
        if received != action {
            reader.unexpected.push(Unexpected::ActionMismatch {
                expected: action,
                received,
            });
        }
    }

    let variant = match result {
        ResultCode::Error => reader.error()?,
        ResultCode::Declined => reader.declined(action)?,
        ResultCode::Redirect => reader.redirect(action)?,
        ResultCode::Success | ResultCode::Accepted => reader.success(action, result)?,
    };

    #[cfg(feature = "telemetry")]
    {
        if reader.unexpected.is_empty() {
            tracing::debug!(result = %result, "Resolved gateway response");
        } else {
            tracing::warn!(
                result = %result,
                unexpected = ?reader.unexpected,
                "Resolved gateway response with unexpected fields"
            );
        }
    }

    Ok(Resolution {
        variant,
        unexpected: reader.unexpected,
    })
}

struct Reader<'a> {
    object: &'a Map<String, Value>,
    unexpected: Vec<Unexpected>,
}

impl<'a> Reader<'a> {
    fn raw(&self, field: Field) -> Option<&'a Value> {
        self.object.get(field.wire_name())
    }

    fn is_present(&self, field: Field) -> bool {
        match self.raw(field) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::Object(map)) => !map.is_empty(),
            Some(_) => true,
        }
    }

    /// Strings and numbers as text; empty strings and nulls as `None`.
    fn text(&self, field: Field) -> Result<Option<String>, ParseError> {
        match self.raw(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) if s.is_empty() => Ok(None),
            Some(value) => scalar_text(value).map(Some).ok_or(ParseError::InvalidField {
                field,
                reason: "expected a string or number".to_owned(),
            }),
        }
    }

    fn required(&self, field: Field) -> Result<String, ParseError> {
        self.text(field)?.ok_or(ParseError::MissingField(field))
    }

    fn status(&self) -> Result<Status, ParseError> {
        Ok(self.required(Field::Status)?.parse()?)
    }

    fn report_foreign(&mut self, owned: &[Field]) {
        for field in MARKERS {
            if !owned.contains(&field) && self.is_present(field) {
                self.unexpected.push(Unexpected::Field(field));
            }
        }
    }

    fn sale(&self) -> Result<SaleReference, ParseError> {
        let amount = self
            .text(Field::Amount)?
            .map(|s| s.parse::<Amount>())
            .transpose()
            .map_err(|err| ParseError::InvalidField {
                field: Field::Amount,
                reason: err.to_string(),
            })?;
        Ok(SaleReference {
            order_id: self.text(Field::OrderId)?,
            trans_id: self.text(Field::TransId)?,
            trans_date: self.text(Field::TransDate)?,
            descriptor: self.text(Field::Descriptor)?,
            amount,
            currency: self.text(Field::Currency)?,
            schedule_id: self.text(Field::ScheduleId)?,
            transactions: self.transactions()?,
        })
    }

    fn transactions(&self) -> Result<Vec<TransactionRecord>, ParseError> {
        let invalid = |reason: String| ParseError::InvalidField {
            field: Field::Transactions,
            reason,
        };
        match self.raw(Field::Transactions) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value @ Value::Array(_)) => {
                Vec::<TransactionRecord>::deserialize(value).map_err(|err| invalid(err.to_string()))
            }
            Some(_) => Err(invalid("expected an array".to_owned())),
        }
    }

    fn error(&mut self) -> Result<ResponseVariant, ParseError> {
        let message = self.required(Field::ErrorMessage)?;
        let code = match self.raw(Field::ErrorCode) {
            Some(Value::Number(n)) => n.as_i64().unwrap_or_default(),
            Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
            _ => 0,
        };
        self.report_foreign(&[Field::ErrorMessage]);
        Ok(ResponseVariant::Error(GatewayError::from_server(message, code)))
    }

    fn declined(&mut self, action: Action) -> Result<ResponseVariant, ParseError> {
        let response = DeclinedResponse {
            action,
            sale: self.sale()?,
            status: self.status()?,
            decline_reason: self.required(Field::DeclineReason)?,
        };
        self.report_foreign(&[Field::DeclineReason]);
        Ok(ResponseVariant::Declined(response))
    }

    fn redirect(&mut self, action: Action) -> Result<ResponseVariant, ParseError> {
        let url = self.required(Field::RedirectUrl)?;
        let redirect_url = Url::parse(&url).map_err(|err| ParseError::InvalidField {
            field: Field::RedirectUrl,
            reason: err.to_string(),
        })?;
        let (redirect_params, received_params) = self.redirect_params()?;
        let response = RedirectResponse {
            action,
            sale: self.sale()?,
            status: self.status()?,
            redirect_url,
            redirect_params,
            received_params,
            redirect_method: self.required(Field::RedirectMethod)?.parse::<HttpMethod>()?,
        };
        self.report_foreign(&[Field::RedirectUrl, Field::RedirectParams, Field::RedirectMethod]);
        Ok(ResponseVariant::Redirect(response))
    }

    /// Issuers echo parameter names in their own casing. The typed set maps
    /// them onto the catalog and reports names outside it; the raw pairs keep
    /// every entry as received.
    fn redirect_params(&mut self) -> Result<(ParameterSet, Vec<(String, String)>), ParseError> {
        let invalid = |reason: String| ParseError::InvalidField {
            field: Field::RedirectParams,
            reason,
        };
        let map = match self.raw(Field::RedirectParams) {
            None | Some(Value::Null) => return Err(ParseError::MissingField(Field::RedirectParams)),
            Some(Value::Array(items)) if items.is_empty() => {
                return Ok((ParameterSet::new(), Vec::new()));
            }
            Some(Value::Object(map)) => map,
            Some(_) => return Err(invalid("expected an object".to_owned())),
        };
        let mut params = ParameterSet::new();
        let mut received = Vec::with_capacity(map.len());
        for (name, value) in map {
            let text = scalar_text(value)
                .or_else(|| value.is_null().then(String::new))
                .ok_or_else(|| invalid(format!("parameter {name:?} is not a scalar")))?;
            match Field::from_wire_name_ignore_case(name) {
                Some(field) => {
                    params.insert(field, text.clone());
                }
                None => self.unexpected.push(Unexpected::RedirectParam(name.clone())),
            }
            received.push((name.clone(), text));
        }
        Ok((params, received))
    }

    fn success(&mut self, action: Action, result: ResultCode) -> Result<ResponseVariant, ParseError> {
        let companions = SuccessCompanions::for_action(action);
        let sale = self.sale()?;

        let status = match companions.status {
            Presence::Required => Some(self.status()?),
            Presence::Optional => self.text(Field::Status)?.map(|s| s.parse()).transpose()?,
            Presence::Absent => {
                if self.is_present(Field::Status) {
                    self.unexpected.push(Unexpected::Field(Field::Status));
                }
                None
            }
        };
        let recurring_token = match companions.recurring_token {
            Presence::Required => Some(self.required(Field::RecurringToken)?),
            Presence::Optional => self.text(Field::RecurringToken)?,
            Presence::Absent => None,
        };
        let owned: &[Field] = match companions.recurring_token {
            Presence::Absent => &[],
            Presence::Required | Presence::Optional => &[Field::RecurringToken],
        };
        self.report_foreign(owned);

        Ok(match status {
            Some(status) => ResponseVariant::SuccessWithStatus(StatusResponse {
                action,
                result,
                sale,
                status,
                recurring_token,
            }),
            None => ResponseVariant::Success(SuccessResponse {
                action,
                result,
                sale,
                recurring_token,
            }),
        })
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bytes(value: &Value) -> Vec<u8> {
        serde_json::to_vec(value).unwrap()
    }

    #[test]
    fn test_not_an_object() {
        assert!(matches!(resolve(b"[1]", Action::Sale), Err(ParseError::NotAnObject)));
        assert!(matches!(resolve(b"{", Action::Sale), Err(ParseError::Json(_))));
    }

    #[test]
    fn test_unknown_result_is_parse_error() {
        let body = bytes(&json!({"action": "SALE", "result": "MAYBE"}));
        assert!(matches!(resolve(&body, Action::Sale), Err(ParseError::UnknownValue(_))));
    }

    #[test]
    fn test_numbers_are_read_as_text_and_empty_strings_as_absent() {
        let body = bytes(&json!({
            "action": "SALE",
            "result": "SUCCESS",
            "status": "SETTLED",
            "trans_id": 12345,
            "order_id": "",
            "amount": 10.5,
        }));
        let variant = resolve(&body, Action::Sale).unwrap();
        let sale = variant.sale().unwrap();
        assert_eq!(sale.trans_id.as_deref(), Some("12345"));
        assert_eq!(sale.order_id, None);
        assert_eq!(sale.amount.map(|a| a.to_wire()), Some("10.50".to_owned()));
    }

    #[test]
    fn test_sale_success_requires_status() {
        let body = bytes(&json!({"action": "SALE", "result": "SUCCESS", "trans_id": "T1"}));
        assert!(matches!(
            resolve(&body, Action::Sale),
            Err(ParseError::MissingField(Field::Status))
        ));
    }

    #[test]
    fn test_schedule_success_has_no_status() {
        let body = bytes(&json!({
            "action": "SCHEDULE",
            "result": "SUCCESS",
            "schedule_id": "S-1",
            "status": "ENABLED",
        }));
        let resolution = resolve_detailed(&body, Action::Schedule).unwrap();
        let ResponseVariant::Success(success) = &resolution.variant else {
            panic!("expected plain success, got {:?}", resolution.variant);
        };
        assert_eq!(success.sale.schedule_id.as_deref(), Some("S-1"));
        assert_eq!(resolution.unexpected, [Unexpected::Field(Field::Status)]);
    }

    #[test]
    fn test_optional_status_selects_variant_by_presence() {
        let with = bytes(&json!({"action": "CREDITVOID", "result": "ACCEPTED", "status": "REFUND"}));
        let without = bytes(&json!({"action": "CREDITVOID", "result": "ACCEPTED"}));
        assert!(matches!(
            resolve(&with, Action::CreditVoid).unwrap(),
            ResponseVariant::SuccessWithStatus(StatusResponse {
                status: Status::Refund,
                result: ResultCode::Accepted,
                ..
            })
        ));
        assert!(matches!(
            resolve(&without, Action::CreditVoid).unwrap(),
            ResponseVariant::Success(_)
        ));
    }

    #[test]
    fn test_recurring_token_kept_for_sale_and_reported_for_capture() {
        let sale = bytes(&json!({
            "action": "SALE",
            "result": "SUCCESS",
            "status": "SETTLED",
            "recurring_token": "RT",
        }));
        let ResponseVariant::SuccessWithStatus(response) = resolve(&sale, Action::Sale).unwrap() else {
            panic!("expected success with status");
        };
        assert_eq!(response.recurring_token.as_deref(), Some("RT"));

        let capture = bytes(&json!({
            "action": "CAPTURE",
            "result": "SUCCESS",
            "status": "SETTLED",
            "recurring_token": "RT",
        }));
        let resolution = resolve_detailed(&capture, Action::Capture).unwrap();
        assert_eq!(resolution.unexpected, [Unexpected::Field(Field::RecurringToken)]);
    }

    #[test]
    fn test_result_wins_over_foreign_markers() {
        let body = bytes(&json!({
            "action": "SALE",
            "result": "DECLINED",
            "status": "DECLINED",
            "decline_reason": "Do not honor",
            "redirect_url": "https://bank.example/3ds",
        }));
        let resolution = resolve_detailed(&body, Action::Sale).unwrap();
        assert!(matches!(resolution.variant, ResponseVariant::Declined(_)));
        assert_eq!(resolution.unexpected, [Unexpected::Field(Field::RedirectUrl)]);
    }

    #[test]
    fn test_declined_requires_reason() {
        let body = bytes(&json!({"action": "SALE", "result": "DECLINED", "status": "DECLINED"}));
        assert!(matches!(
            resolve(&body, Action::Sale),
            Err(ParseError::MissingField(Field::DeclineReason))
        ));
    }

    #[test]
    fn test_error_code_and_missing_message() {
        let body = bytes(&json!({"result": "ERROR", "error_message": "bad", "error_code": "204002"}));
        assert_eq!(
            resolve(&body, Action::Capture).unwrap(),
            ResponseVariant::Error(GatewayError::from_server("bad", 204_002))
        );

        let body = bytes(&json!({"result": "ERROR", "error_code": 1}));
        assert!(matches!(
            resolve(&body, Action::Capture),
            Err(ParseError::MissingField(Field::ErrorMessage))
        ));
    }

    #[test]
    fn test_redirect_params_casing_and_unknown_names() {
        let body = bytes(&json!({
            "action": "SALE",
            "result": "REDIRECT",
            "status": "3DS",
            "redirect_url": "https://bank.example/3ds",
            "redirect_params": {"PaReq": "abc", "md": 7, "creq": "x"},
            "redirect_method": "POST",
        }));
        let resolution = resolve_detailed(&body, Action::Sale).unwrap();
        let ResponseVariant::Redirect(redirect) = &resolution.variant else {
            panic!("expected redirect");
        };
        assert_eq!(redirect.redirect_params.text(Field::PaReq), Some("abc"));
        assert_eq!(redirect.redirect_params.text(Field::Md), Some("7"));
        assert_eq!(
            resolution.unexpected,
            [Unexpected::RedirectParam("creq".to_owned())]
        );
    }

    #[test]
    fn test_redirect_replays_params_as_received() {
        let body = bytes(&json!({
            "action": "SALE",
            "result": "REDIRECT",
            "status": "3DS",
            "redirect_url": "https://bank.example/3ds",
            "redirect_params": {"PaReq": "abc", "MD": "1", "TermUrl": "https://t", "creq": "zz"},
            "redirect_method": "POST",
        }));
        let ResponseVariant::Redirect(redirect) = resolve(&body, Action::Sale).unwrap() else {
            panic!("expected redirect");
        };
        assert_eq!(
            redirect.replay_request().body.as_deref(),
            Some("PaReq=abc&MD=1&TermUrl=https%3A%2F%2Ft&creq=zz")
        );
        assert_eq!(redirect.redirect_params.text(Field::TermUrl), Some("https://t"));
    }

    #[test]
    fn test_redirect_accepts_empty_array_params() {
        let body = bytes(&json!({
            "action": "APPLEPAY",
            "result": "REDIRECT",
            "status": "3DS",
            "redirect_url": "https://bank.example/3ds",
            "redirect_params": [],
            "redirect_method": "GET",
        }));
        let ResponseVariant::Redirect(redirect) = resolve(&body, Action::ApplePay).unwrap() else {
            panic!("expected redirect");
        };
        assert!(redirect.redirect_params.is_empty());
        assert_eq!(redirect.replay_request().url.as_str(), "https://bank.example/3ds");
    }

    #[test]
    fn test_action_mismatch_is_reported() {
        let body = bytes(&json!({"action": "CAPTURE", "result": "SUCCESS", "status": "SETTLED"}));
        let resolution = resolve_detailed(&body, Action::Sale).unwrap();
        assert_eq!(resolution.variant.action(), Some(Action::Sale));
        assert_eq!(
            resolution.unexpected,
            [Unexpected::ActionMismatch {
                expected: Action::Sale,
                received: Action::Capture,
            }]
        );
    }

    #[test]
    fn test_transaction_details() {
        let body = bytes(&json!({
            "action": "GET_TRANS_DETAILS",
            "result": "SUCCESS",
            "status": "SETTLED",
            "trans_id": "T1",
            "transactions": [
                {"date": "2026-01-02 10:00:00", "type": "SALE", "status": "success", "amount": "1.00"},
                {"type": "REFUND", "amount": 0.5},
            ],
        }));
        let variant = resolve(&body, Action::GetTransDetails).unwrap();
        let transactions = &variant.sale().unwrap().transactions;
        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[1].kind, crate::catalog::TransactionType::Refund);
        assert_eq!(transactions[1].amount.map(|a| a.to_wire()), Some("0.50".to_owned()));
    }
}
