//! Literal gateway envelopes and their resolved variants.

use platon::catalog::{Action, Field, HttpMethod, ResultCode, Status};
use platon::error::{ErrorKind, GatewayError, ParseError};
use platon::response::{ResponseVariant, resolve, resolve_detailed};
use serde_json::json;

fn bytes(value: &serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(value).unwrap()
}

#[test]
fn test_sale_success_with_status() {
    let body = bytes(&json!({
        "action": "SALE",
        "result": "SUCCESS",
        "status": "SETTLED",
        "trans_id": "T1",
        "order_id": "O1",
    }));
    let ResponseVariant::SuccessWithStatus(response) = resolve(&body, Action::Sale).unwrap() else {
        panic!("expected success with status");
    };
    assert_eq!(response.status, Status::Settled);
    assert_eq!(response.result, ResultCode::Success);
    assert_eq!(response.sale.trans_id.as_deref(), Some("T1"));
    assert_eq!(response.sale.order_id.as_deref(), Some("O1"));
}

#[test]
fn test_sale_redirect_replays_params_as_post_body() {
    let body = bytes(&json!({
        "action": "SALE",
        "result": "REDIRECT",
        "status": "3DS",
        "order_id": "O1",
        "trans_id": "T1",
        "redirect_url": "https://bank/3ds",
        "redirect_params": {"PaReq": "eJxVUt1ugjAU", "MD": "123", "TermUrl": "https://shop.example/3ds"},
        "redirect_method": "POST",
    }));
    let ResponseVariant::Redirect(redirect) = resolve(&body, Action::Sale).unwrap() else {
        panic!("expected redirect");
    };
    assert_eq!(redirect.status, Status::Secure3d);

    let replay = redirect.replay_request();
    assert_eq!(replay.method, HttpMethod::Post);
    assert_eq!(replay.url.as_str(), "https://bank/3ds");
    assert_eq!(
        replay.body.as_deref(),
        Some("PaReq=eJxVUt1ugjAU&MD=123&TermUrl=https%3A%2F%2Fshop.example%2F3ds")
    );
    assert_eq!(redirect.redirect_params.text(Field::PaReq), Some("eJxVUt1ugjAU"));
    assert_eq!(redirect.redirect_params.text(Field::Md), Some("123"));
}

#[test]
fn test_sale_declined_with_reason() {
    let body = bytes(&json!({
        "action": "SALE",
        "result": "DECLINED",
        "status": "DECLINED",
        "decline_reason": "insufficient_funds",
    }));
    let ResponseVariant::Declined(declined) = resolve(&body, Action::Sale).unwrap() else {
        panic!("expected declined");
    };
    assert_eq!(declined.status, Status::Declined);
    assert_eq!(declined.decline_reason, "insufficient_funds");
}

#[test]
fn test_error_envelope() {
    let body = bytes(&json!({"result": "ERROR", "error_message": "bad hash", "action": "SALE"}));
    let variant = resolve(&body, Action::Sale).unwrap();
    let ResponseVariant::Error(err) = &variant else {
        panic!("expected error");
    };
    assert_eq!(err, &GatewayError::from_server("bad hash", 0));
    assert_eq!(err.kind, ErrorKind::FromServer);
    assert_eq!(variant.clone().into_result().unwrap_err().kind(), ErrorKind::FromServer);
}

#[test]
fn test_missing_result_is_parse_error() {
    let body = bytes(&json!({"action": "SALE", "status": "SETTLED", "trans_id": "T1"}));
    assert!(matches!(
        resolve(&body, Action::Sale),
        Err(ParseError::MissingField(Field::Result))
    ));
}

#[test]
fn test_resolution_is_idempotent() {
    let body = bytes(&json!({
        "action": "SALE",
        "result": "REDIRECT",
        "status": "3DS",
        "redirect_url": "https://bank/3ds",
        "redirect_params": {"PaReq": "x", "unknown_param": "y"},
        "redirect_method": "POST",
        "decline_reason": "stray",
    }));
    let first = resolve_detailed(&body, Action::Sale).unwrap();
    let second = resolve_detailed(&body, Action::Sale).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.unexpected.len(), 2);
}
