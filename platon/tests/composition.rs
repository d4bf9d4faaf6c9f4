//! End-to-end composition of every operation from credentials on disk.

use platon::amount::Amount;
use platon::catalog::{Action, Field, HttpMethod};
use platon::config::Credentials;
use platon::params::ParameterSet;
use platon::query::decode_query;
use platon::request::{
    ApplePaySaleRequest, CaptureRequest, Card, CreditVoidRequest, DescheduleRequest,
    GatewayRequest, Order, Payer, PayerIdentity, Recurring, RecurringSaleRequest, SaleRequest,
    ScheduleRequest, TransDetailsRequest, TransStatusByOrderRequest, TransStatusRequest, compose,
};

fn credentials() -> Credentials {
    Credentials::from_toml_str(
        r#"
        client_key = "CLIENT-KEY"
        client_pass = "d2a9e1c43f"
        payment_url = "https://secure.platononline.com/post-unq/"
        term_url_3ds = "https://shop.example/3ds"
        "#,
    )
    .unwrap()
}

fn identity() -> PayerIdentity {
    PayerIdentity::new("a@b.c", "4111111111111111")
}

fn order(id: &str) -> Order {
    Order::new(id, Amount::try_from(12.3_f64).unwrap(), "UAH", "a&b=c, é")
}

fn payer() -> Payer {
    Payer {
        first_name: "Leo".to_owned(),
        last_name: "Ernser".to_owned(),
        address: "1 Main St".to_owned(),
        country: "UA".to_owned(),
        city: "Kyiv".to_owned(),
        zip: "01001".to_owned(),
        email: "a@b.c".to_owned(),
        phone: "380501234567".to_owned(),
        ip: "192.0.2.1".to_owned(),
        ..Payer::default()
    }
}

fn all_requests(credentials: &Credentials) -> Vec<GatewayRequest> {
    let recurring = Recurring::new("T-1", "RT");
    vec![
        compose(
            &SaleRequest::new(order("O-1"), Card::new("4111111111111111", 12, 2030, "123"), payer()),
            credentials,
        ),
        compose(&CaptureRequest::new("T-1", identity()), credentials),
        compose(&CreditVoidRequest::new("T-1", identity()), credentials),
        compose(
            &RecurringSaleRequest::new(order("O-2"), recurring.clone(), identity()),
            credentials,
        ),
        compose(
            &ScheduleRequest::new(
                Order::amount_only(Amount::try_from(5_u32).unwrap(), "monthly"),
                recurring.clone(),
                30,
                identity(),
            ),
            credentials,
        ),
        compose(&DescheduleRequest::new(recurring, "S-1", identity()), credentials),
        compose(&TransStatusRequest::new("T-1", identity()), credentials),
        compose(&TransStatusByOrderRequest::new("O-1"), credentials),
        compose(&TransDetailsRequest::new("T-1", identity()), credentials),
        compose(
            &ApplePaySaleRequest::new(order("O-3"), "{\"data\":\"...\"}", "a@b.c"),
            credentials,
        ),
    ]
    .into_iter()
    .collect::<Result<_, _>>()
    .unwrap()
}

/// Integers come back as text, so compare rendered values.
fn wire_pairs(params: &ParameterSet) -> Vec<(Field, Option<String>)> {
    params
        .iter()
        .map(|(field, value)| (field, value.to_wire_text()))
        .collect()
}

#[test]
fn test_every_operation_round_trips_through_the_wire() {
    for request in all_requests(&credentials()) {
        let decoded = decode_query(&request.query()).unwrap();
        assert_eq!(wire_pairs(&decoded), wire_pairs(&request.params), "{}", request.action);
        assert!(request.params.contains(Field::Hash), "{}", request.action);
        assert_eq!(request.params.text(Field::Action), Some(request.action.as_str()));
    }
}

#[test]
fn test_status_queries_are_get_and_the_rest_post() {
    for request in all_requests(&credentials()) {
        let expected = match request.action {
            Action::GetTransStatus | Action::GetTransStatusByOrder | Action::GetTransDetails => {
                HttpMethod::Get
            }
            _ => HttpMethod::Post,
        };
        assert_eq!(request.method, expected, "{}", request.action);
        assert_eq!(request.body().is_none(), expected == HttpMethod::Get);
    }
}

#[test]
fn test_state_url_falls_back_to_payment_url() {
    let request = compose(&TransStatusByOrderRequest::new("O-1"), &credentials()).unwrap();
    assert_eq!(request.url.as_str(), "https://secure.platononline.com/post-unq/");
}
