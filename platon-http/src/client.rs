//! Async client that sends composed requests to the Platon gateway.
//!
//! [`PlatonClient`] owns the merchant [`Credentials`], composes and signs
//! every operation, posts it over HTTP and resolves the reply into a
//! [`ResponseVariant`]. Declines and gateway error envelopes are values, not
//! transport errors.

use std::sync::Arc;
use std::time::Duration;

use http::header::{CONTENT_TYPE, USER_AGENT};
use http::{HeaderMap, StatusCode};
use platon::catalog::HttpMethod;
use platon::config::Credentials;
use platon::request::{
    ApplePaySaleRequest, CaptureRequest, CreditVoidRequest, DescheduleRequest, GatewayRequest,
    Operation, RecurringSaleRequest, SaleRequest, ScheduleRequest, TokenSaleRequest,
    TransDetailsRequest, TransStatusByOrderRequest, TransStatusRequest, WebPaymentForm,
    WebSaleRequest, compose_web_with, compose_with,
};
use platon::response::{ReplayRequest, ResponseVariant, resolve};
use platon::signature::SignatureTable;
use reqwest::Client;
use url::Url;

#[cfg(feature = "telemetry")]
use tracing::{Instrument, Span, instrument};

use crate::constants::{CLIENT_USER_AGENT, DEFAULT_TIMEOUT, FORM_CONTENT_TYPE};
use crate::error::TransportError;

/// A page fetched while replaying a redirect challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResponse {
    /// Final URL after following redirects.
    pub url: Url,
    /// HTTP status of the final response.
    pub status: StatusCode,
    /// Response body as text.
    pub body: String,
}

/// Client for the Platon server-to-server and web payment endpoints.
#[derive(Clone, Debug)]
pub struct PlatonClient {
    credentials: Arc<Credentials>,
    signatures: Arc<SignatureTable>,
    client: Client,
    headers: HeaderMap,
    timeout: Option<Duration>,
}

impl PlatonClient {
    /// Creates a client after checking that `credentials` are usable.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Core`] wrapping a configuration error when a
    /// credential is empty.
    pub fn try_new(credentials: Credentials) -> Result<Self, TransportError> {
        credentials.validate().map_err(platon::Error::from)?;
        Ok(Self {
            credentials: Arc::new(credentials),
            signatures: Arc::new(SignatureTable::default()),
            client: Client::new(),
            headers: HeaderMap::new(),
            timeout: Some(DEFAULT_TIMEOUT),
        })
    }

    /// Credentials used to sign requests.
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Adds headers sent with every request.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Overrides the per-request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Uses a preconfigured [`reqwest::Client`].
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Replaces the signature table used for composition.
    #[must_use]
    pub fn with_signature_table(mut self, table: SignatureTable) -> Self {
        self.signatures = Arc::new(table);
        self
    }

    /// Composes and signs `operation` without sending it.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Core`] for invalid input.
    pub fn compose<O: Operation>(&self, operation: &O) -> Result<GatewayRequest, TransportError> {
        Ok(compose_with(operation, &self.credentials, &self.signatures)?)
    }

    /// Composes, sends and resolves `operation`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when composition, transport or parsing fails.
    pub async fn submit<O: Operation>(&self, operation: &O) -> Result<ResponseVariant, TransportError> {
        let request = self.compose(operation)?;
        self.execute(&request).await
    }

    /// Sends a composed request and resolves the reply.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when transport or parsing fails.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "platon.execute", skip_all, err, fields(action = %request.action))
    )]
    pub async fn execute(&self, request: &GatewayRequest) -> Result<ResponseVariant, TransportError> {
        let bytes = self.send_raw(request).await?;
        let variant = resolve(&bytes, request.action)?;

        #[cfg(feature = "telemetry")]
        tracing::debug!(status = ?variant.status(), "Resolved gateway response");

        Ok(variant)
    }

    /// Sends a composed request and returns the raw `200 OK` body.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::HttpStatus`] for any other status.
    pub async fn send_raw(&self, request: &GatewayRequest) -> Result<Vec<u8>, TransportError> {
        let context = "gateway request";
        let builder = match request.body() {
            Some(body) => self.form(reqwest::Method::POST, request.url.clone(), body),
            None => self.prepare(to_method(request.method), request.target_url()),
        };

        let fut = async {
            let result = exchange(context, builder).await;
            record_result_on_span(&result);
            result
        };

        #[cfg(feature = "telemetry")]
        let fut = fut.instrument(tracing::info_span!(
            "platon.send",
            action = %request.action,
            method = %request.method,
            otel.kind = "client",
            otel.status_code = tracing::field::Empty,
            error.message = tracing::field::Empty,
        ));

        fut.await
    }

    /// Replays a redirect challenge and returns the page it lands on.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the page cannot be fetched.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "platon.replay", skip_all, err, fields(method = %replay.method, url = %replay.url))
    )]
    pub async fn replay(&self, replay: &ReplayRequest) -> Result<PageResponse, TransportError> {
        let context = "redirect replay";
        let builder = match &replay.body {
            Some(body) => self.form(to_method(replay.method), replay.url.clone(), body.clone()),
            None => self.prepare(to_method(replay.method), replay.url.clone()),
        };
        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::from_send(context, e))?;
        let url = response.url().clone();
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::ResponseBodyRead { context, source: e })?;
        Ok(PageResponse { url, status, body })
    }

    /// Composes and signs a web sale without sending it.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Core`] for invalid input.
    pub fn compose_web(&self, request: &WebSaleRequest) -> Result<WebPaymentForm, TransportError> {
        Ok(compose_web_with(request, &self.credentials, &self.signatures)?)
    }

    /// Posts a web sale and returns the payment page URL the gateway
    /// redirects to.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when composition or transport fails.
    pub async fn web_sale(&self, request: &WebSaleRequest) -> Result<Url, TransportError> {
        let form = self.compose_web(request)?;
        self.submit_web(&form).await
    }

    /// Posts a composed web payment form and returns the final URL.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::HttpStatus`] when the final page is not a
    /// success.
    #[cfg_attr(
        feature = "telemetry",
        instrument(name = "platon.web_sale", skip_all, err, fields(payment = %form.payment))
    )]
    pub async fn submit_web(&self, form: &WebPaymentForm) -> Result<Url, TransportError> {
        let context = "web payment form";
        let response = self
            .form(reqwest::Method::POST, form.url.clone(), form.body())
            .send()
            .await
            .map_err(|e| TransportError::from_send(context, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| TransportError::ResponseBodyRead { context, source: e })?;
            return Err(TransportError::HttpStatus {
                context,
                status,
                body,
            });
        }

        #[cfg(feature = "telemetry")]
        tracing::debug!(url = %response.url(), "Web payment page resolved");

        Ok(response.url().clone())
    }

    /// Card sale.
    ///
    /// # Errors
    ///
    /// See [`PlatonClient::submit`].
    pub async fn sale(&self, request: &SaleRequest) -> Result<ResponseVariant, TransportError> {
        self.submit(request).await
    }

    /// Sale against a stored card token.
    ///
    /// # Errors
    ///
    /// See [`PlatonClient::submit`].
    pub async fn token_sale(&self, request: &TokenSaleRequest) -> Result<ResponseVariant, TransportError> {
        self.submit(request).await
    }

    /// Captures an authorized transaction.
    ///
    /// # Errors
    ///
    /// See [`PlatonClient::submit`].
    pub async fn capture(&self, request: &CaptureRequest) -> Result<ResponseVariant, TransportError> {
        self.submit(request).await
    }

    /// Refunds or voids a transaction.
    ///
    /// # Errors
    ///
    /// See [`PlatonClient::submit`].
    pub async fn credit_void(&self, request: &CreditVoidRequest) -> Result<ResponseVariant, TransportError> {
        self.submit(request).await
    }

    /// Charges a recurring payment.
    ///
    /// # Errors
    ///
    /// See [`PlatonClient::submit`].
    pub async fn recurring_sale(
        &self,
        request: &RecurringSaleRequest,
    ) -> Result<ResponseVariant, TransportError> {
        self.submit(request).await
    }

    /// Schedules periodic recurring charges.
    ///
    /// # Errors
    ///
    /// See [`PlatonClient::submit`].
    pub async fn schedule(&self, request: &ScheduleRequest) -> Result<ResponseVariant, TransportError> {
        self.submit(request).await
    }

    /// Cancels a schedule.
    ///
    /// # Errors
    ///
    /// See [`PlatonClient::submit`].
    pub async fn deschedule(&self, request: &DescheduleRequest) -> Result<ResponseVariant, TransportError> {
        self.submit(request).await
    }

    /// Transaction status by id.
    ///
    /// # Errors
    ///
    /// See [`PlatonClient::submit`].
    pub async fn trans_status(&self, request: &TransStatusRequest) -> Result<ResponseVariant, TransportError> {
        self.submit(request).await
    }

    /// Transaction status by merchant order id.
    ///
    /// # Errors
    ///
    /// See [`PlatonClient::submit`].
    pub async fn trans_status_by_order(
        &self,
        request: &TransStatusByOrderRequest,
    ) -> Result<ResponseVariant, TransportError> {
        self.submit(request).await
    }

    /// Transaction details and history.
    ///
    /// # Errors
    ///
    /// See [`PlatonClient::submit`].
    pub async fn trans_details(&self, request: &TransDetailsRequest) -> Result<ResponseVariant, TransportError> {
        self.submit(request).await
    }

    /// Apple Pay sale.
    ///
    /// # Errors
    ///
    /// See [`PlatonClient::submit`].
    pub async fn apple_pay(&self, request: &ApplePaySaleRequest) -> Result<ResponseVariant, TransportError> {
        self.submit(request).await
    }

    fn prepare(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let mut req = self
            .client
            .request(method, url)
            .header(USER_AGENT, CLIENT_USER_AGENT);
        for (key, value) in &self.headers {
            req = req.header(key, value);
        }
        if let Some(timeout) = self.timeout {
            req = req.timeout(timeout);
        }
        req
    }

    fn form(&self, method: reqwest::Method, url: Url, body: String) -> reqwest::RequestBuilder {
        self.prepare(method, url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
    }
}

/// Sends `builder` and returns the body of a `200 OK` reply.
async fn exchange(
    context: &'static str,
    builder: reqwest::RequestBuilder,
) -> Result<Vec<u8>, TransportError> {
    let response = builder
        .send()
        .await
        .map_err(|e| TransportError::from_send(context, e))?;

    if response.status() != StatusCode::OK {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::ResponseBodyRead { context, source: e })?;
        return Err(TransportError::HttpStatus {
            context,
            status,
            body,
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| TransportError::ResponseBodyRead { context, source: e })?;
    Ok(bytes.to_vec())
}

/// Maps a gateway HTTP verb onto [`reqwest::Method`].
const fn to_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Options => reqwest::Method::OPTIONS,
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Patch => reqwest::Method::PATCH,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Trace => reqwest::Method::TRACE,
        HttpMethod::Connect => reqwest::Method::CONNECT,
    }
}

/// Records the outcome of a request on the current tracing span.
#[cfg(feature = "telemetry")]
fn record_result_on_span<R, E: std::fmt::Display>(result: &Result<R, E>) {
    let span = Span::current();
    match result {
        Ok(_) => {
            span.record("otel.status_code", "OK");
        }
        Err(err) => {
            span.record("otel.status_code", "ERROR");
            span.record("error.message", tracing::field::display(err));
            tracing::event!(tracing::Level::ERROR, error = %err, "Gateway request failed");
        }
    }
}

/// No-op when telemetry is disabled.
#[cfg(not(feature = "telemetry"))]
const fn record_result_on_span<R, E>(_result: &Result<R, E>) {}
