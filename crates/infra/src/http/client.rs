use std::time::Duration;

use async_trait::async_trait;
use jobhub_core::Transport;
use jobhub_domain::{
    ApiError, ApiResponse, Headers, HttpMethod, MultipartPart, OutboundRequest, RequestBody,
    TransportError,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client as ReqwestClient, Method};
use tracing::debug;

use crate::errors::IntoDomainError;

/// reqwest-backed [`Transport`].
///
/// Sends exactly once per call; retrying is the session layer's decision.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    /// Start building a new transport.
    pub fn builder() -> ReqwestTransportBuilder {
        ReqwestTransportBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self, ApiError> {
        Self::builder().build()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<ApiResponse, TransportError> {
        let OutboundRequest { method, url, query, headers, body, timeout } = request;

        let mut builder = self.client.request(to_method(method), &url).timeout(timeout);
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        for (name, value) in headers.iter() {
            builder = builder.header(name, value);
        }
        builder = match body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::Multipart(parts) => builder.multipart(build_form(parts)?),
        };

        debug!(%method, %url, "sending HTTP request");
        let response = builder.send().await.map_err(|err| map_send_error(err, timeout))?;

        let status = response.status().as_u16();
        let mut response_headers = Headers::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                response_headers.insert(name.as_str(), value);
            }
        }
        debug!(%method, %url, status, "received HTTP response");

        let bytes = response.bytes().await.map_err(|err| map_send_error(err, timeout))?;
        Ok(ApiResponse { status, headers: response_headers, body: bytes.to_vec() })
    }
}

/// Builder for [`ReqwestTransport`].
#[derive(Debug)]
pub struct ReqwestTransportBuilder {
    connect_timeout: Duration,
    user_agent: Option<String>,
}

impl Default for ReqwestTransportBuilder {
    fn default() -> Self {
        Self { connect_timeout: Duration::from_secs(10), user_agent: None }
    }
}

impl ReqwestTransportBuilder {
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<ReqwestTransport, ApiError> {
        let mut builder =
            ReqwestClient::builder().connect_timeout(self.connect_timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder
            .build()
            .map_err(|err| ApiError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(ReqwestTransport { client })
    }
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn build_form(parts: Vec<MultipartPart>) -> Result<Form, TransportError> {
    parts.into_iter().try_fold(Form::new(), |form, part| match part {
        MultipartPart::Text { name, value } => Ok(form.text(name, value)),
        MultipartPart::File { name, file_name, content_type, bytes } => {
            let mut file = Part::bytes(bytes).file_name(file_name);
            if let Some(content_type) = content_type {
                file = file.mime_str(&content_type).map_err(|err| {
                    TransportError::InvalidRequest(format!("invalid content type: {err}"))
                })?;
            }
            Ok(form.part(name, file))
        }
    })
}

fn map_send_error(err: reqwest::Error, timeout: Duration) -> TransportError {
    if err.is_timeout() {
        return TransportError::Timeout(timeout);
    }
    err.into_domain()
}
