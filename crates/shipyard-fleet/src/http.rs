//! HTTP implementation of [`FleetClient`].
//!
//! Speaks the backend's JSON API. Status codes are mapped onto
//! [`FleetError`] kinds: 403 → `Forbidden`, 404 → `NotFound`, anything other
//! than the expected success code → `Unknown(status)`.

use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::trace;
use url::Url;

use crate::client::{FleetClient, FleetFuture};
use crate::context::RunContext;
use crate::error::{FleetError, FleetResult};
use crate::types::{CreateInstanceParams, Instance, LoadBalancer};

/// Upper bound for a single request.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fleet client talking to the backend over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFleetClient {
    base: Url,
    authorization: String,
    http: reqwest::Client,
    request_timeout: Duration,
}

impl HttpFleetClient {
    /// Create a client for the backend at `base`, authenticating every
    /// request with `authorization` as the raw `Authorization` header.
    pub fn new(base: Url, authorization: &str) -> FleetResult<Self> {
        if base.cannot_be_a_base() {
            return Err(FleetError::Transport(format!("'{base}' cannot be used as a base url")));
        }

        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base,
            authorization: authorization.to_string(),
            http,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Override the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build `{base}/{segments...}`, percent-encoding each segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(
        &self,
        ctx: &RunContext,
        method: Method,
        url: Url,
        body: Option<&CreateInstanceParams>,
    ) -> FleetResult<Response> {
        if ctx.is_done() {
            return Err(FleetError::Cancelled);
        }

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, &self.authorization)
            .timeout(self.request_timeout);
        if let Some(body) = body {
            request = request.json(body);
        }

        let started = Instant::now();
        let result = request.send().await;
        trace!(
            %method,
            %url,
            milliseconds = started.elapsed().as_millis() as u64,
            "http call"
        );

        Ok(result?)
    }
}

/// Accept `expected`, map everything else onto an error kind.
fn expect_status(response: Response, expected: StatusCode) -> FleetResult<Response> {
    match response.status() {
        status if status == expected => Ok(response),
        StatusCode::FORBIDDEN => Err(FleetError::Forbidden),
        StatusCode::NOT_FOUND => Err(FleetError::NotFound),
        status => Err(FleetError::Unknown(status.as_u16())),
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> FleetResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| FleetError::Decode(e.to_string()))
}

impl FleetClient for HttpFleetClient {
    fn create_load_balancer<'a>(
        &'a self,
        ctx: &'a RunContext,
        name: &'a str,
    ) -> FleetFuture<'a, LoadBalancer> {
        Box::pin(async move {
            let url = self.endpoint(&["loadbalancers", name]);
            let response = self.send(ctx, Method::PUT, url, None).await?;
            decode(expect_status(response, StatusCode::CREATED)?).await
        })
    }

    fn get_instances<'a>(
        &'a self,
        ctx: &'a RunContext,
        lb_name: &'a str,
    ) -> FleetFuture<'a, Vec<Instance>> {
        Box::pin(async move {
            let url = self.endpoint(&["loadbalancers", lb_name, "instances"]);
            let response = self.send(ctx, Method::GET, url, None).await?;
            decode(expect_status(response, StatusCode::OK)?).await
        })
    }

    fn create_instance<'a>(
        &'a self,
        ctx: &'a RunContext,
        lb_name: &'a str,
        version: &'a str,
    ) -> FleetFuture<'a, Instance> {
        Box::pin(async move {
            let url = self.endpoint(&["loadbalancers", lb_name, "instances"]);
            let params = CreateInstanceParams {
                version: version.to_string(),
            };
            let response = self.send(ctx, Method::POST, url, Some(&params)).await?;
            decode(expect_status(response, StatusCode::CREATED)?).await
        })
    }

    fn delete_instance<'a>(
        &'a self,
        ctx: &'a RunContext,
        lb_name: &'a str,
        id: &'a str,
    ) -> FleetFuture<'a, ()> {
        Box::pin(async move {
            let url = self.endpoint(&["loadbalancers", lb_name, "instances", id]);
            let response = self.send(ctx, Method::DELETE, url, None).await?;
            expect_status(response, StatusCode::NO_CONTENT)?;
            Ok(())
        })
    }
}
