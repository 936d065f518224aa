use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ConnectInfo;
use bytes::Bytes;
use http::{Request, Response, StatusCode};
use http_body::Body;
use http_body_util::{BodyExt, Full};
use optify::{CacheDirective, ConfigError};
use optify_http::{
    compress_payload, crossdomain, host_redirect, json_response, minify_payload, redirect::redirect_to,
    request_url, AllowedMethods, ClientAddr, Finalized, Payload, StoredResponse,
};
use tower::Service;
use tracing::{debug, error, warn};

use crate::future::ResponseFuture;
use crate::layer::{LayerSettings, Shared};

/// Tower service running the response post-processing pipeline.
pub struct OptimizeService<S> {
    upstream: S,
    shared: Arc<Shared>,
    settings: LayerSettings,
}

impl<S> OptimizeService<S> {
    pub(crate) fn new(upstream: S, shared: Arc<Shared>, settings: LayerSettings) -> Self {
        OptimizeService {
            upstream,
            shared,
            settings,
        }
    }
}

impl<S: Clone> Clone for OptimizeService<S> {
    fn clone(&self) -> Self {
        Self {
            upstream: self.upstream.clone(),
            shared: Arc::clone(&self.shared),
            settings: self.settings.clone(),
        }
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for OptimizeService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Send,
    ReqBody: Send + 'static,
    ResBody: Body + Send + 'static,
    ResBody::Data: Send,
    ResBody::Error: std::fmt::Display,
{
    type Response = Response<Full<Bytes>>;
    type Error = S::Error;
    type Future = ResponseFuture<S::Error>;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.upstream.poll_ready(cx)
    }

    fn call(&mut self, request: Request<ReqBody>) -> Self::Future {
        // Take the service that was driven to readiness, leave a fresh clone.
        let clone = self.upstream.clone();
        let upstream = std::mem::replace(&mut self.upstream, clone);
        let shared = Arc::clone(&self.shared);
        let settings = self.settings.clone();
        ResponseFuture::new(Box::pin(run(upstream, shared, settings, request)))
    }
}

/// Effective settings for one call, after applying layer overrides.
struct Resolved {
    minify: bool,
    compress: bool,
    cache: CacheDirective,
    cors: bool,
}

fn resolve(shared: &Shared, settings: &LayerSettings) -> Result<Resolved, ConfigError> {
    let profile = shared.config.profile(&settings.profile)?;
    Ok(Resolved {
        minify: settings.minify.unwrap_or(profile.minify),
        compress: settings.compress.unwrap_or(profile.compress),
        cache: settings
            .cache
            .clone()
            .unwrap_or_else(|| profile.cache.clone()),
        cors: settings.cors.unwrap_or(settings.profile == "json"),
    })
}

/// Client identity for rate limiting, most trusted source first.
fn client_identity<B>(request: &Request<B>) -> Option<String> {
    if let Some(ClientAddr(ip)) = request.extensions().get::<ClientAddr>() {
        return Some(ip.to_string());
    }
    if let Some(info) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return Some(info.0.ip().to_string());
    }
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|client| !client.is_empty())
        .map(str::to_string)
}

fn internal_error() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

async fn run<S, ReqBody, ResBody>(
    mut upstream: S,
    shared: Arc<Shared>,
    settings: LayerSettings,
    request: Request<ReqBody>,
) -> Result<Response<Full<Bytes>>, S::Error>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    ResBody: Body,
    ResBody::Error: std::fmt::Display,
{
    let resolved = match resolve(&shared, &settings) {
        Ok(resolved) => resolved,
        Err(err) => {
            error!(profile = %settings.profile, error = %err, "invalid middleware configuration");
            return Ok(internal_error());
        }
    };

    if settings.limited
        && let (Some(limiter), Some(spec)) = (&shared.limiter, &shared.config.limit)
        && let Some(client) = client_identity(&request)
    {
        let verdict = limiter.check_and_record(&client, spec).await;
        if !verdict.is_allowed() {
            warn!(%client, ?verdict, "rate limit rejection");
            let stored = match &shared.config.exceeded_redirect {
                Some(target) => redirect_to(target),
                None => json_response(
                    StatusCode::TOO_MANY_REQUESTS,
                    &serde_json::json!({"status_code": 429}),
                ),
            };
            return Ok(stored.into_response());
        }
    }

    let url = request_url(&request);

    if settings.redirects
        && let Some(spec) = &shared.config.redirect_hosts
        && let Some(redirect) = host_redirect(&url, spec)
    {
        return Ok(redirect.into_response());
    }

    let ttl = match resolved.cache.resolve(request.method().as_str()) {
        Ok(ttl) => ttl,
        Err(err) => {
            error!(profile = %settings.profile, error = %err, "invalid cache directive");
            return Ok(internal_error());
        }
    };

    if ttl.is_some() {
        if let Some(stored) = shared.cache.get(&url) {
            debug!(%url, "cache hit");
            return Ok(stored.into_response());
        }
        debug!(%url, "cache miss");
    }

    let allow_methods = request
        .extensions()
        .get::<AllowedMethods>()
        .cloned()
        .or_else(|| settings.allow_methods.clone());

    let response = upstream.call(request).await?;
    let (parts, body) = response.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            error!(%url, error = %err, "failed to buffer upstream body");
            return Ok(internal_error());
        }
    };

    let finalized = parts.extensions.get::<Finalized>().is_some();
    let mut payload = if finalized {
        Payload::Response(StoredResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    } else {
        Payload::WithMeta {
            body,
            status: parts.status,
            headers: parts.headers,
        }
    };

    if payload.is_transformable() {
        if resolved.cors {
            payload = crossdomain(payload, allow_methods.as_ref());
        }
        if resolved.minify {
            payload = minify_payload(payload);
        }
        if resolved.compress {
            payload = compress_payload(payload);
        }
    }

    let stored = payload.into_stored();
    if let Some(ttl) = ttl {
        debug!(%url, ttl_secs = ttl.as_secs(), "caching response");
        shared.cache.put(url, stored.clone(), ttl);
    }
    Ok(stored.into_response())
}
