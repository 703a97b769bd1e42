//! Trusted-host middleware.
//!
//! Rejects requests whose `Host` header is not in the configured allow list.

use std::sync::Arc;

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::errors::AppError;

/// Host check layer function that takes the allowed hosts as a parameter.
pub async fn trusted_host_layer(
    allowed_hosts: Arc<Vec<String>>,
    request: Request,
    next: Next,
) -> Response {
    let host = request
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(strip_port)
        .or_else(|| request.uri().host())
        .map(str::to_string);

    match host {
        Some(host) if is_allowed(&allowed_hosts, &host) => next.run(request).await,
        Some(host) => {
            tracing::warn!(%host, "Rejected request with untrusted host");
            AppError::InvalidHost("Invalid host header".to_string()).into_response()
        }
        None => AppError::InvalidHost("Missing host header".to_string()).into_response(),
    }
}

fn is_allowed(allowed_hosts: &[String], host: &str) -> bool {
    allowed_hosts
        .iter()
        .any(|allowed| allowed == "*" || allowed.eq_ignore_ascii_case(host))
}

/// Drop a trailing `:port`, keeping bracketed IPv6 literals intact.
fn strip_port(host: &str) -> &str {
    if let Some(end) = host.strip_prefix('[').and_then(|rest| rest.find(']')) {
        return &host[..end + 2];
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}
