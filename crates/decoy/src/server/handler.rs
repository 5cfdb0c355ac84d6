//! Conversion between hyper messages and the session's request/response model.

use crate::request::Request;
use crate::rule::ResponseDefinition;
use crate::session::MockSession;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Response, StatusCode};
use std::convert::Infallible;
use std::sync::Arc;
use tracing::debug;

/// Serve one exchange against `session`.
pub(crate) async fn handle_request(
    req: hyper::Request<Incoming>,
    session: Arc<MockSession>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let request = match into_request(req).await {
        Ok(request) => request,
        Err(message) => {
            debug!("{}", message);
            return Ok(plain_text(StatusCode::BAD_REQUEST, message));
        }
    };

    match session.dispatch(request) {
        Ok(response) => {
            if !response.delay().is_zero() {
                debug!("Delaying response by {:?}", response.delay());
                tokio::time::sleep(response.delay()).await;
            }
            Ok(to_hyper(&session.defaults().apply(&response)))
        }
        Err(no_match) => Ok(plain_text(
            StatusCode::INTERNAL_SERVER_ERROR,
            no_match.diagnostic(),
        )),
    }
}

/// Build the immutable request snapshot, reading the body exactly once.
pub(crate) async fn into_request(req: hyper::Request<Incoming>) -> Result<Request, String> {
    let (parts, body) = req.into_parts();

    let mut builder = Request::builder(parts.method.as_str(), parts.uri.path());
    if let Some(query) = parts.uri.query() {
        builder = builder.raw_query(query);
    }
    for (name, value) in &parts.headers {
        builder = builder.header(
            name.as_str(),
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
        );
    }

    let body = body
        .collect()
        .await
        .map(|c| c.to_bytes())
        .map_err(|e| format!("Failed to read request body: {e}"))?;

    Ok(builder.body(body).build())
}

/// Serialize a response definition, keeping repeated headers in order.
pub(crate) fn to_hyper(response: &ResponseDefinition) -> Response<Full<Bytes>> {
    let status = StatusCode::from_u16(response.status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = Response::builder().status(status);
    for (name, value) in response.headers().iter() {
        builder = builder.header(name, value);
    }
    builder
        .body(Full::new(response.body().clone()))
        .unwrap_or_else(|e| {
            plain_text(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Invalid stub response: {e}"),
            )
        })
}

fn plain_text(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body.into()));
    *response.status_mut() = status;
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    response
}
