//! Turns a [`relaygate_core::RouterResponse`] into the axum `Response` sent
//! to the client.

use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use futures_util::StreamExt;
use relaygate_core::RouterResponse;

pub fn build_response(response: RouterResponse) -> Response {
    match response {
        RouterResponse::Json(value) => (StatusCode::OK, Json(value)).into_response(),
        RouterResponse::Stream(stream) => build_sse_response(stream),
    }
}

fn build_sse_response(
    stream: std::pin::Pin<Box<dyn futures_util::Stream<Item = Result<Bytes, relaygate_provider_impl::PumpError>> + Send>>,
) -> Response {
    let body_stream = stream.map(|item| match item {
        Ok(bytes) => Ok(bytes),
        Err(err) => {
            // Headers (and likely some body) are already on the wire; the
            // client just sees the stream end here. No message_stop follows.
            tracing::error!(event = "stream_error", error = %err, "upstream stream failed mid-response");
            Ok::<Bytes, std::io::Error>(Bytes::new())
        }
    });

    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "text/event-stream")
        .header("cache-control", "no-cache")
        .header("x-accel-buffering", "no")
        .body(Body::from_stream(body_stream))
        .expect("a static set of header values always builds a valid response")
}
