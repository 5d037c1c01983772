use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes, Incoming};
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioExecutor;
use hyper_util::rt::TokioIo;
use hyper_util::server::conn::auto::Builder;
use std::convert::Infallible;
use std::error::Error as StdError;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builds a plain-text response carrying the canonical reason of `status`.
pub fn make_boxed_error_response(status: StatusCode) -> Response<BoxBody<Bytes, Infallible>> {
    let reason = status.canonical_reason().unwrap_or("error");
    let mut response = Response::new(Full::new(Bytes::from(format!("{reason}\n"))).boxed());
    *response.status_mut() = status;
    response
}

/// Accepts connections on `host:port` forever, serving each one with `service`.
pub async fn run_http_service<S, B, E>(host: &str, port: u16, service: S) -> Result<(), E>
where
    S: Service<Request<Incoming>, Response = Response<B>> + Send + Sync + 'static,
    S::Future: Send + 'static,
    S::Error: Into<Box<dyn StdError + Send + Sync>>,
    B: Body + Send + 'static,
    B::Data: Send,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
    E: From<std::io::Error>,
{
    let listener = TcpListener::bind(format!("{host}:{port}")).await?;
    let service_arc = Arc::new(service);

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let _ = stream.set_nodelay(true);
        let io = TokioIo::new(stream);
        let svc = service_arc.clone();

        // Hand the connection to hyper; auto-detect h1/h2 on this socket
        tokio::spawn(async move {
            if let Err(e) = Builder::new(TokioExecutor::new())
                .serve_connection(io, svc)
                .await
            {
                tracing::debug!(%peer_addr, error = %e, "connection closed with error");
            }
        });
    }
}
