use crate::http::make_boxed_error_response;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::service::Service;
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;

/// Serves `/health` and `/ready` on the admin listener.
pub struct AdminService<F> {
    is_ready: F,
}

impl<F> AdminService<F>
where
    F: Fn() -> bool,
{
    pub fn new(is_ready: F) -> Self {
        Self { is_ready }
    }
}

impl<F, B> Service<Request<B>> for AdminService<F>
where
    F: Fn() -> bool + Send + Sync + 'static,
{
    type Response = Response<BoxBody<Bytes, Infallible>>;
    type Error = Infallible;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<B>) -> Self::Future {
        let is_ready = (self.is_ready)();
        let path = req.uri().path().to_owned();

        Box::pin(async move {
            let ok_body = || Full::new(Bytes::from("ok\n")).boxed();

            let res = match path.as_str() {
                "/health" => Response::new(ok_body()),
                "/ready" => match is_ready {
                    true => Response::new(ok_body()),
                    false => make_boxed_error_response(StatusCode::SERVICE_UNAVAILABLE),
                },
                _ => make_boxed_error_response(StatusCode::NOT_FOUND),
            };
            Ok(res)
        })
    }
}
