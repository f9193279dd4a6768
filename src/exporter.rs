//! `/metrics` scrape endpoint.

use std::convert::Infallible;
use std::net::SocketAddr;

use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::AddrIncoming;
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use tokio::sync::watch;

use crate::error::ExporterError;
use crate::sink::PrometheusSink;

/// Default listen address for the scrape endpoint.
pub const DEFAULT_LISTEN: &str = "0.0.0.0:2112";

const CONTENT_TYPE_TEXT: &str = "text/plain; version=0.0.4";

/// HTTP server exposing a [`PrometheusSink`] in text format.
pub struct MetricsExporter {
    incoming: AddrIncoming,
    sink: PrometheusSink,
}

impl std::fmt::Debug for MetricsExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsExporter")
            .field("addr", &self.local_addr())
            .finish_non_exhaustive()
    }
}

impl MetricsExporter {
    /// Bind the listening socket. Must be called inside a tokio runtime.
    pub fn bind(addr: SocketAddr, sink: PrometheusSink) -> Result<Self, ExporterError> {
        let incoming = AddrIncoming::bind(&addr).map_err(ExporterError::Bind)?;
        Ok(Self { incoming, sink })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.incoming.local_addr()
    }

    /// Serve scrapes until `shutdown` flips to `true` or its sender is dropped.
    pub async fn serve(self, mut shutdown: watch::Receiver<bool>) -> Result<(), ExporterError> {
        let addr = self.local_addr();
        let sink = self.sink;

        let make_svc = make_service_fn(move |_conn| {
            let sink = sink.clone();
            async move {
                Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                    let response = respond(&sink, &req);
                    async move { Ok::<_, Infallible>(response) }
                }))
            }
        });

        tracing::info!(%addr, "Metrics endpoint listening");

        Server::builder(self.incoming)
            .serve(make_svc)
            .with_graceful_shutdown(async move {
                let _ = shutdown.wait_for(|stop| *stop).await;
            })
            .await
            .map_err(ExporterError::Serve)?;

        tracing::info!(%addr, "Metrics endpoint stopped");
        Ok(())
    }
}

fn respond(sink: &PrometheusSink, req: &Request<Body>) -> Response<Body> {
    if req.method() != Method::GET || req.uri().path() != "/metrics" {
        return plain(StatusCode::NOT_FOUND, "Not Found");
    }

    match sink.render() {
        Ok(text) => {
            let mut resp = Response::new(Body::from(text));
            resp.headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_TEXT));
            resp
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to render metrics");
            plain(StatusCode::INTERNAL_SERVER_ERROR, "metrics unavailable")
        }
    }
}

fn plain(status: StatusCode, body: &'static str) -> Response<Body> {
    let mut resp = Response::new(Body::from(body));
    *resp.status_mut() = status;
    resp
}
