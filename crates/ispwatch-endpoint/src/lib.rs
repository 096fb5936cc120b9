// # Passive Address Endpoint
//
// `GET /HTTP/GetIp` answers with the caller's address as plain text, so an
// ispwatch instance can serve as the primary source for another one.
//
// - The first non-empty `X-Forwarded-For` hop wins over the socket peer
// - IPv4-mapped IPv6 addresses are reported as IPv4
// - Every call increments the endpoint counter
// - Logged addresses are masked

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::Router;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::routing::get;
use ispwatch_core::CounterStore;
use tokio::net::TcpListener;

/// Route served by the endpoint
pub const GET_IP_PATH: &str = "/HTTP/GetIp";

const FORWARDED_FOR: &str = "x-forwarded-for";

/// Build the endpoint router
pub fn router(counters: Arc<CounterStore>) -> Router {
    Router::new()
        .route(GET_IP_PATH, get(get_ip))
        .with_state(counters)
}

/// Serve the endpoint on `listener` until `shutdown` resolves
pub async fn serve<F>(
    listener: TcpListener,
    counters: Arc<CounterStore>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Address endpoint listening on {}", addr);
    }

    axum::serve(
        listener,
        router(counters).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}

async fn get_ip(
    State(counters): State<Arc<CounterStore>>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> String {
    let hits = counters.increment_endpoint_hits();
    let address = caller_address(&headers, remote);

    tracing::info!("Endpoint call {} from {}", hits, mask_address(&address));
    address
}

/// Resolve the address to report back to the caller
pub fn caller_address(headers: &HeaderMap, remote: SocketAddr) -> String {
    let forwarded = headers
        .get(FORWARDED_FOR)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').map(str::trim).find(|hop| !hop.is_empty()));

    match forwarded {
        Some(hop) => match hop.parse::<IpAddr>() {
            Ok(ip) => ip.to_canonical().to_string(),
            Err(_) => hop.to_string(),
        },
        None => remote.ip().to_canonical().to_string(),
    }
}

/// Keep everything up to the last separator, hide the rest
pub fn mask_address(address: &str) -> String {
    match address.rfind(['.', ':']) {
        Some(index) => format!("{}xxx", &address[..=index]),
        None => "xxx".to_string(),
    }
}
