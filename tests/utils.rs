use crossbeam_channel::Receiver;
use statsd_udp::{Datagram, StatsdServer};
use std::net::SocketAddr;
use std::time::Duration;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);
const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[allow(dead_code)]
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Wait for the next value on a channel without blocking the runtime the
/// receive tasks are running on.
#[allow(dead_code)]
pub async fn recv_next<T>(rx: &Receiver<T>) -> T {
    let poll = async {
        loop {
            if let Ok(v) = rx.try_recv() {
                return v;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    };

    tokio::time::timeout(RECV_TIMEOUT, poll)
        .await
        .expect("timed out waiting for datagram")
}

/// Assert nothing else arrives on a channel within a short window.
#[allow(dead_code)]
pub async fn assert_no_more<T: std::fmt::Debug>(rx: &Receiver<T>) {
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(rx.try_recv().is_err(), "unexpected extra value on channel");
}

/// Start a server on an OS assigned port that forwards every datagram to
/// the returned channel.
#[allow(dead_code)]
pub async fn new_spy_server() -> (StatsdServer, Receiver<Datagram>, SocketAddr) {
    let (rx, handler) = statsd_udp::SpyDatagramHandler::new();
    let mut server = StatsdServer::ephemeral("127.0.0.1")
        .unwrap()
        .with_handler(handler)
        .build();

    let addr = server.listen().await.unwrap();
    (server, rx, addr)
}
