use crossbeam_channel::unbounded;
use statsd_udp::{
    DecodingHandler, ErrorKind, EventKind, MetricUnit, ServerState, SpyDatagramHandler, StatsdClient, StatsdServer,
    TransportEvent,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::UdpSocket;

mod utils;
use utils::{assert_no_more, init_logging, new_spy_server, recv_next};

#[tokio::test]
async fn test_statsd_server_receives_client_datagram_once() {
    init_logging();

    let (rx, handler) = SpyDatagramHandler::new();
    let mut server = StatsdServer::builder("0.0.0.0", 9999)
        .unwrap()
        .with_handler(handler)
        .build();
    server.listen().await.unwrap();

    let mut client = StatsdClient::new("127.0.0.1", 9999).unwrap();
    let client_addr = client.connect().await.unwrap();
    client.timing("some.task", 133).await.unwrap();

    let datagram = recv_next(&rx).await;
    assert_eq!(b"some.task:133|ms".to_vec(), datagram.payload);
    assert_eq!(client_addr.port(), datagram.peer.port());
    assert_no_more(&rx).await;

    let stats = server.stats();
    assert_eq!(1, stats.packets_received);
    assert_eq!(16, stats.bytes_received);
}

#[tokio::test]
async fn test_statsd_server_bind_in_use() {
    let blocker = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
    let port = blocker.local_addr().unwrap().port();

    let mut server = StatsdServer::new("127.0.0.1", port).unwrap();
    let res = server.listen().await;

    assert_eq!(ErrorKind::BindError, res.unwrap_err().kind());
    assert_eq!(ServerState::Unbound, server.state());
    assert_eq!(None, server.local_addr());

    drop(blocker);
    let addr = server.listen().await.unwrap();
    assert_eq!(port, addr.port());
    assert_eq!(ServerState::Listening, server.state());
}

#[tokio::test]
async fn test_statsd_server_passes_raw_payload() {
    let (_server, rx, addr) = new_spy_server().await;
    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let sender_addr = sender.local_addr().unwrap();

    sender.send_to(b"not a statsd line\n\xff", addr).await.unwrap();

    let datagram = recv_next(&rx).await;
    assert_eq!(b"not a statsd line\n\xff".to_vec(), datagram.payload);
    assert_eq!(sender_addr, datagram.peer);
}

#[tokio::test]
async fn test_statsd_server_decoding_handler() {
    let (line_tx, line_rx) = unbounded();
    let (err_tx, err_rx) = unbounded();

    let handler = DecodingHandler::new(move |line, peer| {
        let _ = line_tx.send((line, peer));
    })
    .with_error_handler(move |err| {
        let _ = err_tx.send(err.kind());
    });

    let mut server = StatsdServer::ephemeral("127.0.0.1")
        .unwrap()
        .with_handler(handler)
        .build();
    let addr = server.listen().await.unwrap();

    let mut client = StatsdClient::new("127.0.0.1", addr.port()).unwrap();
    client.connect().await.unwrap();
    client.gauge("some.gauge", 80).await.unwrap();

    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    sender.send_to(b"some.gauge:eighty|g", addr).await.unwrap();

    let (line, _peer) = recv_next(&line_rx).await;
    assert_eq!("some.gauge", line.key());
    assert_eq!(80, line.value());
    assert_eq!(MetricUnit::Gauge, line.unit());
    assert_eq!(None, line.rate());

    assert_eq!(ErrorKind::InvalidInput, recv_next(&err_rx).await);
}

#[tokio::test]
async fn test_statsd_server_observers_after_handler() {
    let (rx, handler) = SpyDatagramHandler::new();
    let observed = Arc::new(AtomicUsize::new(0));
    let ready = Arc::new(AtomicUsize::new(0));
    let observed_ref = Arc::clone(&observed);
    let ready_ref = Arc::clone(&ready);

    let mut server = StatsdServer::ephemeral("127.0.0.1")
        .unwrap()
        .with_handler(handler)
        .with_observer(EventKind::Datagram, move |event| {
            if let TransportEvent::Datagram { payload, .. } = event {
                observed_ref.fetch_add(payload.len(), Ordering::SeqCst);
            }
        })
        .with_observer(EventKind::SocketReady, move |_| {
            ready_ref.fetch_add(1, Ordering::SeqCst);
        })
        .build();

    let addr = server.listen().await.unwrap();
    assert_eq!(1, ready.load(Ordering::SeqCst));

    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    sender.send_to(b"k:1|c", addr).await.unwrap();

    // The handler runs first so the observer has run once it's seen.
    recv_next(&rx).await;
    for _ in 0..100 {
        if observed.load(Ordering::SeqCst) > 0 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }
    assert_eq!(5, observed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_statsd_server_close_stops_receiving() {
    let (mut server, rx, addr) = new_spy_server().await;
    server.close();
    assert_eq!(ServerState::Closed, server.state());

    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    // The port may be unreachable now, which is fine.
    let _ = sender.send_to(b"k:1|c", addr).await;

    assert_no_more(&rx).await;
}
