// statsd-udp - An asynchronous Statsd client and server over UDP
//
// To the extent possible under law, the author(s) have dedicated all copyright and
// related and neighboring rights to this file to the public domain worldwide.
// This software is distributed without any warranty.
//
// You should have received a copy of the CC0 Public Domain Dedication along with this
// software. If not, see <http://creativecommons.org/publicdomain/zero/1.0/>.

// This example runs a Statsd server that prints every line it receives. The
// bind address is given as `host:port` and defaults to all interfaces on the
// standard Statsd port.

use statsd_udp::{DecodingHandler, EndpointConfig, EventKind, MetricResult, StatsdServer, TransportEvent};
use std::env;

#[tokio::main(flavor = "current_thread")]
async fn main() -> MetricResult<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let bind = env::args().nth(1).unwrap_or_else(|| "0.0.0.0:8125".to_owned());
    let config: EndpointConfig = bind.parse()?;

    let handler = DecodingHandler::new(|line, peer| {
        println!("{} {:>8} {:<2} {:?} from {}", line.key(), line.value(), line.unit(), line.rate(), peer);
    })
    .with_error_handler(|err| eprintln!("Bad datagram: {}", err));

    let mut server = StatsdServer::builder(config.host(), config.port())?
        .with_handler(handler)
        .with_observer(EventKind::SocketReady, |event| {
            if let TransportEvent::SocketReady { local_addr } = event {
                println!("Listening on {}", local_addr);
            }
        })
        .build();

    server.listen().await?;
    std::future::pending::<()>().await;
    Ok(())
}
