// statsd-udp - An asynchronous Statsd client and server over UDP
//
// To the extent possible under law, the author(s) have dedicated all copyright and
// related and neighboring rights to this file to the public domain worldwide.
// This software is distributed without any warranty.
//
// You should have received a copy of the CC0 Public Domain Dedication along with this
// software. If not, see <http://creativecommons.org/publicdomain/zero/1.0/>.

// This example sends a few metrics of each kind to a Statsd server. The
// destination is given as `host:port` and defaults to a local server. Run
// the `listen` example in another terminal to see them arrive.

use statsd_udp::{EndpointConfig, MetricKind, MetricResult, StatsdClient};
use std::env;
use std::time::Duration;

#[tokio::main(flavor = "current_thread")]
async fn main() -> MetricResult<()> {
    tracing_subscriber::fmt().with_max_level(tracing::Level::TRACE).init();

    let target = env::args().nth(1).unwrap_or_else(|| "127.0.0.1:8125".to_owned());
    let config: EndpointConfig = target.parse()?;

    let mut client = StatsdClient::builder(config.host(), config.port())?
        .with_prefix("example")
        .build();

    let local = client.connect().await?;
    println!("Sending from {} to {}", local, config);

    client.timing("some.task", 133.7).await?;
    client.timing("some.request", Duration::from_millis(250)).await?;
    client.gauge("some.gauge", 80).await?;
    client.count("some.count", 12).await?;
    client.incr("some.counter").await?;
    client.decr("some.counter").await?;

    let mut sent = 0;
    for _ in 0..100 {
        if client
            .send_metric("some.sampled", 1, MetricKind::Count, Some(0.1))
            .await?
            .is_some()
        {
            sent += 1;
        }
    }

    println!("Sent {} of 100 sampled counters", sent);
    println!("{:?}", client.stats());

    client.close();
    Ok(())
}
