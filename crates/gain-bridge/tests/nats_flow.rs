//! End-to-end flows over a real `nats-server`.
//!
//! The bridge spawns its own server on a free port; the test connects a
//! second `async-nats` client that plays the controller.
//!
//! Requires `nats-server` on `PATH`.  Run with:
//! `cargo test -p gain-bridge --test nats_flow -- --ignored`

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::StreamExt;
use gain_bridge::application::{
    EventSink, GainCache, PublishError, RelayCounts, TransportError,
};
use gain_bridge::domain::{BusConfig, BusMode, UiEvent};
use gain_bridge::infrastructure::{BusLifecycle, RunningBridge};
use gain_core::{decode_knob_value, encode_gain_vector, AxisGroup, GainVector, KnobUpdate};

const WAIT: Duration = Duration::from_secs(3);

// ── Helpers ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<UiEvent>>,
}

impl EventSink for RecordingSink {
    fn emit(&self, event: UiEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn free_port_config(flush_on_publish: bool) -> BusConfig {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    BusConfig {
        mode: BusMode::Nats,
        addr,
        spawn_server: true,
        flush_on_publish,
        ..BusConfig::default()
    }
}

/// Starts the bridge (and its server) and connects a controller client.
async fn start(
    flush_on_publish: bool,
) -> (RunningBridge, async_nats::Client, Arc<RecordingSink>) {
    let config = free_port_config(flush_on_publish);
    let sink = Arc::new(RecordingSink::default());
    let bridge = BusLifecycle::start(
        &config,
        Arc::new(GainCache::new()),
        Arc::clone(&sink) as Arc<dyn EventSink>,
    )
    .await
    .expect("bridge must start with nats-server on PATH");
    let url = config.url();
    let controller = async_nats::connect(url.as_str()).await.unwrap();
    (bridge, controller, sink)
}

fn counts_for(bridge: &RunningBridge, group: AxisGroup) -> RelayCounts {
    bridge
        .relay_counts()
        .into_iter()
        .find(|(g, _)| *g == group)
        .map(|(_, c)| c)
        .unwrap_or_default()
}

// ── Flows ─────────────────────────────────────────────────────────────────────

#[tokio::test]
#[ignore = "requires nats-server on PATH"]
async fn test_knob_publish_reaches_controller_once() {
    // Arrange
    let (mut bridge, controller, _sink) = start(true).await;
    let mut sub = controller.subscribe("pid.gains.pos.p.x").await.unwrap();
    controller.flush().await.unwrap();

    // Act
    let topic = bridge
        .publisher()
        .publish(&KnobUpdate::new("posxp", 1.5))
        .await
        .unwrap();

    // Assert
    assert_eq!(topic, "pid.gains.pos.p.x");
    let msg = tokio::time::timeout(WAIT, sub.next())
        .await
        .expect("controller must receive the knob value")
        .unwrap();
    assert_eq!(msg.subject.as_str(), "pid.gains.pos.p.x");
    assert_eq!(decode_knob_value(&msg.payload).unwrap(), 1.5);
    let extra = tokio::time::timeout(Duration::from_millis(200), sub.next()).await;
    assert!(extra.is_err(), "a single update must produce a single message");

    bridge.shutdown().await;
}

#[tokio::test]
#[ignore = "requires nats-server on PATH"]
async fn test_controller_broadcast_updates_cache_and_ui() {
    // Arrange
    let (mut bridge, controller, sink) = start(true).await;
    let gains = GainVector {
        kp: [1.5, 0.0, 0.0],
        ki: [0.1, 0.1, 0.1],
        kd: [0.0, 0.0, 0.2],
    };
    let payload = encode_gain_vector(&gains).unwrap();

    // Act: garbage first, then repeat the real broadcast until the relay's
    // subscription is live on the server.
    controller
        .publish("pid.gains.pos", "not json".into())
        .await
        .unwrap();
    tokio::time::timeout(WAIT, async {
        loop {
            controller
                .publish("pid.gains.pos", payload.clone().into())
                .await
                .unwrap();
            controller.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            if counts_for(&bridge, AxisGroup::Position).applied >= 1 {
                break;
            }
        }
    })
    .await
    .expect("relay did not apply the broadcast in time");

    // Assert
    assert_eq!(bridge.cache().get(AxisGroup::Position).await, gains);
    assert_eq!(
        bridge.cache().get(AxisGroup::Attitude).await,
        GainVector::default()
    );
    assert!(sink
        .events
        .lock()
        .unwrap()
        .iter()
        .all(|e| e.channel == "update:pos"));

    bridge.shutdown().await;
}

#[tokio::test]
#[ignore = "requires nats-server on PATH"]
async fn test_unflushed_publish_is_delivered_on_shutdown() {
    // Arrange: per-publish flushing is off.
    let (mut bridge, controller, _sink) = start(false).await;
    let mut sub = controller.subscribe("pid.gains.att.d.y").await.unwrap();
    controller.flush().await.unwrap();

    // Act: publish and shut down straight away.
    bridge
        .publisher()
        .publish(&KnobUpdate::new("attyd", 0.25))
        .await
        .unwrap();
    bridge.shutdown().await;

    // Assert
    let msg = tokio::time::timeout(WAIT, sub.next())
        .await
        .expect("the queued value must be flushed before the connection closes")
        .unwrap();
    assert_eq!(decode_knob_value(&msg.payload).unwrap(), 0.25);
}

#[tokio::test]
#[ignore = "requires nats-server on PATH"]
async fn test_publish_after_shutdown_is_closed() {
    // Arrange
    let (mut bridge, _controller, _sink) = start(true).await;
    let publisher = Arc::clone(bridge.publisher());

    // Act
    bridge.shutdown().await;
    let result = publisher.publish(&KnobUpdate::new("posxp", 1.0)).await;

    // Assert
    assert!(matches!(
        result,
        Err(PublishError::Transport(TransportError::Closed))
    ));
    assert!(!bridge.is_running());
}
