//! End-to-end flows over the in-process bus.
//!
//! A test plays the controller: it subscribes to knob topics and publishes
//! gain broadcasts on the same [`InMemoryBus`] the bridge is attached to.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use gain_bridge::application::{
    BusClient, EventSink, GainCache, PublishError, RelayCounts, TransportError,
};
use gain_bridge::domain::{BridgeToUiMsg, BusConfig, BusMode, UiEvent, UiToBridgeMsg};
use gain_bridge::infrastructure::{BusLifecycle, InMemoryBus, RunningBridge};
use gain_core::{
    decode_knob_value, encode_gain_vector, AxisGroup, GainVector, InvalidIdentifierError,
    KnobUpdate,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<UiEvent>>,
}

impl RecordingSink {
    fn channels(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.channel.clone())
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: UiEvent) {
        self.events.lock().unwrap().push(event);
    }
}

struct Harness {
    bus: Arc<InMemoryBus>,
    bridge: RunningBridge,
    sink: Arc<RecordingSink>,
}

async fn harness() -> Harness {
    let bus = Arc::new(InMemoryBus::new());
    let sink = Arc::new(RecordingSink::default());
    let config = BusConfig {
        mode: BusMode::Memory,
        ..BusConfig::default()
    };
    let bridge = BusLifecycle::attach(
        &config,
        Arc::clone(&bus) as Arc<dyn BusClient>,
        None,
        Arc::new(GainCache::new()),
        Arc::clone(&sink) as Arc<dyn EventSink>,
    )
    .await
    .unwrap();
    Harness { bus, bridge, sink }
}

fn counts_for(bridge: &RunningBridge, group: AxisGroup) -> RelayCounts {
    bridge
        .relay_counts()
        .into_iter()
        .find(|(g, _)| *g == group)
        .map(|(_, c)| c)
        .unwrap_or_default()
}

/// Polls until the relay for `group` has finished with `n` messages.
async fn wait_for_processed(bridge: &RunningBridge, group: AxisGroup, n: u64) {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let c = counts_for(bridge, group);
            if c.applied + c.rejected >= n {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("relay did not process the broadcasts in time");
}

async fn broadcast(bus: &InMemoryBus, topic: &str, gains: &GainVector) {
    let payload = encode_gain_vector(gains).unwrap();
    bus.publish(topic, Bytes::from(payload)).await.unwrap();
}

fn uniform(v: f32) -> GainVector {
    GainVector {
        kp: [v; 3],
        ki: [v; 3],
        kd: [v; 3],
    }
}

// ── Flows ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_knob_publish_then_broadcast_round_trip() {
    // Arrange: the controller listens on the position/proportional/x topic.
    let Harness {
        bus,
        mut bridge,
        sink,
    } = harness().await;
    let mut controller = bus.subscribe("pid.gains.pos.p.x").await.unwrap();

    // Act 1: UI moves the knob.
    let topic = bridge
        .publisher()
        .publish(&KnobUpdate::new("posxp", 1.5))
        .await
        .unwrap();

    // Assert 1: exactly one message, carrying the value.
    assert_eq!(topic, "pid.gains.pos.p.x");
    let msg = controller.next().await.unwrap();
    assert_eq!(decode_knob_value(&msg.payload).unwrap(), 1.5);
    let extra = tokio::time::timeout(Duration::from_millis(100), controller.next()).await;
    assert!(extra.is_err(), "a single update must produce a single message");

    // Act 2: the controller echoes its new gains.
    bus.publish(
        "pid.gains.pos",
        Bytes::from_static(br#"{"kp":[1.5,0,0],"ki":[0,0,0],"kd":[0,0,0]}"#),
    )
    .await
    .unwrap();
    wait_for_processed(&bridge, AxisGroup::Position, 1).await;

    // Assert 2: cache and UI both see it.
    let expected = GainVector {
        kp: [1.5, 0.0, 0.0],
        ..GainVector::default()
    };
    assert_eq!(bridge.cache().get(AxisGroup::Position).await, expected);
    assert_eq!(sink.channels(), vec!["update:pos".to_string()]);

    bridge.shutdown().await;
}

#[tokio::test]
async fn test_unknown_group_is_reported_to_ui() {
    // Arrange
    let Harness { mut bridge, .. } = harness().await;
    let service = bridge.ui_service();

    // Act
    let reply = service
        .handle(UiToBridgeMsg::PublishKnob {
            knob: "xyz12".to_string(),
            value: 1.0,
        })
        .await;

    // Assert
    assert_eq!(
        reply,
        BridgeToUiMsg::PublishResult {
            knob: "xyz12".to_string(),
            success: false,
            topic: None,
            error: Some(InvalidIdentifierError::UnknownGroup("xyz".to_string()).to_string()),
        }
    );

    bridge.shutdown().await;
}

#[tokio::test]
async fn test_broadcast_missing_kd_leaves_cache_unchanged() {
    // Arrange: seed the attitude slot.
    let Harness {
        bus,
        mut bridge,
        sink,
    } = harness().await;
    let seeded = uniform(0.5);
    broadcast(&bus, "pid.gains.att", &seeded).await;
    wait_for_processed(&bridge, AxisGroup::Attitude, 1).await;

    // Act
    bus.publish(
        "pid.gains.att",
        Bytes::from_static(br#"{"kp":[9,9,9],"ki":[9,9,9]}"#),
    )
    .await
    .unwrap();
    wait_for_processed(&bridge, AxisGroup::Attitude, 2).await;

    // Assert
    assert_eq!(bridge.cache().get(AxisGroup::Attitude).await, seeded);
    assert_eq!(
        counts_for(&bridge, AxisGroup::Attitude),
        RelayCounts {
            received: 2,
            applied: 1,
            rejected: 1
        }
    );
    assert_eq!(sink.channels(), vec!["update:att".to_string()]);

    bridge.shutdown().await;
}

#[tokio::test]
async fn test_relay_keeps_running_after_garbage() {
    let Harness { bus, mut bridge, .. } = harness().await;

    for junk in [&b"not json"[..], b"{}", b"[1,2,3]", b"{\"kp\":[1,2]}"] {
        bus.publish("pid.gains.pos", Bytes::copy_from_slice(junk))
            .await
            .unwrap();
    }
    broadcast(&bus, "pid.gains.pos", &uniform(3.0)).await;
    wait_for_processed(&bridge, AxisGroup::Position, 5).await;

    assert_eq!(bridge.cache().get(AxisGroup::Position).await, uniform(3.0));
    assert_eq!(counts_for(&bridge, AxisGroup::Position).rejected, 4);

    bridge.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_interleaved_broadcasts_update_independent_slots() {
    // Arrange
    let Harness { bus, mut bridge, .. } = harness().await;
    const N: u64 = 40;

    // Act: both groups broadcast concurrently.
    let pos_bus = Arc::clone(&bus);
    let pos = tokio::spawn(async move {
        for i in 0..N {
            broadcast(&pos_bus, "pid.gains.pos", &uniform(i as f32)).await;
            tokio::task::yield_now().await;
        }
    });
    let att_bus = Arc::clone(&bus);
    let att = tokio::spawn(async move {
        for i in 0..N {
            broadcast(&att_bus, "pid.gains.att", &uniform(1000.0 + i as f32)).await;
            tokio::task::yield_now().await;
        }
    });
    pos.await.unwrap();
    att.await.unwrap();
    wait_for_processed(&bridge, AxisGroup::Position, N).await;
    wait_for_processed(&bridge, AxisGroup::Attitude, N).await;

    // Assert: each slot holds the last value of its own sequence.
    assert_eq!(
        bridge.cache().get(AxisGroup::Position).await,
        uniform((N - 1) as f32)
    );
    assert_eq!(
        bridge.cache().get(AxisGroup::Attitude).await,
        uniform(1000.0 + (N - 1) as f32)
    );

    bridge.shutdown().await;
}

#[tokio::test]
async fn test_get_gains_reflects_latest_broadcasts() {
    let Harness { bus, mut bridge, .. } = harness().await;
    broadcast(&bus, "pid.gains.pos", &uniform(1.0)).await;
    broadcast(&bus, "pid.gains.att", &uniform(2.0)).await;
    wait_for_processed(&bridge, AxisGroup::Position, 1).await;
    wait_for_processed(&bridge, AxisGroup::Attitude, 1).await;

    let reply = bridge.ui_service().handle_text(r#"{"type":"GetGains"}"#).await;

    assert_eq!(
        reply,
        BridgeToUiMsg::Gains {
            pos: uniform(1.0),
            att: uniform(2.0),
        }
    );
    bridge.shutdown().await;
}

#[tokio::test]
async fn test_publish_after_shutdown_is_transport_error() {
    // Arrange
    let Harness { mut bridge, .. } = harness().await;
    let publisher = Arc::clone(bridge.publisher());

    // Act
    bridge.shutdown().await;
    bridge.shutdown().await;
    let result = publisher.publish(&KnobUpdate::new("attyd", 0.1)).await;

    // Assert
    assert!(matches!(
        result,
        Err(PublishError::Transport(TransportError::Closed))
    ));
    assert!(!bridge.is_running());
}
