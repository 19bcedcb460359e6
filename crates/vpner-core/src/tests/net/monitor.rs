use crate::{CommandRunner, MonitorOptions, Networksetup, VpnEvent, VpnMonitor, tests::FakeRunner};

use std::{sync::Arc, time::Duration};

use tokio::sync::broadcast;

const STATUS: &str = "-showpppoestatus";
const CONNECT: &str = "-connectpppoeservice";
const DISCONNECT: &str = "-disconnectpppoeservice";

fn monitor_over(runner: &Arc<FakeRunner>, options: MonitorOptions) -> VpnMonitor {
    let runner: Arc<dyn CommandRunner> = Arc::<FakeRunner>::clone(runner);
    VpnMonitor::new(Networksetup::new(runner), options)
}

/// Options with a long poll interval so only explicitly triggered checks run.
fn manual_poll() -> MonitorOptions {
    MonitorOptions {
        poll_interval: Duration::from_secs(3600),
        settle_delay: Duration::from_millis(10),
    }
}

/// Options with a fast poll interval for observing the periodic loop.
fn fast_poll() -> MonitorOptions {
    MonitorOptions {
        poll_interval: Duration::from_millis(10),
        settle_delay: Duration::from_millis(10),
    }
}

fn drain(rx: &mut broadcast::Receiver<VpnEvent>) -> Vec<VpnEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// WHAT: Repeated polls of an unchanged state emit exactly one notification
/// WHY: The contract is edge-triggered; level-triggered polling would churn
///      the UI on every interval
#[tokio::test]
async fn given_stable_connected_state_when_polling_repeatedly_then_single_notification() {
    // Given: A tool that always reports connected, polled every 10ms
    let runner = Arc::new(FakeRunner::new());
    runner.push_response(STATUS, "connected\n");
    let monitor = monitor_over(&runner, fast_poll());
    let mut events = monitor.subscribe();

    // When: Selecting a service and letting several polls fire
    monitor.select(Some("Office VPN".to_string())).await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Then: Several checks ran but only the transition was notified
    assert!(runner.call_count(STATUS) > 2);
    assert_eq!(drain(&mut events), vec![VpnEvent::StatusChanged(true)]);
}

/// WHAT: Each boolean transition emits exactly one notification
/// WHY: Subscribers must see connect and disconnect edges, nothing more
#[tokio::test]
async fn given_state_transitions_when_polling_then_one_event_per_edge() {
    // Given: Status reads disconnected, then connected, then disconnected
    let runner = Arc::new(FakeRunner::new());
    runner.push_response(STATUS, "disconnected\n");
    runner.push_response(STATUS, "connected\n");
    runner.push_response(STATUS, "disconnected\n");
    let monitor = monitor_over(&runner, manual_poll());
    let mut events = monitor.subscribe();

    // When: Selecting (one immediate check) and checking twice more
    monitor.select(Some("Office VPN".to_string())).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    monitor.check_now().await;
    monitor.check_now().await;

    // Then: One event per transition, in order
    assert_eq!(
        drain(&mut events),
        vec![VpnEvent::StatusChanged(true), VpnEvent::StatusChanged(false)]
    );
}

/// WHAT: Selecting a service triggers one immediate check before the interval
/// WHY: The menu should reflect reality right after selection, not a minute
///      later
#[tokio::test]
async fn given_selection_when_made_then_immediate_status_check() {
    // Given: A monitor whose interval never fires during the test
    let runner = Arc::new(FakeRunner::new());
    runner.push_response(STATUS, "disconnected\n");
    let monitor = monitor_over(&runner, manual_poll());

    // When: Selecting a service
    monitor.select(Some("Office VPN".to_string())).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Then: Exactly one check ran
    assert_eq!(runner.call_count(STATUS), 1);
}

/// WHAT: Re-selecting the already-selected service restarts the sequence
/// WHY: Selection doubles as "refresh now"; the restart is deliberate
#[tokio::test]
async fn given_same_service_when_reselected_then_one_more_immediate_check() {
    // Given: A selected service that stays connected
    let runner = Arc::new(FakeRunner::new());
    runner.push_response(STATUS, "connected\n");
    let monitor = monitor_over(&runner, manual_poll());
    let mut events = monitor.subscribe();

    monitor.select(Some("Office VPN".to_string())).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    // When: Re-selecting the same service
    monitor.select(Some("Office VPN".to_string())).await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Then: Exactly one additional check, and no second notification since
    // the boolean never changed
    assert_eq!(runner.call_count(STATUS), 2);
    assert_eq!(drain(&mut events), vec![VpnEvent::StatusChanged(true)]);
}

/// WHAT: Clearing the selection stops periodic checks and resets the state
/// WHY: No service selected means nothing to poll and nothing to notify
#[tokio::test]
async fn given_active_polling_when_selection_cleared_then_no_further_checks() {
    // Given: Fast polling against an always-connected tool
    let runner = Arc::new(FakeRunner::new());
    runner.push_response(STATUS, "connected\n");
    let monitor = monitor_over(&runner, fast_poll());
    let mut events = monitor.subscribe();

    monitor.select(Some("Office VPN".to_string())).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    let _ = drain(&mut events);

    // When: Clearing the selection and waiting past several would-be intervals
    monitor.select(None).await;
    let checks_at_clear = runner.call_count(STATUS);
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Then: No further checks, no notification, state reads disconnected
    assert_eq!(runner.call_count(STATUS), checks_at_clear);
    assert!(drain(&mut events).is_empty());
    let state = monitor.state().await;
    assert_eq!(state.selected, None);
    assert!(!state.connected);
}

/// WHAT: Connect runs the tool, flips the connecting flag, then re-checks
/// WHY: The transient flag and the settle-delay re-check are the whole
///      contract of the connect adapter
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_selection_when_connecting_then_flag_toggles_and_status_rechecked() {
    // Given: A selected, initially disconnected service
    let runner = Arc::new(FakeRunner::new());
    runner.push_response(STATUS, "disconnected\n");
    runner.push_response(STATUS, "connected\n");
    let monitor = monitor_over(&runner, manual_poll());
    let mut events = monitor.subscribe();

    monitor.select(Some("Office VPN".to_string())).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    let _ = drain(&mut events);

    // When: Connecting
    monitor.connect().await;
    assert!(monitor.state().await.connecting);
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Then: The connect subcommand ran with the service name, the flag
    // cleared, and the re-check notified the new state
    assert_eq!(runner.call_count(CONNECT), 1);
    let connect_call = runner
        .calls()
        .into_iter()
        .find(|args| args.first().map(String::as_str) == Some(CONNECT))
        .unwrap();
    assert_eq!(connect_call, vec![CONNECT, "Office VPN"]);

    assert!(!monitor.state().await.connecting);
    assert_eq!(
        drain(&mut events),
        vec![
            VpnEvent::ConnectingChanged(true),
            VpnEvent::ConnectingChanged(false),
            VpnEvent::StatusChanged(true),
        ]
    );
}

/// WHAT: Disconnect runs the tool and re-checks after the settle delay
/// WHY: Mirrors the connect flow without the transient flag
#[tokio::test]
async fn given_connected_service_when_disconnecting_then_status_rechecked() {
    // Given: A selected, connected service
    let runner = Arc::new(FakeRunner::new());
    runner.push_response(STATUS, "connected\n");
    runner.push_response(STATUS, "disconnected\n");
    let monitor = monitor_over(&runner, manual_poll());
    let mut events = monitor.subscribe();

    monitor.select(Some("Office VPN".to_string())).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    let _ = drain(&mut events);

    // When: Disconnecting
    monitor.disconnect().await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Then: The tool ran and the transition was notified
    assert_eq!(runner.call_count(DISCONNECT), 1);
    assert!(!monitor.state().await.connecting);
    assert_eq!(drain(&mut events), vec![VpnEvent::StatusChanged(false)]);
}

/// WHAT: Connect and disconnect are no-ops without a selection
/// WHY: There is no service to pass to the tool
#[tokio::test]
async fn given_no_selection_when_connecting_then_nothing_happens() {
    // Given: A monitor with no selection
    let runner = Arc::new(FakeRunner::new());
    let monitor = monitor_over(&runner, manual_poll());

    // When: Connecting and disconnecting
    monitor.connect().await;
    monitor.disconnect().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Then: The tool never ran
    assert!(runner.calls().is_empty());
}

/// WHAT: A failing status subprocess reads as disconnected
/// WHY: Fail-soft degradation is the documented error contract
#[tokio::test]
async fn given_failing_tool_when_checking_status_then_treated_as_disconnected() {
    // Given: A connected service whose status tool then starts failing
    let runner = Arc::new(FakeRunner::new());
    runner.push_response(STATUS, "connected\n");
    let monitor = monitor_over(&runner, manual_poll());
    let mut events = monitor.subscribe();

    monitor.select(Some("Office VPN".to_string())).await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    let _ = drain(&mut events);

    // When: The tool fails on the next check
    runner.fail_subcommand(STATUS);
    monitor.check_now().await;

    // Then: The state degrades to disconnected with one notification
    assert!(!monitor.state().await.connected);
    assert_eq!(drain(&mut events), vec![VpnEvent::StatusChanged(false)]);
}

/// WHAT: Enumeration failure degrades to an empty service list
/// WHY: Tool failure must never surface beyond "no services"
#[tokio::test]
async fn given_failing_tool_when_loading_services_then_empty_list() {
    // Given: A runner where enumeration cannot spawn
    let runner = Arc::new(FakeRunner::new());
    runner.fail_subcommand("-listallnetworkservices");
    let monitor = monitor_over(&runner, manual_poll());

    // When: Loading services
    let services = monitor.load_services().await;

    // Then: Empty list, no panic, no error surfaced
    assert!(services.is_empty());
}
