//! End-to-end behaviour of the composition root over the in-memory transport.

use std::sync::Arc;
use std::time::Duration;

use zombload::protocol::Intent;
use zombload::transport::{FakeConnector, FakeTransportController};
use zombload::{ChannelPhase, Credentials, MemoryMarker, Panel, PanelSnapshot, SchedulerRunState, SessionMarker, StaticAuth};

const WAIT: Duration = Duration::from_secs(2);

struct Harness {
	panel: Panel,
	connector: Arc<FakeConnector>,
	marker: MemoryMarker,
	auth: StaticAuth,
}

fn harness() -> Harness {
	harness_with(MemoryMarker::new())
}

fn harness_with(marker: MemoryMarker) -> Harness {
	let connector = Arc::new(FakeConnector::new().with_auto_connect());
	let auth = StaticAuth::new("admin", "admin");
	let panel = Panel::new(Arc::new(auth.clone()), Arc::new(marker.clone()), connector.clone());
	Harness {
		panel,
		connector,
		marker,
		auth,
	}
}

async fn wait_until(panel: &Panel, condition: impl FnMut(&PanelSnapshot) -> bool) -> PanelSnapshot {
	let mut updates = panel.subscribe();
	let snapshot = tokio::time::timeout(WAIT, updates.wait_for(condition))
		.await
		.expect("timed out waiting for panel state")
		.expect("supervisor dropped")
		.clone();
	snapshot
}

async fn collect_sent(controller: &FakeTransportController, expected: usize) -> Vec<Intent> {
	let mut sent = Vec::new();
	let deadline = tokio::time::Instant::now() + WAIT;
	while sent.len() < expected && tokio::time::Instant::now() < deadline {
		sent.extend(controller.take_sent().await);
		tokio::time::sleep(Duration::from_millis(5)).await;
	}
	sent
}

async fn settle() {
	tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn login_opens_channel_and_scheduler_status_is_reflected() {
	let Harness {
		mut panel, connector, ..
	} = harness();
	assert_eq!(panel.phase(), ChannelPhase::Unopened);

	panel.login("admin", "admin").await.unwrap();
	assert!(panel.is_authenticated());
	assert_eq!(connector.open_count(), 1);

	wait_until(&panel, |s| s.phase == ChannelPhase::Open).await;
	assert!(panel.snapshot().connected);

	connector.last().unwrap().inject_scheduler_status(true);
	let snapshot = wait_until(&panel, |s| s.scheduler == SchedulerRunState::Running).await;
	assert!(snapshot.scheduler.is_running());
}

#[tokio::test]
async fn log_buffer_keeps_last_hundred_lines() {
	let Harness {
		mut panel, connector, ..
	} = harness();
	panel.login("admin", "admin").await.unwrap();
	wait_until(&panel, |s| s.connected).await;

	let controller = connector.last().unwrap();
	for i in 0..150 {
		controller.inject_log(format!("L{i}"));
	}

	let snapshot = wait_until(&panel, |s| s.logs.last().map(String::as_str) == Some("L149")).await;
	let expected: Vec<String> = (50..150).map(|i| format!("L{i}")).collect();
	assert_eq!(snapshot.logs, expected);
}

#[tokio::test]
async fn request_start_does_not_flip_run_state() {
	let Harness {
		mut panel, connector, ..
	} = harness();
	panel.login("admin", "admin").await.unwrap();
	wait_until(&panel, |s| s.phase == ChannelPhase::Open).await;

	let before = panel.snapshot().scheduler;
	panel.request_start();
	panel.request_start();

	let sent = collect_sent(&connector.last().unwrap(), 2).await;
	assert_eq!(sent, [Intent::StartScheduler, Intent::StartScheduler]);
	assert_eq!(panel.snapshot().scheduler, before);
	assert_eq!(before, SchedulerRunState::Stopped);
}

#[tokio::test]
async fn logout_detaches_the_transport() {
	let Harness {
		mut panel, connector, ..
	} = harness();
	panel.login("admin", "admin").await.unwrap();
	wait_until(&panel, |s| s.phase == ChannelPhase::Open).await;
	let controller = connector.last().unwrap();

	panel.logout().await;
	settle().await;
	assert!(controller.is_closed());
	assert!(controller.driver_finished());

	// Nothing is listening any more, so late server traffic goes nowhere.
	controller.inject_scheduler_status(true);
	controller.inject_log("late");
	settle().await;

	let snapshot = panel.snapshot();
	assert_eq!(snapshot.phase, ChannelPhase::Closed);
	assert_eq!(snapshot.scheduler, SchedulerRunState::Stopped);
	assert!(snapshot.logs.is_empty());
}

#[tokio::test]
async fn logout_resets_derived_state() {
	let Harness {
		mut panel,
		connector,
		marker,
		auth,
	} = harness();
	panel.login("admin", "admin").await.unwrap();
	wait_until(&panel, |s| s.connected).await;

	let controller = connector.last().unwrap();
	controller.inject_scheduler_status(true);
	controller.inject_log("uploading video_01.mp4");
	controller.inject_stats(42.5, 61.0);
	wait_until(&panel, |s| s.metrics.is_some() && s.scheduler.is_running()).await;

	panel.logout().await;
	assert!(!panel.is_authenticated());
	assert_eq!(marker.get(), None);
	assert_eq!(auth.logout_calls(), 1);

	let snapshot = panel.snapshot();
	assert!(!snapshot.connected);
	assert!(snapshot.logs.is_empty());
	assert_eq!(snapshot.metrics, None);
	assert_eq!(snapshot.scheduler, SchedulerRunState::Stopped);

	// A second logout is a no-op for the channel.
	panel.logout().await;
	assert_eq!(panel.phase(), ChannelPhase::Closed);
	assert_eq!(connector.open_count(), 1);
}

#[tokio::test]
async fn stale_commands_write_nothing() {
	let Harness {
		mut panel, connector, ..
	} = harness();

	panel.request_start();
	assert_eq!(connector.open_count(), 0);

	panel.login("admin", "admin").await.unwrap();
	wait_until(&panel, |s| s.phase == ChannelPhase::Open).await;
	let controller = connector.last().unwrap();
	panel.logout().await;

	panel.request_stop();
	settle().await;
	assert!(controller.take_sent().await.is_empty());
	assert_eq!(panel.snapshot(), PanelSnapshot {
		phase: ChannelPhase::Closed,
		..Default::default()
	});
}

#[tokio::test]
async fn rejected_login_leaves_channel_untouched() {
	let Harness {
		mut panel,
		connector,
		marker,
		..
	} = harness();

	let err = panel.login("admin", "wrong").await.unwrap_err();
	assert!(err.is_auth_failure());
	assert!(err.to_string().starts_with("Login failed"));
	assert!(!panel.is_authenticated());
	assert_eq!(panel.phase(), ChannelPhase::Unopened);
	assert_eq!(connector.open_count(), 0);
	assert_eq!(marker.get(), None);
}

#[tokio::test]
async fn restored_session_opens_channel_with_stored_credentials() {
	let stored = SessionMarker::authenticated(&Credentials {
		cookie: Some("session=restored".to_string()),
	});
	let Harness {
		mut panel, connector, ..
	} = harness_with(MemoryMarker::with_marker(stored));

	assert!(panel.restore_session());
	assert_eq!(connector.open_count(), 1);
	let controller = connector.last().unwrap();
	assert_eq!(controller.credentials().cookie.as_deref(), Some("session=restored"));
	wait_until(&panel, |s| s.phase == ChannelPhase::Open).await;
}

#[tokio::test]
async fn relogin_after_logout_opens_fresh_channel() {
	let Harness {
		mut panel, connector, ..
	} = harness();

	for _ in 0..3 {
		panel.login("admin", "admin").await.unwrap();
		assert!(panel.phase().is_live());
		panel.logout().await;
		assert!(!panel.phase().is_live());
	}
	assert_eq!(connector.open_count(), 3);
	settle().await;
	assert!(connector.controllers().iter().all(FakeTransportController::is_closed));

	panel.login("admin", "admin").await.unwrap();
	wait_until(&panel, |s| s.phase == ChannelPhase::Open).await;
	let fresh = connector.last().unwrap();
	connector.controllers()[0].inject_scheduler_status(true);
	fresh.inject_log("fresh");
	let snapshot = wait_until(&panel, |s| !s.logs.is_empty()).await;
	assert_eq!(snapshot.logs, ["fresh"]);
	assert_eq!(snapshot.scheduler, SchedulerRunState::Stopped);
}

#[tokio::test]
async fn transport_disconnect_keeps_last_known_state() {
	let Harness {
		mut panel, connector, ..
	} = harness();
	panel.login("admin", "admin").await.unwrap();
	wait_until(&panel, |s| s.connected).await;

	let controller = connector.last().unwrap();
	controller.inject_scheduler_status(true);
	controller.inject_log("still here");
	controller.inject_disconnect();

	let snapshot = wait_until(&panel, |s| s.phase == ChannelPhase::Connecting).await;
	assert!(!snapshot.connected);
	assert!(snapshot.scheduler.is_running());
	assert_eq!(snapshot.logs, ["still here"]);

	panel.request_start();
	settle().await;
	assert!(controller.take_sent().await.is_empty());

	controller.inject_connect();
	wait_until(&panel, |s| s.phase == ChannelPhase::Open).await;
}
