use std::time::Duration;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use waypoint::app::{App, Mode};
use waypoint::core::config::{self, CliOverrides, ResolvedConfig, WaypointConfig};
use waypoint::core::{Event, Failure, FailureKind, Outcome, State, StateContainer, Strategy, UseCase};
use waypoint::features::auth::{self, AppSnapshot};
use waypoint::navigation::{Decision, GuardRule, Location, Navigator, RouteTable};
use waypoint::presentation::map_failure;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

// ============================================================================
// Helper Functions
// ============================================================================

fn online_config(server: &MockServer, cache_dir: &std::path::Path) -> ResolvedConfig {
    let mut resolved = config::resolve(
        &WaypointConfig::default(),
        &CliOverrides {
            base_url: Some(server.uri()),
            log_level: None,
        },
    );
    resolved.cache_dir = cache_dir.to_path_buf();
    resolved.retry_attempts = 1;
    resolved
}

async fn mount_user(server: &MockServer, id: &str, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(format!("/users/{id}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "id": id, "display_name": id.to_uppercase() }))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Sleeps for the given number of milliseconds, then returns the index.
struct Latency;

#[async_trait]
impl UseCase for Latency {
    type Input = (usize, u64);
    type Output = usize;

    fn name(&self) -> &str {
        "latency"
    }

    async fn execute(&self, (index, delay_ms): (usize, u64)) -> Outcome<usize> {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        Ok(index)
    }
}

// ============================================================================
// Login Restart Scenario
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_login_restart_emits_only_latest_user() {
    let server = MockServer::start().await;
    mount_user(&server, "userA", Duration::from_millis(300)).await;
    mount_user(&server, "userB", Duration::ZERO).await;

    let dir = tempfile::tempdir().unwrap();
    let app = App::compose(online_config(&server, dir.path()), Mode::Online).unwrap();

    let mut states = app.auth.subscribe();
    assert_eq!(states.recv().await, Some(State::Initial));

    app.auth.dispatch(auth::login_submitted("userA")).unwrap();
    app.auth.dispatch(auth::login_submitted("userB")).unwrap();

    match states.recv().await {
        Some(State::Success(session)) => assert_eq!(session.user_id, "userB"),
        other => panic!("expected userB session, got {other:?}"),
    }

    // Outlive userA's response: it must never show up.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(states.try_recv(), None);
    assert_eq!(app.snapshot().user_id.as_deref(), Some("userB"));
    assert!(!dir.path().join("users").join("userA.json").exists());
    assert!(dir.path().join("users").join("userB.json").exists());

    app.shutdown().await;
}

#[tokio::test]
async fn test_login_then_dashboard_is_allowed() {
    let server = MockServer::start().await;
    mount_user(&server, "alice", Duration::ZERO).await;

    let dir = tempfile::tempdir().unwrap();
    let app = App::compose(online_config(&server, dir.path()), Mode::Online).unwrap();
    assert_eq!(
        app.resolve("/dashboard"),
        Ok(Decision::RedirectTo("/login".to_string()))
    );

    let mut states = app.auth.subscribe();
    app.auth.dispatch(auth::login_submitted("alice")).unwrap();
    assert!(matches!(states.next_settled().await, Some(State::Success(_))));

    assert_eq!(app.resolve("/dashboard"), Ok(Decision::Allow));
    assert_eq!(
        app.resolve("/login"),
        Ok(Decision::RedirectTo("/dashboard".to_string()))
    );
    app.shutdown().await;
}

#[tokio::test]
async fn test_login_server_error_is_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/alice"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let app = App::compose(online_config(&server, dir.path()), Mode::Online).unwrap();
    let mut states = app.auth.subscribe();
    app.auth.dispatch(auth::login_submitted("alice")).unwrap();

    match states.next_settled().await {
        Some(State::Failure(failure)) => {
            assert_eq!(failure.kind(), FailureKind::Transient);
            assert!(map_failure(&failure).retryable);
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(!app.snapshot().authenticated);
    app.shutdown().await;
}

// ============================================================================
// Sequential Ordering Property
// ============================================================================

#[tokio::test]
async fn test_sequential_preserves_dispatch_order_over_random_latencies() {
    const ROUNDS: u64 = 100;
    const EVENTS: usize = 8;

    for seed in 0..ROUNDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let container = StateContainer::new("ordered", Latency, Strategy::Sequential);
        let mut states = container.subscribe();
        assert_eq!(states.recv().await, Some(State::Initial));

        for index in 0..EVENTS {
            let delay = rng.gen_range(0..4);
            container.dispatch(Event::new("Tick", (index, delay))).unwrap();
        }

        let mut emitted = Vec::with_capacity(EVENTS);
        for _ in 0..EVENTS {
            match states.next_settled().await {
                Some(State::Success(index)) => emitted.push(index),
                other => panic!("seed {seed}: unexpected {other:?}"),
            }
        }
        assert_eq!(emitted, (0..EVENTS).collect::<Vec<_>>(), "seed {seed}");
        container.teardown().await;
    }
}

// ============================================================================
// Navigation Scenarios
// ============================================================================

#[test]
fn test_guarded_dashboard_against_global_snapshot() {
    let navigator = auth::navigator().unwrap();
    let mut snapshot = AppSnapshot::default();
    assert_eq!(
        navigator.resolve("/dashboard", &snapshot),
        Ok(Decision::RedirectTo("/login".to_string()))
    );

    snapshot.authenticated = true;
    assert_eq!(navigator.resolve("/dashboard", &snapshot), Ok(Decision::Allow));
}

#[test]
fn test_redirect_loop_maps_to_fixed_message() {
    let routes = RouteTable::new()
        .route("/a", &[], ())
        .and_then(|t| t.route("/b", &[], ()))
        .unwrap();
    let navigator = Navigator::new(routes)
        .guard(GuardRule::new("a-to-b", 0, |_: &(), loc: &Location| {
            (loc.path() == "/a").then(|| "/b".to_string())
        }))
        .guard(GuardRule::new("b-to-a", 0, |_: &(), loc: &Location| {
            (loc.path() == "/b").then(|| "/a".to_string())
        }));

    let error = navigator.resolve("/a", &()).unwrap_err();
    let failure = Failure::from(error);
    assert_eq!(failure.kind(), FailureKind::RedirectLoop);
    assert_eq!(map_failure(&failure).key, "error.redirect_loop");
}
