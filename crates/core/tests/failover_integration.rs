//! Integration tests for endpoint failover and per-endpoint retries
//!
//! **Coverage:**
//! - Permanent "service busy" exhausts every endpoint's budget
//! - Success on the k-th attempt stops after exactly k attempts
//! - Error statuses abandon an endpoint without retries
//! - Zero retries means one attempt per endpoint
//! - Mixed busy / unreachable / recovering endpoints
//! - Concurrent calls on one client keep separate retry budgets

mod support;

use graphdb_core::RepositoryClient;
use graphdb_domain::{ClientConfig, GraphDbError, RepositoryClientConfig};
use support::{url, Reply, ScriptedNetwork, REPO_A, REPO_B, REPO_C};

fn client(network: &ScriptedNetwork, endpoints: &[&str], retries: u32) -> RepositoryClient {
    let config = RepositoryClientConfig::new(endpoints.iter().copied())
        .with_client(ClientConfig::default().with_retry_count(retries));
    RepositoryClient::new(&config, network.factory()).expect("client should build")
}

#[tokio::test]
async fn permanent_busy_attempts_every_endpoint_fully() {
    let network = ScriptedNetwork::new();
    for repo in [REPO_A, REPO_B, REPO_C] {
        network.always(&url(repo, "size"), Reply::status(503));
    }
    let client = client(&network, &[REPO_A, REPO_B, REPO_C], 2);

    let result = client.get_size(None).await;

    assert!(matches!(result, Err(GraphDbError::ServiceBusy { status: 503, .. })));
    assert_eq!(network.count(), 9);
    for repo in [REPO_A, REPO_B, REPO_C] {
        assert_eq!(network.count_to(&url(repo, "size")), 3);
    }
}

#[tokio::test]
async fn success_on_kth_attempt_stops_retrying() {
    let network = ScriptedNetwork::new();
    network.on(&url(REPO_A, "size"), Reply::status(503));
    network.on(&url(REPO_A, "size"), Reply::ok("12"));
    network.always(&url(REPO_B, "size"), Reply::ok("99"));
    let client = client(&network, &[REPO_A, REPO_B], 2);

    let size = client.get_size(None).await.unwrap();

    assert_eq!(size, 12);
    assert_eq!(network.count_to(&url(REPO_A, "size")), 2);
    assert_eq!(network.count_to(&url(REPO_B, "size")), 0);
}

#[tokio::test]
async fn error_status_moves_to_next_endpoint_without_retry() {
    let network = ScriptedNetwork::new();
    network.always(&url(REPO_A, "size"), Reply::status(500));
    network.always(&url(REPO_B, "size"), Reply::ok("5"));
    let client = client(&network, &[REPO_A, REPO_B], 3);

    assert_eq!(client.get_size(None).await.unwrap(), 5);
    assert_eq!(network.count_to(&url(REPO_A, "size")), 1);
    assert_eq!(network.count_to(&url(REPO_B, "size")), 1);
}

#[tokio::test]
async fn zero_retries_attempts_each_endpoint_once() {
    let network = ScriptedNetwork::new();
    for repo in [REPO_A, REPO_B, REPO_C] {
        network.always(&url(repo, "size"), Reply::status(503));
    }
    let client = client(&network, &[REPO_A, REPO_B, REPO_C], 0);

    assert!(client.get_size(None).await.is_err());
    assert_eq!(network.count(), 3);
}

#[tokio::test]
async fn single_endpoint_honours_retry_budget() {
    let network = ScriptedNetwork::new();
    network.always(&url(REPO_A, "size"), Reply::no_response());
    let client = client(&network, &[REPO_A], 4);

    let result = client.get_size(None).await;

    assert!(matches!(result, Err(GraphDbError::Transport { .. })));
    assert_eq!(network.count(), 5);
}

/// A is busy, B is unreachable, C recovers on its third attempt.
#[tokio::test]
async fn busy_unreachable_and_recovering_endpoints() {
    let network = ScriptedNetwork::new();
    network.always(&url(REPO_A, "size"), Reply::status(503));
    network.always(&url(REPO_B, "size"), Reply::no_response());
    network.on_times(&url(REPO_C, "size"), Reply::status(503), 2);
    network.on(&url(REPO_C, "size"), Reply::ok("42"));
    let client = client(&network, &[REPO_A, REPO_B, REPO_C], 2);

    assert_eq!(client.get_size(None).await.unwrap(), 42);
    assert_eq!(network.count_to(&url(REPO_A, "size")), 3);
    assert_eq!(network.count_to(&url(REPO_B, "size")), 3);
    assert_eq!(network.count_to(&url(REPO_C, "size")), 3);
}

#[tokio::test]
async fn last_observed_failure_is_returned() {
    let network = ScriptedNetwork::new();
    network.always(&url(REPO_A, "size"), Reply::status(503));
    network.always(&url(REPO_B, "size"), Reply::status(500));
    let client = client(&network, &[REPO_A, REPO_B], 1);

    let error = client.get_size(None).await.unwrap_err();

    assert!(matches!(error, GraphDbError::Status { status: 500, .. }), "got {error:?}");
    assert_eq!(network.count(), 3);
}

#[tokio::test]
async fn each_call_starts_from_the_first_endpoint() {
    let network = ScriptedNetwork::new();
    network.on(&url(REPO_A, "size"), Reply::status(500));
    network.always(&url(REPO_A, "size"), Reply::ok("1"));
    network.always(&url(REPO_B, "size"), Reply::ok("2"));
    let client = client(&network, &[REPO_A, REPO_B], 0);

    assert_eq!(client.get_size(None).await.unwrap(), 2);
    assert_eq!(client.get_size(None).await.unwrap(), 1);
}

#[test]
fn empty_endpoint_list_is_rejected_at_construction() {
    let network = ScriptedNetwork::new();
    let config = RepositoryClientConfig::new(Vec::<String>::new());

    let result = RepositoryClient::new(&config, network.factory());

    assert!(matches!(result, Err(GraphDbError::Config(_))));
    assert_eq!(network.count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_calls_each_spend_their_own_budget() {
    let network = ScriptedNetwork::new();
    network.always(&url(REPO_A, "size"), Reply::status(503));
    network.always(&url(REPO_B, "size"), Reply::status(503));
    let client = client(&network, &[REPO_A, REPO_B], 1);

    let (first, second) = tokio::join!(client.get_size(None), client.get_size(None));

    assert!(matches!(first, Err(GraphDbError::ServiceBusy { .. })));
    assert!(matches!(second, Err(GraphDbError::ServiceBusy { .. })));
    assert_eq!(network.count_to(&url(REPO_A, "size")), 4);
    assert_eq!(network.count_to(&url(REPO_B, "size")), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_calls_fail_over_independently() {
    let network = ScriptedNetwork::new();
    network.always(&url(REPO_A, "size"), Reply::status(503));
    network.always(&url(REPO_B, "size"), Reply::ok("8"));
    let client = client(&network, &[REPO_A, REPO_B], 1);

    let (first, second) = tokio::join!(client.get_size(None), client.get_size(None));

    assert_eq!(first.unwrap(), 8);
    assert_eq!(second.unwrap(), 8);
    assert_eq!(network.count_to(&url(REPO_A, "size")), 4);
    assert_eq!(network.count_to(&url(REPO_B, "size")), 2);
}
