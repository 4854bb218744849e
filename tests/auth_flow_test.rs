//! Token acquisition, reuse, single-flight and 401 recovery against a mock instance

mod common;

use common::{instance_config, mount_token, service_for, token_body, TOKEN_PATH};
use futures::future::join_all;
use serde_json::json;
use std::time::Duration;
use vcfo_metrics::{MetricsError, MonitoringService};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STATS_PATH: &str = "/suite-api/api/resources/stats";

fn empty_stats() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"values": []}))
}

fn keys() -> Vec<String> {
    vec!["cpu|usage_average".to_string()]
}

#[tokio::test]
async fn test_token_is_acquired_once_and_reused() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("GET"))
        .and(path(STATS_PATH))
        .and(header("Authorization", "Bearer tok-1"))
        .respond_with(empty_stats())
        .expect(3)
        .mount(&server)
        .await;

    let service = service_for(&server);
    for _ in 0..3 {
        service
            .get_resource_metrics("res-1", &keys(), None, None, None, None)
            .await
            .unwrap();
    }

    assert_eq!(service.authenticator().acquisition_count(), 1);
    let cached = service.authenticator().cached_token("vcfo-1").unwrap();
    assert_eq!(cached.value, "tok-1");
    assert_eq!(cached.validity, Some(1_700_000_000_000));
}

#[tokio::test]
async fn test_concurrent_callers_share_one_acquisition() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_body("tok-shared"))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(STATS_PATH))
        .and(header("Authorization", "Bearer tok-shared"))
        .respond_with(empty_stats())
        .expect(8)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let stat_keys = keys();
    let calls = (0..8).map(|i| {
        let resource_id = format!("res-{}", i);
        let service = &service;
        let stat_keys = &stat_keys;
        async move {
            service
                .get_resource_metrics(&resource_id, stat_keys, None, None, None, None)
                .await
        }
    });

    let results = join_all(calls).await;
    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(service.authenticator().acquisition_count(), 1);
}

#[tokio::test]
async fn test_concurrent_callers_share_one_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_string("bad credentials")
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let stat_keys = keys();
    let calls = (0..4).map(|_| {
        let service = &service;
        let stat_keys = &stat_keys;
        async move {
            service
                .get_resource_metrics("res-1", stat_keys, None, None, None, None)
                .await
        }
    });

    for result in join_all(calls).await {
        assert!(matches!(
            result,
            Err(MetricsError::Auth {
                status: Some(401),
                ..
            })
        ));
    }
}

#[tokio::test]
async fn test_auth_failure_is_not_cached() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid credentials"))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(STATS_PATH))
        .respond_with(empty_stats())
        .expect(0)
        .mount(&server)
        .await;

    let service = service_for(&server);
    for _ in 0..2 {
        let err = service
            .get_resource_metrics("res-1", &keys(), None, None, None, None)
            .await
            .unwrap_err();

        match err {
            MetricsError::Auth {
                instance, status, ..
            } => {
                assert_eq!(instance, "vcfo-1");
                assert_eq!(status, Some(401));
            }
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    assert!(service.authenticator().cached_token("vcfo-1").is_none());
}

#[tokio::test]
async fn test_unauthorized_response_reauthenticates_once() {
    let server = MockServer::start().await;

    // First acquisition yields a token the instance later rejects
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-stale")))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("tok-fresh")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(STATS_PATH))
        .and(header("Authorization", "Bearer tok-stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(STATS_PATH))
        .and(header("Authorization", "Bearer tok-fresh"))
        .respond_with(empty_stats())
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    service
        .get_resource_metrics("res-1", &keys(), None, None, None, None)
        .await
        .unwrap();

    assert_eq!(service.authenticator().acquisition_count(), 2);
    assert_eq!(
        service.authenticator().cached_token("vcfo-1").unwrap().value,
        "tok-fresh"
    );
}

#[tokio::test]
async fn test_second_unauthorized_response_surfaces() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 2).await;

    Mock::given(method("GET"))
        .and(path(STATS_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let err = service
        .get_resource_metrics("res-1", &keys(), None, None, None, None)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert!(matches!(err, MetricsError::Upstream { .. }));
}

#[tokio::test]
async fn test_invalidate_token_forces_reacquisition() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 2).await;

    Mock::given(method("GET"))
        .and(path(STATS_PATH))
        .respond_with(empty_stats())
        .expect(2)
        .mount(&server)
        .await;

    let service = service_for(&server);
    service
        .get_resource_metrics("res-1", &keys(), None, None, None, None)
        .await
        .unwrap();
    assert!(service.invalidate_token(Some("vcfo-1")).unwrap());
    service
        .get_resource_metrics("res-1", &keys(), None, None, None, None)
        .await
        .unwrap();

    assert_eq!(service.authenticator().acquisition_count(), 2);
}

#[tokio::test]
async fn test_tokens_are_cached_per_instance() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    mount_token(&first, "tok-a", 1).await;
    mount_token(&second, "tok-b", 1).await;

    for (server, token) in [(&first, "tok-a"), (&second, "tok-b")] {
        Mock::given(method("GET"))
            .and(path(STATS_PATH))
            .and(header("Authorization", format!("Bearer {}", token).as_str()))
            .respond_with(empty_stats())
            .expect(2)
            .mount(server)
            .await;
    }

    let service = MonitoringService::from_instances(vec![
        instance_config("vcfo-1", &first.uri()),
        instance_config("vcfo-2", &second.uri()),
    ])
    .unwrap();

    for instance in ["vcfo-1", "vcfo-2", "vcfo-1", "vcfo-2"] {
        service
            .get_resource_metrics("res-1", &keys(), None, None, None, Some(instance))
            .await
            .unwrap();
    }

    assert_eq!(service.authenticator().acquisition_count(), 2);
}
