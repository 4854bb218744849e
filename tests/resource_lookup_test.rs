//! Resource search, kind queries and best-effort lookups against a mock instance

mod common;

use common::{mount_token, service_for};
use serde_json::json;
use vcfo_metrics::resources::{KindFilter, PropertyCondition, ResourceType, SearchFilter};
use vcfo_metrics::MetricsError;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_PATH: &str = "/suite-api/api/resources";
const QUERY_PATH: &str = "/suite-api/api/resources/query";

fn resource(id: &str, name: &str, kind: &str) -> serde_json::Value {
    json!({
        "identifier": id,
        "resourceKey": {
            "name": name,
            "adapterKindKey": "VMWARE",
            "resourceKindKey": kind
        },
        "resourceHealth": "GREEN"
    })
}

fn resource_list(items: Vec<serde_json::Value>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "pageInfo": {"totalCount": items.len(), "page": 0, "pageSize": 1000},
        "resourceList": items
    }))
}

#[tokio::test]
async fn test_project_lookup_uses_structured_query() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .and(body_json(json!({
            "name": ["my-project"],
            "adapterKind": ["VCFAutomation"],
            "resourceKind": ["Project"]
        })))
        .respond_with(resource_list(vec![
            resource("proj-1", "my-project", "Project"),
            resource("proj-2", "my-project", "Project"),
        ]))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(resource_list(vec![]))
        .expect(0)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let found = service
        .find_resource_by_name("my-project", None, Some(ResourceType::Project))
        .await
        .unwrap();

    assert_eq!(found.identifier, "proj-1");
    assert_eq!(found.name(), Some("my-project"));
}

#[tokio::test]
async fn test_project_lookup_miss_is_none() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .respond_with(resource_list(vec![]))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let found = service
        .find_resource_by_name("missing", None, Some(ResourceType::Project))
        .await;
    assert!(found.is_none());
}

#[tokio::test]
async fn test_vm_and_untyped_lookups_use_free_text_search() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("name", "web-01"))
        .respond_with(resource_list(vec![resource("vm-1", "web-01", "VirtualMachine")]))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .respond_with(resource_list(vec![]))
        .expect(0)
        .mount(&server)
        .await;

    let service = service_for(&server);
    for resource_type in [Some(ResourceType::Vm), None] {
        let found = service
            .find_resource_by_name("web-01", None, resource_type)
            .await
            .unwrap();
        assert_eq!(found.identifier, "vm-1");
    }

    let requests = server.received_requests().await.unwrap();
    for search in requests.iter().filter(|r| r.url.path() == SEARCH_PATH) {
        let keys: Vec<String> = search.url.query_pairs().map(|(k, _)| k.into_owned()).collect();
        assert_eq!(keys, vec!["name".to_string()]);
    }
}

#[tokio::test]
async fn test_supervisor_namespace_lookup_embeds_kind() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .and(body_json(json!({
            "name": ["ns-dev"],
            "adapterKind": ["VMWARE"],
            "resourceKind": ["Namespace"]
        })))
        .respond_with(resource_list(vec![resource("ns-1", "ns-dev", "Namespace")]))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let found = service
        .find_resource_by_name("ns-dev", None, Some(ResourceType::SupervisorNamespace))
        .await;
    assert_eq!(found.map(|r| r.identifier), Some("ns-1".to_string()));
}

#[tokio::test]
async fn test_lookups_degrade_to_none_on_server_error() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    assert!(service
        .find_resource_by_name("cluster-a", None, Some(ResourceType::Cluster))
        .await
        .is_none());
    assert!(service
        .find_resource_by_name("web-01", None, None)
        .await
        .is_none());
    assert!(service
        .find_resource_by_property("summary|guest|hostName", "web-01", None)
        .await
        .is_none());
}

#[tokio::test]
async fn test_property_lookup_builds_single_eq_condition() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .and(body_json(json!({
            "propertyConditions": {
                "conjunctionOperator": "AND",
                "conditions": [{
                    "key": "summary|guest|hostName",
                    "operator": "EQ",
                    "stringValue": "web-01"
                }]
            }
        })))
        .respond_with(resource_list(vec![resource("vm-1", "web-01", "VirtualMachine")]))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let found = service
        .find_resource_by_property("summary|guest|hostName", "web-01", None)
        .await
        .unwrap();
    assert_eq!(found.identifier, "vm-1");
}

#[tokio::test]
async fn test_search_sends_only_supplied_filters() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("adapterKind", "VMWARE"))
        .and(query_param("resourceKind", "HostSystem"))
        .respond_with(resource_list(vec![
            resource("host-1", "esx-01", "HostSystem"),
            resource("host-2", "esx-02", "HostSystem"),
        ]))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let filter = SearchFilter {
        name: None,
        adapter_kind: Some("VMWARE"),
        resource_kind: Some("HostSystem"),
    };
    let list = service.search_resources(filter, None).await.unwrap();

    assert_eq!(list.resource_list.len(), 2);
    assert!(list.page_info.is_some());
    let requests = server.received_requests().await.unwrap();
    let search = requests
        .iter()
        .find(|r| r.url.path() == SEARCH_PATH)
        .unwrap();
    assert!(search.url.query_pairs().all(|(k, _)| k != "name"));
}

#[tokio::test]
async fn test_cluster_query_uses_shared_builder() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .and(body_json(json!({
            "name": ["cluster-a", "cluster-b"],
            "adapterKind": ["VMWARE"],
            "resourceKind": ["ClusterComputeResource"]
        })))
        .respond_with(resource_list(vec![resource(
            "cl-1",
            "cluster-a",
            "ClusterComputeResource",
        )]))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let filter = KindFilter {
        name: vec!["cluster-a".to_string(), "cluster-b".to_string()],
        ..Default::default()
    };
    let list = service.query_cluster_resources(filter, None).await.unwrap();
    assert_eq!(list.resource_list.len(), 1);
}

#[tokio::test]
async fn test_query_resources_requires_conditions() {
    let server = MockServer::start().await;
    let service = service_for(&server);

    let err = service.query_resources(vec![], None).await.unwrap_err();
    assert!(matches!(err, MetricsError::Validation { .. }));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_query_resources_embeds_all_conditions() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("POST"))
        .and(path(QUERY_PATH))
        .and(body_json(json!({
            "propertyConditions": {
                "conjunctionOperator": "AND",
                "conditions": [
                    {"key": "summary|parentCluster", "operator": "EQ", "stringValue": "cluster-a"},
                    {"key": "summary|runtime|powerState", "operator": "EQ", "stringValue": "Powered On"}
                ]
            }
        })))
        .respond_with(resource_list(vec![resource("vm-1", "web-01", "VirtualMachine")]))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let conditions = vec![
        PropertyCondition::eq("summary|parentCluster", "cluster-a"),
        PropertyCondition::eq("summary|runtime|powerState", "Powered On"),
    ];
    let list = service.query_resources(conditions, None).await.unwrap();
    assert_eq!(list.resource_list[0].identifier, "vm-1");
}

#[tokio::test]
async fn test_resource_details_are_strict() {
    let server = MockServer::start().await;
    mount_token(&server, "tok-1", 1).await;

    Mock::given(method("GET"))
        .and(path("/suite-api/api/resources/vm-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(resource("vm-1", "web-01", "VirtualMachine")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/suite-api/api/resources/vm-404"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .expect(1)
        .mount(&server)
        .await;

    let service = service_for(&server);
    let details = service.get_resource_details("vm-1", None).await.unwrap();
    assert_eq!(details.identifier, "vm-1");
    assert_eq!(details.extra["resourceHealth"], json!("GREEN"));

    let err = service.get_resource_details("vm-404", None).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}
