//! Drives the provider against a mock Tencent Cloud endpoint

#![allow(clippy::disallowed_methods)] // Allow unwrap() in tests for clarity

use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tencentcloud::provider_data::Timeouts;
use tencentcloud::TencentCloudProvider;
use tfplug::provider::ConfigureProviderRequest;
use tfplug::resource::*;
use tfplug::{AttributePath, Context, Dynamic, DynamicValue, Provider, Resource};
use tokio_test::assert_ok;

fn fast_timeouts() -> Timeouts {
    Timeouts {
        read: Duration::from_secs(2),
        write: Duration::from_secs(2),
        poll_interval: Duration::from_millis(10),
        retry_interval: Duration::from_millis(10),
    }
}

async fn configured(server: &ServerGuard, timeouts: Timeouts) -> TencentCloudProvider {
    let mut config = DynamicValue::object();
    for (name, value) in [
        ("secret_id", "AKIDexample".to_string()),
        ("secret_key", "secret".to_string()),
        ("region", "ap-guangzhou".to_string()),
        ("endpoint", server.url()),
    ] {
        config.set_string(&AttributePath::new(name), value).unwrap();
    }

    let mut provider = TencentCloudProvider::new().with_timeouts(timeouts);
    let response = provider
        .configure(Context::new(), ConfigureProviderRequest { config })
        .await;
    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    provider
}

async fn resource(provider: &TencentCloudProvider, name: &str) -> Box<dyn Resource> {
    assert_ok!(provider.create_resource(name).await)
}

fn config(values: &[(&str, Dynamic)]) -> DynamicValue {
    let mut map = std::collections::HashMap::new();
    for (name, value) in values {
        map.insert(name.to_string(), value.clone());
    }
    DynamicValue::new(Dynamic::Map(map))
}

fn string(value: &str) -> Dynamic {
    Dynamic::String(value.to_string())
}

fn strings(values: &[&str]) -> Dynamic {
    Dynamic::List(values.iter().map(|v| string(v)).collect())
}

fn create_request(type_name: &str, config: DynamicValue) -> CreateResourceRequest {
    CreateResourceRequest {
        type_name: type_name.to_string(),
        planned_state: config.clone(),
        config,
    }
}

fn envelope(body: serde_json::Value) -> String {
    let mut response = body;
    response["RequestId"] = json!("req-test");
    json!({ "Response": response }).to_string()
}

#[tokio::test]
async fn mysql_switch_commits_state_after_task_succeeds() {
    let mut server = Server::new_async().await;
    let switch = server
        .mock("POST", "/")
        .match_header("x-tc-action", "SwitchDBInstanceMasterSlave")
        .match_body(Matcher::Json(json!({
            "InstanceId": "cdb-1",
            "DstSlave": "second"
        })))
        .with_body(envelope(json!({ "AsyncRequestId": "async-1" })))
        .expect(1)
        .create_async()
        .await;

    let checks = Arc::new(AtomicUsize::new(0));
    let counter = checks.clone();
    let status = server
        .mock("POST", "/")
        .match_header("x-tc-action", "DescribeAsyncRequestInfo")
        .match_body(Matcher::Json(json!({ "AsyncRequestId": "async-1" })))
        .with_body_from_request(move |_| {
            let status = if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                "RUNNING"
            } else {
                "SUCCESS"
            };
            envelope(json!({ "Status": status, "Info": "" })).into_bytes()
        })
        .create_async()
        .await;

    let provider = configured(&server, fast_timeouts()).await;
    let switch_resource =
        resource(&provider, "tencentcloud_mysql_switch_master_slave_operation").await;

    let response = switch_resource
        .create(
            Context::new(),
            create_request(
                "tencentcloud_mysql_switch_master_slave_operation",
                config(&[
                    ("instance_id", string("cdb-1")),
                    ("dst_slave", string("second")),
                ]),
            ),
        )
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(
        response
            .new_state
            .get_string(&AttributePath::new("id"))
            .unwrap(),
        "cdb-1"
    );
    assert_eq!(checks.load(Ordering::SeqCst), 3);
    switch.assert_async().await;
    status.assert_async().await;
}

#[tokio::test]
async fn failed_task_leaves_no_state() {
    let mut server = Server::new_async().await;
    let _stop = server
        .mock("POST", "/")
        .match_header("x-tc-action", "StopReplication")
        .with_body(envelope(json!({ "AsyncRequestId": "async-9" })))
        .create_async()
        .await;
    let _status = server
        .mock("POST", "/")
        .match_header("x-tc-action", "DescribeAsyncRequestInfo")
        .with_body(envelope(json!({ "Status": "FAILED", "Info": "replication busy" })))
        .create_async()
        .await;

    let provider = configured(&server, fast_timeouts()).await;
    let stop = resource(&provider, "tencentcloud_mysql_ro_stop_replication").await;

    let response = stop
        .create(
            Context::new(),
            create_request(
                "tencentcloud_mysql_ro_stop_replication",
                config(&[("instance_id", string("cdbro-1"))]),
            ),
        )
        .await;

    assert!(response.new_state.is_null());
    assert_eq!(response.diagnostics.len(), 1);
    assert!(response.diagnostics[0].detail.contains("async-9"));
    assert!(response.diagnostics[0].detail.contains("replication busy"));
}

#[tokio::test]
async fn scale_in_uses_activity_id_as_resource_id() {
    let mut server = Server::new_async().await;
    let _scale_in = server
        .mock("POST", "/")
        .match_header("x-tc-action", "ScaleInInstances")
        .match_body(Matcher::Json(json!({
            "AutoScalingGroupId": "asg-1",
            "ScaleInNumber": 2
        })))
        .with_body(envelope(json!({ "ActivityId": "asa-1" })))
        .create_async()
        .await;
    let _activity = server
        .mock("POST", "/")
        .match_header("x-tc-action", "DescribeAutoScalingActivities")
        .with_body(envelope(json!({
            "ActivitySet": [{
                "ActivityId": "asa-1",
                "StatusCode": "SUCCESSFUL",
                "StatusMessage": "Success",
                "StatusMessageSimplified": "Success"
            }]
        })))
        .create_async()
        .await;

    let provider = configured(&server, fast_timeouts()).await;
    let scale_in = resource(&provider, "tencentcloud_as_scale_in_instances").await;

    let response = scale_in
        .create(
            Context::new(),
            create_request(
                "tencentcloud_as_scale_in_instances",
                config(&[
                    ("auto_scaling_group_id", string("asg-1")),
                    ("scale_in_number", Dynamic::Number(2.0)),
                ]),
            ),
        )
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(
        response
            .new_state
            .get_string(&AttributePath::new("id"))
            .unwrap(),
        "asa-1"
    );
}

#[tokio::test]
async fn activity_that_never_finishes_times_out() {
    let mut server = Server::new_async().await;
    let _scale_in = server
        .mock("POST", "/")
        .match_header("x-tc-action", "ScaleInInstances")
        .with_body(envelope(json!({ "ActivityId": "asa-2" })))
        .create_async()
        .await;
    let _activity = server
        .mock("POST", "/")
        .match_header("x-tc-action", "DescribeAutoScalingActivities")
        .with_body(envelope(json!({
            "ActivitySet": [{ "ActivityId": "asa-2", "StatusCode": "RUNNING" }]
        })))
        .create_async()
        .await;

    let timeouts = Timeouts {
        write: Duration::from_millis(200),
        ..fast_timeouts()
    };
    let provider = configured(&server, timeouts).await;
    let scale_in = resource(&provider, "tencentcloud_as_scale_in_instances").await;

    let response = scale_in
        .create(
            Context::new(),
            create_request(
                "tencentcloud_as_scale_in_instances",
                config(&[
                    ("auto_scaling_group_id", string("asg-1")),
                    ("scale_in_number", Dynamic::Number(1.0)),
                ]),
            ),
        )
        .await;

    assert!(response.new_state.is_null());
    assert!(response.diagnostics[0].detail.contains("timed out"));
    assert!(response.diagnostics[0].detail.contains("asa-2"));
}

#[tokio::test]
async fn invalid_config_never_reaches_the_api() {
    let mut server = Server::new_async().await;
    let complete = server
        .mock("POST", "/")
        .match_header("x-tc-action", "CompleteLifecycleAction")
        .expect(0)
        .create_async()
        .await;

    let provider = configured(&server, fast_timeouts()).await;
    let lifecycle = resource(&provider, "tencentcloud_as_complete_lifecycle").await;

    let response = lifecycle
        .create(
            Context::new(),
            create_request(
                "tencentcloud_as_complete_lifecycle",
                config(&[
                    ("lifecycle_hook_id", string("ash-1")),
                    ("lifecycle_action_result", string("CONTINUE")),
                ]),
            ),
        )
        .await;

    assert!(response.new_state.is_null());
    assert!(!response.diagnostics.is_empty());
    complete.assert_async().await;
}

#[tokio::test]
async fn vendor_errors_are_not_retried() {
    let mut server = Server::new_async().await;
    let complete = server
        .mock("POST", "/")
        .match_header("x-tc-action", "CompleteLifecycleAction")
        .with_body(envelope(json!({
            "Error": { "Code": "ResourceNotFound.LifecycleHookNotFound", "Message": "hook missing" }
        })))
        .expect(1)
        .create_async()
        .await;

    let provider = configured(&server, fast_timeouts()).await;
    let lifecycle = resource(&provider, "tencentcloud_as_complete_lifecycle").await;

    let response = lifecycle
        .create(
            Context::new(),
            create_request(
                "tencentcloud_as_complete_lifecycle",
                config(&[
                    ("lifecycle_hook_id", string("ash-1")),
                    ("lifecycle_action_result", string("ABANDON")),
                    ("instance_id", string("ins-1")),
                ]),
            ),
        )
        .await;

    assert!(response.new_state.is_null());
    assert!(response.diagnostics[0]
        .detail
        .contains("ResourceNotFound.LifecycleHookNotFound"));
    complete.assert_async().await;
}

#[tokio::test]
async fn sqlserver_ct_is_applied_and_read_back() {
    let mut server = Server::new_async().await;
    let modify = server
        .mock("POST", "/")
        .match_header("x-tc-action", "ModifyDatabaseCT")
        .match_body(Matcher::Json(json!({
            "DBNames": ["orders"],
            "ModifyType": "enable",
            "InstanceId": "mssql-1",
            "ChangeRetentionDay": 7
        })))
        .with_body(envelope(json!({ "FlowId": 42 })))
        .expect(1)
        .create_async()
        .await;
    let _flow = server
        .mock("POST", "/")
        .match_header("x-tc-action", "DescribeFlowStatus")
        .match_body(Matcher::Json(json!({ "FlowId": 42 })))
        .with_body(envelope(json!({ "Status": 0 })))
        .create_async()
        .await;
    let _dbs = server
        .mock("POST", "/")
        .match_header("x-tc-action", "DescribeDBsNormal")
        .with_body(envelope(json!({
            "TotalCount": 2,
            "DBList": [
                { "Name": "master", "IsDbChainingOn": "0", "RetentionPeriod": "0" },
                { "Name": "orders", "IsDbChainingOn": "1", "RetentionPeriod": "7" }
            ]
        })))
        .create_async()
        .await;

    let provider = configured(&server, fast_timeouts()).await;
    let ct = resource(&provider, "tencentcloud_sqlserver_config_database_ct").await;

    let response = ct
        .create(
            Context::new(),
            create_request(
                "tencentcloud_sqlserver_config_database_ct",
                config(&[
                    ("instance_id", string("mssql-1")),
                    ("db_name", string("orders")),
                    ("modify_type", string("enable")),
                    ("change_retention_day", Dynamic::Number(7.0)),
                ]),
            ),
        )
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    let state = &response.new_state;
    assert_eq!(
        state.get_string(&AttributePath::new("id")).unwrap(),
        "mssql-1#orders"
    );
    assert_eq!(
        state.get_string(&AttributePath::new("modify_type")).unwrap(),
        "enable"
    );
    assert_eq!(
        state
            .get_i64(&AttributePath::new("change_retention_day"))
            .unwrap(),
        7
    );
    modify.assert_async().await;
}

#[tokio::test]
async fn sqlserver_ct_read_reports_missing_database_as_gone() {
    let mut server = Server::new_async().await;
    let _dbs = server
        .mock("POST", "/")
        .match_header("x-tc-action", "DescribeDBsNormal")
        .with_body(envelope(json!({
            "DBList": [{ "Name": "master", "IsDbChainingOn": 0 }]
        })))
        .create_async()
        .await;

    let provider = configured(&server, fast_timeouts()).await;
    let ct = resource(&provider, "tencentcloud_sqlserver_config_database_ct").await;

    let response = ct
        .read(
            Context::new(),
            ReadResourceRequest {
                type_name: "tencentcloud_sqlserver_config_database_ct".to_string(),
                current_state: config(&[("id", string("mssql-1#orders"))]),
            },
        )
        .await;

    assert!(response.diagnostics.is_empty());
    assert!(response.new_state.is_none());
}

#[tokio::test]
async fn sqlserver_ct_read_stops_retrying_at_context_deadline() {
    let mut server = Server::new_async().await;
    let _dbs = server
        .mock("POST", "/")
        .match_header("x-tc-action", "DescribeDBsNormal")
        .with_body(envelope(json!({
            "Error": { "Code": "RequestLimitExceeded", "Message": "slow down" }
        })))
        .expect_at_least(1)
        .create_async()
        .await;

    let timeouts = Timeouts {
        read: Duration::from_secs(30),
        retry_interval: Duration::from_millis(50),
        ..fast_timeouts()
    };
    let provider = configured(&server, timeouts).await;
    let ct = resource(&provider, "tencentcloud_sqlserver_config_database_ct").await;

    let started = std::time::Instant::now();
    let response = ct
        .read(
            Context::new().with_timeout(Duration::from_millis(300)),
            ReadResourceRequest {
                type_name: "tencentcloud_sqlserver_config_database_ct".to_string(),
                current_state: config(&[("id", string("mssql-1#orders"))]),
            },
        )
        .await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(!response.diagnostics.is_empty());
    assert!(response.new_state.is_some());
}

#[tokio::test]
async fn sqlserver_ct_import_rejects_malformed_id() {
    let server = Server::new_async().await;
    let provider = configured(&server, fast_timeouts()).await;
    let ct = resource(&provider, "tencentcloud_sqlserver_config_database_ct").await;
    let importer = ct.importer().unwrap();

    let bad = importer
        .import_state(
            Context::new(),
            ImportResourceStateRequest {
                type_name: "tencentcloud_sqlserver_config_database_ct".to_string(),
                id: "mssql-1".to_string(),
            },
        )
        .await;
    assert!(bad.imported_resources.is_empty());
    assert!(bad.diagnostics[0].detail.contains("instance_id#db_name"));

    let good = importer
        .import_state(
            Context::new(),
            ImportResourceStateRequest {
                type_name: "tencentcloud_sqlserver_config_database_ct".to_string(),
                id: "mssql-1#orders".to_string(),
            },
        )
        .await;
    let state = &good.imported_resources[0].state;
    assert_eq!(
        state.get_string(&AttributePath::new("db_name")).unwrap(),
        "orders"
    );
}

#[tokio::test]
async fn image_sharing_follows_account_changes() {
    let mut server = Server::new_async().await;
    let share = server
        .mock("POST", "/")
        .match_header("x-tc-action", "ModifyImageSharePermission")
        .match_body(Matcher::Json(json!({
            "ImageId": "img-1",
            "AccountIds": ["100003"],
            "Permission": "SHARE"
        })))
        .with_body(envelope(json!({})))
        .expect(1)
        .create_async()
        .await;
    let cancel = server
        .mock("POST", "/")
        .match_header("x-tc-action", "ModifyImageSharePermission")
        .match_body(Matcher::Json(json!({
            "ImageId": "img-1",
            "AccountIds": ["100001"],
            "Permission": "CANCEL"
        })))
        .with_body(envelope(json!({})))
        .expect(1)
        .create_async()
        .await;
    let _describe = server
        .mock("POST", "/")
        .match_header("x-tc-action", "DescribeImageSharePermission")
        .with_body(envelope(json!({
            "SharePermissionSet": [
                { "AccountId": "100002", "CreatedTime": "2023-01-01 00:00:00" },
                { "AccountId": "100003", "CreatedTime": "2023-01-02 00:00:00" }
            ]
        })))
        .create_async()
        .await;

    let provider = configured(&server, fast_timeouts()).await;
    let sharing = resource(&provider, "tencentcloud_cvm_image_share_permission").await;

    let prior = config(&[
        ("id", string("img-1")),
        ("image_id", string("img-1")),
        ("account_ids", strings(&["100001", "100002"])),
    ]);
    let planned = config(&[
        ("image_id", string("img-1")),
        ("account_ids", strings(&["100002", "100003"])),
    ]);

    let response = sharing
        .update(
            Context::new(),
            UpdateResourceRequest {
                type_name: "tencentcloud_cvm_image_share_permission".to_string(),
                prior_state: prior,
                planned_state: planned.clone(),
                config: planned,
            },
        )
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    assert_eq!(
        response
            .new_state
            .get_string_list(&AttributePath::new("account_ids"))
            .unwrap(),
        vec!["100002".to_string(), "100003".to_string()]
    );
    share.assert_async().await;
    cancel.assert_async().await;
}

#[tokio::test]
async fn deleting_image_sharing_cancels_current_accounts() {
    let mut server = Server::new_async().await;
    let _describe = server
        .mock("POST", "/")
        .match_header("x-tc-action", "DescribeImageSharePermission")
        .with_body(envelope(json!({
            "SharePermissionSet": [{ "AccountId": "100002" }]
        })))
        .create_async()
        .await;
    let cancel = server
        .mock("POST", "/")
        .match_header("x-tc-action", "ModifyImageSharePermission")
        .match_body(Matcher::Json(json!({
            "ImageId": "img-1",
            "AccountIds": ["100002"],
            "Permission": "CANCEL"
        })))
        .with_body(envelope(json!({})))
        .expect(1)
        .create_async()
        .await;

    let provider = configured(&server, fast_timeouts()).await;
    let sharing = resource(&provider, "tencentcloud_cvm_image_share_permission").await;

    let response = sharing
        .delete(
            Context::new(),
            DeleteResourceRequest {
                type_name: "tencentcloud_cvm_image_share_permission".to_string(),
                prior_state: config(&[("id", string("img-1"))]),
            },
        )
        .await;

    assert!(response.diagnostics.is_empty(), "{:?}", response.diagnostics);
    cancel.assert_async().await;
}

#[tokio::test]
async fn operations_cannot_be_updated() {
    let server = Server::new_async().await;
    let provider = configured(&server, fast_timeouts()).await;
    let lifecycle = resource(&provider, "tencentcloud_as_complete_lifecycle").await;

    let prior = config(&[("id", string("ash-1"))]);
    let response = lifecycle
        .update(
            Context::new(),
            UpdateResourceRequest {
                type_name: "tencentcloud_as_complete_lifecycle".to_string(),
                prior_state: prior.clone(),
                planned_state: prior.clone(),
                config: prior.clone(),
            },
        )
        .await;

    assert_eq!(response.new_state, prior);
    assert_eq!(response.diagnostics[0].summary, "Update not supported");
}

#[tokio::test]
async fn unknown_resource_is_rejected() {
    let server = Server::new_async().await;
    let provider = configured(&server, fast_timeouts()).await;
    let unknown = provider.create_resource("tencentcloud_instance").await;
    assert!(unknown
        .err()
        .unwrap()
        .to_string()
        .contains("Unknown resource"));
}
