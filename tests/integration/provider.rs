//! Repository behaviour of the standard provider over in-memory storage.

use crate::common::{self, CONTRACTOR_SCHEMA, ENTERPRISE_SCHEMA, fixtures::rfc_examples};
use futures::future::join_all;
use scim_engine::ResourceProvider;
use scim_engine::error::{ScimError, ValidationError};
use scim_engine::patch::{PatchOperation, PatchRequest};
use scim_engine::providers::{SearchRequest, SortOrder};
use scim_engine::resource::{HttpVersion, RawVersion};
use scim_engine::storage::StorageProvider;
use serde_json::{Value, json};

fn user(user_name: &str) -> Value {
    json!({
        "schemas": [common::USER_SCHEMA],
        "userName": user_name,
        "emails": [{"value": format!("{}@example.com", user_name), "type": "work"}]
    })
}

#[tokio::test]
async fn test_create_from_rfc_example_ignores_server_attributes() {
    let provider = common::provider();
    let context = common::context();

    let created = provider
        .create_resource("User", rfc_examples::user_full(), &context)
        .await
        .unwrap();
    let resource = created.resource();

    assert_ne!(resource.get_id(), Some("2819c223-7f76-453a-919d-413861904646"));
    let meta = resource.meta.as_ref().unwrap();
    assert_ne!(meta.version.as_deref(), Some("W/\"3694e05e9dff591\""));
    assert_eq!(meta.created, meta.last_modified);
    assert_eq!(meta.version, Some(created.etag().to_string()));
    assert_eq!(resource.external_id.as_deref(), Some("701984"));
    assert_eq!(
        resource.extension(ENTERPRISE_SCHEMA).unwrap()["employeeNumber"],
        "701984"
    );
}

#[tokio::test]
async fn test_resource_type_lookup_is_case_insensitive() {
    let provider = common::provider();
    let context = common::context();

    let created = provider.create_resource("user", user("alice"), &context).await.unwrap();
    let id = created.get_id().unwrap().to_string();
    assert_eq!(created.resource().resource_type, "User");
    assert!(provider.resource_exists("User", &id, &context).await.unwrap());
    assert!(provider.get_resource("USER", &id, &context).await.unwrap().is_some());
}

#[tokio::test]
async fn test_get_missing_is_none_and_delete_missing_is_not_found() {
    let provider = common::provider();
    let context = common::context();

    assert!(provider.get_resource("User", "nope", &context).await.unwrap().is_none());
    let error = provider
        .delete_resource("User", "nope", None, &context)
        .await
        .unwrap_err();
    assert_eq!(error.status(), 404);
}

#[tokio::test]
async fn test_replace_keeps_immutable_and_read_only_values() {
    let provider = common::contractor_provider();
    let context = common::context();

    let created = provider
        .create_resource(
            "Contractor",
            json!({
                "schemas": [CONTRACTOR_SCHEMA],
                "userName": "temp01",
                "badgeNumber": "B-17",
                "name": {"givenName": "Bob"}
            }),
            &context,
        )
        .await
        .unwrap();
    let id = created.get_id().unwrap().to_string();

    let replaced = provider
        .update_resource(
            "Contractor",
            &id,
            json!({"schemas": [CONTRACTOR_SCHEMA], "userName": "temp01-renamed"}),
            Some(created.version()),
            &context,
        )
        .await
        .unwrap();
    assert_eq!(replaced.resource().attributes["badgeNumber"], "B-17");
    assert_eq!(replaced.resource().attributes["userName"], "temp01-renamed");
    assert!(replaced.resource().attributes.get("name").is_none());

    let error = provider
        .update_resource(
            "Contractor",
            &id,
            json!({
                "schemas": [CONTRACTOR_SCHEMA],
                "userName": "temp01-renamed",
                "badgeNumber": "B-99"
            }),
            None,
            &context,
        )
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        ScimError::Validation(ValidationError::ImmutableAttribute { .. })
    ));
    assert_eq!(error.scim_type(), Some("mutability"));
}

#[tokio::test]
async fn test_stale_version_is_rejected_everywhere() {
    let provider = common::provider();
    let context = common::context();

    let created = provider.create_resource("User", user("alice"), &context).await.unwrap();
    let id = created.get_id().unwrap().to_string();
    let stale = created.version().clone();

    let patch = PatchRequest::new(vec![PatchOperation::replace(Some("title"), json!("Lead"))]);
    let patched = provider
        .patch_resource("User", &id, &patch, Some(&stale), &context)
        .await
        .unwrap();
    assert!(!patched.version_matches(&stale));

    let error = provider
        .update_resource("User", &id, user("alice"), Some(&stale), &context)
        .await
        .unwrap_err();
    assert!(matches!(error, ScimError::VersionMismatch { .. }));
    assert_eq!(error.status(), 412);

    let error = provider
        .patch_resource("User", &id, &patch, Some(&stale), &context)
        .await
        .unwrap_err();
    assert!(matches!(error, ScimError::VersionMismatch { .. }));

    let error = provider
        .delete_resource("User", &id, Some(&stale), &context)
        .await
        .unwrap_err();
    assert!(matches!(error, ScimError::VersionMismatch { .. }));

    provider
        .delete_resource("User", &id, Some(patched.version()), &context)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_etag_round_trips_through_http_form() {
    let provider = common::provider();
    let context = common::context();
    let created = provider.create_resource("User", user("alice"), &context).await.unwrap();

    let header = created.etag().to_string();
    assert!(header.starts_with("W/\""));
    let parsed: HttpVersion = header.parse().unwrap();
    let raw = RawVersion::from(parsed);
    assert_eq!(&raw, created.version());
}

#[tokio::test]
async fn test_noop_patch_keeps_version_and_timestamp() {
    let provider = common::provider();
    let context = common::context();
    let created = provider.create_resource("User", user("alice"), &context).await.unwrap();
    let id = created.get_id().unwrap().to_string();

    let patch = PatchRequest::new(vec![PatchOperation::replace(Some("userName"), json!("alice"))]);
    let patched = provider
        .patch_resource("User", &id, &patch, None, &context)
        .await
        .unwrap();

    assert_eq!(patched.version(), created.version());
    assert_eq!(
        patched.resource().meta.as_ref().unwrap().last_modified,
        created.resource().meta.as_ref().unwrap().last_modified
    );
}

#[tokio::test]
async fn test_failed_patch_leaves_stored_resource() {
    let provider = common::provider();
    let context = common::context();
    let created = provider.create_resource("User", user("alice"), &context).await.unwrap();
    let id = created.get_id().unwrap().to_string();

    let patch = PatchRequest::new(vec![
        PatchOperation::replace(Some("title"), json!("Lead")),
        PatchOperation::remove(r#"emails[type eq "home"]"#),
    ]);
    let error = provider
        .patch_resource("User", &id, &patch, None, &context)
        .await
        .unwrap_err();
    assert_eq!(error.scim_type(), Some("noTarget"));

    let stored = provider.get_resource("User", &id, &context).await.unwrap().unwrap();
    assert_eq!(stored.version(), created.version());
    assert!(stored.resource().attributes.get("title").is_none());
}

#[tokio::test]
async fn test_patch_cannot_drop_required_attribute() {
    let provider = common::provider();
    let context = common::context();
    let created = provider.create_resource("User", user("alice"), &context).await.unwrap();
    let id = created.get_id().unwrap().to_string();

    let patch = PatchRequest::new(vec![PatchOperation::remove("userName")]);
    let result = provider
        .patch_resource("User", &id, &patch, Some(created.version()), &context)
        .await;
    assert_error_message_contains!(&result, "userName");
    assert_eq!(result.unwrap_err().status(), 400);

    let stored = provider.get_resource("User", &id, &context).await.unwrap().unwrap();
    assert_eq!(stored.resource().attributes["userName"], "alice");
    assert_eq!(stored.version(), created.version());
}

#[tokio::test]
async fn test_stale_delete_after_update_keeps_resource() {
    let provider = common::provider();
    let context = common::context();
    let created = provider.create_resource("User", user("alice"), &context).await.unwrap();
    let id = created.get_id().unwrap().to_string();

    provider
        .update_resource("User", &id, user("alice.smith"), Some(created.version()), &context)
        .await
        .unwrap();
    let error = provider
        .delete_resource("User", &id, Some(created.version()), &context)
        .await
        .unwrap_err();
    assert!(matches!(error, ScimError::VersionMismatch { .. }));

    let stored = provider.get_resource("User", &id, &context).await.unwrap().unwrap();
    assert_eq!(stored.resource().attributes["userName"], "alice.smith");
}

#[tokio::test]
async fn test_patch_cannot_steal_unique_value() {
    let provider = common::provider();
    let context = common::context();
    provider.create_resource("User", user("alice"), &context).await.unwrap();
    let bob = provider.create_resource("User", user("bob"), &context).await.unwrap();

    let patch = PatchRequest::new(vec![PatchOperation::replace(Some("userName"), json!("ALICE"))]);
    let error = provider
        .patch_resource("User", bob.get_id().unwrap(), &patch, None, &context)
        .await
        .unwrap_err();
    assert!(matches!(error, ScimError::Uniqueness { .. }));
    assert_eq!(error.status(), 409);
}

#[tokio::test]
async fn test_search_filters_sorts_and_pages() {
    let provider = common::provider();
    let context = common::context();
    for name in ["mallory", "alice", "Carol", "bob", "dave"] {
        provider.create_resource("User", user(name), &context).await.unwrap();
    }

    let request = SearchRequest::new()
        .with_filter(
            r#"emails[type eq "work" and value ew "@example.com"] and not (userName eq "dave")"#,
        )
        .with_sort("userName", SortOrder::Descending)
        .with_start_index(2)
        .with_count(2);
    let page = provider.search_resources("User", &request, &context).await.unwrap();

    assert_eq!(page.total_results, 4);
    assert_eq!(page.start_index, 2);
    let names: Vec<&str> = page
        .resources
        .iter()
        .map(|r| r.resource().attributes["userName"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Carol", "bob"]);
}

#[tokio::test]
async fn test_search_with_bad_filter_or_sort() {
    let provider = common::provider();
    let context = common::context();

    let result = provider
        .search_resources("User", &SearchRequest::new().with_filter("userName eq"), &context)
        .await;
    assert_scim_type!(result, "invalidFilter");

    let error = provider
        .search_resources(
            "User",
            &SearchRequest::new().with_sort("shoeSize", SortOrder::Ascending),
            &context,
        )
        .await
        .unwrap_err();
    assert_eq!(error.status(), 400);
}

#[tokio::test]
async fn test_resource_types_are_isolated() {
    let provider = common::provider();
    let context = common::context();
    provider.create_resource("User", user("alice"), &context).await.unwrap();
    provider
        .create_resource("Group", rfc_examples::group_basic(), &context)
        .await
        .unwrap();

    let users = provider.search_resources("User", &SearchRequest::new(), &context).await.unwrap();
    let groups = provider.search_resources("Group", &SearchRequest::new(), &context).await.unwrap();
    assert_eq!(users.total_results, 1);
    assert_eq!(groups.total_results, 1);
    assert_eq!(provider.storage().count("User").await.unwrap(), 1);
}

#[tokio::test]
async fn test_concurrent_creates() {
    let provider = common::provider();
    let context = common::context();

    let creates = (0..25).map(|i| {
        let provider = provider.clone();
        let context = context.clone();
        async move {
            provider
                .create_resource("User", user(&format!("user{}", i)), &context)
                .await
        }
    });
    let results = join_all(creates).await;

    assert!(results.iter().all(Result::is_ok));
    let mut ids: Vec<String> = results
        .into_iter()
        .map(|r| r.unwrap().get_id().unwrap().to_string())
        .collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 25);
    assert_eq!(provider.storage().count("User").await.unwrap(), 25);
}

#[tokio::test]
async fn test_concurrent_patches_apply_in_some_order() {
    let provider = common::provider();
    let context = common::context();
    let created = provider.create_resource("User", user("alice"), &context).await.unwrap();
    let id = created.get_id().unwrap().to_string();

    let patches = (0..10).map(|i| {
        let provider = provider.clone();
        let context = context.clone();
        let id = id.clone();
        tokio::spawn(async move {
            let request = PatchRequest::new(vec![PatchOperation::add(
                Some("emails"),
                json!({"value": format!("alias{}@example.com", i), "type": "other"}),
            )]);
            provider.patch_resource("User", &id, &request, None, &context).await
        })
    });

    let mut applied = 0;
    for result in join_all(patches).await {
        match result.unwrap() {
            Ok(_) => applied += 1,
            Err(ScimError::VersionMismatch { .. }) => {}
            Err(other) => panic!("unexpected error {:?}", other),
        }
    }

    let stored = provider.get_resource("User", &id, &context).await.unwrap().unwrap();
    let emails = stored.resource().attributes["emails"].as_array().unwrap().len();
    assert!(applied >= 1);
    assert_eq!(emails, 1 + applied);
}

#[tokio::test]
async fn test_handler_conditional_replace_and_projection() {
    use scim_engine::ScimOperationRequest;

    let handler = common::handler();
    let created = handler
        .handle_operation(
            ScimOperationRequest::create("Group", rfc_examples::group_basic())
                .with_excluded_attributes("members"),
        )
        .await;
    assert_eq!(created.status, 201);
    let body = created.body.unwrap();
    assert!(body.get("members").is_none());
    assert_eq!(body["schemas"], json!([common::GROUP_SCHEMA]));
    let id = body["id"].as_str().unwrap().to_string();
    let etag = created.etag.unwrap();

    let replacement = json!({"schemas": [common::GROUP_SCHEMA], "displayName": "Guides"});
    let replaced = handler
        .handle_operation(
            ScimOperationRequest::replace("Group", &id, replacement.clone())
                .with_if_match(etag.clone()),
        )
        .await;
    assert_eq!(replaced.status, 200);
    assert_ne!(replaced.etag, Some(etag.clone()));

    let stale = handler
        .handle_operation(
            ScimOperationRequest::replace("Group", &id, replacement).with_if_match(etag),
        )
        .await;
    assert_eq!(stale.status, 412);
    assert!(!stale.is_success());
}
