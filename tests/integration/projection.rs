//! Attribute projection over RFC 7643 resources.

use crate::common::{self, CONTRACTOR_SCHEMA, ENTERPRISE_SCHEMA, fixtures::rfc_examples};
use scim_engine::attributes::{AttributeSelection, resolve};
use scim_engine::error::{AttributeError, ScimError};
use serde_json::json;

fn select_user(attributes: Option<&str>, excluded: Option<&str>) -> serde_json::Value {
    let registry = common::registry();
    let users = registry.resource_schema("User").unwrap();
    let user = common::resource("User", rfc_examples::user_full());
    AttributeSelection::from_params(attributes, excluded, &users)
        .unwrap()
        .apply(&user, &users)
        .to_json()
}

#[test]
fn test_default_projection_never_leaks_password() {
    let shown = select_user(None, None);
    assert!(shown.get("password").is_none());
    assert_eq!(shown["userName"], "bjensen@example.com");
    assert_eq!(shown[ENTERPRISE_SCHEMA]["department"], "Tour Operations");
    assert!(shown.get("meta").is_some());
}

#[test]
fn test_include_returns_named_plus_always() {
    let shown = select_user(Some("userName,name.familyName"), None);
    let obj = shown.as_object().unwrap();

    let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["id", "name", "schemas", "userName"]);
    assert_eq!(shown["name"], json!({"familyName": "Jensen"}));
}

#[test]
fn test_include_extension_attribute_by_urn() {
    let selection = format!("{}:employeeNumber", ENTERPRISE_SCHEMA);
    let shown = select_user(Some(&selection), None);

    assert_eq!(shown[ENTERPRISE_SCHEMA], json!({"employeeNumber": "701984"}));
    assert!(shown.get("userName").is_none());
    assert!(shown.get("id").is_some());
}

#[test]
fn test_exclude_hides_named_only() {
    let shown = select_user(None, Some("emails,phoneNumbers,name.middleName"));

    assert!(shown.get("emails").is_none());
    assert!(shown.get("phoneNumbers").is_none());
    assert!(shown["name"].get("middleName").is_none());
    assert_eq!(shown["name"]["givenName"], "Barbara");
    assert_eq!(shown["title"], "Tour Guide");
}

#[test]
fn test_always_attributes_survive_exclusion() {
    let shown = select_user(None, Some("id,userName"));
    assert_eq!(shown["id"], "2819c223-7f76-453a-919d-413861904646");
    assert!(shown.get("userName").is_none());
}

#[test]
fn test_request_attributes_need_explicit_include() {
    let registry = common::contractor_registry();
    let contractors = registry.resource_schema("Contractor").unwrap();
    let contractor = common::resource(
        "Contractor",
        json!({
            "schemas": [CONTRACTOR_SCHEMA],
            "id": "c-1",
            "userName": "temp01",
            "agency": "Acme Staffing"
        }),
    );

    let default = AttributeSelection::all().apply(&contractor, &contractors);
    assert!(!default.attributes.contains_key("agency"));
    assert_eq!(default.id.as_deref(), Some("c-1"));

    let named = AttributeSelection::from_params(Some("agency"), None, &contractors)
        .unwrap()
        .apply(&contractor, &contractors);
    assert_eq!(named.attributes["agency"], "Acme Staffing");
    assert!(!named.attributes.contains_key("userName"));
}

#[test]
fn test_unknown_attribute_in_selection_is_rejected() {
    let registry = common::contractor_registry();
    let contractors = registry.resource_schema("Contractor").unwrap();

    let error = resolve(["emails.type"], &contractors).unwrap_err();
    assert!(matches!(error, AttributeError::UnknownAttribute { .. }));

    let error =
        AttributeSelection::from_params(Some("emails.type"), None, &contractors).unwrap_err();
    assert!(matches!(error, ScimError::Attribute(AttributeError::UnknownAttribute { .. })));
    assert_eq!(error.status(), 400);
}

#[test]
fn test_both_parameters_rejected() {
    let registry = common::registry();
    let users = registry.resource_schema("User").unwrap();
    let error =
        AttributeSelection::from_params(Some("userName"), Some("title"), &users).unwrap_err();
    assert_eq!(error.scim_type(), Some("invalidSyntax"));
}

#[test]
fn test_group_members_projection() {
    let registry = common::registry();
    let groups = registry.resource_schema("Group").unwrap();
    let group = common::resource("Group", rfc_examples::group_basic());

    let shown = AttributeSelection::from_params(Some("members.value"), None, &groups)
        .unwrap()
        .apply(&group, &groups)
        .to_json();
    assert_eq!(
        shown["members"],
        json!([
            {"value": "2819c223-7f76-453a-919d-413861904646"},
            {"value": "902c246b-6245-4190-8e05-00816be7344a"}
        ])
    );
    assert!(shown.get("displayName").is_none());
}

#[test]
fn test_projection_leaves_source_untouched() {
    let registry = common::registry();
    let users = registry.resource_schema("User").unwrap();
    let user = common::resource("User", rfc_examples::user_full());
    let before = user.clone();

    let selection = AttributeSelection::from_params(None, Some("emails"), &users).unwrap();
    let mut projected = selection.apply(&user, &users);
    projected.attributes.insert("title".to_string(), json!("changed"));

    assert_eq!(user, before);
}
