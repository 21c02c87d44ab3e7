//! PATCH engine scenarios: targeting, mutability, idempotence and atomicity.

use crate::common::{self, CONTRACTOR_SCHEMA, ENTERPRISE_SCHEMA, fixtures::rfc_examples};
use scim_engine::config::{FilterConfig, PatchConfig};
use scim_engine::error::{PatchError, PatchFailure, ScimError};
use scim_engine::patch::{PatchEngine, PatchOperation, PatchRequest, apply};
use scim_engine::Resource;
use serde_json::{Value, json};

fn bjensen() -> Resource {
    common::resource(
        "User",
        json!({
            "schemas": [common::USER_SCHEMA],
            "id": "2819c223",
            "userName": "bjensen",
            "emails": [
                {"value": "bjensen@example.com", "type": "work"},
                {"value": "babs@jensen.org", "type": "home"}
            ]
        }),
    )
}

fn patch_user(
    resource: &Resource,
    operations: Vec<PatchOperation>,
) -> Result<Resource, PatchError> {
    let registry = common::registry();
    let users = registry.resource_schema("User").unwrap();
    apply(resource, &operations, &users)
}

fn contractor(data: Value) -> Resource {
    common::resource("Contractor", data)
}

#[test]
fn test_remove_filtered_element_keeps_the_rest() {
    let patched = patch_user(
        &bjensen(),
        vec![PatchOperation::remove(r#"emails[type eq "work"]"#)],
    )
    .unwrap();

    assert_eq!(
        patched.attributes["emails"],
        json!([{"value": "babs@jensen.org", "type": "home"}])
    );
}

#[test]
fn test_add_sub_attribute_creates_parent() {
    let patched = patch_user(
        &bjensen(),
        vec![PatchOperation::add(Some("name.givenName"), json!("Bob"))],
    )
    .unwrap();
    assert_eq!(patched.attributes["name"], json!({"givenName": "Bob"}));
}

#[test]
fn test_immutable_sub_attribute_can_be_set_once() {
    let registry = common::contractor_registry();
    let contractors = registry.resource_schema("Contractor").unwrap();
    let unnamed = contractor(json!({"schemas": [CONTRACTOR_SCHEMA], "userName": "temp01"}));

    let named = apply(
        &unnamed,
        &[PatchOperation::add(Some("name.givenName"), json!("Bob"))],
        &contractors,
    )
    .unwrap();
    assert_eq!(named.attributes["name"]["givenName"], "Bob");

    let error = apply(
        &named,
        &[PatchOperation::add(Some("name.givenName"), json!("Robert"))],
        &contractors,
    )
    .unwrap_err();
    assert_eq!(error.index, 0);
    assert!(matches!(
        error.reason,
        PatchFailure::AttemptToModifyImmutable { ref mutability, .. } if mutability == "immutable"
    ));
    assert_eq!(ScimError::from(error).scim_type(), Some("mutability"));

    // Siblings of an immutable sub-attribute stay writable
    let renamed = apply(
        &named,
        &[PatchOperation::replace(Some("name.familyName"), json!("Jensen"))],
        &contractors,
    )
    .unwrap();
    assert_eq!(renamed.attributes["name"]["givenName"], "Bob");
}

#[test]
fn test_immutable_attribute_cannot_be_removed() {
    let registry = common::contractor_registry();
    let contractors = registry.resource_schema("Contractor").unwrap();
    let badged = contractor(json!({
        "schemas": [CONTRACTOR_SCHEMA],
        "userName": "temp01",
        "badgeNumber": "B-17"
    }));

    let error = apply(&badged, &[PatchOperation::remove("badgeNumber")], &contractors).unwrap_err();
    assert!(matches!(error.reason, PatchFailure::AttemptToModifyImmutable { .. }));
}

#[test]
fn test_path_against_schema_without_sub_attribute_is_unknown() {
    let registry = common::contractor_registry();
    let contractors = registry.resource_schema("Contractor").unwrap();
    let resource = contractor(json!({
        "schemas": [CONTRACTOR_SCHEMA],
        "userName": "temp01",
        "emails": [{"value": "temp01@agency.example"}]
    }));

    let error = apply(
        &resource,
        &[PatchOperation::replace(Some("emails.type"), json!("work"))],
        &contractors,
    )
    .unwrap_err();
    assert!(matches!(error.reason, PatchFailure::Attribute(_)));
    assert_eq!(ScimError::from(error).scim_type(), Some("invalidPath"));
}

#[test]
fn test_non_ascii_path_is_invalid() {
    for path in ["abcé", "nämé.givenName", r#"emails[typé eq "work"]"#] {
        let error = patch_user(&bjensen(), vec![PatchOperation::replace(Some(path), json!("x"))])
            .unwrap_err();
        assert_eq!(error.index, 0);
        assert_eq!(ScimError::from(error).scim_type(), Some("invalidPath"), "{}", path);
    }
}

#[test]
fn test_add_is_not_idempotent_but_replace_is() {
    let email = json!({"value": "b@new.org", "type": "other"});

    let add = || vec![PatchOperation::add(Some("emails"), email.clone())];
    let once = patch_user(&bjensen(), add()).unwrap();
    let twice = patch_user(&once, add()).unwrap();
    assert_eq!(once.attributes["emails"].as_array().unwrap().len(), 3);
    assert_eq!(twice.attributes["emails"].as_array().unwrap().len(), 4);

    let replace = || vec![PatchOperation::replace(Some("emails"), json!([email.clone()]))];
    let once = patch_user(&bjensen(), replace()).unwrap();
    let twice = patch_user(&once, replace()).unwrap();
    assert_eq!(once, twice);
    assert_eq!(twice.attributes["emails"], json!([email]));
}

#[test]
fn test_failure_is_atomic_and_reports_index() {
    let original = bjensen();
    let error = patch_user(
        &original,
        vec![
            PatchOperation::replace(Some("displayName"), json!("Babs")),
            PatchOperation::add(Some("nickName"), json!("B")),
            PatchOperation::replace(Some("active"), json!("yes")),
        ],
    )
    .unwrap_err();

    assert_eq!(error.index, 2);
    assert!(matches!(error.reason, PatchFailure::InvalidValue(_)));
    assert_eq!(original, bjensen());
}

#[test]
fn test_replace_filtered_sub_attribute_touches_only_matches() {
    let patched = patch_user(
        &bjensen(),
        vec![PatchOperation::replace(
            Some(r#"emails[type eq "home"].value"#),
            json!("babs@jensen.net"),
        )],
    )
    .unwrap();

    assert_eq!(
        patched.attributes["emails"],
        json!([
            {"value": "bjensen@example.com", "type": "work"},
            {"value": "babs@jensen.net", "type": "home"}
        ])
    );
}

#[test]
fn test_extension_attributes_by_urn_path() {
    let path = format!("{}:department", ENTERPRISE_SCHEMA);
    let patched = patch_user(
        &bjensen(),
        vec![PatchOperation::add(Some(path.as_str()), json!("Theme Park"))],
    )
    .unwrap();
    assert_eq!(patched.extension(ENTERPRISE_SCHEMA).unwrap()["department"], "Theme Park");

    let removed = patch_user(&patched, vec![PatchOperation::remove(&path)]).unwrap();
    assert!(
        removed
            .extension(ENTERPRISE_SCHEMA)
            .is_none_or(|ext| ext.get("department").is_none())
    );
}

#[test]
fn test_read_only_attributes_are_protected() {
    let full = common::resource("User", rfc_examples::user_full());
    let error = patch_user(&full, vec![PatchOperation::replace(Some("id"), json!("other"))])
        .unwrap_err();
    assert!(matches!(error.reason, PatchFailure::AttemptToModifyImmutable { .. }));
}

#[test]
fn test_strict_and_lenient_remove() {
    let registry = common::registry();
    let users = registry.resource_schema("User").unwrap();
    let operations = [PatchOperation::remove(r#"emails[type eq "other"]"#)];

    let strict = PatchEngine::default().apply(&bjensen(), &operations, &users);
    assert!(matches!(
        strict.map_err(|e| e.reason),
        Err(PatchFailure::NoSuchTarget { .. })
    ));

    let lenient = PatchEngine::new(PatchConfig { strict_remove: false }, FilterConfig::default());
    assert_eq!(lenient.apply(&bjensen(), &operations, &users).unwrap(), bjensen());
}

#[test]
fn test_request_wire_form() {
    let request = PatchRequest::from_json(json!({
        "schemas": ["urn:ietf:params:scim:api:messages:2.0:PatchOp"],
        "Operations": [
            {"op": "Add", "path": "nickName", "value": "Babs"},
            {"op": "remove", "path": "emails[type eq \"home\"]"},
            {"op": "replace", "value": {"title": "Guide"}}
        ]
    }))
    .unwrap();
    request.validate().unwrap();

    let patched = patch_user(&bjensen(), request.operations).unwrap();
    assert_eq!(patched.attributes["nickName"], "Babs");
    assert_eq!(patched.attributes["title"], "Guide");
    assert_eq!(patched.attributes["emails"].as_array().unwrap().len(), 1);
}

#[test]
fn test_request_requires_patch_schema() {
    let missing = PatchRequest::from_json(json!({
        "schemas": ["urn:ietf:params:scim:api:messages:2.0:ListResponse"],
        "Operations": [{"op": "add", "path": "nickName", "value": "x"}]
    }))
    .and_then(|request| request.validate());
    assert!(missing.is_err());

    let unknown_op = PatchRequest::from_json(json!({
        "schemas": ["urn:ietf:params:scim:api:messages:2.0:PatchOp"],
        "Operations": [{"op": "move", "path": "nickName"}]
    }));
    assert!(unknown_op.is_err());
}
