//! Filter parsing and evaluation over RFC 7643 example resources.

use crate::common::{self, CONTRACTOR_SCHEMA, ENTERPRISE_SCHEMA, fixtures::rfc_examples};
use scim_engine::error::{FilterError, ScimError};
use scim_engine::config::FilterConfig;
use scim_engine::filter::{matches, parse, parse_with_config};
use serde_json::json;

fn eval_user(text: &str) -> Result<bool, FilterError> {
    let registry = common::registry();
    let users = registry.resource_schema("User").unwrap();
    let user = common::resource("User", rfc_examples::user_full());
    matches(&parse(text)?, &user, &users)
}

#[test]
fn test_user_name_matches_case_insensitively() {
    let registry = common::registry();
    let users = registry.resource_schema("User").unwrap();
    let user = common::resource(
        "User",
        json!({"schemas": [common::USER_SCHEMA], "userName": "BJensen"}),
    );

    let filter = parse(r#"userName eq "bjensen""#).unwrap();
    assert!(matches(&filter, &user, &users).unwrap());
}

#[test]
fn test_value_filter_needs_one_element_to_satisfy_all_clauses() {
    let registry = common::registry();
    let users = registry.resource_schema("User").unwrap();
    let user = common::resource(
        "User",
        json!({
            "schemas": [common::USER_SCHEMA],
            "userName": "bjensen",
            "emails": [
                {"value": "bjensen@example.com", "type": "work"},
                {"value": "babs@jensen.org", "type": "home"}
            ]
        }),
    );

    let filter = parse(r#"emails[type eq "work" and value co "example.com"]"#).unwrap();
    assert!(matches(&filter, &user, &users).unwrap());

    // Each clause holds for some element, but never for the same one
    let split = parse(r#"emails[type eq "home" and value co "example.com"]"#).unwrap();
    assert!(!matches(&split, &user, &users).unwrap());
}

#[test]
fn test_rfc_filter_examples() {
    assert!(eval_user(r#"name.familyName co "O'Malley""#).map(|m| !m).unwrap());
    assert!(eval_user(r#"userName sw "J""#).map(|m| !m).unwrap());
    assert!(eval_user(r#"userName sw "bj""#).unwrap());
    assert!(eval_user(r#"title pr"#).unwrap());
    assert!(eval_user(r#"title pr and userType eq "Employee""#).unwrap());
    assert!(eval_user(r#"title pr or userType eq "Intern""#).unwrap());
    assert!(
        eval_user(
            r#"userType eq "Employee" and (emails co "example.com" or emails.value co "example.org")"#
        )
        .unwrap()
    );
    assert!(!eval_user(r#"userType ne "Employee" and not (emails co "example.com")"#).unwrap());
    assert!(
        eval_user(r#"emails[type eq "work" and value co "@example.com"] or nickName eq "x""#)
            .unwrap()
    );
}

#[test]
fn test_extension_attributes_are_addressable() {
    let text = format!(r#"{}:department eq "tour operations""#, ENTERPRISE_SCHEMA);
    assert!(eval_user(&text).unwrap());

    let text = format!(r#"{}:employeeNumber pr"#, ENTERPRISE_SCHEMA);
    assert!(eval_user(&text).unwrap());

    let text = format!(r#"{}:manager pr"#, ENTERPRISE_SCHEMA);
    assert!(!eval_user(&text).unwrap());
}

#[test]
fn test_boolean_and_datetime_literals() {
    assert!(eval_user("active eq true").unwrap());
    assert!(!eval_user("active eq false").unwrap());
    assert!(eval_user(r#"meta.created lt "2011-01-01T00:00:00Z""#).unwrap());
    assert!(eval_user(r#"meta.lastModified ge "2011-05-13T04:42:34Z""#).unwrap());
}

#[test]
fn test_id_is_case_exact() {
    assert!(eval_user(r#"id eq "2819c223-7f76-453a-919d-413861904646""#).unwrap());
    assert!(!eval_user(r#"id eq "2819C223-7F76-453A-919D-413861904646""#).unwrap());
    assert!(eval_user(r#"externalId eq "701984""#).unwrap());
}

#[test]
fn test_unknown_attribute_short_circuits_only_when_decided() {
    assert!(eval_user(r#"userName pr or shoeSize eq "9""#).unwrap());
    assert!(matches!(
        eval_user(r#"userName pr and shoeSize eq "9""#),
        Err(FilterError::Evaluation { .. })
    ));
}

#[test]
fn test_malformed_filters_are_syntax_errors() {
    for text in [
        r#"userName eq "unterminated"#,
        r#"(userName eq "a""#,
        r#"emails[type eq "work""#,
        r#"userName like "a""#,
        r#"userName eq"#,
        r#"9userName eq "a""#,
        "",
    ] {
        assert!(
            matches!(parse(text), Err(FilterError::Syntax { .. })),
            "expected syntax error for {:?}",
            text
        );
    }
}

#[test]
fn test_depth_limit() {
    let config = FilterConfig { max_depth: 4 };
    let deep = format!("{}userName pr{}", "(".repeat(8), ")".repeat(8));
    assert!(matches!(
        parse_with_config(&deep, &config),
        Err(FilterError::Syntax { .. })
    ));
    assert!(parse(&deep).is_ok());
}

#[test]
fn test_value_filter_on_non_complex_attribute_fails_at_evaluation() {
    // The parser accepts it; only the schema knows `userName` is a plain string
    let filter = parse(r#"userName[value eq "x"]"#).unwrap();
    let registry = common::registry();
    let users = registry.resource_schema("User").unwrap();
    let user = common::resource("User", rfc_examples::user_minimal());
    assert!(matches!(
        matches(&filter, &user, &users),
        Err(FilterError::Evaluation { .. })
    ));
}

#[test]
fn test_filter_errors_map_to_invalid_filter() {
    let error = ScimError::from(parse("userName eq").unwrap_err());
    assert_eq!(error.status(), 400);
    assert_eq!(error.scim_type(), Some("invalidFilter"));
}

#[test]
fn test_group_members_filter() {
    let registry = common::registry();
    let groups = registry.resource_schema("Group").unwrap();
    let group = common::resource("Group", rfc_examples::group_basic());

    let filter = parse(r#"members[display sw "babs"]"#).unwrap();
    assert!(matches(&filter, &group, &groups).unwrap());
    let filter = parse(r#"members.value eq "902c246b-6245-4190-8e05-00816be7344a""#).unwrap();
    assert!(matches(&filter, &group, &groups).unwrap());
}

#[test]
fn test_custom_schema_unqualified_names_resolve_to_core() {
    let registry = common::contractor_registry();
    let contractors = registry.resource_schema("Contractor").unwrap();
    let contractor = common::resource(
        "Contractor",
        json!({
            "schemas": [CONTRACTOR_SCHEMA],
            "userName": "temp01",
            "emails": [{"value": "temp01@agency.example"}]
        }),
    );

    let by_domain = parse(r#"emails.value ew "agency.example""#).unwrap();
    assert!(matches(&by_domain, &contractor, &contractors).unwrap());
    let by_type = parse(r#"emails.type eq "work""#).unwrap();
    assert!(matches(&by_type, &contractor, &contractors).is_err());
}
