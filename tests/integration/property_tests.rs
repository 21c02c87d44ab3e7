//! Property-based tests for engine invariants.
//!
//! Uses proptest to generate filters, attribute selections and PATCH requests
//! against a fixed RFC 7643 User, checking the invariants every input must keep.

use crate::common::{self, fixtures::rfc_examples};
use proptest::prelude::*;
use scim_engine::ResourceProvider;
use scim_engine::attributes::AttributeSelection;
use scim_engine::filter::{matches, parse};
use scim_engine::patch::{PatchOperation, apply};
use scim_engine::providers::SearchRequest;
use scim_engine::resource::RawVersion;
use serde_json::{Value, json};

/// Single-valued string attributes of the User schema, some absent from the fixture
fn string_attribute_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "userName",
        "displayName",
        "nickName",
        "title",
        "userType",
        "locale",
        "name.givenName",
        "name.familyName",
        "emails.value",
        "emails.type",
        "addresses.locality",
    ])
}

fn literal_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9@. ]{0,10}"
}

prop_compose! {
    fn comparison_strategy()
        (attribute in string_attribute_strategy(),
         op in prop::sample::select(vec!["eq", "ne", "co", "sw", "ew"]),
         literal in literal_strategy())
        -> String {
        format!(r#"{} {} "{}""#, attribute, op, literal)
    }
}

fn term_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        comparison_strategy(),
        string_attribute_strategy().prop_map(|attribute| format!("{} pr", attribute)),
    ]
}

fn selection_strategy() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(
        vec![
            "password",
            "userName",
            "name",
            "name.givenName",
            "emails",
            "emails.value",
            "title",
            "meta",
            "meta.version",
            "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User:department",
        ],
        0..5,
    )
}

prop_compose! {
    fn email_strategy()
        (local in "[a-z]{1,8}", kind in prop::sample::select(vec!["work", "home", "other"]))
        -> Value {
        json!({"value": format!("{}@example.com", local), "type": kind})
    }
}

fn evaluate(text: &str) -> bool {
    let registry = common::registry();
    let users = registry.resource_schema("User").unwrap();
    let user = common::resource("User", rfc_examples::user_full());
    matches(&parse(text).unwrap(), &user, &users).unwrap()
}

proptest! {
    #[test]
    fn prop_generated_filters_parse_and_evaluate(term in term_strategy()) {
        let registry = common::registry();
        let users = registry.resource_schema("User").unwrap();
        let user = common::resource("User", rfc_examples::user_full());
        let filter = parse(&term).unwrap();

        // Evaluation is a pure function of filter and resource
        let first = matches(&filter, &user, &users).unwrap();
        let second = matches(&filter, &user, &users).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_logical_operators_follow_boolean_algebra(a in term_strategy(), b in term_strategy()) {
        let (left, right) = (evaluate(&a), evaluate(&b));

        prop_assert_eq!(evaluate(&format!("{} and {}", a, b)), left && right);
        prop_assert_eq!(evaluate(&format!("{} or {}", a, b)), left || right);
        prop_assert_eq!(evaluate(&format!("not ({})", a)), !left);
        prop_assert_eq!(
            evaluate(&format!("not ({} and {})", a, b)),
            evaluate(&format!("not ({}) or not ({})", a, b))
        );
    }

    #[test]
    fn prop_projection_never_returns_password(
        selected in selection_strategy(),
        exclude in any::<bool>()
    ) {
        let registry = common::registry();
        let users = registry.resource_schema("User").unwrap();
        let user = common::resource("User", rfc_examples::user_full());

        let tokens: Vec<String> = selected.iter().map(|s| s.to_string()).collect();
        let selection = if exclude {
            AttributeSelection::from_tokens(&[], &tokens, &users)
        } else {
            AttributeSelection::from_tokens(&tokens, &[], &users)
        }
        .unwrap();
        let shown = selection.apply(&user, &users).to_json();

        prop_assert!(shown.get("password").is_none());
        prop_assert_eq!(&shown["id"], &json!("2819c223-7f76-453a-919d-413861904646"));
        if !exclude && !selected.is_empty() {
            prop_assert!(shown.get("phoneNumbers").is_none());
        }
    }

    #[test]
    fn prop_replace_is_idempotent(
        title in "[A-Za-z ]{1,12}",
        emails in prop::collection::vec(email_strategy(), 1..4)
    ) {
        let registry = common::registry();
        let users = registry.resource_schema("User").unwrap();
        let user = common::resource("User", rfc_examples::user_full());
        let operations = vec![
            PatchOperation::replace(Some("title"), json!(title)),
            PatchOperation::replace(Some("emails"), Value::Array(emails)),
        ];

        let once = apply(&user, &operations, &users).unwrap();
        let twice = apply(&once, &operations, &users).unwrap();
        prop_assert_eq!(RawVersion::from_resource(&once), RawVersion::from_resource(&twice));
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_add_appends_every_time(email in email_strategy(), times in 1usize..4) {
        let registry = common::registry();
        let users = registry.resource_schema("User").unwrap();
        let mut user = common::resource("User", rfc_examples::user_full());
        let before = user.attributes["emails"].as_array().unwrap().len();

        for _ in 0..times {
            let operations = [PatchOperation::add(Some("emails"), email.clone())];
            user = apply(&user, &operations, &users).unwrap();
        }
        prop_assert_eq!(user.attributes["emails"].as_array().unwrap().len(), before + times);
    }

    #[test]
    fn prop_failing_operation_rolls_back_everything(
        titles in prop::collection::vec("[A-Za-z]{1,8}", 0..5)
    ) {
        let registry = common::registry();
        let users = registry.resource_schema("User").unwrap();
        let user = common::resource("User", rfc_examples::user_full());

        let mut operations: Vec<PatchOperation> = titles
            .iter()
            .map(|title| PatchOperation::replace(Some("title"), json!(title)))
            .collect();
        operations.push(PatchOperation::remove(r#"emails[type eq "pager"]"#));

        let error = apply(&user, &operations, &users).unwrap_err();
        prop_assert_eq!(error.index, titles.len());
        prop_assert_eq!(&user, &common::resource("User", rfc_examples::user_full()));
    }

    #[test]
    fn prop_created_users_are_found_by_exact_filter(
        names in prop::collection::hash_set("[a-z][a-z0-9]{0,10}", 1..6)
    ) {
        let provider = common::provider();
        let context = common::context();

        tokio_test::block_on(async {
            for name in &names {
                provider
                    .create_resource(
                        "User",
                        json!({"schemas": [common::USER_SCHEMA], "userName": name}),
                        &context,
                    )
                    .await
                    .unwrap();
            }

            for name in &names {
                let request = SearchRequest::new()
                    .with_filter(format!(r#"userName eq "{}""#, name.to_uppercase()));
                let page = provider.search_resources("User", &request, &context).await.unwrap();
                assert_eq!(page.total_results, 1);
                assert_eq!(page.resources[0].resource().attributes["userName"], json!(name));
            }

            let all = provider
                .search_resources("User", &SearchRequest::new(), &context)
                .await
                .unwrap();
            assert_eq!(all.total_results, names.len());
        });
    }
}
