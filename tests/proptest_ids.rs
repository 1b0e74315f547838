//! Property-based tests using proptest
//!
//! These tests verify identity handling, schema planning and the data
//! source identity builder using randomized inputs.

use std::collections::BTreeSet;

use proptest::prelude::*;
use serde_json::json;
use tcdb_provider::data_source::SecurityGroupsQuery;
use tcdb_provider::resource::id;
use tcdb_provider::resource::schema::PlanAction;
use tcdb_provider::resource::security_group::{attachment_id, parse_attachment_id, SCHEMA as ATTACHMENT_SCHEMA};
use tcdb_provider::resource::account::SCHEMA as ACCOUNT_SCHEMA;

/// Generate an id segment that never contains the separators
fn arb_segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,20}"
}

fn arb_instance_ids() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("dcdbt-[a-z0-9]{4,8}", 1..6)
}

proptest! {
    /// Joining then splitting returns the original segments
    #[test]
    fn composite_id_splits_back(a in arb_segment(), b in arb_segment()) {
        let joined = id::join(&[&a, &b]);
        let [x, y] = id::split::<2>(&joined).unwrap();
        prop_assert_eq!(x, a.as_str());
        prop_assert_eq!(y, b.as_str());
    }

    /// Any other segment count is rejected
    #[test]
    fn wrong_segment_count_is_broken(parts in prop::collection::vec(arb_segment(), 1..6)) {
        prop_assume!(parts.len() != 2);
        let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
        let joined = id::join(&refs);
        prop_assert!(id::split::<2>(&joined).is_err());
    }

    /// Attachment ids do not depend on instance order
    #[test]
    fn attachment_id_is_order_independent(ids in arb_instance_ids(), sg in "sg-[a-z0-9]{8}") {
        let id = attachment_id(&ids, &sg);
        let (parsed, parsed_sg) = parse_attachment_id(&id).unwrap();
        prop_assert_eq!(parsed, ids);
        prop_assert_eq!(parsed_sg, sg.as_str());
    }

    /// Data source identity always starts with the fixed prefix
    #[test]
    fn query_identity_prefix(
        name in proptest::option::of("[a-z]{1,10}"),
        project_id in proptest::option::of(0i64..1000)
    ) {
        let query = SecurityGroupsQuery { name: name.clone(), project_id, ..Default::default() };
        let identity = query.identity();
        prop_assert!(identity.starts_with("securityGroups-"));
        if let Some(name) = name {
            let expected = format!("securityGroups-{}-", name);
            prop_assert!(identity.starts_with(&expected));
        }
        if let Some(project_id) = project_id {
            prop_assert!(identity.ends_with(&project_id.to_string()));
        }
    }

    /// Set order never produces a plan
    #[test]
    fn set_order_is_noop(ids in arb_instance_ids()) {
        let forward: Vec<&String> = ids.iter().collect();
        let backward: Vec<&String> = ids.iter().rev().collect();
        let prior = json!({"product": "dcdb", "security_group_id": "sg-1", "instance_ids": forward});
        let desired = json!({"product": "dcdb", "security_group_id": "sg-1", "instance_ids": backward});
        prop_assert_eq!(ATTACHMENT_SCHEMA.plan(Some(&prior), &desired).action, PlanAction::NoOp);
    }

    /// Any description change on an account is an in-place update
    #[test]
    fn description_change_is_update(old in "[a-z ]{0,20}", new in "[a-z ]{1,20}") {
        prop_assume!(old != new);
        let base = json!({"instance_id": "ins-1", "user_name": "u1", "host": "%", "password": "p"});
        let mut prior = base.clone();
        prior["description"] = json!(old);
        let mut desired = base;
        desired["description"] = json!(new);
        prop_assert_eq!(ACCOUNT_SCHEMA.plan(Some(&prior), &desired).action, PlanAction::Update);
    }
}
