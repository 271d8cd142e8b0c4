use std::sync::Arc;

use bson::{Bson, doc};
use proptest::prelude::*;
use restlite::registry::{FilteredKeys, ModelRegistry};
use restlite::schema::{ModelSchema, Schema};
use restlite::types::AccessLevel;
use restlite::visibility::{FilterOptions, VisibilityFilter};

fn field_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "name".to_string(),
        "password".to_string(),
        "email".to_string(),
        "age".to_string(),
        "bio".to_string(),
        "token".to_string(),
    ])
}

fn arb_doc() -> impl Strategy<Value = Bson> {
    prop::collection::vec((field_name(), any::<i64>()), 0..8).prop_map(|fields| {
        let mut d = bson::Document::new();
        for (k, v) in fields {
            d.insert(k, Bson::Int64(v));
        }
        Bson::Document(d)
    })
}

fn filter() -> VisibilityFilter {
    let mut reg = ModelRegistry::new();
    reg.register(
        ModelSchema::new("users", Schema::new()),
        FilteredKeys::new(&["password", "token"], &["email"]),
    );
    VisibilityFilter::new(Arc::new(reg))
}

proptest! {
    #[test]
    fn prop_filtering_is_idempotent(mut doc in arb_doc()) {
        let vis = filter();
        let opts = FilterOptions::new("users", AccessLevel::Public);
        vis.filter_document(&mut doc, &opts);
        let once = doc.clone();
        vis.filter_document(&mut doc, &opts);
        prop_assert_eq!(doc, once);
    }

    #[test]
    fn prop_public_access_never_leaks_hidden_fields(mut doc in arb_doc()) {
        let vis = filter();
        vis.filter_document(&mut doc, &FilterOptions::new("users", AccessLevel::Public));
        if let Bson::Document(d) = &doc {
            prop_assert!(d.get("password").is_none());
            prop_assert!(d.get("token").is_none());
            prop_assert!(d.get("email").is_none());
        }
    }

    #[test]
    fn prop_private_access_is_a_no_op(doc in arb_doc()) {
        let vis = filter();
        let mut filtered = doc.clone();
        vis.filter_document(&mut filtered, &FilterOptions::new("users", AccessLevel::Private));
        prop_assert_eq!(filtered, doc);
    }

    #[test]
    fn prop_access_monotonicity(
        private in prop::collection::vec(field_name(), 0..4),
        protected in prop::collection::vec(field_name(), 0..4),
    ) {
        let mut reg = ModelRegistry::new();
        let private_refs: Vec<&str> = private.iter().map(String::as_str).collect();
        let protected_refs: Vec<&str> = protected.iter().map(String::as_str).collect();
        reg.register(
            ModelSchema::new("m", Schema::new()),
            FilteredKeys::new(&private_refs, &protected_refs),
        );
        let none = reg.excluded_fields("m", AccessLevel::Private);
        let mid = reg.excluded_fields("m", AccessLevel::Protected);
        let all = reg.excluded_fields("m", AccessLevel::Public);
        prop_assert!(none.is_empty());
        prop_assert!(mid.iter().all(|k| all.contains(k)));
        prop_assert!(none.iter().all(|k| mid.contains(k)));
    }
}

#[test]
fn filtered_keys_union_through_population_is_idempotent_too() {
    let mut reg = ModelRegistry::new();
    reg.register(
        ModelSchema::new("users", Schema::new()),
        FilteredKeys::new(&["password"], &[]),
    );
    let vis = VisibilityFilter::new(Arc::new(reg));
    let opts = FilterOptions::new("users", AccessLevel::Protected);
    let mut doc = Bson::Array(vec![
        Bson::Document(doc! {"name": "a", "password": "x"}),
        Bson::Document(doc! {"name": "b"}),
    ]);
    vis.filter_document(&mut doc, &opts);
    let once = doc.clone();
    vis.filter_document(&mut doc, &opts);
    assert_eq!(doc, once);
}
