use bson::{Bson, doc};
use restlite::errors::RestError;
use restlite::query::{PopulateDirective, QueryCompiler, RawQuery, RawValue, Sort, compile_query};

fn raw(pairs: &[(&str, &str)]) -> RawQuery {
    pairs.iter().map(|(k, v)| (k.to_string(), RawValue::from(*v))).collect()
}

#[test]
fn operator_translation() {
    let compiler = QueryCompiler::new(false);
    let spec = compiler.compile(&raw(&[("query", r#"{"age":">=21"}"#)])).unwrap();
    assert_eq!(spec.filter, Some(doc! {"age": {"$gte": "21"}}));

    let spec = compiler.compile(&raw(&[("query", r#"{"tags":["a","b"]}"#)])).unwrap();
    assert_eq!(spec.filter, Some(doc! {"tags": {"$in": ["a", "b"]}}));
}

#[test]
fn tilde_translates_to_case_insensitive_regex() {
    let spec =
        QueryCompiler::new(true).compile(&raw(&[("query", r#"{"age":"~jo"}"#)])).unwrap();
    let filter = spec.filter.unwrap();
    let Some(Bson::RegularExpression(re)) = filter.get("age") else {
        panic!("expected regex, got {filter:?}");
    };
    assert_eq!(re.pattern.to_string(), "jo");
    assert_eq!(re.options.to_string(), "i");
}

#[test]
fn regex_gating() {
    let err = QueryCompiler::new(false)
        .compile(&raw(&[("query", r#"{"a":"~x"}"#)]))
        .unwrap_err();
    assert!(matches!(err, RestError::RegexNotAllowed));
    assert!(QueryCompiler::new(true).compile(&raw(&[("query", r#"{"a":"~x"}"#)])).is_ok());
}

#[test]
fn malformed_filter_json_reports_the_key() {
    let err = QueryCompiler::new(false).compile(&raw(&[("query", "{bad json")])).unwrap_err();
    match err {
        RestError::InvalidQuerySyntax { key, .. } => assert_eq!(key, "query"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn select_normalization_mixed_signs() {
    let spec = QueryCompiler::new(false).compile(&raw(&[("select", "foo,-bar")])).unwrap();
    assert_eq!(spec.select, Some(doc! {"foo": 1, "bar": 0}));
}

#[test]
fn populate_select_reconciliation() {
    let spec = QueryCompiler::new(false)
        .compile(&raw(&[("populate", "foo"), ("select", "foo.bar,foo.baz")]))
        .unwrap();
    assert_eq!(spec.select, None);
    assert_eq!(spec.populate, vec![PopulateDirective {
        path: "foo".into(),
        select: Some("bar baz".into()),
        criteria: None,
        options: None,
    }]);
}

#[test]
fn empty_query_string_compiles_to_empty_spec() {
    let spec = QueryCompiler::new(false).compile(&RawQuery::new()).unwrap();
    assert_eq!(spec.filter, None);
    assert_eq!(spec.select, None);
    assert_eq!(spec.sort, None);
    assert_eq!(spec.limit, None);
    assert_eq!(spec.skip, None);
    assert_eq!(spec.distinct, None);
    assert!(spec.populate.is_empty());
}

#[test]
fn full_query_string_round_trip() {
    let spec = QueryCompiler::new(false)
        .compile(&raw(&[
            ("query", r#"{"age":">21","tags":["a","b"]}"#),
            ("sort", r#"{"age":-1}"#),
            ("select", "name,age"),
            ("limit", "25"),
            ("skip", "50"),
            ("populate", "creator"),
        ]))
        .unwrap();
    assert_eq!(
        spec.filter,
        Some(doc! {"age": {"$gt": "21"}, "tags": {"$in": ["a", "b"]}})
    );
    assert_eq!(spec.sort, Some(Sort::Fields(doc! {"age": -1})));
    // populate keeps the relation visible in the surviving projection
    assert_eq!(spec.select, Some(doc! {"name": 1, "age": 1, "creator": 1}));
    assert_eq!(spec.limit, Some(25));
    assert_eq!(spec.skip, Some(50));
    assert_eq!(spec.populate, vec![PopulateDirective::path("creator")]);
}

#[test]
fn distinct_field_is_carried() {
    let spec = QueryCompiler::new(false).compile(&raw(&[("distinct", "city")])).unwrap();
    assert_eq!(spec.distinct.as_deref(), Some("city"));
}

#[test]
fn curried_compile_form() {
    let compile = compile_query(false);
    let spec = compile(&raw(&[("limit", "7")])).unwrap();
    assert_eq!(spec.limit, Some(7));
}
