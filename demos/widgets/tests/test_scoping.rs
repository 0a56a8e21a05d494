//! Scopes over the bundled widget fixture, compared against the equivalent
//! plain filters and excludes.

use chrono::NaiveDate;
use easy_scoping_core::Settings;
use easy_scoping_db::{Manager, Value, Q};
use easy_scoping_scopes::{ScopeArgs, ScopedQuerySet};
use easy_scoping_test::assertions::assert_queryset_equal;
use easy_scoping_test::test_database::TestDatabase;
use widgets_demo::models::Widget;
use widgets_demo::{fixture_loader, WIDGET_FIXTURE};

fn setup() -> (TestDatabase, Manager<Widget>) {
    let db = TestDatabase::new();
    db.load_fixture(&fixture_loader(&Settings::default()), WIDGET_FIXTURE)
        .unwrap();
    let objects = db.manager::<Widget>();
    (db, objects)
}

fn kwargs<const N: usize>(pairs: [(&str, &str); N]) -> Q {
    Q::from_kwargs(pairs).unwrap()
}

fn y2k() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()
}

#[test]
fn test_db_data_loaded() {
    let (_db, objects) = setup();
    assert_eq!(objects.all().count().unwrap(), 336);
}

#[test]
fn test_passing_many_kwargs() {
    let (_db, objects) = setup();
    let obj1 = objects.filter(kwargs([("color", "blue"), ("size", "small")]));
    let obj2 = objects
        .all()
        .scope_with("take_kwargs", &ScopeArgs::keywords([("color", "blue"), ("size", "small")]))
        .unwrap();
    assert_queryset_equal(&obj1, &obj2);
    assert_eq!(obj1.count().unwrap(), obj2.count().unwrap());

    let obj3 = objects
        .all()
        .scope_with("take_kwargs", &ScopeArgs::keywords([("size", "small"), ("color", "blue")]))
        .unwrap();
    assert_queryset_equal(&obj1, &obj3);
    assert_eq!(obj1.count().unwrap(), obj3.count().unwrap());
    assert_eq!(obj1.count().unwrap(), 8);
}

#[test]
fn test_passing_kwargs() {
    let (_db, objects) = setup();
    let obj1 = objects.filter(Q::from_kwarg("color", "blue"));
    let obj2 = objects
        .all()
        .scope_with("take_kwargs", &ScopeArgs::new().kwarg("color", "blue"))
        .unwrap();
    assert_queryset_equal(&obj1, &obj2);
    assert_eq!(obj1.count().unwrap(), obj2.count().unwrap());
}

#[test]
fn test_passing_many_args() {
    let (_db, objects) = setup();
    let obj1 = objects.filter(kwargs([("color", "blue"), ("size", "small")]));
    let obj2 = objects
        .all()
        .scope_with("take_more_args", &ScopeArgs::positional(["blue", "small"]))
        .unwrap();
    assert_queryset_equal(&obj1, &obj2);
    assert_eq!(obj1.count().unwrap(), obj2.count().unwrap());
}

#[test]
fn test_passing_args() {
    let (_db, objects) = setup();
    let obj1 = objects.filter(Q::from_kwarg("color", "blue"));
    let obj2 = objects
        .all()
        .scope_with("take_args", &ScopeArgs::positional(["blue"]))
        .unwrap();
    assert_queryset_equal(&obj1, &obj2);
    assert_eq!(obj1.count().unwrap(), obj2.count().unwrap());
}

#[test]
fn test_mixed_args_and_kwargs() {
    let (_db, objects) = setup();
    let obj1 = objects.filter(kwargs([("color", "blue"), ("size", "small")]));
    let obj2 = objects
        .all()
        .scope_with("take_more_args", &ScopeArgs::new().arg("blue").kwarg("size", "small"))
        .unwrap();
    assert_queryset_equal(&obj1, &obj2);

    let err = objects
        .all()
        .scope_with("take_args", &ScopeArgs::positional(["blue", "small"]))
        .unwrap_err();
    assert!(err.to_string().contains("positional"));
}

#[test]
fn test_no_scope_registered() {
    let (_db, objects) = setup();
    let err = objects.all().scope("not_a_scope").unwrap_err();
    assert!(err.is_unresolved());
    assert!(objects.all().scope("not_not_a_scope").unwrap_err().is_unresolved());
}

#[test]
fn test_redundant_chain() {
    let (_db, objects) = setup();
    let obj1 = objects.all().scope("basic_query_widget").unwrap();
    let obj2 = obj1.clone().scope("basic_query_widget").unwrap();
    assert_queryset_equal(&obj1, &obj2);
    assert_eq!(obj1.count().unwrap(), obj2.count().unwrap());
    assert_eq!(obj1.get().unwrap(), obj2.get().unwrap());

    let not_obj1 = objects.all().scope("not_basic_query_widget").unwrap();
    let not_obj2 = not_obj1.clone().scope("not_basic_query_widget").unwrap();
    assert_queryset_equal(&not_obj1, &not_obj2);
    assert_eq!(not_obj1.count().unwrap(), not_obj2.count().unwrap());
}

#[test]
fn test_query_widget() {
    let (_db, objects) = setup();
    let conditions = [("color", "blue"), ("size", "small"), ("shape", "circle")];
    let obj1 = objects.filter(kwargs(conditions));
    let obj2 = objects.all().scope("basic_query_widget").unwrap();
    assert_queryset_equal(&obj1, &obj2);
    assert_eq!(obj1.count().unwrap(), obj2.count().unwrap());
    assert_eq!(obj1.get().unwrap(), obj2.get().unwrap());

    let not_obj1 = objects.exclude(kwargs(conditions));
    let not_obj2 = objects.all().scope("not_basic_query_widget").unwrap();
    assert_queryset_equal(&not_obj1, &not_obj2);
    assert_eq!(not_obj1.count().unwrap(), not_obj2.count().unwrap());
    assert_eq!(not_obj2.count().unwrap(), 335);
}

#[test]
fn test_query_chaining() {
    let (_db, objects) = setup();
    let obj1 = objects
        .filter(Q::from_kwarg("color", "blue"))
        .filter(Q::from_kwarg("size", "small"))
        .filter(Q::from_kwarg("shape", "circle"));
    let obj2 = objects
        .all()
        .scope("blue")
        .unwrap()
        .scope("small")
        .unwrap()
        .scope("circle")
        .unwrap();
    assert_queryset_equal(&obj1, &obj2);
    assert_eq!(obj1.count().unwrap(), obj2.count().unwrap());
    assert_eq!(obj1.get().unwrap(), obj2.get().unwrap());

    let not_obj1 = objects
        .exclude(Q::from_kwarg("color", "blue"))
        .exclude(Q::from_kwarg("size", "small"))
        .exclude(Q::from_kwarg("shape", "circle"));
    let not_obj2 = objects
        .all()
        .scope("not_blue")
        .unwrap()
        .scope("not_small")
        .unwrap()
        .scope("not_circle")
        .unwrap();
    assert_queryset_equal(&not_obj1, &not_obj2);
    assert_eq!(not_obj1.count().unwrap(), not_obj2.count().unwrap());
    assert_eq!(not_obj2.count().unwrap(), 6 * 5 * 7);
}

#[test]
fn test_chain_order_does_not_matter() {
    let (_db, objects) = setup();
    let obj1 = objects
        .all()
        .scope("blue")
        .unwrap()
        .scope("small")
        .unwrap()
        .scope("circle")
        .unwrap();
    let obj2 = objects
        .all()
        .scope("circle")
        .unwrap()
        .scope("small")
        .unwrap()
        .scope("blue")
        .unwrap();
    assert_queryset_equal(&obj1, &obj2);
    assert_eq!(obj1.get().unwrap(), obj2.get().unwrap());
}

#[test]
fn test_chain_order_with_negation() {
    let (_db, objects) = setup();
    let obj1 = objects.all().scope("not_blue").unwrap().scope("small").unwrap();
    let obj2 = objects.all().scope("small").unwrap().scope("not_blue").unwrap();
    assert_queryset_equal(&obj1, &obj2);
    assert_eq!(obj1.count().unwrap(), obj2.count().unwrap());

    let expected = objects
        .filter(Q::from_kwarg("size", "small"))
        .exclude(Q::from_kwarg("color", "blue"));
    assert_queryset_equal(&expected, &obj2);

    let obj3 = objects
        .all()
        .scope("not_circle")
        .unwrap()
        .scope("before_y2k")
        .unwrap()
        .scope("not_blue")
        .unwrap();
    let obj4 = objects
        .all()
        .scope("not_blue")
        .unwrap()
        .scope("not_circle")
        .unwrap()
        .scope("before_y2k")
        .unwrap();
    assert_queryset_equal(&obj3, &obj4);
}

#[test]
fn test_query_blue() {
    let (_db, objects) = setup();
    let obj1 = objects.filter(Q::from_kwarg("color", "blue"));
    let obj2 = objects.all().scope("blue").unwrap();
    assert_eq!(obj1.count().unwrap(), obj2.count().unwrap());
    assert_queryset_equal(&obj1, &obj2);

    let not_obj1 = objects.exclude(Q::from_kwarg("color", "blue"));
    let not_obj2 = objects.all().scope("not_blue").unwrap();
    assert_eq!(not_obj1.count().unwrap(), not_obj2.count().unwrap());
    assert_queryset_equal(&not_obj1, &not_obj2);
    assert_eq!(obj2.count().unwrap() + not_obj2.count().unwrap(), 336);
}

#[test]
fn test_before_y2k() {
    let (_db, objects) = setup();
    let obj1 = objects.filter(Q::from_kwarg("used_on__lte", Value::Date(y2k())));
    let obj2 = objects.all().scope("before_y2k").unwrap();
    assert_queryset_equal(&obj1, &obj2);
    assert_eq!(obj1.count().unwrap(), obj2.count().unwrap());

    let not_obj1 = objects.exclude(Q::from_kwarg("used_on__lte", Value::Date(y2k())));
    let not_obj2 = objects.all().scope("not_before_y2k").unwrap();
    assert_queryset_equal(&not_obj1, &not_obj2);
    assert_eq!(not_obj1.count().unwrap(), not_obj2.count().unwrap());
}

#[test]
fn test_after_y2k() {
    let (_db, objects) = setup();
    let obj1 = objects.filter(Q::from_kwarg("used_on__gte", Value::Date(y2k())));
    let obj2 = objects.all().scope("after_y2k").unwrap();
    assert_queryset_equal(&obj1, &obj2);
    assert_eq!(obj1.count().unwrap(), obj2.count().unwrap());

    let not_obj1 = objects.exclude(Q::from_kwarg("used_on__gte", Value::Date(y2k())));
    let not_obj2 = objects.all().scope("not_after_y2k").unwrap();
    assert_queryset_equal(&not_obj1, &not_obj2);
    assert_eq!(not_obj1.count().unwrap(), not_obj2.count().unwrap());
}

#[test]
fn test_unused_widgets_fall_on_the_negated_side() {
    let (_db, objects) = setup();
    let unused = objects.filter(Q::from_kwarg("used_on__isnull", true));
    let unused_count = unused.count().unwrap();
    assert!(unused_count > 0);

    let before = objects.all().scope("before_y2k").unwrap().count().unwrap();
    let not_before = objects.all().scope("not_before_y2k").unwrap();
    assert_eq!(before + not_before.count().unwrap(), 336);
    assert_eq!(
        not_before.filter(Q::from_kwarg("used_on__isnull", true)).count().unwrap(),
        unused_count
    );
}
