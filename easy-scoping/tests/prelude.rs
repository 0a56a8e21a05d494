use std::sync::{Arc, LazyLock};

use easy_scoping::prelude::*;

#[derive(Debug, Clone, PartialEq)]
struct Lamp {
    id: i64,
    room: String,
    watts: i64,
}

impl Model for Lamp {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new("home", "lamp").fields(vec![
                FieldDef::new("id", FieldType::AutoField).primary_key(),
                FieldDef::new("room", FieldType::CharField),
                FieldDef::new("watts", FieldType::IntegerField),
            ])
        });
        &META
    }

    fn pk(&self) -> Option<Value> {
        Some(Value::Int(self.id))
    }

    fn field_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", Value::Int(self.id)),
            ("room", Value::from(self.room.as_str())),
            ("watts", Value::Int(self.watts)),
        ]
    }

    fn from_row(row: &Row) -> ScopingResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            room: row.get("room")?,
            watts: row.get("watts")?,
        })
    }
}

fn lamps() -> Manager<Lamp> {
    let objects = Manager::new(Arc::new(MemoryDatabase::new()));
    for (room, watts) in [("kitchen", 60), ("kitchen", 100), ("hall", 40), ("study", 100)] {
        objects
            .create(vec![("room", Value::from(room)), ("watts", Value::Int(watts))])
            .unwrap();
    }
    objects
}

#[test]
fn test_explicit_registry_through_prelude() {
    let objects = lamps();
    let registry: ScopeRegistry<Lamp> = ScopeRegistry::with_negation_prefix("without_");
    registry
        .register_scope_fn("kitchen", filter_scope(Q::from_kwarg("room", "kitchen")))
        .unwrap();
    registry.register_scope_fn("in_room", fields_scope(&["room"])).unwrap();
    registry
        .register_aggregate("watts", |qs, _| qs.aggregate(AggregateFunc::Sum, "watts"))
        .unwrap();

    let kitchen = registry
        .apply_scope(objects.all(), "kitchen", &ScopeArgs::new())
        .unwrap();
    assert_eq!(kitchen.count().unwrap(), 2);
    assert_eq!(
        registry.run_aggregate(&kitchen, "watts", &ScopeArgs::new()).unwrap(),
        Value::Int(160)
    );

    let elsewhere = registry
        .dispatch(objects.all(), "without_kitchen", &ScopeArgs::new())
        .unwrap();
    let Dispatched::QuerySet(elsewhere) = elsewhere else {
        panic!("a negated scope yields a query set");
    };
    assert_eq!(elsewhere.count().unwrap(), 2);

    let err = registry
        .apply_scope(objects.all(), "not_kitchen", &ScopeArgs::new())
        .unwrap_err();
    assert!(err.is_unresolved());

    let hall = registry
        .apply_scope(objects.all(), "in_room", &ScopeArgs::positional(["hall"]))
        .unwrap();
    assert_eq!(hall.get().unwrap().watts, 40);

    registry.clear();
    assert!(registry.is_empty());
}

#[test]
fn test_settings_default_prefix() {
    assert_eq!(Settings::default().negation_prefix, "not_");
    let err = ScopingError::UnresolvedName {
        model: "home.lamp".to_string(),
        name: "dim".to_string(),
    };
    assert!(err.is_unresolved());
}
