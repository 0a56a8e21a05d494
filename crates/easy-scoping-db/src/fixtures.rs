//! Loading Django-format JSON fixtures into an executor.
//!
//! A fixture is a JSON array of objects shaped like
//! `{"model": "app.model", "pk": 1, "fields": {...}}`. Each model named in a
//! fixture must be registered with the [`FixtureLoader`] so its fields can be
//! coerced and validated.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use easy_scoping_core::{ScopingError, ScopingResult, Settings};

use crate::executor::DbExecutor;
use crate::model::{Model, ModelMeta, Row};

/// Loads fixtures for a set of registered models.
#[derive(Debug, Default)]
pub struct FixtureLoader {
    models: HashMap<String, &'static ModelMeta>,
    fixture_dirs: Vec<PathBuf>,
}

impl FixtureLoader {
    /// Creates a loader with no models and no search directories.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loader that searches the settings' fixture directories.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            models: HashMap::new(),
            fixture_dirs: settings.fixture_dirs.clone(),
        }
    }

    /// Registers a model so fixtures may reference it by label.
    #[must_use]
    pub fn register<M: Model>(mut self) -> Self {
        self.models.insert(M::label().to_string(), M::meta());
        self
    }

    /// Adds a directory to search for named fixtures.
    #[must_use]
    pub fn fixture_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fixture_dirs.push(dir.into());
        self
    }

    /// Resolves a fixture name to a file.
    ///
    /// An existing path wins; otherwise `<name>` and `<name>.json` are looked
    /// up in each fixture directory in order.
    pub fn find(&self, name: &str) -> Option<PathBuf> {
        let path = Path::new(name);
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        let with_ext = if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
            name.to_string()
        } else {
            format!("{name}.json")
        };
        if Path::new(&with_ext).is_file() {
            return Some(PathBuf::from(with_ext));
        }
        self.fixture_dirs
            .iter()
            .map(|dir| dir.join(&with_ext))
            .find(|candidate| candidate.is_file())
    }

    /// Finds and loads a named fixture, returning the number of objects.
    pub fn load(&self, db: &dyn DbExecutor, name: &str) -> ScopingResult<usize> {
        let path = self
            .find(name)
            .ok_or_else(|| ScopingError::ConfigurationError(format!("Fixture not found: {name}")))?;
        self.load_file(db, &path)
    }

    /// Loads a fixture file.
    pub fn load_file(&self, db: &dyn DbExecutor, path: &Path) -> ScopingResult<usize> {
        tracing::info!("Loading fixture: {}", path.display());
        let content = std::fs::read_to_string(path)?;
        let count = self.load_str(db, &content)?;
        tracing::info!("Loaded {count} object(s) from {}", path.display());
        Ok(count)
    }

    /// Loads fixture objects from a JSON string.
    ///
    /// Objects are inserted in order; an object whose primary key is already
    /// stored replaces it.
    pub fn load_str(&self, db: &dyn DbExecutor, json: &str) -> ScopingResult<usize> {
        let objects: Vec<serde_json::Value> = serde_json::from_str(json)?;
        for (index, object) in objects.iter().enumerate() {
            let (meta, row) = self.object_to_row(object).map_err(|e| match e {
                ScopingError::SerializationError(msg) => {
                    ScopingError::SerializationError(format!("Fixture object {index}: {msg}"))
                }
                other => other,
            })?;
            let pk = meta.pk_field().map_or("id", |f| f.name);
            db.insert(&meta.db_table, pk, row)?;
        }
        Ok(objects.len())
    }

    fn object_to_row(&self, object: &serde_json::Value) -> ScopingResult<(&'static ModelMeta, Row)> {
        let label = object
            .get("model")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| ScopingError::SerializationError("missing \"model\"".to_string()))?;
        let meta = *self.models.get(&label.to_ascii_lowercase()).ok_or_else(|| {
            ScopingError::SerializationError(format!("unknown model '{label}'"))
        })?;
        let fields = object
            .get("fields")
            .and_then(serde_json::Value::as_object)
            .ok_or_else(|| ScopingError::SerializationError("missing \"fields\"".to_string()))?;

        let mut values = Vec::with_capacity(fields.len() + 1);
        if let (Some(pk), Some(pk_field)) = (object.get("pk"), meta.pk_field()) {
            values.push((pk_field.name, pk_field.coerce_json(pk)?));
        }
        for (name, json) in fields {
            let field = meta.field(name).ok_or_else(|| {
                ScopingError::SerializationError(format!("{} has no field named '{name}'", meta.label))
            })?;
            values.push((field.name, field.coerce_json(json)?));
        }

        let cleaned = meta.clean(values)?;
        Ok((meta, Row::from_pairs(cleaned)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{FieldDef, FieldType};
    use crate::memory::MemoryDatabase;
    use crate::query::Query;
    use crate::value::Value;
    use std::io::Write;
    use std::sync::LazyLock;

    struct Tag;

    impl Model for Tag {
        fn meta() -> &'static ModelMeta {
            static META: LazyLock<ModelMeta> = LazyLock::new(|| {
                ModelMeta::new("labels", "tag").fields(vec![
                    FieldDef::new("id", FieldType::AutoField).primary_key(),
                    FieldDef::new("name", FieldType::CharField).max_length(8),
                    FieldDef::new("added", FieldType::DateField).nullable(),
                ])
            });
            &META
        }

        fn pk(&self) -> Option<Value> {
            None
        }

        fn field_values(&self) -> Vec<(&'static str, Value)> {
            Vec::new()
        }

        fn from_row(_row: &Row) -> ScopingResult<Self> {
            Ok(Self)
        }
    }

    const FIXTURE: &str = r#"[
        {"model": "labels.tag", "pk": 1, "fields": {"name": "alpha", "added": "1999-01-02"}},
        {"model": "labels.tag", "pk": 2, "fields": {"name": "beta"}}
    ]"#;

    fn loader() -> FixtureLoader {
        FixtureLoader::new().register::<Tag>()
    }

    #[test]
    fn test_load_str() {
        let db = MemoryDatabase::new();
        assert_eq!(loader().load_str(&db, FIXTURE).unwrap(), 2);
        let rows = db.query(&Query::new("labels_tag", "id")).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get_value("added"), Some(&Value::Null));
        assert_eq!(
            rows[0].get_value("added"),
            Some(&Value::Date(chrono::NaiveDate::from_ymd_opt(1999, 1, 2).unwrap()))
        );
    }

    #[test]
    fn test_load_twice_replaces() {
        let db = MemoryDatabase::new();
        loader().load_str(&db, FIXTURE).unwrap();
        loader().load_str(&db, FIXTURE).unwrap();
        assert_eq!(db.table_len("labels_tag"), 2);
    }

    #[test]
    fn test_unknown_model() {
        let db = MemoryDatabase::new();
        let err = FixtureLoader::new().load_str(&db, FIXTURE).unwrap_err();
        assert!(err.to_string().contains("unknown model"));
    }

    #[test]
    fn test_unknown_field() {
        let db = MemoryDatabase::new();
        let json = r#"[{"model": "labels.tag", "pk": 1, "fields": {"colour": "red"}}]"#;
        let err = loader().load_str(&db, json).unwrap_err();
        assert!(err.to_string().contains("colour"));
    }

    #[test]
    fn test_validation_failure() {
        let db = MemoryDatabase::new();
        let json = r#"[{"model": "labels.tag", "pk": 1, "fields": {"name": "far-too-long"}}]"#;
        let err = loader().load_str(&db, json).unwrap_err();
        assert!(matches!(err, ScopingError::ValidationError(_)));
    }

    #[test]
    fn test_find_in_fixture_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("tags.json")).unwrap();
        file.write_all(FIXTURE.as_bytes()).unwrap();

        let loader = loader().fixture_dir(dir.path());
        assert_eq!(loader.find("tags"), Some(dir.path().join("tags.json")));
        assert!(loader.find("missing").is_none());

        let db = MemoryDatabase::new();
        assert_eq!(loader.load(&db, "tags").unwrap(), 2);
    }

    #[test]
    fn test_load_missing_fixture() {
        let db = MemoryDatabase::new();
        let err = loader().load(&db, "no_such_fixture").unwrap_err();
        assert!(matches!(err, ScopingError::ConfigurationError(_)));
    }
}
