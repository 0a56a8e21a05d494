//! Database executor trait and model create/save helpers.
//!
//! [`DbExecutor`] is the seam between the query layer and storage. Every
//! [`QuerySet`](crate::query::QuerySet) holds an executor and hands it the
//! [`Query`] AST when a terminal method runs. [`MemoryDatabase`](crate::memory::MemoryDatabase)
//! is the bundled implementation; test harnesses wrap it to count queries.

use easy_scoping_core::{ScopingError, ScopingResult};

use crate::model::Model;
use crate::query::{AggregateFunc, Query, Row};
use crate::value::Value;

/// Minimal synchronous database executor.
///
/// Implementors must be shareable across threads; query sets keep an
/// `Arc<dyn DbExecutor>`.
pub trait DbExecutor: Send + Sync {
    /// Evaluates a query and returns the matching rows in order.
    fn query(&self, query: &Query) -> ScopingResult<Vec<Row>>;

    /// Returns the number of rows a query matches.
    fn count(&self, query: &Query) -> ScopingResult<i64> {
        let rows = self.query(query)?;
        i64::try_from(rows.len())
            .map_err(|e| ScopingError::DatabaseError(format!("Row count overflow: {e}")))
    }

    /// Computes an aggregate over one column of a query's rows.
    fn aggregate(&self, query: &Query, func: AggregateFunc, column: &str) -> ScopingResult<Value> {
        let rows = self.query(query)?;
        compute_aggregate(&rows, func, column)
    }

    /// Inserts a row, or replaces the row with the same primary key.
    ///
    /// A `Null` primary key is assigned by the executor. Returns the stored
    /// primary key.
    fn insert(&self, table: &str, pk: &str, row: Row) -> ScopingResult<Value>;

    /// Removes every row from a table.
    fn truncate(&self, table: &str) -> ScopingResult<()>;
}

/// Computes an aggregate over already-fetched rows.
///
/// `Count` over `"*"` counts rows; every other form skips `Null` values.
/// `Sum`, `Avg`, `Min` and `Max` return `Null` when no values remain.
pub fn compute_aggregate(rows: &[Row], func: AggregateFunc, column: &str) -> ScopingResult<Value> {
    if func == AggregateFunc::Count && column == "*" {
        return Ok(Value::Int(i64::try_from(rows.len()).unwrap_or(i64::MAX)));
    }

    let mut values = Vec::with_capacity(rows.len());
    for row in rows {
        let value = row.get_value(column).ok_or_else(|| {
            ScopingError::FieldError(format!("Cannot aggregate over unknown field '{column}'"))
        })?;
        if !value.is_null() {
            values.push(value.clone());
        }
    }

    match func {
        AggregateFunc::Count => Ok(Value::Int(i64::try_from(values.len()).unwrap_or(i64::MAX))),
        AggregateFunc::Sum => sum(&values, column),
        AggregateFunc::Avg => {
            if values.is_empty() {
                return Ok(Value::Null);
            }
            let total = sum(&values, column)?
                .as_float()
                .unwrap_or_default();
            Ok(Value::Float(total / values.len() as f64))
        }
        AggregateFunc::Min | AggregateFunc::Max => {
            let mut best: Option<Value> = None;
            for value in values {
                let replace = match &best {
                    None => true,
                    Some(current) => {
                        let ordering = value.compare(current).ok_or_else(|| {
                            ScopingError::DatabaseError(format!(
                                "Cannot compare {value:?} with {current:?} in '{column}'"
                            ))
                        })?;
                        if func == AggregateFunc::Min {
                            ordering.is_lt()
                        } else {
                            ordering.is_gt()
                        }
                    }
                };
                if replace {
                    best = Some(value);
                }
            }
            Ok(best.unwrap_or(Value::Null))
        }
    }
}

fn sum(values: &[Value], column: &str) -> ScopingResult<Value> {
    if values.is_empty() {
        return Ok(Value::Null);
    }
    if values.iter().all(|v| matches!(v, Value::Int(_))) {
        let total = values.iter().filter_map(Value::as_int).sum();
        return Ok(Value::Int(total));
    }
    let mut total = 0.0;
    for value in values {
        total += value.as_float().ok_or_else(|| {
            ScopingError::DatabaseError(format!("Cannot sum non-numeric value {value:?} in '{column}'"))
        })?;
    }
    Ok(Value::Float(total))
}

// ── Model helpers ──────────────────────────────────────────────────────

/// Validates field values, inserts them, and returns the stored instance.
///
/// Missing fields take their defaults. The primary key is assigned by the
/// executor when it is not supplied.
pub fn create_model<M: Model>(
    db: &dyn DbExecutor,
    values: Vec<(&'static str, Value)>,
) -> ScopingResult<M> {
    let cleaned = M::meta().clean(values)?;
    let mut row = Row::from_pairs(cleaned);
    let pk = db.insert(M::table_name(), M::pk_field_name(), row.clone())?;
    row.set(M::pk_field_name(), pk);
    tracing::trace!(model = M::label(), "created instance");
    M::from_row(&row)
}

/// Writes an existing instance back, replacing the stored row.
pub fn save_model<M: Model>(db: &dyn DbExecutor, model: &M) -> ScopingResult<Value> {
    let cleaned = M::meta().clean(model.field_values())?;
    db.insert(M::table_name(), M::pk_field_name(), Row::from_pairs(cleaned))
}
