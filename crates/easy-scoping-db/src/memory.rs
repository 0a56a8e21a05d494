//! In-memory executor.
//!
//! [`MemoryDatabase`] stores rows per table and interprets the [`Query`] AST
//! directly. Set operations compare rows by primary key.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};

use easy_scoping_core::{ScopingError, ScopingResult};

use crate::executor::DbExecutor;
use crate::query::{CompoundType, OrderBy, Query, Row};
use crate::value::Value;

#[derive(Debug, Default)]
struct Table {
    rows: Vec<Row>,
    next_id: i64,
}

/// A thread-safe, in-memory table store.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryDatabase {
    /// Creates an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of rows stored in a table.
    pub fn table_len(&self, table: &str) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(table)
            .map_or(0, |t| t.rows.len())
    }

    fn evaluate(tables: &HashMap<String, Table>, query: &Query) -> ScopingResult<Vec<Row>> {
        if query.is_none {
            return Ok(Vec::new());
        }

        let source = match &query.source {
            Some(inner) => Self::evaluate(tables, inner)?,
            None => tables
                .get(&query.table)
                .map(|t| t.rows.clone())
                .unwrap_or_default(),
        };

        let mut rows = match &query.where_clause {
            Some(node) => {
                let mut kept = Vec::with_capacity(source.len());
                for row in source {
                    if node.matches(&row)? {
                        kept.push(row);
                    }
                }
                kept
            }
            None => source,
        };

        for compound in &query.compound_queries {
            let other = Self::evaluate(tables, &compound.other)?;
            let other_keys = pk_set(&other, &query.pk);
            match compound.compound_type {
                CompoundType::Union => {
                    let mut seen = pk_set(&rows, &query.pk);
                    for row in other {
                        if seen.insert(pk_key(&row, &query.pk)) {
                            rows.push(row);
                        }
                    }
                }
                CompoundType::Intersect => {
                    rows.retain(|row| other_keys.contains(&pk_key(row, &query.pk)));
                }
                CompoundType::Except => {
                    rows.retain(|row| !other_keys.contains(&pk_key(row, &query.pk)));
                }
            }
        }

        if !query.order_by.is_empty() {
            sort_rows(&mut rows, &query.order_by);
        }

        let offset = query.offset.unwrap_or(0);
        Ok(rows
            .into_iter()
            .skip(offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect())
    }
}

fn pk_key(row: &Row, pk: &str) -> String {
    row.get_value(pk).map_or_else(String::new, ToString::to_string)
}

fn pk_set(rows: &[Row], pk: &str) -> HashSet<String> {
    rows.iter().map(|row| pk_key(row, pk)).collect()
}

/// Stable sort. `Null` sorts before everything else, incomparable values
/// keep their relative order.
fn sort_rows(rows: &mut [Row], order_by: &[OrderBy]) {
    rows.sort_by(|a, b| {
        for order in order_by {
            let left = a.get_value(&order.column).unwrap_or(&Value::Null);
            let right = b.get_value(&order.column).unwrap_or(&Value::Null);
            let ordering = match (left.is_null(), right.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => left.compare(right).unwrap_or(Ordering::Equal),
            };
            let ordering = if order.descending {
                ordering.reverse()
            } else {
                ordering
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

impl DbExecutor for MemoryDatabase {
    fn query(&self, query: &Query) -> ScopingResult<Vec<Row>> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let rows = Self::evaluate(&tables, query)?;
        tracing::trace!(table = %query.table, rows = rows.len(), "evaluated query");
        Ok(rows)
    }

    fn insert(&self, table: &str, pk: &str, mut row: Row) -> ScopingResult<Value> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let table = tables.entry(table.to_string()).or_insert_with(|| Table {
            rows: Vec::new(),
            next_id: 1,
        });

        let key = match row.get_value(pk) {
            None | Some(Value::Null) => {
                let id = Value::Int(table.next_id);
                row.set(pk, id.clone());
                id
            }
            Some(existing) => existing.clone(),
        };
        match key {
            Value::Int(id) => table.next_id = table.next_id.max(id + 1),
            Value::String(_) => {}
            ref other => {
                return Err(ScopingError::DatabaseError(format!(
                    "Unsupported primary key value {other:?} for column '{pk}'"
                )));
            }
        }

        let key_text = key.to_string();
        match table
            .rows
            .iter_mut()
            .find(|stored| pk_key(stored, pk) == key_text)
        {
            Some(stored) => *stored = row,
            None => table.rows.push(row),
        }
        Ok(key)
    }

    fn truncate(&self, table: &str) -> ScopingResult<()> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(t) = tables.get_mut(table) {
            tracing::debug!(table, rows = t.rows.len(), "truncating table");
            t.rows.clear();
            t.next_id = 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{CompoundQuery, WhereNode, Q};

    const TABLE: &str = "widgets_widget";

    fn seeded() -> MemoryDatabase {
        let db = MemoryDatabase::new();
        for (color, size) in [("blue", "small"), ("red", "small"), ("blue", "large"), ("green", "tiny")] {
            db.insert(
                TABLE,
                "id",
                Row::from_pairs([
                    ("id", Value::Null),
                    ("color", Value::from(color)),
                    ("size", Value::from(size)),
                ]),
            )
            .unwrap();
        }
        db
    }

    fn filtered(q: Q) -> Query {
        Query::new(TABLE, "id").and_where(WhereNode::from_q(&q))
    }

    fn ids(rows: &[Row]) -> Vec<i64> {
        rows.iter().map(|r| r.get::<i64>("id").unwrap()).collect()
    }

    #[test]
    fn test_insert_assigns_ids() {
        let db = seeded();
        assert_eq!(db.table_len(TABLE), 4);
        let rows = db.query(&Query::new(TABLE, "id")).unwrap();
        assert_eq!(ids(&rows), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_insert_replaces_same_pk() {
        let db = seeded();
        let pk = db
            .insert(
                TABLE,
                "id",
                Row::from_pairs([("id", Value::Int(2)), ("color", Value::from("violet")), ("size", Value::from("huge"))]),
            )
            .unwrap();
        assert_eq!(pk, Value::Int(2));
        assert_eq!(db.table_len(TABLE), 4);
        let rows = db.query(&filtered(Q::from_kwarg("color", "violet"))).unwrap();
        assert_eq!(ids(&rows), vec![2]);
    }

    #[test]
    fn test_explicit_pk_advances_sequence() {
        let db = MemoryDatabase::new();
        db.insert(TABLE, "id", Row::from_pairs([("id", Value::Int(10))])).unwrap();
        let next = db.insert(TABLE, "id", Row::from_pairs([("id", Value::Null)])).unwrap();
        assert_eq!(next, Value::Int(11));
    }

    #[test]
    fn test_missing_table_is_empty() {
        let db = MemoryDatabase::new();
        assert!(db.query(&Query::new("nothing_here", "id")).unwrap().is_empty());
        assert_eq!(db.count(&Query::new("nothing_here", "id")).unwrap(), 0);
    }

    #[test]
    fn test_where_filters() {
        let db = seeded();
        let rows = db.query(&filtered(Q::from_kwarg("color", "blue"))).unwrap();
        assert_eq!(ids(&rows), vec![1, 3]);
    }

    #[test]
    fn test_set_operations() {
        let db = seeded();
        let blue = filtered(Q::from_kwarg("color", "blue"));
        let small = filtered(Q::from_kwarg("size", "small"));

        let combine = |compound_type| {
            let mut q = blue.clone();
            q.compound_queries.push(CompoundQuery {
                compound_type,
                other: Box::new(small.clone()),
            });
            ids(&db.query(&q).unwrap())
        };

        assert_eq!(combine(CompoundType::Union), vec![1, 3, 2]);
        assert_eq!(combine(CompoundType::Intersect), vec![1]);
        assert_eq!(combine(CompoundType::Except), vec![3]);
    }

    #[test]
    fn test_filter_after_difference_applies_to_result() {
        let db = seeded();
        let mut q = Query::new(TABLE, "id");
        q.compound_queries.push(CompoundQuery {
            compound_type: CompoundType::Except,
            other: Box::new(filtered(Q::from_kwarg("color", "blue"))),
        });
        let q = q.and_where(WhereNode::from_q(&Q::from_kwarg("size", "small")));
        assert_eq!(ids(&db.query(&q).unwrap()), vec![2]);
    }

    #[test]
    fn test_order_limit_offset() {
        let db = seeded();
        let mut q = Query::new(TABLE, "id");
        q.order_by = vec![OrderBy::asc("color"), OrderBy::desc("id")];
        assert_eq!(ids(&db.query(&q).unwrap()), vec![3, 1, 4, 2]);

        q.offset = Some(1);
        q.limit = Some(2);
        assert_eq!(ids(&db.query(&q).unwrap()), vec![1, 4]);
    }

    #[test]
    fn test_is_none() {
        let db = seeded();
        let mut q = Query::new(TABLE, "id");
        q.is_none = true;
        assert!(db.query(&q).unwrap().is_empty());
    }

    #[test]
    fn test_truncate() {
        let db = seeded();
        db.truncate(TABLE).unwrap();
        assert_eq!(db.table_len(TABLE), 0);
        let pk = db.insert(TABLE, "id", Row::from_pairs([("id", Value::Null)])).unwrap();
        assert_eq!(pk, Value::Int(1));
    }
}
