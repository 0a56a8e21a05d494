//! Seeded factories for demo data.
//!
//! [`PurchaseFactory`] buys an existing widget for a newly created customer,
//! so running it never changes the widget count.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use easy_scoping_core::{ScopingError, ScopingResult};
use easy_scoping_db::{DbExecutor, Model, Value};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::models::{Customer, Purchase, Widget};
use crate::options;

const FIRST_NAMES: &[&str] = &["Ada", "Grace", "Alan", "Edsger", "Barbara", "Donald", "Frances", "Ken"];
const LAST_NAMES: &[&str] = &["Lovelace", "Hopper", "Turing", "Dijkstra", "Liskov", "Knuth", "Allen", "Thompson"];

/// Span of purchase dates, in days after 1995-01-01.
const PURCHASE_WINDOW_DAYS: u64 = 8600;

/// Creates customers with sequential emails.
pub struct CustomerFactory {
    db: Arc<dyn DbExecutor>,
    rng: StdRng,
    sequence: u64,
}

impl CustomerFactory {
    pub fn new(db: &Arc<dyn DbExecutor>, seed: u64) -> Self {
        Self {
            db: Arc::clone(db),
            rng: StdRng::seed_from_u64(seed),
            sequence: 0,
        }
    }

    pub fn create(&mut self) -> ScopingResult<Customer> {
        self.sequence += 1;
        let first = FIRST_NAMES.choose(&mut self.rng).copied().unwrap_or("Customer");
        let last = LAST_NAMES.choose(&mut self.rng).copied().unwrap_or("Doe");
        Customer::objects(&self.db).create(vec![
            ("name", Value::from(format!("{first} {last}"))),
            (
                "email",
                Value::from(format!("customer{}@example.com", self.sequence)),
            ),
        ])
    }
}

/// Creates purchases of random existing widgets.
pub struct PurchaseFactory {
    db: Arc<dyn DbExecutor>,
    rng: StdRng,
    customers: CustomerFactory,
    widget_pks: Option<Vec<i64>>,
}

impl PurchaseFactory {
    pub fn new(db: &Arc<dyn DbExecutor>, seed: u64) -> Self {
        Self {
            db: Arc::clone(db),
            rng: StdRng::seed_from_u64(seed),
            customers: CustomerFactory::new(db, seed.wrapping_add(1)),
            widget_pks: None,
        }
    }

    fn load_widget_pks(&mut self) -> ScopingResult<()> {
        if self.widget_pks.is_none() {
            let pks = Widget::objects(&self.db)
                .all()
                .pks()?
                .iter()
                .filter_map(Value::as_int)
                .collect();
            self.widget_pks = Some(pks);
        }
        Ok(())
    }

    /// Creates one purchase, and the customer making it.
    pub fn create(&mut self) -> ScopingResult<Purchase> {
        self.load_widget_pks()?;
        let widget = *self
            .widget_pks
            .as_deref()
            .unwrap_or_default()
            .choose(&mut self.rng)
            .ok_or_else(|| ScopingError::DoesNotExist(format!("no {} to purchase", Widget::label())))?;
        let customer = self.customers.create()?;
        let purchased_on = purchase_epoch()?
            .checked_add_days(Days::new(self.rng.gen_range(0..PURCHASE_WINDOW_DAYS)))
            .ok_or_else(|| ScopingError::ConfigurationError("purchase date out of range".to_string()))?;

        Purchase::objects(&self.db).create(vec![
            ("widget", Value::Int(widget)),
            ("customer", Value::Int(customer.id)),
            ("quantity", Value::Int(self.rng.gen_range(1..=20))),
            ("purchased_on", Value::Date(purchased_on)),
        ])
    }

    pub fn create_batch(&mut self, n: usize) -> ScopingResult<Vec<Purchase>> {
        (0..n).map(|_| self.create()).collect()
    }
}

fn purchase_epoch() -> ScopingResult<NaiveDate> {
    NaiveDate::from_ymd_opt(1995, 1, 1)
        .ok_or_else(|| ScopingError::ConfigurationError("invalid purchase epoch".to_string()))
}

/// Creates one widget for every color, size and shape combination.
pub fn create_widget_catalog(db: &Arc<dyn DbExecutor>) -> ScopingResult<usize> {
    let objects = Widget::objects(db);
    let mut created = 0;
    for (color, size, shape) in options::combinations() {
        objects.create(vec![
            ("color", Value::from(color)),
            ("size", Value::from(size)),
            ("shape", Value::from(shape)),
        ])?;
        created += 1;
    }
    tracing::debug!(created, "widget catalog created");
    Ok(created)
}
