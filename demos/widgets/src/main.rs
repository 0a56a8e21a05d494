//! # Widgets demo
//!
//! Loads the 336-widget fixture into an in-memory database and walks through
//! the scope registry:
//!
//! - **Scopes**: `blue`, `small`, `circle` and their chains
//! - **Negation**: `not_blue` and friends, computed from the registered scope
//! - **Arguments**: positional and keyword scope arguments
//! - **Aggregates**: `num_blue` and the purchase `units` total
//! - **Registration**: adding and replacing a scope at runtime
//!
//! ## Running
//!
//! ```bash
//! cargo run --package widgets-demo
//! ```

use std::sync::Arc;

use anyhow::Context;
use easy_scoping_core::logging::setup_logging;
use easy_scoping_core::SETTINGS;
use easy_scoping_db::{DbExecutor, MemoryDatabase, Value, Q};
use easy_scoping_scopes::{ScopeArgs, ScopedModel, ScopedQuerySet};

use widgets_demo::factories::{create_widget_catalog, PurchaseFactory};
use widgets_demo::models::{Purchase, Widget};
use widgets_demo::settings::{extra_u64, load_settings, SETTINGS_FILE};
use widgets_demo::{fixture_loader, WIDGET_FIXTURE};

fn main() -> anyhow::Result<()> {
    let settings = load_settings(SETTINGS_FILE).context("failed to load settings")?;
    setup_logging(&settings);
    SETTINGS.configure(settings);
    let settings = SETTINGS.get();
    tracing::info!(
        "Widgets configured: debug={}, negation_prefix={:?}",
        settings.debug,
        settings.negation_prefix
    );

    let db: Arc<dyn DbExecutor> = Arc::new(MemoryDatabase::new());
    let loaded = fixture_loader(settings)
        .load(db.as_ref(), WIDGET_FIXTURE)
        .context("failed to load widget fixture")?;
    tracing::info!(loaded, "fixture loaded");

    demonstrate_scopes(&db)?;
    demonstrate_arguments(&db)?;
    demonstrate_aggregates(&db)?;
    demonstrate_registration(&db)?;
    demonstrate_purchases(
        extra_u64(settings, "purchases", 200),
        extra_u64(settings, "seed", 2018),
    )?;

    tracing::info!("Widgets demo complete");
    Ok(())
}

fn demonstrate_scopes(db: &Arc<dyn DbExecutor>) -> anyhow::Result<()> {
    let objects = Widget::objects(db);
    println!("--- Scopes ---");
    println!("all widgets:          {}", objects.count()?);
    println!("blue:                 {}", objects.all().scope("blue")?.count()?);
    println!("not_blue:             {}", objects.all().scope("not_blue")?.count()?);

    let chained = objects.all().scope("blue")?.scope("small")?.scope("circle")?;
    let single = chained.get()?;
    println!("blue small circle:    #{} ({:?})", single.id, single.used_on);
    println!(
        "not blue/small/circle: {}",
        objects
            .all()
            .scope("not_blue")?
            .scope("not_small")?
            .scope("not_circle")?
            .count()?
    );
    println!("before_y2k:           {}", objects.all().scope("before_y2k")?.count()?);
    println!("not_before_y2k:       {}", objects.all().scope("not_before_y2k")?.count()?);
    println!("after_y2k:            {}", objects.all().scope("after_y2k")?.count()?);
    Ok(())
}

fn demonstrate_arguments(db: &Arc<dyn DbExecutor>) -> anyhow::Result<()> {
    let objects = Widget::objects(db);
    println!("--- Arguments ---");
    let by_args = objects
        .all()
        .scope_with("take_more_args", &ScopeArgs::positional(["green", "huge"]))?;
    println!("take_more_args(green, huge): {}", by_args.count()?);

    let by_kwargs = objects.all().scope_with(
        "take_kwargs",
        &ScopeArgs::new()
            .kwarg("shape", "star")
            .kwarg("color__in", Value::List(vec![Value::from("red"), Value::from("violet")])),
    )?;
    println!("take_kwargs(shape=star, color__in=[red, violet]): {}", by_kwargs.count()?);

    if let Err(e) = objects.all().scope_with("blue", &ScopeArgs::positional(["extra"])) {
        println!("blue(extra) rejected: {e}");
    }
    Ok(())
}

fn demonstrate_aggregates(db: &Arc<dyn DbExecutor>) -> anyhow::Result<()> {
    let objects = Widget::objects(db);
    println!("--- Aggregates ---");
    println!("num_blue:              {}", objects.all().run_aggregate("num_blue")?);
    println!(
        "num_blue over small:   {}",
        objects.all().scope("small")?.run_aggregate("num_blue")?
    );
    let bound = objects.filter(Q::from_kwarg("shape", "star")).get_aggregate("num_blue")?;
    println!("num_blue over stars:   {}", bound.call()?);
    Ok(())
}

fn demonstrate_registration(db: &Arc<dyn DbExecutor>) -> anyhow::Result<()> {
    let objects = Widget::objects(db);
    println!("--- Registration ---");
    Widget::register_scope("red", |qs, _| Ok(qs.filter(Q::from_kwarg("color", "red"))))?;
    println!("red:                 {}", objects.all().scope("red")?.count()?);
    println!("not_red and not_blue: {}", objects.all().scope("not_red")?.scope("not_blue")?.count()?);

    if let Err(e) = Widget::register_aggregate("blue", |_, _| Ok(Value::Int(0))) {
        println!("register_aggregate(blue) rejected: {e}");
    }
    if let Err(e) = objects.all().scope("not_a_scope") {
        println!("not_a_scope: {e}");
    }
    println!("registered: {:?}", Widget::scopes().names());
    Ok(())
}

fn demonstrate_purchases(count: u64, seed: u64) -> anyhow::Result<()> {
    println!("--- Purchases ---");
    let db: Arc<dyn DbExecutor> = Arc::new(MemoryDatabase::new());
    create_widget_catalog(&db)?;
    let count = usize::try_from(count).context("purchase count out of range")?;
    PurchaseFactory::new(&db, seed).create_batch(count)?;

    let purchases = Purchase::objects(&db);
    println!("purchases:      {}", purchases.count()?);
    println!("bulk:           {}", purchases.all().scope("bulk")?.count()?);
    println!("not_bulk:       {}", purchases.all().scope("not_bulk")?.count()?);
    println!("units:          {}", purchases.all().run_aggregate("units")?);
    println!("units in bulk:  {}", purchases.all().scope("bulk")?.run_aggregate("units")?);
    if let Some(latest) = purchases.all().first()? {
        let widget = Widget::objects(&db).get(Q::from_kwarg("id", latest.widget))?;
        println!(
            "latest purchase: {} x {} {} {} on {}",
            latest.quantity, widget.color, widget.size, widget.shape, latest.purchased_on
        );
    }
    Ok(())
}
