//! # Widgets demo
//!
//! A small catalog of widgets, customers and purchases showing named scopes
//! in use: `blue`, `not_blue`, argument-taking scopes and the `num_blue`
//! aggregate on `Widget`, and a separate registry on `Purchase`.

pub mod factories;
pub mod models;
pub mod options;
pub mod settings;

use easy_scoping_db::FixtureLoader;

use models::{Customer, Purchase, Widget};

/// Directory holding the bundled fixtures.
pub const FIXTURE_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures");

/// Name of the 336-widget fixture.
pub const WIDGET_FIXTURE: &str = "filter_test_data";

/// Returns a loader for the demo models that searches the configured fixture
/// directories and then the bundled one.
pub fn fixture_loader(settings: &easy_scoping_core::Settings) -> FixtureLoader {
    FixtureLoader::from_settings(settings)
        .fixture_dir(FIXTURE_DIR)
        .register::<Widget>()
        .register::<Customer>()
        .register::<Purchase>()
}
