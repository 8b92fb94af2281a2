//! Testing utilities and harness for the fiber reconciler.

mod recording;
mod rule;

pub use recording::{RecordingSurface, SurfaceOp};
pub use rule::{run_test_render, ReconcilerTestRule, UnitBudget};

/// Routes `log` output through `env_logger` for the current test binary.
///
/// Safe to call from every test; only the first call installs the logger.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub mod prelude {
    pub use crate::{init_logging, run_test_render, ReconcilerTestRule, SurfaceOp, UnitBudget};
    pub use fiber_core::{create_element, props, text, Child, Element, PropValue, Props, Scope};
}
