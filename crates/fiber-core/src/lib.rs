#![doc = r"Core runtime pieces for the fiber reconciler."]

pub mod collections;
pub mod commit;
pub mod element;
pub mod fiber;
pub mod platform;
mod reconcile;
pub mod runtime;
pub mod scheduler;
pub mod state;
pub mod surface;

pub use commit::CommitStats;
pub use element::{
    create_element, props, text, Child, ComponentFn, Element, ElementType, Event, HostTag,
    Listener, PropValue, Props, RenderPtr, EVENT_PREFIX, TEXT_VALUE_PROP,
};
pub use fiber::{EffectTag, FiberTree, RenderUnit, UnitKey, UnitType};
pub use platform::{Clock, ClockDeadline, Deadline, HostScheduler, Unbounded};
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle};
pub use scheduler::{Reconciler, ReconcilerConfig, SchedulerPhase};
pub use state::{Scope, Setter};
pub use surface::{
    apply_delta, materialize, DisplaySurface, MemoryPrimitive, MemorySurface, PrimitiveKind,
    SurfaceError,
};

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FiberError {
    Surface(SurfaceError),
    MissingHandle { unit: UnitKey },
    StaleUnit { unit: UnitKey },
}

impl std::fmt::Display for FiberError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FiberError::Surface(err) => write!(f, "display surface rejected mutation: {err}"),
            FiberError::MissingHandle { unit } => {
                write!(f, "render unit {unit:?} has no ancestor owning a display handle")
            }
            FiberError::StaleUnit { unit } => {
                write!(f, "render unit {unit:?} is not part of the current generation")
            }
        }
    }
}

impl std::error::Error for FiberError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FiberError::Surface(err) => Some(err),
            _ => None,
        }
    }
}

impl From<SurfaceError> for FiberError {
    fn from(err: SurfaceError) -> Self {
        FiberError::Surface(err)
    }
}
