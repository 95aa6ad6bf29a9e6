//! Viewer logic independent of any windowing toolkit: coordinate mapping,
//! page and zoom state, search, and the pointer interaction machine.

pub mod geometry;
pub mod interaction;
pub mod search;
pub mod session;
pub mod view;

pub use geometry::{DevicePoint, ViewTransform, Viewport, HIT_TEST_RADIUS};
pub use interaction::{
    transition, Context, Cursor, Effect, Event, InputPrompt, InteractionState, Phase, Preview,
    Selection, Tool, ToolSettings,
};
pub use search::{SearchOutcome, SearchSession};
pub use session::Session;
pub use view::{ViewState, ZoomLimits};
