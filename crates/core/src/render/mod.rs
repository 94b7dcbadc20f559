//! Layered character-cell rendering.
//!
//! Producers queue [`RenderCommand`]s into a [`RenderQueue`] each frame; the
//! queue then draws them back-to-front onto any [`DrawSurface`]. Frame timing
//! and adaptive quality live in [`FrameBudget`], rolling numbers in
//! [`RenderStats`].

pub mod budget;
pub mod profiler;
pub mod queue;
pub mod stats;
pub mod surface;

pub use budget::{FrameBudget, PhaseBudgets};
pub use profiler::ProfilerScope;
pub use queue::{ColorId, RenderCommand, RenderLayer, RenderQueue, TextAttributes};
pub use stats::{PerformanceReport, RenderStats};
pub use surface::{Cell, DrawSurface, GlyphBuffer};
