//! The cache components, leaf to root: side tables, attribute buffers,
//! geometries, bind groups, render contexts, pipelines.

pub mod attributes;
pub mod bindings;
pub mod geometries;
pub mod pipelines;
pub mod render_contexts;
pub mod side_table;

pub use attributes::AttributeBuffers;
pub use bindings::BindingCache;
pub use geometries::GeometryCache;
pub use pipelines::PipelineCache;
pub use render_contexts::{Rect, RenderContext, RenderContextCache, RenderTarget};
pub use side_table::SideTable;
