//! Editing model for page templates: a tree of regions holding widgets, the
//! structural operations on it, its XML form, and the page overlay that
//! lets a page rework the parts of its template marked overridable.

pub mod constants;
pub mod error;
pub mod layout;
pub mod overlay;
pub mod session;
pub mod store;
pub mod tracing_sub;
pub mod xml;

pub use error::{CodecError, LayoutError, SessionError, StoreError};
pub use layout::{
    EditMode, InsertDirection, LayoutTree, Orientation, Region, RegionId, RegionSplit, Style,
    StyleProperty, Widget, WidgetId,
};
pub use overlay::PageOverlay;
pub use session::{PageSession, TemplateSession};
pub use store::{DirStore, LayoutStore};
