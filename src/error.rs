use thiserror::Error;

use crate::layout::{RegionId, WidgetId};

/// Structural failures of layout mutations.
///
/// A stale id on the permissive entry points (`add_region`, `remove_region`,
/// `remove_widget`, `order_widget`) is not an error; those return
/// `Ok(None)`. The variants here point at a caller bug instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("region `{0}` does not exist")]
    RegionNotFound(RegionId),

    #[error("cannot add a widget to region `{0}`: it holds sub-regions")]
    CannotAddWidget(RegionId),

    #[error("widget `{0}` is already placed in the layout")]
    DuplicateWidget(WidgetId),

    #[error("regions `{moved}` and `{target}` do not share a parent")]
    NotSiblings { moved: RegionId, target: RegionId },

    #[error("region `{0}` is not overridable by this page")]
    NotOverridable(RegionId),

    #[error("layout invariant violated: {0}")]
    Corrupt(String),
}

/// Failures converting between XML documents and layout trees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("XML parse error: {0}")]
    Malformed(String),

    #[error("unbalanced XML tags")]
    UnbalancedTags,

    #[error("document has more than one root element")]
    MultipleRoots,

    #[error("document is empty")]
    Empty,

    #[error("unexpected document root `{0}`, expected `Template` or `Page`")]
    UnexpectedRoot(String),

    #[error("missing `{element}` element in `{parent}`")]
    MissingElement {
        parent: &'static str,
        element: &'static str,
    },

    #[error("region `{0}` appears more than once")]
    DuplicateRegion(RegionId),

    #[error("widget `{0}` appears more than once")]
    DuplicateWidget(WidgetId),

    #[error("widget association references unknown region `{0}`")]
    UnknownRegion(RegionId),

    #[error("region `{0}` holds both sub-regions and widgets")]
    WidgetsOnContainer(RegionId),

    #[error("failed to write XML: {0}")]
    Write(String),
}

/// Failures of the storage collaborator that moves documents in and out.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no {kind} stored under id `{id}`")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid document id `{0}`")]
    InvalidId(String),
}

/// Failures loading or saving an editing session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
