//! Shared crate-wide constants.

/// Prefix of region ids generated while editing a template.
pub const TEMPLATE_REGION_PREFIX: &str = "temp-region-";

/// Prefix of region ids generated while editing a page on top of its
/// template.
pub const PAGE_REGION_PREFIX: &str = "page-region-";

/// Prefix of ids handed to widgets that have not been persisted yet.
///
/// The server assigns real ids on save. Ids carrying this prefix are left
/// out of outgoing documents.
pub const PLACEHOLDER_WIDGET_PREFIX: &str = "pseudo-widget-id-";

/// Class flag on a region's `templateCode` marker that makes it lay its
/// children out left-to-right.
pub const HORIZONTAL_CLASS: &str = "perc-horizontal";

/// Class every serialized region marker carries.
pub const REGION_CLASS: &str = "perc-region";

/// Smallest width/height (in pixels) a resize may shrink a region to.
pub const MIN_REGION_SIZE_PX: u32 = 20;
