use std::borrow::Borrow;
use std::fmt;

mod mutate;
mod region;
mod tree;
mod widget;

pub use mutate::RegionSplit;
pub use region::{Region, Style, StyleProperty};
pub use tree::{EditMode, LayoutTree};
pub use widget::Widget;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

string_id!(
    /// Identifier of a region, unique within one tree.
    RegionId
);

string_id!(
    /// Identifier of a widget, either server-assigned or a placeholder.
    WidgetId
);

/// Stacking direction of a region's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// Children stacked top-to-bottom.
    #[default]
    Vertical,
    /// Children laid out left-to-right.
    Horizontal,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Orientation::Vertical => "vertical",
            Orientation::Horizontal => "horizontal",
        };
        f.write_str(s)
    }
}

/// Side of an existing region on which a split carves out the new region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertDirection {
    North,
    South,
    East,
    West,
}

impl InsertDirection {
    /// Orientation the split region takes on.
    pub fn orientation(self) -> Orientation {
        match self {
            InsertDirection::North | InsertDirection::South => Orientation::Vertical,
            InsertDirection::East | InsertDirection::West => Orientation::Horizontal,
        }
    }

    /// Whether the new region goes after the existing content.
    pub fn appends(self) -> bool {
        matches!(self, InsertDirection::South | InsertDirection::East)
    }
}

impl fmt::Display for InsertDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InsertDirection::North => "north",
            InsertDirection::South => "south",
            InsertDirection::East => "east",
            InsertDirection::West => "west",
        };
        f.write_str(s)
    }
}
