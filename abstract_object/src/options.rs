//! Process-wide configuration consulted by the copy constructor.

/// Read-only analyzer configuration relevant to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Options {
    /// When set, [`crate::object::AbstractObject::copy`] eagerly clones the
    /// `properties` mapping instead of sharing it under copy-on-write.
    pub copy_on_write_disabled: bool,
}

impl Options {
    pub const fn new() -> Self {
        Options {
            copy_on_write_disabled: false,
        }
    }

    pub const fn with_cow_disabled() -> Self {
        Options {
            copy_on_write_disabled: true,
        }
    }
}
