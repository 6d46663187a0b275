//! Value/gradient row selection.
//!
//! Every arena stores parameters in row 0 and, once requested, their
//! gradients in row 1. Older layer code names gradients by prefixing the
//! parameter name with `d_`; [`Row::split_name`] translates that convention
//! into an explicit row.

use std::fmt;

/// Which row of the arena a blob lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Row {
    /// Parameter values (row 0). Always present.
    Value,
    /// Parameter gradients (row 1). Allocated lazily.
    Gradient,
}

impl Row {
    /// Name prefix that marks a gradient under the legacy naming scheme.
    pub const GRADIENT_PREFIX: &'static str = "d_";

    /// Physical row index within the arena slab.
    pub fn index(self) -> usize {
        match self {
            Self::Value => 0,
            Self::Gradient => 1,
        }
    }

    /// Split a legacy name into its row and base name.
    ///
    /// `"d_W"` becomes `(Row::Gradient, "W")`; anything without the prefix
    /// is a value name and is returned unchanged.
    pub fn split_name(name: &str) -> (Self, &str) {
        match name.strip_prefix(Self::GRADIENT_PREFIX) {
            Some(base) => (Self::Gradient, base),
            None => (Self::Value, name),
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value => f.write_str("value"),
            Self::Gradient => f.write_str("gradient"),
        }
    }
}
