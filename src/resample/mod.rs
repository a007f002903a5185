//! Fill-mode source selection.

pub(crate) mod fill;
