//! Quadrilateral validation and rectangle-to-quad projective mapping.

pub(crate) mod projective;
pub(crate) mod quad;
