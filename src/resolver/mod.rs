// Resolver module: pure decision functions over the in-memory catalog.

pub mod availability;
pub mod image;
pub mod selects;
pub mod variant;

// Re-export the entry points used by the configurator.
pub use availability::{CascadeOutcome, MAX_CASCADE_ITERATIONS};
pub use image::{ImageSource, ResolvedImage, norm_src, resolve_image};
pub use selects::SelectBoard;
pub use variant::{ExclusionSet, find_variant};
