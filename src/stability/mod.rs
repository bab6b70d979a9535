//! Frame-to-frame stabilization
//!
//! - `SmoothingFilter` - rolling median per measurement dimension
//! - `StateDebouncer` - consecutive-frame requirement before good/bad flips
//!
//! Both default to pass-through (window 1, one frame each way).

mod debouncer;
mod smoothing;

pub use debouncer::{StateDebouncer, TransitionProgress};
pub use smoothing::SmoothingFilter;
