//! The mirroring core: bounded-concurrency tree walk and artifact output.
//!
//! This crate provides:
//! - [`artifact`] — HTML rendering and the [`ArtifactStore`] persistence seam
//! - [`gate`] — the inspectable concurrency gate bounding section fan-out
//! - [`walker`] — the recursive book → chapter → section → question walk

pub mod artifact;
pub mod gate;
pub mod walker;

pub use artifact::{ArtifactStore, FsStore, MemStore, render_index_html};
pub use gate::{ConcurrencyGate, GatePermit};
pub use walker::{Mirror, MirrorReport, ProgressReporter, SilentProgress};
