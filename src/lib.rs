//! # Folia
//!
//! A ruled-notebook page layout engine.
//!
//! Folia models a simulated sheet of ruled paper — real physical dimensions,
//! margins, rule lines — on which free-flowing text coexists with floating
//! rectangular blocks: inserted images and user-declared forbidden areas
//! that text must flow around. The crate is the geometric and interactive
//! core of such an editor: the block model and its invariants, the layout
//! math that turns paper configuration into a writing area and per-block
//! float hints, and the drag/resize state machine that edits blocks with a
//! pointer.
//!
//! Text wrapping itself is not computed here. Blocks are described to a host
//! rendering surface as float hints, and the host is trusted to implement
//! CSS-style float-and-wrap semantics.
//!
//! ## Architecture
//!
//! ```text
//! Pointer input
//!       ↓
//!  [interaction] — drag/resize session state machine
//!       ↓ patches
//!  [collection]  — add/remove/patch with invariant clamping
//!       ↓
//!  [model]       — blocks, paper geometry, normalization of persisted data
//!       ↓
//!  [layout]      — writing area, line count, per-block float hints
//!       ↓
//!  Host surface  — floats blocks, reflows text around them
//! ```

pub mod collection;
pub mod error;
pub mod image_loader;
pub mod interaction;
pub mod layout;
pub mod model;
pub mod units;

pub use error::FoliaError;

use layout::LayoutReport;
use model::{NotebookState, PaperConfig};

/// Compute the full layout snapshot for a notebook state.
///
/// This is the primary entry point for hosts that render from a report
/// rather than driving a [`layout::HostSurface`] directly.
pub fn layout_report(state: &NotebookState, paper: &PaperConfig) -> LayoutReport {
    LayoutReport::build(state, paper)
}

/// Parse persisted notebook state (legacy shapes included) and return its
/// layout report as pretty-printed JSON.
pub fn layout_report_json(json: &str) -> Result<String, FoliaError> {
    let state = NotebookState::from_json(json, &PaperConfig::b5())?;
    let report = layout_report(&state, &PaperConfig::b5());
    Ok(serde_json::to_string_pretty(&report)?)
}
