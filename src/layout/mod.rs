//! # Writing-Area Layout
//!
//! Derives the writing-area geometry of a ruled sheet and the rendering
//! instructions for its floating blocks.
//!
//! The engine does not compute text wrapping. Blocks are described to the
//! host surface as float hints — float to a margin side, stack top-to-bottom
//! in collection order among same-side blocks — and the host is expected to
//! honor CSS-style float semantics, flowing text around the blocks in the
//! remaining horizontal space at each vertical position. That float-and-wrap
//! capability is an injected dependency, not reimplemented here.

use serde::Serialize;

use crate::model::{FloatingBlock, NotebookState, PaperConfig, Side};

/// Number of rule lines that fit between the top and bottom margins.
///
/// Returns 0 for pathological configs (non-positive pitch, margins taller
/// than the page): an empty writing area, never a panic. Any previously
/// computed count is invalid once paper geometry or pitch changes.
pub fn line_count(config: &PaperConfig, line_spacing_mm: f64) -> usize {
    if line_spacing_mm <= 0.0 {
        return 0;
    }
    let available = config.height - config.top_margin - config.bottom_margin;
    if available <= 0.0 {
        return 0;
    }
    (available / line_spacing_mm).floor() as usize
}

/// The left and right margins after the mirrored-duplex swap: on the back
/// side of the sheet the inside margin changes sides.
pub fn effective_margins(config: &PaperConfig, is_back_side: bool) -> (f64, f64) {
    if is_back_side {
        (config.right_margin, config.left_margin)
    } else {
        (config.left_margin, config.right_margin)
    }
}

/// The rectangle (mm, page-relative) within which text lines and floating
/// blocks are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WritingArea {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl WritingArea {
    /// Compute the writing area for a sheet. Height snaps to a whole number
    /// of rule lines.
    pub fn compute(config: &PaperConfig, line_spacing_mm: f64, is_back_side: bool) -> Self {
        let (left, right) = effective_margins(config, is_back_side);
        let lines = line_count(config, line_spacing_mm) as f64;
        Self {
            left,
            top: config.top_margin,
            width: (config.width - left - right).max(0.0),
            height: lines * line_spacing_mm.max(0.0),
        }
    }
}

/// Rendering instructions for one floating block, handed to the host's flow
/// layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRenderHint {
    pub float_direction: Side,
    pub top_spacing_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
}

/// Translate a block's logical (side, top) into its render hint.
pub fn render_hint(block: &FloatingBlock) -> BlockRenderHint {
    BlockRenderHint {
        float_direction: block.side,
        top_spacing_mm: block.top,
        width_mm: block.width,
        height_mm: block.height,
    }
}

/// The rendering surface the engine drives. Implementations place floated
/// blocks and reflow text around them; the engine trusts but does not verify
/// the float-and-wrap behavior.
pub trait HostSurface {
    fn place_block(&mut self, id: &str, hint: &BlockRenderHint);
    fn reflow_text(&mut self);
}

/// Present the full state to a host surface: every image, then every
/// forbidden area, in collection order, followed by a single text reflow.
pub fn present(state: &NotebookState, surface: &mut impl HostSurface) {
    for image in state.images.iter() {
        surface.place_block(&image.block.id, &render_hint(&image.block));
    }
    for area in state.forbidden_areas.iter() {
        surface.place_block(&area.id, &render_hint(area));
    }
    surface.reflow_text();
}

// ── Serializable layout snapshot (for the CLI / debug tooling) ──

/// One block's identity plus its render hint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInfo {
    pub id: String,
    #[serde(flatten)]
    pub hint: BlockRenderHint,
}

/// Complete layout metadata for one sheet of state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutReport {
    pub paper: PaperConfig,
    pub line_count: usize,
    pub line_spacing_mm: f64,
    pub effective_left_margin: f64,
    pub effective_right_margin: f64,
    pub writing_area: WritingArea,
    pub images: Vec<BlockInfo>,
    pub forbidden_areas: Vec<BlockInfo>,
}

impl LayoutReport {
    pub fn build(state: &NotebookState, paper: &PaperConfig) -> Self {
        let spacing = state.spacing_key.mm();
        let (left, right) = effective_margins(paper, state.is_back_side);
        Self {
            paper: *paper,
            line_count: line_count(paper, spacing),
            line_spacing_mm: spacing,
            effective_left_margin: left,
            effective_right_margin: right,
            writing_area: WritingArea::compute(paper, spacing, state.is_back_side),
            images: state
                .images
                .iter()
                .map(|i| BlockInfo {
                    id: i.block.id.clone(),
                    hint: render_hint(&i.block),
                })
                .collect(),
            forbidden_areas: state
                .forbidden_areas
                .iter()
                .map(|a| BlockInfo {
                    id: a.id.clone(),
                    hint: render_hint(a),
                })
                .collect(),
        }
    }
}
