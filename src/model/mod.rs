//! # Notebook Model
//!
//! The data shapes for a simulated ruled notebook page: the paper geometry,
//! the floating blocks (inserted images and user-declared forbidden areas)
//! that compete with flowing text for space, and the top-level state that
//! owns both collections.
//!
//! Everything that enters the live collections from outside — persisted
//! state, legacy records, arbitrary JSON — passes through [`normalize`].
//! That single choke point is what keeps corrupted storage from ever
//! reaching the geometry math downstream.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collection::{BlockCollection, BlockPatch};
use crate::layout;

/// Minimum width/height of any floating block, in mm.
pub const MIN_BLOCK_MM: f64 = 10.0;

/// Horizontal slack added to a legacy record's width when inferring which
/// margin it was anchored to.
pub const LEGACY_SIDE_SLACK_MM: f64 = 20.0;

/// Which margin a floating block is anchored to. Determines float direction
/// in the host layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    #[default]
    Left,
    Right,
}

impl Side {
    /// Lenient parse used for patches and raw records: anything that isn't
    /// exactly `"right"` is `Left`.
    pub fn from_raw(raw: &str) -> Side {
        if raw == "right" {
            Side::Right
        } else {
            Side::Left
        }
    }
}

/// A rectangle anchored to one margin side that text flows around.
///
/// `top` is not an absolute page coordinate: the host lays blocks out in
/// flow order, and `top` is advisory vertical spacing before the block,
/// like a top margin on a floated element. All dimensions are in mm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloatingBlock {
    pub id: String,
    pub side: Side,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// An inserted image: a floating block plus an opaque reference to the image
/// bytes (typically a data URI), set once at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageElement {
    #[serde(flatten)]
    pub block: FloatingBlock,
    pub url: String,
}

/// A pure layout obstruction with no payload, used to keep text off a page
/// region (e.g. room for a printed form stamp).
pub type ForbiddenArea = FloatingBlock;

/// Access to the floating-block core of an entity, so collections and the
/// interaction controller work over images and forbidden areas alike.
pub trait Floating {
    fn block(&self) -> &FloatingBlock;
    fn block_mut(&mut self) -> &mut FloatingBlock;
}

impl Floating for FloatingBlock {
    fn block(&self) -> &FloatingBlock {
        self
    }
    fn block_mut(&mut self) -> &mut FloatingBlock {
        self
    }
}

impl Floating for ImageElement {
    fn block(&self) -> &FloatingBlock {
        &self.block
    }
    fn block_mut(&mut self) -> &mut FloatingBlock {
        &mut self.block
    }
}

// ── Clamping ───────────────────────────────────────────────────

/// Returns `value` if it is a finite number `>= 0`, else `fallback`.
/// Applied on every write to `top`, including partial patches.
pub fn clamp_top(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        fallback
    }
}

/// Returns `max(MIN_BLOCK_MM, value)` for finite input, else
/// `max(MIN_BLOCK_MM, fallback)`. Dimensions never fall below the minimum,
/// even under malformed input.
pub fn clamp_dimension(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        MIN_BLOCK_MM.max(value)
    } else {
        MIN_BLOCK_MM.max(fallback)
    }
}

// ── Untrusted records and legacy migration ─────────────────────

/// Field-by-field extraction of whatever persistence hands us. Wrong-typed
/// fields read as absent rather than failing the whole record.
#[derive(Debug, Clone, Default)]
pub struct RawBlock {
    pub id: Option<String>,
    pub side: Option<String>,
    pub top: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub url: Option<String>,
    /// Legacy absolute coordinates (mm, page-relative), superseded by
    /// side/top.
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl RawBlock {
    pub fn from_value(value: &Value) -> RawBlock {
        RawBlock {
            id: value.get("id").and_then(Value::as_str).map(str::to_owned),
            side: value.get("side").and_then(Value::as_str).map(str::to_owned),
            top: value.get("top").and_then(Value::as_f64),
            width: value.get("width").and_then(Value::as_f64),
            height: value.get("height").and_then(Value::as_f64),
            url: value.get("url").and_then(Value::as_str).map(str::to_owned),
            x: value.get("x").and_then(Value::as_f64),
            y: value.get("y").and_then(Value::as_f64),
        }
    }
}

/// The two persisted representations a raw record can carry.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockShape {
    /// The canonical side/top form. Fields may still be missing or invalid.
    Current { side: Option<Side>, top: Option<f64> },
    /// The old absolute-coordinate form: numeric `x` present, no `side`.
    Legacy { x: f64, y: Option<f64> },
}

/// Classify a raw record into its persisted shape.
pub fn classify(raw: &RawBlock) -> BlockShape {
    match (raw.side.as_deref(), raw.x) {
        (None, Some(x)) => BlockShape::Legacy { x, y: raw.y },
        (side, _) => BlockShape::Current {
            side: side.map(Side::from_raw),
            top: raw.top,
        },
    }
}

/// Infer the anchor side of a legacy absolute-coordinate record.
///
/// A block whose left edge sits further right than its own width plus a
/// 20mm slack was, in practice, anchored to the right margin. This is a
/// one-time lossy migration, not a coordinate-space conversion: the original
/// absolute position cannot be recovered from the result.
pub fn migrate_legacy_side(x: f64, width: f64) -> Side {
    if x > width + LEGACY_SIDE_SLACK_MM {
        Side::Right
    } else {
        Side::Left
    }
}

/// Fallback geometry and anchoring for records that arrive without usable
/// values, and the initial placement for newly created blocks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockDefaults {
    pub side: Side,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl BlockDefaults {
    /// Defaults for inserted images.
    pub fn image() -> Self {
        Self {
            side: Side::Left,
            top: 15.0,
            width: 50.0,
            height: 50.0,
        }
    }

    /// Defaults for forbidden areas.
    pub fn forbidden_area() -> Self {
        Self {
            side: Side::Left,
            top: 20.0,
            width: 35.0,
            height: 30.0,
        }
    }
}

/// Produce a valid [`FloatingBlock`] from an untrusted record, or `None` if
/// the record lacks a string id.
///
/// Missing `side` is inferred from a legacy `x` when present, else taken
/// from the defaults. Missing or invalid `top` falls back to the default
/// (accepting legacy `y`). Dimensions are clamped to the default and the
/// minimum. Every persisted or externally supplied block passes through
/// here before entering a live collection.
pub fn normalize(raw: &RawBlock, defaults: &BlockDefaults) -> Option<FloatingBlock> {
    let id = raw.id.clone()?;
    let width = clamp_dimension(raw.width.unwrap_or(f64::NAN), defaults.width);
    let height = clamp_dimension(raw.height.unwrap_or(f64::NAN), defaults.height);
    let (side, top) = match classify(raw) {
        BlockShape::Current { side, top } => (
            side.unwrap_or(defaults.side),
            clamp_top(top.unwrap_or(f64::NAN), defaults.top),
        ),
        BlockShape::Legacy { x, y } => (
            migrate_legacy_side(x, width),
            clamp_top(y.unwrap_or(f64::NAN), defaults.top),
        ),
    };
    Some(FloatingBlock {
        id,
        side,
        top,
        width,
        height,
    })
}

/// Like [`normalize`], additionally requiring a `url`. An image record that
/// cannot render has no useful normalized form.
pub fn normalize_image(raw: &RawBlock, defaults: &BlockDefaults) -> Option<ImageElement> {
    let url = raw.url.clone()?;
    let block = normalize(raw, defaults)?;
    Some(ImageElement { block, url })
}

// ── Paper geometry ─────────────────────────────────────────────

/// Physical geometry of a ruled sheet, in mm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperConfig {
    pub width: f64,
    pub height: f64,
    pub line_spacing: f64,
    pub top_margin: f64,
    pub left_margin: f64,
    pub right_margin: f64,
    pub bottom_margin: f64,
}

impl PaperConfig {
    /// Standard Campus B5: 182mm × 257mm, measured against a physical
    /// 8mm/26-line sheet.
    pub fn b5() -> Self {
        Self {
            width: 182.0,
            height: 257.0,
            line_spacing: 8.0,
            top_margin: 33.0,
            left_margin: 16.0,
            right_margin: 4.0,
            bottom_margin: 15.0,
        }
    }
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self::b5()
    }
}

/// Rule-line pitch options offered by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineSpacing {
    #[default]
    #[serde(rename = "8mm")]
    Mm8,
    #[serde(rename = "7mm")]
    Mm7,
    #[serde(rename = "6mm")]
    Mm6,
}

impl LineSpacing {
    pub fn mm(self) -> f64 {
        match self {
            LineSpacing::Mm8 => 8.0,
            LineSpacing::Mm7 => 7.0,
            LineSpacing::Mm6 => 6.0,
        }
    }

    /// Lenient parse of a persisted spacing key; unknown keys fall back to
    /// the default pitch.
    pub fn from_key(key: &str) -> LineSpacing {
        match key {
            "7mm" => LineSpacing::Mm7,
            "6mm" => LineSpacing::Mm6,
            _ => LineSpacing::Mm8,
        }
    }
}

// ── Top-level state ────────────────────────────────────────────

/// Which collection a block belongs to. Image ids and forbidden-area ids
/// live in independent namespaces and are never compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTarget {
    Image,
    ForbiddenArea,
}

/// The complete editor state: free-flowing text plus the two floating-block
/// collections. This struct exclusively owns both collections; everything
/// else holds ids.
///
/// The in-memory shape is the canonical persisted shape — serialization is
/// verbatim, and loading goes through the lenient [`NotebookState::from_json`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookState {
    pub text: String,
    pub font_size: f64,
    pub font_family: String,
    pub spacing_key: LineSpacing,
    pub images: BlockCollection<ImageElement>,
    pub show_lines: bool,
    pub show_holes: bool,
    pub is_back_side: bool,
    pub forbidden_areas: BlockCollection<ForbiddenArea>,
}

impl NotebookState {
    /// Fresh state for a given sheet: one empty line per rule line and the
    /// seed forbidden area in the top-left.
    pub fn default_for(paper: &PaperConfig) -> Self {
        let lines = layout::line_count(paper, LineSpacing::default().mm());
        let seed_area = ForbiddenArea {
            id: "forbidden-1".to_string(),
            side: Side::Left,
            top: 20.0,
            width: 35.0,
            height: 30.0,
        };
        Self {
            text: "\n".repeat(lines.saturating_sub(1)),
            font_size: 14.0,
            font_family: "serif".to_string(),
            spacing_key: LineSpacing::default(),
            images: BlockCollection::new(),
            show_lines: true,
            show_holes: true,
            is_back_side: false,
            forbidden_areas: BlockCollection::from_vec(vec![seed_area]),
        }
    }

    /// Rebuild state from an arbitrary parsed JSON value. Total: every field
    /// is decoded leniently, block arrays run through [`normalize`], and
    /// invalid entries are silently dropped.
    pub fn from_value(value: &Value, paper: &PaperConfig) -> Self {
        let defaults = Self::default_for(paper);
        let Some(obj) = value.as_object() else {
            return defaults;
        };

        let images = match obj.get("images").and_then(Value::as_array) {
            Some(entries) => BlockCollection::from_vec(
                entries
                    .iter()
                    .filter_map(|v| normalize_image(&RawBlock::from_value(v), &BlockDefaults::image()))
                    .collect(),
            ),
            None => defaults.images.clone(),
        };
        let forbidden_areas = match obj.get("forbiddenAreas").and_then(Value::as_array) {
            Some(entries) => BlockCollection::from_vec(
                entries
                    .iter()
                    .filter_map(|v| normalize(&RawBlock::from_value(v), &BlockDefaults::forbidden_area()))
                    .collect(),
            ),
            None => defaults.forbidden_areas.clone(),
        };

        Self {
            text: obj
                .get("text")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or(defaults.text),
            font_size: obj
                .get("fontSize")
                .and_then(Value::as_f64)
                .filter(|v| v.is_finite() && *v > 0.0)
                .unwrap_or(defaults.font_size),
            font_family: obj
                .get("fontFamily")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or(defaults.font_family),
            spacing_key: obj
                .get("spacingKey")
                .and_then(Value::as_str)
                .map(LineSpacing::from_key)
                .unwrap_or(defaults.spacing_key),
            images,
            show_lines: obj
                .get("showLines")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.show_lines),
            show_holes: obj
                .get("showHoles")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.show_holes),
            is_back_side: obj
                .get("isBackSide")
                .and_then(Value::as_bool)
                .unwrap_or(defaults.is_back_side),
            forbidden_areas,
        }
    }

    /// Parse a persisted document. Fails only when the input isn't JSON at
    /// all; field-level damage is absorbed by [`NotebookState::from_value`].
    pub fn from_json(raw: &str, paper: &PaperConfig) -> Result<Self, crate::FoliaError> {
        let value: Value = serde_json::from_str(raw)?;
        Ok(Self::from_value(&value, paper))
    }

    /// Route a geometry patch to the owning collection. The single mutation
    /// choke point the interaction controller goes through; patches to
    /// missing ids are no-ops.
    pub fn apply_patch(&mut self, target: BlockTarget, id: &str, patch: &BlockPatch) {
        match target {
            BlockTarget::Image => self.images.update_patch(id, patch),
            BlockTarget::ForbiddenArea => self.forbidden_areas.update_patch(id, patch),
        }
    }
}

impl Default for NotebookState {
    fn default() -> Self {
        Self::default_for(&PaperConfig::b5())
    }
}
