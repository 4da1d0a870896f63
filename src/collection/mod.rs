//! # Block Collections
//!
//! Ordered collections of floating-block entities and the patch type used to
//! mutate them. Insertion order is z-order and tab order; it carries no
//! spatial meaning. Every mutation re-clamps the full record through the
//! model's clamp functions, so a collection can never hold an invalid block
//! no matter what a patch carries.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::model::{clamp_dimension, clamp_top, Floating, Side};

/// Vertical stagger between sequential insertions, so new blocks never fully
/// overlap.
pub const STAGGER_STEP_MM: f64 = 10.0;

/// Produces fresh block ids within one namespace (images and forbidden areas
/// each get their own generator). Timestamp-derived with a per-process
/// counter suffix; collision-free in practice.
#[derive(Debug)]
pub struct IdGenerator {
    prefix: String,
    counter: u64,
}

impl IdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: 0,
        }
    }

    pub fn images() -> Self {
        Self::new("image")
    }

    pub fn forbidden_areas() -> Self {
        Self::new("forbidden")
    }

    pub fn next_id(&mut self) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or(0);
        self.counter += 1;
        format!("{}-{}-{}", self.prefix, millis, self.counter)
    }
}

/// A partial geometry update addressed to one block. Fields that are `None`
/// leave the current value in place. `side` is lenient on deserialization:
/// any value other than the string `"right"` reads as left.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BlockPatch {
    #[serde(deserialize_with = "lenient_side")]
    pub side: Option<Side>,
    pub top: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl BlockPatch {
    pub fn with_top(top: f64) -> Self {
        Self {
            top: Some(top),
            ..Self::default()
        }
    }

    pub fn with_side(side: Side) -> Self {
        Self {
            side: Some(side),
            ..Self::default()
        }
    }

    pub fn with_size(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Self::default()
        }
    }
}

fn lenient_side<'de, D>(deserializer: D) -> Result<Option<Side>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Value> = Option::deserialize(deserializer)?;
    Ok(raw.map(|v| match v.as_str() {
        Some(s) => Side::from_raw(s),
        None => Side::Left,
    }))
}

/// An ordered collection of floating-block entities with a single namespace
/// of ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockCollection<T: Floating> {
    items: Vec<T>,
}

impl<T: Floating> BlockCollection<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Wrap already-normalized entities (the load path).
    pub fn from_vec(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|e| e.block().id == id)
    }

    /// Append an entity, assigning it a fresh id and staggering its vertical
    /// placement by `index * 10mm` so sequential insertions do not fully
    /// overlap. Returns the assigned id.
    pub fn add(&mut self, ids: &mut IdGenerator, mut entity: T) -> String {
        let index = self.items.len() as f64;
        let block = entity.block_mut();
        block.id = ids.next_id();
        block.top = clamp_top(block.top + index * STAGGER_STEP_MM, 0.0);
        block.width = clamp_dimension(block.width, 0.0);
        block.height = clamp_dimension(block.height, 0.0);
        let id = block.id.clone();
        self.items.push(entity);
        id
    }

    /// Remove the matching entry; no error if absent.
    pub fn remove(&mut self, id: &str) {
        self.items.retain(|e| e.block().id != id);
    }

    /// Merge a partial patch into the matching entry, then re-clamp the
    /// entire resulting record — not just the patched fields — with the
    /// pre-patch values as fallbacks. A patch can never leave the collection
    /// invalid, and a patch addressed to a missing id is a silent no-op.
    pub fn update_patch(&mut self, id: &str, patch: &BlockPatch) {
        let Some(entry) = self.items.iter_mut().find(|e| e.block().id == id) else {
            return;
        };
        let block = entry.block_mut();
        let prev_top = block.top;
        let prev_width = block.width;
        let prev_height = block.height;

        if let Some(side) = patch.side {
            block.side = side;
        }
        if let Some(top) = patch.top {
            block.top = top;
        }
        if let Some(width) = patch.width {
            block.width = width;
        }
        if let Some(height) = patch.height {
            block.height = height;
        }

        block.top = clamp_top(block.top, prev_top);
        block.width = clamp_dimension(block.width, prev_width);
        block.height = clamp_dimension(block.height, prev_height);
    }
}

impl<T: Floating> Default for BlockCollection<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockDefaults, FloatingBlock, ImageElement, MIN_BLOCK_MM};

    fn image_with_defaults(url: &str) -> ImageElement {
        let d = BlockDefaults::image();
        ImageElement {
            block: FloatingBlock {
                id: String::new(),
                side: d.side,
                top: d.top,
                width: d.width,
                height: d.height,
            },
            url: url.to_string(),
        }
    }

    #[test]
    fn test_add_staggers_sequential_insertions() {
        let mut ids = IdGenerator::images();
        let mut images = BlockCollection::new();
        for n in 0..3 {
            images.add(&mut ids, image_with_defaults(&format!("data:{n}")));
        }
        let tops: Vec<f64> = images.iter().map(|i| i.block.top).collect();
        assert_eq!(tops, vec![15.0, 25.0, 35.0]);
    }

    #[test]
    fn test_add_assigns_unique_ids() {
        let mut ids = IdGenerator::images();
        let mut images = BlockCollection::new();
        let a = images.add(&mut ids, image_with_defaults("data:a"));
        let b = images.add(&mut ids, image_with_defaults("data:b"));
        assert_ne!(a, b);
        assert!(images.get(&a).is_some());
        assert!(images.get(&b).is_some());
    }

    #[test]
    fn test_remove_absent_id_is_noop() {
        let mut ids = IdGenerator::images();
        let mut images = BlockCollection::new();
        images.add(&mut ids, image_with_defaults("data:a"));
        images.remove("not-there");
        assert_eq!(images.len(), 1);
    }

    #[test]
    fn test_patch_preserves_invariants() {
        let mut ids = IdGenerator::forbidden_areas();
        let mut areas: BlockCollection<FloatingBlock> = BlockCollection::new();
        let d = BlockDefaults::forbidden_area();
        let id = areas.add(
            &mut ids,
            FloatingBlock {
                id: String::new(),
                side: d.side,
                top: d.top,
                width: d.width,
                height: d.height,
            },
        );

        // A hostile patch: negative top, undersized width, NaN height.
        areas.update_patch(
            &id,
            &BlockPatch {
                side: Some(Side::Right),
                top: Some(-12.0),
                width: Some(2.0),
                height: Some(f64::NAN),
            },
        );
        let area = areas.get(&id).unwrap();
        assert_eq!(area.side, Side::Right);
        assert_eq!(area.top, 20.0); // fell back to the pre-patch value
        assert_eq!(area.width, MIN_BLOCK_MM);
        assert_eq!(area.height, 30.0);
        assert!(area.top >= 0.0 && area.width >= MIN_BLOCK_MM && area.height >= MIN_BLOCK_MM);
    }

    #[test]
    fn test_patch_missing_id_is_noop() {
        let mut areas: BlockCollection<FloatingBlock> = BlockCollection::new();
        areas.update_patch("ghost", &BlockPatch::with_top(5.0));
        assert!(areas.is_empty());
    }

    #[test]
    fn test_patch_side_deserializes_leniently() {
        let p: BlockPatch = serde_json::from_str(r#"{ "side": "right" }"#).unwrap();
        assert_eq!(p.side, Some(Side::Right));
        let p: BlockPatch = serde_json::from_str(r#"{ "side": "middle" }"#).unwrap();
        assert_eq!(p.side, Some(Side::Left));
        let p: BlockPatch = serde_json::from_str(r#"{ "side": 7 }"#).unwrap();
        assert_eq!(p.side, Some(Side::Left));
        let p: BlockPatch = serde_json::from_str(r#"{ "top": 3.0 }"#).unwrap();
        assert_eq!(p.side, None);
    }
}
