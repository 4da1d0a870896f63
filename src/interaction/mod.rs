//! # Drag/Resize Interaction
//!
//! The pointer-driven state machine that repositions and resizes floating
//! blocks. One controller serves the whole canvas: a session captures
//! document-global pointer listeners, so only one drag or resize can be
//! active at a time and a session survives the pointer leaving the block.
//!
//! The session is an explicit tagged value rather than ambient mutable
//! state, so the machine is testable without simulating real pointer events.
//! The controller never touches a collection directly; every geometry change
//! goes through [`NotebookState::apply_patch`], the single clamp point.

use crate::collection::BlockPatch;
use crate::model::{BlockTarget, FloatingBlock, NotebookState, Side};

/// A pointer position in device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPoint {
    pub x: f64,
    pub y: f64,
}

/// The canvas container's bounding box in device pixels. Its horizontal
/// midpoint decides side reassignment on drag release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// The interaction session. At most one of Dragging/Resizing exists across
/// the whole canvas; there is no cancel — releasing the pointer is the only
/// way out, and document-global listeners make that work even when the
/// pointer is released outside any tracked target.
#[derive(Debug, Clone, PartialEq)]
pub enum Session {
    Idle,
    Dragging {
        id: String,
        target: BlockTarget,
        start_pointer_y: f64,
        start_top: f64,
        last_pointer_x: f64,
    },
    Resizing {
        id: String,
        target: BlockTarget,
        start_pointer_x: f64,
        start_pointer_y: f64,
        start_width: f64,
        start_height: f64,
    },
}

/// Drives drag and resize sessions against a caller-supplied constant
/// pixels-per-millimeter ratio.
#[derive(Debug)]
pub struct InteractionController {
    px_per_mm: f64,
    session: Session,
}

impl InteractionController {
    pub fn new(px_per_mm: f64) -> Self {
        Self {
            px_per_mm,
            session: Session::Idle,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.session, Session::Idle)
    }

    /// The id currently being dragged, if any (for host highlighting).
    pub fn dragging_id(&self) -> Option<&str> {
        match &self.session {
            Session::Dragging { id, .. } => Some(id),
            _ => None,
        }
    }

    /// The id currently being resized, if any.
    pub fn resizing_id(&self) -> Option<&str> {
        match &self.session {
            Session::Resizing { id, .. } => Some(id),
            _ => None,
        }
    }

    /// Start dragging a block. Returns `false` without touching the session
    /// if one is already active; the host's pointer capture should make that
    /// impossible, and the core refuses rather than clobbering state.
    pub fn begin_drag(
        &mut self,
        target: BlockTarget,
        block: &FloatingBlock,
        pointer: PointerPoint,
    ) -> bool {
        if !self.is_idle() {
            return false;
        }
        self.session = Session::Dragging {
            id: block.id.clone(),
            target,
            start_pointer_y: pointer.y,
            start_top: block.top,
            last_pointer_x: pointer.x,
        };
        true
    }

    /// Start resizing a block. The resize handle is nested inside the
    /// draggable region, so the host must stop the originating event from
    /// also reaching `begin_drag`.
    pub fn begin_resize(
        &mut self,
        target: BlockTarget,
        block: &FloatingBlock,
        pointer: PointerPoint,
    ) -> bool {
        if !self.is_idle() {
            return false;
        }
        self.session = Session::Resizing {
            id: block.id.clone(),
            target,
            start_pointer_x: pointer.x,
            start_pointer_y: pointer.y,
            start_width: block.width,
            start_height: block.height,
        };
        true
    }

    /// Process a pointer move against the active session. Applied on every
    /// event, strictly in arrival order; a host may coalesce moves to
    /// animation-frame granularity without changing the end state. Patches
    /// addressed to a block that was deleted mid-session are no-ops.
    pub fn pointer_move(&mut self, pointer: PointerPoint, state: &mut NotebookState) {
        match &mut self.session {
            Session::Idle => {}
            Session::Dragging {
                id,
                target,
                start_pointer_y,
                start_top,
                last_pointer_x,
            } => {
                let dy_mm = (pointer.y - *start_pointer_y) / self.px_per_mm;
                let next_top = (*start_top + dy_mm).max(0.0);
                *last_pointer_x = pointer.x;
                state.apply_patch(*target, id, &BlockPatch::with_top(next_top));
            }
            Session::Resizing {
                id,
                target,
                start_pointer_x,
                start_pointer_y,
                start_width,
                start_height,
            } => {
                let dx_mm = (pointer.x - *start_pointer_x) / self.px_per_mm;
                let dy_mm = (pointer.y - *start_pointer_y) / self.px_per_mm;
                let next_width = *start_width + dx_mm;
                let next_height = *start_height + dy_mm;
                state.apply_patch(*target, id, &BlockPatch::with_size(next_width, next_height));
            }
        }
    }

    /// End the active session. For a drag this is the sole mechanism that
    /// reassigns a block's margin: the last pointer x is compared against
    /// the canvas midpoint (left of the midpoint means left side), and the
    /// side is patched even when unchanged. A resize release changes
    /// nothing.
    pub fn pointer_up(&mut self, canvas: &CanvasRect, state: &mut NotebookState) {
        let finished = std::mem::replace(&mut self.session, Session::Idle);
        if let Session::Dragging {
            id,
            target,
            last_pointer_x,
            ..
        } = finished
        {
            let relative_x = last_pointer_x - canvas.left;
            let side = if relative_x < canvas.width / 2.0 {
                Side::Left
            } else {
                Side::Right
            };
            state.apply_patch(target, &id, &BlockPatch::with_side(side));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::BlockCollection;
    use crate::model::{ForbiddenArea, ImageElement, PaperConfig};
    use crate::units::MM_TO_PX;

    fn area(id: &str, side: Side, top: f64) -> ForbiddenArea {
        ForbiddenArea {
            id: id.to_string(),
            side,
            top,
            width: 35.0,
            height: 30.0,
        }
    }

    fn state_with_area(a: ForbiddenArea) -> NotebookState {
        let mut state = NotebookState::default_for(&PaperConfig::b5());
        state.forbidden_areas = BlockCollection::from_vec(vec![a]);
        state
    }

    fn canvas(width: f64) -> CanvasRect {
        CanvasRect {
            left: 0.0,
            top: 0.0,
            width,
            height: 971.0,
        }
    }

    fn at(x: f64, y: f64) -> PointerPoint {
        PointerPoint { x, y }
    }

    #[test]
    fn test_drag_moves_top_by_pixel_delta() {
        let mut state = state_with_area(area("fz", Side::Left, 20.0));
        let mut ctl = InteractionController::new(MM_TO_PX);
        let block = state.forbidden_areas.get("fz").unwrap().clone();

        assert!(ctl.begin_drag(BlockTarget::ForbiddenArea, &block, at(100.0, 100.0)));
        // 37.8px down at 3.78 px/mm is 10mm.
        ctl.pointer_move(at(100.0, 137.8), &mut state);
        let top = state.forbidden_areas.get("fz").unwrap().top;
        assert!((top - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_drag_top_never_goes_negative() {
        let mut state = state_with_area(area("fz", Side::Left, 5.0));
        let mut ctl = InteractionController::new(MM_TO_PX);
        let block = state.forbidden_areas.get("fz").unwrap().clone();

        ctl.begin_drag(BlockTarget::ForbiddenArea, &block, at(100.0, 100.0));
        ctl.pointer_move(at(100.0, -500.0), &mut state);
        assert_eq!(state.forbidden_areas.get("fz").unwrap().top, 0.0);
    }

    #[test]
    fn test_drag_release_side_boundary() {
        // Container width 600: release at 299 is left, at 300 is right.
        for (x, expected) in [(299.0, Side::Left), (300.0, Side::Right)] {
            let mut state = state_with_area(area("fz", Side::Left, 20.0));
            let mut ctl = InteractionController::new(MM_TO_PX);
            let block = state.forbidden_areas.get("fz").unwrap().clone();

            ctl.begin_drag(BlockTarget::ForbiddenArea, &block, at(x, 100.0));
            ctl.pointer_move(at(x, 110.0), &mut state);
            ctl.pointer_up(&canvas(600.0), &mut state);
            assert_eq!(state.forbidden_areas.get("fz").unwrap().side, expected);
            assert!(ctl.is_idle());
        }
    }

    #[test]
    fn test_drag_release_patches_side_even_if_unchanged() {
        let mut state = state_with_area(area("fz", Side::Right, 20.0));
        let mut ctl = InteractionController::new(MM_TO_PX);
        let block = state.forbidden_areas.get("fz").unwrap().clone();

        // No move events at all: the start x decides.
        ctl.begin_drag(BlockTarget::ForbiddenArea, &block, at(50.0, 100.0));
        ctl.pointer_up(&canvas(600.0), &mut state);
        assert_eq!(state.forbidden_areas.get("fz").unwrap().side, Side::Left);
    }

    #[test]
    fn test_resize_clamps_to_minimum() {
        let mut state = state_with_area(area("fz", Side::Left, 20.0));
        let mut ctl = InteractionController::new(MM_TO_PX);
        let block = state.forbidden_areas.get("fz").unwrap().clone();

        ctl.begin_resize(BlockTarget::ForbiddenArea, &block, at(200.0, 200.0));
        ctl.pointer_move(at(-1000.0, -1000.0), &mut state);
        let shrunk = state.forbidden_areas.get("fz").unwrap();
        assert_eq!(shrunk.width, 10.0);
        assert_eq!(shrunk.height, 10.0);
    }

    #[test]
    fn test_resize_release_keeps_side_and_top() {
        let mut state = state_with_area(area("fz", Side::Left, 20.0));
        let mut ctl = InteractionController::new(MM_TO_PX);
        let block = state.forbidden_areas.get("fz").unwrap().clone();

        ctl.begin_resize(BlockTarget::ForbiddenArea, &block, at(200.0, 200.0));
        // Pointer ends far right; a drag would flip the side, a resize must not.
        ctl.pointer_move(at(590.0, 210.0), &mut state);
        ctl.pointer_up(&canvas(600.0), &mut state);
        let resized = state.forbidden_areas.get("fz").unwrap();
        assert_eq!(resized.side, Side::Left);
        assert_eq!(resized.top, 20.0);
        assert!(ctl.is_idle());
    }

    #[test]
    fn test_begin_is_refused_while_session_active() {
        let mut state = state_with_area(area("fz", Side::Left, 20.0));
        let mut ctl = InteractionController::new(MM_TO_PX);
        let block = state.forbidden_areas.get("fz").unwrap().clone();

        assert!(ctl.begin_drag(BlockTarget::ForbiddenArea, &block, at(10.0, 10.0)));
        assert!(!ctl.begin_resize(BlockTarget::ForbiddenArea, &block, at(10.0, 10.0)));
        assert!(!ctl.begin_drag(BlockTarget::ForbiddenArea, &block, at(10.0, 10.0)));
        assert_eq!(ctl.dragging_id(), Some("fz"));
    }

    #[test]
    fn test_patch_to_deleted_block_is_noop() {
        let mut state = state_with_area(area("fz", Side::Left, 20.0));
        let mut ctl = InteractionController::new(MM_TO_PX);
        let block = state.forbidden_areas.get("fz").unwrap().clone();

        ctl.begin_drag(BlockTarget::ForbiddenArea, &block, at(100.0, 100.0));
        state.forbidden_areas.remove("fz");
        // Mid-session deletion: moves and release must end cleanly.
        ctl.pointer_move(at(100.0, 150.0), &mut state);
        ctl.pointer_up(&canvas(600.0), &mut state);
        assert!(ctl.is_idle());
        assert!(state.forbidden_areas.is_empty());
    }

    #[test]
    fn test_image_drag_routes_to_image_collection() {
        let mut state = NotebookState::default_for(&PaperConfig::b5());
        state.images = BlockCollection::from_vec(vec![ImageElement {
            block: area("img", Side::Left, 15.0),
            url: "data:image/png;base64,xx".to_string(),
        }]);
        let mut ctl = InteractionController::new(MM_TO_PX);
        let block = state.images.get("img").unwrap().block.clone();

        ctl.begin_drag(BlockTarget::Image, &block, at(500.0, 100.0));
        ctl.pointer_move(at(500.0, 137.8), &mut state);
        ctl.pointer_up(&canvas(600.0), &mut state);
        let img = state.images.get("img").unwrap();
        assert!((img.block.top - 25.0).abs() < 1e-9);
        assert_eq!(img.block.side, Side::Right);
    }
}
