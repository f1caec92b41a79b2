//! Zoom and pan handling for the maze viewport.
//!
//! Nothing in here feeds back into gameplay. The view only decides where each maze cell lands
//! on screen, so collision, generation and pathfinding never see it.

use crate::maze::Position;

/// Factor applied by a single zoom-in or zoom-out event.
pub const ZOOM_STEP: f64 = 1.1;
/// Smallest zoom factor.
pub const MIN_ZOOM: f64 = 0.5;
/// Largest zoom factor.
pub const MAX_ZOOM: f64 = 3.0;

/// A 2D offset or point in screen units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Offset {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
}

impl Offset {
    /// Builds an offset from its components.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Anchor recorded when a drag gesture starts.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Drag {
    /// Pointer position at drag start.
    pointer: Offset,
    /// Pan offset at drag start.
    pan: Offset,
}

/// Render-only view parameters of a session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewState {
    /// Current zoom factor, always within [`MIN_ZOOM`]..=[`MAX_ZOOM`].
    zoom: f64,
    /// Accumulated pan offset.
    pan: Offset,
    /// Active drag gesture, if any.
    drag: Option<Drag>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewState {
    /// Unzoomed, unpanned view.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            zoom: 1.0,
            pan: Offset::new(0.0, 0.0),
            drag: None,
        }
    }

    /// Restores a view from stored values.
    ///
    /// A zoom factor outside the accepted range falls back to 1.0 instead of being clamped, since
    /// it can only come from a damaged record.
    #[must_use]
    pub fn restore(zoom: f64, pan: Offset) -> Self {
        let zoom = if (MIN_ZOOM..=MAX_ZOOM).contains(&zoom) {
            zoom
        } else {
            1.0
        };

        Self {
            zoom,
            pan,
            drag: None,
        }
    }

    /// Current zoom factor.
    #[must_use]
    pub const fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Current pan offset.
    #[must_use]
    pub const fn pan(&self) -> Offset {
        self.pan
    }

    /// Whether a drag gesture is in progress.
    #[must_use]
    pub const fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Multiplies the zoom by [`ZOOM_STEP`], up to [`MAX_ZOOM`].
    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * ZOOM_STEP).min(MAX_ZOOM);
    }

    /// Divides the zoom by [`ZOOM_STEP`], down to [`MIN_ZOOM`].
    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / ZOOM_STEP).max(MIN_ZOOM);
    }

    /// Anchors a drag gesture at `pointer`.
    pub fn begin_drag(&mut self, pointer: Offset) {
        self.drag = Some(Drag {
            pointer,
            pan: self.pan,
        });
    }

    /// Moves the pan so that it follows the pointer relative to the drag anchor.
    ///
    /// Pointer motion outside of a drag gesture is ignored.
    pub fn drag_to(&mut self, pointer: Offset) {
        if let Some(drag) = self.drag {
            self.pan = Offset::new(
                drag.pan.x + pointer.x - drag.pointer.x,
                drag.pan.y + pointer.y - drag.pointer.y,
            );
        }
    }

    /// Ends the current drag gesture, keeping the pan where it is.
    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    /// Returns to the unzoomed, unpanned view.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Size of one maze cell in screen units at zoom 1.0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellSize {
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl CellSize {
    /// Terminal cells are roughly twice as tall as they are wide, so a square maze cell spans two
    /// columns and one row.
    pub const TERMINAL: Self = Self {
        width: 2.0,
        height: 1.0,
    };
}

/// Destination rectangle of a maze cell, in screen units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellRect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

/// Mapping from maze cells to screen rectangles.
///
/// The transform is a plain function of the zoom factor, the pan offset, the cell size and the
/// screen position of the maze origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    /// Zoom factor.
    zoom: f64,
    /// Pan offset added to the origin.
    pan: Offset,
    /// Unzoomed cell size.
    cell: CellSize,
    /// Screen position of cell (0, 0) before panning.
    origin: Offset,
}

impl ViewTransform {
    /// Builds a transform with an explicit origin.
    #[must_use]
    pub const fn new(view: &ViewState, cell: CellSize, origin: Offset) -> Self {
        Self {
            zoom: view.zoom,
            pan: view.pan,
            cell,
            origin,
        }
    }

    /// Builds a transform that centres a `columns` by `rows` maze in a viewport before applying
    /// the pan offset.
    #[must_use]
    pub fn centered(
        view: &ViewState,
        cell: CellSize,
        (columns, rows): (usize, usize),
        viewport: CellRect,
    ) -> Self {
        let extent_x = columns as f64 * cell.width * view.zoom;
        let extent_y = rows as f64 * cell.height * view.zoom;
        let origin = Offset::new(
            viewport.x + ((viewport.width - extent_x) / 2.0).floor(),
            viewport.y + ((viewport.height - extent_y) / 2.0).floor(),
        );

        Self::new(view, cell, origin)
    }

    /// Destination rectangle of the cell at `pos`.
    #[must_use]
    pub fn cell_rect(&self, pos: Position) -> CellRect {
        let width = self.cell.width * self.zoom;
        let height = self.cell.height * self.zoom;

        CellRect {
            x: self.origin.x + self.pan.x + pos.x as f64 * width,
            y: self.origin.y + self.pan.y + pos.y as f64 * height,
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tolerance for floating point comparisons.
    const EPSILON: f64 = 1e-9;

    /// Asserts two floats are equal within [`EPSILON`].
    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPSILON,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_default_view() {
        let view = ViewState::default();

        assert_close(view.zoom(), 1.0);
        assert_eq!(view.pan(), Offset::default());
        assert!(!view.is_dragging());
    }

    #[test]
    fn test_five_zoom_ins_stay_below_limit() {
        let mut view = ViewState::new();
        for _ in 0..5 {
            view.zoom_in();
        }

        assert_close(view.zoom(), MAX_ZOOM.min(ZOOM_STEP.powi(5)));
        assert_close(view.zoom(), 1.610_51);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut view = ViewState::new();
        for _ in 0..30 {
            view.zoom_in();
        }
        assert_close(view.zoom(), MAX_ZOOM);

        for _ in 0..60 {
            view.zoom_out();
        }
        assert_close(view.zoom(), MIN_ZOOM);
    }

    #[test]
    fn test_zoom_in_then_out_returns_to_start() {
        let mut view = ViewState::new();
        view.zoom_in();
        view.zoom_out();

        assert_close(view.zoom(), 1.0);
    }

    #[test]
    fn test_drag_pans_relative_to_anchor() {
        let mut view = ViewState::restore(1.0, Offset::new(10.0, -4.0));

        view.begin_drag(Offset::new(50.0, 50.0));
        view.drag_to(Offset::new(53.0, 48.0));
        view.drag_to(Offset::new(60.0, 45.0));

        assert_eq!(view.pan(), Offset::new(20.0, -9.0));

        view.end_drag();
        view.drag_to(Offset::new(0.0, 0.0));

        assert_eq!(view.pan(), Offset::new(20.0, -9.0), "motion after release is ignored");
    }

    #[test]
    fn test_restore_rejects_out_of_range_zoom() {
        assert_close(ViewState::restore(7.5, Offset::default()).zoom(), 1.0);
        assert_close(ViewState::restore(0.1, Offset::default()).zoom(), 1.0);
        assert_close(ViewState::restore(2.0, Offset::default()).zoom(), 2.0);
    }

    #[test]
    fn test_reset_clears_zoom_and_pan() {
        let mut view = ViewState::new();
        view.zoom_in();
        view.begin_drag(Offset::new(0.0, 0.0));
        view.drag_to(Offset::new(5.0, 5.0));

        view.reset();

        assert_eq!(view, ViewState::new());
    }

    #[test]
    fn test_cell_rect_applies_zoom_and_pan() {
        let view = ViewState::restore(2.0, Offset::new(3.0, 1.0));
        let transform = ViewTransform::new(&view, CellSize::TERMINAL, Offset::new(10.0, 5.0));

        let rect = transform.cell_rect(Position::new(2, 3));

        assert_close(rect.x, 10.0 + 3.0 + 2.0 * 4.0);
        assert_close(rect.y, 5.0 + 1.0 + 3.0 * 2.0);
        assert_close(rect.width, 4.0);
        assert_close(rect.height, 2.0);
    }

    #[test]
    fn test_centered_transform() {
        let view = ViewState::new();
        let viewport = CellRect {
            x: 0.0,
            y: 0.0,
            width: 80.0,
            height: 24.0,
        };
        let transform = ViewTransform::centered(&view, CellSize::TERMINAL, (21, 21), viewport);

        let first = transform.cell_rect(Position::new(0, 0));
        let last = transform.cell_rect(Position::new(20, 20));

        assert_close(first.x, 19.0);
        assert_close(first.y, 1.0);
        assert_close(last.x + last.width, 61.0);
        assert_close(last.y + last.height, 22.0);
    }
}
