//! Rectangle selection state machine for the overlay
//!
//! The machine is pure: it sees pointer and key input as [`SelectionEvent`]s
//! and reports what the caller has to do through a [`Transition`]. Drawing,
//! cropping and surface teardown stay with the caller.

use super::geometry::{Point, Rect};

/// Where the overlay is in its lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionState {
    /// Waiting for the pointer to be pressed
    #[default]
    Idle,
    /// Pointer held down; `end` follows the pointer
    Dragging { start: Point, end: Point },
    /// A non-degenerate rectangle was released
    Finished(Rect),
    /// Escape was pressed
    Cancelled,
}

/// Input fed to the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEvent {
    PointerDown(Point),
    PointerMove(Point),
    PointerUp,
    Cancel,
}

/// Result of feeding one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed
    Ignored,
    /// The visible rectangle changed and the overlay must repaint
    Redraw,
    /// Selection is complete, crop this rectangle
    Finished(Rect),
    /// User aborted the session
    Cancelled,
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    state: SelectionState,
    /// Output the current drag started on
    owner: Option<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn state(&self) -> SelectionState {
        self.state
    }

    /// True once the selection finished or was cancelled
    #[cfg(test)]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            SelectionState::Finished(_) | SelectionState::Cancelled
        )
    }

    /// True while the pointer is held down
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, SelectionState::Dragging { .. })
    }

    /// The rectangle currently shown to the user, if it has any area
    pub fn rect(&self) -> Option<Rect> {
        let rect = match self.state {
            SelectionState::Dragging { start, end } => Rect::from_corners(start, end),
            SelectionState::Finished(rect) => rect,
            SelectionState::Idle | SelectionState::Cancelled => return None,
        };
        (!rect.is_empty()).then_some(rect)
    }

    /// Output owning the current or finished drag
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Feed an event reported by the overlay on `output`.
    ///
    /// A drag belongs to the output it started on. While dragging, presses
    /// and moves from other outputs are ignored, but a release from any
    /// output ends the drag since the button may be let go elsewhere.
    pub fn handle_from(&mut self, output: &str, event: SelectionEvent) -> Transition {
        match event {
            SelectionEvent::PointerDown(_) if self.state == SelectionState::Idle => {
                self.owner = Some(output.to_string());
            }
            SelectionEvent::PointerMove(_) if self.owner.as_deref() != Some(output) => {
                return Transition::Ignored;
            }
            _ => {}
        }

        let transition = self.handle(event);
        if self.state == SelectionState::Idle {
            self.owner = None;
        }
        transition
    }

    /// Advance the machine by one event.
    ///
    /// `Finished` and `Cancelled` are absorbing: once reached, every later
    /// event is ignored, so `Transition::Finished` is produced at most once.
    /// A release whose rectangle has zero width or zero height returns to
    /// `Idle` rather than finishing, even when start and end differ.
    pub fn handle(&mut self, event: SelectionEvent) -> Transition {
        match (self.state, event) {
            (SelectionState::Finished(_) | SelectionState::Cancelled, _) => Transition::Ignored,
            (_, SelectionEvent::Cancel) => {
                self.state = SelectionState::Cancelled;
                Transition::Cancelled
            }
            (SelectionState::Idle, SelectionEvent::PointerDown(pos)) => {
                self.state = SelectionState::Dragging {
                    start: pos,
                    end: pos,
                };
                Transition::Redraw
            }
            (SelectionState::Dragging { start, end }, SelectionEvent::PointerMove(pos)) => {
                if pos == end {
                    return Transition::Ignored;
                }
                self.state = SelectionState::Dragging { start, end: pos };
                Transition::Redraw
            }
            (SelectionState::Dragging { start, end }, SelectionEvent::PointerUp) => {
                let rect = Rect::from_corners(start, end);
                if rect.is_empty() {
                    log::debug!("Degenerate selection at {start:?}, waiting for a new drag");
                    self.state = SelectionState::Idle;
                    Transition::Redraw
                } else {
                    log::debug!("Selection finished: {rect:?}");
                    self.state = SelectionState::Finished(rect);
                    Transition::Finished(rect)
                }
            }
            _ => Transition::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drag(from: Point, to: Point) -> Transition {
        let mut selection = Selection::new();
        selection.handle(SelectionEvent::PointerDown(from));
        selection.handle(SelectionEvent::PointerMove(to));
        selection.handle(SelectionEvent::PointerUp)
    }

    #[test]
    fn test_all_drag_directions_give_same_rect() {
        let expected = Transition::Finished(Rect::new(10, 10, 60, 40));
        assert_eq!(drag(Point::new(10, 10), Point::new(60, 40)), expected);
        assert_eq!(drag(Point::new(60, 40), Point::new(10, 10)), expected);
        assert_eq!(drag(Point::new(60, 10), Point::new(10, 40)), expected);
        assert_eq!(drag(Point::new(10, 40), Point::new(60, 10)), expected);
    }

    #[test]
    fn test_click_without_drag_returns_to_idle() {
        let mut selection = Selection::new();
        selection.handle(SelectionEvent::PointerDown(Point::new(5, 5)));
        let t = selection.handle(SelectionEvent::PointerUp);

        assert_eq!(t, Transition::Redraw);
        assert_eq!(selection.state(), SelectionState::Idle);
        assert!(selection.rect().is_none());
    }

    #[test]
    fn test_drag_back_to_start_is_degenerate() {
        let mut selection = Selection::new();
        selection.handle(SelectionEvent::PointerDown(Point::new(5, 5)));
        selection.handle(SelectionEvent::PointerMove(Point::new(50, 50)));
        selection.handle(SelectionEvent::PointerMove(Point::new(5, 5)));
        assert_eq!(selection.handle(SelectionEvent::PointerUp), Transition::Redraw);
        assert_eq!(selection.state(), SelectionState::Idle);
    }

    #[test]
    fn test_new_drag_after_degenerate_release() {
        let mut selection = Selection::new();
        selection.handle(SelectionEvent::PointerDown(Point::new(5, 5)));
        selection.handle(SelectionEvent::PointerUp);

        assert_eq!(
            drag_on(&mut selection, Point::new(0, 0), Point::new(20, 20)),
            Transition::Finished(Rect::new(0, 0, 20, 20))
        );
    }

    fn drag_on(selection: &mut Selection, from: Point, to: Point) -> Transition {
        selection.handle(SelectionEvent::PointerDown(from));
        selection.handle(SelectionEvent::PointerMove(to));
        selection.handle(SelectionEvent::PointerUp)
    }

    #[test]
    fn test_escape_while_dragging_cancels() {
        let mut selection = Selection::new();
        selection.handle(SelectionEvent::PointerDown(Point::new(1, 1)));
        selection.handle(SelectionEvent::PointerMove(Point::new(30, 30)));

        assert_eq!(selection.handle(SelectionEvent::Cancel), Transition::Cancelled);
        assert_eq!(selection.state(), SelectionState::Cancelled);
        // a release after cancelling must not produce a crop
        assert_eq!(selection.handle(SelectionEvent::PointerUp), Transition::Ignored);
    }

    #[test]
    fn test_escape_while_idle_cancels() {
        let mut selection = Selection::new();
        assert_eq!(selection.handle(SelectionEvent::Cancel), Transition::Cancelled);
        assert!(selection.is_terminal());
    }

    #[test]
    fn test_moves_never_finish() {
        let mut selection = Selection::new();
        selection.handle(SelectionEvent::PointerDown(Point::new(0, 0)));
        for i in 1..200 {
            let t = selection.handle(SelectionEvent::PointerMove(Point::new(i, i * 2)));
            assert_eq!(t, Transition::Redraw);
        }
        assert!(selection.is_dragging());
        assert_eq!(selection.rect(), Some(Rect::new(0, 0, 199, 398)));
    }

    #[test]
    fn test_finished_reported_once() {
        let mut selection = Selection::new();
        let first = drag_on(&mut selection, Point::new(0, 0), Point::new(10, 10));
        assert!(matches!(first, Transition::Finished(_)));

        assert_eq!(
            drag_on(&mut selection, Point::new(0, 0), Point::new(90, 90)),
            Transition::Ignored
        );
        assert_eq!(selection.handle(SelectionEvent::PointerUp), Transition::Ignored);
        assert_eq!(selection.handle(SelectionEvent::Cancel), Transition::Ignored);
        assert_eq!(
            selection.state(),
            SelectionState::Finished(Rect::new(0, 0, 10, 10))
        );
    }

    #[test]
    fn test_move_and_release_ignored_when_idle() {
        let mut selection = Selection::new();
        assert_eq!(
            selection.handle(SelectionEvent::PointerMove(Point::new(3, 3))),
            Transition::Ignored
        );
        assert_eq!(selection.handle(SelectionEvent::PointerUp), Transition::Ignored);
        assert_eq!(selection.state(), SelectionState::Idle);
    }

    #[test]
    fn test_repeated_move_to_same_point_ignored() {
        let mut selection = Selection::new();
        selection.handle(SelectionEvent::PointerDown(Point::new(0, 0)));
        selection.handle(SelectionEvent::PointerMove(Point::new(4, 4)));
        assert_eq!(
            selection.handle(SelectionEvent::PointerMove(Point::new(4, 4))),
            Transition::Ignored
        );
    }

    #[test]
    fn test_drag_owned_by_starting_output() {
        let mut selection = Selection::new();
        selection.handle_from("DP-1", SelectionEvent::PointerDown(Point::new(10, 10)));
        assert_eq!(selection.owner(), Some("DP-1"));

        assert_eq!(
            selection.handle_from("DP-1", SelectionEvent::PointerMove(Point::new(40, 30))),
            Transition::Redraw
        );
        assert_eq!(selection.rect(), Some(Rect::new(10, 10, 40, 30)));
    }

    #[test]
    fn test_moves_from_other_output_ignored() {
        let mut selection = Selection::new();
        selection.handle_from("DP-1", SelectionEvent::PointerDown(Point::new(10, 10)));
        selection.handle_from("DP-1", SelectionEvent::PointerMove(Point::new(40, 30)));

        assert_eq!(
            selection.handle_from("HDMI-A-1", SelectionEvent::PointerMove(Point::new(900, 900))),
            Transition::Ignored
        );
        assert_eq!(selection.rect(), Some(Rect::new(10, 10, 40, 30)));
    }

    #[test]
    fn test_release_on_other_output_finishes_drag() {
        let mut selection = Selection::new();
        selection.handle_from("DP-1", SelectionEvent::PointerDown(Point::new(10, 10)));
        selection.handle_from("DP-1", SelectionEvent::PointerMove(Point::new(40, 30)));

        assert_eq!(
            selection.handle_from("HDMI-A-1", SelectionEvent::PointerUp),
            Transition::Finished(Rect::new(10, 10, 40, 30))
        );
        assert_eq!(selection.owner(), Some("DP-1"));
    }

    #[test]
    fn test_press_on_second_output_mid_drag_ignored() {
        let mut selection = Selection::new();
        selection.handle_from("DP-1", SelectionEvent::PointerDown(Point::new(10, 10)));
        selection.handle_from("DP-1", SelectionEvent::PointerMove(Point::new(40, 30)));

        assert_eq!(
            selection.handle_from("HDMI-A-1", SelectionEvent::PointerDown(Point::new(5, 5))),
            Transition::Ignored
        );
        assert_eq!(selection.owner(), Some("DP-1"));
        assert_eq!(selection.rect(), Some(Rect::new(10, 10, 40, 30)));
    }

    #[test]
    fn test_degenerate_release_frees_ownership() {
        let mut selection = Selection::new();
        selection.handle_from("DP-1", SelectionEvent::PointerDown(Point::new(10, 10)));
        selection.handle_from("DP-1", SelectionEvent::PointerUp);
        assert_eq!(selection.owner(), None);

        selection.handle_from("HDMI-A-1", SelectionEvent::PointerDown(Point::new(0, 0)));
        selection.handle_from("HDMI-A-1", SelectionEvent::PointerMove(Point::new(20, 20)));
        assert_eq!(
            selection.handle_from("HDMI-A-1", SelectionEvent::PointerUp),
            Transition::Finished(Rect::new(0, 0, 20, 20))
        );
        assert_eq!(selection.owner(), Some("HDMI-A-1"));
    }

    #[test]
    fn test_zero_height_release_with_distinct_ends_returns_to_idle() {
        let mut selection = Selection::new();
        selection.handle(SelectionEvent::PointerDown(Point::new(5, 5)));
        selection.handle(SelectionEvent::PointerMove(Point::new(60, 5)));
        assert_eq!(selection.handle(SelectionEvent::PointerUp), Transition::Redraw);
        assert_eq!(selection.state(), SelectionState::Idle);
    }
}
