//! Navigation button state.
//!
//! The buttons themselves just delegate to the viewer widget
//! (`flip_to_page(0)`, `flip_prev`, `flip_next`); this module only
//! answers which of them should be enabled, recomputed after every flip.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavButtons {
    pub first_enabled: bool,
    pub prev_enabled: bool,
    pub next_enabled: bool,
}

impl NavButtons {
    pub fn compute(current_page_index: usize, page_count: usize) -> Self {
        let at_first = current_page_index == 0;
        let at_last = page_count == 0 || current_page_index + 1 >= page_count;

        Self { first_enabled: !at_first, prev_enabled: !at_first, next_enabled: !at_last }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_disables_backward_navigation() {
        let buttons = NavButtons::compute(0, 10);

        assert!(!buttons.first_enabled);
        assert!(!buttons.prev_enabled);
        assert!(buttons.next_enabled);
    }

    #[test]
    fn last_page_disables_forward_navigation() {
        let buttons = NavButtons::compute(9, 10);

        assert!(buttons.first_enabled);
        assert!(buttons.prev_enabled);
        assert!(!buttons.next_enabled);
    }

    #[test]
    fn middle_page_enables_everything() {
        let buttons = NavButtons::compute(4, 10);

        assert!(buttons.first_enabled);
        assert!(buttons.prev_enabled);
        assert!(buttons.next_enabled);
    }

    #[test]
    fn single_page_document_disables_all() {
        let buttons = NavButtons::compute(0, 1);

        assert!(!buttons.first_enabled);
        assert!(!buttons.prev_enabled);
        assert!(!buttons.next_enabled);
    }

    #[test]
    fn empty_document_disables_all() {
        let buttons = NavButtons::compute(0, 0);

        assert!(!buttons.first_enabled);
        assert!(!buttons.prev_enabled);
        assert!(!buttons.next_enabled);
    }
}
