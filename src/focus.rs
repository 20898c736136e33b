use ratatui::layout::Constraint;

/// Cyclic focus order over the focusable widgets of one screen.
#[derive(Debug, Clone)]
pub struct FocusRing<W> {
    widgets: Vec<W>,
    cursor: usize,
}

impl<W: Copy + PartialEq> FocusRing<W> {
    /// Panics on an empty ring: a screen always has something to focus.
    pub fn new(widgets: Vec<W>) -> Self {
        assert!(!widgets.is_empty(), "focus ring needs at least one widget");
        Self { widgets, cursor: 0 }
    }

    pub fn current(&self) -> W {
        self.widgets[self.cursor]
    }

    #[cfg(test)]
    fn cursor(&self) -> usize {
        self.cursor
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn next(&mut self) -> W {
        self.cursor = (self.cursor + 1) % self.widgets.len();
        self.current()
    }

    pub fn prev(&mut self) -> W {
        let count = self.widgets.len();
        self.cursor = (self.cursor + count - 1) % count;
        self.current()
    }

    /// Focus observer: keeps the cursor on `widget` when it gains focus by
    /// any other means. Returns `false` if the widget is not in the ring.
    pub fn observe(&mut self, widget: W) -> bool {
        match self.widgets.iter().position(|candidate| *candidate == widget) {
            Some(index) => {
                self.cursor = index;
                true
            }
            None => false,
        }
    }
}

/// Two adjacent panes sharing a layout axis by integer weight.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct PanePair {
    first: u16,
    second: u16,
}

impl PanePair {
    pub fn new(first: u16, second: u16) -> Self {
        Self {
            first: first.max(1),
            second: second.max(1),
        }
    }

    #[cfg(test)]
    pub fn weights(&self) -> (u16, u16) {
        (self.first, self.second)
    }

    pub fn grow_first(&mut self) -> bool {
        if self.second <= 1 {
            return false;
        }
        self.first += 1;
        self.second -= 1;
        true
    }

    pub fn shrink_first(&mut self) -> bool {
        if self.first <= 1 {
            return false;
        }
        self.first -= 1;
        self.second += 1;
        true
    }

    pub fn constraints(&self) -> [Constraint; 2] {
        [Constraint::Fill(self.first), Constraint::Fill(self.second)]
    }
}
