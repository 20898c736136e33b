/// Ordered named pages with one visible at a time.
#[derive(Debug, Clone)]
pub struct PageStack {
    names: Vec<String>,
    cursor: usize,
    paginator: String,
}

impl PageStack {
    pub fn new(names: Vec<String>) -> Self {
        assert!(!names.is_empty(), "page stack needs at least one page");
        let mut stack = Self {
            names,
            cursor: 0,
            paginator: String::new(),
        };
        stack.paginator = stack.render_paginator();
        stack
    }

    pub fn current(&self) -> usize {
        self.cursor
    }

    pub fn current_name(&self) -> &str {
        &self.names[self.cursor]
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn paginator(&self) -> &str {
        &self.paginator
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|candidate| candidate == name)
    }

    pub fn next(&mut self) -> bool {
        self.change_page((self.cursor + 1) % self.names.len())
    }

    pub fn prev(&mut self) -> bool {
        let count = self.names.len();
        self.change_page((self.cursor + count - 1) % count)
    }

    /// Switches to page `index`. The paginator text is rewritten only when
    /// the visible page actually changes.
    pub fn change_page(&mut self, index: usize) -> bool {
        if index >= self.names.len() || index == self.cursor {
            return false;
        }
        self.cursor = index;
        self.paginator = self.render_paginator();
        true
    }

    fn render_paginator(&self) -> String {
        format!("{}/{}", self.cursor + 1, self.names.len())
    }
}

#[cfg(test)]
mod tests {
    use super::PageStack;

    fn stack() -> PageStack {
        PageStack::new(["lambda", "logs", "insights", "log"].map(String::from).to_vec())
    }

    #[test]
    fn paginator_tracks_visible_page() {
        let mut pages = stack();
        assert_eq!(pages.paginator(), "1/4");
        assert!(pages.prev());
        assert_eq!(pages.paginator(), "4/4");
        assert_eq!(pages.current_name(), "log");
        assert!(pages.next());
        assert!(pages.next());
        assert_eq!(pages.paginator(), "2/4");
    }

    #[test]
    fn change_page_to_current_or_unknown_is_not_a_change() {
        let mut pages = stack();
        assert!(pages.change_page(2));
        assert_eq!(pages.paginator(), "3/4");
        assert!(!pages.change_page(2));
        assert!(!pages.change_page(9));
        assert_eq!(pages.paginator(), "3/4");
        assert_eq!(pages.position("insights"), Some(2));
    }

    #[test]
    fn single_page_never_changes() {
        let mut pages = PageStack::new(vec!["s3".to_string()]);
        assert!(!pages.next());
        assert!(!pages.prev());
        assert_eq!(pages.paginator(), "1/1");
    }
}
