use nucleo_matcher::pattern::{AtomKind, CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};

use crate::model::Service;
use crate::widgets::TextInput;

/// Page id of the in-app log page.
pub const LOG_PAGE: &str = "log";

#[derive(Debug, Clone)]
struct Entry {
    id: &'static str,
    title: &'static str,
    haystack: String,
}

/// Fuzzy-matched service picker shown on the root body.
#[derive(Debug, Clone)]
pub struct Selector {
    input: TextInput,
    entries: Vec<Entry>,
    ranked: Vec<usize>,
    cursor: usize,
}

impl Default for Selector {
    fn default() -> Self {
        Self::new()
    }
}

impl Selector {
    pub fn new() -> Self {
        let mut entries = Service::ALL
            .iter()
            .map(|service| Entry {
                id: service.id(),
                title: service.title(),
                haystack: format!(
                    "{} {} {}",
                    service.id(),
                    service.title(),
                    service.aliases().join(" ")
                ),
            })
            .collect::<Vec<_>>();
        entries.push(Entry {
            id: LOG_PAGE,
            title: "Log",
            haystack: "log logs-page messages".to_string(),
        });
        let mut selector = Self {
            input: TextInput::new("Service"),
            ranked: Vec::new(),
            entries,
            cursor: 0,
        };
        selector.rank();
        selector
    }

    pub fn input(&self) -> &TextInput {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut TextInput {
        &mut self.input
    }

    /// Ranked `(id, title)` candidates for the current input.
    pub fn candidates(&self) -> Vec<(&'static str, &'static str)> {
        self.ranked
            .iter()
            .map(|index| (self.entries[*index].id, self.entries[*index].title))
            .collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Re-ranks after the input text changed.
    pub fn rank(&mut self) {
        self.ranked = fuzzy_rank(self.input.value(), &self.entries);
        self.cursor = 0;
    }

    pub fn next(&mut self) {
        if !self.ranked.is_empty() {
            self.cursor = (self.cursor + 1) % self.ranked.len();
        }
    }

    pub fn prev(&mut self) {
        let count = self.ranked.len();
        if count > 0 {
            self.cursor = (self.cursor + count - 1) % count;
        }
    }

    /// Completes the input to the highlighted candidate.
    pub fn complete(&mut self) {
        if let Some(index) = self.ranked.get(self.cursor) {
            let id = self.entries[*index].id;
            self.input.set_value(id);
            self.rank();
        }
    }

    /// Id of the page to open, if anything matches.
    pub fn commit(&self) -> Option<&'static str> {
        self.ranked
            .get(self.cursor)
            .map(|index| self.entries[*index].id)
    }

    pub fn reset(&mut self) {
        self.input.clear();
        self.rank();
    }
}

fn fuzzy_rank(query: &str, entries: &[Entry]) -> Vec<usize> {
    let query = query.trim();
    if query.is_empty() {
        return (0..entries.len()).collect();
    }

    // Exact ids and aliases win over fuzzy scores.
    if let Some(service) = Service::from_token(query) {
        if let Some(exact) = entries.iter().position(|entry| entry.id == service.id()) {
            let mut ranked = vec![exact];
            ranked.extend(fuzzy_scores(query, entries).into_iter().filter(|index| *index != exact));
            return ranked;
        }
    }
    fuzzy_scores(query, entries)
}

fn fuzzy_scores(query: &str, entries: &[Entry]) -> Vec<usize> {
    let mut matcher = Matcher::new(Config::DEFAULT);
    let pattern = Pattern::new(
        query,
        CaseMatching::Ignore,
        Normalization::Smart,
        AtomKind::Fuzzy,
    );
    let mut scored = entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let mut buf = Vec::new();
            let haystack = Utf32Str::new(&entry.haystack, &mut buf);
            pattern
                .score(haystack, &mut matcher)
                .map(|score| (index, score))
        })
        .collect::<Vec<_>>();
    scored.sort_by(|left, right| right.1.cmp(&left.1).then(left.0.cmp(&right.0)));
    scored.into_iter().map(|(index, _)| index).collect()
}

#[cfg(test)]
mod tests {
    use super::{LOG_PAGE, Selector};

    fn typed(text: &str) -> Selector {
        let mut selector = Selector::new();
        for ch in text.chars() {
            selector.input_mut().insert(ch);
        }
        selector.rank();
        selector
    }

    #[test]
    fn empty_input_lists_every_page() {
        let selector = Selector::new();
        let ids = selector
            .candidates()
            .into_iter()
            .map(|(id, _)| id)
            .collect::<Vec<_>>();
        assert_eq!(ids.len(), 9);
        assert_eq!(ids[0], "lambda");
        assert_eq!(ids[8], LOG_PAGE);
    }

    #[test]
    fn aliases_commit_to_their_service() {
        assert_eq!(typed("cfn").commit(), Some("cloudformation"));
        assert_eq!(typed("ddb").commit(), Some("dynamodb"));
        assert_eq!(typed("sfn").commit(), Some("stepfunctions"));
    }

    #[test]
    fn fuzzy_input_matches_titles() {
        assert_eq!(typed("stpfn").commit(), Some("stepfunctions"));
        assert_eq!(typed("zzzz").commit(), None);
    }

    #[test]
    fn tab_completes_highlighted_candidate() {
        let mut selector = typed("dyn");
        selector.complete();
        assert_eq!(selector.input().value(), "dynamodb");
        assert_eq!(selector.commit(), Some("dynamodb"));
    }

    #[test]
    fn cursor_cycles_candidates() {
        let mut selector = Selector::new();
        selector.prev();
        assert_eq!(selector.commit(), Some(LOG_PAGE));
        selector.next();
        assert_eq!(selector.commit(), Some("lambda"));
    }
}
