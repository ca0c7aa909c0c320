//! Benchmark checklist with a hard cap on concurrent selections.

use crate::catalog::BenchmarkCatalog;

pub const MAX_BENCHMARKS: usize = 3;
pub const BENCHMARK_LIMIT_MESSAGE: &str = "Maximum 3 benchmarks allowed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkChoice {
    pub id: String,
    pub name: String,
    pub checked: bool,
}

/// Multi-select over the benchmark catalog. After every change at most
/// [`MAX_BENCHMARKS`] entries are checked.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkSelector {
    choices: Vec<BenchmarkChoice>,
}

impl BenchmarkSelector {
    /// Build the checklist, pre-checking `preselected` ids that exist in the
    /// catalog. Excess preselections are trimmed silently.
    pub fn new(catalog: &BenchmarkCatalog, preselected: &[String]) -> Self {
        let choices = catalog
            .options()
            .iter()
            .map(|o| BenchmarkChoice {
                id: o.id.clone(),
                name: o.name.clone(),
                checked: preselected.iter().any(|p| p == &o.id),
            })
            .collect();
        let mut selector = Self { choices };
        selector.enforce_limit();
        selector
    }

    pub fn choices(&self) -> &[BenchmarkChoice] {
        &self.choices
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn checked_count(&self) -> usize {
        self.choices.iter().filter(|c| c.checked).count()
    }

    /// Checked ids in enumeration order.
    pub fn selected_ids(&self) -> Vec<String> {
        self.choices
            .iter()
            .filter(|c| c.checked)
            .map(|c| c.id.clone())
            .collect()
    }

    /// Flip one entry. Returns `true` when the cap kicked in and an entry
    /// was unchecked, so the caller can warn.
    pub fn toggle(&mut self, index: usize) -> bool {
        let Some(choice) = self.choices.get_mut(index) else {
            return false;
        };
        choice.checked = !choice.checked;
        self.enforce_limit()
    }

    /// Drop checked entries from the end of the list until the cap holds.
    /// The entry removed is the last checked one in enumeration order, not
    /// necessarily the one the user just touched.
    fn enforce_limit(&mut self) -> bool {
        let mut trimmed = false;
        while self.checked_count() > MAX_BENCHMARKS {
            if let Some(last) = self.choices.iter_mut().rev().find(|c| c.checked) {
                last.checked = false;
                trimmed = true;
            }
        }
        if trimmed {
            tracing::debug!(selected = ?self.selected_ids(), "benchmark cap enforced");
        }
        trimmed
    }
}
