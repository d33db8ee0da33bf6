//! Selection of catalog entries for a problem.
//!
//! An entry is accepted only when at least two of four independent
//! signals agree:
//!
//! - (a) parameter-symbol overlap
//! - (b) substring relation between the system type hint and the entry's
//!   domain tag (or id)
//! - (c) a description keyword (longer than two characters) in free text
//! - (d) a name keyword in free text

use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{BTreeSet, HashMap, VecDeque};
use tracing::{debug, warn};

use super::catalog::{CatalogEntry, ModuleLibrary};

/// Words too common to count as a description keyword.
const STOPWORDS: &[&str] = &[
    "and", "the", "with", "for", "from", "into", "through", "under", "near", "their", "that",
    "this", "bodies", "body", "system", "systems", "described", "general", "physical", "acting",
    "moving",
];

/// Signals supporting one entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchSignals {
    /// (a) Parameter symbols overlap.
    pub symbol_overlap: bool,
    /// (b) System type hint and domain tag are substring-related.
    pub type_hint: bool,
    /// (c) A description keyword appears in free text.
    pub description_keyword: bool,
    /// (d) A name keyword appears in free text.
    pub name_keyword: bool,
}

impl MatchSignals {
    /// Number of agreeing signals.
    #[must_use]
    pub fn count(&self) -> usize {
        [
            self.symbol_overlap,
            self.type_hint,
            self.description_keyword,
            self.name_keyword,
        ]
        .iter()
        .filter(|s| **s)
        .count()
    }

    /// Whether enough signals agree to accept the entry.
    #[must_use]
    pub fn accepted(&self) -> bool {
        self.count() >= MIN_SIGNALS
    }
}

/// Minimum number of agreeing signals.
pub const MIN_SIGNALS: usize = 2;

/// Matched entries with their dependency closure.
#[derive(Debug, Clone, Default)]
pub struct Resolution<'a> {
    /// Selected entries; matched and requested first, then dependencies.
    pub entries: Vec<&'a CatalogEntry>,
    /// Registered dependency edges `(module, dependency)`.
    pub edges: Vec<(String, String)>,
}

impl Resolution<'_> {
    /// Dependencies registered for `id`.
    #[must_use]
    pub fn dependencies_of(&self, id: &str) -> Vec<String> {
        self.edges
            .iter()
            .filter(|(from, _)| from == id)
            .map(|(_, to)| to.clone())
            .collect()
    }
}

/// Matches problems against a borrowed [`ModuleLibrary`].
#[derive(Debug, Clone, Copy)]
pub struct ModuleMatcher<'a> {
    library: &'a ModuleLibrary,
}

fn words(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn keywords(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 2)
        .map(str::to_lowercase)
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
}

fn substring_related(a: &str, b: &str) -> bool {
    !a.is_empty() && !b.is_empty() && (a.contains(b) || b.contains(a))
}

impl<'a> ModuleMatcher<'a> {
    /// Create a matcher over `library`.
    #[must_use]
    pub const fn new(library: &'a ModuleLibrary) -> Self {
        Self { library }
    }

    /// Evaluate the four signals for one entry.
    #[must_use]
    pub fn signals<'s, I>(
        entry: &CatalogEntry,
        symbols: I,
        system_type: &str,
        free_text: &str,
    ) -> MatchSignals
    where
        I: IntoIterator<Item = &'s str>,
    {
        let text = words(free_text);
        let hint = system_type.trim().to_lowercase();
        MatchSignals {
            symbol_overlap: symbols.into_iter().any(|s| entry.declares(s)),
            type_hint: substring_related(&hint, entry.domain.as_str())
                || substring_related(&hint, &entry.id),
            description_keyword: keywords(&entry.description).any(|k| text.contains(&k)),
            name_keyword: keywords(&entry.name).any(|k| text.contains(&k)),
        }
    }

    /// Entries with at least two agreeing signals, in catalog order.
    #[must_use]
    pub fn match_modules<'s>(
        &self,
        symbols: &[&'s str],
        system_type: &str,
        free_text: &str,
    ) -> Vec<&'a CatalogEntry> {
        self.library
            .entries()
            .iter()
            .filter(|entry| {
                let signals =
                    Self::signals(entry, symbols.iter().copied(), system_type, free_text);
                debug!(
                    module = %entry.id,
                    signals = signals.count(),
                    "module signals evaluated"
                );
                signals.accepted()
            })
            .collect()
    }

    /// Add catalog dependencies of `selected`, transitively.
    ///
    /// Self-dependencies, dependencies absent from the library and edges
    /// that would close a cycle are never registered.
    #[must_use]
    pub fn resolve(&self, selected: Vec<&'a CatalogEntry>) -> Resolution<'a> {
        let mut graph: DiGraph<String, ()> = DiGraph::new();
        let mut nodes: HashMap<String, NodeIndex> = HashMap::new();
        let mut entries: Vec<&'a CatalogEntry> = Vec::new();
        let mut edges = Vec::new();

        let mut queue = VecDeque::from(selected);
        while let Some(entry) = queue.pop_front() {
            if entries.iter().any(|e| e.id == entry.id) {
                continue;
            }
            entries.push(entry);
            let from = *nodes
                .entry(entry.id.clone())
                .or_insert_with(|| graph.add_node(entry.id.clone()));

            for dep_id in &entry.dependencies {
                if dep_id == &entry.id {
                    warn!(module = %entry.id, "self dependency ignored");
                    continue;
                }
                let Some(dep) = self.library.get(dep_id) else {
                    warn!(module = %entry.id, dependency = %dep_id, "unknown dependency ignored");
                    continue;
                };
                let to = *nodes
                    .entry(dep.id.clone())
                    .or_insert_with(|| graph.add_node(dep.id.clone()));
                if has_path_connecting(&graph, to, from, None) {
                    warn!(module = %entry.id, dependency = %dep_id, "cyclic dependency ignored");
                    continue;
                }
                graph.add_edge(from, to, ());
                edges.push((entry.id.clone(), dep.id.clone()));
                queue.push_back(dep);
            }
        }

        Resolution { entries, edges }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ir::Domain;

    #[test]
    fn test_single_signal_is_not_enough() {
        let lib = ModuleLibrary::standard();
        let matcher = ModuleMatcher::new(&lib);
        // Symbols overlap kinematics but nothing else agrees.
        let matched = matcher.match_modules(&["v0", "a", "t"], "", "");
        assert!(matched.is_empty());
    }

    #[test]
    fn test_symbols_plus_type_hint() {
        let lib = ModuleLibrary::standard();
        let matcher = ModuleMatcher::new(&lib);
        let matched = matcher.match_modules(&["k", "m"], "oscillation", "");
        let ids: Vec<&str> = matched.iter().map(|e| e.id.as_str()).collect();
        assert!(ids.contains(&"oscillation"));
        assert!(!ids.contains(&"wave"));
    }

    #[test]
    fn test_symbols_plus_description_keyword() {
        let lib = ModuleLibrary::standard();
        let matcher = ModuleMatcher::new(&lib);
        let matched = matcher.match_modules(&["v0"], "", "a projectile is launched");
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, "kinematics");
    }

    #[test]
    fn test_text_only_signals() {
        let lib = ModuleLibrary::standard();
        let entry = lib.get("thermal").expect("thermal entry");
        let signals =
            ModuleMatcher::signals(entry, std::iter::empty(), "", "heat transfer in a rod");
        assert!(!signals.symbol_overlap);
        assert!(signals.description_keyword);
        assert!(signals.name_keyword);
        assert!(signals.accepted());
    }

    #[test]
    fn test_short_keywords_ignored() {
        let lib = ModuleLibrary::new();
        let entry = CatalogEntry::new("x", "Ab", Domain::Generic, "of it an");
        let signals = ModuleMatcher::signals(&entry, ["q"], "", "ab of it an");
        assert_eq!(signals.count(), 0);
        assert!(lib.is_empty());
    }

    #[test]
    fn test_resolve_adds_dependencies() {
        let lib = ModuleLibrary::standard();
        let matcher = ModuleMatcher::new(&lib);
        let dynamics = lib.get("dynamics").into_iter().collect();
        let resolution = matcher.resolve(dynamics);
        let ids: Vec<&str> = resolution.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["dynamics", "kinematics"]);
        assert_eq!(resolution.dependencies_of("dynamics"), vec!["kinematics"]);
    }

    #[test]
    fn test_resolve_skips_self_and_cycles() {
        let mut lib = ModuleLibrary::new();
        lib.register(CatalogEntry::new("a", "A", Domain::Generic, "").depends_on(&["a", "b"]));
        lib.register(CatalogEntry::new("b", "B", Domain::Generic, "").depends_on(&["a", "zz"]));
        let matcher = ModuleMatcher::new(&lib);
        let resolution = matcher.resolve(lib.get("a").into_iter().collect());
        assert_eq!(resolution.entries.len(), 2);
        assert_eq!(resolution.edges, vec![("a".to_string(), "b".to_string())]);
    }

    #[test]
    fn test_resolve_breadth_first_order() {
        let mut lib = ModuleLibrary::new();
        lib.register(CatalogEntry::new("a", "A", Domain::Generic, "").depends_on(&["c"]));
        lib.register(CatalogEntry::new("b", "B", Domain::Generic, "").depends_on(&["d"]));
        lib.register(CatalogEntry::new("c", "C", Domain::Generic, "").depends_on(&["d"]));
        lib.register(CatalogEntry::new("d", "D", Domain::Generic, ""));
        let matcher = ModuleMatcher::new(&lib);
        let selected = vec![lib.get("a").unwrap(), lib.get("b").unwrap()];
        let resolution = matcher.resolve(selected);
        let ids: Vec<&str> = resolution.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(resolution.edges.len(), 3);
    }
}
