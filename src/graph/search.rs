use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use super::model::{Graph, NodeId};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl Graph {
    /// Live nodes whose key or label fuzzy-matches `query`, best match first.
    ///
    /// An exact key match always wins and is returned alone.
    pub fn find_nodes(&self, query: &str) -> Vec<NodeId> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        if let Some(id) = self.node_by_key(query) {
            return vec![id];
        }

        let matcher = SkimMatcherV2::default();
        let mut scored = self
            .nodes()
            .filter_map(|id| {
                let node = self.node(id)?;
                let score = fuzzy_match_score(&matcher, &node.key, query)
                    .into_iter()
                    .chain(fuzzy_match_score(&matcher, &node.label, query))
                    .max()?;
                Some((id, score))
            })
            .collect::<Vec<_>>();

        scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        scored.into_iter().map(|(id, _)| id).collect()
    }
}
