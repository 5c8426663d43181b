use std::collections::HashSet;

use crate::services::matcher::SlotTriple;
use crate::services::schedule::Mode;

/// A query-parameter constraint: either absent, or the set of allowed tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Filter {
    #[default]
    Unrestricted,
    OneOf(HashSet<String>),
}

impl Filter {
    /// Build a filter from an optional comma-separated parameter.
    ///
    /// Tokens are trimmed and empty ones dropped, so `mode=` yields an empty
    /// set that matches nothing.
    pub fn parse(param: Option<&str>) -> Self {
        match param {
            None => Filter::Unrestricted,
            Some(raw) => Filter::OneOf(
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        match self {
            Filter::Unrestricted => true,
            Filter::OneOf(set) => set.contains(token),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Filter::Unrestricted)
    }
}

/// Whether a triple belongs in the feed.
///
/// Passes when the gachi leg or the league leg satisfies both filters; a
/// missing leg never satisfies them. With no filters at all every triple passes.
pub fn accept(triple: &SlotTriple<'_>, mode: &Filter, rule: &Filter) -> bool {
    if mode.is_unrestricted() && rule.is_unrestricted() {
        return true;
    }

    [Mode::Gachi, Mode::League].into_iter().any(|m| {
        mode.contains(m.as_str())
            && triple
                .slot(m)
                .is_some_and(|slot| rule.contains(&slot.rule_ex.key))
    })
}
