//! Left-to-right combination of condition outcomes.
//!
//! A composite is evaluated as a strict left fold: `result = c1`, then for
//! each following condition `ci` with combinator `opi`,
//! `result = result opi ci`. `AND` does not bind tighter than `OR` and there
//! is no grouping, so `[c1, AND c2, OR c3]` means `((c1 AND c2) OR c3)`,
//! never `(c1 AND (c2 OR c3))`. The execution engine folds the same way.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Combinator {
    #[default]
    And,
    Or,
}

impl Combinator {
    pub fn combine(self, acc: bool, next: bool) -> bool {
        match self {
            Combinator::And => acc && next,
            Combinator::Or => acc || next,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Combinator::And => "AND",
            Combinator::Or => "OR",
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fold per-condition outcomes left to right.
///
/// `combinators[i]` joins `values[i + 1]` onto the accumulated result.
/// Returns `None` for an empty chain. Missing combinators default to `AND`.
pub fn evaluate(values: &[bool], combinators: &[Combinator]) -> Option<bool> {
    let (first, rest) = values.split_first()?;
    Some(rest.iter().enumerate().fold(*first, |acc, (i, value)| {
        let op = combinators.get(i).copied().unwrap_or_default();
        op.combine(acc, *value)
    }))
}

/// Render the fold with explicit parentheses, e.g. `((c1 AND c2) OR c3)`.
pub fn render_expression<S: AsRef<str>>(labels: &[S], combinators: &[Combinator]) -> String {
    let Some((first, rest)) = labels.split_first() else {
        return String::new();
    };
    rest.iter()
        .enumerate()
        .fold(first.as_ref().to_string(), |acc, (i, label)| {
            let op = combinators.get(i).copied().unwrap_or_default();
            format!("({acc} {op} {})", label.as_ref())
        })
}
