//! Range resolution into position-stable indices.
//!
//! Positions are counted from the root commit of the baseline and are the only
//! thing carried across rewrites; identifiers are resolved again at each step.

use tracing::debug;

use crate::error::ResolveError;
use crate::git::history::History;
use crate::rewrite::model::BaselineSnapshot;

/// Reserved range token selecting only the tip commit.
pub const TIP_TOKEN: &str = "head";

/// What the user asked to rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeSpec {
    /// Every commit reachable from HEAD.
    All,
    /// Only the highest position.
    Tip,
    /// A range expression handed to the history query.
    Expr(String),
}

impl RangeSpec {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => RangeSpec::All,
            Some(token) if token.eq_ignore_ascii_case(TIP_TOKEN) => RangeSpec::Tip,
            Some(expr) => RangeSpec::Expr(expr.to_string()),
        }
    }
}

/// Map a range onto ascending, deduplicated baseline positions.
///
/// Identifiers the query returns that are not in the baseline are dropped.
/// An empty result is [`ResolveError::EmptyTarget`].
pub fn resolve_positions<H: History + ?Sized>(
    spec: &RangeSpec,
    baseline: &BaselineSnapshot,
    history: &H,
) -> Result<Vec<usize>, ResolveError> {
    let mut positions: Vec<usize> = match spec {
        RangeSpec::All => (0..baseline.len()).collect(),
        RangeSpec::Tip => baseline.tip().into_iter().collect(),
        RangeSpec::Expr(expr) => history
            .list_commits(Some(expr))
            .map_err(ResolveError::Query)?
            .iter()
            .filter_map(|id| {
                let position = baseline.position_of(id);
                if position.is_none() {
                    debug!("Dropping {} from range: not in the current history", id);
                }
                position
            })
            .collect(),
    };

    positions.sort_unstable();
    positions.dedup();

    if positions.is_empty() {
        return Err(ResolveError::EmptyTarget);
    }
    Ok(positions)
}

/// Strictly descending processing order: highest position first.
///
/// A rewrite changes the identifier of the rewritten commit and every
/// descendant but never its ancestors, so lower positions stay resolvable.
pub fn processing_order(ascending: &[usize]) -> Vec<usize> {
    let mut order = ascending.to_vec();
    order.sort_unstable_by(|a, b| b.cmp(a));
    order.dedup();
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GitError;
    use crate::git::history::MockHistory;

    fn id(n: usize) -> String {
        format!("{:040x}", n + 1)
    }

    fn baseline(n: usize) -> BaselineSnapshot {
        BaselineSnapshot::from_ids((0..n).map(id).collect())
    }

    fn unused_history() -> MockHistory {
        let mut history = MockHistory::new();
        history.expect_list_commits().times(0);
        history
    }

    #[test]
    fn test_parse_range_spec() {
        assert_eq!(RangeSpec::parse(None), RangeSpec::All);
        assert_eq!(RangeSpec::parse(Some("  ")), RangeSpec::All);
        assert_eq!(RangeSpec::parse(Some("head")), RangeSpec::Tip);
        assert_eq!(RangeSpec::parse(Some("HEAD")), RangeSpec::Tip);
        assert_eq!(RangeSpec::parse(Some("Head")), RangeSpec::Tip);
        assert_eq!(
            RangeSpec::parse(Some("HEAD~3..HEAD")),
            RangeSpec::Expr("HEAD~3..HEAD".to_string())
        );
    }

    #[test]
    fn test_all_selects_every_position() {
        let positions = resolve_positions(&RangeSpec::All, &baseline(4), &unused_history()).unwrap();
        assert_eq!(positions, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_tip_of_five_commits_is_position_four() {
        let positions = resolve_positions(&RangeSpec::Tip, &baseline(5), &unused_history()).unwrap();
        assert_eq!(positions, vec![4]);
    }

    #[test]
    fn test_empty_history_is_empty_target() {
        for spec in [RangeSpec::All, RangeSpec::Tip] {
            let result = resolve_positions(&spec, &baseline(0), &unused_history());
            assert!(matches!(result, Err(ResolveError::EmptyTarget)));
        }
    }

    #[test]
    fn test_expr_maps_ids_and_drops_unknown() {
        let mut history = MockHistory::new();
        history
            .expect_list_commits()
            .withf(|range| *range == Some("HEAD~3..HEAD"))
            .returning(|_| Ok(vec![id(3), "f".repeat(40), id(1), id(3), id(2)]));

        let spec = RangeSpec::Expr("HEAD~3..HEAD".to_string());
        let positions = resolve_positions(&spec, &baseline(5), &history).unwrap();
        assert_eq!(positions, vec![1, 2, 3]);
    }

    #[test]
    fn test_expr_with_nothing_mappable_is_empty_target() {
        let mut history = MockHistory::new();
        history
            .expect_list_commits()
            .returning(|_| Ok(vec!["e".repeat(40)]));

        let spec = RangeSpec::Expr("other-branch".to_string());
        let result = resolve_positions(&spec, &baseline(3), &history);
        assert!(matches!(result, Err(ResolveError::EmptyTarget)));
    }

    #[test]
    fn test_bad_expr_is_query_error() {
        let mut history = MockHistory::new();
        history.expect_list_commits().returning(|range| {
            Err(GitError::InvalidRange(
                range.unwrap_or_default().to_string(),
                git2::Error::from_str("revspec not found"),
            ))
        });

        let spec = RangeSpec::Expr("nope..".to_string());
        let result = resolve_positions(&spec, &baseline(3), &history);
        assert!(matches!(result, Err(ResolveError::Query(_))));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let mut history = MockHistory::new();
        history
            .expect_list_commits()
            .times(2)
            .returning(|_| Ok(vec![id(0), id(4)]));

        let spec = RangeSpec::Expr("main".to_string());
        let base = baseline(5);
        let first = resolve_positions(&spec, &base, &history).unwrap();
        let second = resolve_positions(&spec, &base, &history).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, vec![0, 4]);
    }

    #[test]
    fn test_processing_order_is_strictly_descending() {
        assert_eq!(processing_order(&[0, 1, 2, 3, 4]), vec![4, 3, 2, 1, 0]);
        assert_eq!(processing_order(&[7]), vec![7]);
        assert_eq!(processing_order(&[3, 1, 3, 2]), vec![3, 2, 1]);

        let order = processing_order(&[2, 9, 4, 11]);
        assert!(order.windows(2).all(|w| w[0] > w[1]));
    }
}
