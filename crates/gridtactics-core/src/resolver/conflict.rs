//! Destination conflict detection and arbitration.

use std::collections::BTreeMap;

use gridmap::GridCoord;
use tracing::{debug, trace};

use super::{Conflict, ConflictKind};
use crate::request::DisplacementRequest;

/// Groups planned requests by destination and returns every group of two or
/// more.
///
/// Unplanned and cancelled requests have no destination and never conflict.
/// A request that ends on the origin cell is an ordinary destination.
#[must_use]
pub fn detect_end_point_conflicts(requests: &[DisplacementRequest]) -> Vec<Conflict> {
    let mut by_cell: BTreeMap<GridCoord, Vec<usize>> = BTreeMap::new();
    for (index, request) in requests.iter().enumerate() {
        if let Some(cell) = request.destination() {
            by_cell.entry(cell).or_default().push(index);
        }
    }

    by_cell
        .into_iter()
        .filter(|(_, involved)| involved.len() > 1)
        .map(|(cell, involved)| {
            trace!(%cell, count = involved.len(), "destination conflict");
            Conflict {
                kind: ConflictKind::SameDestination,
                cell,
                involved,
            }
        })
        .collect()
}

/// Keeps the highest-priority request of `conflict` and cancels the others.
///
/// The sort is stable over ascending indices, so among equal priorities the
/// earliest submitted request wins. Returns the winner's index, or `None` for
/// an empty group. A group of one is left untouched.
pub fn resolve_single_conflict(
    requests: &mut [DisplacementRequest],
    conflict: &Conflict,
) -> Option<usize> {
    let mut ranked: Vec<usize> = conflict
        .involved
        .iter()
        .copied()
        .filter(|&index| index < requests.len())
        .collect();
    ranked.sort_by_key(|&index| std::cmp::Reverse(requests[index].priority));

    let (&winner, losers) = ranked.split_first()?;
    for &loser in losers {
        requests[loser].cancel();
        debug!(
            cell = %conflict.cell,
            winner = %requests[winner].requester,
            loser = %requests[loser].requester,
            "request cancelled by conflict"
        );
    }
    Some(winner)
}
