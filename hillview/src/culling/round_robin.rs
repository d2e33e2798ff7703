//! Round-robin selection across groups.
//!
//! Both culling stages reduce to the same problem: given candidates grouped
//! by some fairness key (a compass sector or a grid cell), pick up to `cap`
//! of them so that every group contributes one before any group contributes
//! a second.

use tokio_util::sync::CancellationToken;

use super::error::CullError;

/// Select up to `cap` items, one per group per round.
///
/// Round `r` scans the active groups left to right and takes each group's
/// `r`-th item. A group with no item at index `r` is retired by swapping the
/// last active group into its slot; the scan index does not advance, so the
/// swapped-in group is examined next. Selection stops as soon as `cap` items
/// have been taken or no groups remain.
///
/// Empty groups are dropped up front. The token is checked once per round.
pub fn round_robin<T>(
    groups: Vec<Vec<T>>,
    cap: usize,
    cancel: &CancellationToken,
) -> Result<Vec<T>, CullError> {
    let total: usize = groups.iter().map(Vec::len).sum();
    let mut selected = Vec::with_capacity(cap.min(total));
    if cap == 0 {
        return Ok(selected);
    }

    // Each group is visited exactly once per round, so pulling from an
    // iterator yields exactly the item at index `r`.
    let mut active: Vec<std::vec::IntoIter<T>> = groups
        .into_iter()
        .filter(|g| !g.is_empty())
        .map(Vec::into_iter)
        .collect();

    while !active.is_empty() {
        if cancel.is_cancelled() {
            return Err(CullError::Cancelled);
        }

        let mut i = 0;
        while i < active.len() {
            match active[i].next() {
                Some(item) => {
                    selected.push(item);
                    if selected.len() >= cap {
                        return Ok(selected);
                    }
                    i += 1;
                }
                None => {
                    active.swap_remove(i);
                }
            }
        }
    }

    Ok(selected)
}
