//! Greedy first-fit pairing over the matchmaking queue.
use crate::state::QueueEntry;

/// Sorts entries into queue order: `(joined_at, player_id)`.
pub fn queue_order(entries: &mut [QueueEntry]) {
    entries.sort_by(|a, b| {
        a.joined_at
            .cmp(&b.joined_at)
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
}

/// Returns the first pair `(i, j)` with `i < j` that may be matched.
///
/// `entries` must already be in queue order. The scan is first-fit: the
/// earliest entry with any compatible partner is paired with its earliest
/// compatible partner.
pub fn find_pair(entries: &[QueueEntry], tolerance: u32) -> Option<(usize, usize)> {
    entries.iter().enumerate().find_map(|(i, first)| {
        entries[i + 1..]
            .iter()
            .position(|second| first.can_pair_with(second, tolerance))
            .map(|offset| (i, i + 1 + offset))
    })
}

/// Pairs the whole queue as repeated passes would, without touching a store.
///
/// Each pairing removes both entries and restarts the scan.
pub fn pair_all(mut entries: Vec<QueueEntry>, tolerance: u32) -> Vec<(QueueEntry, QueueEntry)> {
    queue_order(&mut entries);
    let mut pairs = Vec::new();
    while let Some((i, j)) = find_pair(&entries, tolerance) {
        let second = entries.remove(j);
        let first = entries.remove(i);
        pairs.push((first, second));
    }
    pairs
}
