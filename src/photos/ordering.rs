//! Pure ordering helpers for a listing's photo sequence.
//!
//! Nothing here touches a store. The manager loads the current sequence,
//! splices it with these helpers, and persists whatever [`renumber`]
//! reports as changed.

use rentpv_common::PhotoId;
use rentpv_db::models::Photo;

/// One photo whose `display_order` must be rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderChange {
    pub photo_id: PhotoId,
    pub from: i32,
    pub to: i32,
}

/// Sort photos by `display_order`, keeping the incoming order for ties.
pub fn sort_by_order(photos: &mut [Photo]) {
    photos.sort_by_key(|p| p.display_order);
}

/// Order for a photo appended to `photos`: current maximum plus one, or 1
/// for an empty listing.
pub fn next_display_order(photos: &[Photo]) -> i32 {
    photos
        .iter()
        .map(|p| p.display_order)
        .max()
        .map_or(1, |max| max + 1)
}

/// Move `moved` so it sits immediately before `target`.
///
/// Returns `false` (leaving `photos` untouched) when the two ids are the
/// same or either one is not in the sequence.
pub fn move_before(photos: &mut Vec<Photo>, moved: PhotoId, target: PhotoId) -> bool {
    if moved == target {
        return false;
    }
    let Some(from) = photos.iter().position(|p| p.id == moved) else {
        return false;
    };
    if !photos.iter().any(|p| p.id == target) {
        return false;
    }

    let photo = photos.remove(from);
    // Target index is looked up after removal so forward moves land before it too.
    let to = photos
        .iter()
        .position(|p| p.id == target)
        .unwrap_or(photos.len());
    photos.insert(to, photo);
    true
}

/// Move `id` to the head of the sequence.
///
/// Returns `false` when the photo is absent or already first.
pub fn move_to_front(photos: &mut Vec<Photo>, id: PhotoId) -> bool {
    match photos.iter().position(|p| p.id == id) {
        None | Some(0) => false,
        Some(idx) => {
            let photo = photos.remove(idx);
            photos.insert(0, photo);
            true
        }
    }
}

/// Rewrite `display_order` to `1..=N` following the slice order and return
/// the photos whose value actually changed.
pub fn renumber(photos: &mut [Photo]) -> Vec<OrderChange> {
    let mut changes = Vec::new();
    for (idx, photo) in photos.iter_mut().enumerate() {
        let to = idx as i32 + 1;
        if photo.display_order != to {
            changes.push(OrderChange {
                photo_id: photo.id,
                from: photo.display_order,
                to,
            });
            photo.display_order = to;
        }
    }
    changes
}
