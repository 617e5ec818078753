//! Frame storage and the nearest-neighbor fallback.

use crate::types::{Bitmap, FrameSlot};

#[derive(Debug, Clone)]
pub struct FrameSet {
    slots: Vec<FrameSlot>,
}

impl FrameSet {
    pub fn new(len: usize) -> Self {
        FrameSet {
            slots: vec![FrameSlot::Pending; len],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn set_loaded(&mut self, index: usize, bitmap: Bitmap) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = FrameSlot::Loaded(bitmap);
        }
    }

    pub fn set_failed(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = FrameSlot::Failed;
        }
    }

    /// Mark every slot still pending as failed. Returns how many changed.
    pub fn fail_pending(&mut self) -> usize {
        let mut changed = 0;
        for slot in &mut self.slots {
            if matches!(slot, FrameSlot::Pending) {
                *slot = FrameSlot::Failed;
                changed += 1;
            }
        }
        changed
    }

    pub fn loaded_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, FrameSlot::Loaded(_)))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, FrameSlot::Failed))
            .count()
    }

    /// The bitmap at `index`, or the nearest loaded neighbor.
    ///
    /// Distances grow 1, 2, 3, ... and the earlier neighbor wins ties.
    /// `max_radius` bounds the search; `None` scans the whole set.
    pub fn resolve(&self, index: usize, max_radius: Option<usize>) -> Option<&Bitmap> {
        if self.slots.is_empty() {
            return None;
        }
        let index = index.min(self.slots.len() - 1);
        if let Some(bitmap) = self.slots[index].bitmap() {
            return Some(bitmap);
        }

        let reach = index.max(self.slots.len() - 1 - index);
        let reach = max_radius.map_or(reach, |r| r.min(reach));
        for distance in 1..=reach {
            if let Some(bitmap) = index
                .checked_sub(distance)
                .and_then(|i| self.slots[i].bitmap())
            {
                return Some(bitmap);
            }
            if let Some(bitmap) = self.slots.get(index + distance).and_then(FrameSlot::bitmap) {
                return Some(bitmap);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn bitmap(tag: u8) -> Bitmap {
        Bitmap::new(RgbaImage::from_pixel(2, 2, image::Rgba([tag, 0, 0, 255])))
    }

    fn tag(bitmap: &Bitmap) -> u8 {
        bitmap.pixels().get_pixel(0, 0)[0]
    }

    fn full_set(len: usize) -> FrameSet {
        let mut set = FrameSet::new(len);
        for i in 0..len {
            set.set_loaded(i, bitmap(i as u8));
        }
        set
    }

    #[test]
    fn loaded_frame_resolves_to_itself() {
        let set = full_set(10);
        assert_eq!(tag(set.resolve(7, None).unwrap()), 7);
    }

    #[test]
    fn missing_frame_falls_back_to_nearest_neighbor() {
        let mut set = full_set(240);
        set.set_failed(4);
        let resolved = tag(set.resolve(4, None).unwrap());
        assert!(resolved == 3 || resolved == 5, "got {resolved}");
    }

    #[test]
    fn earlier_neighbor_wins_ties() {
        let mut set = full_set(9);
        set.set_failed(4);
        assert_eq!(tag(set.resolve(4, None).unwrap()), 3);
    }

    #[test]
    fn search_reaches_the_far_end() {
        let mut set = FrameSet::new(240);
        set.set_loaded(239, bitmap(239));
        set.fail_pending();
        assert_eq!(tag(set.resolve(0, None).unwrap()), 239);
        assert_eq!(tag(set.resolve(120, None).unwrap()), 239);
    }

    #[test]
    fn radius_cap_limits_search() {
        let mut set = FrameSet::new(20);
        set.set_loaded(10, bitmap(10));
        assert!(set.resolve(0, Some(5)).is_none());
        assert_eq!(tag(set.resolve(6, Some(5)).unwrap()), 10);
    }

    #[test]
    fn nothing_loaded_resolves_to_none() {
        let mut set = FrameSet::new(5);
        set.fail_pending();
        assert!(set.resolve(2, None).is_none());
        assert!(FrameSet::new(0).resolve(0, None).is_none());
    }

    #[test]
    fn out_of_range_index_is_clamped() {
        let set = full_set(4);
        assert_eq!(tag(set.resolve(99, None).unwrap()), 3);
    }

    #[test]
    fn counts_track_slot_states() {
        let mut set = FrameSet::new(6);
        set.set_loaded(0, bitmap(0));
        set.set_failed(1);
        assert_eq!(set.loaded_count(), 1);
        assert_eq!(set.failed_count(), 1);
        assert_eq!(set.fail_pending(), 4);
        assert_eq!(set.failed_count(), 5);
    }
}
