use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Shared pool of undrawn letters: letter -> remaining count.
///
/// A letter whose count reaches zero is removed from the map, so `is_empty()`
/// means the bag is exhausted.
///
/// Draws pick uniformly among the *distinct* letters still present, not in
/// proportion to their counts. Rare letters therefore come up more often than
/// their share of the bag would suggest. Existing games depend on this, so it
/// is kept as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileBag {
    counts: BTreeMap<char, u32>,
}

impl TileBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_counts(counts: impl IntoIterator<Item = (char, u32)>) -> Self {
        Self {
            counts: counts.into_iter().filter(|(_, count)| *count > 0).collect(),
        }
    }

    pub fn total(&self) -> usize {
        self.counts.values().map(|count| *count as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn count(&self, letter: char) -> u32 {
        self.counts.get(&letter).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &BTreeMap<char, u32> {
        &self.counts
    }

    fn draw_one<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<char> {
        if self.counts.is_empty() {
            return None;
        }
        let pick = rng.gen_range(0..self.counts.len());
        let letter = *self.counts.keys().nth(pick)?;
        if let Some(count) = self.counts.get_mut(&letter) {
            *count -= 1;
            if *count == 0 {
                self.counts.remove(&letter);
            }
        }
        Some(letter)
    }

    /// Remove up to `n` letters. Returns fewer only when the bag runs out.
    pub fn draw<R: Rng + ?Sized>(&mut self, n: usize, rng: &mut R) -> Vec<char> {
        let mut drawn = Vec::with_capacity(n);
        while drawn.len() < n {
            match self.draw_one(rng) {
                Some(letter) => drawn.push(letter),
                None => break,
            }
        }
        drawn
    }

    pub fn put_back(&mut self, letters: &[char]) {
        for letter in letters {
            *self.counts.entry(*letter).or_insert(0) += 1;
        }
    }

    /// Replace the rack slots at `indices` with fresh letters.
    ///
    /// The slots are not returned to the bag. If the bag holds fewer letters
    /// than there are slots, the first slots (in the order given) are filled
    /// and the rest are dropped, so the rack shrinks. Indices out of range are
    /// ignored.
    pub fn refill<R: Rng + ?Sized>(
        &mut self,
        rack: &[char],
        indices: &[usize],
        rng: &mut R,
    ) -> Vec<char> {
        let mut slots: Vec<Option<char>> = rack.iter().copied().map(Some).collect();
        for index in indices {
            if let Some(slot) = slots.get_mut(*index) {
                *slot = self.draw_one(rng);
            }
        }
        slots.into_iter().flatten().collect()
    }

    /// Deal up to `rack_size` letters to each player, in order.
    pub fn distribute<R: Rng + ?Sized>(
        &mut self,
        players: &[Uuid],
        rack_size: usize,
        rng: &mut R,
    ) -> BTreeMap<Uuid, Vec<char>> {
        players
            .iter()
            .map(|player| (*player, self.draw(rack_size, rng)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn bag() -> TileBag {
        TileBag::from_counts([('A', 3), ('B', 1), ('C', 2)])
    }

    #[test]
    fn test_draw_removes_exhausted_keys() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut bag = bag();
        let drawn = bag.draw(6, &mut rng);

        assert_eq!(drawn.len(), 6);
        assert!(bag.is_empty());
        assert_eq!(bag.counts().len(), 0);
    }

    #[test]
    fn test_draw_stops_when_bag_runs_out() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut bag = bag();
        let drawn = bag.draw(10, &mut rng);
        assert_eq!(drawn.len(), 6);
        assert_eq!(bag.total(), 0);
    }

    #[test]
    fn test_draw_then_put_back_is_a_no_op() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut bag = TileBag::from_counts([('E', 12), ('Q', 1), ('Z', 1)]);
        let before = bag.clone();

        let drawn = bag.draw(5, &mut rng);
        assert_eq!(bag.total(), before.total() - 5);
        bag.put_back(&drawn);

        assert_eq!(bag, before);
    }

    #[test]
    fn test_draw_is_uniform_over_keys() {
        // With one 'Q' against 50 'E', a count-weighted draw would almost never
        // pick 'Q' first. Uniform-over-keys picks it about half the time.
        let mut q_first = 0;
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut bag = TileBag::from_counts([('E', 50), ('Q', 1)]);
            if bag.draw(1, &mut rng) == vec!['Q'] {
                q_first += 1;
            }
        }
        assert!(q_first > 50, "Q drawn first only {} times", q_first);
    }

    #[test]
    fn test_refill_replaces_only_given_indices() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut bag = TileBag::from_counts([('Z', 5)]);
        let rack = vec!['A', 'B', 'C', 'D'];

        let refilled = bag.refill(&rack, &[1, 3], &mut rng);

        assert_eq!(refilled, vec!['A', 'Z', 'C', 'Z']);
        assert_eq!(bag.total(), 3);
    }

    #[test]
    fn test_refill_drops_unfillable_slots() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut bag = TileBag::from_counts([('Z', 1)]);
        let rack = vec!['A', 'B', 'C', 'D'];

        let refilled = bag.refill(&rack, &[2, 0, 3], &mut rng);

        // first requested slot (2) is filled, slots 0 and 3 are dropped
        assert_eq!(refilled, vec!['B', 'Z']);
        assert!(bag.is_empty());
    }

    #[test]
    fn test_distribute_conserves_tiles() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut bag = TileBag::from_counts([('A', 9), ('E', 12), ('S', 4)]);
        let players = vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];

        let racks = bag.distribute(&players, 7, &mut rng);

        assert_eq!(racks.len(), 3);
        assert!(racks.values().all(|rack| rack.len() == 7));
        let dealt: usize = racks.values().map(Vec::len).sum();
        assert_eq!(dealt + bag.total(), 25);
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let bag = TileBag::from_counts([('A', 2), ('B', 0)]);
        let json = serde_json::to_string(&bag).unwrap();
        assert_eq!(json, r#"{"A":2}"#);
        let back: TileBag = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bag);
    }
}
