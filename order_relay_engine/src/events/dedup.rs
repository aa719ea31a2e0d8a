/// How many delivery ids the worker remembers by default.
pub const DEFAULT_DEDUP_CAPACITY: usize = 256;

/// A fixed-size ring of recently seen webhook delivery ids.
///
/// Shopify retries deliveries that it thinks were lost, so the same `X-Shopify-Webhook-Id` can arrive more than
/// once. The worker records each id here and skips envelopes whose id is still in the window. Inserts are O(1) and
/// overwrite the oldest entry once the ring is full. Lookups scan the whole ring, which is fine at the capacities
/// this runs at. Deliveries without an id (empty string) are never tracked and never match.
#[derive(Debug, Clone)]
pub struct RecentEventIds {
    slots: Box<[String]>,
    cursor: usize,
}

impl RecentEventIds {
    /// Creates a ring that remembers the last `capacity` ids. The capacity is rounded up to the next power of two
    /// so the cursor can wrap with a mask.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.next_power_of_two().max(1);
        Self { slots: vec![String::new(); capacity].into_boxed_slice(), cursor: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Records `id` as seen, evicting the oldest entry when the ring is full. Empty ids are ignored.
    pub fn add(&mut self, id: &str) {
        if id.is_empty() {
            return;
        }
        self.slots[self.cursor] = id.to_string();
        self.cursor = (self.cursor + 1) & (self.slots.len() - 1);
    }

    /// Whether `id` is still inside the window of remembered deliveries.
    pub fn contains(&self, id: &str) -> bool {
        !id.is_empty() && self.slots.iter().any(|slot| slot == id)
    }
}

impl Default for RecentEventIds {
    fn default() -> Self {
        Self::new(DEFAULT_DEDUP_CAPACITY)
    }
}
