//! Global pick identifiers.
//!
//! Every pickable element in the scene owns one identifier. Structures reserve
//! contiguous ranges; identifiers are encoded into colors so a pick pass can
//! render them and a readback can map the pixel back to an element. Identifier
//! zero is reserved for the background.

use glam::Vec3;
use std::collections::BTreeMap;
use std::ops::Range;

/// Bits of the identifier carried by each color channel.
pub const BITS_PER_CHANNEL: u32 = 22;

const CHANNEL_MAX: u64 = (1 << BITS_PER_CHANNEL) - 1;

/// Identifier that never belongs to a structure.
pub const BACKGROUND_ID: u64 = 0;

pub fn id_to_color(id: u64) -> Vec3 {
    let low = id & CHANNEL_MAX;
    let mid = (id >> BITS_PER_CHANNEL) & CHANNEL_MAX;
    let high = (id >> (2 * BITS_PER_CHANNEL)) & CHANNEL_MAX;
    Vec3::new(
        (low as f64 / CHANNEL_MAX as f64) as f32,
        (mid as f64 / CHANNEL_MAX as f64) as f32,
        (high as f64 / CHANNEL_MAX as f64) as f32,
    )
}

pub fn color_to_id(color: Vec3) -> u64 {
    let channel = |value: f32| (f64::from(value) * CHANNEL_MAX as f64).round() as u64 & CHANNEL_MAX;
    channel(color.x)
        | (channel(color.y) << BITS_PER_CHANNEL)
        | (channel(color.z) << (2 * BITS_PER_CHANNEL))
}

/// Identity of a structure that holds a pick range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PickOwner {
    pub type_name: &'static str,
    pub name: String,
}

impl PickOwner {
    pub fn new(type_name: &'static str, name: impl Into<String>) -> Self {
        Self {
            type_name,
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickRange {
    pub owner: PickOwner,
    pub start: u64,
    pub count: u64,
}

impl PickRange {
    pub fn ids(&self) -> Range<u64> {
        self.start..self.start + self.count
    }

    pub fn contains(&self, id: u64) -> bool {
        self.ids().contains(&id)
    }

    pub fn local_index(&self, id: u64) -> Option<usize> {
        self.contains(id).then(|| (id - self.start) as usize)
    }
}

/// Hands out disjoint identifier ranges. Allocation is monotonic: a released
/// range is never handed out again for the lifetime of the registry.
#[derive(Debug)]
pub struct PickRegistry {
    next_id: u64,
    ranges: BTreeMap<u64, PickRange>,
}

impl Default for PickRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PickRegistry {
    pub fn new() -> Self {
        Self {
            next_id: BACKGROUND_ID + 1,
            ranges: BTreeMap::new(),
        }
    }

    /// Reserves `count` fresh identifiers for `owner` and returns the first.
    /// Any range the owner already held is released.
    pub fn request_range(&mut self, owner: PickOwner, count: usize) -> u64 {
        if self.release(&owner) {
            log::debug!(
                "[pick] replacing pick range of {} '{}'",
                owner.type_name,
                owner.name
            );
        }

        let start = self.next_id;
        self.next_id += count as u64;
        log::debug!(
            "[pick] {} '{}' owns ids [{}, {})",
            owner.type_name,
            owner.name,
            start,
            self.next_id
        );

        if count > 0 {
            self.ranges.insert(
                start,
                PickRange {
                    owner,
                    start,
                    count: count as u64,
                },
            );
        }
        start
    }

    pub fn release(&mut self, owner: &PickOwner) -> bool {
        let before = self.ranges.len();
        self.ranges.retain(|_, range| &range.owner != owner);
        before != self.ranges.len()
    }

    pub fn range_of(&self, owner: &PickOwner) -> Option<&PickRange> {
        self.ranges.values().find(|range| &range.owner == owner)
    }

    /// Resolves a global identifier to its owner and local element index.
    pub fn lookup(&self, id: u64) -> Option<(&PickOwner, usize)> {
        let (_, range) = self.ranges.range(..=id).next_back()?;
        range.local_index(id).map(|local| (&range.owner, local))
    }

    pub fn lookup_color(&self, color: Vec3) -> Option<(&PickOwner, usize)> {
        self.lookup(color_to_id(color))
    }

    pub fn ranges(&self) -> impl Iterator<Item = &PickRange> {
        self.ranges.values()
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }
}
