//! Pending render jobs, one queue per pass.
//!
//! A queue holds at most one job per tile. Pushing a second job for a tile
//! that is already queued merges it into the existing job: the rectangles are
//! unioned and `new_data` is OR'ed. The job keeps its original position, so
//! tiles drain in the order they were first damaged.

use std::collections::{HashMap, VecDeque};

use serde::Serialize;

use crate::geometry::Rect;
use crate::tile::{Pass, TileCoord};

/// Work against one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderJob {
    pub coord: TileCoord,

    /// Damaged sub-rectangle in tile-local logical pixels
    pub rect: Rect,

    /// Source pixels changed, not just geometry
    pub new_data: bool,
}

impl RenderJob {
    pub fn new(coord: TileCoord, rect: Rect, new_data: bool) -> Self {
        Self {
            coord,
            rect,
            new_data,
        }
    }

    /// Fold `other` (for the same tile) into this job.
    pub fn merge(&mut self, other: &RenderJob) {
        debug_assert_eq!(self.coord, other.coord);
        self.rect = self.rect.union(&other.rect);
        self.new_data |= other.new_data;
    }
}

/// Ordered set of jobs for one pass.
#[derive(Debug, Clone)]
pub struct RenderQueue {
    pass: Pass,
    order: VecDeque<TileCoord>,
    jobs: HashMap<TileCoord, RenderJob>,
}

impl RenderQueue {
    pub fn new(pass: Pass) -> Self {
        Self {
            pass,
            order: VecDeque::new(),
            jobs: HashMap::new(),
        }
    }

    pub fn pass(&self) -> Pass {
        self.pass
    }

    /// Queue `job`, merging with a pending job for the same tile.
    ///
    /// Returns `true` when the tile was not queued before.
    pub fn push(&mut self, job: RenderJob) -> bool {
        match self.jobs.get_mut(&job.coord) {
            Some(existing) => {
                existing.merge(&job);
                false
            }
            None => {
                self.order.push_back(job.coord);
                self.jobs.insert(job.coord, job);
                true
            }
        }
    }

    /// The job that will be drained next.
    pub fn front(&self) -> Option<&RenderJob> {
        self.order.front().and_then(|coord| self.jobs.get(coord))
    }

    pub fn pop_front(&mut self) -> Option<RenderJob> {
        let coord = self.order.pop_front()?;
        self.jobs.remove(&coord)
    }

    pub fn get(&self, coord: TileCoord) -> Option<&RenderJob> {
        self.jobs.get(&coord)
    }

    pub fn contains(&self, coord: TileCoord) -> bool {
        self.jobs.contains_key(&coord)
    }

    /// Jobs in drain order.
    pub fn iter(&self) -> impl Iterator<Item = &RenderJob> {
        self.order.iter().filter_map(|coord| self.jobs.get(coord))
    }

    /// Total damaged area of all queued jobs, in logical pixels.
    pub fn queued_area(&self) -> i64 {
        self.jobs.values().map(|job| job.rect.area()).sum()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drop every job, returning the tiles that were queued.
    pub fn clear(&mut self) -> Vec<TileCoord> {
        self.jobs.clear();
        self.order.drain(..).collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
