//! Zoom segments and the store that keeps them valid.
//!
//! A segment is a time range in which the camera zooms in, either following
//! the cursor or parked on a fixed point. Segments may overlap; which one is
//! active is decided by the store's [`OverlapPolicy`].
//!
//! Every mutation clamps instead of rejecting, so a drag past the timeline
//! edge or a resize below the minimum length lands on the nearest valid
//! geometry. The store never holds a segment that violates:
//!
//! - `0 <= start < end <= total_duration`
//! - `end - start >= MIN_SEGMENT_DURATION`
//! - `zoom_level >= 1`
//! - `manual_x`, `manual_y` in `[0, 100]`

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::OverlapPolicy;
use crate::error::{ZoomReelError, ZoomReelResult};

/// Length of a newly created segment, in seconds.
pub const DEFAULT_SEGMENT_DURATION: f64 = 3.0;
/// Shortest allowed segment, in seconds.
pub const MIN_SEGMENT_DURATION: f64 = 0.5;
/// Zoom level of a newly created segment.
pub const DEFAULT_ZOOM_LEVEL: f64 = 2.0;

/// Tolerance for invariant checks after float arithmetic.
const SPAN_EPSILON: f64 = 1e-9;

/// How the camera is positioned while a segment is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum ZoomMode {
    /// Track the recorded cursor.
    #[default]
    Follow,
    /// Hold a fixed point given by `manual_x` / `manual_y`.
    Manual,
}

/// A time range with a zoom effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ZoomSegment {
    /// Unique identifier (creation timestamp in ms).
    #[ts(type = "number")]
    pub id: u64,
    /// Start time in seconds.
    pub start: f64,
    /// End time in seconds.
    pub end: f64,
    /// Zoom scale (1.0 = no zoom, 2.0 = 2x zoom).
    #[serde(default = "default_zoom_level")]
    pub zoom_level: f64,
    #[serde(default)]
    pub mode: ZoomMode,
    /// Manual centre X, percent of media width.
    #[serde(default = "default_manual_position")]
    pub manual_x: f64,
    /// Manual centre Y, percent of media height.
    #[serde(default = "default_manual_position")]
    pub manual_y: f64,
}

fn default_zoom_level() -> f64 {
    DEFAULT_ZOOM_LEVEL
}

fn default_manual_position() -> f64 {
    50.0
}

impl ZoomSegment {
    /// A segment with default zoom settings.
    pub fn new(id: u64, start: f64, end: f64) -> Self {
        Self {
            id,
            start,
            end,
            zoom_level: DEFAULT_ZOOM_LEVEL,
            mode: ZoomMode::Follow,
            manual_x: default_manual_position(),
            manual_y: default_manual_position(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Inclusive on both ends.
    pub fn contains(&self, time: f64) -> bool {
        self.start <= time && time <= self.end
    }

    /// Whether the segment satisfies every store invariant for a timeline of
    /// `total_duration` seconds (non-finite means unbounded).
    pub fn is_valid(&self, total_duration: f64) -> bool {
        let limit = timeline_limit(total_duration);
        self.start.is_finite()
            && self.end.is_finite()
            && self.start >= 0.0
            && self.end > self.start
            && self.end <= limit + SPAN_EPSILON
            && self.duration() >= MIN_SEGMENT_DURATION - SPAN_EPSILON
            && self.zoom_level >= 1.0
            && (0.0..=100.0).contains(&self.manual_x)
            && (0.0..=100.0).contains(&self.manual_y)
    }

    /// Clamp zoom and manual position into range.
    fn clamp_properties(&mut self) {
        self.zoom_level = if self.zoom_level.is_finite() {
            self.zoom_level.max(1.0)
        } else {
            DEFAULT_ZOOM_LEVEL
        };
        self.manual_x = clamp_percent(self.manual_x, 50.0);
        self.manual_y = clamp_percent(self.manual_y, 50.0);
    }
}

fn clamp_percent(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 100.0)
    } else {
        fallback
    }
}

/// Upper time bound; unknown durations do not clamp.
fn timeline_limit(total_duration: f64) -> f64 {
    if total_duration.is_finite() && total_duration > 0.0 {
        total_duration
    } else {
        f64::INFINITY
    }
}

/// Fit `[start, end]` into the timeline.
///
/// Swaps reversed edges, stretches to the minimum duration, shrinks to the
/// timeline, then slides the span back inside `[0, limit]`. Returns `None`
/// when the inputs are not finite or the timeline is shorter than the minimum.
fn normalize_span(start: f64, end: f64, total_duration: f64) -> Option<(f64, f64)> {
    if !start.is_finite() || !end.is_finite() {
        return None;
    }
    let limit = timeline_limit(total_duration);
    if limit < MIN_SEGMENT_DURATION {
        return None;
    }

    let (start, end) = if end < start { (end, start) } else { (start, end) };
    let duration = (end - start).max(MIN_SEGMENT_DURATION).min(limit);
    let start = start.clamp(0.0, limit - duration);
    let end = (start + duration).min(limit);

    Some((start, end))
}

/// Which edge of a segment a resize moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum SegmentEdge {
    Start,
    End,
}

/// A single editable segment property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", tag = "field", content = "value")]
#[ts(export)]
pub enum SegmentProperty {
    ZoomLevel(f64),
    Mode(ZoomMode),
    ManualX(f64),
    ManualY(f64),
}

/// Ordered list of zoom segments for one recording.
#[derive(Debug, Clone)]
pub struct SegmentStore {
    segments: Vec<ZoomSegment>,
    total_duration: f64,
    policy: OverlapPolicy,
    /// Bumped on every successful mutation.
    revision: u64,
}

impl SegmentStore {
    /// Empty store for a timeline of `total_duration` seconds.
    ///
    /// A non-finite duration leaves segment ends unbounded until
    /// [`SegmentStore::set_total_duration`] supplies a real one.
    pub fn new(total_duration: f64, policy: OverlapPolicy) -> Self {
        Self {
            segments: Vec::new(),
            total_duration,
            policy,
            revision: 0,
        }
    }

    /// Store seeded with previously persisted segments.
    ///
    /// Stored segments are clamped back into the invariants; ones that cannot
    /// be repaired are dropped, and duplicate ids are reassigned.
    pub fn from_segments(
        segments: Vec<ZoomSegment>,
        total_duration: f64,
        policy: OverlapPolicy,
    ) -> Self {
        let mut store = Self::new(total_duration, policy);
        let loaded = segments.len();
        for segment in segments {
            store.insert(segment);
        }
        if store.segments.len() != loaded {
            log::warn!(
                "[SEGMENTS] Dropped {} unrepairable stored segments",
                loaded - store.segments.len()
            );
        }
        store.revision = 0;
        store
    }

    pub fn segments(&self) -> &[ZoomSegment] {
        &self.segments
    }

    pub fn iter(&self) -> impl Iterator<Item = &ZoomSegment> {
        self.segments.iter()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&ZoomSegment> {
        self.segments.iter().find(|s| s.id == id)
    }

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn policy(&self) -> OverlapPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: OverlapPolicy) {
        self.policy = policy;
    }

    /// Mutation counter, for callers that cache derived views.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Update the timeline length and re-clamp every segment.
    ///
    /// Returns true when any segment was clamped or removed.
    pub fn set_total_duration(&mut self, total_duration: f64) -> bool {
        self.total_duration = total_duration;
        let before = self.segments.len();
        let mut clamped = false;
        self.segments.retain_mut(|segment| {
            match normalize_span(segment.start, segment.end, total_duration) {
                Some((start, end)) => {
                    clamped |= start != segment.start || end != segment.end;
                    segment.start = start;
                    segment.end = end;
                    true
                },
                None => false,
            }
        });
        let removed = before - self.segments.len();
        if removed > 0 {
            log::warn!(
                "[SEGMENTS] Timeline of {}s cannot hold {} segments, removed",
                total_duration,
                removed
            );
        }
        self.revision += 1;
        clamped || removed > 0
    }

    /// The segment covering `time`, chosen by the overlap policy.
    pub fn active_at(&self, time: f64) -> Option<&ZoomSegment> {
        if !time.is_finite() {
            return None;
        }
        let mut covering = self.segments.iter().filter(|s| s.contains(time));
        match self.policy {
            OverlapPolicy::FirstMatch => covering.next(),
            OverlapPolicy::LastMatch => covering.last(),
            // Ties keep store order
            OverlapPolicy::LatestStart => covering.fold(None, |best: Option<&ZoomSegment>, s| {
                match best {
                    Some(b) if b.start >= s.start => Some(b),
                    _ => Some(s),
                }
            }),
        }
    }

    /// A fresh id: the current time in ms, bumped above every existing id.
    fn next_id(&self) -> u64 {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        let max_existing = self.segments.iter().map(|s| s.id).max().unwrap_or(0);
        let candidate = now.max(max_existing.saturating_add(1));
        if self.get(candidate).is_none() {
            return candidate;
        }
        // Ids are exhausted at the top; take the lowest free one
        (1..).find(|id| self.get(*id).is_none()).unwrap_or(candidate)
    }

    /// Clamp and append, reassigning the id if it is taken.
    fn insert(&mut self, mut segment: ZoomSegment) -> Option<u64> {
        let (start, end) = normalize_span(segment.start, segment.end, self.total_duration)?;
        segment.start = start;
        segment.end = end;
        segment.clamp_properties();
        if segment.id == 0 || self.get(segment.id).is_some() {
            segment.id = self.next_id();
        }
        self.segments.push(segment);
        Some(segment.id)
    }

    /// Add a segment, clamped into the invariants.
    ///
    /// Returns the id it was stored under, or `None` if the timeline is too
    /// short to hold any segment.
    pub fn add(&mut self, segment: ZoomSegment) -> Option<u64> {
        let id = self.insert(segment);
        match id {
            Some(id) => {
                self.revision += 1;
                log::debug!("[SEGMENTS] Added segment {}", id);
            },
            None => log::warn!(
                "[SEGMENTS] Cannot add segment to a {}s timeline",
                self.total_duration
            ),
        }
        id
    }

    /// Add a default segment starting at `time`.
    pub fn add_at(&mut self, time: f64) -> Option<u64> {
        let start = if time.is_finite() { time } else { 0.0 };
        let id = self.next_id();
        self.add(ZoomSegment::new(id, start, start + DEFAULT_SEGMENT_DURATION))
    }

    pub fn remove(&mut self, id: u64) -> ZoomReelResult<ZoomSegment> {
        let index = self.index_of(id)?;
        let removed = self.segments.remove(index);
        self.revision += 1;
        log::debug!("[SEGMENTS] Removed segment {}", id);
        Ok(removed)
    }

    /// Replace both edges at once, clamped into the invariants.
    pub fn move_or_resize(&mut self, id: u64, new_start: f64, new_end: f64) -> ZoomReelResult<&ZoomSegment> {
        let index = self.index_of(id)?;
        let total = self.total_duration;
        let segment = &mut self.segments[index];
        if let Some((start, end)) = normalize_span(new_start, new_end, total) {
            segment.start = start;
            segment.end = end;
            self.revision += 1;
        }
        Ok(&self.segments[index])
    }

    /// Shift a segment so it starts at `new_start`, keeping its duration.
    pub fn move_to(&mut self, id: u64, new_start: f64) -> ZoomReelResult<&ZoomSegment> {
        let index = self.index_of(id)?;
        if !new_start.is_finite() {
            return Ok(&self.segments[index]);
        }
        let limit = timeline_limit(self.total_duration);
        let segment = &mut self.segments[index];
        let duration = segment.duration();
        segment.start = new_start.clamp(0.0, (limit - duration).max(0.0));
        segment.end = (segment.start + duration).min(limit);
        self.revision += 1;
        Ok(&self.segments[index])
    }

    /// Move one edge to `time`, keeping the minimum duration.
    pub fn resize(&mut self, id: u64, edge: SegmentEdge, time: f64) -> ZoomReelResult<&ZoomSegment> {
        let index = self.index_of(id)?;
        if !time.is_finite() {
            return Ok(&self.segments[index]);
        }
        let limit = timeline_limit(self.total_duration);
        let segment = &mut self.segments[index];
        match edge {
            SegmentEdge::Start => {
                let latest = (segment.end - MIN_SEGMENT_DURATION).max(0.0);
                segment.start = time.clamp(0.0, latest);
            },
            SegmentEdge::End => {
                let earliest = (segment.start + MIN_SEGMENT_DURATION).min(limit);
                segment.end = time.clamp(earliest, limit);
            },
        }
        self.revision += 1;
        Ok(&self.segments[index])
    }

    /// Change one property, clamped into range. Non-finite values are ignored.
    pub fn set_property(&mut self, id: u64, property: SegmentProperty) -> ZoomReelResult<&ZoomSegment> {
        let index = self.index_of(id)?;
        let segment = &mut self.segments[index];
        let applied = match property {
            SegmentProperty::ZoomLevel(level) if level.is_finite() => {
                segment.zoom_level = level.max(1.0);
                true
            },
            SegmentProperty::Mode(mode) => {
                segment.mode = mode;
                true
            },
            SegmentProperty::ManualX(x) if x.is_finite() => {
                segment.manual_x = x.clamp(0.0, 100.0);
                true
            },
            SegmentProperty::ManualY(y) if y.is_finite() => {
                segment.manual_y = y.clamp(0.0, 100.0);
                true
            },
            _ => false,
        };
        if applied {
            self.revision += 1;
        } else {
            log::warn!("[SEGMENTS] Ignoring non-finite {:?} on segment {}", property, id);
        }
        Ok(&self.segments[index])
    }

    fn index_of(&self, id: u64) -> ZoomReelResult<usize> {
        self.segments
            .iter()
            .position(|s| s.id == id)
            .ok_or(ZoomReelError::SegmentNotFound { id })
    }
}
