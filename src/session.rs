//! Editor session: the loaded recording plus everything the user edits.
//!
//! The session reads every stored entry once at load, then owns the cursor
//! track, the segment store, the preview camera and the preferences. Every
//! edit writes the affected entry straight back to the store, except drags:
//! those mutate in memory and persist once when the gesture ends, so the
//! store only ever holds a consistent snapshot.

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use ts_rs::TS;

use crate::config::PlayerConfig;
use crate::error::{ZoomReelError, ZoomReelResult};
use crate::recording::{
    CursorSample, CursorTrack, RecordingMetadata, SegmentEdge, SegmentProperty, SegmentStore,
    ZoomSegment,
};
use crate::rendering::camera::CameraState;
use crate::rendering::coord::{Coord, MediaSpace, Size, TargetSpace};
use crate::rendering::exporter::{export_video, ExportJob, ExportProgress, ExportResult, FrameEncoder};
use crate::rendering::media::MediaSource;
use crate::rendering::renderer::{render_tick, RenderContext, TickOutput};
use crate::storage::{keys, load_metadata, load_video, KeyValueStore};

/// Which part of a segment a drag gesture holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum DragHandle {
    /// The whole segment; moves it.
    Body,
    /// The left edge; resizes.
    Start,
    /// The right edge; resizes.
    End,
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    id: u64,
    handle: DragHandle,
    /// Pointer time minus segment start at grab.
    grab_offset: f64,
    original: ZoomSegment,
}

/// One recording open in the editor.
pub struct EditorSession<S: KeyValueStore> {
    store: S,
    metadata: RecordingMetadata,
    media: Size<MediaSpace>,
    media_duration: Option<f64>,
    track: CursorTrack,
    segments: SegmentStore,
    config: PlayerConfig,
    /// Preview camera; export keeps its own.
    camera: CameraState,
    selected: Option<u64>,
    debug_mode: bool,
    drag: Option<DragState>,
}

impl<S: KeyValueStore> EditorSession<S> {
    /// Load a session from `store` for media of the given size.
    ///
    /// `media_duration` is whatever the media element reports, which may be
    /// unknown or infinite for streamed WebM. Missing entries default;
    /// malformed ones are logged and treated as missing. If stored segments
    /// needed repair, the repaired list is written back.
    pub fn load(
        store: S,
        media_width: u32,
        media_height: u32,
        media_duration: Option<f64>,
    ) -> ZoomReelResult<Self> {
        let metadata = load_metadata(&store);
        let media = Size::<MediaSpace>::from_u32(media_width, media_height);

        let mut config: PlayerConfig = store.load_or_warn(keys::PLAYER_CONFIG).unwrap_or_default();
        config.validate();

        let viewport = metadata.viewport_or_media(media);
        let samples: Vec<CursorSample> = store.load_or_warn(keys::CURSOR_DATA).unwrap_or_default();
        let mut track = CursorTrack::new(samples, Some(viewport));
        if let Some(offset) = store.load_or_warn::<f64>(keys::CURSOR_OFFSET) {
            track.set_offset(offset);
        }

        let total = metadata
            .effective_duration(media_duration)
            .unwrap_or(f64::INFINITY);
        let stored: Vec<ZoomSegment> = store.load_or_warn(keys::ZOOM_SEGMENTS).unwrap_or_default();
        let segments = SegmentStore::from_segments(stored.clone(), total, config.overlap_policy);
        let repaired = segments.segments() != stored.as_slice();

        let debug_mode = store.load_or_warn(keys::DEBUG_MODE).unwrap_or(false);

        log::info!(
            "[SESSION] Loaded recording: {}x{}, duration {}, {} cursor samples, {} segments",
            media_width,
            media_height,
            if total.is_finite() {
                format!("{:.2}s", total)
            } else {
                "unknown".to_string()
            },
            track.len(),
            segments.len()
        );

        let session = Self {
            store,
            metadata,
            media,
            media_duration,
            track,
            segments,
            config,
            camera: CameraState::neutral(media),
            selected: None,
            debug_mode,
            drag: None,
        };

        if repaired {
            log::warn!("[SESSION] Stored segments were repaired, saving");
            session.persist_segments()?;
        }
        Ok(session)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn metadata(&self) -> &RecordingMetadata {
        &self.metadata
    }

    pub fn media_size(&self) -> Size<MediaSpace> {
        self.media
    }

    pub fn track(&self) -> &CursorTrack {
        &self.track
    }

    pub fn segments(&self) -> &SegmentStore {
        &self.segments
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn selected(&self) -> Option<u64> {
        self.selected
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// The recorded video for the host's media element, read on demand since
    /// the blob is the one entry not kept in memory.
    pub fn recorded_video(&self) -> ZoomReelResult<Option<(String, Vec<u8>)>> {
        load_video(&self.store)
    }

    /// Playable duration: capture timestamps first, then the media's value.
    pub fn duration(&self) -> Option<f64> {
        self.metadata.effective_duration(self.media_duration)
    }

    /// Update the media-reported duration once the element knows it.
    ///
    /// Segments that no longer fit are clamped and the list is saved. A drag
    /// in progress ends where it is, since its grab geometry may no longer
    /// fit the timeline.
    pub fn set_media_duration(&mut self, media_duration: Option<f64>) -> ZoomReelResult<()> {
        self.media_duration = media_duration;
        let Some(total) = self.duration() else {
            return Ok(());
        };
        if total == self.segments.total_duration() {
            return Ok(());
        }
        if self.segments.set_total_duration(total) {
            self.drag = None;
            log::info!("[SESSION] Segments clamped to {:.2}s timeline, saving", total);
            self.persist_segments()?;
        }
        Ok(())
    }

    // ========================================================================
    // Rendering
    // ========================================================================

    /// Render inputs for the preview. Editing mode is on while a segment is
    /// selected.
    pub fn render_context(&self) -> RenderContext<'_> {
        RenderContext {
            segments: &self.segments,
            track: &self.track,
            media: self.media,
            tuning: &self.config.camera,
            editing: self.selected.is_some(),
        }
    }

    /// Advance the preview camera to `time`.
    pub fn tick(&mut self, time: f64) -> TickOutput {
        let out = render_tick(time, &self.render_context(), &self.camera);
        self.camera = out.camera;
        out
    }

    /// Return the preview camera to neutral, as on replay.
    pub fn reset_camera(&mut self) {
        self.camera.reset(self.media);
    }

    /// Export the recording with the stored export settings.
    pub async fn export<M, E, P>(
        &self,
        media: &mut M,
        encoder: E,
        cancel: &CancellationToken,
        on_progress: P,
    ) -> ZoomReelResult<ExportResult>
    where
        M: MediaSource,
        E: FrameEncoder + 'static,
        P: FnMut(ExportProgress),
    {
        let job = ExportJob {
            ctx: self.render_context().with_editing(false),
            duration: self.duration(),
            settings: self.config.export,
        };
        export_video(job, media, encoder, cancel, on_progress).await
    }

    // ========================================================================
    // Segment edits
    // ========================================================================

    /// Save the segment list. While a drag is active the dragged segment is
    /// written with its span from before the grab.
    fn persist_segments(&self) -> ZoomReelResult<()> {
        let Some(drag) = self.drag else {
            return self.store.save(keys::ZOOM_SEGMENTS, &self.segments.segments());
        };
        let mut snapshot = self.segments.segments().to_vec();
        if let Some(segment) = snapshot.iter_mut().find(|s| s.id == drag.id) {
            segment.start = drag.original.start;
            segment.end = drag.original.end;
        }
        self.store.save(keys::ZOOM_SEGMENTS, &snapshot)
    }

    /// Add a default segment at the playhead.
    pub fn add_segment_at(&mut self, time: f64) -> ZoomReelResult<Option<u64>> {
        let id = self.segments.add_at(time);
        if id.is_some() {
            self.persist_segments()?;
        }
        Ok(id)
    }

    pub fn add_segment(&mut self, segment: ZoomSegment) -> ZoomReelResult<Option<u64>> {
        let id = self.segments.add(segment);
        if id.is_some() {
            self.persist_segments()?;
        }
        Ok(id)
    }

    pub fn remove_segment(&mut self, id: u64) -> ZoomReelResult<ZoomSegment> {
        let removed = self.segments.remove(id)?;
        if self.selected == Some(id) {
            self.select_segment(None)?;
        }
        if self.drag.is_some_and(|d| d.id == id) {
            self.drag = None;
        }
        self.persist_segments()?;
        Ok(removed)
    }

    pub fn move_segment(&mut self, id: u64, new_start: f64) -> ZoomReelResult<ZoomSegment> {
        let segment = *self.segments.move_to(id, new_start)?;
        self.persist_segments()?;
        Ok(segment)
    }

    pub fn resize_segment(&mut self, id: u64, edge: SegmentEdge, time: f64) -> ZoomReelResult<ZoomSegment> {
        let segment = *self.segments.resize(id, edge, time)?;
        self.persist_segments()?;
        Ok(segment)
    }

    pub fn set_segment_span(&mut self, id: u64, start: f64, end: f64) -> ZoomReelResult<ZoomSegment> {
        let segment = *self.segments.move_or_resize(id, start, end)?;
        self.persist_segments()?;
        Ok(segment)
    }

    pub fn set_segment_property(&mut self, id: u64, property: SegmentProperty) -> ZoomReelResult<ZoomSegment> {
        let segment = *self.segments.set_property(id, property)?;
        self.persist_segments()?;
        Ok(segment)
    }

    /// Select a segment for editing, or clear the selection.
    ///
    /// Either way the preview camera snaps back to neutral so the editor
    /// never shows a stale zoom.
    pub fn select_segment(&mut self, id: Option<u64>) -> ZoomReelResult<()> {
        if let Some(id) = id {
            if self.segments.get(id).is_none() {
                return Err(ZoomReelError::SegmentNotFound { id });
            }
        }
        self.selected = id;
        self.camera.reset(self.media);
        log::debug!("[SESSION] Selected segment {:?}", id);
        Ok(())
    }

    /// Set a segment's manual position from a click on the unzoomed editing
    /// surface.
    pub fn place_manual_pin(
        &mut self,
        id: u64,
        point: Coord<TargetSpace>,
        target: Size<TargetSpace>,
    ) -> ZoomReelResult<ZoomSegment> {
        let (percent_x, percent_y) = point.to_media_space(target, self.media).to_percent(self.media);
        self.segments.set_property(id, SegmentProperty::ManualX(percent_x))?;
        let segment = *self.segments.set_property(id, SegmentProperty::ManualY(percent_y))?;
        self.persist_segments()?;
        Ok(segment)
    }

    // ========================================================================
    // Drag gestures
    // ========================================================================

    /// Start dragging a segment body or edge at `pointer_time`.
    pub fn begin_drag(&mut self, id: u64, handle: DragHandle, pointer_time: f64) -> ZoomReelResult<()> {
        let original = *self
            .segments
            .get(id)
            .ok_or(ZoomReelError::SegmentNotFound { id })?;
        let grab_offset = if pointer_time.is_finite() {
            pointer_time - original.start
        } else {
            0.0
        };
        self.drag = Some(DragState {
            id,
            handle,
            grab_offset,
            original,
        });
        Ok(())
    }

    /// Follow the pointer. Mutates in memory only.
    pub fn update_drag(&mut self, pointer_time: f64) -> ZoomReelResult<Option<ZoomSegment>> {
        let Some(drag) = self.drag else {
            return Ok(None);
        };
        let result = match drag.handle {
            DragHandle::Body => self.segments.move_to(drag.id, pointer_time - drag.grab_offset),
            DragHandle::Start => self.segments.resize(drag.id, SegmentEdge::Start, pointer_time),
            DragHandle::End => self.segments.resize(drag.id, SegmentEdge::End, pointer_time),
        };
        match result {
            Ok(segment) => Ok(Some(*segment)),
            Err(e) => {
                self.drag = None;
                Err(e)
            },
        }
    }

    /// Finish the gesture and persist the result.
    pub fn end_drag(&mut self) -> ZoomReelResult<Option<ZoomSegment>> {
        let Some(drag) = self.drag.take() else {
            return Ok(None);
        };
        self.persist_segments()?;
        Ok(self.segments.get(drag.id).copied())
    }

    /// Abandon the gesture, restoring the segment span as it was at grab.
    /// Property edits made during the gesture are kept.
    pub fn cancel_drag(&mut self) -> ZoomReelResult<()> {
        let Some(drag) = self.drag.take() else {
            return Ok(());
        };
        self.segments
            .move_or_resize(drag.id, drag.original.start, drag.original.end)?;
        self.persist_segments()
    }

    // ========================================================================
    // Preferences and recording
    // ========================================================================

    pub fn set_debug_mode(&mut self, enabled: bool) -> ZoomReelResult<()> {
        self.debug_mode = enabled;
        self.store.save(keys::DEBUG_MODE, &enabled)
    }

    /// Set the cursor time calibration. Non-finite values are ignored.
    pub fn set_cursor_offset(&mut self, offset: f64) -> ZoomReelResult<()> {
        if !offset.is_finite() {
            log::warn!("[SESSION] Ignoring non-finite cursor offset");
            return Ok(());
        }
        self.track.set_offset(offset);
        self.store.save(keys::CURSOR_OFFSET, &offset)
    }

    pub fn set_config(&mut self, mut config: PlayerConfig) -> ZoomReelResult<()> {
        config.validate();
        self.segments.set_policy(config.overlap_policy);
        self.config = config;
        self.store.save(keys::PLAYER_CONFIG, &self.config)
    }

    /// Merge a late-arriving batch of cursor samples.
    pub fn merge_cursor_batch(&mut self, samples: Vec<CursorSample>) {
        self.track.merge(samples);
    }

    /// Delete the recording and everything derived from it.
    pub fn delete_recording(&mut self) -> ZoomReelResult<()> {
        self.store.remove(keys::RECORDING)?;

        self.metadata = RecordingMetadata::default();
        self.media_duration = None;
        self.track = CursorTrack::default();
        self.segments = SegmentStore::new(f64::INFINITY, self.config.overlap_policy);
        self.selected = None;
        self.drag = None;
        self.camera.reset(self.media);

        log::info!("[SESSION] Recording deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{ViewportSize, ZoomMode};
    use crate::storage::{store_recording, MemoryStore};
    use serde_json::json;

    fn recorded_store() -> MemoryStore {
        let store = MemoryStore::new();
        let mut metadata = RecordingMetadata::from_wall_clock(1_700_000_000_000, 1_700_000_010_000);
        metadata.viewport = Some(ViewportSize {
            width: 1000.0,
            height: 600.0,
        });
        store_recording(&store, b"webm", "video/webm", &metadata).unwrap();
        store
            .save(
                keys::CURSOR_DATA,
                &vec![CursorSample::new(1.0, 500.0, 300.0), CursorSample::new(0.0, 0.0, 0.0)],
            )
            .unwrap();
        store
    }

    fn session() -> EditorSession<MemoryStore> {
        EditorSession::load(recorded_store(), 2000, 1200, Some(f64::INFINITY)).unwrap()
    }

    fn stored_segments(session: &EditorSession<MemoryStore>) -> Vec<ZoomSegment> {
        session.store().load(keys::ZOOM_SEGMENTS).unwrap().unwrap_or_default()
    }

    #[test]
    fn test_load_applies_metadata() {
        let session = session();
        assert_eq!(session.duration(), Some(10.0));
        assert_eq!(session.segments().total_duration(), 10.0);
        assert_eq!(session.track().len(), 2);
        assert!(!session.debug_mode());

        // Viewport 1000x600 scaled onto 2000x1200 media
        let p = session.track().interpolate_media(1.0, session.media_size()).unwrap();
        assert_eq!(p.as_tuple(), (1000.0, 600.0));
    }

    #[test]
    fn test_load_from_empty_store() {
        let session = EditorSession::load(MemoryStore::new(), 1280, 720, Some(7.0)).unwrap();
        assert_eq!(session.duration(), Some(7.0));
        assert!(session.segments().is_empty());
        assert_eq!(session.track().viewport().unwrap().width, 1280.0);
    }

    #[test]
    fn test_load_repairs_and_rewrites_segments() {
        let store = recorded_store();
        store
            .set(
                keys::ZOOM_SEGMENTS,
                json!([{"id": 1, "start": 9, "end": 15, "zoomLevel": 0.5}]),
            )
            .unwrap();
        store.set(keys::PLAYER_CONFIG, json!("garbage")).unwrap();

        let session = EditorSession::load(store, 1000, 600, None).unwrap();
        let stored = stored_segments(&session);
        assert_eq!(stored.len(), 1);
        assert_eq!((stored[0].start, stored[0].end), (4.0, 10.0));
        assert_eq!(stored[0].zoom_level, 1.0);
        assert_eq!(session.config(), &PlayerConfig::default());
    }

    #[test]
    fn test_edits_persist_immediately() {
        let mut session = session();
        let id = session.add_segment_at(2.0).unwrap().unwrap();
        assert_eq!(stored_segments(&session).len(), 1);

        session
            .set_segment_property(id, SegmentProperty::ZoomLevel(3.0))
            .unwrap();
        assert_eq!(stored_segments(&session)[0].zoom_level, 3.0);

        session.move_segment(id, 8.0).unwrap();
        assert_eq!(stored_segments(&session)[0].start, 7.0);

        session.remove_segment(id).unwrap();
        assert!(stored_segments(&session).is_empty());
    }

    #[test]
    fn test_drag_persists_only_at_end() {
        let mut session = session();
        let id = session.add_segment_at(2.0).unwrap().unwrap();

        session.begin_drag(id, DragHandle::Body, 3.0).unwrap();
        let moved = session.update_drag(5.0).unwrap().unwrap();
        assert_eq!((moved.start, moved.end), (4.0, 7.0));
        assert_eq!(stored_segments(&session)[0].start, 2.0);

        let done = session.end_drag().unwrap().unwrap();
        assert_eq!(done.start, 4.0);
        assert_eq!(stored_segments(&session)[0].start, 4.0);
        assert!(!session.is_dragging());
    }

    #[test]
    fn test_edge_drag_and_cancel() {
        let mut session = session();
        let id = session.add_segment_at(2.0).unwrap().unwrap();

        session.begin_drag(id, DragHandle::End, 5.0).unwrap();
        let resized = session.update_drag(2.1).unwrap().unwrap();
        assert_eq!(resized.end, 2.5);

        session.cancel_drag().unwrap();
        let segment = session.segments().get(id).unwrap();
        assert_eq!((segment.start, segment.end), (2.0, 5.0));
        assert!(session.update_drag(1.0).unwrap().is_none());
    }

    #[test]
    fn test_selection_resets_camera_and_bypasses_zoom() {
        let mut session = session();
        let id = session.add_segment_at(0.0).unwrap().unwrap();
        for i in 0..20 {
            session.tick(i as f64 / 30.0);
        }
        assert!(session.camera().scale > 1.5);

        session.select_segment(Some(id)).unwrap();
        assert_eq!(session.camera(), &CameraState::neutral(session.media_size()));
        let out = session.tick(1.0);
        assert_eq!(out.camera.scale, 1.0);

        assert!(session.select_segment(Some(999)).is_err());
        session.select_segment(None).unwrap();
        assert!(session.tick(1.0).camera.scale > 1.0);
    }

    #[test]
    fn test_place_manual_pin() {
        let mut session = session();
        let id = session.add_segment_at(0.0).unwrap().unwrap();
        session
            .set_segment_property(id, SegmentProperty::Mode(ZoomMode::Manual))
            .unwrap();

        let target = Size::<TargetSpace>::new(800.0, 480.0);
        let segment = session
            .place_manual_pin(id, Coord::new(200.0, 360.0), target)
            .unwrap();
        assert!((segment.manual_x - 25.0).abs() < 1e-9);
        assert!((segment.manual_y - 75.0).abs() < 1e-9);
        assert!((stored_segments(&session)[0].manual_x - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_preferences_persist() {
        let mut session = session();
        session.set_debug_mode(true).unwrap();
        session.set_cursor_offset(0.3).unwrap();
        session.set_cursor_offset(f64::NAN).unwrap();

        let store = session.store();
        assert_eq!(store.load::<bool>(keys::DEBUG_MODE).unwrap(), Some(true));
        assert_eq!(store.load::<f64>(keys::CURSOR_OFFSET).unwrap(), Some(0.3));
        assert_eq!(session.track().offset(), 0.3);
    }

    #[test]
    fn test_set_config_updates_policy() {
        let mut session = session();
        let mut config = PlayerConfig::default();
        config.overlap_policy = crate::config::OverlapPolicy::LastMatch;
        config.camera.zoom_speed = 9.0;
        session.set_config(config).unwrap();

        assert_eq!(session.segments().policy(), crate::config::OverlapPolicy::LastMatch);
        let stored: PlayerConfig = session.store().load(keys::PLAYER_CONFIG).unwrap().unwrap();
        assert_eq!(stored.camera.zoom_speed, 1.0);
    }

    #[test]
    fn test_delete_recording() {
        let mut session = session();
        session.add_segment_at(1.0).unwrap();
        session.set_debug_mode(true).unwrap();

        assert_eq!(
            session.recorded_video().unwrap(),
            Some(("video/webm".to_string(), b"webm".to_vec()))
        );
        session.delete_recording().unwrap();
        assert_eq!(session.recorded_video().unwrap(), None);

        let store = session.store();
        for key in keys::RECORDING {
            assert!(store.get(key).unwrap().is_none(), "{} still stored", key);
        }
        // Preferences survive
        assert!(store.contains(keys::DEBUG_MODE));
        assert!(session.segments().is_empty());
        assert_eq!(session.duration(), None);
        assert_eq!(session.metadata().describe(), "No recording available");
    }

    #[test]
    fn test_unknown_duration_settles_later() {
        let mut session = EditorSession::load(MemoryStore::new(), 1280, 720, Some(f64::INFINITY)).unwrap();
        let id = session.add_segment_at(20.0).unwrap().unwrap();
        assert_eq!(session.segments().get(id).unwrap().end, 23.0);

        session.set_media_duration(Some(12.0)).unwrap();
        let segment = *session.segments().get(id).unwrap();
        assert_eq!((segment.start, segment.end), (9.0, 12.0));
        assert_eq!(stored_segments(&session), vec![segment]);
    }

    #[test]
    fn test_edit_during_drag_stores_grab_span() {
        let mut session = session();
        let id = session.add_segment(ZoomSegment::new(0, 2.0, 5.0)).unwrap().unwrap();

        session.begin_drag(id, DragHandle::Body, 2.0).unwrap();
        session.update_drag(6.0).unwrap();
        session
            .set_segment_property(id, SegmentProperty::ZoomLevel(3.0))
            .unwrap();
        let stored = stored_segments(&session);
        assert_eq!((stored[0].start, stored[0].end), (2.0, 5.0));
        assert_eq!(stored[0].zoom_level, 3.0);

        session.cancel_drag().unwrap();
        let segment = *session.segments().get(id).unwrap();
        assert_eq!((segment.start, segment.end), (2.0, 5.0));
        assert_eq!(stored_segments(&session), vec![segment]);
    }
}
