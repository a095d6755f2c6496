//! One viewer session: a list of files, the view of the current one, and its
//! playback transport.
//!
//! Knows nothing about the terminal. The command handler feeds it layout
//! changes, ticks and [`ViewerCommand`]s and paints whatever it reports.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::config::WavescopeConfig;
use crate::loader::{LoadResult, Loader};
use crate::playback::{ExternalPlayer, PlaybackClock};
use crate::waveform::position::millis_from_frames;
use crate::waveform::DrawPrimitive;

use super::state::{Delivery, WaveformView};
use super::ui::{LoadStatus, StatusLine, ViewerCommand};

pub struct ViewerSession {
    files: Vec<PathBuf>,
    index: usize,
    loader: Loader,
    view: WaveformView,
    clock: PlaybackClock,
    player: ExternalPlayer,
    load_error: Option<String>,
    seek_step_secs: f64,
    autoplay: bool,
}

impl ViewerSession {
    pub fn new(files: Vec<PathBuf>, config: &WavescopeConfig, player: ExternalPlayer) -> Self {
        Self {
            files,
            index: 0,
            loader: Loader::new(config.decode.normalization),
            view: WaveformView::new(config.display.zoom, config.display.max_zoom),
            clock: PlaybackClock::idle(),
            player,
            load_error: None,
            seek_step_secs: config.playback.seek_step_secs,
            autoplay: config.playback.autoplay,
        }
    }

    /// Updates the canvas size in envelope pixels.
    pub fn resize(&mut self, pixel_width: u32, pixel_height: u32) {
        if (pixel_width, pixel_height) != (self.view.pixel_width(), self.view.pixel_height()) {
            tracing::debug!("Canvas resized to {}x{} pixels", pixel_width, pixel_height);
            self.view.resize(pixel_width, pixel_height);
        }
    }

    /// Starts loading the file at the current index.
    ///
    /// Stops playback; the previous waveform stays visible until the new one
    /// arrives. Must be called from within a tokio runtime.
    pub fn open_current(&mut self) {
        let Some(path) = self.files.get(self.index).cloned() else {
            return;
        };

        if self.loader.is_loading() {
            tracing::debug!("Superseding the load in flight");
        }
        self.player.stop();
        self.clock.pause_at(Instant::now());
        self.load_error = None;

        let generation = self
            .loader
            .load(path, self.view.pixel_width() as usize, self.view.zoom());
        self.view.begin_load(generation);
    }

    /// Picks up a finished load, if any.
    pub fn poll_load(&mut self) {
        if let Some(result) = self.loader.try_recv() {
            self.handle_load_result(result);
        }
    }

    fn handle_load_result(&mut self, result: LoadResult) -> Delivery {
        let delivery = self.view.deliver(result);

        match &delivery {
            Delivery::Applied => {
                if let Some(shown) = self.view.shown() {
                    if shown.buffer.is_empty() {
                        tracing::warn!("{} contains no audio", shown.path.display());
                    }
                    self.clock = PlaybackClock::new(
                        shown.generation,
                        shown.buffer.sample_rate(),
                        shown.buffer.frame_count() as u64,
                    );
                }
                self.view.duration_changed(self.clock.duration_update());
                if self.autoplay {
                    let now = Instant::now();
                    self.clock.play_at(now);
                    self.sync_player(now);
                }
            }
            Delivery::Stale => {}
            Delivery::Failed(message) => {
                tracing::error!("Load failed: {}", message);
                self.load_error = Some(message.clone());
            }
        }

        delivery
    }

    /// Advances the cursor to the clock position at `now`.
    pub fn tick(&mut self, now: Instant) {
        if self.clock.is_playing() && self.clock.is_finished_at(now) {
            tracing::debug!("Playback reached the end");
            self.clock.settle_at(now);
            self.player.stop();
        }
        self.view.position_changed(self.clock.position_update_at(now));
    }

    /// Applies a user command. Returns false when the viewer should exit.
    pub fn apply(&mut self, command: ViewerCommand, now: Instant) -> bool {
        match command {
            ViewerCommand::Continue => {}
            ViewerCommand::Quit => return false,
            ViewerCommand::TogglePlay => {
                self.clock.toggle_at(now);
                self.sync_player(now);
            }
            ViewerCommand::SeekBackward => self.seek_by(-self.seek_step_secs, now),
            ViewerCommand::SeekForward => self.seek_by(self.seek_step_secs, now),
            ViewerCommand::SeekToPixel(x) => {
                let frames = self.view.seek_to_pixel(x);
                self.clock.seek_at(frames, now);
                self.sync_player(now);
            }
            ViewerCommand::Home => {
                self.clock.seek_at(0, now);
                self.sync_player(now);
            }
            ViewerCommand::ZoomIn => self.view.zoom_in(),
            ViewerCommand::ZoomOut => self.view.zoom_out(),
            ViewerCommand::NextFile => self.step_file(1),
            ViewerCommand::PrevFile => self.step_file(self.files.len().saturating_sub(1)),
        }

        self.view.position_changed(self.clock.position_update_at(now));
        true
    }

    fn seek_by(&mut self, delta_secs: f64, now: Instant) {
        self.clock.seek_by_at(delta_secs, now);
        self.sync_player(now);
    }

    fn step_file(&mut self, offset: usize) {
        if self.files.len() < 2 {
            return;
        }
        self.index = (self.index + offset) % self.files.len();
        self.open_current();
    }

    /// Starts or stops the external player to match the clock.
    fn sync_player(&mut self, now: Instant) {
        if !self.clock.is_playing() {
            self.player.stop();
            return;
        }
        let Some(path) = self.view.shown().map(|shown| shown.path.clone()) else {
            return;
        };
        if let Err(e) = self.player.start(&path, self.clock.elapsed_at(now)) {
            tracing::warn!("{}", e);
        }
    }

    pub fn primitives(&mut self) -> Vec<DrawPrimitive> {
        self.view.primitives()
    }

    pub fn view(&self) -> &WaveformView {
        &self.view
    }

    /// Header and footer contents.
    pub fn status(&self) -> StatusLine<'_> {
        let file_name = self
            .files
            .get(self.index)
            .and_then(|path| path.file_name())
            .and_then(|name| name.to_str())
            .unwrap_or("?");

        let load = match &self.load_error {
            Some(message) => LoadStatus::Failed(message),
            None if self.view.is_loading() => LoadStatus::Loading,
            None => LoadStatus::Ready,
        };

        StatusLine {
            file_name,
            index: self.index,
            count: self.files.len(),
            load,
            position: self.shown_position(),
            duration: self.clock.duration(),
            zoom: self.view.zoom(),
            playing: self.clock.is_playing(),
            audible: self.player.is_available(),
        }
    }

    /// Cursor position of the shown buffer as time.
    fn shown_position(&self) -> Duration {
        let sample_rate = self.view.shown().map_or(0, |shown| shown.buffer.sample_rate());
        Duration::from_millis(millis_from_frames(self.view.position_frames(), sample_rate))
    }
}
