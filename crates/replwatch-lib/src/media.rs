//! Seams for the external video collaborators.
//!
//! Frame decoding and media playback are provided by the host. Image sequence
//! widgets pull single frames through [`FrameSource`]; the video widget drives
//! a [`MediaPlayer`]. [`ClockPlayer`] keeps a playback position from the wall
//! clock without decoding anything, which is enough for hosts that only need
//! frame keys.

use crate::value::NdArray;
use anyhow::Result;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Random access to decoded frames of a video file.
pub trait FrameSource {
    fn frame_count(&self) -> usize;
    /// Decode frame `index` as an H x W or H x W x C array.
    fn frame(&mut self, index: usize) -> Result<NdArray>;
}

/// Shared so widgets can open their source lazily on the first tick.
pub type FrameOpener = Rc<dyn Fn(&str) -> Result<Box<dyn FrameSource>>>;

/// Playback of a media file, positions in milliseconds.
pub trait MediaPlayer {
    fn position_ms(&self) -> i64;
    fn set_position_ms(&mut self, position: i64);
    fn duration_ms(&self) -> Option<i64>;
    fn is_playing(&self) -> bool;
    fn play(&mut self);
    fn pause(&mut self);
}

pub type PlayerOpener = Box<dyn Fn(&str) -> Result<Box<dyn MediaPlayer>>>;

/// Player that advances its position with elapsed wall-clock time.
#[derive(Debug, Clone)]
pub struct ClockPlayer {
    base_ms: i64,
    started: Option<Instant>,
    duration_ms: Option<i64>,
}

impl ClockPlayer {
    pub fn new(duration_ms: Option<i64>) -> Self {
        Self {
            base_ms: 0,
            started: None,
            duration_ms,
        }
    }

    pub fn opener() -> PlayerOpener {
        Box::new(|_path| Ok(Box::new(ClockPlayer::new(None)) as Box<dyn MediaPlayer>))
    }

    fn bounded(&self, position: i64) -> i64 {
        let position = position.max(0);
        match self.duration_ms {
            Some(total) => position.min(total),
            None => position,
        }
    }

    fn elapsed_ms(&self) -> i64 {
        self.started
            .map(|start| Instant::now().saturating_duration_since(start))
            .unwrap_or(Duration::ZERO)
            .as_millis() as i64
    }
}

impl MediaPlayer for ClockPlayer {
    fn position_ms(&self) -> i64 {
        self.bounded(self.base_ms + self.elapsed_ms())
    }

    fn set_position_ms(&mut self, position: i64) {
        self.base_ms = self.bounded(position);
        if self.started.is_some() {
            self.started = Some(Instant::now());
        }
    }

    fn duration_ms(&self) -> Option<i64> {
        self.duration_ms
    }

    fn is_playing(&self) -> bool {
        self.started.is_some()
    }

    fn play(&mut self) {
        if self.started.is_none() {
            self.started = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        self.base_ms = self.position_ms();
        self.started = None;
    }
}

/// `HH:MM:SS` rendering of a millisecond position.
pub fn format_clock(ms: i64) -> String {
    let total = ms.max(0) / 1000;
    format!("{:02}:{:02}:{:02}", total / 3600, (total / 60) % 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paused_player_holds_position() {
        let mut player = ClockPlayer::new(Some(10_000));
        player.set_position_ms(2_500);
        assert!(!player.is_playing());
        assert_eq!(player.position_ms(), 2_500);
        player.set_position_ms(50_000);
        assert_eq!(player.position_ms(), 10_000);
        player.set_position_ms(-5);
        assert_eq!(player.position_ms(), 0);
    }

    #[test]
    fn play_then_pause_keeps_progress() {
        let mut player = ClockPlayer::new(None);
        player.set_position_ms(1_000);
        player.play();
        assert!(player.is_playing());
        player.pause();
        assert!(player.position_ms() >= 1_000);
    }

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(0), "00:00:00");
        assert_eq!(format_clock(3_723_000), "01:02:03");
    }
}
