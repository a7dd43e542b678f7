use super::{TickContext, WidgetKind};
use crate::error::{BindError, BindResult};
use crate::media::{format_clock, MediaPlayer, PlayerOpener};
use crate::namespace::{mismatch, resolve, resolve_i64, Namespace};
use crate::session::VideoSpec;
use crate::surface::{LabelSlot, SliderView, Surface, UiEvent};
use crate::value::Value;
use std::fmt;

/// Media player synchronised with a millisecond position variable.
pub struct VideoWidget {
    spec: VideoSpec,
    path: String,
    player: Box<dyn MediaPlayer>,
    position: i64,
    reported: Option<i64>,
}

impl fmt::Debug for VideoWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoWidget")
            .field("spec", &self.spec)
            .field("path", &self.path)
            .field("position", &self.position)
            .finish()
    }
}

impl VideoWidget {
    pub fn open(spec: VideoSpec, ns: &dyn Namespace, opener: &PlayerOpener) -> BindResult<Self> {
        let file = resolve(ns, &spec.file)?;
        let path = file
            .as_str()
            .ok_or_else(|| mismatch(&spec.file, "a file name", file))?
            .to_string();
        let player = opener(&path)
            .map_err(|err| BindError::Decoder(format!("Could not load media {path}: {err:#}")))?;
        Ok(Self {
            spec,
            path,
            player,
            position: 0,
            reported: None,
        })
    }

    fn publish(&mut self, ns: &mut dyn Namespace, position: i64) {
        ns.set(&self.spec.position, Value::Int(position));
        self.reported = Some(position);
    }

    fn seek(&mut self, ns: &mut dyn Namespace, position: i64) {
        self.player.set_position_ms(position);
        self.position = self.player.position_ms();
        self.publish(ns, self.position);
    }
}

impl WidgetKind for VideoWidget {
    fn kind(&self) -> &'static str {
        "video"
    }

    fn title(&self) -> String {
        self.path.clone()
    }

    fn load(&mut self, ns: &mut dyn Namespace, _ctx: &TickContext) -> BindResult<()> {
        if self.player.is_playing() {
            let position = self.player.position_ms();
            if self.reported != Some(position) {
                self.publish(ns, position);
            }
            self.position = position;
            if self.player.duration_ms().is_some_and(|total| position >= total) {
                self.player.pause();
            }
        } else {
            let position = resolve_i64(&*ns, &self.spec.position)?;
            if position != self.player.position_ms() {
                self.player.set_position_ms(position);
            }
            self.position = self.player.position_ms();
        }
        Ok(())
    }

    fn render(&mut self, surface: &mut dyn Surface, _ctx: &TickContext) {
        let total = self.player.duration_ms();
        surface.set_slider(SliderView {
            value: self.position,
            min: 0,
            max: total.unwrap_or(self.position).max(1),
        });
        surface.set_label(LabelSlot::Elapsed, format_clock(self.position));
        surface.set_label(
            LabelSlot::Total,
            total.map(format_clock).unwrap_or_else(|| "--:--:--".to_string()),
        );
        surface.set_label(LabelSlot::Frame, self.position.to_string());
        surface.set_playing(self.player.is_playing());
    }

    fn on_event(&mut self, event: &UiEvent, ns: &mut dyn Namespace, _ctx: &TickContext) -> BindResult<()> {
        match event {
            UiEvent::Play => self.player.play(),
            UiEvent::Stop => {
                self.player.pause();
                let position = self.player.position_ms();
                self.position = position;
                self.publish(ns, position);
            }
            UiEvent::SliderMoved { value } => {
                self.player.pause();
                self.seek(ns, *value);
            }
            UiEvent::Seek { delta_ms } => {
                let target = self.player.position_ms() + delta_ms;
                self.seek(ns, target);
            }
            _ => {}
        }
        Ok(())
    }
}
