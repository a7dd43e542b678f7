use super::tracker::Tracker;
use super::{TickContext, WidgetKind};
use crate::config::WatchConfig;
use crate::error::{BindError, BindResult};
use crate::image::{Flip, ImageStyle, Lut, RgbaImage};
use crate::media::{FrameOpener, FrameSource};
use crate::namespace::{mismatch, resolve, resolve_array, Namespace};
use crate::session::ImageSequenceSpec;
use crate::surface::{Surface, UiEvent};
use crate::value::{NdArray, Value};
use log::{info, warn};
use std::fmt;
use std::time::Duration;

enum Frames {
    Stack(NdArray),
    Video(Box<dyn FrameSource>),
}

impl Frames {
    fn count(&self) -> usize {
        match self {
            Frames::Stack(stack) => stack.len(),
            Frames::Video(source) => source.frame_count(),
        }
    }
}

impl fmt::Debug for Frames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frames::Stack(stack) => write!(f, "Stack({:?})", stack.shape),
            Frames::Video(source) => write!(f, "Video({} frames)", source.frame_count()),
        }
    }
}

/// Frame-by-frame viewer over an array stack or a decoded video file.
pub struct ImageSequenceWidget {
    spec: ImageSequenceSpec,
    opener: Option<FrameOpener>,
    tracker: Tracker,
    style: ImageStyle,
    frames: Option<Frames>,
    overlay: Option<NdArray>,
    image: Option<RgbaImage>,
    playing: bool,
}

impl fmt::Debug for ImageSequenceWidget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageSequenceWidget")
            .field("spec", &self.spec)
            .field("frames", &self.frames)
            .field("playing", &self.playing)
            .finish()
    }
}

impl ImageSequenceWidget {
    pub fn new(spec: ImageSequenceSpec, opener: Option<FrameOpener>) -> BindResult<Self> {
        let style = ImageStyle::new(
            spec.levels,
            spec.colormap.as_deref(),
            spec.opacity,
            Flip::named(spec.flip.as_deref())?,
        )?;
        Ok(Self {
            tracker: Tracker::new(&spec.tracker),
            spec,
            opener,
            style,
            frames: None,
            overlay: None,
            image: None,
            playing: false,
        })
    }

    fn open_video(&mut self, path: &str) -> BindResult<Frames> {
        let Some(opener) = &self.opener else {
            return Err(BindError::Decoder(
                "You need a video decoder to pass a video file to the image sequence".into(),
            ));
        };
        let source = opener(path)
            .map_err(|err| BindError::Decoder(format!("Could not open video {path}: {err:#}")))?;
        if self.spec.colormap.is_some() {
            info!("Colormap info will not be used on video frames");
            self.style.lut = Lut::gray();
        }
        Ok(Frames::Video(source))
    }

    fn load_frames(&mut self, ns: &dyn Namespace) -> BindResult<()> {
        let base = resolve(ns, &self.spec.base)?;
        let frames = match base {
            Value::Str(path) => {
                let path = path.clone();
                self.open_video(&path)?
            }
            other => {
                let stack = other
                    .to_array()
                    .ok_or_else(|| mismatch(&self.spec.base, "a frame array or a video file name", other))?;
                if !matches!(stack.rank(), 3 | 4) {
                    return Err(BindError::shape(format!(
                        "Images {} need to be 3 or 4 dimensional, got shape {:?}",
                        self.spec.base, stack.shape
                    )));
                }
                Frames::Stack(stack)
            }
        };
        if let Some(name) = &self.spec.overlay {
            let overlay = resolve_array(ns, name)?;
            if overlay.rank() != 3 || overlay.last_dim() != 4 {
                return Err(BindError::shape(
                    "Superimposed image needs transparency so it needs to be an RGBA (4 values in its 3rd dimension) matrix",
                ));
            }
            self.overlay = Some(overlay);
        }
        self.tracker.set_max(frames.count() as i64 - 1);
        self.frames = Some(frames);
        Ok(())
    }

    fn current_frame(&mut self) -> BindResult<Option<NdArray>> {
        let index = self.tracker.current();
        match &mut self.frames {
            None => Ok(None),
            Some(Frames::Stack(stack)) => stack
                .index(index)
                .map(Some)
                .ok_or_else(|| BindError::shape(format!("Images {} have no frame {index}", self.spec.base))),
            Some(Frames::Video(source)) => match source.frame(index) {
                Ok(frame) => Ok(Some(frame)),
                Err(err) => {
                    warn!("Could not retrieve frame {index} from movie: {err:#}");
                    Ok(None)
                }
            },
        }
    }
}

impl WidgetKind for ImageSequenceWidget {
    fn kind(&self) -> &'static str {
        "image_sequence"
    }

    fn title(&self) -> String {
        format!("{}[{}]", self.spec.base, self.spec.tracker)
    }

    fn load(&mut self, ns: &mut dyn Namespace, _ctx: &TickContext) -> BindResult<()> {
        if self.frames.is_none() {
            self.load_frames(&*ns)?;
        }
        self.tracker.load(&*ns)?;
        Ok(())
    }

    fn reconcile(&mut self, ns: &mut dyn Namespace, _ctx: &TickContext) -> BindResult<()> {
        if let Some(frame) = self.current_frame()? {
            self.image = Some(self.style.render(&frame, self.overlay.as_ref())?);
        }
        if self.playing {
            let next = self.tracker.current() as i64 + 1;
            if next <= self.tracker.max() {
                ns.set(self.tracker.name(), Value::Int(next));
            } else {
                self.playing = false;
            }
        }
        Ok(())
    }

    fn render(&mut self, surface: &mut dyn Surface, _ctx: &TickContext) {
        self.tracker.render(surface);
        surface.set_playing(self.playing);
        if let Some(image) = &self.image {
            surface.draw_image(image.clone());
        }
    }

    fn on_event(&mut self, event: &UiEvent, ns: &mut dyn Namespace, _ctx: &TickContext) -> BindResult<()> {
        match event {
            UiEvent::Play => self.playing = true,
            UiEvent::Stop => self.playing = false,
            _ => {
                self.tracker.handle(event, ns)?;
            }
        }
        Ok(())
    }

    fn interval(&self, config: &WatchConfig) -> Duration {
        if self.playing {
            config.playback_interval()
        } else {
            config.tick_interval()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::MapNamespace;
    use crate::surface::View;
    use std::rc::Rc;

    fn spec(base: &str) -> ImageSequenceSpec {
        ImageSequenceSpec {
            tracker: "frame".into(),
            base: base.into(),
            overlay: None,
            levels: Some([0.0, 255.0]),
            colormap: None,
            opacity: None,
            flip: None,
        }
    }

    fn stack(frames: usize) -> NdArray {
        let data = (0..frames * 4).map(|i| (i / 4) as f64 * 10.0).collect();
        NdArray::new(vec![frames, 2, 2], data).unwrap()
    }

    fn tick(widget: &mut ImageSequenceWidget, ns: &mut MapNamespace, view: &mut View) -> BindResult<()> {
        let config = WatchConfig::default();
        let ctx = TickContext {
            config: &config,
            enabled: true,
        };
        widget.load(ns, &ctx)?;
        widget.reconcile(ns, &ctx)?;
        widget.render(view, &ctx);
        Ok(())
    }

    struct Counting(usize);

    impl FrameSource for Counting {
        fn frame_count(&self) -> usize {
            self.0
        }

        fn frame(&mut self, index: usize) -> anyhow::Result<NdArray> {
            anyhow::ensure!(index < self.0, "past the end");
            Ok(NdArray::new(vec![1, 1, 3], vec![index as f64; 3]).unwrap())
        }
    }

    #[test]
    fn playback_advances_and_stops_at_the_end() {
        let mut ns = MapNamespace::new().with("frame", 1).with("frames", stack(3));
        let mut widget = ImageSequenceWidget::new(spec("frames"), None).unwrap();
        let mut view = View::default();
        let config = WatchConfig::default();
        let ctx = TickContext {
            config: &config,
            enabled: true,
        };
        widget.on_event(&UiEvent::Play, &mut ns, &ctx).unwrap();
        assert_eq!(widget.interval(&config), config.playback_interval());

        tick(&mut widget, &mut ns, &mut view).unwrap();
        assert_eq!(ns.get("frame"), Some(&Value::Int(2)));
        tick(&mut widget, &mut ns, &mut view).unwrap();
        assert_eq!(ns.get("frame"), Some(&Value::Int(2)));
        assert!(!widget.playing);
        assert_eq!(view.playing, Some(false));
        assert_eq!(widget.interval(&config), config.tick_interval());
    }

    #[test]
    fn video_needs_a_decoder() {
        let mut ns = MapNamespace::new().with("frame", 0).with("movie", "clip.avi");
        let mut widget = ImageSequenceWidget::new(spec("movie"), None).unwrap();
        let mut view = View::default();
        assert!(matches!(
            tick(&mut widget, &mut ns, &mut view),
            Err(BindError::Decoder(_))
        ));
    }

    #[test]
    fn video_frames_come_from_the_source() {
        let mut ns = MapNamespace::new().with("frame", 4).with("movie", "clip.avi");
        let opener: FrameOpener =
            Rc::new(|_path: &str| Ok::<_, anyhow::Error>(Box::new(Counting(5)) as Box<dyn FrameSource>));
        let mut widget = ImageSequenceWidget::new(spec("movie"), Some(opener)).unwrap();
        let mut view = View::default();
        tick(&mut widget, &mut ns, &mut view).unwrap();
        assert_eq!(view.image.as_ref().and_then(|i| i.pixel(0, 0)), Some([4, 4, 4, 255]));
        assert_eq!(view.slider.map(|s| s.max), Some(4));
    }

    #[test]
    fn overlay_must_be_rgba() {
        let overlay = NdArray::new(vec![2, 2, 3], vec![0.0; 12]).unwrap();
        let mut ns = MapNamespace::new()
            .with("frame", 0)
            .with("frames", stack(2))
            .with("mask", overlay);
        let mut s = spec("frames");
        s.overlay = Some("mask".into());
        let mut widget = ImageSequenceWidget::new(s, None).unwrap();
        let mut view = View::default();
        assert!(matches!(
            tick(&mut widget, &mut ns, &mut view),
            Err(BindError::ShapeMismatch { .. })
        ));
    }
}
