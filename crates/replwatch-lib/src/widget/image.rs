use super::{TickContext, WidgetKind};
use crate::error::{BindError, BindResult};
use crate::image::{Flip, ImageStyle, RgbaImage};
use crate::namespace::{resolve_array, Namespace};
use crate::session::ImageSpec;
use crate::surface::{Surface, UiEvent};

/// One-shot display of a grey or colour array.
#[derive(Debug)]
pub struct ImageWidget {
    name: String,
    style: ImageStyle,
    image: Option<RgbaImage>,
}

impl ImageWidget {
    pub fn new(spec: ImageSpec) -> BindResult<Self> {
        let style = ImageStyle::new(
            spec.levels,
            spec.colormap.as_deref(),
            None,
            Flip::named(spec.flip.as_deref())?,
        )?;
        Ok(Self {
            name: spec.data,
            style,
            image: None,
        })
    }
}

impl WidgetKind for ImageWidget {
    fn kind(&self) -> &'static str {
        "image"
    }

    fn title(&self) -> String {
        self.name.clone()
    }

    fn load(&mut self, ns: &mut dyn Namespace, _ctx: &TickContext) -> BindResult<()> {
        let data = resolve_array(&*ns, &self.name)?;
        if !matches!(data.rank(), 2 | 3) {
            return Err(BindError::shape(format!(
                "Image {} needs to be 2 or 3 dimensional, got shape {:?}",
                self.name, data.shape
            )));
        }
        self.image = Some(self.style.render(&data, None)?);
        Ok(())
    }

    fn render(&mut self, surface: &mut dyn Surface, _ctx: &TickContext) {
        if let Some(image) = &self.image {
            surface.draw_image(image.clone());
        }
    }

    fn on_event(&mut self, _event: &UiEvent, _ns: &mut dyn Namespace, _ctx: &TickContext) -> BindResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WatchConfig;
    use crate::namespace::MapNamespace;
    use crate::value::{NdArray, Value};

    fn spec(colormap: Option<&str>) -> ImageSpec {
        ImageSpec {
            data: "img".into(),
            levels: None,
            colormap: colormap.map(str::to_string),
            flip: None,
        }
    }

    #[test]
    fn rank_one_data_is_rejected() {
        let config = WatchConfig::default();
        let ctx = TickContext {
            config: &config,
            enabled: true,
        };
        let mut ns = MapNamespace::new().with("img", vec![1.0, 2.0]);
        let mut widget = ImageWidget::new(spec(None)).unwrap();
        assert!(matches!(
            widget.load(&mut ns, &ctx),
            Err(BindError::ShapeMismatch { .. })
        ));

        let grey = NdArray::new(vec![2, 3], vec![0.0; 6]).unwrap();
        ns.set("img", Value::Array(grey));
        widget.load(&mut ns, &ctx).unwrap();
        let image = widget.image.as_ref().unwrap();
        assert_eq!((image.width, image.height), (3, 2));
    }

    #[test]
    fn unknown_flip_fails_at_open() {
        let session = crate::session::Session::parse(
            "[[widget]]\nkind = \"image\"\ndata = \"img\"\nflip = \"diagonal\"\n",
        )
        .unwrap();
        let crate::session::WidgetSpec::Image(image) = session.widgets[0].clone() else {
            panic!("expected an image spec");
        };
        assert!(matches!(ImageWidget::new(image), Err(BindError::Config(_))));

        let flipped = ImageSpec {
            flip: Some("lr".into()),
            ..spec(None)
        };
        assert_eq!(ImageWidget::new(flipped).unwrap().style.flip, Flip::Lr);
    }

    #[test]
    fn unknown_colormap_fails_at_open() {
        assert!(matches!(
            ImageWidget::new(spec(Some("plasma-ish"))),
            Err(BindError::Config(_))
        ));
    }
}
