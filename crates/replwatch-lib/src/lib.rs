pub mod axis;
pub mod classify;
pub mod config;
pub mod error;
pub mod guard;
pub mod image;
pub mod io;
pub mod media;
pub mod namespace;
pub mod plot;
pub mod range;
pub mod registry;
pub mod session;
pub mod surface;
pub mod transform;
pub mod value;
pub mod widget;

pub use config::WatchConfig;
pub use error::{BindError, BindResult};
pub use namespace::{MapNamespace, Namespace};
pub use registry::{Registry, TickReport};
pub use session::{Session, WidgetSpec};
pub use surface::{Surface, UiEvent, View};
pub use value::{NdArray, Value};
pub use widget::{WidgetId, WidgetState};
