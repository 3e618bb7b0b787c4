pub mod canvas;
pub mod drawing;
pub mod error;
pub mod extrude;
pub mod geom;
pub mod model;
pub mod notify;
pub mod path;
pub mod profile;
pub mod quote;
pub mod step;
pub mod store;
pub mod validate;
pub mod viewport;

pub use error::{ConfigError, DrawingError, ExtrudeError};
pub use model::{Form, Hole, Material, PartConfig, Point, ViewMode};
pub use store::ConfigStore;
