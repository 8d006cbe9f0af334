pub mod bounds;
pub mod cell;
pub mod dispatch;
pub mod error;
pub mod field;
pub mod interp;
pub mod lattice;
pub mod mesh;
pub mod plugin;
pub mod polygonize;
pub mod tables;
pub mod types;

pub use plugin::{MetaballPlugin, MetaballSurface};
pub use polygonize::{Polygonizer, Strategy};
