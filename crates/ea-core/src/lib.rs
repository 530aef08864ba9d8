pub mod codec;
pub mod glyph;
pub mod id;
pub mod model;
pub mod palette;
pub mod store;
pub mod transform;

pub use codec::CodecError;
pub use id::{PaletteId, StickerId};
pub use model::*;
pub use palette::{Palette, PaletteCatalog};
pub use store::{DirStore, KeyValueStore, MemoryStore, StoreError};
pub use transform::{ViewTransform, fit_to_frame, to_document_space, to_pixel_space};

// Re-export kurbo geometry so downstream crates don't need a direct dependency
pub use kurbo::{Point, Size, Vec2};
pub use url::Url;
