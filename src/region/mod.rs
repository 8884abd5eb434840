mod core;

pub use self::core::{ComponentRenderer, ItemTemplate, RegionView, RenderOutcome};
