pub mod font;
pub mod frame;
pub mod native;

pub use frame::{build_frame, FrameBuilder, Vertex};
pub use native::Renderer;
