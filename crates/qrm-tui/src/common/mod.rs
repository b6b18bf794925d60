mod task;
mod text;

pub use task::*;
pub use text::*;
