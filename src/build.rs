mod builder;
mod document;
mod markdown;
mod paths;
pub mod pipeline;
mod render;
mod source;
mod stylesheet;

pub use builder::{BuildError, BuildResult, Builder};
pub use paths::base_path_from_config;
