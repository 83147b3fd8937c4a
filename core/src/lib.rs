pub mod config;
pub mod error;
pub mod image;
pub mod levels;
pub mod plane;
pub mod point_set;
pub mod runtime;
pub mod stats;

pub use config::*;
pub use error::{Error, Result};
pub use image::*;
pub use levels::LevelSelector;
pub use plane::{Plane, Variant};
pub use point_set::*;
pub use runtime::{current_cpu_threads, init_global_thread_pool};
