pub mod core;
pub mod custom;

pub use core::{Chain, Transform};
pub use custom::{BoxedTransform, CustomTransform};
