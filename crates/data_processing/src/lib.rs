pub mod data;
pub mod map;
pub mod transforms;

pub use data::{Data, DataError, DataKind};
pub use map::{MapConfig, MapIter, TransformIterExt};
pub use transforms::{BoxedTransform, CustomTransform, Transform};
