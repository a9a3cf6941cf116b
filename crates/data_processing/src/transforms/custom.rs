use crate::transforms::Transform;
use std::fmt;

/// ===========================================================================
/// Applies a caller-supplied function to each value passing through a pipeline.
///
/// `CustomTransform` binds one function `Fn(D) -> Result<D, E>` at
/// construction and exposes it through [`process`](Self::process). It is the
/// seam that lets arbitrary user code run as a pipeline stage without the
/// pipeline knowing anything about it.
///
/// - The function is owned by the stage and can't be swapped or borrowed out.
/// - Every call moves the input into the function and moves its result out.
/// - Errors come back exactly as the function returned them.
/// - The stage holds no state of its own. It can be shared across threads
///   whenever `F` is `Sync`.
///
/// # Example
/// ```
/// use data_processing::{transforms::CustomTransform, Data, DataError};
///
/// let double = CustomTransform::new(|d: Data| -> Result<Data, DataError> {
///     Ok(Data::Int(d.as_int()? * 2))
/// });
/// assert_eq!(double.process(Data::Int(21)), Ok(Data::Int(42)));
/// ```
pub struct CustomTransform<F> {
    f: F,
}

/// A stage whose function is chosen at run time, e.g. when a pipeline
/// holds a list of heterogeneous stages.
pub type BoxedTransform<D> =
    CustomTransform<Box<dyn Fn(D) -> anyhow::Result<D> + Send + Sync>>;

impl<F> CustomTransform<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Invokes the bound function exactly once with `value`.
    #[inline]
    pub fn process<D, E>(&self, value: D) -> Result<D, E>
    where
        F: Fn(D) -> Result<D, E>,
    {
        (self.f)(value)
    }
}

impl<D> BoxedTransform<D> {
    pub fn boxed<F>(f: F) -> Self
    where
        F: Fn(D) -> anyhow::Result<D> + Send + Sync + 'static,
    {
        Self::new(Box::new(f))
    }
}

impl<F> fmt::Debug for CustomTransform<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomTransform")
            .field("fn", &std::any::type_name::<F>())
            .finish()
    }
}

/// Errors are converted with `Into<anyhow::Error>` only. A typed error keeps
/// its message and can be recovered with `downcast_ref::<E>()`; an
/// `anyhow::Error` is returned as the same value.
impl<D, E, F> Transform<D, D> for CustomTransform<F>
where
    F: Fn(D) -> Result<D, E> + Send + Sync,
    E: Into<anyhow::Error>,
{
    fn apply(&self, input: D) -> anyhow::Result<D> {
        self.process(input).map_err(Into::into)
    }
}
