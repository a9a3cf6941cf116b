use anyhow::{Context, Result};
use std::marker::PhantomData;
use std::sync::Arc;

/// Defines the core `Transform` trait for composable data processing pipelines.
///
/// The `Transform<I, O>` trait represents an operation converting an owned
/// input of type `I` into an owned output of type `O`. The input is moved
/// into `apply`; the transform never hands it back.
///
/// Transforms take `&self`, so a single instance can be applied any number
/// of times, and from several threads at once (`Send + Sync`).
///
/// Multiple `Transform` steps can be chained together via `.then(...)`.
/// `then()` works only when:
/// 1. **Types align**: `self: Transform<I, O>`, `next: Transform<O, M>`
/// 2. **Owned**: `Self::Sized` (no trait objects, must be concrete)
/// 3. **Thread-safe**: intermediate and output types must be `Send`
pub trait Transform<I, O>: Send + Sync {
    /// Applies the transformation to the input
    fn apply(&self, input: I) -> Result<O>;

    #[inline]
    fn then<T, M>(self, next: T) -> Chain<Self, T, O>
    where
        Self: Sized,
        T: Transform<O, M>,
        O: Send,
        M: Send,
    {
        Chain {
            first: self,
            second: next,
            _marker: PhantomData,
        }
    }
}

impl<I, O, T> Transform<I, O> for Box<T>
where
    T: Transform<I, O> + ?Sized,
{
    fn apply(&self, input: I) -> Result<O> {
        (**self).apply(input)
    }
}

impl<I, O, T> Transform<I, O> for Arc<T>
where
    T: Transform<I, O> + ?Sized,
{
    fn apply(&self, input: I) -> Result<O> {
        (**self).apply(input)
    }
}

/// A chain of two transforms (`A` -> `B`)
/// - `PhantomData<M>` enforces intermediate type alignment.
#[derive(Debug)]
pub struct Chain<A, B, M> {
    first: A,
    second: B,
    _marker: PhantomData<fn() -> M>,
}

impl<A, B, M> Chain<A, B, M> {
    /// Creates a new transform chain.
    /// Use [`Transform::then`] for better ergonomics. `Chain::new` is
    /// useful when the two halves are built separately at run time.
    pub fn new(first: A, second: B) -> Self {
        Self {
            first,
            second,
            _marker: PhantomData,
        }
    }
}

/// Failures are annotated with the chained type names. The underlying error
/// stays reachable through `downcast_ref` / `root_cause`.
impl<I, M, O, A, B> Transform<I, O> for Chain<A, B, M>
where
    A: Transform<I, M>,
    B: Transform<M, O>,
    M: Send,
{
    fn apply(&self, input: I) -> Result<O> {
        self.first
            .apply(input)
            .and_then(|mid| self.second.apply(mid))
            .with_context(|| {
                format!(
                    "Transform chain failed: {} → {} → {}",
                    std::any::type_name::<A>(),
                    std::any::type_name::<B>(),
                    std::any::type_name::<O>()
                )
            })
    }
}
