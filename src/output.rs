//! # Deferred Outputs
//!
//! `Output<T>` is a value that becomes known once the resources it was read
//! from have been realized. It records which resources it depends on and
//! whether it carries secret material; both propagate through every
//! combinator so the stack can order realization by data dependencies and
//! never print or persist secrets.
//!
//! Outputs are lazy and shared: declaring one never blocks, and awaiting a
//! clone drives the same underlying computation exactly once.

use crate::error::DeployError;
use crate::stack::Urn;
use futures::future::{self, BoxFuture, FutureExt, Shared};
use std::collections::BTreeSet;
use std::future::Future;

/// Result of resolving an output
pub type OutputResult<T> = Result<T, DeployError>;

pub struct Output<T> {
    value: Shared<BoxFuture<'static, OutputResult<T>>>,
    dependencies: BTreeSet<Urn>,
    secret: bool,
}

impl<T> Clone for Output<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            dependencies: self.dependencies.clone(),
            secret: self.secret,
        }
    }
}

impl<T> std::fmt::Debug for Output<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Output")
            .field("dependencies", &self.dependencies)
            .field("secret", &self.secret)
            .finish_non_exhaustive()
    }
}

impl<T> Output<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// An output whose value is already known and depends on nothing
    pub fn known(value: T) -> Self {
        Self::from_future(BTreeSet::new(), future::ready(Ok(value)))
    }

    /// A known value that must never be printed or persisted
    pub fn secret(value: T) -> Self {
        Self::known(value).into_secret()
    }

    pub fn failed(error: DeployError) -> Self {
        Self::from_future(BTreeSet::new(), future::ready(Err(error)))
    }

    /// Wrap a computation that depends on the given resources
    pub fn from_future<F>(dependencies: BTreeSet<Urn>, value: F) -> Self
    where
        F: Future<Output = OutputResult<T>> + Send + 'static,
    {
        Self {
            value: value.boxed().shared(),
            dependencies,
            secret: false,
        }
    }

    #[must_use]
    pub fn into_secret(mut self) -> Self {
        self.secret = true;
        self
    }

    #[must_use]
    pub fn is_secret(&self) -> bool {
        self.secret
    }

    /// Resources that must be realized before this value is known
    #[must_use]
    pub fn dependencies(&self) -> &BTreeSet<Urn> {
        &self.dependencies
    }

    /// Wait for the value
    pub async fn resolve(&self) -> OutputResult<T> {
        self.value.clone().await
    }

    /// Derive a new output once this one resolves
    pub fn apply<U, F>(&self, f: F) -> Output<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.try_apply(move |value| Ok(f(value)))
    }

    /// Like [`Output::apply`] for derivations that can fail
    pub fn try_apply<U, F>(&self, f: F) -> Output<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> OutputResult<U> + Send + 'static,
    {
        let value = self.value.clone();
        Output {
            value: async move { f(value.await?) }.boxed().shared(),
            dependencies: self.dependencies.clone(),
            secret: self.secret,
        }
    }

    /// Derive a new output through an asynchronous call (e.g. a key listing)
    pub fn apply_async<U, F, Fut>(&self, f: F) -> Output<U>
    where
        U: Clone + Send + Sync + 'static,
        F: FnOnce(T) -> Fut + Send + 'static,
        Fut: Future<Output = OutputResult<U>> + Send + 'static,
    {
        let value = self.value.clone();
        Output {
            value: async move { f(value.await?).await }.boxed().shared(),
            dependencies: self.dependencies.clone(),
            secret: self.secret,
        }
    }

    /// Resolve two outputs together
    pub fn zip<U>(&self, other: &Output<U>) -> Output<(T, U)>
    where
        U: Clone + Send + Sync + 'static,
    {
        Output {
            value: future::try_join(self.value.clone(), other.value.clone())
                .boxed()
                .shared(),
            dependencies: self
                .dependencies
                .union(&other.dependencies)
                .cloned()
                .collect(),
            secret: self.secret || other.secret,
        }
    }

    /// Resolve a list of outputs, keeping their order
    pub fn all<I>(outputs: I) -> Output<Vec<T>>
    where
        I: IntoIterator<Item = Output<T>>,
    {
        let outputs: Vec<Output<T>> = outputs.into_iter().collect();
        let dependencies = outputs
            .iter()
            .flat_map(|output| output.dependencies.iter().cloned())
            .collect();
        let secret = outputs.iter().any(Output::is_secret);
        let values: Vec<_> = outputs.into_iter().map(|output| output.value).collect();

        Output {
            value: future::try_join_all(values).boxed().shared(),
            dependencies,
            secret,
        }
    }
}

impl From<&str> for Output<String> {
    fn from(value: &str) -> Self {
        Output::known(value.to_string())
    }
}

impl From<String> for Output<String> {
    fn from(value: String) -> Self {
        Output::known(value)
    }
}
