//! Named fan-out/fan-in of independent store reads
//!
//! Each branch is spawned as its own task. `run` resolves once every branch
//! succeeded, or with the first error as soon as it arrives. Branches still in
//! flight at that point keep running to completion; their results are dropped.

use std::{any::Any, future::Future, marker::PhantomData, pin::Pin};

use tokio::sync::mpsc;

use crate::error::{AppError, AppResult};

type BoxedValue = Box<dyn Any + Send>;
type Branch = Pin<Box<dyn Future<Output = AppResult<BoxedValue>> + Send>>;

/// Typed handle to one branch's result
#[must_use]
pub struct Slot<T> {
    index: usize,
    name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

/// Fixed set of named branches, launched together by `run`
pub struct ConcurrentJoin {
    label: &'static str,
    branches: Vec<(&'static str, Branch)>,
}

impl ConcurrentJoin {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            branches: Vec::new(),
        }
    }

    /// Register a branch. Nothing runs until `run`.
    pub fn add<T, F>(&mut self, name: &'static str, branch: F) -> Slot<T>
    where
        T: Send + 'static,
        F: Future<Output = AppResult<T>> + Send + 'static,
    {
        let index = self.branches.len();
        self.branches.push((
            name,
            Box::pin(async move { branch.await.map(|value| Box::new(value) as BoxedValue) }),
        ));
        Slot {
            index,
            name,
            _marker: PhantomData,
        }
    }

    pub async fn run(self) -> AppResult<Joined> {
        let label = self.label;
        let total = self.branches.len();
        let names: Vec<&'static str> = self.branches.iter().map(|(name, _)| *name).collect();
        tracing::debug!("{}: joining {} branch(es) {:?}", label, total, names);

        let (tx, mut rx) = mpsc::unbounded_channel();
        for (index, (_, branch)) in self.branches.into_iter().enumerate() {
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = branch.await;
                // The receiver is gone once another branch has failed
                let _ = tx.send((index, result));
            });
        }
        drop(tx);

        let mut values: Vec<Option<BoxedValue>> = (0..total).map(|_| None).collect();
        let mut pending = total;
        while pending > 0 {
            match rx.recv().await {
                Some((index, Ok(value))) => {
                    values[index] = Some(value);
                    pending -= 1;
                }
                Some((index, Err(err))) => {
                    tracing::debug!("{}: branch '{}' failed: {}", label, names[index], err);
                    return Err(err);
                }
                None => {
                    return Err(AppError::Internal(format!(
                        "{}: {} branch(es) ended without a result",
                        label, pending
                    )));
                }
            }
        }

        tracing::debug!("{}: all {} branch(es) done", label, total);
        Ok(Joined { label, values })
    }
}

/// Results of a completed join, keyed by branch
pub struct Joined {
    label: &'static str,
    values: Vec<Option<BoxedValue>>,
}

impl Joined {
    pub fn take<T: 'static>(&mut self, slot: Slot<T>) -> AppResult<T> {
        let value = self
            .values
            .get_mut(slot.index)
            .and_then(Option::take)
            .ok_or_else(|| {
                AppError::Internal(format!("{}: no result for '{}'", self.label, slot.name))
            })?;
        value.downcast::<T>().map(|boxed| *boxed).map_err(|_| {
            AppError::Internal(format!("{}: unexpected type for '{}'", self.label, slot.name))
        })
    }
}
