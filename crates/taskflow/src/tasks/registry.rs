use std::{collections::HashMap, pin::Pin, sync::Arc};

use crate::tasks::model::Task;
use crate::tasks::process::Process;

pub type BoxFuture<'a, T> = Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

type HandlerFn =
    dyn for<'a> Fn(&'a Process) -> BoxFuture<'a, Result<Task, TaskError>> + Send + Sync;

#[derive(Debug)]
pub struct TaskError {
    pub code: &'static str,
    pub message: String,
}

impl TaskError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for TaskError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for TaskError {}

/// Static name -> handler table, built once at process start.
///
/// A handler takes the execution context for its claimed task and returns a
/// terminal record, usually via [`Process::done`] / [`Process::fail`].
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<HandlerFn>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: &str, handler: F)
    where
        F: for<'a> Fn(&'a Process) -> BoxFuture<'a, Result<Task, TaskError>>
            + Send
            + Sync
            + 'static,
    {
        self.handlers.insert(name.to_string(), Arc::new(handler));
    }

    pub fn handler_for(&self, name: &str) -> Option<Arc<HandlerFn>> {
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }
}

pub fn boxed<'a, T>(fut: impl std::future::Future<Output = T> + Send + 'a) -> BoxFuture<'a, T> {
    Box::pin(fut)
}
