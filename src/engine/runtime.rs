//! Routed execution runtime for searches.
//!
//! [`Resolver`] is synchronous. Semantic queries always wait on the embedding
//! provider, while name-shaped queries usually finish on lexical rules alone.
//! This module runs the two kinds on separate bounded worker pools so slow
//! provider calls cannot starve name lookups.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::engine::{Resolver, SearchResponse};
use crate::error::{ExecutionError, PersonaError, PersonaResult};
use crate::handler::EntityHandler;
use crate::index::IndexHandle;
use crate::operations::SearchRequest;
use crate::query::QueryType;

/// Execution path selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchPath {
    /// Name-shaped queries.
    Lexical,
    /// Free-text queries that need the embedding provider.
    Semantic,
}

impl SearchPath {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Lexical => "lexical",
            Self::Semantic => "semantic",
        }
    }
}

/// Routes queries to an execution path.
pub trait QueryRouter: Send + Sync {
    /// Selects the execution path for a classified query.
    fn route(&self, query_type: QueryType) -> SearchPath;
}

/// Default router: name-shaped queries are lexical, everything else semantic.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultRouter;

impl QueryRouter for DefaultRouter {
    fn route(&self, query_type: QueryType) -> SearchPath {
        if query_type.is_name_shaped() {
            SearchPath::Lexical
        } else {
            SearchPath::Semantic
        }
    }
}

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct SearchRuntimeConfig {
    /// Number of lexical workers.
    pub lexical_workers: usize,
    /// Number of semantic workers.
    pub semantic_workers: usize,
    /// Maximum queued jobs per pool.
    pub queue_capacity: usize,
}

impl Default for SearchRuntimeConfig {
    fn default() -> Self {
        Self {
            lexical_workers: 2,
            semantic_workers: 2,
            queue_capacity: 1024,
        }
    }
}

enum Job {
    Search {
        request: SearchRequest,
        reply: Sender<PersonaResult<SearchResponse>>,
    },

    #[cfg(test)]
    Sleep {
        duration: Duration,
        reply: Sender<()>,
    },
}

struct WorkerPool {
    tx: Sender<Job>,
    workers: Vec<JoinHandle<()>>,
    queue_capacity: usize,
    path: SearchPath,
}

impl WorkerPool {
    fn start<H>(
        path: SearchPath,
        workers: usize,
        queue_capacity: usize,
        resolver: &Arc<Resolver<H>>,
        index: &Arc<IndexHandle<H::Parts>>,
    ) -> PersonaResult<Self>
    where
        H: EntityHandler + 'static,
    {
        let workers = workers.max(1);
        let queue_capacity = queue_capacity.max(1);
        let (tx, rx) = bounded::<Job>(queue_capacity);

        let mut handles = Vec::with_capacity(workers);
        for idx in 0..workers {
            let rx: Receiver<Job> = rx.clone();
            let resolver = Arc::clone(resolver);
            let index = Arc::clone(index);
            let handle = thread::Builder::new()
                .name(format!("persona-{}-{idx}", path.as_str()))
                .spawn(move || loop {
                    match rx.recv() {
                        Ok(Job::Search { request, reply }) => {
                            // Each job searches the snapshot current when it starts.
                            let result = index
                                .load()
                                .and_then(|snapshot| resolver.search(&snapshot, &request));
                            let _ = reply.send(result);
                        }
                        Err(_) => break,

                        #[cfg(test)]
                        Ok(Job::Sleep { duration, reply }) => {
                            thread::sleep(duration);
                            let _ = reply.send(());
                        }
                    }
                })
                .map_err(|e| PersonaError::internal(format!("failed to spawn search worker: {e}")))?;
            handles.push(handle);
        }

        Ok(Self {
            tx,
            workers: handles,
            queue_capacity,
            path,
        })
    }

    fn try_submit(&self, job: Job) -> PersonaResult<()> {
        match self.tx.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(ExecutionError::QueueFull {
                path: self.path.as_str().to_string(),
                capacity: self.queue_capacity,
            }
            .into()),
            Err(TrySendError::Disconnected(_)) => Err(ExecutionError::Disconnected {
                path: self.path.as_str().to_string(),
            }
            .into()),
        }
    }

    fn shutdown(self) {
        // Close the channel: workers drain queued jobs, then exit.
        drop(self.tx);
        for handle in self.workers {
            let _ = handle.join();
        }
    }

    fn placeholder(path: SearchPath) -> Self {
        Self {
            tx: bounded::<Job>(1).0,
            workers: Vec::new(),
            queue_capacity: 1,
            path,
        }
    }
}

/// Handle returned by [`SearchRuntime::search_async`].
#[derive(Debug)]
pub struct SearchHandle {
    path: SearchPath,
    rx: Receiver<PersonaResult<SearchResponse>>,
}

impl SearchHandle {
    /// Returns the path selected by the router.
    #[must_use]
    pub const fn path(&self) -> SearchPath {
        self.path
    }

    /// Waits for the search to complete.
    ///
    /// # Errors
    ///
    /// Returns the search's own error, or [`ExecutionError::Disconnected`] if
    /// the worker went away without replying.
    pub fn join(self) -> PersonaResult<SearchResponse> {
        let path = self.path;
        self.rx.recv().map_err(|_| {
            PersonaError::from(ExecutionError::Disconnected {
                path: path.as_str().to_string(),
            })
        })?
    }

    /// Waits for the search to complete with a timeout.
    ///
    /// # Errors
    ///
    /// As [`SearchHandle::join`], plus [`ExecutionError::Timeout`] when the
    /// reply does not arrive in time.
    pub fn join_timeout(self, timeout: Duration) -> PersonaResult<SearchResponse> {
        let path = self.path;
        self.rx
            .recv_timeout(timeout)
            .map_err(|err| match err {
                crossbeam_channel::RecvTimeoutError::Timeout => {
                    #[allow(clippy::cast_possible_truncation)]
                    let duration_ms = timeout.as_millis().min(u128::from(u64::MAX)) as u64;
                    PersonaError::from(ExecutionError::Timeout { duration_ms })
                }
                crossbeam_channel::RecvTimeoutError::Disconnected => {
                    PersonaError::from(ExecutionError::Disconnected {
                        path: path.as_str().to_string(),
                    })
                }
            })?
    }
}

/// A routed runtime that keeps lexical and semantic work apart.
pub struct SearchRuntime<H, R = DefaultRouter>
where
    H: EntityHandler + 'static,
    R: QueryRouter,
{
    router: R,
    resolver: Arc<Resolver<H>>,
    index: Arc<IndexHandle<H::Parts>>,
    lexical: WorkerPool,
    semantic: WorkerPool,
}

impl<H: EntityHandler + 'static> SearchRuntime<H, DefaultRouter> {
    /// Create a runtime with the default router.
    ///
    /// # Errors
    ///
    /// Fails if a worker thread cannot be spawned.
    pub fn new(
        resolver: Resolver<H>,
        index: Arc<IndexHandle<H::Parts>>,
        config: &SearchRuntimeConfig,
    ) -> PersonaResult<Self> {
        Self::with_router(resolver, index, DefaultRouter, config)
    }
}

impl<H: EntityHandler + 'static, R: QueryRouter> SearchRuntime<H, R> {
    /// Create a runtime with a custom router.
    ///
    /// # Errors
    ///
    /// Fails if a worker thread cannot be spawned.
    pub fn with_router(
        resolver: Resolver<H>,
        index: Arc<IndexHandle<H::Parts>>,
        router: R,
        config: &SearchRuntimeConfig,
    ) -> PersonaResult<Self> {
        let resolver = Arc::new(resolver);
        let lexical = WorkerPool::start(
            SearchPath::Lexical,
            config.lexical_workers,
            config.queue_capacity,
            &resolver,
            &index,
        )?;
        let semantic = WorkerPool::start(
            SearchPath::Semantic,
            config.semantic_workers,
            config.queue_capacity,
            &resolver,
            &index,
        )?;
        tracing::info!(
            lexical_workers = lexical.workers.len(),
            semantic_workers = semantic.workers.len(),
            queue_capacity = config.queue_capacity,
            "search runtime started"
        );
        Ok(Self {
            router,
            resolver,
            index,
            lexical,
            semantic,
        })
    }

    /// Queue a search on the routed path.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::QueueFull`] when the path's queue is full.
    pub fn search_async(&self, request: SearchRequest) -> PersonaResult<SearchHandle> {
        let query_type = self.resolver.handler().query_type(request.query());
        let path = self.router.route(query_type);
        let (tx, rx) = bounded::<PersonaResult<SearchResponse>>(1);
        self.pool(path).try_submit(Job::Search { request, reply: tx })?;
        Ok(SearchHandle { path, rx })
    }

    /// Run a search on the routed path and wait for it.
    ///
    /// # Errors
    ///
    /// Queueing errors and the search's own errors.
    pub fn search(&self, request: SearchRequest) -> PersonaResult<SearchResponse> {
        self.search_async(request)?.join()
    }

    /// The shared resolver.
    #[must_use]
    pub fn resolver(&self) -> &Resolver<H> {
        &self.resolver
    }

    /// The index swap cell the workers read from.
    #[must_use]
    pub fn index(&self) -> &Arc<IndexHandle<H::Parts>> {
        &self.index
    }

    fn pool(&self, path: SearchPath) -> &WorkerPool {
        match path {
            SearchPath::Lexical => &self.lexical,
            SearchPath::Semantic => &self.semantic,
        }
    }

    #[cfg(test)]
    fn submit_sleep(&self, path: SearchPath, duration: Duration) -> PersonaResult<Receiver<()>> {
        let (tx, rx) = bounded::<()>(1);
        self.pool(path).try_submit(Job::Sleep { duration, reply: tx })?;
        Ok(rx)
    }
}

impl<H: EntityHandler + 'static, R: QueryRouter> Drop for SearchRuntime<H, R> {
    fn drop(&mut self) {
        // Deterministic shutdown: stop workers and join threads.
        let lexical = std::mem::replace(&mut self.lexical, WorkerPool::placeholder(SearchPath::Lexical));
        let semantic =
            std::mem::replace(&mut self.semantic, WorkerPool::placeholder(SearchPath::Semantic));
        lexical.shutdown();
        semantic.shutdown();
    }
}
