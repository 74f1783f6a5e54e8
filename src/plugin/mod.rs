//! Typed extension points around store operations.
//!
//! Plugins register hooks at attach time; the decorator runs them around the
//! wrapped store:
//!
//! ```ignore
//! let store = SqliteEventStore::new(conn, SqliteSimpleStreamStrategy);
//! let mut store = PluggableEventStore::new(store)
//!     .attach(&MetadataEnricherPlugin::new().with_enricher(add_tenant));
//!
//! store.append_to(&name, &events).await?;
//! ```
//!
//! Pre-hooks may rewrite their input or reject the operation with an error.
//! A load hook may answer the read itself with `LoadOutcome::Substitute`.

mod metadata_enricher;

pub use metadata_enricher::{MetadataEnricher, MetadataEnricherPlugin};

use async_trait::async_trait;
use tracing::debug;

use crate::event::Event;
use crate::interfaces::{EventStore, EventStreamIterator, InMemoryIterator, Result};
use crate::matcher::MetadataMatcher;
use crate::storage::sql::Direction;
use crate::stream::{Stream, StreamMetadata, StreamName};

type CreateHook = Box<dyn Fn(&mut Stream) -> Result<()> + Send + Sync>;
type AfterCreateHook = Box<dyn Fn(&Stream) + Send + Sync>;
type AppendHook = Box<dyn Fn(&StreamName, &mut Vec<Event>) -> Result<()> + Send + Sync>;
type AfterAppendHook = Box<dyn Fn(&StreamName, &[Event]) + Send + Sync>;
type LoadHook = Box<dyn Fn(&LoadRequest<'_>) -> Result<LoadOutcome> + Send + Sync>;

/// Arguments of a `load` or `load_reverse` call, as seen by load hooks.
#[derive(Debug, Clone, Copy)]
pub struct LoadRequest<'a> {
    pub stream_name: &'a StreamName,
    /// `None` on a reverse load from the newest event.
    pub from_number: Option<u64>,
    pub count: Option<u64>,
    pub matcher: Option<&'a MetadataMatcher>,
    pub direction: Direction,
}

/// What a load hook decided.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Let the wrapped store answer.
    Continue,
    /// Answer with these events without touching the wrapped store.
    Substitute(Vec<Event>),
}

/// Registered callbacks, run in registration order.
#[derive(Default)]
pub struct Hooks {
    on_create: Vec<CreateHook>,
    after_create: Vec<AfterCreateHook>,
    on_append: Vec<AppendHook>,
    after_append: Vec<AfterAppendHook>,
    on_load: Vec<LoadHook>,
}

impl Hooks {
    /// Run before `create`; may rewrite the stream or reject it.
    pub fn on_create<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&mut Stream) -> Result<()> + Send + Sync + 'static,
    {
        self.on_create.push(Box::new(hook));
        self
    }

    /// Run after a successful `create`.
    pub fn after_create<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&Stream) + Send + Sync + 'static,
    {
        self.after_create.push(Box::new(hook));
        self
    }

    /// Run before `append_to`; may rewrite the events or reject them.
    pub fn on_append<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&StreamName, &mut Vec<Event>) -> Result<()> + Send + Sync + 'static,
    {
        self.on_append.push(Box::new(hook));
        self
    }

    /// Run after a successful `append_to` with the events actually written.
    pub fn after_append<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&StreamName, &[Event]) + Send + Sync + 'static,
    {
        self.after_append.push(Box::new(hook));
        self
    }

    /// Run before `load` and `load_reverse`. The first substitute wins.
    pub fn on_load<F>(&mut self, hook: F) -> &mut Self
    where
        F: Fn(&LoadRequest<'_>) -> Result<LoadOutcome> + Send + Sync + 'static,
    {
        self.on_load.push(Box::new(hook));
        self
    }

    fn run_load(&self, request: &LoadRequest<'_>) -> Result<LoadOutcome> {
        for hook in &self.on_load {
            if let LoadOutcome::Substitute(events) = hook(request)? {
                return Ok(LoadOutcome::Substitute(events));
            }
        }
        Ok(LoadOutcome::Continue)
    }
}

/// A store extension.
pub trait Plugin {
    /// Register this plugin's hooks.
    fn attach(&self, hooks: &mut Hooks);
}

/// Decorator running plugin hooks around any `EventStore`.
pub struct PluggableEventStore<S> {
    inner: S,
    hooks: Hooks,
}

impl<S: EventStore> PluggableEventStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            hooks: Hooks::default(),
        }
    }

    /// Attach a plugin.
    pub fn attach(mut self, plugin: &dyn Plugin) -> Self {
        plugin.attach(&mut self.hooks);
        self
    }

    /// Register hooks directly, without a named plugin.
    pub fn hooks_mut(&mut self) -> &mut Hooks {
        &mut self.hooks
    }

    /// Get a reference to the inner store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Get a mutable reference to the inner store.
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Consume the wrapper and return the inner store.
    pub fn into_inner(self) -> S {
        self.inner
    }

    async fn load_with_hooks<'a>(
        &'a mut self,
        request: LoadRequest<'_>,
    ) -> Result<Box<dyn EventStreamIterator + 'a>> {
        if let LoadOutcome::Substitute(events) = self.hooks.run_load(&request)? {
            debug!(stream = %request.stream_name, count = events.len(), "Load answered by plugin");
            return Ok(Box::new(InMemoryIterator::new(events)));
        }
        match request.direction {
            Direction::Forward => {
                self.inner
                    .load(
                        request.stream_name,
                        request.from_number.unwrap_or(1),
                        request.count,
                        request.matcher,
                    )
                    .await
            }
            Direction::Backward => {
                self.inner
                    .load_reverse(
                        request.stream_name,
                        request.from_number,
                        request.count,
                        request.matcher,
                    )
                    .await
            }
        }
    }
}

#[async_trait]
impl<S: EventStore> EventStore for PluggableEventStore<S> {
    async fn create(&mut self, stream: &Stream) -> Result<()> {
        let mut stream = stream.clone();
        for hook in &self.hooks.on_create {
            hook(&mut stream)?;
        }
        self.inner.create(&stream).await?;
        for hook in &self.hooks.after_create {
            hook(&stream);
        }
        Ok(())
    }

    async fn append_to(&mut self, stream_name: &StreamName, events: &[Event]) -> Result<()> {
        let mut events = events.to_vec();
        for hook in &self.hooks.on_append {
            hook(stream_name, &mut events)?;
        }
        self.inner.append_to(stream_name, &events).await?;
        for hook in &self.hooks.after_append {
            hook(stream_name, &events);
        }
        Ok(())
    }

    async fn load<'a>(
        &'a mut self,
        stream_name: &StreamName,
        from_number: u64,
        count: Option<u64>,
        matcher: Option<&MetadataMatcher>,
    ) -> Result<Box<dyn EventStreamIterator + 'a>> {
        self.load_with_hooks(LoadRequest {
            stream_name,
            from_number: Some(from_number),
            count,
            matcher,
            direction: Direction::Forward,
        })
        .await
    }

    async fn load_reverse<'a>(
        &'a mut self,
        stream_name: &StreamName,
        from_number: Option<u64>,
        count: Option<u64>,
        matcher: Option<&MetadataMatcher>,
    ) -> Result<Box<dyn EventStreamIterator + 'a>> {
        self.load_with_hooks(LoadRequest {
            stream_name,
            from_number,
            count,
            matcher,
            direction: Direction::Backward,
        })
        .await
    }

    async fn delete(&mut self, stream_name: &StreamName) -> Result<()> {
        self.inner.delete(stream_name).await
    }

    async fn has_stream(&mut self, stream_name: &StreamName) -> Result<bool> {
        self.inner.has_stream(stream_name).await
    }

    async fn fetch_stream_metadata(&mut self, stream_name: &StreamName) -> Result<StreamMetadata> {
        self.inner.fetch_stream_metadata(stream_name).await
    }

    async fn update_stream_metadata(
        &mut self,
        stream_name: &StreamName,
        metadata: &StreamMetadata,
    ) -> Result<()> {
        self.inner.update_stream_metadata(stream_name, metadata).await
    }

    async fn fetch_stream_names(
        &mut self,
        filter: Option<&StreamName>,
        matcher: Option<&MetadataMatcher>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<StreamName>> {
        self.inner
            .fetch_stream_names(filter, matcher, limit, offset)
            .await
    }

    async fn fetch_stream_names_regex(
        &mut self,
        pattern: &str,
        matcher: Option<&MetadataMatcher>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<StreamName>> {
        self.inner
            .fetch_stream_names_regex(pattern, matcher, limit, offset)
            .await
    }

    async fn fetch_category_names(
        &mut self,
        filter: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<String>> {
        self.inner.fetch_category_names(filter, limit, offset).await
    }

    async fn fetch_category_names_regex(
        &mut self,
        pattern: &str,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<String>> {
        self.inner
            .fetch_category_names_regex(pattern, limit, offset)
            .await
    }
}
