//! Metadata enrichment plugin.

use std::sync::Arc;

use super::{Hooks, Plugin};
use crate::event::Event;

/// Adds metadata to an event before it is written.
pub trait MetadataEnricher: Send + Sync {
    fn enrich(&self, event: Event) -> Event;
}

impl<F> MetadataEnricher for F
where
    F: Fn(Event) -> Event + Send + Sync,
{
    fn enrich(&self, event: Event) -> Event {
        self(event)
    }
}

/// Runs every registered enricher, in order, over the events of `create` and
/// `append_to`.
#[derive(Clone, Default)]
pub struct MetadataEnricherPlugin {
    enrichers: Vec<Arc<dyn MetadataEnricher>>,
}

impl MetadataEnricherPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enricher(mut self, enricher: impl MetadataEnricher + 'static) -> Self {
        self.enrichers.push(Arc::new(enricher));
        self
    }

    fn enrich_all(enrichers: &[Arc<dyn MetadataEnricher>], events: &mut Vec<Event>) {
        *events = std::mem::take(events)
            .into_iter()
            .map(|event| {
                enrichers
                    .iter()
                    .fold(event, |event, enricher| enricher.enrich(event))
            })
            .collect();
    }
}

impl Plugin for MetadataEnricherPlugin {
    fn attach(&self, hooks: &mut Hooks) {
        if self.enrichers.is_empty() {
            return;
        }

        let enrichers = self.enrichers.clone();
        hooks.on_create(move |stream| {
            Self::enrich_all(&enrichers, &mut stream.events);
            Ok(())
        });

        let enrichers = self.enrichers.clone();
        hooks.on_append(move |_, events| {
            Self::enrich_all(&enrichers, events);
            Ok(())
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{Stream, StreamName};
    use serde_json::json;

    #[test]
    fn test_enrichers_applied_in_order() {
        let plugin = MetadataEnricherPlugin::new()
            .with_enricher(|e: Event| e.with_metadata("tenant", "acme"))
            .with_enricher(|e: Event| e.with_metadata("tenant", "override"));
        let mut hooks = Hooks::default();
        plugin.attach(&mut hooks);

        let mut stream = Stream::new(
            StreamName::new("user-1").unwrap(),
            vec![Event::new("Registered", json!({}))],
        );
        for hook in &hooks.on_create {
            hook(&mut stream).unwrap();
        }
        assert_eq!(stream.events[0].metadata()["tenant"], json!("override"));
    }

    #[test]
    fn test_empty_plugin_registers_nothing() {
        let mut hooks = Hooks::default();
        MetadataEnricherPlugin::new().attach(&mut hooks);
        assert!(hooks.on_create.is_empty());
        assert!(hooks.on_append.is_empty());
    }
}
