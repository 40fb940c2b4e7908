//! Adapter Cache
//!
//! One adapter per `(provider, model)`. Adapters hold configuration only, so
//! a cached instance is shared freely between concurrent requests.

use std::sync::Arc;

use dashmap::DashMap;
use persona_chat_llm::{LlmProvider, LlmResult, ProviderType};

type CacheKey = (ProviderType, String);

#[derive(Default)]
pub struct AdapterCache {
    adapters: DashMap<CacheKey, Arc<dyn LlmProvider>>,
}

impl AdapterCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached adapter for `(provider, model)`, building it with `create` on a miss.
    ///
    /// A failed build is returned to the caller and nothing is cached.
    pub fn get_or_insert_with<F>(
        &self,
        provider: ProviderType,
        model: &str,
        create: F,
    ) -> LlmResult<Arc<dyn LlmProvider>>
    where
        F: FnOnce() -> LlmResult<Arc<dyn LlmProvider>>,
    {
        let key = (provider, model.to_string());
        if let Some(existing) = self.adapters.get(&key) {
            return Ok(Arc::clone(existing.value()));
        }

        let adapter = create()?;
        tracing::debug!("Caching {} adapter for model {}", provider, model);
        // Another task may have raced us; keep whichever landed first.
        let entry = self.adapters.entry(key).or_insert(adapter);
        Ok(Arc::clone(entry.value()))
    }

    /// Drop every cached adapter.
    pub fn invalidate(&self) {
        let count = self.adapters.len();
        self.adapters.clear();
        tracing::info!("Adapter cache invalidated ({} entries)", count);
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}
