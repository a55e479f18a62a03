//! # Station Commands
//!
//! One function per subcommand. Each takes the shared [`Station`] context
//! and the operator's [`Console`](crate::console::Console).
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs      ◄─── Station context (exports)
//! ├── stock.rs    ◄─── stock-in, stock-out, defect (StockSession loop)
//! ├── lookup.rs   ◄─── check (barcode lookup only, nothing written)
//! └── report.rs   ◄─── items, recent, last
//! ```
//!
//! ## Context Injection
//! Every command borrows what it needs from the context:
//! ```rust,ignore
//! // Needs a full pipeline
//! stock::run(&station, TransactionKind::Out, &mut console).await?;
//!
//! // Needs only the resolver
//! lookup::check(&station, &mut console).await?;
//!
//! // Needs only read queries
//! report::recent(&station, 8, &mut console).await?;
//! ```

pub mod lookup;
pub mod report;
pub mod stock;

use std::sync::Arc;

use scanstock_client::{
    Backend, HttpBackend, InventoryQueries, ItemResolver, LastRecordCache, ResilientRequester,
    StationConfig, StockSession,
};
use scanstock_core::TransactionKind;

use crate::error::StationResult;

/// Shared context for every command.
pub struct Station {
    user: String,
    backend: Arc<dyn Backend>,
    requester: ResilientRequester,
}

impl Station {
    /// Connects to the gateway named in the config.
    pub fn from_config(config: &StationConfig) -> StationResult<Self> {
        let backend = HttpBackend::from_config(config)?;
        Ok(Self::with_backend(config, Arc::new(backend)))
    }

    /// Uses an existing backend.
    pub fn with_backend(config: &StationConfig, backend: Arc<dyn Backend>) -> Self {
        Self {
            user: config.user().to_string(),
            backend,
            requester: ResilientRequester::new(config.retry_policy()),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn session(&self, kind: TransactionKind) -> StockSession {
        StockSession::new(kind, self.user.clone(), self.backend.clone(), self.requester)
    }

    pub fn resolver(&self) -> ItemResolver {
        ItemResolver::new(self.backend.clone(), self.requester)
    }

    pub fn queries(&self) -> InventoryQueries {
        InventoryQueries::new(self.backend.clone(), self.requester)
    }

    pub fn last_record(&self) -> LastRecordCache {
        LastRecordCache::new(self.backend.clone(), self.requester)
    }
}

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use scanstock_client::{Backend, ClientError, ClientResult, StationConfig};
    use serde_json::Value;

    use super::Station;
    use crate::console::Console;

    /// Backend answering from a queue and keeping every request.
    #[derive(Default)]
    pub struct FakeBackend {
        replies: Mutex<VecDeque<ClientResult<Value>>>,
        pub gets: Mutex<Vec<Vec<(String, String)>>>,
        pub posts: Mutex<Vec<Value>>,
    }

    impl FakeBackend {
        pub fn reply(self, body: Value) -> Self {
            self.replies.lock().unwrap().push_back(Ok(body));
            self
        }

        pub fn fail(self, error: ClientError) -> Self {
            self.replies.lock().unwrap().push_back(Err(error));
            self
        }

        fn next(&self) -> ClientResult<Value> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(Value::Null))
        }
    }

    #[async_trait]
    impl Backend for FakeBackend {
        async fn get(&self, query: &[(&str, &str)]) -> ClientResult<Value> {
            self.gets.lock().unwrap().push(
                query
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            );
            self.next()
        }

        async fn post(&self, body: &Value) -> ClientResult<Value> {
            self.posts.lock().unwrap().push(body.clone());
            self.next()
        }
    }

    /// A station with no retries over `backend`.
    pub fn station(backend: &Arc<FakeBackend>) -> Station {
        let mut config = StationConfig::default();
        config.request.max_retries = 0;
        config.operator.user = "ana".to_string();
        Station::with_backend(&config, backend.clone())
    }

    pub type TestConsole = Console<&'static [u8], Vec<u8>>;

    pub fn console(input: &'static str) -> TestConsole {
        Console::new(input.as_bytes(), Vec::new())
    }

    pub fn output(console: TestConsole) -> String {
        String::from_utf8(console.into_output()).unwrap()
    }
}
