pub mod corpus;
pub mod indexing;
pub mod mood;
pub mod report;
pub mod retrieval;
pub mod session;
pub mod time_serde;

mod error;
mod prompts;

pub use corpus::{CorpusEntry, CorpusMetadata, CorpusStore};
pub use error::{Error, Result};
pub use indexing::{Intent, IntentsDocument};
pub use mood::MoodCheckIn;
pub use session::{AssistantTurn, SessionSummary};

use std::{
	collections::HashMap,
	future::Future,
	pin::Pin,
	sync::{Arc, Mutex},
};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

use haven_config::{Config, EmbeddingProviderConfig, LlmProviderConfig};
use haven_providers::{
	embedding,
	generation::{self, GenerationRequest},
};
use haven_storage::store::Store;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, haven_providers::Result<Vec<Vec<f32>>>>;
}

pub trait GenerationProvider
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		request: &'a GenerationRequest,
	) -> BoxFuture<'a, haven_providers::Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub generation: Arc<dyn GenerationProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		generation: Arc<dyn GenerationProvider>,
	) -> Self {
		Self { embedding, generation }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), generation: provider }
	}
}

pub struct HavenService {
	pub cfg: Config,
	pub store: Arc<dyn Store>,
	pub providers: Providers,
	corpus: CorpusStore,
	session_locks: Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
}
impl HavenService {
	pub fn new(cfg: Config, store: Arc<dyn Store>) -> Self {
		Self::with_providers(cfg, store, Providers::default())
	}

	pub fn with_providers(cfg: Config, store: Arc<dyn Store>, providers: Providers) -> Self {
		let corpus = CorpusStore::new(cfg.corpus.path.clone());

		Self { cfg, store, providers, corpus, session_locks: Mutex::new(HashMap::new()) }
	}

	/// Replaces the file-backed corpus, e.g. with preloaded records.
	pub fn with_corpus(mut self, corpus: CorpusStore) -> Self {
		self.corpus = corpus;

		self
	}

	pub fn corpus(&self) -> &CorpusStore {
		&self.corpus
	}

	/// Waits for the per-session lock serializing turns and completion within this process.
	///
	/// The map entry lives only while some caller holds or awaits the lock.
	pub(crate) async fn lock_session(&self, session_id: Uuid) -> SessionGuard<'_> {
		let lock = {
			let mut locks = self.session_locks.lock().unwrap_or_else(|err| err.into_inner());

			locks.entry(session_id).or_default().clone()
		};
		let guard = lock.lock_owned().await;

		SessionGuard { locks: &self.session_locks, session_id, guard: Some(guard) }
	}

	/// Number of sessions with an in-flight turn or completion.
	pub fn tracked_session_locks(&self) -> usize {
		self.session_locks.lock().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub(crate) async fn generate(
		&self,
		request: &GenerationRequest,
	) -> haven_providers::Result<String> {
		self.providers.generation.generate(&self.cfg.providers.generation, request).await
	}
}

pub(crate) struct SessionGuard<'a> {
	locks: &'a Mutex<HashMap<Uuid, Arc<AsyncMutex<()>>>>,
	session_id: Uuid,
	guard: Option<OwnedMutexGuard<()>>,
}
impl Drop for SessionGuard<'_> {
	fn drop(&mut self) {
		let Some(guard) = self.guard.take() else { return };
		let mut locks = self.locks.lock().unwrap_or_else(|err| err.into_inner());
		let mutex = OwnedMutexGuard::mutex(&guard);
		let idle = locks
			.get(&self.session_id)
			.is_some_and(|held| Arc::ptr_eq(held, mutex) && Arc::strong_count(mutex) <= 2);

		// The map and this guard are the only owners, so no caller is waiting.
		if idle {
			locks.remove(&self.session_id);
		}

		drop(guard);
	}
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, haven_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

impl GenerationProvider for DefaultProviders {
	fn generate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		request: &'a GenerationRequest,
	) -> BoxFuture<'a, haven_providers::Result<String>> {
		Box::pin(generation::generate(cfg, request))
	}
}
