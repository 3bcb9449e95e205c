//! Actor runtime adapters - snapshot store and active-cycle index.

mod http_client;
mod in_memory;

pub use http_client::ActorRuntimeClient;
pub use in_memory::InMemoryActorRuntime;
