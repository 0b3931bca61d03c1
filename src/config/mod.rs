pub mod ai;
pub mod sources;

pub use ai::AiConfig;
pub use sources::{FetchParams, ProviderKind, SourceDescriptor, SourcesConfig};
