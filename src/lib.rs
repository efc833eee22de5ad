//! kafka-event-sources: bind Kafka topics (MSK or self-managed clusters) to
//! serverless functions as event source mappings.
//!
//! A binder validates its properties, computes the access configurations the
//! poller needs, submits the enriched mapping payload to an
//! [`EventSourceTarget`] and grants the function the permissions it needs.

pub mod destination;
pub mod error;
pub mod iam;
pub mod mapping;
pub mod resources;
pub mod schema_registry;
pub mod target;

// Kafka：MSK 与自建集群 binder，分别由 `msk` / `self-managed` 特性控制（默认均启用）
pub mod kafka;

pub use error::{BindError, BindResult};
pub use target::{EventSourceTarget, InMemoryFunction, MappingRef};

#[cfg(feature = "msk")]
pub use kafka::ManagedKafkaEventSource;
#[cfg(feature = "self-managed")]
pub use kafka::SelfManagedKafkaEventSource;
pub use kafka::{KafkaEventSourceProps, SelfManagedKafkaProps};
