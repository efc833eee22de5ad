//! Event source mapping payload and the option enrichment shared by all
//! stream-based sources.

mod enrich;
mod options;

pub use enrich::{
    MAX_BATCH_SIZE, MAX_BATCHING_WINDOW, MAX_MAXIMUM_POLLERS, MAX_MINIMUM_POLLERS,
    MISSING_TIMESTAMP, StreamSourceOptions, UNEXPECTED_TIMESTAMP, enrich_mapping_options,
    starting_position_issue,
};
pub use options::{
    AuthenticationMethod, DestinationConfig, EventSourceMappingOptions, FilterCriteria,
    FilterRule, KafkaEndpoints, KafkaEventSourceConfig, OnFailure, ProvisionedPollerConfig,
    SelfManagedEventSource, SourceAccessConfiguration, SourceAccessConfigurationType,
    StartingPosition,
};
