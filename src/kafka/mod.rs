//! Kafka event sources: bind a topic on an MSK or self-managed cluster to a function.
//!
//! 模块划分：
//! - config：绑定属性（公共属性 + 自建集群属性）
//! - access：source access configuration 决策表
//! - managed / self_managed：两种集群的 binder
//! - factory：从扁平参数构建 binder

mod access;
mod config;
mod factory;
#[cfg(feature = "msk")]
mod managed;
#[cfg(feature = "self-managed")]
mod self_managed;

use log::debug;

use crate::error::BindResult;
use crate::mapping::{EventSourceMappingOptions, KafkaEventSourceConfig, enrich_mapping_options};
use crate::target::{EventSourceTarget, MappingRef};

pub use config::{KafkaEventSourceProps, SelfManagedKafkaProps};
pub use factory::{BinderFactory, KafkaSourceSpec, ParamMap, SourceDef};
#[cfg(feature = "msk")]
pub use factory::ManagedKafkaSourceFactory;
#[cfg(feature = "self-managed")]
pub use factory::SelfManagedKafkaSourceFactory;
#[cfg(feature = "msk")]
pub use managed::ManagedKafkaEventSource;
#[cfg(feature = "self-managed")]
pub use self_managed::SelfManagedKafkaEventSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClusterKind {
    #[cfg_attr(not(feature = "msk"), allow(dead_code))]
    Managed,
    #[cfg_attr(not(feature = "self-managed"), allow(dead_code))]
    SelfManaged,
}

/// Enriches `base` with the common Kafka properties and submits the result to
/// the target. The grants the optional collaborators need are applied only
/// once the target has accepted the mapping.
pub(crate) fn attach(
    target: &mut dyn EventSourceTarget,
    id: &str,
    base: EventSourceMappingOptions,
    props: &KafkaEventSourceProps,
    cluster: ClusterKind,
) -> BindResult<MappingRef> {
    props.validate()?;
    let mut options = enrich_mapping_options(&props.stream, base)?;
    options.topics = vec![props.topic.trim().to_string()];

    let schema_registry_config = props
        .schema_registry
        .as_ref()
        .map(|registry| registry.render())
        .transpose()?;
    options.kms_key_arn = props.filter_encryption.as_ref().map(|key| key.arn.clone());
    options.destination_config = props.on_failure.as_ref().map(|d| d.render());

    if props.consumer_group_id.is_some() || schema_registry_config.is_some() {
        let kafka_config = KafkaEventSourceConfig {
            consumer_group_id: props.consumer_group_id.clone(),
            schema_registry_config,
        };
        match cluster {
            ClusterKind::Managed => {
                options.amazon_managed_kafka_event_source_config = Some(kafka_config)
            }
            ClusterKind::SelfManaged => {
                options.self_managed_kafka_event_source_config = Some(kafka_config)
            }
        }
    }

    debug!(
        "[kafka] submit mapping {id}: topic={}, access_configs={}",
        props.topic,
        options
            .source_access_configurations
            .as_ref()
            .map_or(0, Vec::len)
    );
    let mapping = target.add_event_source_mapping(id, &options)?;

    // 挂载成功后再授权
    if let Some(registry) = &props.schema_registry {
        registry.grant(target);
    }
    if let Some(key) = &props.filter_encryption {
        key.grant_decrypt(target);
    }
    if let Some(destination) = &props.on_failure {
        destination.grant(target);
    }
    Ok(mapping)
}
