use log::{info, warn};

use super::access::managed_access_configurations;
use super::{ClusterKind, KafkaEventSourceProps, attach};
use crate::error::{BindError, BindResult};
use crate::iam::{MSK_CLUSTER_ACTIONS, MSK_EXECUTION_ROLE_POLICY, PolicyStatement};
use crate::mapping::{EventSourceMappingOptions, starting_position_issue};
use crate::target::{EventSourceTarget, MappingRef};

/// A topic on an Amazon MSK cluster, referenced by cluster ARN.
#[derive(Debug, Clone)]
pub struct ManagedKafkaEventSource {
    cluster_arn: String,
    props: KafkaEventSourceProps,
    mapping: Option<MappingRef>,
    warnings: Vec<String>,
}

impl ManagedKafkaEventSource {
    pub fn new(cluster_arn: impl Into<String>, props: KafkaEventSourceProps) -> Self {
        Self {
            cluster_arn: cluster_arn.into(),
            props,
            mapping: None,
            warnings: Vec::new(),
        }
    }

    pub fn cluster_arn(&self) -> &str {
        &self.cluster_arn
    }

    pub fn props(&self) -> &KafkaEventSourceProps {
        &self.props
    }

    /// Advisory findings of the last `bind` call.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn is_bound(&self) -> bool {
        self.mapping.is_some()
    }

    pub fn bind(&mut self, target: &mut dyn EventSourceTarget) -> BindResult<()> {
        if let Some(mapping) = &self.mapping {
            return Err(BindError::AlreadyBound(mapping.id.clone()));
        }

        // An inconsistent starting position only warns for MSK sources; the
        // self-managed source rejects it at construction.
        self.warnings.clear();
        if let Some(issue) = starting_position_issue(
            self.props.stream.starting_position,
            self.props.stream.starting_position_timestamp,
        ) {
            warn!("[kafka] {}: {issue}", self.cluster_arn);
            self.warnings.push(issue.to_string());
        }

        let Some(node_id) = target.node_id().map(str::to_string) else {
            return Err(BindError::InvalidTarget(self.cluster_arn.clone()));
        };
        let id = format!("KafkaEventSource:{node_id}{}", self.props.topic.trim());

        let base = EventSourceMappingOptions {
            event_source_arn: Some(self.cluster_arn.clone()),
            source_access_configurations: managed_access_configurations(self.props.secret.as_ref()),
            ..EventSourceMappingOptions::default()
        };
        let mapping = attach(target, &id, base, &self.props, ClusterKind::Managed)?;

        if let Some(secret) = &self.props.secret {
            secret.grant_read(target);
        }
        target.add_to_role_policy(PolicyStatement::allow(
            MSK_CLUSTER_ACTIONS,
            [self.cluster_arn.clone()],
        ));
        target.add_managed_policy(MSK_EXECUTION_ROLE_POLICY);

        info!(
            "[kafka] topic '{}' on {} bound to {node_id} as {}",
            self.props.topic, self.cluster_arn, mapping.arn
        );
        self.mapping = Some(mapping);
        Ok(())
    }

    pub fn event_source_mapping_id(&self) -> BindResult<&str> {
        self.mapping
            .as_ref()
            .map(|m| m.id.as_str())
            .ok_or(BindError::NotBound)
    }

    pub fn event_source_mapping_arn(&self) -> BindResult<&str> {
        self.mapping
            .as_ref()
            .map(|m| m.arn.as_str())
            .ok_or(BindError::NotBound)
    }
}
