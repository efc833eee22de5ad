use log::info;
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::access::{VpcPlacement, self_managed_access_configurations};
use super::{ClusterKind, SelfManagedKafkaProps, attach};
use crate::error::{BindError, BindResult};
use crate::mapping::{EventSourceMappingOptions, SelfManagedEventSource, starting_position_issue};
use crate::target::{EventSourceTarget, MappingRef};

/// A topic on a cluster the user operates, reached through its bootstrap
/// servers either over the internet or inside a VPC.
#[derive(Debug, Clone)]
pub struct SelfManagedKafkaEventSource {
    props: SelfManagedKafkaProps,
    mapping: Option<MappingRef>,
}

impl SelfManagedKafkaEventSource {
    pub fn new(props: SelfManagedKafkaProps) -> BindResult<Self> {
        validate(&props)?;
        Ok(Self {
            props,
            mapping: None,
        })
    }

    pub fn props(&self) -> &SelfManagedKafkaProps {
        &self.props
    }

    pub fn is_bound(&self) -> bool {
        self.mapping.is_some()
    }

    /// Mapping id under which the source attaches: distinct bootstrap server
    /// lists on the same topic never collide.
    pub fn mapping_id(&self) -> String {
        format!(
            "KafkaEventSource:{}:{}",
            bootstrap_servers_digest(&self.props.bootstrap_servers),
            self.props.source.topic.trim()
        )
    }

    pub fn bind(&mut self, target: &mut dyn EventSourceTarget) -> BindResult<()> {
        if let Some(mapping) = &self.mapping {
            return Err(BindError::AlreadyBound(mapping.id.clone()));
        }
        let Some(node_id) = target.node_id().map(str::to_string) else {
            return Err(BindError::InvalidTarget(
                "function is not a construct. Unexpected error.".into(),
            ));
        };

        let props = &self.props;
        let subnet_ids = match (&props.vpc, &props.security_group) {
            (Some(vpc), Some(_)) => {
                let selection = props.vpc_subnets.clone().unwrap_or_default();
                vpc.select_subnets(&selection)?.subnet_ids
            }
            _ => Vec::new(),
        };
        let placement = match (&props.vpc, &props.security_group) {
            (Some(_), Some(security_group)) => Some(VpcPlacement {
                security_group,
                subnet_ids: &subnet_ids,
            }),
            _ => None,
        };

        let base = EventSourceMappingOptions {
            self_managed_event_source: Some(SelfManagedEventSource::kafka(
                props.bootstrap_servers.clone(),
            )),
            source_access_configurations: self_managed_access_configurations(
                props.authentication_method,
                props.source.secret.as_ref(),
                props.root_ca_certificate.as_ref(),
                placement,
            ),
            ..EventSourceMappingOptions::default()
        };
        let id = self.mapping_id();
        let mapping = attach(target, &id, base, &props.source, ClusterKind::SelfManaged)?;

        if let Some(secret) = &props.source.secret {
            secret.grant_read(target);
        }

        info!(
            "[kafka] topic '{}' on {:?} bound to {node_id} as {}",
            props.source.topic, props.bootstrap_servers, mapping.arn
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

fn validate(props: &SelfManagedKafkaProps) -> BindResult<()> {
    if props.bootstrap_servers.is_empty() {
        return Err(BindError::validation(
            "kafka.bootstrap_servers must not be empty",
        ));
    }
    if props.bootstrap_servers.iter().any(|s| s.trim().is_empty()) {
        return Err(BindError::validation(
            "kafka.bootstrap_servers must not contain blank entries",
        ));
    }
    if props.vpc.is_some() {
        if props.security_group.is_none() {
            return Err(BindError::validation(
                "securityGroup must be set when providing vpc",
            ));
        }
        if props.vpc_subnets.is_none() {
            return Err(BindError::validation(
                "vpcSubnets must be set when providing vpc",
            ));
        }
    } else if props.source.secret.is_none() {
        return Err(BindError::validation(
            "secret must be set if Kafka brokers accessed over Internet",
        ));
    }
    if let Some(issue) = starting_position_issue(
        props.source.stream.starting_position,
        props.source.stream.starting_position_timestamp,
    ) {
        return Err(BindError::validation(issue));
    }
    Ok(())
}

fn bootstrap_servers_digest(servers: &[String]) -> String {
    let encoded = Value::from(servers.to_vec()).to_string();
    format!("{:x}", Sha256::digest(encoded.as_bytes()))
}
