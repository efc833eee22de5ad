use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::destination::FailureDestination;
use crate::error::{BindError, BindResult};
use crate::mapping::{
    AuthenticationMethod, ProvisionedPollerConfig, StartingPosition, StreamSourceOptions,
};
use crate::resources::{KmsKeyRef, SecretRef, SecurityGroupRef, SubnetSelection, Vpc};
use crate::schema_registry::SchemaRegistryConfig;

pub const MAX_TOPIC_LEN: usize = 249;
pub const MAX_CONSUMER_GROUP_ID_LEN: usize = 200;

lazy_static! {
    static ref CONSUMER_GROUP_ID: Regex =
        Regex::new(r"^[a-zA-Z0-9\-/*:_+=.@]*$").expect("consumer group id pattern");
}

/// Properties shared by managed and self-managed Kafka sources.
#[derive(Debug, Clone, PartialEq)]
pub struct KafkaEventSourceProps {
    pub topic: String,
    /// SASL/SCRAM, basic auth or client certificate secret.
    pub secret: Option<SecretRef>,
    pub consumer_group_id: Option<String>,
    pub filter_encryption: Option<KmsKeyRef>,
    pub on_failure: Option<FailureDestination>,
    pub schema_registry: Option<SchemaRegistryConfig>,
    pub stream: StreamSourceOptions,
}

impl KafkaEventSourceProps {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            secret: None,
            consumer_group_id: None,
            filter_encryption: None,
            on_failure: None,
            schema_registry: None,
            stream: StreamSourceOptions::default(),
        }
    }

    pub fn with_secret(mut self, secret: SecretRef) -> Self {
        self.secret = Some(secret);
        self
    }

    pub fn with_consumer_group_id(mut self, id: impl Into<String>) -> Self {
        self.consumer_group_id = Some(id.into());
        self
    }

    pub fn with_starting_position(mut self, position: StartingPosition) -> Self {
        self.stream.starting_position = Some(position);
        self
    }

    pub fn with_starting_position_timestamp(mut self, epoch_secs: f64) -> Self {
        self.stream.starting_position_timestamp = Some(epoch_secs);
        self
    }

    pub fn starting_at(mut self, at: DateTime<Utc>) -> Self {
        self.stream.starting_at(at);
        self
    }

    pub fn with_batch_size(mut self, size: u32) -> Self {
        self.stream.batch_size = Some(size);
        self
    }

    pub fn with_max_batching_window(mut self, window: Duration) -> Self {
        self.stream.max_batching_window = Some(window);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.stream.enabled = enabled;
        self
    }

    pub fn with_provisioned_pollers(mut self, minimum: Option<u32>, maximum: Option<u32>) -> Self {
        self.stream.provisioned_poller_config = Some(ProvisionedPollerConfig {
            minimum_pollers: minimum,
            maximum_pollers: maximum,
        });
        self
    }

    pub fn with_filter(mut self, pattern: Value) -> Self {
        self.stream.filters.push(pattern);
        self
    }

    pub fn with_filter_encryption(mut self, key: KmsKeyRef) -> Self {
        self.filter_encryption = Some(key);
        self
    }

    pub fn with_on_failure(mut self, destination: FailureDestination) -> Self {
        self.on_failure = Some(destination);
        self
    }

    pub fn with_schema_registry(mut self, registry: SchemaRegistryConfig) -> Self {
        self.schema_registry = Some(registry);
        self
    }

    /// Bind-time checks common to both cluster kinds.
    pub(crate) fn validate(&self) -> BindResult<()> {
        let topic = self.topic.trim();
        if topic.is_empty() {
            return Err(BindError::validation("kafka.topic must not be empty"));
        }
        if topic.len() > MAX_TOPIC_LEN {
            return Err(BindError::validation(format!(
                "kafka.topic must be at most {MAX_TOPIC_LEN} characters, got {}",
                topic.len()
            )));
        }
        if let Some(group) = &self.consumer_group_id {
            if group.is_empty() || group.len() > MAX_CONSUMER_GROUP_ID_LEN {
                return Err(BindError::validation(format!(
                    "consumerGroupId must be a valid string between 1 and {MAX_CONSUMER_GROUP_ID_LEN} characters"
                )));
            }
            if !CONSUMER_GROUP_ID.is_match(group) {
                return Err(BindError::validation(
                    "consumerGroupId contains invalid characters. Allowed values are \"[a-zA-Z0-9-/*:_+=.@-]\"",
                ));
            }
        }
        if self.filter_encryption.is_some() && self.stream.filters.is_empty() {
            return Err(BindError::validation(
                "filter criteria must be provided to enable setting filter criteria encryption",
            ));
        }
        Ok(())
    }
}

/// Properties of a source reading from a cluster the user operates.
#[derive(Debug, Clone)]
pub struct SelfManagedKafkaProps {
    /// `host:port` pairs of the initial brokers.
    pub bootstrap_servers: Vec<String>,
    pub vpc: Option<Arc<dyn Vpc>>,
    pub vpc_subnets: Option<SubnetSelection>,
    pub security_group: Option<SecurityGroupRef>,
    pub authentication_method: AuthenticationMethod,
    pub root_ca_certificate: Option<SecretRef>,
    pub source: KafkaEventSourceProps,
}

impl SelfManagedKafkaProps {
    pub fn new<I, S>(bootstrap_servers: I, source: KafkaEventSourceProps) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            bootstrap_servers: bootstrap_servers.into_iter().map(Into::into).collect(),
            vpc: None,
            vpc_subnets: None,
            security_group: None,
            authentication_method: AuthenticationMethod::default(),
            root_ca_certificate: None,
            source,
        }
    }

    pub fn with_vpc(mut self, vpc: Arc<dyn Vpc>) -> Self {
        self.vpc = Some(vpc);
        self
    }

    pub fn with_vpc_subnets(mut self, selection: SubnetSelection) -> Self {
        self.vpc_subnets = Some(selection);
        self
    }

    pub fn with_security_group(mut self, group: SecurityGroupRef) -> Self {
        self.security_group = Some(group);
        self
    }

    pub fn with_authentication_method(mut self, method: AuthenticationMethod) -> Self {
        self.authentication_method = method;
        self
    }

    pub fn with_root_ca_certificate(mut self, secret: SecretRef) -> Self {
        self.root_ca_certificate = Some(secret);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn consumer_group_id_rules() {
        let ok = KafkaEventSourceProps::new("orders").with_consumer_group_id("group-a/b:c@d");
        assert!(ok.validate().is_ok());

        let empty = KafkaEventSourceProps::new("orders").with_consumer_group_id("");
        assert!(format!("{}", empty.validate().expect_err("empty")).contains("between 1 and 200"));

        let long = KafkaEventSourceProps::new("orders").with_consumer_group_id("g".repeat(201));
        assert!(long.validate().is_err());

        let bad = KafkaEventSourceProps::new("orders").with_consumer_group_id("group a");
        assert!(format!("{}", bad.validate().expect_err("space")).contains("invalid characters"));
    }

    #[test]
    fn topic_must_be_present() {
        let err = KafkaEventSourceProps::new("  ")
            .validate()
            .expect_err("blank topic");
        assert!(format!("{err}").contains("kafka.topic"));
        assert!(
            KafkaEventSourceProps::new("t".repeat(250))
                .validate()
                .is_err()
        );
    }

    #[test]
    fn filter_encryption_needs_filters() {
        let key = KmsKeyRef::new("arn:aws:kms:us-east-1:1:key/k");
        let without = KafkaEventSourceProps::new("orders").with_filter_encryption(key.clone());
        let err = without.validate().expect_err("no filters");
        assert!(format!("{err}").contains("filter criteria"));

        let with = KafkaEventSourceProps::new("orders")
            .with_filter(json!({"value": {"kind": ["a"]}}))
            .with_filter_encryption(key);
        assert!(with.validate().is_ok());
    }

    #[test]
    fn self_managed_defaults_to_scram_512() {
        let props = SelfManagedKafkaProps::new(["b1:9092"], KafkaEventSourceProps::new("orders"));
        assert_eq!(props.authentication_method, AuthenticationMethod::SaslScram512Auth);
        assert_eq!(props.bootstrap_servers, vec!["b1:9092".to_string()]);
    }
}
