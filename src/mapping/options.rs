use std::fmt::{Display, Formatter};
use std::str::FromStr;

use educe::Educe;
use serde::{Deserialize, Serialize};

use crate::error::BindError;
use crate::schema_registry::RenderedSchemaRegistryConfig;

/// Where in the stream a new mapping starts reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StartingPosition {
    #[serde(rename = "TRIM_HORIZON")]
    TrimHorizon,
    #[serde(rename = "LATEST")]
    Latest,
    #[serde(rename = "AT_TIMESTAMP")]
    AtTimestamp,
}

impl StartingPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            StartingPosition::TrimHorizon => "TRIM_HORIZON",
            StartingPosition::Latest => "LATEST",
            StartingPosition::AtTimestamp => "AT_TIMESTAMP",
        }
    }
}

impl Display for StartingPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StartingPosition {
    type Err = BindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRIM_HORIZON" | "EARLIEST" => Ok(StartingPosition::TrimHorizon),
            "LATEST" => Ok(StartingPosition::Latest),
            "AT_TIMESTAMP" => Ok(StartingPosition::AtTimestamp),
            other => Err(BindError::validation(format!(
                "invalid starting position: '{other}'; allowed: TRIM_HORIZON,LATEST,AT_TIMESTAMP"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceAccessConfigurationType {
    #[serde(rename = "BASIC_AUTH")]
    BasicAuth,
    #[serde(rename = "VPC_SUBNET")]
    VpcSubnet,
    #[serde(rename = "VPC_SECURITY_GROUP")]
    VpcSecurityGroup,
    #[serde(rename = "SASL_SCRAM_256_AUTH")]
    SaslScram256Auth,
    #[serde(rename = "SASL_SCRAM_512_AUTH")]
    SaslScram512Auth,
    #[serde(rename = "CLIENT_CERTIFICATE_TLS_AUTH")]
    ClientCertificateTlsAuth,
    #[serde(rename = "SERVER_ROOT_CA_CERTIFICATE")]
    ServerRootCaCertificate,
}

impl SourceAccessConfigurationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceAccessConfigurationType::BasicAuth => "BASIC_AUTH",
            SourceAccessConfigurationType::VpcSubnet => "VPC_SUBNET",
            SourceAccessConfigurationType::VpcSecurityGroup => "VPC_SECURITY_GROUP",
            SourceAccessConfigurationType::SaslScram256Auth => "SASL_SCRAM_256_AUTH",
            SourceAccessConfigurationType::SaslScram512Auth => "SASL_SCRAM_512_AUTH",
            SourceAccessConfigurationType::ClientCertificateTlsAuth => {
                "CLIENT_CERTIFICATE_TLS_AUTH"
            }
            SourceAccessConfigurationType::ServerRootCaCertificate => "SERVER_ROOT_CA_CERTIFICATE",
        }
    }
}

/// How a self-managed cluster authenticates the poller.
#[derive(Educe, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[educe(Debug, Default)]
pub enum AuthenticationMethod {
    #[educe(Default)]
    #[serde(rename = "SASL_SCRAM_512_AUTH")]
    SaslScram512Auth,
    #[serde(rename = "SASL_SCRAM_256_AUTH")]
    SaslScram256Auth,
    #[serde(rename = "BASIC_AUTH")]
    BasicAuth,
    #[serde(rename = "CLIENT_CERTIFICATE_TLS_AUTH")]
    ClientCertificateTlsAuth,
}

impl AuthenticationMethod {
    pub fn access_type(self) -> SourceAccessConfigurationType {
        match self {
            AuthenticationMethod::SaslScram512Auth => {
                SourceAccessConfigurationType::SaslScram512Auth
            }
            AuthenticationMethod::SaslScram256Auth => {
                SourceAccessConfigurationType::SaslScram256Auth
            }
            AuthenticationMethod::BasicAuth => SourceAccessConfigurationType::BasicAuth,
            AuthenticationMethod::ClientCertificateTlsAuth => {
                SourceAccessConfigurationType::ClientCertificateTlsAuth
            }
        }
    }
}

impl FromStr for AuthenticationMethod {
    type Err = BindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SASL_SCRAM_512_AUTH" => Ok(AuthenticationMethod::SaslScram512Auth),
            "SASL_SCRAM_256_AUTH" => Ok(AuthenticationMethod::SaslScram256Auth),
            "BASIC_AUTH" => Ok(AuthenticationMethod::BasicAuth),
            "CLIENT_CERTIFICATE_TLS_AUTH" => Ok(AuthenticationMethod::ClientCertificateTlsAuth),
            other => Err(BindError::validation(format!(
                "invalid authentication method: '{other}'; allowed: SASL_SCRAM_512_AUTH,SASL_SCRAM_256_AUTH,BASIC_AUTH,CLIENT_CERTIFICATE_TLS_AUTH"
            ))),
        }
    }
}

/// One credential or network placement entry attached to a mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceAccessConfiguration {
    #[serde(rename = "type")]
    pub kind: SourceAccessConfigurationType,
    pub uri: String,
}

impl SourceAccessConfiguration {
    pub fn new(kind: SourceAccessConfigurationType, uri: impl Into<String>) -> Self {
        Self {
            kind,
            uri: uri.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub filters: Vec<FilterRule>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionedPollerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_pollers: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_pollers: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnFailure {
    pub destination: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationConfig {
    pub on_failure: OnFailure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KafkaEndpoints {
    #[serde(rename = "KAFKA_BOOTSTRAP_SERVERS")]
    pub kafka_bootstrap_servers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfManagedEventSource {
    pub endpoints: KafkaEndpoints,
}

impl SelfManagedEventSource {
    pub fn kafka(bootstrap_servers: Vec<String>) -> Self {
        Self {
            endpoints: KafkaEndpoints {
                kafka_bootstrap_servers: bootstrap_servers,
            },
        }
    }
}

/// Kafka-specific part of the payload, shared by both cluster kinds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KafkaEventSourceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer_group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_registry_config: Option<RenderedSchemaRegistryConfig>,
}

/// The declarative payload submitted to the function when a source binds.
///
/// Absent options are omitted from the serialized form rather than written
/// as `null` or empty lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventSourceMappingOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_source_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_managed_event_source: Option<SelfManagedEventSource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub topics: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starting_position: Option<StartingPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starting_position_timestamp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_batching_window_in_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_criteria: Option<FilterCriteria>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kms_key_arn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_config: Option<DestinationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_access_configurations: Option<Vec<SourceAccessConfiguration>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amazon_managed_kafka_event_source_config: Option<KafkaEventSourceConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub self_managed_kafka_event_source_config: Option<KafkaEventSourceConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioned_poller_config: Option<ProvisionedPollerConfig>,
}
