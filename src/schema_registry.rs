//! Schema registry settings for Kafka mappings.

use serde::{Deserialize, Serialize};

use crate::error::{BindError, BindResult};
use crate::iam::PolicyStatement;
use crate::resources::SecretRef;
use crate::target::EventSourceTarget;

pub const GLUE_REGISTRY_ACTIONS: [&str; 2] = ["glue:GetRegistry", "glue:GetSchemaVersion"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventRecordFormat {
    #[serde(rename = "JSON")]
    Json,
    #[serde(rename = "SOURCE")]
    Source,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaValidationAttribute {
    #[serde(rename = "KEY")]
    Key,
    #[serde(rename = "VALUE")]
    Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryAuthenticationType {
    #[serde(rename = "BASIC_AUTH")]
    BasicAuth,
    #[serde(rename = "CLIENT_CERTIFICATE_TLS_AUTH")]
    ClientCertificateTlsAuth,
    #[serde(rename = "SERVER_ROOT_CA_CERTIFICATE")]
    ServerRootCaCertificate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryAccess {
    #[serde(rename = "type")]
    pub kind: RegistryAuthenticationType,
    pub secret: SecretRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SchemaRegistry {
    Confluent {
        uri: String,
        #[serde(default)]
        authentication: Vec<RegistryAccess>,
    },
    Glue {
        registry_arn: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRegistryConfig {
    pub registry: SchemaRegistry,
    pub event_record_format: EventRecordFormat,
    pub schema_validation_configs: Vec<SchemaValidationAttribute>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryAccessConfig {
    #[serde(rename = "type")]
    pub kind: RegistryAuthenticationType,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaValidationConfig {
    pub attribute: SchemaValidationAttribute,
}

/// Registry block as it appears in the mapping payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedSchemaRegistryConfig {
    pub schema_registry_uri: String,
    pub event_record_format: EventRecordFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_configs: Option<Vec<RegistryAccessConfig>>,
    pub schema_validation_configs: Vec<SchemaValidationConfig>,
}

impl SchemaRegistryConfig {
    pub fn confluent(uri: impl Into<String>, event_record_format: EventRecordFormat) -> Self {
        Self {
            registry: SchemaRegistry::Confluent {
                uri: uri.into(),
                authentication: Vec::new(),
            },
            event_record_format,
            schema_validation_configs: vec![SchemaValidationAttribute::Value],
        }
    }

    pub fn glue(registry_arn: impl Into<String>, event_record_format: EventRecordFormat) -> Self {
        Self {
            registry: SchemaRegistry::Glue {
                registry_arn: registry_arn.into(),
            },
            event_record_format,
            schema_validation_configs: vec![SchemaValidationAttribute::Value],
        }
    }

    pub fn with_authentication(
        mut self,
        kind: RegistryAuthenticationType,
        secret: SecretRef,
    ) -> Self {
        if let SchemaRegistry::Confluent { authentication, .. } = &mut self.registry {
            authentication.push(RegistryAccess { kind, secret });
        }
        self
    }

    pub fn with_validation(mut self, attributes: Vec<SchemaValidationAttribute>) -> Self {
        self.schema_validation_configs = attributes;
        self
    }

    pub fn validate(&self) -> BindResult<()> {
        if self.schema_validation_configs.is_empty() {
            return Err(BindError::validation(
                "schema registry requires at least one schema validation attribute",
            ));
        }
        for (i, attr) in self.schema_validation_configs.iter().enumerate() {
            if self.schema_validation_configs[..i].contains(attr) {
                return Err(BindError::validation(format!(
                    "schema validation attribute {attr:?} is listed more than once"
                )));
            }
        }
        match &self.registry {
            SchemaRegistry::Confluent { uri, .. } => {
                if !(uri.starts_with("https://") || uri.starts_with("http://")) {
                    return Err(BindError::validation(format!(
                        "schema registry uri must be an http(s) url, got '{uri}'"
                    )));
                }
            }
            SchemaRegistry::Glue { registry_arn } => {
                if !registry_arn.starts_with("arn:") {
                    return Err(BindError::validation(format!(
                        "glue schema registry must be referenced by arn, got '{registry_arn}'"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Validates the settings and renders the payload block.
    pub fn render(&self) -> BindResult<RenderedSchemaRegistryConfig> {
        self.validate()?;
        let (uri, access_configs) = match &self.registry {
            SchemaRegistry::Confluent {
                uri,
                authentication,
            } => {
                let configs = authentication
                    .iter()
                    .map(|a| RegistryAccessConfig {
                        kind: a.kind,
                        uri: a.secret.arn.clone(),
                    })
                    .collect::<Vec<_>>();
                (uri.clone(), (!configs.is_empty()).then_some(configs))
            }
            SchemaRegistry::Glue { registry_arn } => (registry_arn.clone(), None),
        };
        Ok(RenderedSchemaRegistryConfig {
            schema_registry_uri: uri,
            event_record_format: self.event_record_format,
            access_configs,
            schema_validation_configs: self
                .schema_validation_configs
                .iter()
                .map(|attribute| SchemaValidationConfig {
                    attribute: *attribute,
                })
                .collect(),
        })
    }

    /// Grants the target read access to the registry.
    pub fn grant(&self, target: &mut dyn EventSourceTarget) {
        match &self.registry {
            SchemaRegistry::Confluent { authentication, .. } => {
                for access in authentication {
                    access.secret.grant_read(target);
                }
            }
            SchemaRegistry::Glue { registry_arn } => {
                target.add_to_role_policy(PolicyStatement::allow(
                    GLUE_REGISTRY_ACTIONS,
                    [registry_arn.clone(), "*".to_string()],
                ));
            }
        }
    }
}
