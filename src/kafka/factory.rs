use std::collections::BTreeMap;
use std::str::FromStr;
#[cfg(feature = "self-managed")]
use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::error::{BindError, BindResult};
use crate::kafka::config::KafkaEventSourceProps;
#[cfg(feature = "self-managed")]
use crate::kafka::config::SelfManagedKafkaProps;
#[cfg(feature = "msk")]
use crate::kafka::managed::ManagedKafkaEventSource;
#[cfg(feature = "self-managed")]
use crate::kafka::self_managed::SelfManagedKafkaEventSource;
use crate::mapping::{ProvisionedPollerConfig, StartingPosition};
#[cfg(feature = "self-managed")]
use crate::mapping::AuthenticationMethod;
use crate::resources::{KmsKeyRef, SecretRef};
#[cfg(feature = "self-managed")]
use crate::resources::{SecurityGroupRef, StaticVpc, SubnetSelection};

pub type ParamMap = BTreeMap<String, Value>;

/// A named source declaration with flat parameters, e.g. read from a
/// deployment manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct KafkaSourceSpec {
    pub name: String,
    pub kind: String,
    pub params: ParamMap,
}

/// Describes the parameters a factory accepts and their defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDef {
    pub id: String,
    pub kind: String,
    pub allow_override: Vec<String>,
    pub default_params: ParamMap,
    pub origin: Option<String>,
}

pub trait BinderFactory {
    type Binder;

    fn kind(&self) -> &'static str;

    fn validate_spec(&self, spec: &KafkaSourceSpec) -> BindResult<()>;

    fn build(&self, spec: &KafkaSourceSpec) -> BindResult<Self::Binder>;

    fn source_def(&self) -> SourceDef;
}

const COMMON_KEYS: [&str; 13] = [
    "topic",
    "secret",
    "consumer_group_id",
    "starting_position",
    "starting_position_timestamp",
    "batch_size",
    "max_batching_window_secs",
    "enabled",
    "provisioned_pollers",
    "filters",
    "filter_encryption_key",
    "on_failure",
    "schema_registry",
];

fn build_common_props(params: &ParamMap) -> BindResult<KafkaEventSourceProps> {
    let topic = parse_required_string(params.get("topic"), "kafka.topic")?;
    let mut props = KafkaEventSourceProps::new(topic);
    props.secret = parse_secret(params.get("secret"), "kafka.secret")?;
    props.consumer_group_id =
        parse_optional_string(params.get("consumer_group_id"), "kafka.consumer_group_id")?;
    props.stream.starting_position = parse_optional_string(
        params.get("starting_position"),
        "kafka.starting_position",
    )?
    .map(|raw| StartingPosition::from_str(&raw))
    .transpose()?;
    props.stream.starting_position_timestamp = parse_timestamp(
        params.get("starting_position_timestamp"),
        "kafka.starting_position_timestamp",
    )?;
    props.stream.batch_size = parse_positive_u32(params.get("batch_size"), "kafka.batch_size")?;
    props.stream.max_batching_window = parse_positive_u32(
        params.get("max_batching_window_secs"),
        "kafka.max_batching_window_secs",
    )?
    .map(|secs| Duration::from_secs(u64::from(secs)));
    if let Some(enabled) = parse_bool(params.get("enabled"), "kafka.enabled")? {
        props.stream.enabled = enabled;
    }
    props.stream.provisioned_poller_config = parse_object::<ProvisionedPollerConfig>(
        params.get("provisioned_pollers"),
        "kafka.provisioned_pollers",
    )?;
    props.stream.filters = parse_filters(params.get("filters"))?;
    props.filter_encryption = parse_optional_string(
        params.get("filter_encryption_key"),
        "kafka.filter_encryption_key",
    )?
    .map(KmsKeyRef::new);
    props.on_failure = parse_object(params.get("on_failure"), "kafka.on_failure")?;
    props.schema_registry = parse_object(params.get("schema_registry"), "kafka.schema_registry")?;
    Ok(props)
}

#[cfg(feature = "msk")]
fn build_managed_source_from_spec(
    spec: &KafkaSourceSpec,
) -> BindResult<ManagedKafkaEventSource> {
    let cluster_arn = parse_required_string(spec.params.get("cluster_arn"), "kafka.cluster_arn")?;
    let props = build_common_props(&spec.params)?;
    Ok(ManagedKafkaEventSource::new(cluster_arn, props))
}

#[cfg(feature = "self-managed")]
fn build_self_managed_props_from_spec(
    spec: &KafkaSourceSpec,
) -> BindResult<SelfManagedKafkaProps> {
    let servers = parse_string_list(
        spec.params.get("bootstrap_servers"),
        "kafka.bootstrap_servers",
    )?;
    let mut props = SelfManagedKafkaProps::new(servers, build_common_props(&spec.params)?);
    if let Some(vpc) = parse_object::<StaticVpc>(spec.params.get("vpc"), "kafka.vpc")? {
        props.vpc = Some(Arc::new(vpc));
    }
    props.vpc_subnets =
        parse_object::<SubnetSelection>(spec.params.get("vpc_subnets"), "kafka.vpc_subnets")?;
    props.security_group =
        parse_optional_string(spec.params.get("security_group"), "kafka.security_group")?
            .map(SecurityGroupRef::new);
    if let Some(raw) = parse_optional_string(
        spec.params.get("authentication_method"),
        "kafka.authentication_method",
    )? {
        props.authentication_method = AuthenticationMethod::from_str(&raw)?;
    }
    props.root_ca_certificate =
        parse_secret(spec.params.get("root_ca_certificate"), "kafka.root_ca_certificate")?;
    Ok(props)
}

fn parse_required_string(value: Option<&Value>, field: &str) -> BindResult<String> {
    if let Some(Value::String(raw)) = value {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(BindError::validation(format!("{field} must not be empty")));
        }
        return Ok(trimmed.to_string());
    }
    Err(BindError::validation(format!("{field} must not be empty")))
}

fn parse_optional_string(value: Option<&Value>, field: &str) -> BindResult<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                Ok(None)
            } else {
                Ok(Some(trimmed.to_string()))
            }
        }
        Some(_) => Err(BindError::validation(format!("{field} must be a string"))),
    }
}

#[cfg_attr(not(feature = "self-managed"), allow(dead_code))]
fn parse_string_list(value: Option<&Value>, field: &str) -> BindResult<Vec<String>> {
    let items = match value {
        Some(Value::String(raw)) => raw
            .split(',')
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .map(|item| item.to_string())
            .collect::<Vec<_>>(),
        Some(Value::Array(values)) => {
            let mut items = Vec::new();
            for value in values {
                let Some(raw) = value.as_str() else {
                    return Err(BindError::validation(format!(
                        "{field} entries must be strings"
                    )));
                };
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    continue;
                }
                items.push(trimmed.to_string());
            }
            items
        }
        Some(_) => {
            return Err(BindError::validation(format!(
                "{field} must be a string or array"
            )));
        }
        None => Vec::new(),
    };
    if items.is_empty() {
        return Err(BindError::validation(format!("{field} must not be empty")));
    }
    Ok(items)
}

fn parse_positive_u32(value: Option<&Value>, field: &str) -> BindResult<Option<u32>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => {
            let i = v
                .as_i64()
                .ok_or_else(|| BindError::validation(format!("{field} must be an integer")))?;
            if i <= 0 {
                return Err(BindError::validation(format!("{field} must be > 0")));
            }
            u32::try_from(i)
                .map(Some)
                .map_err(|_| BindError::validation(format!("{field} is out of range")))
        }
    }
}

fn parse_bool(value: Option<&Value>, field: &str) -> BindResult<Option<bool>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(BindError::validation(format!("{field} must be a boolean"))),
    }
}

/// Epoch seconds, or an RFC 3339 string.
fn parse_timestamp(value: Option<&Value>, field: &str) -> BindResult<Option<f64>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_f64()
            .filter(|secs| *secs >= 0.0)
            .map(Some)
            .ok_or_else(|| BindError::validation(format!("{field} must be a non-negative number"))),
        Some(Value::String(raw)) => DateTime::parse_from_rfc3339(raw.trim())
            .map(|at| Some(at.timestamp_millis() as f64 / 1000.0))
            .map_err(|err| {
                BindError::validation(format!("{field} is not an RFC 3339 timestamp: {err}"))
            }),
        Some(_) => Err(BindError::validation(format!(
            "{field} must be a number or string"
        ))),
    }
}

/// Secrets are given by ARN or as `{ "arn": .., "encryption_key": { "arn": .. } }`.
fn parse_secret(value: Option<&Value>, field: &str) -> BindResult<Option<SecretRef>> {
    match value {
        Some(Value::String(_)) => Ok(parse_optional_string(value, field)?.map(SecretRef::new)),
        other => parse_object::<SecretRef>(other, field),
    }
}

fn parse_filters(value: Option<&Value>) -> BindResult<Vec<Value>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(pattern @ Value::Object(_)) => Ok(vec![pattern.clone()]),
        Some(Value::String(raw)) => {
            let pattern: Value = serde_json::from_str(raw).map_err(|err| {
                BindError::validation(format!("kafka.filters is not a json pattern: {err}"))
            })?;
            parse_filters(Some(&pattern))
        }
        Some(Value::Array(values)) => {
            let mut filters = Vec::new();
            for value in values {
                if !value.is_object() {
                    return Err(BindError::validation(
                        "kafka.filters entries must be objects",
                    ));
                }
                filters.push(value.clone());
            }
            Ok(filters)
        }
        Some(_) => Err(BindError::validation(
            "kafka.filters must be an object, array or json string",
        )),
    }
}

fn parse_object<T: DeserializeOwned>(value: Option<&Value>, field: &str) -> BindResult<Option<T>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) => serde_json::from_value(v.clone())
            .map(Some)
            .map_err(|err| BindError::validation(format!("{field} is invalid: {err}"))),
    }
}

fn allow_override(specific: &[&str]) -> Vec<String> {
    specific
        .iter()
        .chain(COMMON_KEYS.iter())
        .map(|key| key.to_string())
        .collect()
}

#[cfg(feature = "msk")]
pub struct ManagedKafkaSourceFactory;

#[cfg(feature = "msk")]
impl BinderFactory for ManagedKafkaSourceFactory {
    type Binder = ManagedKafkaEventSource;

    fn kind(&self) -> &'static str {
        "msk"
    }

    fn validate_spec(&self, spec: &KafkaSourceSpec) -> BindResult<()> {
        build_managed_source_from_spec(spec)?;
        Ok(())
    }

    fn build(&self, spec: &KafkaSourceSpec) -> BindResult<ManagedKafkaEventSource> {
        let source = build_managed_source_from_spec(spec)?;
        log::info!(
            "[kafka] source '{}' ({}) -> topic {} on {}",
            spec.name,
            spec.kind,
            source.props().topic,
            source.cluster_arn()
        );
        Ok(source)
    }

    fn source_def(&self) -> SourceDef {
        SourceDef {
            id: "msk_src".into(),
            kind: self.kind().into(),
            allow_override: allow_override(&["cluster_arn"]),
            default_params: kafka_source_defaults(),
            origin: Some("kafka-event-sources:msk_source".into()),
        }
    }
}

#[cfg(feature = "self-managed")]
pub struct SelfManagedKafkaSourceFactory;

#[cfg(feature = "self-managed")]
impl BinderFactory for SelfManagedKafkaSourceFactory {
    type Binder = SelfManagedKafkaEventSource;

    fn kind(&self) -> &'static str {
        "kafka"
    }

    fn validate_spec(&self, spec: &KafkaSourceSpec) -> BindResult<()> {
        self.build(spec)?;
        Ok(())
    }

    fn build(&self, spec: &KafkaSourceSpec) -> BindResult<SelfManagedKafkaEventSource> {
        let props = build_self_managed_props_from_spec(spec)?;
        log::info!(
            "[kafka] source '{}' ({}) -> topic {} on {:?}",
            spec.name,
            spec.kind,
            props.source.topic,
            props.bootstrap_servers
        );
        SelfManagedKafkaEventSource::new(props)
    }

    fn source_def(&self) -> SourceDef {
        let mut defaults = kafka_source_defaults();
        defaults.insert("bootstrap_servers".into(), json!("localhost:9092"));
        defaults.insert("authentication_method".into(), json!("SASL_SCRAM_512_AUTH"));
        SourceDef {
            id: "kafka_src".into(),
            kind: self.kind().into(),
            allow_override: allow_override(&[
                "bootstrap_servers",
                "vpc",
                "vpc_subnets",
                "security_group",
                "authentication_method",
                "root_ca_certificate",
            ]),
            default_params: defaults,
            origin: Some("kafka-event-sources:kafka_source".into()),
        }
    }
}

// topic 无默认值，必须在 KafkaSourceSpec 参数中给出
fn kafka_source_defaults() -> ParamMap {
    let mut params = ParamMap::new();
    params.insert("starting_position".into(), json!("LATEST"));
    params.insert("batch_size".into(), json!(100));
    params.insert("enabled".into(), json!(true));
    params
}
