#![cfg(all(feature = "msk", feature = "self-managed"))]
//! End-to-end binding against the in-memory function: both cluster kinds on
//! one function, rendered to a single document.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Context;
use kafka_event_sources::kafka::{
    BinderFactory, KafkaSourceSpec, ManagedKafkaSourceFactory, SelfManagedKafkaSourceFactory,
};
use kafka_event_sources::mapping::StartingPosition;
use kafka_event_sources::resources::{
    SecretRef, SecurityGroupRef, StaticVpc, Subnet, SubnetSelection, SubnetType,
};
use kafka_event_sources::{
    BindError, InMemoryFunction, KafkaEventSourceProps, ManagedKafkaEventSource,
    SelfManagedKafkaEventSource, SelfManagedKafkaProps,
};
use serde_json::{Value, json};

const CLUSTER_ARN: &str = "arn:aws:kafka:us-east-1:123456789012:cluster/orders/1";
const SECRET_ARN: &str = "arn:aws:secretsmanager:us-east-1:123456789012:secret:AmazonMSK_orders";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn internet_cluster_without_secret_fails_construction() {
    init_logging();
    let props = SelfManagedKafkaProps::new(["b1:9092"], KafkaEventSourceProps::new("orders"));
    let err = SelfManagedKafkaEventSource::new(props).expect_err("must fail");
    assert!(matches!(err, BindError::Validation(_)));
    assert_eq!(
        err.to_string(),
        "secret must be set if Kafka brokers accessed over Internet"
    );
}

#[test]
fn managed_source_with_secret_binds_without_warnings() -> anyhow::Result<()> {
    init_logging();
    let mut function = InMemoryFunction::new("OrdersConsumer");
    let mut source = ManagedKafkaEventSource::new(
        "arn:x",
        KafkaEventSourceProps::new("orders").with_secret(SecretRef::new("arn:secret:S")),
    );
    assert!(source.event_source_mapping_id().is_err());

    source.bind(&mut function)?;

    assert!(source.warnings().is_empty());
    let doc = function.to_document()?;
    let mapping = &doc["mappings"][0];
    assert_eq!(
        mapping["options"]["source_access_configurations"],
        json!([{"type": "SASL_SCRAM_512_AUTH", "uri": "arn:secret:S"}])
    );
    assert_eq!(mapping["id"], Value::from(source.event_source_mapping_id()?));
    assert_eq!(mapping["arn"], Value::from(source.event_source_mapping_arn()?));
    Ok(())
}

#[test]
fn managed_and_self_managed_share_a_function() -> anyhow::Result<()> {
    init_logging();
    let mut function = InMemoryFunction::new("OrdersConsumer");

    let mut managed = ManagedKafkaEventSource::new(
        CLUSTER_ARN,
        KafkaEventSourceProps::new("orders")
            .with_starting_position(StartingPosition::AtTimestamp)
            .with_secret(SecretRef::new(SECRET_ARN)),
    );
    managed.bind(&mut function)?;
    assert_eq!(managed.warnings().len(), 1);

    let vpc = Arc::new(StaticVpc::new(
        "vpc-1",
        vec![
            Subnet::new("subnet-a", SubnetType::PrivateWithEgress, "us-east-1a"),
            Subnet::new("subnet-b", SubnetType::PrivateWithEgress, "us-east-1b"),
        ],
    ));
    let mut self_managed = SelfManagedKafkaEventSource::new(
        SelfManagedKafkaProps::new(["10.0.0.1:9092"], KafkaEventSourceProps::new("orders"))
            .with_vpc(vpc)
            .with_vpc_subnets(SubnetSelection::default())
            .with_security_group(SecurityGroupRef::new("sg-1")),
    )?;
    self_managed.bind(&mut function)?;

    assert_eq!(function.mappings().len(), 2);
    let doc = function.to_document()?;
    let uris: Vec<&str> = doc["mappings"][1]["options"]["source_access_configurations"]
        .as_array()
        .context("self-managed access configurations")?
        .iter()
        .filter_map(|e| e["uri"].as_str())
        .collect();
    assert_eq!(uris, vec!["security_group:sg-1", "subnet:subnet-a", "subnet:subnet-b"]);
    assert_eq!(
        doc["managed_policies"],
        json!(["service-role/AWSLambdaMSKExecutionRole"])
    );
    Ok(())
}

#[test]
fn factories_build_binders_from_flat_params() -> anyhow::Result<()> {
    init_logging();
    let mut function = InMemoryFunction::new("OrdersConsumer");

    let mut msk_params = BTreeMap::new();
    msk_params.insert("cluster_arn".to_string(), json!(CLUSTER_ARN));
    msk_params.insert("topic".to_string(), json!("payments"));
    msk_params.insert("filters".to_string(), json!({"value": {"status": ["failed"]}}));
    msk_params.insert("filter_encryption_key".to_string(), json!("arn:aws:kms:us-east-1:1:key/k"));
    let msk_spec = KafkaSourceSpec {
        name: "payments".into(),
        kind: "msk".into(),
        params: msk_params,
    };
    let mut managed = ManagedKafkaSourceFactory.build(&msk_spec)?;
    managed.bind(&mut function)?;

    let options = &function.mappings()[0].options;
    assert_eq!(options.kms_key_arn.as_deref(), Some("arn:aws:kms:us-east-1:1:key/k"));
    assert_eq!(
        options
            .filter_criteria
            .as_ref()
            .map(|c| c.filters[0].pattern.as_str()),
        Some(r#"{"value":{"status":["failed"]}}"#)
    );
    assert!(function.is_granted("kms:Decrypt", "arn:aws:kms:us-east-1:1:key/k"));

    let mut kafka_params = BTreeMap::new();
    kafka_params.insert("bootstrap_servers".to_string(), json!(["b1:9092", "b2:9092"]));
    kafka_params.insert("topic".to_string(), json!("payments"));
    kafka_params.insert("secret".to_string(), json!(SECRET_ARN));
    kafka_params.insert("authentication_method".to_string(), json!("SASL_SCRAM_256_AUTH"));
    let kafka_spec = KafkaSourceSpec {
        name: "payments_onprem".into(),
        kind: "kafka".into(),
        params: kafka_params,
    };
    SelfManagedKafkaSourceFactory.validate_spec(&kafka_spec)?;
    let mut self_managed = SelfManagedKafkaSourceFactory.build(&kafka_spec)?;
    self_managed.bind(&mut function)?;

    let mapping = function
        .mapping(&self_managed.mapping_id())
        .context("self-managed mapping")?;
    assert_eq!(
        mapping
            .options
            .source_access_configurations
            .as_ref()
            .map(|e| e[0].kind.as_str()),
        Some("SASL_SCRAM_256_AUTH")
    );
    Ok(())
}
