//! References to resources owned by other providers: secrets, KMS keys,
//! security groups and VPC subnets.
//!
//! The crate never creates these; it only reads their identifiers and asks
//! them to grant permissions to the bound function.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::{BindError, BindResult};
use crate::iam::{KMS_DECRYPT_ACTIONS, PolicyStatement, SECRET_READ_ACTIONS};
use crate::target::EventSourceTarget;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KmsKeyRef {
    pub arn: String,
}

impl KmsKeyRef {
    pub fn new(arn: impl Into<String>) -> Self {
        Self { arn: arn.into() }
    }

    pub fn grant_decrypt(&self, grantee: &mut dyn EventSourceTarget) {
        grantee.add_to_role_policy(PolicyStatement::allow(
            KMS_DECRYPT_ACTIONS,
            [self.arn.clone()],
        ));
    }
}

/// A stored credential (SASL user/password, client certificate or root CA).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRef {
    pub arn: String,
    #[serde(default)]
    pub encryption_key: Option<KmsKeyRef>,
}

impl SecretRef {
    pub fn new(arn: impl Into<String>) -> Self {
        Self {
            arn: arn.into(),
            encryption_key: None,
        }
    }

    pub fn with_encryption_key(mut self, key: KmsKeyRef) -> Self {
        self.encryption_key = Some(key);
        self
    }

    /// Lets the grantee read the secret value, and decrypt it when the secret
    /// is encrypted with a customer managed key.
    pub fn grant_read(&self, grantee: &mut dyn EventSourceTarget) {
        grantee.add_to_role_policy(PolicyStatement::allow(
            SECRET_READ_ACTIONS,
            [self.arn.clone()],
        ));
        if let Some(key) = &self.encryption_key {
            key.grant_decrypt(grantee);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupRef {
    pub id: String,
}

impl SecurityGroupRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubnetType {
    PrivateWithEgress,
    PrivateIsolated,
    Public,
}

/// Which subnets of a VPC the mapping's pollers are placed in.
///
/// `subnet_ids` and `subnet_type` are mutually exclusive; when neither is
/// given the VPC picks its default subnet group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubnetSelection {
    pub subnet_type: Option<SubnetType>,
    pub subnet_ids: Option<Vec<String>>,
    pub availability_zones: Option<Vec<String>>,
}

impl SubnetSelection {
    pub fn of_type(subnet_type: SubnetType) -> Self {
        Self {
            subnet_type: Some(subnet_type),
            ..Self::default()
        }
    }

    pub fn of_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            subnet_ids: Some(ids.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn in_zones<I, S>(mut self, zones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.availability_zones = Some(zones.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedSubnets {
    pub subnet_ids: Vec<String>,
}

pub trait Vpc: Debug + Send + Sync {
    fn vpc_id(&self) -> &str;

    fn select_subnets(&self, selection: &SubnetSelection) -> BindResult<SelectedSubnets>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subnet {
    pub subnet_id: String,
    pub subnet_type: SubnetType,
    pub availability_zone: String,
}

impl Subnet {
    pub fn new(
        subnet_id: impl Into<String>,
        subnet_type: SubnetType,
        availability_zone: impl Into<String>,
    ) -> Self {
        Self {
            subnet_id: subnet_id.into(),
            subnet_type,
            availability_zone: availability_zone.into(),
        }
    }
}

/// A VPC described by a fixed subnet list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticVpc {
    pub vpc_id: String,
    #[serde(default)]
    pub subnets: Vec<Subnet>,
}

impl StaticVpc {
    pub fn new(vpc_id: impl Into<String>, subnets: Vec<Subnet>) -> Self {
        Self {
            vpc_id: vpc_id.into(),
            subnets,
        }
    }

    fn default_subnet_type(&self) -> Option<SubnetType> {
        [
            SubnetType::PrivateWithEgress,
            SubnetType::PrivateIsolated,
            SubnetType::Public,
        ]
        .into_iter()
        .find(|kind| self.subnets.iter().any(|s| s.subnet_type == *kind))
    }
}

impl Vpc for StaticVpc {
    fn vpc_id(&self) -> &str {
        &self.vpc_id
    }

    fn select_subnets(&self, selection: &SubnetSelection) -> BindResult<SelectedSubnets> {
        if selection.subnet_ids.is_some() && selection.subnet_type.is_some() {
            return Err(BindError::SubnetSelection(
                "only one of subnet_ids and subnet_type can be supplied".into(),
            ));
        }

        let mut chosen: Vec<&Subnet> = match (&selection.subnet_ids, selection.subnet_type) {
            (Some(ids), _) => ids
                .iter()
                .map(|id| {
                    self.subnets
                        .iter()
                        .find(|s| &s.subnet_id == id)
                        .ok_or_else(|| {
                            BindError::SubnetSelection(format!(
                                "subnet '{id}' is not part of vpc '{}'",
                                self.vpc_id
                            ))
                        })
                })
                .collect::<BindResult<Vec<_>>>()?,
            (None, kind) => {
                let Some(kind) = kind.or_else(|| self.default_subnet_type()) else {
                    return Err(BindError::SubnetSelection(format!(
                        "vpc '{}' has no subnets",
                        self.vpc_id
                    )));
                };
                self.subnets
                    .iter()
                    .filter(|s| s.subnet_type == kind)
                    .collect()
            }
        };

        if let Some(zones) = &selection.availability_zones {
            chosen.retain(|s| zones.contains(&s.availability_zone));
        }
        if chosen.is_empty() {
            return Err(BindError::SubnetSelection(format!(
                "there are no subnets matching the selection in vpc '{}'",
                self.vpc_id
            )));
        }

        Ok(SelectedSubnets {
            subnet_ids: chosen.into_iter().map(|s| s.subnet_id.clone()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::InMemoryFunction;

    fn sample_vpc() -> StaticVpc {
        StaticVpc::new(
            "vpc-1",
            vec![
                Subnet::new("subnet-pub-a", SubnetType::Public, "us-east-1a"),
                Subnet::new("subnet-priv-a", SubnetType::PrivateWithEgress, "us-east-1a"),
                Subnet::new("subnet-priv-b", SubnetType::PrivateWithEgress, "us-east-1b"),
                Subnet::new("subnet-iso-a", SubnetType::PrivateIsolated, "us-east-1a"),
            ],
        )
    }

    #[test]
    fn default_selection_prefers_private_subnets() {
        let selected = sample_vpc()
            .select_subnets(&SubnetSelection::default())
            .expect("select");
        assert_eq!(selected.subnet_ids, vec!["subnet-priv-a", "subnet-priv-b"]);
    }

    #[test]
    fn selection_by_type_and_zone() {
        let selection =
            SubnetSelection::of_type(SubnetType::PrivateWithEgress).in_zones(["us-east-1b"]);
        let selected = sample_vpc().select_subnets(&selection).expect("select");
        assert_eq!(selected.subnet_ids, vec!["subnet-priv-b"]);
    }

    #[test]
    fn explicit_ids_keep_caller_order() {
        let selection = SubnetSelection::of_ids(["subnet-iso-a", "subnet-pub-a"]);
        let selected = sample_vpc().select_subnets(&selection).expect("select");
        assert_eq!(selected.subnet_ids, vec!["subnet-iso-a", "subnet-pub-a"]);
    }

    #[test]
    fn unknown_subnet_id_is_rejected() {
        let err = sample_vpc()
            .select_subnets(&SubnetSelection::of_ids(["subnet-zzz"]))
            .expect_err("unknown subnet");
        assert!(format!("{err}").contains("subnet-zzz"));
    }

    #[test]
    fn empty_selection_is_rejected() {
        let selection = SubnetSelection::of_type(SubnetType::Public).in_zones(["us-east-1c"]);
        let err = sample_vpc().select_subnets(&selection).expect_err("nothing matches");
        assert!(format!("{err}").contains("no subnets matching"));
    }

    #[test]
    fn secret_grant_includes_key_decrypt() {
        let mut function = InMemoryFunction::new("Consumer");
        let secret = SecretRef::new("arn:aws:secretsmanager:us-east-1:1:secret:s")
            .with_encryption_key(KmsKeyRef::new("arn:aws:kms:us-east-1:1:key/k"));
        secret.grant_read(&mut function);

        assert!(function.is_granted(
            "secretsmanager:GetSecretValue",
            "arn:aws:secretsmanager:us-east-1:1:secret:s"
        ));
        assert!(function.is_granted("kms:Decrypt", "arn:aws:kms:us-east-1:1:key/k"));
    }
}
