use crate::mapping::{
    AuthenticationMethod, SourceAccessConfiguration, SourceAccessConfigurationType,
};
use crate::resources::{SecretRef, SecurityGroupRef};

/// MSK only supports SASL/SCRAM-512 secrets; no secret means no list at all.
pub(crate) fn managed_access_configurations(
    secret: Option<&SecretRef>,
) -> Option<Vec<SourceAccessConfiguration>> {
    secret.map(|secret| {
        vec![SourceAccessConfiguration::new(
            SourceAccessConfigurationType::SaslScram512Auth,
            secret.arn.clone(),
        )]
    })
}

/// Network entries for a VPC-placed self-managed cluster.
pub(crate) struct VpcPlacement<'a> {
    pub security_group: &'a SecurityGroupRef,
    pub subnet_ids: &'a [String],
}

/// Entries are ordered credential, root CA, security group, subnets.
pub(crate) fn self_managed_access_configurations(
    authentication_method: AuthenticationMethod,
    secret: Option<&SecretRef>,
    root_ca_certificate: Option<&SecretRef>,
    placement: Option<VpcPlacement<'_>>,
) -> Option<Vec<SourceAccessConfiguration>> {
    let mut entries = Vec::new();
    if let Some(secret) = secret {
        entries.push(SourceAccessConfiguration::new(
            authentication_method.access_type(),
            secret.arn.clone(),
        ));
    }
    if let Some(root_ca) = root_ca_certificate {
        entries.push(SourceAccessConfiguration::new(
            SourceAccessConfigurationType::ServerRootCaCertificate,
            root_ca.arn.clone(),
        ));
    }
    if let Some(placement) = placement {
        entries.push(SourceAccessConfiguration::new(
            SourceAccessConfigurationType::VpcSecurityGroup,
            format!("security_group:{}", placement.security_group.id),
        ));
        for subnet_id in placement.subnet_ids {
            entries.push(SourceAccessConfiguration::new(
                SourceAccessConfigurationType::VpcSubnet,
                format!("subnet:{subnet_id}"),
            ));
        }
    }
    (!entries.is_empty()).then_some(entries)
}
