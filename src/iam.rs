//! Role policy statements granted to the bound function.

use serde::{Deserialize, Serialize};

/// Managed policy attached to the execution role of functions consuming from MSK.
pub const MSK_EXECUTION_ROLE_POLICY: &str = "service-role/AWSLambdaMSKExecutionRole";

pub const MSK_CLUSTER_ACTIONS: [&str; 3] = [
    "kafka:DescribeCluster",
    "kafka:GetBootstrapBrokers",
    "kafka:ListScramSecrets",
];

pub const SECRET_READ_ACTIONS: [&str; 2] = [
    "secretsmanager:GetSecretValue",
    "secretsmanager:DescribeSecret",
];

pub const KMS_DECRYPT_ACTIONS: [&str; 1] = ["kms:Decrypt"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub effect: Effect,
    #[serde(rename = "Action")]
    pub actions: Vec<String>,
    #[serde(rename = "Resource")]
    pub resources: Vec<String>,
}

impl PolicyStatement {
    pub fn allow<A, R>(actions: A, resources: R) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            effect: Effect::Allow,
            actions: actions.into_iter().map(Into::into).collect(),
            resources: resources.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allows(&self, action: &str, resource: &str) -> bool {
        self.effect == Effect::Allow
            && self.actions.iter().any(|a| a == action)
            && self.resources.iter().any(|r| r == resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_serializes_in_policy_document_shape() {
        let st = PolicyStatement::allow(MSK_CLUSTER_ACTIONS, ["arn:aws:kafka:cluster/a"]);
        let v = serde_json::to_value(&st).expect("serialize");
        assert_eq!(v["Effect"], "Allow");
        assert_eq!(v["Action"][1], "kafka:GetBootstrapBrokers");
        assert_eq!(v["Resource"][0], "arn:aws:kafka:cluster/a");
        assert!(st.allows("kafka:ListScramSecrets", "arn:aws:kafka:cluster/a"));
        assert!(!st.allows("kafka:ListScramSecrets", "arn:other"));
    }
}
