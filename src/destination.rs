use serde::{Deserialize, Serialize};

use crate::iam::PolicyStatement;
use crate::mapping::{DestinationConfig, OnFailure};
use crate::target::EventSourceTarget;

/// Where records that fail processing are sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FailureDestination {
    Sqs { queue_arn: String },
    Sns { topic_arn: String },
    S3 { bucket_arn: String },
}

impl FailureDestination {
    pub fn arn(&self) -> &str {
        match self {
            FailureDestination::Sqs { queue_arn } => queue_arn,
            FailureDestination::Sns { topic_arn } => topic_arn,
            FailureDestination::S3 { bucket_arn } => bucket_arn,
        }
    }

    /// Destination block of the mapping.
    pub fn render(&self) -> DestinationConfig {
        DestinationConfig {
            on_failure: OnFailure {
                destination: self.arn().to_string(),
            },
        }
    }

    /// Grants the target write access to the destination.
    pub fn grant(&self, target: &mut dyn EventSourceTarget) {
        let statement = match self {
            FailureDestination::Sqs { queue_arn } => PolicyStatement::allow(
                ["sqs:SendMessage", "sqs:GetQueueAttributes", "sqs:GetQueueUrl"],
                [queue_arn.clone()],
            ),
            FailureDestination::Sns { topic_arn } => {
                PolicyStatement::allow(["sns:Publish"], [topic_arn.clone()])
            }
            FailureDestination::S3 { bucket_arn } => PolicyStatement::allow(
                ["s3:GetBucketLocation", "s3:ListBucket", "s3:PutObject"],
                [bucket_arn.clone(), format!("{bucket_arn}/*")],
            ),
        };
        target.add_to_role_policy(statement);
    }
}
