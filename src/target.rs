use log::debug;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{BindError, BindResult};
use crate::iam::PolicyStatement;
use crate::mapping::EventSourceMappingOptions;

/// Identity of an attached event source mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingRef {
    pub id: String,
    pub arn: String,
}

/// The function an event source is bound to.
pub trait EventSourceTarget {
    /// Unique id of the function's node in the construct tree, `None` when the
    /// target cannot own child resources.
    fn node_id(&self) -> Option<&str>;

    /// Attaches a mapping under `id`. Implementations reject an id that is
    /// already attached.
    fn add_event_source_mapping(
        &mut self,
        id: &str,
        options: &EventSourceMappingOptions,
    ) -> BindResult<MappingRef>;

    fn add_to_role_policy(&mut self, statement: PolicyStatement);

    fn add_managed_policy(&mut self, policy_name: &str);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordedMapping {
    pub id: String,
    pub arn: String,
    pub options: EventSourceMappingOptions,
}

/// In-process function target.
///
/// Records everything bound to it, which makes it usable as a dry-run
/// synthesizer: `to_document` renders the collected state as JSON.
#[derive(Debug, Clone, Serialize)]
pub struct InMemoryFunction {
    name: String,
    region: String,
    account: String,
    #[serde(skip)]
    attachable: bool,
    mappings: Vec<RecordedMapping>,
    statements: Vec<PolicyStatement>,
    managed_policies: Vec<String>,
}

impl InMemoryFunction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: "us-east-1".into(),
            account: "123456789012".into(),
            attachable: true,
            mappings: Vec::new(),
            statements: Vec::new(),
            managed_policies: Vec::new(),
        }
    }

    /// A target without a construct node; binding to it fails.
    pub fn detached(name: impl Into<String>) -> Self {
        Self {
            attachable: false,
            ..Self::new(name)
        }
    }

    pub fn with_env(mut self, region: impl Into<String>, account: impl Into<String>) -> Self {
        self.region = region.into();
        self.account = account.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mappings(&self) -> &[RecordedMapping] {
        &self.mappings
    }

    pub fn mapping(&self, id: &str) -> Option<&RecordedMapping> {
        self.mappings.iter().find(|m| m.id == id)
    }

    pub fn statements(&self) -> &[PolicyStatement] {
        &self.statements
    }

    pub fn managed_policies(&self) -> &[String] {
        &self.managed_policies
    }

    pub fn is_granted(&self, action: &str, resource: &str) -> bool {
        self.statements.iter().any(|s| s.allows(action, resource))
    }

    pub fn to_document(&self) -> BindResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    // Mapping uuids are derived from the function name and the mapping id so
    // repeated synthesis yields identical documents.
    fn mapping_arn(&self, id: &str) -> String {
        let digest = format!(
            "{:x}",
            Sha256::digest(format!("{}/{}", self.name, id).as_bytes())
        );
        format!(
            "arn:aws:lambda:{}:{}:event-source-mapping:{}-{}-{}-{}-{}",
            self.region,
            self.account,
            &digest[0..8],
            &digest[8..12],
            &digest[12..16],
            &digest[16..20],
            &digest[20..32],
        )
    }
}

impl EventSourceTarget for InMemoryFunction {
    fn node_id(&self) -> Option<&str> {
        self.attachable.then_some(self.name.as_str())
    }

    fn add_event_source_mapping(
        &mut self,
        id: &str,
        options: &EventSourceMappingOptions,
    ) -> BindResult<MappingRef> {
        if self.mapping(id).is_some() {
            return Err(BindError::target(
                "event source mapping",
                format!("there is already a construct with name '{id}' in '{}'", self.name),
            ));
        }
        let arn = self.mapping_arn(id);
        debug!("[function] {} attach mapping {id} -> {arn}", self.name);
        self.mappings.push(RecordedMapping {
            id: id.to_string(),
            arn: arn.clone(),
            options: options.clone(),
        });
        Ok(MappingRef {
            id: id.to_string(),
            arn,
        })
    }

    fn add_to_role_policy(&mut self, statement: PolicyStatement) {
        if !self.statements.contains(&statement) {
            self.statements.push(statement);
        }
    }

    fn add_managed_policy(&mut self, policy_name: &str) {
        if !self.managed_policies.iter().any(|p| p == policy_name) {
            self.managed_policies.push(policy_name.to_string());
        }
    }
}
