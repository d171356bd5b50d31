//! Services the workflow host provides: credentials, node parameters,
//! binary attachments and the continue-on-fail policy.

use crate::api::auth::Credentials;
use crate::api::drive::{BinaryData, JsonObject, LocatorMode, ResourceLocator};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

/// The fixed set of node parameters the dispatcher reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Parameter {
    Operation,
    SiteId,
    DriveId,
    FolderPath,
    File,
    BinaryPropertyName,
    InputBinaryPropertyName,
    FileName,
    FolderName,
}

impl Parameter {
    /// Name of the parameter in the host's node description.
    pub fn name(self) -> &'static str {
        match self {
            Parameter::Operation => "operation",
            Parameter::SiteId => "siteId",
            Parameter::DriveId => "driveId",
            Parameter::FolderPath => "folderPath",
            Parameter::File => "file",
            Parameter::BinaryPropertyName => "binaryPropertyName",
            Parameter::InputBinaryPropertyName => "inputBinaryPropertyName",
            Parameter::FileName => "fileName",
            Parameter::FolderName => "folderName",
        }
    }

    pub fn default_value(self) -> ParameterValue {
        match self {
            Parameter::Operation => ParameterValue::text("list"),
            Parameter::SiteId | Parameter::DriveId => {
                ParameterValue::Locator(ResourceLocator::list(""))
            }
            Parameter::FolderPath => ParameterValue::Locator(ResourceLocator::list("/")),
            Parameter::File => ParameterValue::Locator(ResourceLocator::id("")),
            Parameter::BinaryPropertyName | Parameter::InputBinaryPropertyName => {
                ParameterValue::text("data")
            }
            Parameter::FileName | Parameter::FolderName => ParameterValue::text(""),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Locator(ResourceLocator),
    Text(String),
}

impl ParameterValue {
    pub fn text(value: impl Into<String>) -> Self {
        ParameterValue::Text(value.into())
    }

    /// A bare string where a locator is expected is taken as a list pick.
    pub fn into_locator(self) -> ResourceLocator {
        match self {
            ParameterValue::Locator(locator) => locator,
            ParameterValue::Text(value) => ResourceLocator::new(LocatorMode::List, value),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            ParameterValue::Locator(locator) => locator.value,
            ParameterValue::Text(value) => value,
        }
    }
}

/// Host capabilities available while the node runs.
#[async_trait]
pub trait NodeContext: Send + Sync {
    async fn credentials(&self) -> Result<Credentials>;

    /// The parameter as configured for `item_index`; `None` means unset.
    fn parameter(&self, name: Parameter, item_index: usize) -> Option<ParameterValue>;

    fn continue_on_fail(&self) -> bool;

    fn prepare_binary(&self, data: Vec<u8>, file_name: &str, mime_type: &str) -> BinaryData {
        BinaryData::new(data, file_name, mime_type)
    }
}

pub(crate) fn locator_parameter(
    ctx: &dyn NodeContext,
    name: Parameter,
    item_index: usize,
) -> ResourceLocator {
    ctx.parameter(name, item_index)
        .unwrap_or_else(|| name.default_value())
        .into_locator()
}

pub(crate) fn text_parameter(ctx: &dyn NodeContext, name: Parameter, item_index: usize) -> String {
    ctx.parameter(name, item_index)
        .unwrap_or_else(|| name.default_value())
        .into_text()
}

/// One input item: its JSON payload and named binary attachments.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputItem {
    pub json: JsonObject,
    pub binary: HashMap<String, BinaryData>,
}

impl InputItem {
    pub fn with_binary(mut self, property: impl Into<String>, data: BinaryData) -> Self {
        self.binary.insert(property.into(), data);
        self
    }

    /// The named attachment, or a validation error naming what is missing.
    pub fn assert_binary(&self, property: &str) -> Result<&BinaryData> {
        if self.binary.is_empty() {
            return Err(Error::validation("no binary data exists on item"));
        }
        self.binary.get(property).ok_or_else(|| {
            Error::validation(format!("item has no binary property named {property:?}"))
        })
    }
}

/// In-memory `NodeContext` with fixed credentials and parameters.
#[derive(Clone, Debug)]
pub struct StaticContext {
    credentials: Credentials,
    node_parameters: HashMap<Parameter, ParameterValue>,
    item_parameters: HashMap<(usize, Parameter), ParameterValue>,
    continue_on_fail: bool,
}

impl StaticContext {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            node_parameters: HashMap::new(),
            item_parameters: HashMap::new(),
            continue_on_fail: false,
        }
    }

    /// Applies to every item unless overridden per item.
    pub fn with_parameter(mut self, name: Parameter, value: ParameterValue) -> Self {
        self.node_parameters.insert(name, value);
        self
    }

    pub fn with_item_parameter(
        mut self,
        item_index: usize,
        name: Parameter,
        value: ParameterValue,
    ) -> Self {
        self.item_parameters.insert((item_index, name), value);
        self
    }

    pub fn with_continue_on_fail(mut self, enabled: bool) -> Self {
        self.continue_on_fail = enabled;
        self
    }
}

#[async_trait]
impl NodeContext for StaticContext {
    async fn credentials(&self) -> Result<Credentials> {
        Ok(self.credentials.clone())
    }

    fn parameter(&self, name: Parameter, item_index: usize) -> Option<ParameterValue> {
        self.item_parameters
            .get(&(item_index, name))
            .or_else(|| self.node_parameters.get(&name))
            .cloned()
    }

    fn continue_on_fail(&self) -> bool {
        self.continue_on_fail
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> StaticContext {
        StaticContext::new(Credentials::new("t", "c", "s"))
    }

    #[test]
    fn unset_parameters_fall_back_to_defaults() {
        let ctx = ctx();
        assert_eq!(
            locator_parameter(&ctx, Parameter::FolderPath, 0),
            ResourceLocator::list("/")
        );
        assert_eq!(text_parameter(&ctx, Parameter::BinaryPropertyName, 3), "data");
        assert_eq!(text_parameter(&ctx, Parameter::Operation, 0), "list");
    }

    #[test]
    fn item_overrides_win() {
        let ctx = ctx()
            .with_parameter(Parameter::FolderName, ParameterValue::text("A"))
            .with_item_parameter(1, Parameter::FolderName, ParameterValue::text("B"));
        assert_eq!(text_parameter(&ctx, Parameter::FolderName, 0), "A");
        assert_eq!(text_parameter(&ctx, Parameter::FolderName, 1), "B");
    }

    #[test]
    fn parameter_values_deserialize_from_host_json() {
        let locator: ParameterValue =
            serde_json::from_value(json!({"mode": "path", "value": "/Docs"})).unwrap();
        assert_eq!(locator.into_locator(), ResourceLocator::path("/Docs"));

        let text: ParameterValue = serde_json::from_value(json!("createFolder")).unwrap();
        assert_eq!(text.clone().into_text(), "createFolder");
        assert_eq!(text.into_locator().mode, LocatorMode::List);
    }

    #[test]
    fn missing_binary_is_validation_error() {
        let item = InputItem::default();
        assert_eq!(item.assert_binary("data").unwrap_err().code_str(), "invalid_input");

        let item = InputItem::default().with_binary("other", BinaryData::default());
        let err = item.assert_binary("data").unwrap_err();
        assert!(err.to_string().contains("\"data\""));
        assert!(item.assert_binary("other").is_ok());
    }

    #[test]
    fn parameter_names_match_host_schema() {
        assert_eq!(Parameter::InputBinaryPropertyName.name(), "inputBinaryPropertyName");
        assert_eq!(Parameter::DriveId.name(), "driveId");
    }
}
