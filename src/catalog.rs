//! The fixed tool/resource catalog this endpoint serves. Part of the
//! external contract: names, schemas, and result texts are stable.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::dispatch::{coerce_number, coerce_string, format_number};
use crate::registry::{
    FnToolHandler, Locator, ParamType, Registry, Resource, ResourceHandler, Tool,
};
use crate::types::{text_result, McpError, ResourceContent};

const DOCS_TEXT: &str = "\
# API Documentation

This MCP server provides the following capabilities:

## Tools
- add: Adds two numbers together
- getWeather: Gets the current weather for a city

## Resources
- greeting://{name}: Get a personalized greeting
- docs://api: This documentation
";

/// Personalized greeting, one placeholder.
struct GreetingResource;

#[async_trait]
impl ResourceHandler for GreetingResource {
    async fn call(
        &self,
        uri: &str,
        vars: &HashMap<String, String>,
    ) -> Result<ResourceContent, McpError> {
        let name = vars.get("name").map(String::as_str).unwrap_or_default();
        Ok(ResourceContent {
            uri: uri.to_string(),
            text: format!("Hello, {}!", name),
        })
    }
}

/// Static API documentation.
struct DocsResource;

#[async_trait]
impl ResourceHandler for DocsResource {
    async fn call(
        &self,
        uri: &str,
        _vars: &HashMap<String, String>,
    ) -> Result<ResourceContent, McpError> {
        Ok(ResourceContent {
            uri: uri.to_string(),
            text: DOCS_TEXT.to_string(),
        })
    }
}

/// Build the registry with the full catalog. Registration order is the
/// order clients see in listTools / listResources.
pub fn build_registry() -> Result<Registry, McpError> {
    let mut registry = Registry::new();

    registry.register_tool(Tool::new(
        "add",
        "Adds two numbers together",
        &[("a", ParamType::Number), ("b", ParamType::Number)],
        FnToolHandler::new(|args: Value| async move {
            let a = coerce_number(args.get("a"));
            let b = coerce_number(args.get("b"));
            Ok(text_result(format_number(a + b)))
        }),
    ))?;

    registry.register_tool(Tool::new(
        "getWeather",
        "Gets the weather for a city",
        &[("city", ParamType::String)],
        FnToolHandler::new(|args: Value| async move {
            let city = coerce_string(args.get("city"));
            Ok(text_result(format!(
                "The weather in {} is currently sunny with a temperature of 72°F.",
                city
            )))
        }),
    ))?;

    registry.register_resource(Resource {
        name: "greeting".into(),
        description: "Get a personalized greeting".into(),
        locator: Locator::parse("greeting://{name}"),
        handler: Arc::new(GreetingResource),
    })?;

    registry.register_resource(Resource {
        name: "docs".into(),
        description: "API documentation".into(),
        locator: Locator::parse("docs://api"),
        handler: Arc::new(DocsResource),
    })?;

    Ok(registry)
}
