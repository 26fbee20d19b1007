use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::types::{McpError, ResourceContent, ToolResult};

/// Handler trait for tools. Implement this or wrap a closure in
/// [`FnToolHandler`].
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: Value) -> Result<ToolResult, McpError>;
}

/// Handler trait for resources. Receives the resolved URI and the
/// placeholder values extracted from the matching template (empty for
/// literal resources).
#[async_trait]
pub trait ResourceHandler: Send + Sync {
    async fn call(
        &self,
        uri: &str,
        vars: &HashMap<String, String>,
    ) -> Result<ResourceContent, McpError>;
}

/// Wraps an async closure into a ToolHandler.
pub struct FnToolHandler<F> {
    f: F,
}

impl<F, Fut> FnToolHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<ToolResult, McpError>> + Send + 'static,
{
    pub fn new(f: F) -> Arc<dyn ToolHandler> {
        Arc::new(Self { f })
    }
}

#[async_trait]
impl<F, Fut> ToolHandler for FnToolHandler<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<ToolResult, McpError>> + Send + 'static,
{
    async fn call(&self, args: Value) -> Result<ToolResult, McpError> {
        (self.f)(args).await
    }
}

// ── Definitions ──

/// Primitive parameter types a tool can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Number,
    String,
}

impl ParamType {
    pub fn type_name(self) -> &'static str {
        match self {
            ParamType::Number => "number",
            ParamType::String => "string",
        }
    }
}

/// A registered tool: name, parameter schema, and handler. Immutable after
/// registration.
pub struct Tool {
    pub name: String,
    pub description: String,
    pub params: Vec<(String, ParamType)>,
    pub handler: Arc<dyn ToolHandler>,
}

impl Tool {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        params: &[(&str, ParamType)],
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Tool {
            name: name.into(),
            description: description.into(),
            params: params.iter().map(|(n, t)| (n.to_string(), *t)).collect(),
            handler,
        }
    }

    /// Wire-facing descriptor for `listTools`.
    pub fn descriptor(&self) -> Value {
        let mut parameters = serde_json::Map::new();
        for (name, ty) in &self.params {
            parameters.insert(name.clone(), json!({"type": ty.type_name()}));
        }
        json!({
            "name": self.name,
            "description": self.description,
            "parameters": parameters,
        })
    }
}

/// A registered resource: name, locator (literal URI or template), handler.
pub struct Resource {
    pub name: String,
    pub description: String,
    pub locator: Locator,
    pub handler: Arc<dyn ResourceHandler>,
}

impl Resource {
    /// Wire-facing descriptor for `listResources`. Literal and templated
    /// locators both report under `uriTemplate`.
    pub fn descriptor(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "uriTemplate": self.locator.as_str(),
        })
    }
}

/// Where a resource lives: an exact URI, or a template with `{placeholders}`.
pub enum Locator {
    Literal(String),
    Template(UriTemplate),
}

impl Locator {
    /// Parse a locator string; it is a template iff it contains a placeholder.
    pub fn parse(s: &str) -> Self {
        if s.contains('{') {
            Locator::Template(UriTemplate::parse(s))
        } else {
            Locator::Literal(s.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Locator::Literal(s) => s,
            Locator::Template(t) => &t.raw,
        }
    }
}

/// A URI template like `greeting://{name}`: literal runs interleaved with
/// named placeholders. A placeholder captures up to the next literal run,
/// or to the end of the URI when it is last.
pub struct UriTemplate {
    pub raw: String,
    segments: Vec<Segment>,
}

enum Segment {
    Literal(String),
    Var(String),
}

impl UriTemplate {
    pub fn parse(raw: &str) -> Self {
        let mut segments = Vec::new();
        let mut rest = raw;
        while let Some(open) = rest.find('{') {
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            match rest[open..].find('}') {
                Some(close) => {
                    segments.push(Segment::Var(rest[open + 1..open + close].to_string()));
                    rest = &rest[open + close + 1..];
                }
                None => {
                    // Unterminated brace: treat the remainder as literal.
                    segments.push(Segment::Literal(rest[open..].to_string()));
                    rest = "";
                }
            }
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }
        UriTemplate {
            raw: raw.to_string(),
            segments,
        }
    }

    /// Structural match: returns the placeholder bindings, or None.
    pub fn matches(&self, uri: &str) -> Option<HashMap<String, String>> {
        let mut vars = HashMap::new();
        let mut rest = uri;
        let mut iter = self.segments.iter().peekable();
        while let Some(seg) = iter.next() {
            match seg {
                Segment::Literal(lit) => {
                    rest = rest.strip_prefix(lit.as_str())?;
                }
                Segment::Var(name) => {
                    let captured = match iter.peek() {
                        Some(Segment::Literal(next)) => {
                            let at = rest.find(next.as_str())?;
                            let (head, tail) = rest.split_at(at);
                            rest = tail;
                            head
                        }
                        // Adjacent placeholders are ambiguous; the first
                        // takes everything and the next matches empty.
                        Some(Segment::Var(_)) | None => {
                            let head = rest;
                            rest = "";
                            head
                        }
                    };
                    vars.insert(name.clone(), captured.to_string());
                }
            }
        }
        if rest.is_empty() {
            Some(vars)
        } else {
            None
        }
    }
}

// ── Registry ──

/// The closed set of tools and resources. Built once at startup, then
/// shared read-only; lookups have no side effects.
#[derive(Default)]
pub struct Registry {
    tools: Vec<Tool>,
    resources: Vec<Resource>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Register a tool. Fails if the name is already taken.
    pub fn register_tool(&mut self, tool: Tool) -> Result<(), McpError> {
        if self.tools.iter().any(|t| t.name == tool.name) {
            return Err(McpError::DuplicateName(tool.name));
        }
        self.tools.push(tool);
        Ok(())
    }

    /// Register a resource. Fails if the name is already taken.
    pub fn register_resource(&mut self, resource: Resource) -> Result<(), McpError> {
        if self.resources.iter().any(|r| r.name == resource.name) {
            return Err(McpError::DuplicateName(resource.name));
        }
        self.resources.push(resource);
        Ok(())
    }

    /// Tools in registration order.
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Resources in registration order.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn lookup_tool(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.name == name)
    }

    /// Resolve a URI: exact literal match first, then templates in
    /// registration order. First match wins.
    pub fn resolve_resource(&self, uri: &str) -> Option<(&Resource, HashMap<String, String>)> {
        for res in &self.resources {
            if let Locator::Literal(lit) = &res.locator {
                if lit == uri {
                    return Some((res, HashMap::new()));
                }
            }
        }
        for res in &self.resources {
            if let Locator::Template(tpl) = &res.locator {
                if let Some(vars) = tpl.matches(uri) {
                    return Some((res, vars));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::text_result;

    fn noop_tool(name: &str) -> Tool {
        Tool::new(
            name,
            "test tool",
            &[("x", ParamType::Number)],
            FnToolHandler::new(|_args| async move { Ok(text_result("ok")) }),
        )
    }

    struct EchoResource;

    #[async_trait]
    impl ResourceHandler for EchoResource {
        async fn call(
            &self,
            uri: &str,
            _vars: &HashMap<String, String>,
        ) -> Result<ResourceContent, McpError> {
            Ok(ResourceContent {
                uri: uri.to_string(),
                text: "body".into(),
            })
        }
    }

    fn resource(name: &str, locator: &str) -> Resource {
        Resource {
            name: name.into(),
            description: "test resource".into(),
            locator: Locator::parse(locator),
            handler: Arc::new(EchoResource),
        }
    }

    #[test]
    fn test_duplicate_tool_rejected() {
        let mut reg = Registry::new();
        reg.register_tool(noop_tool("add")).unwrap();
        let err = reg.register_tool(noop_tool("add")).unwrap_err();
        assert!(matches!(err, McpError::DuplicateName(n) if n == "add"));
    }

    #[test]
    fn test_duplicate_resource_rejected() {
        let mut reg = Registry::new();
        reg.register_resource(resource("docs", "docs://api")).unwrap();
        assert!(reg.register_resource(resource("docs", "docs://other")).is_err());
    }

    #[test]
    fn test_lookup_tool() {
        let mut reg = Registry::new();
        reg.register_tool(noop_tool("add")).unwrap();
        assert!(reg.lookup_tool("add").is_some());
        assert!(reg.lookup_tool("sub").is_none());
    }

    #[test]
    fn test_template_binding() {
        let tpl = UriTemplate::parse("greeting://{name}");
        let vars = tpl.matches("greeting://World").unwrap();
        assert_eq!(vars["name"], "World");
        assert!(tpl.matches("docs://api").is_none());
    }

    #[test]
    fn test_template_empty_capture() {
        let tpl = UriTemplate::parse("greeting://{name}");
        let vars = tpl.matches("greeting://").unwrap();
        assert_eq!(vars["name"], "");
    }

    #[test]
    fn test_template_multi_var() {
        let tpl = UriTemplate::parse("repo://{owner}/{name}");
        let vars = tpl.matches("repo://acme/widgets").unwrap();
        assert_eq!(vars["owner"], "acme");
        assert_eq!(vars["name"], "widgets");
    }

    #[test]
    fn test_literal_wins_over_template() {
        let mut reg = Registry::new();
        reg.register_resource(resource("any", "docs://{page}")).unwrap();
        reg.register_resource(resource("api", "docs://api")).unwrap();
        let (res, vars) = reg.resolve_resource("docs://api").unwrap();
        assert_eq!(res.name, "api");
        assert!(vars.is_empty());
    }

    #[test]
    fn test_template_tie_break_is_registration_order() {
        let mut reg = Registry::new();
        reg.register_resource(resource("first", "x://{a}")).unwrap();
        reg.register_resource(resource("second", "x://{b}")).unwrap();
        let (res, vars) = reg.resolve_resource("x://value").unwrap();
        assert_eq!(res.name, "first");
        assert_eq!(vars["a"], "value");
    }

    #[test]
    fn test_resolve_unknown() {
        let reg = Registry::new();
        assert!(reg.resolve_resource("nope://x").is_none());
    }

    #[test]
    fn test_tool_descriptor_shape() {
        let tool = noop_tool("add");
        let d = tool.descriptor();
        assert_eq!(d["name"], "add");
        assert_eq!(d["parameters"]["x"]["type"], "number");
    }
}
