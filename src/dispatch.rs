use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::registry::{ParamType, Registry, Tool};
use crate::session::SessionStore;
use crate::types::{
    error_response, ok_response, JsonRpcRequest, JsonRpcResponse, ERR_CODE_BAD_REQUEST,
    ERR_CODE_INTERNAL, ERR_CODE_NO_METHOD, SERVER_NAME, SERVER_VERSION,
};
use crate::validate::{classify, RequestMeta, ValidatedRequest, ValidationError};

/// The closed method set. Anything else lands in `Other` and answers
/// method-not-found from the exhaustive match below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Initialize,
    ListTools,
    InvokeTool,
    ListResources,
    FetchResource,
    Other(String),
}

impl Method {
    pub fn parse(s: &str) -> Method {
        match s {
            "initialize" => Method::Initialize,
            "listTools" => Method::ListTools,
            "invokeTool" => Method::InvokeTool,
            "listResources" => Method::ListResources,
            "fetchResource" => Method::FetchResource,
            other => Method::Other(other.to_string()),
        }
    }
}

/// HTTP-equivalent status for a reply. Only the two transport-level
/// rejections leave 200; every other error rides inside the envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyStatus {
    Ok,
    BadRequest,
    NotAcceptable,
}

impl ReplyStatus {
    pub fn as_u16(self) -> u16 {
        match self {
            ReplyStatus::Ok => 200,
            ReplyStatus::BadRequest => 400,
            ReplyStatus::NotAcceptable => 406,
        }
    }
}

/// What the transport adapter sends back: the response envelope, the
/// HTTP-equivalent status, and the outbound session header (absent on
/// transport-level rejections).
#[derive(Debug)]
pub struct Reply {
    pub status: ReplyStatus,
    pub session: Option<String>,
    pub body: JsonRpcResponse,
}

/// Routes a validated envelope to one of the closed set of operations.
/// Stateless between requests: session state lives in the store, and the
/// store lock is never held while a handler runs.
pub struct Dispatcher {
    registry: Arc<Registry>,
    sessions: Arc<SessionStore>,
}

impl Dispatcher {
    pub fn new(registry: Arc<Registry>, sessions: Arc<SessionStore>) -> Self {
        Dispatcher { registry, sessions }
    }

    /// Validate, resolve session state, and execute one request.
    pub async fn handle(&self, body: &[u8], meta: &RequestMeta) -> Reply {
        let validated = match classify(body, meta) {
            Ok(v) => v,
            Err(e) => return rejection(e),
        };

        match validated {
            ValidatedRequest::Init(request) => {
                let token = self.sessions.create();
                tracing::info!(method = %request.method, "initialize");
                let result = json!({
                    "server": {
                        "name": SERVER_NAME,
                        "version": SERVER_VERSION,
                    },
                });
                Reply {
                    status: ReplyStatus::Ok,
                    session: Some(token),
                    body: ok_response(request.id, result),
                }
            }
            ValidatedRequest::Session { token, request } => {
                if !self.sessions.is_valid(&token) {
                    tracing::warn!("request with unknown session token");
                    return Reply {
                        status: ReplyStatus::BadRequest,
                        session: None,
                        body: error_response(
                            Some(Value::Null),
                            ERR_CODE_BAD_REQUEST,
                            "Bad Request: No valid session ID provided",
                        ),
                    };
                }
                let body = route_registry(&self.registry, request).await;
                Reply {
                    status: ReplyStatus::Ok,
                    session: Some(token),
                    body,
                }
            }
        }
    }

    /// Transport-level termination. Idempotent: returns whether a session
    /// was actually removed.
    pub fn terminate(&self, token: Option<&str>) -> bool {
        match token {
            Some(t) => self.sessions.terminate(t),
            None => false,
        }
    }

    /// True when the token names a live session.
    pub fn session_is_valid(&self, token: &str) -> bool {
        self.sessions.is_valid(token)
    }
}

fn rejection(err: ValidationError) -> Reply {
    let body = match err {
        ValidationError::NotAcceptable => error_response(
            Some(Value::Null),
            ERR_CODE_BAD_REQUEST,
            "Not Acceptable: Client must accept application/json",
        ),
        // Parse failures share the internal-error code; there is no
        // parse-specific code in the contract.
        ValidationError::Parse => {
            error_response(Some(Value::Null), ERR_CODE_INTERNAL, "Internal server error")
        }
        ValidationError::BadRequest => error_response(
            Some(Value::Null),
            ERR_CODE_BAD_REQUEST,
            "Bad Request: No valid session ID provided",
        ),
    };
    let status = match err {
        ValidationError::NotAcceptable => ReplyStatus::NotAcceptable,
        ValidationError::Parse => ReplyStatus::Ok,
        ValidationError::BadRequest => ReplyStatus::BadRequest,
    };
    Reply {
        status,
        session: None,
        body,
    }
}

/// Route a session-scoped (or stdio) request against the registry. The
/// `Initialize` arm is deliberately method-not-found here: minting a
/// session is the transport-classified path above, and the stdio binding
/// intercepts initialize before delegating.
pub(crate) async fn route_registry(registry: &Registry, request: JsonRpcRequest) -> JsonRpcResponse {
    let JsonRpcRequest { id, method, params, .. } = request;
    match Method::parse(&method) {
        Method::ListTools => {
            let tools: Vec<Value> = registry.tools().iter().map(Tool::descriptor).collect();
            ok_response(id, json!({ "tools": tools }))
        }
        Method::InvokeTool => invoke_tool(registry, id, params.as_ref()).await,
        Method::ListResources => {
            let resources: Vec<Value> =
                registry.resources().iter().map(|r| r.descriptor()).collect();
            ok_response(id, json!({ "resources": resources }))
        }
        Method::FetchResource => fetch_resource(registry, id, params.as_ref()).await,
        Method::Initialize | Method::Other(_) => {
            tracing::debug!(method = %method, "method not found");
            error_response(id, ERR_CODE_NO_METHOD, "Method not found")
        }
    }
}

async fn invoke_tool(
    registry: &Registry,
    id: Option<Value>,
    params: Option<&Value>,
) -> JsonRpcResponse {
    let name = params
        .and_then(|p| p.get("name"))
        .and_then(|n| n.as_str());
    let tool = match name.and_then(|n| registry.lookup_tool(n)) {
        Some(t) => t,
        // Unknown tool shares the method-not-found code with unknown
        // methods; the two are deliberately not distinguished.
        None => return error_response(id, ERR_CODE_NO_METHOD, "Method not found"),
    };

    let args = coerce_args(tool, params.and_then(|p| p.get("params")));
    match tool.handler.call(args).await {
        Ok(result) => {
            let value = serde_json::to_value(&result).unwrap_or(Value::Null);
            ok_response(id, value)
        }
        Err(e) => {
            tracing::error!(tool = %tool.name, error = %e, "tool handler failed");
            error_response(id, ERR_CODE_INTERNAL, "Internal server error")
        }
    }
}

async fn fetch_resource(
    registry: &Registry,
    id: Option<Value>,
    params: Option<&Value>,
) -> JsonRpcResponse {
    let uri = params.and_then(|p| p.get("uri")).and_then(|u| u.as_str());
    let (resource, vars) = match uri.and_then(|u| registry.resolve_resource(u)) {
        Some(hit) => hit,
        None => return error_response(id, ERR_CODE_NO_METHOD, "Method not found"),
    };

    let uri = uri.unwrap_or_default();
    match resource.handler.call(uri, &vars).await {
        Ok(content) => ok_response(id, json!({ "contents": [content] })),
        Err(e) => {
            tracing::error!(resource = %resource.name, error = %e, "resource handler failed");
            error_response(id, ERR_CODE_INTERNAL, "Internal server error")
        }
    }
}

// ── Permissive parameter coercion ──
//
// Declared `number` parameters coerce the way JS `Number()` does (numeric
// strings accepted, anything else becomes NaN); `string` parameters the
// way `String()` does (missing values become "undefined"). Non-coercible
// values propagate into the result text instead of rejecting the call.
// This is contract, not an accident: see DESIGN.md.

/// Coerce supplied arguments to the tool's parameter schema.
fn coerce_args(tool: &Tool, supplied: Option<&Value>) -> Value {
    let empty = Map::new();
    let obj = supplied.and_then(|v| v.as_object()).unwrap_or(&empty);
    let mut out = Map::new();
    for (name, ty) in &tool.params {
        let raw = obj.get(name);
        let coerced = match ty {
            ParamType::Number => {
                let n = coerce_number(raw);
                match serde_json::Number::from_f64(n) {
                    Some(num) => Value::Number(num),
                    // NaN has no JSON form; pass the raw value through so
                    // the handler's own numeric coercion sees the same input.
                    None => raw.cloned().unwrap_or(Value::Null),
                }
            }
            ParamType::String => Value::String(coerce_string(raw)),
        };
        out.insert(name.clone(), coerced);
    }
    Value::Object(out)
}

/// JS `Number()` coercion.
pub fn coerce_number(v: Option<&Value>) -> f64 {
    match v {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Some(Value::Array(_)) | Some(Value::Object(_)) => f64::NAN,
    }
}

/// JS `String()` coercion.
pub fn coerce_string(v: Option<&Value>) -> String {
    match v {
        None => "undefined".into(),
        Some(Value::Null) => "null".into(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => format_number(n.as_f64().unwrap_or(f64::NAN)),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Format an f64 the way JS stringifies numbers: integral values without
/// a decimal point, NaN as "NaN".
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".into()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity".into() } else { "-Infinity".into() }
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}
