use crate::types::{JsonRpcRequest, JSONRPC_VERSION};

/// Transport-supplied request metadata: the headers the adapter extracts
/// before the body reaches the validator.
#[derive(Debug, Default, Clone)]
pub struct RequestMeta {
    pub session_token: Option<String>,
    pub accept: Option<String>,
}

/// A classified inbound request. Session-token validity is NOT checked
/// here; the dispatcher owns that decision.
#[derive(Debug)]
pub enum ValidatedRequest {
    /// No token, `initialize` with a client-identity block.
    Init(JsonRpcRequest),
    /// Token supplied; carried through regardless of validity.
    Session {
        token: String,
        request: JsonRpcRequest,
    },
}

/// Rejections produced before any session or method logic runs. None of
/// these touch the session store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Accept header does not admit application/json.
    NotAcceptable,
    /// Body is not a JSON-RPC 2.0 envelope (includes version mismatch).
    Parse,
    /// No token and not an initialize request.
    BadRequest,
}

/// Classify an inbound request body against the envelope rules.
///
/// The accept check runs first so that a missing accept declaration is
/// rejected regardless of body content.
pub fn classify(body: &[u8], meta: &RequestMeta) -> Result<ValidatedRequest, ValidationError> {
    let accept = meta.accept.as_deref().unwrap_or("");
    if !accept.contains("application/json") {
        return Err(ValidationError::NotAcceptable);
    }

    let request: JsonRpcRequest =
        serde_json::from_slice(body).map_err(|_| ValidationError::Parse)?;

    if request.jsonrpc != JSONRPC_VERSION {
        // Version mismatch folds into the parse rejection; no distinct code.
        return Err(ValidationError::Parse);
    }

    match &meta.session_token {
        None if request.method == "initialize" && has_client_block(&request) => {
            Ok(ValidatedRequest::Init(request))
        }
        Some(token) => Ok(ValidatedRequest::Session {
            token: token.clone(),
            request,
        }),
        None => Err(ValidationError::BadRequest),
    }
}

fn has_client_block(request: &JsonRpcRequest) -> bool {
    request
        .params
        .as_ref()
        .and_then(|p| p.get("client"))
        .is_some_and(|c| c.is_object())
}
