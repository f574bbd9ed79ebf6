//! Gateway authorizer — stand-alone token verification for deployments
//! behind a managed API gateway.
//!
//! Turns a raw authorization header into an allow/deny policy decision. It
//! never fails past its boundary: every input, however broken, yields a
//! decision document. Roles are not consulted here; the decision only
//! proves the bearer presented a valid, unexpired, correctly signed token.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use fleet_core::auth::jwt::verify_token;
use fleet_core::models::auth::TokenClaims;

/// Principal used for every denied decision.
const UNAUTHORIZED_PRINCIPAL: &str = "unauthorized";

const POLICY_VERSION: &str = "2012-10-17";
const INVOKE_ACTION: &str = "execute-api:Invoke";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Effect {
    Allow,
    Deny,
}

/// Single policy statement scoped to the requested resource.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyStatement {
    pub action: String,
    pub effect: Effect,
    pub resource: String,
}

#[derive(Debug, Serialize)]
pub struct PolicyDocument {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "Statement")]
    pub statement: Vec<PolicyStatement>,
}

/// Decision document handed to the gateway.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerDecision {
    pub principal_id: String,
    pub policy_document: PolicyDocument,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<HashMap<String, String>>,
}

impl AuthorizerDecision {
    pub fn effect(&self) -> Effect {
        self.policy_document.statement[0].effect
    }
}

/// Authorize a request from its raw authorization header value.
///
/// On a valid token: `Allow` with the user id as principal and a context map
/// of `userId` and `email` for downstream propagation. On any failure:
/// `Deny` for the same resource, fixed principal, no context.
pub fn authorize(
    authorization: Option<&str>,
    resource: &str,
    secret: &[u8],
) -> AuthorizerDecision {
    match verify_header(authorization, secret) {
        Some(claims) => {
            let context = HashMap::from([
                ("userId".to_string(), claims.sub.clone()),
                ("email".to_string(), claims.email.clone()),
            ]);
            decision(&claims.sub, Effect::Allow, resource, Some(context))
        }
        None => {
            debug!("authorization failed, denying");
            decision(UNAUTHORIZED_PRINCIPAL, Effect::Deny, resource, None)
        }
    }
}

fn verify_header(authorization: Option<&str>, secret: &[u8]) -> Option<TokenClaims> {
    let token = extract_token(authorization?)?;
    verify_token(token, secret).ok()
}

/// Extract the bearer token. Unlike the in-process middleware, the scheme
/// match is case-insensitive here.
fn extract_token(header: &str) -> Option<&str> {
    let parts: Vec<&str> = header.split(' ').collect();
    if parts.len() != 2 || !parts[0].eq_ignore_ascii_case("bearer") {
        return None;
    }
    Some(parts[1])
}

fn decision(
    principal_id: &str,
    effect: Effect,
    resource: &str,
    context: Option<HashMap<String, String>>,
) -> AuthorizerDecision {
    AuthorizerDecision {
        principal_id: principal_id.to_string(),
        policy_document: PolicyDocument {
            version: POLICY_VERSION.to_string(),
            statement: vec![PolicyStatement {
                action: INVOKE_ACTION.to_string(),
                effect,
                resource: resource.to_string(),
            }],
        },
        context,
    }
}
