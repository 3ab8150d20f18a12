//! Response fault classification
//!
//! The ERP reports some failures inside HTTP 200 responses, either as an
//! alternate error field on a JSON body or as a plain-text body wrapped in a
//! fault marker. Every call site goes through [`FaultClassifier`]; nothing
//! else in the workspace matches on upstream error text.
//!
//! Inspection order:
//! 1. transport/connection error text ([`FaultClassifier::transport_fault`])
//! 2. known error fields on a JSON object body
//! 3. the `##ERROR##` marker anywhere in the body text
//!
//! Non-2xx responses are always faults; the steps above only pick the message.

use serde_json::Value;

/// Delimiter wrapping faults embedded in nominally successful bodies.
pub const FAULT_MARKER: &str = "##ERROR##";

/// JSON fields that carry an error regardless of HTTP status.
pub const JSON_ERROR_FIELDS: &[&str] = &["errorMessage", "errorMsg", "error", "fault", "erro"];

/// JSON fields read for the message only when the status is not 2xx.
pub const JSON_STATUS_MESSAGE_FIELDS: &[&str] = &["message", "Message", "detail"];

/// Phrases (lowercase) that identify a rejected, expired, or
/// terminal-conflicted token.
pub const DEFAULT_AUTH_FAULT_PHRASES: &[&str] = &[
    "invalid token",
    "token invalid",
    "token expired",
    "expired token",
    "token inválido",
    "token invalido",
    "token expirado",
    "unauthorized",
    "não autorizado",
    "nao autorizado",
    "session expired",
    "sessão expirada",
    "sessao expirada",
    "logged in from another",
    "another terminal",
    "outro terminal",
    "already connected",
    "usuário já conectado",
    "usuario ja conectado",
];

const UNSPECIFIED_FAULT: &str = "unspecified ERP fault";

/// Where a fault message was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultSource {
    /// The request never produced a response.
    Transport,
    /// A known error field on a JSON body.
    JsonField,
    /// The delimiter-wrapped marker in the body text.
    Marker,
    /// Non-2xx status without a more specific message.
    Status,
}

/// A classified failure extracted from an ERP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub source: FaultSource,
    pub status: Option<u16>,
    pub message: String,
    /// True when the fault indicates the bearer token was rejected.
    pub auth: bool,
}

/// Classifies ERP responses. Holds the extensible auth-phrase list.
#[derive(Debug, Clone)]
pub struct FaultClassifier {
    auth_phrases: Vec<String>,
}

impl Default for FaultClassifier {
    fn default() -> Self {
        Self { auth_phrases: DEFAULT_AUTH_FAULT_PHRASES.iter().map(|p| p.to_string()).collect() }
    }
}

impl FaultClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a phrase to the auth-fault list (matched case-insensitively).
    pub fn with_phrase(mut self, phrase: impl Into<String>) -> Self {
        let phrase = phrase.into().trim().to_lowercase();
        if !phrase.is_empty() && !self.auth_phrases.contains(&phrase) {
            self.auth_phrases.push(phrase);
        }
        self
    }

    pub fn phrases(&self) -> &[String] {
        &self.auth_phrases
    }

    /// True if `text` contains any known auth-fault phrase.
    pub fn is_auth_fault(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.auth_phrases.iter().any(|phrase| lower.contains(phrase.as_str()))
    }

    /// Fault for a request that failed before any response arrived.
    pub fn transport_fault(&self, error_text: &str) -> Fault {
        let message = if error_text.trim().is_empty() {
            "connection failure".to_string()
        } else {
            error_text.trim().to_string()
        };
        Fault { source: FaultSource::Transport, status: None, auth: self.is_auth_fault(&message), message }
    }

    /// Inspect a received response. Returns `None` only for a 2xx response
    /// with no embedded fault.
    pub fn inspect(&self, status: u16, body: &str) -> Option<Fault> {
        let success = (200..300).contains(&status);
        let (source, message) = match embedded_fault(body, success) {
            Some(found) => found,
            None if success => return None,
            None => (FaultSource::Status, status_message(status, body)),
        };

        let auth = status == 401 || self.is_auth_fault(&message);
        Some(Fault { source, status: Some(status), message, auth })
    }
}

/// Shorthand for [`FaultClassifier::is_auth_fault`] with the default phrases.
pub fn is_auth_fault(text: &str) -> bool {
    FaultClassifier::default().is_auth_fault(text)
}

/// Extract the human-readable segment from a marker-wrapped body.
///
/// Uses the text after the last marker; when that is empty (the message is
/// enclosed between markers) falls back to the last non-empty inner segment.
pub fn extract_marker_message(body: &str) -> Option<String> {
    if !body.contains(FAULT_MARKER) {
        return None;
    }

    let segments: Vec<&str> = body.split(FAULT_MARKER).skip(1).map(str::trim).collect();
    let message = segments
        .iter()
        .rev()
        .find(|segment| !segment.is_empty())
        .map(|segment| segment.to_string())
        .unwrap_or_else(|| UNSPECIFIED_FAULT.to_string());

    Some(message)
}

fn embedded_fault(body: &str, success: bool) -> Option<(FaultSource, String)> {
    let trimmed = body.trim();

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(trimmed) {
        let object = Value::Object(map);
        if let Some(message) = first_error_field(&object, JSON_ERROR_FIELDS) {
            return Some((FaultSource::JsonField, message));
        }
        if !success {
            if let Some(message) = first_error_field(&object, JSON_STATUS_MESSAGE_FIELDS) {
                return Some((FaultSource::JsonField, message));
            }
        }
    }

    extract_marker_message(trimmed).map(|message| (FaultSource::Marker, message))
}

fn first_error_field(object: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match object.get(field)? {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Object(inner) => ["message", "description", "detail"]
            .iter()
            .find_map(|key| inner.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .or_else(|| Some(Value::Object(inner.clone()).to_string())),
        // `"error": true` style flags: the message lives in a sibling field.
        Value::Bool(true) => JSON_STATUS_MESSAGE_FIELDS
            .iter()
            .find_map(|key| object.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .or_else(|| Some(format!("ERP reported {field}"))),
        _ => None,
    })
}

fn status_message(status: u16, body: &str) -> String {
    let text = body.trim();
    if text.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {text}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> FaultClassifier {
        FaultClassifier::default()
    }

    #[test]
    fn clean_success_has_no_fault() {
        assert!(classifier().inspect(200, r#"{"id": "555", "name": "ACME"}"#).is_none());
        assert!(classifier().inspect(200, "").is_none());
        assert!(classifier().inspect(204, "[]").is_none());
    }

    #[test]
    fn marker_in_http_200_body_is_a_fault() {
        let fault = classifier().inspect(200, "##ERROR## Token expirado").expect("fault");
        assert_eq!(fault.source, FaultSource::Marker);
        assert_eq!(fault.message, "Token expirado");
        assert!(fault.auth);
    }

    #[test]
    fn marker_takes_trailing_segment() {
        let body = "##ERROR##E401##ERROR## Usuario ja conectado em outro terminal";
        assert_eq!(
            extract_marker_message(body).as_deref(),
            Some("Usuario ja conectado em outro terminal")
        );
        assert_eq!(extract_marker_message("##ERROR##Cliente bloqueado##ERROR##").as_deref(), Some("Cliente bloqueado"));
        assert_eq!(extract_marker_message("##ERROR##").as_deref(), Some(UNSPECIFIED_FAULT));
        assert_eq!(extract_marker_message("all good"), None);
    }

    #[test]
    fn alternate_json_error_fields_are_detected_on_200() {
        let fault = classifier().inspect(200, r#"{"errorMessage": "CNPJ invalido"}"#).expect("fault");
        assert_eq!(fault.source, FaultSource::JsonField);
        assert_eq!(fault.message, "CNPJ invalido");
        assert!(!fault.auth);

        let fault = classifier()
            .inspect(200, r#"{"error": true, "message": "Token invalido"}"#)
            .expect("fault");
        assert_eq!(fault.message, "Token invalido");
        assert!(fault.auth);

        let fault = classifier()
            .inspect(200, r#"{"fault": {"description": "Campo obrigatorio"}}"#)
            .expect("fault");
        assert_eq!(fault.message, "Campo obrigatorio");
    }

    #[test]
    fn plain_message_field_only_counts_on_error_status() {
        assert!(classifier().inspect(200, r#"{"message": "created", "id": 1}"#).is_none());

        let fault = classifier().inspect(422, r#"{"message": "tipo obrigatorio"}"#).expect("fault");
        assert_eq!(fault.message, "tipo obrigatorio");
        assert_eq!(fault.status, Some(422));
    }

    #[test]
    fn error_status_without_message_uses_status_line() {
        let fault = classifier().inspect(503, "").expect("fault");
        assert_eq!(fault.source, FaultSource::Status);
        assert_eq!(fault.message, "HTTP 503");
    }

    #[test]
    fn http_401_is_always_an_auth_fault() {
        let fault = classifier().inspect(401, "nope").expect("fault");
        assert!(fault.auth);
    }

    #[test]
    fn phrase_list_is_case_insensitive_and_extensible() {
        assert!(is_auth_fault("Session EXPIRED, please log in"));
        assert!(!is_auth_fault("Cliente nao encontrado"));

        let extended = classifier().with_phrase("Sessao derrubada");
        assert!(extended.is_auth_fault("erro: sessao derrubada pelo administrador"));
        assert!(!classifier().is_auth_fault("erro: sessao derrubada pelo administrador"));
    }

    #[test]
    fn transport_faults_keep_the_error_text() {
        let fault = classifier().transport_fault("error sending request: connection refused");
        assert_eq!(fault.source, FaultSource::Transport);
        assert_eq!(fault.status, None);
        assert!(!fault.auth);
    }
}
