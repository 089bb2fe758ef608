use base64::{engine::general_purpose, Engine as _};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::config::LoggerConfig;

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap();
    static ref PHONE_REGEX: Regex = Regex::new(r"(?:\+1[-.\s]?)?\(?\b[0-9]{3}\)?[-.\s]?[0-9]{3}[-.\s]?[0-9]{4}\b").unwrap();
    static ref SSN_REGEX: Regex = Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap();
    static ref MRN_REGEX: Regex = Regex::new(r"\bMRN\d+\b").unwrap();
}

/// PII redaction configuration
#[derive(Debug, Clone)]
pub struct RedactionConfig {
    pub enabled: bool,
    pub redact_emails: bool,
    pub redact_phones: bool,
    pub redact_ssn: bool,
    pub redact_mrn: bool,
    pub hash_for_correlation: bool,
    /// Record fields masked wholesale by [`PiiRedactor::redact_record`]
    pub sensitive_fields: Vec<String>,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            redact_emails: true,
            redact_phones: true,
            redact_ssn: true,
            redact_mrn: true,
            hash_for_correlation: true,
            sensitive_fields: LoggerConfig::default().sensitive_fields,
        }
    }
}

impl From<&LoggerConfig> for RedactionConfig {
    fn from(config: &LoggerConfig) -> Self {
        Self {
            enabled: config.redaction_enabled,
            sensitive_fields: config.sensitive_fields.clone(),
            ..Default::default()
        }
    }
}

/// PII redactor for log messages and change-event records
#[derive(Debug, Clone, Default)]
pub struct PiiRedactor {
    config: RedactionConfig,
}

impl PiiRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    pub fn redact(&self, text: &str) -> String {
        if !self.config.enabled {
            return text.to_string();
        }

        let mut result = text.to_string();

        if self.config.redact_emails {
            result = self.replace(&EMAIL_REGEX, &result, "EMAIL", "***@***");
        }
        if self.config.redact_ssn {
            result = self.replace(&SSN_REGEX, &result, "SSN", "***-**-****");
        }
        if self.config.redact_phones {
            result = self.replace(&PHONE_REGEX, &result, "PHONE", "(***) ***-****");
        }
        if self.config.redact_mrn {
            result = self.replace(&MRN_REGEX, &result, "MRN", "MRN******");
        }

        result
    }

    /// Render a record as JSON with sensitive fields masked and string values
    /// passed through [`PiiRedactor::redact`]
    pub fn redact_record(&self, record: &Map<String, Value>) -> String {
        if !self.config.enabled {
            return Value::Object(record.clone()).to_string();
        }

        Value::Object(self.redact_object(record)).to_string()
    }

    fn redact_object(&self, object: &Map<String, Value>) -> Map<String, Value> {
        object
            .iter()
            .map(|(field, value)| {
                let value = if self.config.sensitive_fields.iter().any(|f| f == field) {
                    Value::String("[REDACTED]".to_string())
                } else {
                    self.redact_value(value)
                };
                (field.clone(), value)
            })
            .collect()
    }

    // Sensitive field names apply at every depth of JSONB-style columns
    fn redact_value(&self, value: &Value) -> Value {
        match value {
            Value::String(s) => Value::String(self.redact(s)),
            Value::Object(object) => Value::Object(self.redact_object(object)),
            Value::Array(items) => Value::Array(items.iter().map(|item| self.redact_value(item)).collect()),
            other => other.clone(),
        }
    }

    fn replace(&self, pattern: &Regex, text: &str, label: &str, mask: &str) -> String {
        pattern
            .replace_all(text, |caps: &regex::Captures| {
                if self.config.hash_for_correlation {
                    format!("{label}[{}]", self.hash_value(&caps[0]))
                } else {
                    mask.to_string()
                }
            })
            .to_string()
    }

    fn hash_value(&self, value: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(value.as_bytes());
        let result = hasher.finalize();
        general_purpose::STANDARD.encode(&result[..8]) // first 8 bytes are enough to correlate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn masking_redactor() -> PiiRedactor {
        PiiRedactor::new(RedactionConfig {
            hash_for_correlation: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_email_redaction() {
        let redacted = masking_redactor().redact("Result sent to john.doe@example.com");
        assert_eq!(redacted, "Result sent to ***@***");
    }

    #[test]
    fn test_phone_and_ssn_redaction() {
        let redacted = masking_redactor().redact("Call (555) 123-4567, SSN 123-45-6789");
        assert!(redacted.contains("(***) ***-****"));
        assert!(redacted.contains("***-**-****"));
        assert!(!redacted.contains("6789"));
    }

    #[test]
    fn test_hash_is_stable_for_correlation() {
        let redactor = PiiRedactor::default();
        let a = redactor.redact("MRN123456");
        let b = redactor.redact("MRN123456");
        assert_eq!(a, b);
        assert!(a.starts_with("MRN["));
    }

    #[test]
    fn test_record_sensitive_fields_are_masked() {
        let record = json!({
            "id": "q-1",
            "patient_name": "Jane Roe",
            "notes": "reach at jane@example.org",
            "position": 3
        });
        let Value::Object(record) = record else {
            unreachable!()
        };

        let rendered = masking_redactor().redact_record(&record);
        assert!(rendered.contains("\"patient_name\":\"[REDACTED]\""));
        assert!(rendered.contains("***@***"));
        assert!(rendered.contains("\"position\":3"));
        assert!(!rendered.contains("Jane"));
    }

    #[test]
    fn test_nested_record_values_are_masked() {
        let record = json!({
            "id": "q-1",
            "patient": {"patient_name": "Jane Roe", "email": "jane@example.org"},
            "contacts": ["555-123-4567", {"phone": "555-987-6543"}]
        });
        let Value::Object(record) = record else {
            unreachable!()
        };

        let rendered = masking_redactor().redact_record(&record);
        assert!(!rendered.contains("Jane"), "nested name leaked: {rendered}");
        assert!(!rendered.contains("jane@example.org"), "nested e-mail leaked: {rendered}");
        assert!(!rendered.contains("123-4567"), "phone in array leaked: {rendered}");
        assert!(!rendered.contains("987-6543"), "sensitive field in array leaked: {rendered}");
        assert!(rendered.contains("\"id\":\"q-1\""));
    }

    #[test]
    fn test_disabled_redactor_passes_through() {
        let redactor = PiiRedactor::new(RedactionConfig {
            enabled: false,
            ..Default::default()
        });
        assert_eq!(redactor.redact("a@b.io"), "a@b.io");
    }
}
