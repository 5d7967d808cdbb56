use super::{ProviderError, Service};
use crate::core::{ConfidenceLevel, TariffSuggestion};
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;

/// Most suggestions a classifier may contribute
pub const MAX_SUGGESTIONS: usize = 3;

/// Proposes HS tariff codes for a product, most confident first
pub trait Classifier {
    fn classify(
        &self,
        description: &str,
        image: Option<&[u8]>,
    ) -> Result<Vec<TariffSuggestion>, ProviderError>;
}

/// Codes chosen by the user, in the order given
#[derive(Debug, Clone, Default)]
pub struct StaticClassifier {
    codes: Vec<String>,
}

impl StaticClassifier {
    pub fn new(codes: Vec<String>) -> Self {
        StaticClassifier { codes }
    }
}

impl Classifier for StaticClassifier {
    fn classify(
        &self,
        _description: &str,
        _image: Option<&[u8]>,
    ) -> Result<Vec<TariffSuggestion>, ProviderError> {
        let confidence = [
            ConfidenceLevel::High,
            ConfidenceLevel::Medium,
            ConfidenceLevel::Low,
        ];
        let suggestions = self
            .codes
            .iter()
            .enumerate()
            .map(|(i, code)| {
                let level = confidence.get(i).copied().unwrap_or(ConfidenceLevel::Low);
                TariffSuggestion::new(code, "", level)
            })
            .collect();
        normalize_suggestions(suggestions)
    }
}

#[derive(Debug, Deserialize)]
struct SuggestionsFile {
    #[serde(alias = "sugerencias")]
    suggestions: Vec<TariffSuggestion>,
}

/// Suggestions previously produced by a classifier, read from JSON (or stdin with "-")
#[derive(Debug, Clone)]
pub struct JsonFileClassifier {
    path: PathBuf,
}

impl JsonFileClassifier {
    pub fn new(path: PathBuf) -> Self {
        JsonFileClassifier { path }
    }

    fn read(&self) -> Result<Vec<TariffSuggestion>, ProviderError> {
        let io_err = |source| ProviderError::Io {
            service: Service::Classifier,
            source,
        };
        let mut buffer = Vec::new();
        if self.path.as_os_str() == "-" {
            io::stdin().lock().read_to_end(&mut buffer).map_err(io_err)?;
        } else {
            let file = File::open(&self.path).map_err(io_err)?;
            BufReader::new(file).read_to_end(&mut buffer).map_err(io_err)?;
        }
        parse_suggestions(&buffer)
    }
}

impl Classifier for JsonFileClassifier {
    fn classify(
        &self,
        description: &str,
        image: Option<&[u8]>,
    ) -> Result<Vec<TariffSuggestion>, ProviderError> {
        log::info!(
            "Reading suggestions for '{}' from {} (image: {})",
            description,
            self.path.display(),
            image.map_or("none".to_string(), |bytes| format!("{} bytes", bytes.len()))
        );
        self.read()
    }
}

/// Parse a `{"suggestions": [...]}` document, also accepting a bare array.
pub fn parse_suggestions(json: &[u8]) -> Result<Vec<TariffSuggestion>, ProviderError> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Document {
        Wrapped(SuggestionsFile),
        Bare(Vec<TariffSuggestion>),
    }

    let document: Document =
        serde_json::from_slice(json).map_err(|err| ProviderError::Malformed {
            service: Service::Classifier,
            reason: err.to_string(),
        })?;
    let suggestions = match document {
        Document::Wrapped(file) => file.suggestions,
        Document::Bare(suggestions) => suggestions,
    };
    normalize_suggestions(suggestions)
}

/// Trim codes, reject empty ones and keep at most [`MAX_SUGGESTIONS`].
pub fn normalize_suggestions(
    suggestions: Vec<TariffSuggestion>,
) -> Result<Vec<TariffSuggestion>, ProviderError> {
    if suggestions.len() > MAX_SUGGESTIONS {
        log::warn!(
            "Classifier returned {} suggestions, keeping the first {}",
            suggestions.len(),
            MAX_SUGGESTIONS
        );
    }
    suggestions
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|mut s| {
            s.code = s.code.trim().to_string();
            if s.code.is_empty() {
                Err(ProviderError::Malformed {
                    service: Service::Classifier,
                    reason: "suggestion with empty code".to_string(),
                })
            } else {
                Ok(s)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_codes_get_descending_confidence() {
        let classifier = StaticClassifier::new(vec![
            "8517.62".to_string(),
            "8471.30".to_string(),
            "8528.52".to_string(),
            "8543.70".to_string(),
        ]);
        let suggestions = classifier.classify("teléfono", None).unwrap();
        let levels: Vec<_> = suggestions.iter().map(|s| s.confidence).collect();
        assert_eq!(
            levels,
            vec![
                ConfidenceLevel::High,
                ConfidenceLevel::Medium,
                ConfidenceLevel::Low
            ]
        );
    }

    #[test]
    fn parses_wrapped_document() {
        let json = br#"{"suggestions": [
            {"code": "6402.99", "description": "Calzado", "confidence": "High"},
            {"code": " 6404.11 ", "description": "Calzado deportivo", "confidence": "Medio"}
        ]}"#;
        let suggestions = parse_suggestions(json).unwrap();
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[1].code, "6404.11");
        assert_eq!(suggestions[1].confidence, ConfidenceLevel::Medium);
    }

    #[test]
    fn parses_classifier_output() {
        let json = br#"{"sugerencias": [
            {"codigo": "2402.20", "descripcion": "Cigarrillos", "nivel_confianza": "Alto"}
        ]}"#;
        let suggestions = parse_suggestions(json).unwrap();
        assert_eq!(suggestions[0].code, "2402.20");
        assert_eq!(suggestions[0].confidence, ConfidenceLevel::High);
    }

    #[test]
    fn parses_bare_array_and_truncates() {
        let json = br#"[
            {"code": "1"}, {"code": "2"}, {"code": "3"}, {"code": "4"}
        ]"#;
        let suggestions = parse_suggestions(json).unwrap();
        assert_eq!(suggestions.len(), MAX_SUGGESTIONS);
    }

    #[test]
    fn empty_code_is_malformed() {
        let err = parse_suggestions(br#"{"suggestions": [{"code": "  "}]}"#).unwrap_err();
        assert!(matches!(err, ProviderError::Malformed { .. }));
        assert_eq!(
            err.user_message(),
            "No se pudo clasificar el producto desde el servicio de IA."
        );
    }

    #[test]
    fn invalid_json_is_malformed() {
        assert!(parse_suggestions(b"not json").is_err());
    }
}
