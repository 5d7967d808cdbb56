use crate::core::{CertificationRule, TariffSuggestion, CERTIFICATION_RULES};
use serde::Serialize;

/// A permit or certification the importer may need to present
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdditionalDocument {
    pub organism: &'static str,
    pub document: &'static str,
    pub reason: &'static str,
}

impl From<&CertificationRule> for AdditionalDocument {
    fn from(rule: &CertificationRule) -> Self {
        AdditionalDocument {
            organism: rule.organism,
            document: rule.document,
            reason: rule.description,
        }
    }
}

/// Every certification rule keyed to `chapter`, in table order.
pub fn documents_for_chapter(rules: &[CertificationRule], chapter: &str) -> Vec<AdditionalDocument> {
    rules
        .iter()
        .filter(|rule| rule.applies_to(chapter))
        .map(AdditionalDocument::from)
        .collect()
}

/// Documents required for the chapter of the most confident suggestion.
///
/// Several regulators can share a chapter (SUBTEL and SEC both cover 85), so
/// all matches are returned.
pub fn resolve_documents(suggestions: &[TariffSuggestion]) -> Vec<AdditionalDocument> {
    let Some(chapter) = suggestions.first().and_then(|s| s.chapter()) else {
        return Vec::new();
    };
    let documents = documents_for_chapter(CERTIFICATION_RULES, chapter);
    log::debug!("Chapter {} requires {} document(s)", chapter, documents.len());
    documents
}
