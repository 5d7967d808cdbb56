use super::chile::CUSTOMS_AGENT_FOB_THRESHOLD;
use rust_decimal::Decimal;
use serde::Serialize;

/// Whether a customs agent (agente de aduanas) is needed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AgentRequirement {
    #[serde(rename = "sí")]
    Mandatory,
    #[serde(rename = "recomendable")]
    Recommended,
    #[serde(rename = "no")]
    Optional,
}

impl AgentRequirement {
    pub fn label(&self) -> &'static str {
        match self {
            AgentRequirement::Mandatory => "sí",
            AgentRequirement::Recommended => "recomendable",
            AgentRequirement::Optional => "no",
        }
    }
}

impl std::fmt::Display for AgentRequirement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AgentRecommendation {
    pub requirement: AgentRequirement,
    pub message: &'static str,
}

const MANDATORY_MESSAGE: &str = "Según normativa de Aduanas Chile, para importaciones con valor FOB superior a US$ 1.000 es obligatorio contratar un Agente de Aduanas.";
const RECOMMENDED_MESSAGE: &str = "Aunque el valor es bajo, al ser una mercancía regulada se recomienda contratar un Agente de Aduanas para facilitar el proceso de certificación.";
const OPTIONAL_MESSAGE: &str = "No es obligatorio. Puede realizar el trámite mediante un \"Despacho Simplificado\" con empresas de envío rápido (couriers).";

/// First match wins: FOB over the threshold, then regulated goods, then simplified clearance.
pub fn recommend_agent(fob_usd: Decimal, has_documents: bool) -> AgentRecommendation {
    if fob_usd > CUSTOMS_AGENT_FOB_THRESHOLD {
        AgentRecommendation {
            requirement: AgentRequirement::Mandatory,
            message: MANDATORY_MESSAGE,
        }
    } else if has_documents {
        AgentRecommendation {
            requirement: AgentRequirement::Recommended,
            message: RECOMMENDED_MESSAGE,
        }
    } else {
        AgentRecommendation {
            requirement: AgentRequirement::Optional,
            message: OPTIONAL_MESSAGE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn over_threshold_is_mandatory_even_with_documents() {
        assert_eq!(
            recommend_agent(dec!(1000.01), true).requirement,
            AgentRequirement::Mandatory
        );
        assert_eq!(
            recommend_agent(dec!(5000), false).requirement,
            AgentRequirement::Mandatory
        );
    }

    #[test]
    fn threshold_itself_is_not_mandatory() {
        assert_eq!(
            recommend_agent(dec!(1000), false).requirement,
            AgentRequirement::Optional
        );
    }

    #[test]
    fn regulated_goods_recommend_agent() {
        let rec = recommend_agent(dec!(200), true);
        assert_eq!(rec.requirement, AgentRequirement::Recommended);
        assert_eq!(rec.message, RECOMMENDED_MESSAGE);
    }

    #[test]
    fn requirement_serializes_as_spanish() {
        let json = serde_json::to_string(&AgentRequirement::Mandatory).unwrap();
        assert_eq!(json, "\"sí\"");
    }
}
