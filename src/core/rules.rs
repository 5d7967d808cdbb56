//! Static customs rule tables.
//!
//! The special tax table is ordered: lookup is first match by tariff prefix,
//! so more specific prefixes must come before the shorter ones they extend.
//! [`validate_special_tax_rules`] enforces this.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RuleTableError {
    #[error("rule '{rule}' has no tariff prefixes")]
    EmptyPrefixes { rule: &'static str },
    #[error("prefix '{prefix}' of rule '{earlier}' shadows prefix '{shadowed}' of later rule '{later}'")]
    ShadowedPrefix {
        earlier: &'static str,
        prefix: &'static str,
        later: &'static str,
        shadowed: &'static str,
    },
    #[error("rule '{rule}' has invalid chapter '{chapter}' (expected two digits)")]
    InvalidChapter {
        rule: &'static str,
        chapter: &'static str,
    },
}

/// Category of a special (additional) tax
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpecialTaxCategory {
    #[serde(rename = "Bebidas alcohólicas")]
    AlcoholicBeverages,
    #[serde(rename = "Licores destilados")]
    DistilledLiquors,
    #[serde(rename = "Artículos de lujo")]
    LuxuryGoods,
    #[serde(rename = "Tabaco")]
    Tobacco,
    #[serde(rename = "Vehículos")]
    Vehicles,
    #[serde(rename = "Bebidas no alcohólicas")]
    SoftDrinks,
    #[serde(rename = "Pirotecnia")]
    Fireworks,
}

impl SpecialTaxCategory {
    pub fn label(&self) -> &'static str {
        match self {
            SpecialTaxCategory::AlcoholicBeverages => "Bebidas alcohólicas",
            SpecialTaxCategory::DistilledLiquors => "Licores destilados",
            SpecialTaxCategory::LuxuryGoods => "Artículos de lujo",
            SpecialTaxCategory::Tobacco => "Tabaco",
            SpecialTaxCategory::Vehicles => "Vehículos",
            SpecialTaxCategory::SoftDrinks => "Bebidas no alcohólicas",
            SpecialTaxCategory::Fireworks => "Pirotecnia",
        }
    }
}

impl std::fmt::Display for SpecialTaxCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecialTaxRule {
    pub sub_category: &'static str,
    pub category: SpecialTaxCategory,
    /// Fraction of the special tax base. Zero means the rate is variable, see `rate_label`.
    pub rate: Decimal,
    pub rate_label: &'static str,
    pub tariff_prefixes: &'static [&'static str],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
}

impl SpecialTaxRule {
    /// The first prefix of this rule that `code` starts with
    pub fn matching_prefix(&self, code: &str) -> Option<&'static str> {
        self.tariff_prefixes
            .iter()
            .copied()
            .find(|prefix| code.starts_with(prefix))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificationRule {
    pub organism: &'static str,
    pub category: &'static str,
    pub document: &'static str,
    pub tariff_chapters: &'static [&'static str],
    pub description: &'static str,
}

impl CertificationRule {
    pub fn applies_to(&self, chapter: &str) -> bool {
        self.tariff_chapters.contains(&chapter)
    }
}

const fn luxury(sub_category: &'static str, prefixes: &'static [&'static str]) -> SpecialTaxRule {
    SpecialTaxRule {
        sub_category,
        category: SpecialTaxCategory::LuxuryGoods,
        rate: dec!(0.15),
        rate_label: "15%",
        tariff_prefixes: prefixes,
        warning: None,
    }
}

/// Additional taxes (Ley de Impuesto a las Ventas y Servicios, Título III), most specific first.
pub static SPECIAL_TAX_RULES: &[SpecialTaxRule] = &[
    // 6 digit prefixes
    luxury("Jet ski", &["8903.92"]),
    luxury("Motores recreativos", &["8407.21"]),
    SpecialTaxRule {
        sub_category: "Tabaco elaborado",
        category: SpecialTaxCategory::Tobacco,
        rate: dec!(0.597),
        rate_label: "59.7%",
        tariff_prefixes: &["2402.20"],
        warning: None,
    },
    SpecialTaxRule {
        sub_category: "Tabaco puro",
        category: SpecialTaxCategory::Tobacco,
        rate: dec!(0.526),
        rate_label: "52.6%",
        tariff_prefixes: &["2402.10"],
        warning: None,
    },
    // 4 digit prefixes
    SpecialTaxRule {
        sub_category: "Pirotecnia",
        category: SpecialTaxCategory::Fireworks,
        rate: dec!(0.50),
        rate_label: "50%",
        tariff_prefixes: &["3604"],
        warning: None,
    },
    SpecialTaxRule {
        sub_category: "Bebidas no alcohólicas",
        category: SpecialTaxCategory::SoftDrinks,
        rate: dec!(0.10),
        rate_label: "10%",
        tariff_prefixes: &["2202"],
        warning: Some(
            "La tasa puede ser 18% si el producto tiene alto contenido de azúcar (Ley 20.606).",
        ),
    },
    SpecialTaxRule {
        sub_category: "Cervezas y Vinos",
        category: SpecialTaxCategory::AlcoholicBeverages,
        rate: dec!(0.205),
        rate_label: "20.5%",
        tariff_prefixes: &["2203", "2204", "2205", "2206"],
        warning: None,
    },
    SpecialTaxRule {
        sub_category: "Licores destilados",
        category: SpecialTaxCategory::DistilledLiquors,
        rate: dec!(0.315),
        rate_label: "31.5%",
        tariff_prefixes: &["2208"],
        warning: None,
    },
    SpecialTaxRule {
        sub_category: "Tabaco",
        category: SpecialTaxCategory::Tobacco,
        rate: Decimal::ZERO,
        rate_label: "Variable",
        tariff_prefixes: &["2401", "2402", "2403"],
        warning: Some(
            "El tabaco tiene impuestos especiales complejos y variables (hasta 59.7%) que dependen del tipo exacto.",
        ),
    },
    luxury("Joyas", &["7113", "7114"]),
    luxury("Piedras preciosas", &["7102", "7103", "7104"]),
    luxury("Perlas", &["7101"]),
    luxury("Relojes de lujo", &["9101", "9102"]),
    luxury("Yates", &["8903"]),
    luxury("Aeronaves deportivas", &["8802"]),
    luxury("Armas deportivas", &["9303", "9304"]),
    SpecialTaxRule {
        sub_category: "Vehículos nuevos",
        category: SpecialTaxCategory::Vehicles,
        rate: Decimal::ZERO,
        rate_label: "Fórmula",
        tariff_prefixes: &["8703"],
        warning: Some(
            "Los vehículos nuevos pueden estar afectos a un 'impuesto verde' no incluido en esta estimación.",
        ),
    },
];

/// Permits and certifications required by Chilean regulators, keyed by HS chapter
pub static CERTIFICATION_RULES: &[CertificationRule] = &[
    CertificationRule {
        organism: "SAG",
        category: "Productos Agropecuarios",
        document: "Certificación Sanitaria",
        tariff_chapters: &["01", "07", "08", "12", "31"],
        description: "Producto de origen animal/vegetal requiere control sanitario",
    },
    CertificationRule {
        organism: "SAG",
        category: "Madera y Embalajes",
        document: "Certificación NIMF-15",
        tariff_chapters: &["44"],
        description: "Embalajes de madera deben cumplir norma internacional fitosanitaria",
    },
    CertificationRule {
        organism: "ISP",
        category: "Productos de Salud",
        document: "Registro Sanitario/Notificación",
        tariff_chapters: &["30", "33"],
        description: "Medicamentos y cosméticos requieren autorización del Instituto de Salud Pública",
    },
    CertificationRule {
        organism: "ISP",
        category: "Dispositivos Médicos",
        document: "Certificación de Dispositivos Médicos",
        tariff_chapters: &["90"],
        description: "Equipamiento médico requiere certificación del ISP",
    },
    CertificationRule {
        organism: "SEREMI de Salud",
        category: "Alimentos",
        document: "Autorización Sanitaria",
        tariff_chapters: &["16", "17", "18", "19", "20", "21"],
        description: "Alimentos procesados y suplementos requieren control de la SEREMI",
    },
    CertificationRule {
        organism: "SERNAPESCA",
        category: "Productos del Mar",
        document: "Autorización de Importación",
        tariff_chapters: &["03", "05"],
        description: "Pescados, mariscos y otros productos marinos requieren visación de SERNAPESCA",
    },
    CertificationRule {
        organism: "SUBTEL",
        category: "Equipos de Telecomunicaciones",
        document: "Certificación SUBTEL",
        tariff_chapters: &["85", "90"],
        description: "Equipos con tecnología inalámbrica (WiFi, BT) requieren homologación",
    },
    CertificationRule {
        organism: "SEC",
        category: "Productos Eléctricos",
        document: "Certificación SEC (Sello)",
        tariff_chapters: &["85"],
        description: "Equipos eléctricos deben contar con certificación de seguridad",
    },
    CertificationRule {
        organism: "DGMN",
        category: "Armas y Explosivos",
        document: "Permiso DGMN",
        tariff_chapters: &["93"],
        description: "Armas, municiones y explosivos son controlados por la DGMN",
    },
    CertificationRule {
        organism: "ANAM",
        category: "Químicos Controlados",
        document: "Permiso de Sustancias Químicas",
        tariff_chapters: &["28", "29"],
        description: "Sustancias químicas controladas requieren autorización previa",
    },
];

/// Countries and blocs with a free trade agreement (TLC) with Chile.
// https://www.subrei.gob.cl/acuerdos-comerciales/
pub static TRADE_AGREEMENT_COUNTRIES: &[&str] = &[
    "Argentina",
    "Australia",
    "Bolivia",
    "Brasil",
    "Canadá",
    "China",
    "Colombia",
    "Corea del Sur",
    "Costa Rica",
    "Ecuador",
    "Estados Unidos",
    "Hong Kong",
    "Indonesia",
    "Japón",
    "Malasia",
    "México",
    "Panamá",
    "Paraguay",
    "Perú",
    "Reino Unido",
    "Singapur",
    "Tailandia",
    "Turquía",
    "Unión Europea",
    "Uruguay",
    "Vietnam",
];

/// Countries of origin accepted as input
pub static KNOWN_COUNTRIES: &[&str] = &[
    "Alemania",
    "Argentina",
    "Australia",
    "Bolivia",
    "Brasil",
    "Canadá",
    "China",
    "Colombia",
    "Corea del Sur",
    "Costa Rica",
    "Ecuador",
    "España",
    "Estados Unidos",
    "Francia",
    "Hong Kong",
    "India",
    "Indonesia",
    "Italia",
    "Japón",
    "Malasia",
    "México",
    "Panamá",
    "Paraguay",
    "Perú",
    "Reino Unido",
    "Rusia",
    "Singapur",
    "Suiza",
    "Tailandia",
    "Turquía",
    "Unión Europea",
    "Uruguay",
    "Vietnam",
    "Otro",
];

pub fn has_trade_agreement(country: &str) -> bool {
    TRADE_AGREEMENT_COUNTRIES.contains(&country)
}

/// Check that no prefix is shadowed by a prefix listed earlier in the table.
///
/// With first-match lookup a prefix that extends an earlier one (e.g. "8903.92"
/// after "8903") could never be selected.
pub fn validate_special_tax_rules(rules: &[SpecialTaxRule]) -> Result<(), RuleTableError> {
    for (i, earlier) in rules.iter().enumerate() {
        if earlier.tariff_prefixes.is_empty() {
            return Err(RuleTableError::EmptyPrefixes {
                rule: earlier.sub_category,
            });
        }
        for later in &rules[i + 1..] {
            for &shadowed in later.tariff_prefixes {
                if let Some(prefix) = earlier.matching_prefix(shadowed) {
                    return Err(RuleTableError::ShadowedPrefix {
                        earlier: earlier.sub_category,
                        prefix,
                        later: later.sub_category,
                        shadowed,
                    });
                }
            }
        }
    }
    Ok(())
}

pub fn validate_certification_rules(rules: &[CertificationRule]) -> Result<(), RuleTableError> {
    for rule in rules {
        for &chapter in rule.tariff_chapters {
            if chapter.len() != 2 || !chapter.chars().all(|c| c.is_ascii_digit()) {
                return Err(RuleTableError::InvalidChapter {
                    rule: rule.document,
                    chapter,
                });
            }
        }
    }
    Ok(())
}
