use crate::core::TariffSuggestion;
use serde::Serialize;

/// A supplier catalog offered alongside the estimate. Price in CLP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Catalog {
    pub name: &'static str,
    pub url: &'static str,
    pub price_clp: u32,
}

struct CatalogEntry {
    catalog: Catalog,
    keywords: &'static [&'static str],
}

/// Checked in order; the first category with a matching keyword wins.
static CATALOGS: &[CatalogEntry] = &[
    CatalogEntry {
        catalog: Catalog {
            name: "Catálogo de Proveedores del Hogar",
            url: "https://impopro.com/catalogos/hogar",
            price_clp: 9900,
        },
        keywords: &[
            "hogar", "mueble", "decoración", "cocina", "lámpara", "silla", "mesa", "cama",
            "sofá", "vajilla", "textil",
        ],
    },
    CatalogEntry {
        catalog: Catalog {
            name: "Catálogo de Proveedores de Mascotas",
            url: "https://impopro.com/catalogos/mascotas",
            price_clp: 9900,
        },
        keywords: &[
            "mascota", "perro", "gato", "animal", "juguete para", "alimento para", "collar",
            "acuario", "veterinario",
        ],
    },
    CatalogEntry {
        catalog: Catalog {
            name: "Catálogo de Proveedores de Tecnología",
            url: "https://impopro.com/catalogos/tecnologia",
            price_clp: 14900,
        },
        keywords: &[
            "tecnología", "electrónico", "computador", "teléfono", "celular", "cámara",
            "audífono", "drone", "smartwatch", "teclado", "pantalla", "cargador",
        ],
    },
    CatalogEntry {
        catalog: Catalog {
            name: "Catálogo de Proveedores Fitness",
            url: "https://impopro.com/catalogos/fitness",
            price_clp: 9900,
        },
        keywords: &[
            "fitness", "deporte", "gimnasio", "entrenamiento", "mancuerna", "bicicleta",
            "ropa deportiva", "yoga", "suplemento",
        ],
    },
];

/// Keyword match over the product description and the top suggestion's description
pub fn recommend_catalog(description: &str, suggestions: &[TariffSuggestion]) -> Option<Catalog> {
    let top_description = suggestions.first().map_or("", |s| s.description.as_str());
    let text = format!("{} {}", description, top_description).to_lowercase();

    CATALOGS
        .iter()
        .find(|entry| entry.keywords.iter().any(|keyword| text.contains(keyword)))
        .map(|entry| entry.catalog)
}
