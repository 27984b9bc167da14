//! Static catalogs of products, services and cities.
//!
//! Catalog entries are authored as `&'static` definitions in [`data`] and
//! promoted into validated, immutable values by [`Catalog::from_definitions`].
//! A malformed or duplicated slug is a configuration defect: the constructor
//! rejects it so the server refuses to start instead of publishing two pages
//! under one URL.

pub mod data;
mod slug;

pub use slug::{Slug, SlugError};

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashSet;
use strum::{AsRefStr, Display};
use thiserror::Error;

/// Static definition of a product or service.
#[derive(Debug, Clone, Copy)]
pub struct OfferingDef {
    pub slug: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub keywords: &'static [&'static str],
}

/// Static definition of a city.
#[derive(Debug, Clone, Copy)]
pub struct CityDef {
    pub slug: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// Which catalog an entry or error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    Products,
    Services,
    Cities,
}

/// Whether an offering is sold as a product or performed as a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OfferingKind {
    Product,
    Service,
}

impl OfferingKind {
    /// URL prefix of the city landing pages for this kind.
    pub fn path_prefix(&self) -> &'static str {
        match self {
            OfferingKind::Product => "/products",
            OfferingKind::Service => "/services",
        }
    }

    /// Fixed tail of every landing page title.
    pub fn title_suffix(&self) -> &'static str {
        match self {
            OfferingKind::Product => "Precision Gauges Supplier",
            OfferingKind::Service => "Precision Gauge Services",
        }
    }

    pub fn catalog(&self) -> CatalogKind {
        match self {
            OfferingKind::Product => CatalogKind::Products,
            OfferingKind::Service => CatalogKind::Services,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("{catalog} catalog is empty")]
    Empty { catalog: CatalogKind },

    #[error("{catalog} entry '{slug}' has an invalid slug: {source}")]
    InvalidSlug {
        catalog: CatalogKind,
        slug: String,
        #[source]
        source: SlugError,
    },

    #[error("{catalog} catalog contains duplicate slug '{slug}'")]
    DuplicateSlug { catalog: CatalogKind, slug: String },

    #[error("{catalog} entry '{slug}' has a blank {field}")]
    BlankField {
        catalog: CatalogKind,
        slug: String,
        field: &'static str,
    },

    #[error("{kind} route '{route}' is produced by more than one slug pair or offering")]
    AmbiguousRoute { kind: OfferingKind, route: String },
}

/// A product or a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Offering {
    kind: OfferingKind,
    slug: Slug,
    name: String,
    description: String,
    keywords: Vec<String>,
}

impl Offering {
    fn from_def(kind: OfferingKind, def: &OfferingDef) -> Result<Self, CatalogError> {
        let catalog = kind.catalog();
        let slug = Slug::new(def.slug).map_err(|source| CatalogError::InvalidSlug {
            catalog,
            slug: def.slug.to_string(),
            source,
        })?;
        ensure_filled(catalog, def.slug, "name", def.name)?;
        ensure_filled(catalog, def.slug, "description", def.description)?;

        Ok(Self {
            kind,
            slug,
            name: def.name.to_string(),
            description: def.description.to_string(),
            keywords: def.keywords.iter().map(|k| (*k).to_string()).collect(),
        })
    }

    pub fn kind(&self) -> OfferingKind {
        self.kind
    }

    pub fn slug(&self) -> &Slug {
        &self.slug
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    slug: Slug,
    name: String,
    description: String,
}

impl City {
    fn from_def(def: &CityDef) -> Result<Self, CatalogError> {
        let catalog = CatalogKind::Cities;
        let slug = Slug::new(def.slug).map_err(|source| CatalogError::InvalidSlug {
            catalog,
            slug: def.slug.to_string(),
            source,
        })?;
        ensure_filled(catalog, def.slug, "name", def.name)?;
        ensure_filled(catalog, def.slug, "description", def.description)?;

        Ok(Self {
            slug,
            name: def.name.to_string(),
            description: def.description.to_string(),
        })
    }

    pub fn slug(&self) -> &Slug {
        &self.slug
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Validated products, services and cities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    pub(crate) products: Vec<Offering>,
    pub(crate) services: Vec<Offering>,
    pub(crate) cities: Vec<City>,
}

impl Catalog {
    pub fn from_definitions(
        products: &[OfferingDef],
        services: &[OfferingDef],
        cities: &[CityDef],
    ) -> Result<Self, CatalogError> {
        let products = build_offerings(OfferingKind::Product, products)?;
        let services = build_offerings(OfferingKind::Service, services)?;

        if cities.is_empty() {
            return Err(CatalogError::Empty {
                catalog: CatalogKind::Cities,
            });
        }
        let cities = cities
            .iter()
            .map(City::from_def)
            .collect::<Result<Vec<_>, _>>()?;
        ensure_unique(CatalogKind::Cities, cities.iter().map(City::slug))?;

        let catalog = Self {
            products,
            services,
            cities,
        };
        catalog.ensure_routes_unambiguous()?;
        Ok(catalog)
    }

    /// Validates the built-in catalogs from [`data`].
    pub fn try_builtin() -> Result<Self, CatalogError> {
        Self::from_definitions(data::PRODUCTS, data::SERVICES, data::CITIES)
    }

    pub fn products(&self) -> &[Offering] {
        &self.products
    }

    pub fn services(&self) -> &[Offering] {
        &self.services
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn offerings(&self, kind: OfferingKind) -> &[Offering] {
        match kind {
            OfferingKind::Product => &self.products,
            OfferingKind::Service => &self.services,
        }
    }

    pub fn product(&self, slug: &str) -> Option<&Offering> {
        self.products.iter().find(|p| p.slug == slug)
    }

    pub fn service(&self, slug: &str) -> Option<&Offering> {
        self.services.iter().find(|s| s.slug == slug)
    }

    pub fn city(&self, slug: &str) -> Option<&City> {
        self.cities.iter().find(|c| c.slug == slug)
    }

    // "a-b" x "c" and "a" x "b-c" would share the URL "a-b-c", and "a" x "b"
    // would shadow an offering slugged "a-b".
    fn ensure_routes_unambiguous(&self) -> Result<(), CatalogError> {
        for kind in [OfferingKind::Product, OfferingKind::Service] {
            let mut seen: HashSet<String> = self
                .offerings(kind)
                .iter()
                .map(|offering| offering.slug.to_string())
                .collect();
            for offering in self.offerings(kind) {
                for city in &self.cities {
                    let route = format!("{}-{}", offering.slug, city.slug);
                    if !seen.insert(route.clone()) {
                        return Err(CatalogError::AmbiguousRoute { kind, route });
                    }
                }
            }
        }
        Ok(())
    }
}

static BUILTIN: Lazy<Catalog> =
    Lazy::new(|| Catalog::try_builtin().expect("built-in catalog is valid"));

/// The process-wide built-in catalog.
///
/// The server validates it with [`Catalog::try_builtin`] at startup, so by the
/// time requests arrive this cannot fail.
pub fn builtin() -> &'static Catalog {
    &BUILTIN
}

fn build_offerings(kind: OfferingKind, defs: &[OfferingDef]) -> Result<Vec<Offering>, CatalogError> {
    if defs.is_empty() {
        return Err(CatalogError::Empty {
            catalog: kind.catalog(),
        });
    }
    let offerings = defs
        .iter()
        .map(|def| Offering::from_def(kind, def))
        .collect::<Result<Vec<_>, _>>()?;
    ensure_unique(kind.catalog(), offerings.iter().map(Offering::slug))?;
    Ok(offerings)
}

fn ensure_unique<'a>(
    catalog: CatalogKind,
    slugs: impl Iterator<Item = &'a Slug>,
) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for slug in slugs {
        if !seen.insert(slug) {
            return Err(CatalogError::DuplicateSlug {
                catalog,
                slug: slug.to_string(),
            });
        }
    }
    Ok(())
}

fn ensure_filled(
    catalog: CatalogKind,
    slug: &str,
    field: &'static str,
    value: &str,
) -> Result<(), CatalogError> {
    if value.trim().is_empty() {
        return Err(CatalogError::BlankField {
            catalog,
            slug: slug.to_string(),
            field,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CITY: CityDef = CityDef {
        slug: "coimbatore",
        name: "Coimbatore",
        description: "Manchester of South India",
    };

    const PRODUCT: OfferingDef = OfferingDef {
        slug: "plain-plug-gauges",
        name: "Plain Plug Gauges",
        description: "Go and no-go plug gauges.",
        keywords: &["plug gauge"],
    };

    const SERVICE: OfferingDef = OfferingDef {
        slug: "gauge-calibration",
        name: "Gauge Calibration",
        description: "Traceable calibration.",
        keywords: &[],
    };

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = Catalog::try_builtin().expect("builtin catalog");
        assert!(!catalog.products().is_empty());
        assert!(!catalog.services().is_empty());
        assert!(!catalog.cities().is_empty());
        assert_eq!(builtin(), &catalog);
    }

    #[test]
    fn test_duplicate_slug_rejected() {
        let err = Catalog::from_definitions(&[PRODUCT, PRODUCT], &[SERVICE], &[CITY]).unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateSlug {
                catalog: CatalogKind::Products,
                slug: "plain-plug-gauges".to_string(),
            }
        );

        let err = Catalog::from_definitions(&[PRODUCT], &[SERVICE], &[CITY, CITY]).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::DuplicateSlug {
                catalog: CatalogKind::Cities,
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_slug_rejected() {
        let bad = OfferingDef {
            slug: "Plain Plug",
            ..PRODUCT
        };
        let err = Catalog::from_definitions(&[bad], &[SERVICE], &[CITY]).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidSlug { .. }));
        assert!(err.to_string().contains("Plain Plug"));
    }

    #[test]
    fn test_empty_catalogs_rejected() {
        assert_eq!(
            Catalog::from_definitions(&[], &[SERVICE], &[CITY]).unwrap_err(),
            CatalogError::Empty {
                catalog: CatalogKind::Products
            }
        );
        assert_eq!(
            Catalog::from_definitions(&[PRODUCT], &[SERVICE], &[]).unwrap_err(),
            CatalogError::Empty {
                catalog: CatalogKind::Cities
            }
        );
    }

    #[test]
    fn test_blank_name_rejected() {
        let blank = CityDef { name: "  ", ..CITY };
        let err = Catalog::from_definitions(&[PRODUCT], &[SERVICE], &[blank]).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::BlankField { field: "name", .. }
        ));
    }

    #[test]
    fn test_ambiguous_route_rejected() {
        let a = OfferingDef {
            slug: "ring-gauges",
            ..PRODUCT
        };
        let b = OfferingDef {
            slug: "ring",
            ..PRODUCT
        };
        let c1 = CityDef {
            slug: "pune",
            ..CITY
        };
        let c2 = CityDef {
            slug: "gauges-pune",
            ..CITY
        };
        let err = Catalog::from_definitions(&[a, b], &[SERVICE], &[c1, c2]).unwrap_err();
        assert_eq!(
            err,
            CatalogError::AmbiguousRoute {
                kind: OfferingKind::Product,
                route: "ring-gauges-pune".to_string(),
            }
        );
    }

    #[test]
    fn test_city_route_shadowing_offering_rejected() {
        let plain = OfferingDef {
            slug: "thread-plug-gauges",
            ..PRODUCT
        };
        let short = OfferingDef {
            slug: "thread",
            ..PRODUCT
        };
        let city = CityDef {
            slug: "plug-gauges",
            ..CITY
        };
        let err = Catalog::from_definitions(&[plain, short], &[SERVICE], &[city]).unwrap_err();
        assert_eq!(
            err,
            CatalogError::AmbiguousRoute {
                kind: OfferingKind::Product,
                route: "thread-plug-gauges".to_string(),
            }
        );
    }

    #[test]
    fn test_lookup_by_slug() {
        let catalog = Catalog::from_definitions(&[PRODUCT], &[SERVICE], &[CITY]).unwrap();
        assert_eq!(catalog.product("plain-plug-gauges").unwrap().name(), "Plain Plug Gauges");
        assert_eq!(catalog.service("gauge-calibration").unwrap().kind(), OfferingKind::Service);
        assert_eq!(catalog.city("coimbatore").unwrap().description(), "Manchester of South India");
        assert!(catalog.product("gauge-calibration").is_none());
        assert!(catalog.city("nowhere").is_none());
    }
}
