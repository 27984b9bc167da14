//! Programmatic SEO page matrix.
//!
//! Every product and every service is paired with every city to produce one
//! landing page per pair. Output order is offering-major, city-minor, matching
//! catalog order, so sitemap diffs stay stable between builds.
//!
//! Titles, descriptions and keyword lists are indexed by search engines.
//! Changing the templates below changes published content.

use crate::catalog::{self, Catalog, City, Offering, OfferingKind, Slug};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One city-targeted landing page for a product or service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPage {
    pub kind: OfferingKind,
    pub entity_slug: Slug,
    pub entity_name: String,
    pub city: Slug,
    pub city_name: String,
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
}

impl GeneratedPage {
    pub fn new(offering: &Offering, city: &City) -> Self {
        Self {
            kind: offering.kind(),
            entity_slug: offering.slug().clone(),
            entity_name: offering.name().to_string(),
            city: city.slug().clone(),
            city_name: city.name().to_string(),
            title: page_title(offering, city),
            description: page_description(offering, city),
            keywords: page_keywords(offering, city),
        }
    }

    /// `<entity>-<city>`, the last path segment of the page URL.
    pub fn route_slug(&self) -> String {
        route_slug(&self.entity_slug, &self.city)
    }

    /// Site-relative path, e.g. `/products/plain-plug-gauges-coimbatore`.
    pub fn path(&self) -> String {
        format!("{}/{}", self.kind.path_prefix(), self.route_slug())
    }
}

// Keys mirror the kind: `product`/`productName` or `service`/`serviceName`.
impl Serialize for GeneratedPage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (slug_key, name_key) = match self.kind {
            OfferingKind::Product => ("product", "productName"),
            OfferingKind::Service => ("service", "serviceName"),
        };
        let mut map = serializer.serialize_map(Some(9))?;
        map.serialize_entry(slug_key, &self.entity_slug)?;
        map.serialize_entry("city", &self.city)?;
        map.serialize_entry(name_key, &self.entity_name)?;
        map.serialize_entry("cityName", &self.city_name)?;
        map.serialize_entry("title", &self.title)?;
        map.serialize_entry("description", &self.description)?;
        map.serialize_entry("keywords", &self.keywords)?;
        map.serialize_entry("slug", &self.route_slug())?;
        map.serialize_entry("path", &self.path())?;
        map.end()
    }
}

/// Route-only projection of a generated page.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityRoute {
    pub kind: OfferingKind,
    pub slug: String,
    pub entity_slug: Slug,
    pub city_slug: Slug,
}

impl CityRoute {
    pub fn path(&self) -> String {
        format!("{}/{}", self.kind.path_prefix(), self.slug)
    }
}

pub fn page_title(offering: &Offering, city: &City) -> String {
    format!(
        "{} in {} | {}",
        offering.name(),
        city.name(),
        offering.kind().title_suffix()
    )
}

pub fn page_description(offering: &Offering, city: &City) -> String {
    format!(
        "{} Serving manufacturers in {}, {}.",
        offering.description(),
        city.name(),
        city.description()
    )
}

pub fn page_keywords(offering: &Offering, city: &City) -> Vec<String> {
    let mut keywords = offering.keywords().to_vec();
    keywords.push(city.name().to_string());
    keywords.push(format!("{} {}", city.name(), offering.name()));
    keywords
}

fn route_slug(entity: &Slug, city: &Slug) -> String {
    format!("{entity}-{city}")
}

impl Catalog {
    fn city_pages(&self, kind: OfferingKind) -> Vec<GeneratedPage> {
        let offerings = self.offerings(kind);
        let mut pages = Vec::with_capacity(offerings.len() * self.cities.len());
        for offering in offerings {
            for city in &self.cities {
                pages.push(GeneratedPage::new(offering, city));
            }
        }
        pages
    }

    fn city_routes(&self, kind: OfferingKind) -> Vec<CityRoute> {
        self.city_pages(kind)
            .into_iter()
            .map(|page| CityRoute {
                kind,
                slug: page.route_slug(),
                entity_slug: page.entity_slug,
                city_slug: page.city,
            })
            .collect()
    }

    fn city_page(&self, kind: OfferingKind, entity_slug: &str, city_slug: &str) -> Option<GeneratedPage> {
        self.city_pages(kind)
            .into_iter()
            .find(|page| page.entity_slug == entity_slug && page.city == city_slug)
    }

    pub fn product_city_pages(&self) -> Vec<GeneratedPage> {
        self.city_pages(OfferingKind::Product)
    }

    pub fn service_city_pages(&self) -> Vec<GeneratedPage> {
        self.city_pages(OfferingKind::Service)
    }

    pub fn product_city_page(&self, product_slug: &str, city_slug: &str) -> Option<GeneratedPage> {
        self.city_page(OfferingKind::Product, product_slug, city_slug)
    }

    pub fn service_city_page(&self, service_slug: &str, city_slug: &str) -> Option<GeneratedPage> {
        self.city_page(OfferingKind::Service, service_slug, city_slug)
    }

    pub fn product_city_routes(&self) -> Vec<CityRoute> {
        self.city_routes(OfferingKind::Product)
    }

    pub fn service_city_routes(&self) -> Vec<CityRoute> {
        self.city_routes(OfferingKind::Service)
    }

    /// Resolves the last URL segment of a landing page (`<entity>-<city>`).
    ///
    /// Both halves may contain hyphens, so the segment is matched against the
    /// enumerated routes rather than split.
    pub fn resolve_city_page(&self, kind: OfferingKind, route_slug: &str) -> Option<GeneratedPage> {
        let route = self
            .city_routes(kind)
            .into_iter()
            .find(|route| route.slug == route_slug)?;
        self.city_page(kind, route.entity_slug.as_str(), route.city_slug.as_str())
    }

    /// The whole matrix grouped by city, in city catalog order.
    pub fn matrix_by_city(&self) -> Vec<CityIndex> {
        let mut groups: IndexMap<&Slug, CityIndex> = self
            .cities
            .iter()
            .map(|city| {
                (
                    city.slug(),
                    CityIndex {
                        city: city.slug().clone(),
                        city_name: city.name().to_string(),
                        products: Vec::new(),
                        services: Vec::new(),
                    },
                )
            })
            .collect();

        for page in self
            .product_city_pages()
            .into_iter()
            .chain(self.service_city_pages())
        {
            let Some(group) = groups.get_mut(&page.city) else {
                continue;
            };
            let link = IndexLink {
                name: page.entity_name.clone(),
                title: page.title.clone(),
                path: page.path(),
            };
            match page.kind {
                OfferingKind::Product => group.products.push(link),
                OfferingKind::Service => group.services.push(link),
            }
        }

        groups.into_values().collect()
    }
}

/// Landing pages available in one city.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityIndex {
    pub city: Slug,
    pub city_name: String,
    pub products: Vec<IndexLink>,
    pub services: Vec<IndexLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct IndexLink {
    pub name: String,
    pub title: String,
    pub path: String,
}

/// Every product landing page over the built-in catalog.
pub fn generate_product_city_pages() -> Vec<GeneratedPage> {
    catalog::builtin().product_city_pages()
}

/// Every service landing page over the built-in catalog.
pub fn generate_service_city_pages() -> Vec<GeneratedPage> {
    catalog::builtin().service_city_pages()
}

/// `None` when either slug is not in the built-in catalog.
pub fn get_product_city_page(product_slug: &str, city_slug: &str) -> Option<GeneratedPage> {
    catalog::builtin().product_city_page(product_slug, city_slug)
}

/// `None` when either slug is not in the built-in catalog.
pub fn get_service_city_page(service_slug: &str, city_slug: &str) -> Option<GeneratedPage> {
    catalog::builtin().service_city_page(service_slug, city_slug)
}

pub static ALL_PRODUCT_CITY_ROUTES: Lazy<Vec<CityRoute>> =
    Lazy::new(|| catalog::builtin().product_city_routes());

pub static ALL_SERVICE_CITY_ROUTES: Lazy<Vec<CityRoute>> =
    Lazy::new(|| catalog::builtin().service_city_routes());

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CityDef, OfferingDef};
    use std::collections::HashSet;

    fn small_catalog() -> Catalog {
        Catalog::from_definitions(
            &[OfferingDef {
                slug: "plain-plug-gauges",
                name: "Plain Plug Gauges",
                description: "Go and no-go plug gauges.",
                keywords: &["plug gauge", "go no go gauge"],
            }],
            &[OfferingDef {
                slug: "gauge-calibration",
                name: "Gauge Calibration",
                description: "Traceable calibration.",
                keywords: &["calibration"],
            }],
            &[
                CityDef {
                    slug: "coimbatore",
                    name: "Coimbatore",
                    description: "Manchester of South India",
                },
                CityDef {
                    slug: "chennai",
                    name: "Chennai",
                    description: "Detroit of Asia",
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_product_title_scenario() {
        let page = small_catalog()
            .product_city_page("plain-plug-gauges", "coimbatore")
            .unwrap();
        assert_eq!(
            page.title,
            "Plain Plug Gauges in Coimbatore | Precision Gauges Supplier"
        );
        assert_eq!(
            page.description,
            "Go and no-go plug gauges. Serving manufacturers in Coimbatore, Manchester of South India."
        );
        assert_eq!(
            page.keywords,
            vec![
                "plug gauge",
                "go no go gauge",
                "Coimbatore",
                "Coimbatore Plain Plug Gauges"
            ]
        );
        assert_eq!(page.path(), "/products/plain-plug-gauges-coimbatore");
    }

    #[test]
    fn test_builtin_title_scenario() {
        let page = get_product_city_page("plain-plug-gauges", "coimbatore").unwrap();
        assert_eq!(
            page.title,
            "Plain Plug Gauges in Coimbatore | Precision Gauges Supplier"
        );
    }

    #[test]
    fn test_service_title_uses_service_suffix() {
        let page = small_catalog()
            .service_city_page("gauge-calibration", "chennai")
            .unwrap();
        assert_eq!(page.title, "Gauge Calibration in Chennai | Precision Gauge Services");
        assert_eq!(page.path(), "/services/gauge-calibration-chennai");
    }

    #[test]
    fn test_iteration_order_is_offering_major() {
        let pages = small_catalog().product_city_pages();
        let cities: Vec<&str> = pages.iter().map(|p| p.city.as_str()).collect();
        assert_eq!(cities, vec!["coimbatore", "chennai"]);

        let builtin = catalog::builtin();
        let pages = generate_product_city_pages();
        let mut expected = Vec::new();
        for product in builtin.products() {
            for city in builtin.cities() {
                expected.push((product.slug().clone(), city.slug().clone()));
            }
        }
        let actual: Vec<_> = pages
            .into_iter()
            .map(|p| (p.entity_slug, p.city))
            .collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_matrix_sizes_and_uniqueness() {
        let catalog = catalog::builtin();
        let products = generate_product_city_pages();
        let services = generate_service_city_pages();
        assert_eq!(products.len(), catalog.products().len() * catalog.cities().len());
        assert_eq!(services.len(), catalog.services().len() * catalog.cities().len());

        for pages in [&products, &services] {
            let pairs: HashSet<_> = pages
                .iter()
                .map(|p| (p.entity_slug.clone(), p.city.clone()))
                .collect();
            assert_eq!(pairs.len(), pages.len());
        }
    }

    #[test]
    fn test_round_trip_lookup() {
        let catalog = catalog::builtin();
        for product in catalog.products() {
            for city in catalog.cities() {
                let page = get_product_city_page(product.slug().as_str(), city.slug().as_str())
                    .expect("page exists");
                assert_eq!(&page.entity_slug, product.slug());
                assert_eq!(&page.city, city.slug());
            }
        }
        for service in catalog.services() {
            for city in catalog.cities() {
                let page = get_service_city_page(service.slug().as_str(), city.slug().as_str())
                    .expect("page exists");
                assert_eq!(&page.entity_slug, service.slug());
                assert_eq!(page.kind, OfferingKind::Service);
            }
        }
    }

    #[test]
    fn test_negative_lookups_return_none() {
        assert!(get_product_city_page("nonexistent", "coimbatore").is_none());
        assert!(get_product_city_page("plain-plug-gauges", "nonexistent").is_none());
        assert!(get_service_city_page("plain-plug-gauges", "coimbatore").is_none());
        assert!(get_service_city_page("", "").is_none());
    }

    #[test]
    fn test_generation_is_deterministic() {
        assert_eq!(generate_product_city_pages(), generate_product_city_pages());
        assert_eq!(generate_service_city_pages(), generate_service_city_pages());
    }

    #[test]
    fn test_routes_mirror_matrix() {
        let matrices = [
            (&*ALL_PRODUCT_CITY_ROUTES, generate_product_city_pages()),
            (&*ALL_SERVICE_CITY_ROUTES, generate_service_city_pages()),
        ];
        for (routes, pages) in matrices {
            assert_eq!(routes.len(), pages.len());
            for (route, page) in routes.iter().zip(&pages) {
                assert_eq!(route.slug, format!("{}-{}", page.entity_slug, page.city));
                assert_eq!(route.slug, page.route_slug());
                assert_eq!(route.entity_slug, page.entity_slug);
                assert_eq!(route.city_slug, page.city);
            }

            let distinct: HashSet<_> = routes.iter().map(|r| r.slug.as_str()).collect();
            assert_eq!(distinct.len(), routes.len());
        }
    }

    #[test]
    fn test_resolve_city_page() {
        let catalog = small_catalog();
        let page = catalog
            .resolve_city_page(OfferingKind::Product, "plain-plug-gauges-chennai")
            .unwrap();
        assert_eq!(page.city, "chennai");
        assert!(catalog
            .resolve_city_page(OfferingKind::Service, "plain-plug-gauges-chennai")
            .is_none());
        assert!(catalog
            .resolve_city_page(OfferingKind::Product, "plain-plug-gauges")
            .is_none());
    }

    #[test]
    fn test_serialized_keys_follow_kind() {
        let catalog = small_catalog();
        let product = serde_json::to_value(
            catalog.product_city_page("plain-plug-gauges", "coimbatore").unwrap(),
        )
        .unwrap();
        assert_eq!(product["product"], "plain-plug-gauges");
        assert_eq!(product["productName"], "Plain Plug Gauges");
        assert_eq!(product["cityName"], "Coimbatore");
        assert!(product.get("service").is_none());

        let service = serde_json::to_value(
            catalog.service_city_page("gauge-calibration", "coimbatore").unwrap(),
        )
        .unwrap();
        assert_eq!(service["service"], "gauge-calibration");
        assert_eq!(service["serviceName"], "Gauge Calibration");
    }

    #[test]
    fn test_matrix_by_city_groups_every_page_once() {
        let catalog = small_catalog();
        let groups = catalog.matrix_by_city();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].city, "coimbatore");
        assert_eq!(groups[0].products.len(), 1);
        assert_eq!(groups[0].services.len(), 1);
        assert_eq!(
            groups[1].services[0].path,
            "/services/gauge-calibration-chennai"
        );
    }
}
