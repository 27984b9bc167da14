//! Built-in catalogs.
//!
//! Slugs here are public URL segments. Renaming one changes an indexed URL.

use super::{CityDef, OfferingDef};

pub const PRODUCTS: &[OfferingDef] = &[
    OfferingDef {
        slug: "plain-plug-gauges",
        name: "Plain Plug Gauges",
        description: "Go and no-go plain plug gauges ground and lapped to IS 3455 tolerances for fast bore inspection.",
        keywords: &["plain plug gauge", "go no go plug gauge", "bore gauge"],
    },
    OfferingDef {
        slug: "plain-ring-gauges",
        name: "Plain Ring Gauges",
        description: "Hardened plain ring gauges for checking shaft diameters in high-volume machining cells.",
        keywords: &["plain ring gauge", "go no go ring gauge", "shaft gauge"],
    },
    OfferingDef {
        slug: "thread-plug-gauges",
        name: "Thread Plug Gauges",
        description: "Metric, UNC, UNF and BSP thread plug gauges for verifying internal threads.",
        keywords: &["thread plug gauge", "metric thread gauge", "internal thread gauge"],
    },
    OfferingDef {
        slug: "thread-ring-gauges",
        name: "Thread Ring Gauges",
        description: "Adjustable and solid thread ring gauges for inspecting external threads.",
        keywords: &["thread ring gauge", "external thread gauge", "setting plug"],
    },
    OfferingDef {
        slug: "snap-gauges",
        name: "Snap Gauges",
        description: "Fixed and adjustable snap gauges for quick go and no-go checks of outside diameters.",
        keywords: &["snap gauge", "adjustable snap gauge", "od gauge"],
    },
    OfferingDef {
        slug: "taper-gauges",
        name: "Taper Gauges",
        description: "Taper plug and ring gauges for Morse, metric and custom tapers.",
        keywords: &["taper gauge", "morse taper gauge", "taper ring gauge"],
    },
    OfferingDef {
        slug: "spline-gauges",
        name: "Spline Gauges",
        description: "Involute and straight-sided spline plug and ring gauges made to drawing.",
        keywords: &["spline gauge", "spline plug gauge", "spline ring gauge"],
    },
    OfferingDef {
        slug: "special-purpose-gauges",
        name: "Special Purpose Gauges",
        description: "Custom receiver, position and profile gauges designed around your component drawings.",
        keywords: &["special gauge", "custom gauge", "receiver gauge"],
    },
];

pub const SERVICES: &[OfferingDef] = &[
    OfferingDef {
        slug: "gauge-calibration",
        name: "Gauge Calibration",
        description: "Traceable calibration of plug, ring, snap and thread gauges with certificates for audit.",
        keywords: &["gauge calibration", "calibration lab", "nabl calibration"],
    },
    OfferingDef {
        slug: "gauge-repair",
        name: "Gauge Repair and Reconditioning",
        description: "Re-lapping, re-chroming and resizing of worn gauges to extend their service life.",
        keywords: &["gauge repair", "gauge reconditioning", "re-lapping"],
    },
    OfferingDef {
        slug: "custom-gauge-manufacturing",
        name: "Custom Gauge Manufacturing",
        description: "Design and manufacture of gauges to customer drawings, from single pieces to batches.",
        keywords: &["custom gauge manufacturer", "gauge design", "gauge manufacturing"],
    },
    OfferingDef {
        slug: "inspection-fixtures",
        name: "Inspection Fixtures",
        description: "Checking fixtures and inspection jigs for assemblies and machined components.",
        keywords: &["inspection fixture", "checking fixture", "inspection jig"],
    },
];

pub const CITIES: &[CityDef] = &[
    CityDef {
        slug: "coimbatore",
        name: "Coimbatore",
        description: "Manchester of South India",
    },
    CityDef {
        slug: "chennai",
        name: "Chennai",
        description: "Detroit of Asia and home to major automotive plants",
    },
    CityDef {
        slug: "bangalore",
        name: "Bangalore",
        description: "hub for aerospace and precision engineering",
    },
    CityDef {
        slug: "hosur",
        name: "Hosur",
        description: "fast-growing industrial corridor for auto components",
    },
    CityDef {
        slug: "tiruppur",
        name: "Tiruppur",
        description: "centre of textile machinery and engineering units",
    },
    CityDef {
        slug: "madurai",
        name: "Madurai",
        description: "growing base for rubber and engineering industries",
    },
    CityDef {
        slug: "trichy",
        name: "Trichy",
        description: "home to heavy fabrication and boiler manufacturing",
    },
    CityDef {
        slug: "salem",
        name: "Salem",
        description: "steel city with expanding machining clusters",
    },
    CityDef {
        slug: "pune",
        name: "Pune",
        description: "automotive and engineering capital of Maharashtra",
    },
    CityDef {
        slug: "hyderabad",
        name: "Hyderabad",
        description: "centre for defence, aerospace and pharma machinery",
    },
];
