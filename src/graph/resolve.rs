//! Skip-range edge resolution
//!
//! A bundle that declares a skip-range implicitly replaces every other
//! bundle in its package whose version falls inside the range. Resolution is
//! a pairwise scan per package; catalogs are small per package, so no
//! indexed range matching is needed.
//!
//! Malformed data never aborts the run: a bundle that cannot be graphed
//! (invalid skip-range or invalid version) is removed from its package and
//! reported as a warning.

use crate::error::GraphWarning;
use crate::graph::catalog::{Catalog, Package};
use crate::range::{parse_version, SkipRange};

/// Resolve skip-range edges across the whole catalog, removing bundles that
/// cannot be graphed. Returns the warnings produced along the way.
pub fn resolve(catalog: &mut Catalog) -> Vec<GraphWarning> {
    let mut warnings = Vec::new();
    for package in catalog.packages_mut() {
        resolve_package(package, &mut warnings);
    }
    catalog.drop_empty_packages();
    warnings
}

fn resolve_package(package: &mut Package, warnings: &mut Vec<GraphWarning>) {
    let owners: Vec<String> = package
        .bundles()
        .filter(|b| !b.skip_range.is_empty())
        .map(|b| b.name.clone())
        .collect();

    for owner_name in owners {
        // The owner may already have been dropped as an invalid-version
        // candidate earlier in this pass.
        let Some(owner) = package.get(&owner_name) else {
            continue;
        };

        let range = match SkipRange::parse(&owner.skip_range) {
            Ok(range) => range,
            Err(err) => {
                warnings.push(GraphWarning::InvalidSkipRange {
                    bundle: owner_name.clone(),
                    range: owner.skip_range.clone(),
                    source: err,
                });
                package.remove(&owner_name);
                continue;
            }
        };

        let candidates: Vec<(String, String)> = package
            .bundles()
            .filter(|b| b.present && b.name != owner_name)
            .map(|b| (b.name.clone(), b.version.clone()))
            .collect();

        let mut matched = Vec::new();
        for (name, version) in candidates {
            match parse_version(&version) {
                Ok(v) if range.matches(&v) => matched.push(name),
                Ok(_) => {}
                Err(err) => {
                    warnings.push(GraphWarning::InvalidVersion {
                        bundle: name.clone(),
                        version,
                        source: err,
                    });
                    package.remove(&name);
                }
            }
        }

        if let Some(owner) = package.get_mut(&owner_name) {
            owner.skip_range_replaces.extend(matched);
        }
    }

    // Edges must not point at bundles dropped above.
    package.strip_removed_targets();
}
