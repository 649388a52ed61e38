//! Catalog data model and accumulation
//!
//! An index dump is a stream of rows, one bundle observation per line:
//!
//! ```text
//! package|channel|bundle|depth|version|skipRange|replaces
//! ```
//!
//! The same bundle usually appears on several rows (once per channel entry),
//! so accumulation merges observations: channels and replaces targets are
//! unioned, the minimum observed depth is kept, and the first observation
//! wins for version, presence, and skip-range.

use std::collections::{BTreeMap, BTreeSet};
use std::io::BufRead;

use anyhow::{Context, Result};

use crate::error::GraphWarning;

/// Version label used for bundles that are referenced (e.g. as a replaces
/// target) but never observed with a concrete version. Keeps node labels
/// syntactically non-empty in every output format.
pub const PLACEHOLDER_VERSION: &str = "x.y.z";

/// Number of delimiter-separated fields in an index row.
pub const ROW_FIELDS: usize = 7;

/// One row of the index dump. Consumed immediately by [`Catalog::insert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub package_name: String,
    pub channel_name: String,
    pub bundle_name: String,
    /// Distance from the channel head; 0 marks the head itself.
    pub depth: u64,
    /// Empty when the bundle was referenced but not directly observed.
    pub bundle_version: String,
    pub bundle_skip_range: String,
    pub replaces_bundle_name: String,
}

impl CatalogEntry {
    /// Parse a delimiter-separated row.
    ///
    /// Returns `None` when the row has fewer than [`ROW_FIELDS`] fields;
    /// fields past the seventh are ignored. A depth that does not parse as
    /// an integer is treated as 0.
    pub fn parse(row: &str, delimiter: char) -> Option<Self> {
        let fields: Vec<&str> = row.split(delimiter).collect();
        if fields.len() < ROW_FIELDS {
            return None;
        }
        Some(Self {
            package_name: fields[0].to_string(),
            channel_name: fields[1].to_string(),
            bundle_name: fields[2].to_string(),
            depth: fields[3].trim().parse().unwrap_or(0),
            bundle_version: fields[4].to_string(),
            bundle_skip_range: fields[5].to_string(),
            replaces_bundle_name: fields[6].to_string(),
        })
    }
}

/// Stable handle to a bundle inside its package's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleId(usize);

/// A specific installable version of a package within the catalog.
#[derive(Debug, Clone)]
pub struct Bundle {
    pub name: String,

    /// Version string, or [`PLACEHOLDER_VERSION`] when never observed.
    pub version: String,

    /// True only if some row supplied a non-empty version for this bundle.
    pub present: bool,

    /// Declared skip-range expression, empty when none.
    pub skip_range: String,

    /// Smallest depth observed across all rows for this bundle.
    pub min_depth: u64,

    /// Channels this bundle belongs to.
    pub channels: BTreeSet<String>,

    /// Bundle names this bundle explicitly replaces.
    pub replaces: BTreeSet<String>,

    /// Bundle names this bundle implicitly replaces via its skip-range;
    /// filled in by the edge resolver, not the accumulator.
    pub skip_range_replaces: BTreeSet<String>,
}

impl Bundle {
    /// A bundle observed at depth 0 is a channel head.
    pub fn is_head(&self) -> bool {
        self.min_depth == 0
    }

    /// True when the bundle has any outgoing edge.
    pub fn has_edges(&self) -> bool {
        !self.replaces.is_empty() || !self.skip_range_replaces.is_empty()
    }
}

/// A package and its bundles.
///
/// Bundles live in an arena indexed by [`BundleId`]; a sorted name→id map
/// provides lookup and deterministic iteration. Removing a bundle unlinks it
/// from the index but keeps its arena slot, so ids handed out earlier stay
/// valid and no iterator is invalidated mid-scan.
#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    arena: Vec<Bundle>,
    index: BTreeMap<String, BundleId>,
    removed: BTreeSet<String>,
}

impl Package {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arena: Vec::new(),
            index: BTreeMap::new(),
            removed: BTreeSet::new(),
        }
    }

    /// Fold one row into the package: lookup-or-create the bundle, then
    /// merge. The first observation initializes version, presence,
    /// skip-range, and depth; every observation unions the channel, unions a
    /// non-empty replaces target, and lowers `min_depth`.
    pub fn observe(&mut self, entry: &CatalogEntry) {
        let id = match self.index.get(entry.bundle_name.as_str()) {
            Some(&id) => id,
            None => {
                let id = BundleId(self.arena.len());
                self.arena.push(Bundle {
                    name: entry.bundle_name.clone(),
                    version: if entry.bundle_version.is_empty() {
                        PLACEHOLDER_VERSION.to_string()
                    } else {
                        entry.bundle_version.clone()
                    },
                    present: !entry.bundle_version.is_empty(),
                    skip_range: entry.bundle_skip_range.clone(),
                    min_depth: entry.depth,
                    channels: BTreeSet::new(),
                    replaces: BTreeSet::new(),
                    skip_range_replaces: BTreeSet::new(),
                });
                self.index.insert(entry.bundle_name.clone(), id);
                id
            }
        };

        let bundle = &mut self.arena[id.0];
        bundle.channels.insert(entry.channel_name.clone());
        if !entry.replaces_bundle_name.is_empty() {
            bundle.replaces.insert(entry.replaces_bundle_name.clone());
        }
        bundle.min_depth = bundle.min_depth.min(entry.depth);
    }

    pub fn get(&self, name: &str) -> Option<&Bundle> {
        self.index.get(name).map(|id| &self.arena[id.0])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Bundle> {
        match self.index.get(name) {
            Some(&id) => Some(&mut self.arena[id.0]),
            None => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Drop a bundle from the package. The arena slot is retained so ids
    /// stay stable; the bundle just becomes unreachable through the index.
    pub fn remove(&mut self, name: &str) -> bool {
        if self.index.remove(name).is_some() {
            self.removed.insert(name.to_string());
            true
        } else {
            false
        }
    }

    /// Live bundles in name order.
    pub fn bundles(&self) -> impl Iterator<Item = &Bundle> {
        self.index.values().map(|id| &self.arena[id.0])
    }

    /// Names of bundles removed during resolution.
    pub fn removed_names(&self) -> &BTreeSet<String> {
        &self.removed
    }

    /// Union of channel names across all live bundles, sorted.
    pub fn channels(&self) -> BTreeSet<&str> {
        self.bundles()
            .flat_map(|b| b.channels.iter().map(String::as_str))
            .collect()
    }

    /// Strip edge targets that point at bundles removed during resolution.
    /// Targets that were never observed at all are kept; they render with a
    /// placeholder version.
    pub fn strip_removed_targets(&mut self) {
        if self.removed.is_empty() {
            return;
        }
        let removed = &self.removed;
        for bundle in &mut self.arena {
            bundle.replaces.retain(|target| !removed.contains(target));
            bundle
                .skip_range_replaces
                .retain(|target| !removed.contains(target));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }
}

/// The accumulated catalog: packages keyed and iterated by name.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    packages: BTreeMap<String, Package>,
}

impl Catalog {
    /// Consume an index dump, folding each row into the catalog.
    ///
    /// When `package_filter` is set, rows for other packages are skipped
    /// with no side effects. Blank lines are skipped silently; rows with too
    /// few fields are skipped with a [`GraphWarning::MalformedRow`]. Only a
    /// failed read of the underlying stream is an error.
    pub fn accumulate<R: BufRead>(
        reader: R,
        delimiter: char,
        package_filter: Option<&str>,
    ) -> Result<(Self, Vec<GraphWarning>)> {
        let mut catalog = Self::default();
        let mut warnings = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line.context("failed to read index row")?;
            if line.trim().is_empty() {
                continue;
            }
            let Some(entry) = CatalogEntry::parse(&line, delimiter) else {
                warnings.push(GraphWarning::MalformedRow {
                    line: idx + 1,
                    expected: ROW_FIELDS,
                    found: line.split(delimiter).count(),
                    delimiter,
                });
                continue;
            };
            if let Some(filter) = package_filter {
                if entry.package_name != filter {
                    continue;
                }
            }
            catalog.insert(&entry);
        }

        Ok((catalog, warnings))
    }

    /// Fold a single entry into the catalog.
    pub fn insert(&mut self, entry: &CatalogEntry) {
        self.packages
            .entry(entry.package_name.clone())
            .or_insert_with(|| Package::new(entry.package_name.clone()))
            .observe(entry);
    }

    pub fn get(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }

    /// Packages in name order.
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    pub fn packages_mut(&mut self) -> impl Iterator<Item = &mut Package> {
        self.packages.values_mut()
    }

    /// Drop packages whose bundles were all removed during resolution.
    pub fn drop_empty_packages(&mut self) {
        self.packages.retain(|_, package| !package.is_empty());
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accumulate(rows: &str) -> (Catalog, Vec<GraphWarning>) {
        Catalog::accumulate(rows.as_bytes(), '|', None).unwrap()
    }

    #[test]
    fn test_parse_entry() {
        let entry = CatalogEntry::parse("pkgA|stable|bundle-v2|1|0.9.0|<1.0.0|bundle-v1", '|')
            .unwrap();
        assert_eq!(entry.package_name, "pkgA");
        assert_eq!(entry.channel_name, "stable");
        assert_eq!(entry.bundle_name, "bundle-v2");
        assert_eq!(entry.depth, 1);
        assert_eq!(entry.bundle_version, "0.9.0");
        assert_eq!(entry.bundle_skip_range, "<1.0.0");
        assert_eq!(entry.replaces_bundle_name, "bundle-v1");
    }

    #[test]
    fn test_parse_entry_too_few_fields() {
        assert!(CatalogEntry::parse("pkgA|stable|bundle-v1", '|').is_none());
    }

    #[test]
    fn test_parse_entry_non_integer_depth_defaults_to_zero() {
        let entry = CatalogEntry::parse("pkgA|stable|b|abc|1.0.0||", '|').unwrap();
        assert_eq!(entry.depth, 0);
    }

    #[test]
    fn test_min_depth_takes_minimum() {
        let (catalog, _) = accumulate(
            "pkgA|stable|b|3|1.0.0||\n\
             pkgA|stable|b|0|1.0.0||\n\
             pkgA|stable|b|5|1.0.0||\n",
        );
        let bundle = catalog.get("pkgA").unwrap().get("b").unwrap();
        assert_eq!(bundle.min_depth, 0);
        assert!(bundle.is_head());
    }

    #[test]
    fn test_channels_union_across_rows() {
        let (catalog, _) = accumulate(
            "pkgA|stable|b|0|1.0.0||\n\
             pkgA|fast|b|2|1.0.0||\n",
        );
        let bundle = catalog.get("pkgA").unwrap().get("b").unwrap();
        let channels: Vec<&str> = bundle.channels.iter().map(String::as_str).collect();
        assert_eq!(channels, vec!["fast", "stable"]);
    }

    #[test]
    fn test_replaces_union_across_rows() {
        let (catalog, _) = accumulate(
            "pkgA|stable|b|1|1.0.0||old-1\n\
             pkgA|fast|b|1|1.0.0||old-2\n\
             pkgA|fast|b|1|1.0.0||\n",
        );
        let bundle = catalog.get("pkgA").unwrap().get("b").unwrap();
        let replaces: Vec<&str> = bundle.replaces.iter().map(String::as_str).collect();
        assert_eq!(replaces, vec!["old-1", "old-2"]);
    }

    #[test]
    fn test_first_observation_wins_for_version_fields() {
        // First row references the bundle without a version; the later row's
        // version does not retroactively mark it present.
        let (catalog, _) = accumulate(
            "pkgA|stable|b|1|||\n\
             pkgA|stable|b|1|1.0.0|<1.0.0|\n",
        );
        let bundle = catalog.get("pkgA").unwrap().get("b").unwrap();
        assert!(!bundle.present);
        assert_eq!(bundle.version, PLACEHOLDER_VERSION);
        assert_eq!(bundle.skip_range, "");
    }

    #[test]
    fn test_package_filter_skips_other_packages() {
        let (catalog, warnings) = Catalog::accumulate(
            "pkgA|stable|a|0|1.0.0||\npkgB|stable|b|0|1.0.0||\n".as_bytes(),
            '|',
            Some("pkgA"),
        )
        .unwrap();
        assert!(warnings.is_empty());
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("pkgA").is_some());
        assert!(catalog.get("pkgB").is_none());
    }

    #[test]
    fn test_malformed_row_warns_and_skips() {
        let (catalog, warnings) = accumulate("too|few\npkgA|stable|a|0|1.0.0||\n");
        assert!(catalog.get("pkgA").is_some());
        assert_eq!(warnings.len(), 1);
        assert!(matches!(
            warnings[0],
            GraphWarning::MalformedRow { line: 1, found: 2, .. }
        ));
    }

    #[test]
    fn test_blank_lines_skipped_silently() {
        let (catalog, warnings) = accumulate("\npkgA|stable|a|0|1.0.0||\n\n");
        assert!(warnings.is_empty());
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_custom_delimiter() {
        let (catalog, warnings) =
            Catalog::accumulate("pkgA;stable;a;0;1.0.0;;".as_bytes(), ';', None).unwrap();
        assert!(warnings.is_empty());
        assert!(catalog.get("pkgA").unwrap().get("a").unwrap().present);
    }

    #[test]
    fn test_remove_hides_bundle_and_records_name() {
        let (mut catalog, _) = accumulate(
            "pkgA|stable|a|0|1.0.0||\n\
             pkgA|stable|b|1|0.9.0||\n",
        );
        let package = catalog.packages_mut().next().unwrap();
        assert!(package.remove("a"));
        assert!(!package.remove("a"));
        assert!(!package.contains("a"));
        assert_eq!(package.len(), 1);
        assert!(package.removed_names().contains("a"));
        let names: Vec<&str> = package.bundles().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["b"]);
    }

    #[test]
    fn test_strip_removed_targets_keeps_unknown_targets() {
        let (mut catalog, _) = accumulate(
            "pkgA|stable|a|0|1.0.0||gone\n\
             pkgA|stable|a|0|1.0.0||never-seen\n\
             pkgA|stable|gone|1|0.9.0||\n",
        );
        let package = catalog.packages_mut().next().unwrap();
        package.remove("gone");
        package.strip_removed_targets();
        let bundle = package.get("a").unwrap();
        let replaces: Vec<&str> = bundle.replaces.iter().map(String::as_str).collect();
        assert_eq!(replaces, vec!["never-seen"]);
    }
}
