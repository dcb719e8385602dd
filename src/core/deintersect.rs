//! Mutually exclusive isochrone bands
//!
//! Input is ordered outermost first. A cumulative union pass makes every
//! feature cover all later ones, then each feature has its successor cut out.
//! The last feature is left as is.

use geo::BooleanOps;

use crate::core::assemble::IsochroneFeature;

/// Make the features pairwise interior-disjoint
///
/// Properties and order are kept. The union of the output equals the union of
/// the input. A difference that leaves nothing yields an empty geometry, so the
/// feature count never changes.
pub fn deintersect(mut features: Vec<IsochroneFeature>) -> Vec<IsochroneFeature> {
    let n = features.len();
    if n < 2 {
        return features;
    }

    for i in 0..n - 1 {
        for j in i..n - 1 {
            let merged = features[i].geometry.union(&features[j + 1].geometry);
            features[i].geometry = merged;
        }
    }

    for i in 0..n - 1 {
        let cut = features[i].geometry.difference(&features[i + 1].geometry);
        features[i].geometry = cut;
    }

    log::debug!("deintersected {n} features");
    features
}
