use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionTally {
    pub id: u32,
    pub area: u64,
    pub hits: u64,
}

/// Area and above-threshold pixel count for every nonzero label in one
/// sample, in ascending id order. NaN scores never count as hits.
pub fn tally_regions(predictions: &[f32], labels: &[u32], threshold: f32) -> Vec<RegionTally> {
    debug_assert_eq!(predictions.len(), labels.len());

    let mut tallies: BTreeMap<u32, (u64, u64)> = BTreeMap::new();
    for (&score, &label) in predictions.iter().zip(labels.iter()) {
        if label == 0 {
            continue;
        }
        let entry = tallies.entry(label).or_insert((0, 0));
        entry.0 += 1;
        if score > threshold {
            entry.1 += 1;
        }
    }

    tallies
        .into_iter()
        .map(|(id, (area, hits))| RegionTally { id, area, hits })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/regions.rs"]
mod tests;
