use crate::expression::Expr;
use crate::length::length_km_expression;

/// One length tier of the ways legend: the half-open interval
/// `[min_km, max_km)`, open-ended when `max_km` is `None`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LegendBucket {
    pub label: &'static str,
    pub color: &'static str,
    pub min_km: f64,
    pub max_km: Option<f64>,
}

impl LegendBucket {
    pub fn contains(&self, km: f64) -> bool {
        km >= self.min_km && self.max_km.is_none_or(|max| km < max)
    }
}

pub const BUCKET_COUNT: usize = 5;

/// Partition of `[0, ∞)`.
pub static WAYS_LEGEND_BUCKETS: [LegendBucket; BUCKET_COUNT] = [
    LegendBucket { label: "0 – 1 km", color: "#8BC34A", min_km: 0.0, max_km: Some(1.0) },
    LegendBucket { label: "1 – 3 km", color: "#FFD54F", min_km: 1.0, max_km: Some(3.0) },
    LegendBucket { label: "3 – 6 km", color: "#FFB347", min_km: 3.0, max_km: Some(6.0) },
    LegendBucket { label: "6 – 10 km", color: "#FF7043", min_km: 6.0, max_km: Some(10.0) },
    LegendBucket { label: "10+ km", color: "#E53935", min_km: 10.0, max_km: None },
];

/// Index of the bucket containing `km`, if `km` is non-negative.
pub fn bucket_index(km: f64) -> Option<usize> {
    WAYS_LEGEND_BUCKETS.iter().position(|b| b.contains(km))
}

/// Which legend buckets are enabled, in bucket order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LegendSelection([bool; BUCKET_COUNT]);

impl Default for LegendSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl LegendSelection {
    pub const fn new(flags: [bool; BUCKET_COUNT]) -> Self {
        Self(flags)
    }

    pub const fn all() -> Self {
        Self([true; BUCKET_COUNT])
    }

    pub const fn none() -> Self {
        Self([false; BUCKET_COUNT])
    }

    pub fn flags(&self) -> [bool; BUCKET_COUNT] {
        self.0
    }

    pub fn is_enabled(&self, index: usize) -> bool {
        self.0.get(index).copied().unwrap_or(false)
    }

    /// Flips one bucket. Out-of-range indices are ignored.
    pub fn toggle(&mut self, index: usize) {
        if let Some(f) = self.0.get_mut(index) {
            *f = !*f;
        }
    }

    pub fn any_enabled(&self) -> bool {
        self.0.iter().any(|f| *f)
    }

    pub fn enabled(&self) -> impl Iterator<Item = &'static LegendBucket> + '_ {
        WAYS_LEGEND_BUCKETS
            .iter()
            .zip(self.0)
            .filter_map(|(b, on)| on.then_some(b))
    }

    /// Local counterpart of [`ways_legend_filter`].
    pub fn admits(&self, km: f64) -> bool {
        self.enabled().any(|b| b.contains(km))
    }
}

/// `["all", [">=", len, min], ["<", len, max]]`; open-ended buckets only get
/// the lower clause.
pub fn bucket_filter(bucket: &LegendBucket) -> Expr {
    let len = length_km_expression();
    let mut clauses = vec![Expr::ge(len.clone(), Expr::lit(bucket.min_km))];
    if let Some(max) = bucket.max_km {
        clauses.push(Expr::lt(len, Expr::lit(max)));
    }
    Expr::all(clauses)
}

/// Predicate for the ways layer.
///
/// With nothing enabled this is `["==", 1, 0]` rather than an absent
/// filter, which the engine would read as "show everything". With every
/// bucket enabled it is still the explicit disjunction.
pub fn ways_legend_filter(selection: &LegendSelection) -> Expr {
    let filters: Vec<Expr> = selection.enabled().map(bucket_filter).collect();
    if filters.is_empty() {
        return Expr::never();
    }
    Expr::any(filters)
}

/// Filter to install on the ways layer, or `None` to clear it while ways are
/// hidden.
pub fn ways_layer_filter(selection: &LegendSelection, show_ways: bool) -> Option<Expr> {
    show_ways.then(|| ways_legend_filter(selection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression::FeatureContext;
    use serde_json::{Map, Value, json};

    fn feature_km(km: f64) -> Map<String, Value> {
        json!({"length_km": km}).as_object().cloned().unwrap()
    }

    #[test]
    fn buckets_partition_non_negative_reals() {
        for km in [0.0, 0.5, 0.999, 1.0, 2.0, 3.0, 5.9, 6.0, 9.99, 10.0, 250.0] {
            let hits = WAYS_LEGEND_BUCKETS.iter().filter(|b| b.contains(km)).count();
            assert_eq!(hits, 1, "km={km}");
        }
        assert_eq!(bucket_index(-0.1), None);
        assert_eq!(bucket_index(1.0), Some(1));
        assert_eq!(bucket_index(10.0), Some(4));
    }

    #[test]
    fn first_bucket_only() {
        let sel = LegendSelection::new([true, false, false, false, false]);
        let f = ways_legend_filter(&sel);
        assert!(f.matches(&FeatureContext::new(&feature_km(0.5))));
        assert!(!f.matches(&FeatureContext::new(&feature_km(2.0))));
    }

    #[test]
    fn empty_selection_matches_nothing() {
        let f = ways_legend_filter(&LegendSelection::none());
        assert_eq!(f.to_json(), json!(["==", 1, 0]));
        for km in [0.0, 1.0, 50.0] {
            assert!(!f.matches(&FeatureContext::new(&feature_km(km))));
        }
    }

    #[test]
    fn full_selection_is_explicit_disjunction() {
        let f = ways_legend_filter(&LegendSelection::all());
        let json = f.to_json();
        assert_eq!(json[0], json!("any"));
        assert_eq!(json.as_array().unwrap().len(), 1 + BUCKET_COUNT);
    }

    #[test]
    fn filter_agrees_with_local_admission_for_every_subset() {
        let lengths = [0.0, 0.4, 1.0, 2.9, 3.0, 4.5, 6.0, 7.7, 10.0, 42.0];
        for mask in 0u32..(1 << BUCKET_COUNT) {
            let mut flags = [false; BUCKET_COUNT];
            for (i, f) in flags.iter_mut().enumerate() {
                *f = mask & (1 << i) != 0;
            }
            let sel = LegendSelection::new(flags);
            let filter = ways_legend_filter(&sel);
            for km in lengths {
                let expected = bucket_index(km).is_some_and(|i| flags[i]);
                assert_eq!(
                    filter.matches(&FeatureContext::new(&feature_km(km))),
                    expected,
                    "mask={mask:05b} km={km}"
                );
                assert_eq!(sel.admits(km), expected);
            }
        }
    }

    #[test]
    fn meters_encoded_features_are_bucketed() {
        let p = json!({"length_m": 4200}).as_object().cloned().unwrap();
        let sel = LegendSelection::new([false, false, true, false, false]);
        assert!(ways_legend_filter(&sel).matches(&FeatureContext::new(&p)));
    }

    #[test]
    fn hidden_ways_clear_the_filter() {
        assert!(ways_layer_filter(&LegendSelection::all(), false).is_none());
        assert!(ways_layer_filter(&LegendSelection::none(), true).is_some());
    }

    #[test]
    fn toggle_ignores_out_of_range() {
        let mut sel = LegendSelection::all();
        sel.toggle(2);
        sel.toggle(99);
        assert_eq!(sel.flags(), [true, true, false, true, true]);
    }
}
