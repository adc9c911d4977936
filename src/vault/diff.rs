use std::collections::BTreeMap;

use serde::Serialize;

use crate::glyph::Glyph;

/// Name-keyed comparison of two sigils.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SigilDiff {
    pub sigil_a: String,
    pub sigil_b: String,
    pub count_a: usize,
    pub count_b: usize,
    pub only_in_a: Vec<String>,
    pub only_in_b: Vec<String>,
    /// Common names whose vectors differ.
    pub differing: Vec<String>,
    /// Common names with identical vectors.
    pub unchanged: Vec<String>,
    /// True when nothing is only on one side and no common glyph differs.
    pub identical: bool,
}

impl SigilDiff {
    /// Compare two glyph lists. When a name repeats within one side, the
    /// later glyph wins.
    pub fn compute(sigil_a: &str, a: &[Glyph], sigil_b: &str, b: &[Glyph]) -> Self {
        let map_a = by_name(a);
        let map_b = by_name(b);

        let only_in_a: Vec<String> = map_a
            .keys()
            .filter(|name| !map_b.contains_key(*name))
            .map(|name| name.to_string())
            .collect();
        let only_in_b: Vec<String> = map_b
            .keys()
            .filter(|name| !map_a.contains_key(*name))
            .map(|name| name.to_string())
            .collect();

        let mut differing = Vec::new();
        let mut unchanged = Vec::new();
        for (name, vec_a) in &map_a {
            if let Some(vec_b) = map_b.get(name) {
                if vec_a == vec_b {
                    unchanged.push(name.to_string());
                } else {
                    differing.push(name.to_string());
                }
            }
        }

        let identical = only_in_a.is_empty() && only_in_b.is_empty() && differing.is_empty();
        Self {
            sigil_a: sigil_a.to_string(),
            sigil_b: sigil_b.to_string(),
            count_a: map_a.len(),
            count_b: map_b.len(),
            only_in_a,
            only_in_b,
            differing,
            unchanged,
            identical,
        }
    }

    pub fn common(&self) -> usize {
        self.differing.len() + self.unchanged.len()
    }
}

fn by_name(glyphs: &[Glyph]) -> BTreeMap<&str, &[f64]> {
    glyphs
        .iter()
        .map(|g| (g.name.as_str(), g.vector.as_slice()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_classifies_names() {
        let a = vec![
            Glyph::new("shared", vec![1.0]),
            Glyph::new("changed", vec![1.0]),
            Glyph::new("left", vec![0.0]),
        ];
        let b = vec![
            Glyph::new("changed", vec![2.0]),
            Glyph::new("shared", vec![1.0]),
            Glyph::new("right", vec![0.0]),
        ];

        let diff = SigilDiff::compute("a", &a, "b", &b);
        assert_eq!(diff.only_in_a, vec!["left"]);
        assert_eq!(diff.only_in_b, vec!["right"]);
        assert_eq!(diff.differing, vec!["changed"]);
        assert_eq!(diff.unchanged, vec!["shared"]);
        assert_eq!(diff.common(), 2);
        assert!(!diff.identical);
    }

    #[test]
    fn identical_sigils() {
        let a = vec![Glyph::new("x", vec![0.5, 0.5])];
        let diff = SigilDiff::compute("a", &a, "b", &a);
        assert!(diff.identical);
        assert_eq!(diff.unchanged, vec!["x"]);
    }

    #[test]
    fn verdict_is_serialized() {
        let a = vec![Glyph::new("x", vec![1.0])];
        let b = vec![Glyph::new("x", vec![1.5])];
        let json = serde_json::to_value(SigilDiff::compute("a", &a, "b", &b)).unwrap();
        assert_eq!(json["identical"], false);
        assert_eq!(json["unchanged"], serde_json::json!([]));
        assert_eq!(json["differing"], serde_json::json!(["x"]));
    }

    #[test]
    fn duplicate_names_last_wins() {
        let a = vec![Glyph::new("x", vec![1.0]), Glyph::new("x", vec![2.0])];
        let b = vec![Glyph::new("x", vec![2.0])];
        let diff = SigilDiff::compute("a", &a, "b", &b);
        assert_eq!(diff.count_a, 1);
        assert!(diff.identical);
    }
}
