//! Reciprocal rank fusion (spec §4.4 step 3): merges the dense-vector
//! ranking and the BM25 ranking into one candidate list without needing
//! the two score scales to be comparable.

use std::collections::HashMap;

use uuid::Uuid;

/// `score = Σ 1/(k + rank)` summed across every ranked list a chunk
/// appears in, `rank` being 1-based position within that list.
pub fn reciprocal_rank_fusion(ranked_lists: &[Vec<Uuid>], k: u32) -> Vec<(Uuid, f64)> {
    let mut scores: HashMap<Uuid, f64> = HashMap::new();
    for list in ranked_lists {
        for (idx, chunk_id) in list.iter().enumerate() {
            let rank = (idx + 1) as f64;
            *scores.entry(*chunk_id).or_insert(0.0) += 1.0 / (k as f64 + rank);
        }
    }

    let mut fused: Vec<(Uuid, f64)> = scores.into_iter().collect();
    fused.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.0.cmp(&b.0)));
    fused
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_present_in_both_lists_outranks_single_list_match() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        // a: rank 1 dense, rank 2 lexical. b: rank 1 lexical only. c: rank 2 dense only.
        let dense = vec![a, c];
        let lexical = vec![b, a];

        let fused = reciprocal_rank_fusion(&[dense, lexical], 60);
        assert_eq!(fused[0].0, a);
    }

    #[test]
    fn empty_lists_produce_empty_fusion() {
        let fused = reciprocal_rank_fusion(&[], 60);
        assert!(fused.is_empty());
    }

    #[test]
    fn single_list_preserves_relative_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let fused = reciprocal_rank_fusion(&[vec![a, b]], 60);
        assert_eq!(fused.iter().map(|(id, _)| *id).collect::<Vec<_>>(), vec![a, b]);
    }
}
