/// Cosine similarity of two equal-length vectors; `0.0` when either has zero norm.
pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f32 {
    debug_assert_eq!(left.len(), right.len());
    let (dot, left_norm, right_norm) = left.iter().zip(right).fold(
        (0.0_f32, 0.0_f32, 0.0_f32),
        |(dot, l, r), (a, b)| (dot + a * b, l + a * a, r + b * b),
    );
    if left_norm == 0.0 || right_norm == 0.0 {
        return 0.0;
    }
    dot / (left_norm.sqrt() * right_norm.sqrt())
}
