//! Cosine distance between embedding vectors.

/// Compute cosine distance `1 - cos(a, b)`. Lower means more similar.
///
/// Vectors of different length, empty vectors, and zero-magnitude vectors are
/// maximally dissimilar and return `f64::INFINITY`.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return f64::INFINITY;
    }

    let dot: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| (*x as f64) * (*y as f64))
        .sum();

    let mag_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return f64::INFINITY;
    }

    1.0 - dot / (mag_a * mag_b)
}
