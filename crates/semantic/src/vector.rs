use crate::SemanticError;

/// In-place L2 normalization; zero vectors and vectors with a non-finite component are
/// left untouched.
pub fn l2_normalize_in_place(v: &mut [f32]) {
    let norm_sq: f64 = v.iter().map(|&x| f64::from(x) * f64::from(x)).sum();
    if norm_sq > 0.0 && norm_sq.is_finite() {
        let inv_norm = norm_sq.sqrt().recip();
        for x in v.iter_mut() {
            *x = (f64::from(*x) * inv_norm) as f32;
        }
    }
}

/// Cosine similarity in `[-1, 1]`.
///
/// Vectors do not need to be pre-normalized. A zero-magnitude side yields `0.0` rather than
/// `NaN`. Vectors of different dimension, or with a `NaN` or infinite component, are an error.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, SemanticError> {
    if a.len() != b.len() {
        return Err(SemanticError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    // f64 accumulators cannot overflow on finite f32 inputs.
    let mut dot = 0f64;
    let mut norm_a = 0f64;
    let mut norm_b = 0f64;
    for (&x, &y) in a.iter().zip(b) {
        if !x.is_finite() || !y.is_finite() {
            return Err(SemanticError::Inference(
                "embedding contains a non-finite component".into(),
            ));
        }
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    let cosine = dot / (norm_a.sqrt() * norm_b.sqrt());
    if !cosine.is_finite() {
        return Err(SemanticError::Inference(
            "cosine similarity is not finite".into(),
        ));
    }
    Ok(cosine.clamp(-1.0, 1.0) as f32)
}
