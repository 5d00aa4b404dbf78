use crate::SemanticError;

/// Reduces a flattened model output to one vector per input text.
///
/// `dims` is the output shape. `[batch, hidden]` is already pooled and is split into rows.
/// `[batch, seq, hidden]` holds token embeddings; each row becomes the mean of the positions
/// whose attention mask is non-zero, as sentence-transformers models expect. A row with no
/// attended token pools to zeros.
pub fn mean_pool(
    flat: &[f32],
    dims: &[usize],
    masks: &[Vec<i64>],
) -> Result<Vec<Vec<f32>>, SemanticError> {
    let expected: usize = dims.iter().product();
    if flat.len() != expected {
        return Err(SemanticError::Inference(format!(
            "model output has {} values for shape {dims:?}",
            flat.len()
        )));
    }

    match *dims {
        [batch, hidden] => {
            check_batch(batch, masks.len())?;
            if hidden == 0 {
                return Ok(vec![Vec::new(); batch]);
            }
            Ok(flat.chunks(hidden).map(<[f32]>::to_vec).collect())
        }
        [batch, seq, hidden] => {
            check_batch(batch, masks.len())?;
            let mut pooled = Vec::with_capacity(batch);
            for (b, mask) in masks.iter().enumerate() {
                let mut sum = vec![0f32; hidden];
                let mut attended = 0usize;
                for s in 0..seq {
                    if mask.get(s).copied().unwrap_or(0) == 0 {
                        continue;
                    }
                    let offset = (b * seq + s) * hidden;
                    for (acc, &x) in sum.iter_mut().zip(&flat[offset..offset + hidden]) {
                        *acc += x;
                    }
                    attended += 1;
                }
                if attended > 0 {
                    let inv = (attended as f32).recip();
                    sum.iter_mut().for_each(|x| *x *= inv);
                }
                pooled.push(sum);
            }
            Ok(pooled)
        }
        _ => Err(SemanticError::Inference(format!(
            "unsupported model output shape {dims:?}"
        ))),
    }
}

fn check_batch(batch: usize, inputs: usize) -> Result<(), SemanticError> {
    if batch != inputs {
        return Err(SemanticError::Inference(format!(
            "model returned {batch} rows for {inputs} inputs"
        )));
    }
    Ok(())
}
