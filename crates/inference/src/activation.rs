//! Output heads: independent per-label probabilities (multi-label aspect model) and a single
//! class distribution (sentiment model).

pub fn sigmoid(logits: &[f32]) -> Vec<f32> {
    logits.iter().map(|x| 1.0 / (1.0 + (-x).exp())).collect()
}

/// Numerically stable softmax. `None` when any logit is NaN or infinite.
pub fn softmax(logits: &[f32]) -> Option<Vec<f32>> {
    if !all_finite(logits) {
        return None;
    }
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum <= 0.0 || !sum.is_finite() {
        return None;
    }
    Some(exps.into_iter().map(|e| e / sum).collect())
}

pub fn all_finite(logits: &[f32]) -> bool {
    logits.iter().all(|x| x.is_finite())
}

/// Index and value of the largest probability; the first index wins ties.
pub fn argmax(probs: &[f32]) -> Option<(usize, f32)> {
    probs
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (idx, p)| match best {
            Some((_, top)) if top >= p => best,
            _ if p.is_nan() => best,
            _ => Some((idx, p)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigmoid_is_centered() {
        let probs = sigmoid(&[0.0, 10.0, -10.0]);
        assert!((probs[0] - 0.5).abs() < 1e-6);
        assert!(probs[1] > 0.99);
        assert!(probs[2] < 0.01);
    }

    #[test]
    fn softmax_sums_to_one_and_survives_large_logits() {
        let probs = softmax(&[1000.0, 1001.0, 999.0]).unwrap();
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert_eq!(argmax(&probs).map(|(idx, _)| idx), Some(1));
    }

    #[test]
    fn softmax_rejects_non_finite_logits() {
        assert_eq!(softmax(&[f32::NAN, 0.0, 1.0]), None);
        assert_eq!(softmax(&[f32::INFINITY, 0.0]), None);
        assert_eq!(softmax(&[]), None);
        assert!(!all_finite(&[0.5, f32::NEG_INFINITY]));
    }

    #[test]
    fn argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.4, 0.4, 0.2]), Some((0, 0.4)));
        assert_eq!(argmax(&[]), None);
    }
}
