use crate::labels::LabelMap;

pub const STUB_ASPECT_LABELS: [&str; 10] = [
    "BATTERY",
    "CAMERA",
    "DESIGN",
    "FEATURES",
    "GENERAL",
    "PERFORMANCE",
    "PRICE",
    "SCREEN",
    "SER&ACC",
    "STORAGE",
];
pub const STUB_SENTIMENT_LABELS: [&str; 3] = ["NEG", "NEU", "POS"];

/// Logit magnitude; keeps stub probabilities spread over most of (0, 1).
const LOGIT_SCALE: f32 = 4.0;

/// Model-free classifier head producing deterministic logits from a hash of its input.
#[derive(Debug, Clone)]
pub struct StubClassifier {
    labels: LabelMap,
    seed: u64,
}

impl StubClassifier {
    pub fn new(head: &str, labels: LabelMap) -> Self {
        Self {
            labels,
            seed: fnv1a_64(head.as_bytes()),
        }
    }

    pub const fn labels(&self) -> &LabelMap {
        &self.labels
    }

    pub fn logits(&self, input: &str) -> Vec<f32> {
        (0..self.labels.class_count())
            .map(|idx| {
                let label = self.labels.label(idx);
                let mut state = self.seed
                    ^ fnv1a_64(label.as_bytes()).rotate_left(17)
                    ^ fnv1a_64(input.as_bytes());
                let bits = splitmix64(&mut state);
                let mantissa = ((bits >> 32) as u32) >> 9;
                let unit = f32::from_bits(0x3f80_0000 | mantissa) - 1.0;
                unit.mul_add(2.0, -1.0) * LOGIT_SCALE
            })
            .collect()
    }
}

fn fnv1a_64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

const fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logits_are_deterministic_and_bounded() {
        let head = StubClassifier::new("aspect", LabelMap::from_names(STUB_ASPECT_LABELS));
        let a = head.logits("Giá rẻ nhưng pin yếu");
        let b = head.logits("Giá rẻ nhưng pin yếu");
        assert_eq!(a, b);
        assert_eq!(a.len(), STUB_ASPECT_LABELS.len());
        assert!(a.iter().all(|x| x.abs() <= LOGIT_SCALE));
        assert_ne!(a, head.logits("Màn hình đẹp"));
    }

    #[test]
    fn heads_with_same_labels_disagree() {
        let labels = LabelMap::from_names(STUB_SENTIMENT_LABELS);
        let left = StubClassifier::new("aspect", labels.clone());
        let right = StubClassifier::new("sentiment", labels);
        assert_ne!(left.logits("text"), right.logits("text"));
    }
}
