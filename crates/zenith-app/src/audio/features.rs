use bytemuck::{Pod, Zeroable};

pub const NUM_FEATURES: usize = 12;

/// One frame of analyzed audio, every field normalized to 0-1 except `bpm`
/// (beats per minute). Field order is load-bearing: the slice views index
/// into it and the beat fields (indices 8..12) bypass normalization.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct AudioFeatures {
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    pub rms: f32,
    pub peak: f32,
    pub onset: f32,
    pub centroid: f32,
    pub flux: f32,
    pub beat: f32,
    pub beat_phase: f32,
    pub bpm: f32,
    pub beat_strength: f32,
}

/// First index of the beat-detector fields that skip normalization.
pub const BEAT_FIELDS_START: usize = 8;

impl AudioFeatures {
    pub fn as_slice(&self) -> &[f32; NUM_FEATURES] {
        bytemuck::cast_ref(self)
    }

    pub fn as_slice_mut(&mut self) -> &mut [f32; NUM_FEATURES] {
        bytemuck::cast_mut(self)
    }
}

impl Default for AudioFeatures {
    fn default() -> Self {
        bytemuck::Zeroable::zeroed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn struct_is_exactly_the_feature_slice() {
        assert_eq!(
            std::mem::size_of::<AudioFeatures>(),
            NUM_FEATURES * std::mem::size_of::<f32>()
        );
    }

    #[test]
    fn slice_view_matches_fields() {
        let mut f = AudioFeatures::default();
        f.bass = 0.25;
        f.beat = 1.0;
        let s = f.as_slice();
        assert_eq!(s[0], 0.25);
        assert_eq!(s[BEAT_FIELDS_START], 1.0);
    }
}
