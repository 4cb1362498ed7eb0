/// Scales little-endian signed 16-bit samples by `multiplier`, clamping to
/// the sample range. A trailing odd byte is copied through unchanged.
pub fn multiply_volume(chunk: &[u8], multiplier: f32) -> Vec<u8> {
    let mut out = Vec::with_capacity(chunk.len());
    let mut samples = chunk.chunks_exact(2);

    for sample in &mut samples {
        let value = i16::from_le_bytes([sample[0], sample[1]]) as f32 * multiplier;
        // `as` saturates on overflow and truncates toward zero.
        let scaled = value.clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        out.extend_from_slice(&scaled.to_le_bytes());
    }
    out.extend_from_slice(samples.remainder());

    out
}
