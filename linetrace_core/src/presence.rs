/// True iff any channel is below the darkness threshold.
#[inline]
pub fn line_present(values: &[f32], dark_threshold: f32) -> bool {
    values.iter().any(|&v| v < dark_threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_dark_channel_counts() {
        assert!(line_present(&[0.9, 0.9, 0.54, 0.9], 0.55));
        assert!(!line_present(&[0.9, 0.55, 0.9, 0.9], 0.55));
        assert!(!line_present(&[], 0.55));
    }
}
