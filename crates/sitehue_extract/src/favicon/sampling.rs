use sitehue_core::Rgb;

use crate::error::DecodeError;

const START_OFFSET: usize = 24;
const STEP: usize = 4;
const MIN_LEN: usize = START_OFFSET + 100;
const LIMIT: usize = 5;

/// Last-resort color guess for icon files no decoder can read: walk the raw
/// bytes as RGB triples and keep the first few chromatic ones.
pub fn sample_colors(bytes: &[u8]) -> Result<Vec<String>, DecodeError> {
    if bytes.len() <= MIN_LEN {
        return Err(DecodeError::TooShort(bytes.len()));
    }

    let mut colors: Vec<String> = Vec::with_capacity(LIMIT);
    let mut i = START_OFFSET;
    while i < bytes.len() - 3 {
        let (r, g, b) = (bytes[i], bytes[i + 1], bytes[i + 2]);
        i += STEP;

        let near_black = r <= 5 && g <= 5 && b <= 5;
        let near_white = r >= 250 && g >= 250 && b >= 250;
        let gray = r == g && g == b;
        if near_black || near_white || gray {
            continue;
        }

        let hex = Rgb::new(r, g, b).to_hex();
        if !colors.contains(&hex) {
            colors.push(hex);
            if colors.len() >= LIMIT {
                break;
            }
        }
    }
    Ok(colors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_with(triples: &[[u8; 3]]) -> Vec<u8> {
        let mut bytes = vec![0u8; START_OFFSET];
        for t in triples {
            bytes.extend_from_slice(t);
            bytes.push(0);
        }
        bytes.resize(bytes.len().max(MIN_LEN + 4), 0);
        bytes
    }

    #[test]
    fn test_short_buffer_rejected() {
        assert!(matches!(
            sample_colors(&[7u8; MIN_LEN]),
            Err(DecodeError::TooShort(124))
        ));
    }

    #[test]
    fn test_rejects_black_white_gray() {
        let bytes = buffer_with(&[[3, 4, 5], [251, 255, 250], [90, 90, 90], [200, 10, 10]]);
        assert_eq!(sample_colors(&bytes).unwrap(), vec!["#c80a0a"]);
    }

    #[test]
    fn test_unique_and_capped() {
        let bytes = buffer_with(&[
            [10, 20, 30],
            [10, 20, 30],
            [40, 50, 60],
            [70, 80, 90],
            [100, 110, 120],
            [130, 140, 150],
            [160, 170, 180],
        ]);
        assert_eq!(
            sample_colors(&bytes).unwrap(),
            vec!["#0a141e", "#28323c", "#46505a", "#646e78", "#828c96"]
        );
    }
}
