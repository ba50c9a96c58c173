use crate::color::Rgb;

/// Minimum RGB distance between two kept colors.
pub const SIMILARITY_THRESHOLD: f64 = 30.0;

/// Drop colors that sit within [`SIMILARITY_THRESHOLD`] of an already kept one.
///
/// Greedy and order-preserving: the first color always survives, and each later
/// color is compared against the survivors only. Tokens that are not hex never
/// count as similar.
pub fn filter_similar<S: AsRef<str>>(colors: &[S]) -> Vec<String> {
    let mut kept: Vec<(String, Option<Rgb>)> = Vec::with_capacity(colors.len());

    for color in colors {
        let color = color.as_ref();
        let rgb = Rgb::from_hex(color).ok();

        let too_similar = rgb.is_some_and(|candidate| {
            kept.iter()
                .filter_map(|(_, existing)| *existing)
                .any(|existing| candidate.distance(existing) < SIMILARITY_THRESHOLD)
        });

        if !too_similar {
            kept.push((color.to_string(), rgb));
        }
    }

    kept.into_iter().map(|(color, _)| color).collect()
}
