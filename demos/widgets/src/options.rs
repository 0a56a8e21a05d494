//! Choices for the widget fields, as `(value, label)` pairs.

/// The seven widget colors.
pub const COLORS: &[(&str, &str)] = &[
    ("red", "Red"),
    ("orange", "Orange"),
    ("yellow", "Yellow"),
    ("green", "Green"),
    ("blue", "Blue"),
    ("indigo", "Indigo"),
    ("violet", "Violet"),
];

/// The six widget sizes.
pub const SIZES: &[(&str, &str)] = &[
    ("tiny", "Tiny"),
    ("small", "Small"),
    ("medium", "Medium"),
    ("large", "Large"),
    ("huge", "Huge"),
    ("giant", "Giant"),
];

/// The eight widget shapes.
pub const SHAPES: &[(&str, &str)] = &[
    ("circle", "Circle"),
    ("square", "Square"),
    ("triangle", "Triangle"),
    ("rectangle", "Rectangle"),
    ("pentagon", "Pentagon"),
    ("hexagon", "Hexagon"),
    ("octagon", "Octagon"),
    ("star", "Star"),
];

/// Every `(color, size, shape)` combination, in declaration order.
pub fn combinations() -> impl Iterator<Item = (&'static str, &'static str, &'static str)> {
    COLORS.iter().flat_map(|&(color, _)| {
        SIZES.iter().flat_map(move |&(size, _)| {
            SHAPES.iter().map(move |&(shape, _)| (color, size, shape))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combinations_cover_every_choice() {
        let all: Vec<_> = combinations().collect();
        assert_eq!(all.len(), 336);
        assert_eq!(all[0], ("red", "tiny", "circle"));
        assert_eq!(all[335], ("violet", "giant", "star"));
    }
}
