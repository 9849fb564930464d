// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

/// The fixed set of colours a category can carry, in picker order.
pub const CATEGORY_COLORS: [&str; 8] = [
    "#ff6b6b", // Coral red
    "#4a90d9", // Sky blue
    "#50c878", // Emerald
    "#f5a623", // Amber
    "#9b59b6", // Amethyst
    "#1abc9c", // Turquoise
    "#e67e22", // Carrot
    "#95a5a6", // Concrete grey
];

/// Colour used when nothing better is known.
pub fn default_color() -> &'static str {
    CATEGORY_COLORS[0]
}

/// Colour for the category at position `index`, wrapping around the palette.
pub fn color_for_index(index: usize) -> &'static str {
    CATEGORY_COLORS[index % CATEGORY_COLORS.len()]
}

/// Returns true if `color` is one of the palette entries (case-insensitive).
pub fn is_palette_color(color: &str) -> bool {
    position(color).is_some()
}

/// The colour to pre-select after `current` was used for a new category.
/// Unknown colours restart the cycle at the first entry.
pub fn next_color(current: &str) -> &'static str {
    match position(current) {
        Some(index) => color_for_index(index + 1),
        None => default_color(),
    }
}

fn position(color: &str) -> Option<usize> {
    CATEGORY_COLORS
        .iter()
        .position(|candidate| candidate.eq_ignore_ascii_case(color))
}
