use plotters::prelude::{ColorMap, DerivedColorMap, Palette, Palette99, RGBColor};
use plotters::style::Color;

/// ColorBrewer YlGnBu anchors, light to dark
const YL_GN_BU: [RGBColor; 9] = [
    RGBColor(255, 255, 217),
    RGBColor(237, 248, 177),
    RGBColor(199, 233, 180),
    RGBColor(127, 205, 187),
    RGBColor(65, 182, 196),
    RGBColor(29, 145, 192),
    RGBColor(34, 94, 168),
    RGBColor(37, 52, 148),
    RGBColor(8, 29, 88),
];

/// Colour of the `index`-th category, cycling through the palette
pub(super) fn categorical(index: usize) -> RGBColor {
    let (r, g, b) = Palette99::pick(index).rgb();
    RGBColor(r, g, b)
}

/// Yellow-green-blue scale sampled at `t` in `[0, 1]`; non-finite input samples the light end
pub(super) fn sequential(t: f64) -> RGBColor {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    DerivedColorMap::new(&YL_GN_BU).get_color(t)
}

/// Relative luminance in `[0, 1]`
pub(super) fn luminance(color: RGBColor) -> f64 {
    let RGBColor(r, g, b) = color;
    (0.2126 * r as f64 + 0.7152 * g as f64 + 0.0722 * b as f64) / 255.0
}
