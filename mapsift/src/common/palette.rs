use crate::common::Value;
use indexmap::IndexMap;

// ColorBrewer qualitative "Paired" scheme
const PAIRED: [&str; 11] = [
    "#a6cee3", "#1f78b4", "#b2df8a", "#33a02c", "#fb9a99", "#e31a1c", "#fdbf6f", "#ff7f00",
    "#cab2d6", "#6a3d9a", "#b15928",
];

/// Assigns a stable color to each categorical value of a collection.
///
/// Assignments are made in first-seen order from a fixed qualitative palette,
/// cycling when the palette is exhausted. The palette is owned per
/// collection, never shared process-wide, so independent collections (and
/// tests) never leak assignments into each other.
#[derive(Debug, Default, Clone)]
pub struct ColorPalette {
    assignments: IndexMap<Value, &'static str>,
    next: usize,
}

impl ColorPalette {
    pub fn new() -> Self {
        ColorPalette {
            assignments: IndexMap::new(),
            next: 0,
        }
    }

    /// Returns the color assigned to `value`, assigning the next palette
    /// entry on first sight.
    pub fn color_for(&mut self, value: &Value) -> &'static str {
        if let Some(color) = self.assignments.get(value) {
            return color;
        }
        let color = PAIRED[self.next % PAIRED.len()];
        self.next += 1;
        self.assignments.insert(value.clone(), color);
        color
    }

    /// Returns the color already assigned to `value`, if any.
    pub fn assigned(&self, value: &Value) -> Option<&'static str> {
        self.assignments.get(value).copied()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_assignment() {
        let mut palette = ColorPalette::new();
        let high = Value::from("high");
        let low = Value::from("low");
        let first = palette.color_for(&high);
        let second = palette.color_for(&low);
        assert_ne!(first, second);
        assert_eq!(palette.color_for(&high), first);
        assert_eq!(palette.assigned(&low), Some(second));
    }

    #[test]
    fn test_palette_cycles() {
        let mut palette = ColorPalette::new();
        for i in 0..PAIRED.len() {
            palette.color_for(&Value::from(i as i64));
        }
        // the next assignment wraps around to the first color
        let wrapped = palette.color_for(&Value::from("wrap"));
        assert_eq!(wrapped, PAIRED[0]);
    }

    #[test]
    fn test_independent_palettes() {
        let mut a = ColorPalette::new();
        let mut b = ColorPalette::new();
        a.color_for(&Value::from("x"));
        assert!(b.is_empty());
        assert_eq!(b.color_for(&Value::from("y")), PAIRED[0]);
    }
}
