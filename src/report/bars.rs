use console::style;

use crate::analysis::voice_type::{self, Gender};
use crate::notes::CATALOGUE;

const BAR_WIDTH: usize = 50;

/// Column span `[start, end]` of `low..high` on a linear axis from the lowest
/// to the highest catalogue note, clamped to the bar.
pub fn bar_span(low_hz: f32, high_hz: f32, width: usize) -> (usize, usize) {
    let axis_min = CATALOGUE[0].frequency;
    let axis_max = CATALOGUE[CATALOGUE.len() - 1].frequency;
    let last = width.saturating_sub(1) as f32;

    let column = |hz: f32| {
        let pos = (hz - axis_min) / (axis_max - axis_min) * width as f32;
        pos.clamp(0.0, last) as usize
    };

    (column(low_hz), column(high_hz.max(low_hz)))
}

/// A bar of `width` columns with `fill` over `low..high` and blanks elsewhere.
pub fn bar(low_hz: f32, high_hz: f32, width: usize, fill: char) -> String {
    let (start, end) = bar_span(low_hz, high_hz, width);
    (0..width)
        .map(|i| if (start..=end).contains(&i) { fill } else { ' ' })
        .collect()
}

/// Voice types of the gender drawn above the user's own range.
pub fn print_range_bars(min_hz: f32, max_hz: f32, gender: Gender) {
    println!("{}", style("  Voice Range").bold());
    println!();

    for vt in gender.voice_types() {
        println!(
            "  {:<14}│{}│ {:.0}-{:.0} Hz",
            vt.name,
            bar(vt.min_hz, vt.max_hz, BAR_WIDTH, '─'),
            vt.min_hz,
            vt.max_hz
        );
    }

    println!(
        "  {:<14}│{}│ {:.1}-{:.1} Hz",
        style("You").cyan().bold(),
        style(bar(min_hz, max_hz, BAR_WIDTH, '█')).cyan(),
        min_hz,
        max_hz
    );
    println!();

    let affinities = voice_type::affinities(min_hz, max_hz, gender);
    if !affinities.is_empty() {
        println!("{}", style("  Voice Type Affinity").bold());
        for (name, percent) in affinities {
            println!("    {:<14} {:>5.1}%", name, percent);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_catalogue_fills_the_bar() {
        let b = bar(65.41, 1046.5, 20, '#');
        assert_eq!(b, "#".repeat(20));
    }

    #[test]
    fn out_of_axis_values_are_clamped() {
        assert_eq!(bar_span(10.0, 5000.0, 10), (0, 9));
    }

    #[test]
    fn low_range_sits_on_the_left() {
        let (start, end) = bar_span(65.41, 150.0, 50);
        assert_eq!(start, 0);
        assert!(end < 10);

        let b = bar(65.41, 150.0, 50, '█');
        assert_eq!(b.chars().count(), 50);
        assert!(b.starts_with('█'));
        assert!(b.ends_with(' '));
    }

    #[test]
    fn inverted_range_collapses_to_a_point() {
        let (start, end) = bar_span(500.0, 100.0, 50);
        assert_eq!(start, end);
    }
}
