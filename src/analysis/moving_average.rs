/// Trailing moving average over up to `window` most recent points.
///
/// The input must already be one city's temperatures in ascending time order.
/// Early positions use a partial window (the first value is its own average),
/// so every position has a defined result. The computation only ever sees one
/// city's slice, which is what makes per-city parallel execution safe: the
/// output for a city is identical whether it is processed alone or alongside
/// any other city's data.
pub fn moving_average(temperatures: &[f64], window: usize) -> Vec<f64> {
    assert!(window >= 1, "moving average window must be at least 1");

    temperatures
        .iter()
        .enumerate()
        .map(|(i, _)| {
            let start = (i + 1).saturating_sub(window);
            let slice = &temperatures[start..=i];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_point_is_its_own_average() {
        let averages = moving_average(&[12.5, 14.0], 7);
        assert_eq!(averages[0], 12.5);
    }

    #[test]
    fn test_partial_windows_at_start() {
        let averages = moving_average(&[1.0, 2.0, 3.0, 4.0], 3);
        assert_eq!(averages, vec![1.0, 1.5, 2.0, 3.0]);
    }

    #[test]
    fn test_window_of_seven_over_ten_points() {
        let temperatures: Vec<f64> = (1..=10).map(f64::from).collect();
        let averages = moving_average(&temperatures, 7);

        // Seventh point: mean of points 1-7.
        assert_eq!(averages[6], 28.0 / 7.0);
        // Tenth point: mean of points 4-10.
        assert_eq!(averages[9], 49.0 / 7.0);
    }

    #[test]
    fn test_window_of_one_tracks_input() {
        let temperatures = [5.0, -1.0, 3.0];
        assert_eq!(moving_average(&temperatures, 1), temperatures.to_vec());
    }

    #[test]
    fn test_empty_input() {
        assert!(moving_average(&[], 5).is_empty());
    }
}
