//! Sample thresholding for bit classification.

/// Otsu threshold over sampled cell intensities.
///
/// Returns the `t` maximizing between-class variance, under the convention
/// that a cell reads as black when its value is `<= t`; the returned `t`
/// therefore always lands in the dark class. Degenerate inputs fall back:
/// no samples gives mid-range, one distinct value gives that value, two
/// distinct values give their midpoint.
pub(crate) fn otsu_threshold_from_samples(samples: &[u8]) -> u8 {
    let mut hist = [0u32; 256];
    for &v in samples {
        hist[v as usize] += 1;
    }
    let occupied: Vec<usize> = (0..256).filter(|&i| hist[i] > 0).collect();

    match occupied.as_slice() {
        [] => return 127,
        [only] => return *only as u8,
        [lo, hi] => return ((lo + hi) / 2) as u8,
        _ => {}
    }

    let total = samples.len() as f64;
    let mut grand_sum = 0.0f64;
    for &i in &occupied {
        grand_sum += i as f64 * hist[i] as f64;
    }

    let mut dark_count = 0.0f64;
    let mut dark_sum = 0.0f64;
    let mut best = (f64::MIN, occupied[0] as u8);

    // a candidate threshold ends the dark class at an occupied bin; the
    // last bin is excluded so the light class is never empty
    for &t in &occupied[..occupied.len() - 1] {
        dark_count += hist[t] as f64;
        dark_sum += t as f64 * hist[t] as f64;

        let light_count = total - dark_count;
        let dark_mean = dark_sum / dark_count;
        let light_mean = (grand_sum - dark_sum) / light_count;

        let sep = dark_mean - light_mean;
        let var_between = dark_count * light_count * sep * sep;
        if var_between > best.0 {
            best = (var_between, t as u8);
        }
    }

    best.1
}
