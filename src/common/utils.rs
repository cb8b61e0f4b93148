pub fn mean(data: &[f32]) -> f32 {
    data.iter().fold(0.0, |acc, x| acc + x) / (data.len() as f32)
}

/// Population standard deviation. NaN on empty input, like [`mean`].
pub fn std_dev(data: &[f32]) -> f32 {
    let m = mean(data);
    let var = data.iter().fold(0.0, |acc, x| acc + (x - m).powi(2)) / (data.len() as f32);

    var.sqrt()
}

/// Indices of the `k` largest values, best first.
///
/// NaNs sort last, so they are only picked when there is nothing else left.
pub fn top_k_indices(data: &[f32], k: usize) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..data.len()).collect();
    idx.sort_by(|&a, &b| match (data[a].is_nan(), data[b].is_nan()) {
        (true, true) => std::cmp::Ordering::Equal,
        (true, false) => std::cmp::Ordering::Greater,
        (false, true) => std::cmp::Ordering::Less,
        (false, false) => data[b].total_cmp(&data[a]),
    });
    idx.truncate(k);

    idx
}
