use ndarray::{Array1, Array2};

/// Column-wise exponentially weighted moving average over the rows of `x`.
///
/// Uses adjusted weights, so row `t` is
/// `Σ_{i≤t} (1−α)^{t−i} x_i / Σ_{i≤t} (1−α)^{t−i}` and the first row equals
/// its own input.
pub fn ewma(x: &Array2<f64>, alpha: f64) -> Array2<f64> {
    let decay = 1.0 - alpha;
    let mut out = Array2::zeros(x.raw_dim());
    let mut numerator = Array1::<f64>::zeros(x.ncols());
    let mut denominator = 0.0;

    for (t, row) in x.rows().into_iter().enumerate() {
        numerator = &numerator * decay + &row;
        denominator = denominator * decay + 1.0;
        out.row_mut(t).assign(&(&numerator / denominator));
    }
    out
}
