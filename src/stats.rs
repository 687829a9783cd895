//! Descriptive statistics and goodness-of-fit measures.
//!
//! Every function takes plain slices and returns `f64::NAN` where the measure
//! is undefined (empty input, zero variance, zero denominators or series of
//! different length).

use {
    serde::Serialize,
    statrs::distribution::{ContinuousCDF, StudentsT},
    std::fmt,
};

pub fn sum(xs: &[f64]) -> f64 {
    xs.iter().sum()
}

pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return f64::NAN;
    }
    sum(xs) / xs.len() as f64
}

fn sum_squared_deviations(xs: &[f64]) -> f64 {
    let m = mean(xs);
    xs.iter().map(|x| (x - m).powi(2)).sum()
}

/// Population variance
pub fn pvariance(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return f64::NAN;
    }
    sum_squared_deviations(xs) / xs.len() as f64
}

/// Sample variance (n - 1 denominator)
pub fn variance(xs: &[f64]) -> f64 {
    if xs.len() < 2 {
        return f64::NAN;
    }
    sum_squared_deviations(xs) / (xs.len() - 1) as f64
}

/// Population standard deviation
pub fn pstdev(xs: &[f64]) -> f64 {
    pvariance(xs).sqrt()
}

/// Sample standard deviation
pub fn stdev(xs: &[f64]) -> f64 {
    variance(xs).sqrt()
}

/// Adjusted Fisher-Pearson sample skewness (G1).
///
/// Constant series have zero skew; fewer than three values are undefined.
pub fn skewness(xs: &[f64]) -> f64 {
    let n = xs.len();
    if n < 3 {
        return f64::NAN;
    }
    let m = mean(xs);
    let nf = n as f64;
    let m2 = xs.iter().map(|x| (x - m).powi(2)).sum::<f64>() / nf;
    let m3 = xs.iter().map(|x| (x - m).powi(3)).sum::<f64>() / nf;
    if m2 == 0.0 {
        return 0.0;
    }
    (nf * (nf - 1.0)).sqrt() / (nf - 2.0) * m3 / m2.powf(1.5)
}

/// Nash-Sutcliffe efficiency, 1 is a perfect fit.
pub fn nse(observed: &[f64], simulated: &[f64]) -> f64 {
    if observed.is_empty() || observed.len() != simulated.len() {
        return f64::NAN;
    }
    let numerator: f64 = observed
        .iter()
        .zip(simulated)
        .map(|(o, s)| (o - s).powi(2))
        .sum();
    let denominator = sum_squared_deviations(observed);
    if denominator == 0.0 {
        return f64::NAN;
    }
    1.0 - numerator / denominator
}

/// Root mean square error in the units of the series.
pub fn rmse(observed: &[f64], simulated: &[f64]) -> f64 {
    if observed.is_empty() || observed.len() != simulated.len() {
        return f64::NAN;
    }
    let mse = observed
        .iter()
        .zip(simulated)
        .map(|(o, s)| (o - s).powi(2))
        .sum::<f64>()
        / observed.len() as f64;
    mse.sqrt()
}

/// Percent bias, positive when the model underestimates.
pub fn pbias(observed: &[f64], simulated: &[f64]) -> f64 {
    if observed.is_empty() || observed.len() != simulated.len() {
        return f64::NAN;
    }
    let total = sum(observed);
    if total == 0.0 {
        return f64::NAN;
    }
    100.0 * observed.iter().zip(simulated).map(|(o, s)| o - s).sum::<f64>() / total
}

/// Pearson product-moment correlation coefficient.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() < 2 || x.len() != y.len() {
        return f64::NAN;
    }
    let (mx, my) = (mean(x), mean(y));
    let covariance: f64 = x.iter().zip(y).map(|(a, b)| (a - mx) * (b - my)).sum();
    let denominator = (sum_squared_deviations(x) * sum_squared_deviations(y)).sqrt();
    if denominator == 0.0 {
        return f64::NAN;
    }
    covariance / denominator
}

/// Percentage change of `new` relative to `base`.
pub fn percent_change(new: f64, base: f64) -> f64 {
    if base == 0.0 {
        return f64::NAN;
    }
    (new - base) / base.abs() * 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TTest {
    pub t: f64,
    pub df: f64,
    /// Two-sided p-value
    pub p: f64,
}

/// Welch's unequal-variance t-test of the difference in means.
pub fn welch_t_test(a: &[f64], b: &[f64]) -> TTest {
    let undefined = TTest {
        t: f64::NAN,
        df: f64::NAN,
        p: f64::NAN,
    };
    if a.len() < 2 || b.len() < 2 {
        return undefined;
    }

    let (na, nb) = (a.len() as f64, b.len() as f64);
    let (va, vb) = (variance(a) / na, variance(b) / nb);
    let se = (va + vb).sqrt();
    if se == 0.0 {
        return undefined;
    }

    let t = (mean(a) - mean(b)) / se;
    let df = (va + vb).powi(2) / (va.powi(2) / (na - 1.0) + vb.powi(2) / (nb - 1.0));
    let p = match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => 2.0 * (1.0 - dist.cdf(t.abs())),
        Err(_) => f64::NAN,
    };

    TTest { t, df, p }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EcdfKind {
    /// Ordinate is the percentage of values at or below the abscissa
    Frequency,
    /// Ordinate is the percentage of the series total contributed by values at or below the abscissa
    TotalSum,
}

/// Empirical cumulative distribution as sorted `(value, percent)` points.
pub fn ecdf(values: &[f64], kind: EcdfKind) -> Vec<(f64, f64)> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len() as f64;
    let total = sum(&sorted);
    let mut running = 0.0;

    sorted
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let y = match kind {
                EcdfKind::Frequency => (i + 1) as f64 * 100.0 / n,
                EcdfKind::TotalSum => {
                    running += v;
                    if total == 0.0 {
                        f64::NAN
                    } else {
                        running * 100.0 / total
                    }
                }
            };
            (v, y)
        })
        .collect()
}

/// Storm type by daily precipitation depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum StormClass {
    Light,
    Moderate,
    Heavy,
    Intense,
}

impl StormClass {
    pub const ALL: [StormClass; 4] = [
        StormClass::Light,
        StormClass::Moderate,
        StormClass::Heavy,
        StormClass::Intense,
    ];

    /// Classifies a wet-day depth given the upper limits of the light,
    /// moderate and heavy classes. Dry days have no class.
    pub fn classify(depth: f64, limits: &[f64; 3]) -> Option<Self> {
        if !(depth > 0.0) {
            None
        } else if depth <= limits[0] {
            Some(StormClass::Light)
        } else if depth <= limits[1] {
            Some(StormClass::Moderate)
        } else if depth <= limits[2] {
            Some(StormClass::Heavy)
        } else {
            Some(StormClass::Intense)
        }
    }
}

impl fmt::Display for StormClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            StormClass::Light => "Light",
            StormClass::Moderate => "Moderate",
            StormClass::Heavy => "Heavy",
            StormClass::Intense => "Intense",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod test {
    use {super::*, approx::assert_abs_diff_eq};

    const OBS: [f64; 5] = [1.0, 2.0, 3.0, 4.0, 5.0];

    #[test]
    fn nse_perfect_and_mean() {
        assert_abs_diff_eq!(nse(&OBS, &OBS), 1.0);
        assert_abs_diff_eq!(nse(&OBS, &[3.0; 5]), 0.0);
    }

    #[test]
    fn nse_known_value() {
        // sum sq err = 0.25 * 5, sum sq dev = 10
        let sim = [1.5, 2.5, 3.5, 4.5, 5.5];
        assert_abs_diff_eq!(nse(&OBS, &sim), 1.0 - 1.25 / 10.0, epsilon = 1e-12);
    }

    #[test]
    fn nse_constant_observations_is_undefined() {
        assert!(nse(&[2.0; 4], &[1.0, 2.0, 3.0, 4.0]).is_nan());
        assert!(nse(&[], &[]).is_nan());
        assert!(nse(&OBS, &[1.0]).is_nan());
    }

    #[test]
    fn rmse_known_value() {
        assert_abs_diff_eq!(rmse(&OBS, &[2.0, 3.0, 4.0, 5.0, 6.0]), 1.0, epsilon = 1e-12);
        assert!(rmse(&[], &[]).is_nan());
    }

    #[test]
    fn pbias_sign() {
        // model underestimates by 10 %
        let sim: Vec<f64> = OBS.iter().map(|o| o * 0.9).collect();
        assert_abs_diff_eq!(pbias(&OBS, &sim), 10.0, epsilon = 1e-9);
        assert!(pbias(&[0.0, 0.0], &[1.0, 1.0]).is_nan());
    }

    #[test]
    fn pearson_linear() {
        let y: Vec<f64> = OBS.iter().map(|x| 3.0 - 2.0 * x).collect();
        assert_abs_diff_eq!(pearson(&OBS, &y), -1.0, epsilon = 1e-12);
        assert!(pearson(&OBS, &[1.0; 5]).is_nan());
    }

    #[test]
    fn deviations() {
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_abs_diff_eq!(pstdev(&xs), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(stdev(&xs), (32.0f64 / 7.0).sqrt(), epsilon = 1e-12);
        assert!(stdev(&[1.0]).is_nan());
        assert!(pstdev(&[]).is_nan());
    }

    #[test]
    fn skewness_matches_adjusted_estimator() {
        // m2 = 2, m3 = 0 for a symmetric series
        assert_abs_diff_eq!(skewness(&OBS), 0.0, epsilon = 1e-12);

        // [1, 2, 9]: mean 4, m2 = 38/3, m3 = 30
        let m2: f64 = 38.0 / 3.0;
        let m3: f64 = 30.0;
        let expected = (6.0f64).sqrt() * m3 / m2.powf(1.5);
        assert_abs_diff_eq!(skewness(&[1.0, 2.0, 9.0]), expected, epsilon = 1e-12);

        assert!(skewness(&[1.0, 2.0]).is_nan());
        assert_abs_diff_eq!(skewness(&[3.0, 3.0, 3.0]), 0.0);
    }

    #[test]
    fn welch_identical_samples() {
        let result = welch_t_test(&OBS, &OBS);
        assert_abs_diff_eq!(result.t, 0.0);
        assert_abs_diff_eq!(result.p, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.df, 8.0, epsilon = 1e-9);
    }

    #[test]
    fn welch_separated_samples() {
        let b: Vec<f64> = OBS.iter().map(|x| x + 10.0).collect();
        let result = welch_t_test(&OBS, &b);
        assert!(result.t < 0.0);
        assert!(result.p < 1e-4);
    }

    #[test]
    fn welch_undefined() {
        assert!(welch_t_test(&[1.0], &OBS).p.is_nan());
        assert!(welch_t_test(&[1.0, 1.0], &[1.0, 1.0]).p.is_nan());
    }

    #[test]
    fn ecdf_kinds() {
        let values = [3.0, 1.0, 2.0, 4.0];
        assert_eq!(
            ecdf(&values, EcdfKind::Frequency),
            vec![(1.0, 25.0), (2.0, 50.0), (3.0, 75.0), (4.0, 100.0)]
        );
        assert_eq!(
            ecdf(&values, EcdfKind::TotalSum),
            vec![(1.0, 10.0), (2.0, 30.0), (3.0, 60.0), (4.0, 100.0)]
        );
        assert!(ecdf(&[], EcdfKind::Frequency).is_empty());
        assert!(ecdf(&[0.0, 0.0], EcdfKind::TotalSum)[0].1.is_nan());
    }

    #[test]
    fn storm_classes() {
        let limits = [10.0, 25.0, 50.0];
        assert_eq!(StormClass::classify(0.0, &limits), None);
        assert_eq!(StormClass::classify(10.0, &limits), Some(StormClass::Light));
        assert_eq!(StormClass::classify(10.1, &limits), Some(StormClass::Moderate));
        assert_eq!(StormClass::classify(50.0, &limits), Some(StormClass::Heavy));
        assert_eq!(StormClass::classify(50.1, &limits), Some(StormClass::Intense));
    }

    #[test]
    fn percent_change_uses_magnitude_of_base() {
        assert_abs_diff_eq!(percent_change(-5.0, -10.0), 50.0);
        assert!(percent_change(1.0, 0.0).is_nan());
    }
}
