//! Statistical comparison of flux samples from two modeling conditions
//!
//! Each reaction's flux distribution is compared with a two sample Kolmogorov-Smirnov test.
//! Reactions which never carry more than [`ACTIVE_FLUX`] in one of the conditions are not
//! compared.
use indexmap::IndexMap;
use log::debug;
use statrs::distribution::{ContinuousCDF, Empirical};
use thiserror::Error;

use crate::metabolic_model::model::Model;

/// A reaction is compared only if some sample of both conditions exceeds this flux
pub const ACTIVE_FLUX: f64 = 1e-3;

/// Sample tables with more cells than this use the asymptotic distribution
const EXACT_MAX_CELLS: usize = 1_000_000;

/// Outcome of the Kolmogorov-Smirnov test for one reaction
#[derive(Clone, Debug, PartialEq)]
pub struct KsResult {
    pub reaction: String,
    /// Largest distance between the two empirical distribution functions
    pub statistic: f64,
    pub p_value: f64,
}

/// Per reaction test results, in model reaction order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FluxComparison {
    pub results: Vec<KsResult>,
}

impl FluxComparison {
    /// The `n` results with the largest p-values, largest first
    pub fn top_hits(&self, n: usize) -> Vec<&KsResult> {
        let mut hits: Vec<&KsResult> = self.results.iter().collect();
        hits.sort_by(|a, b| b.p_value.total_cmp(&a.p_value));
        hits.truncate(n);
        hits
    }
}

/// Compare the flux samples of two conditions, reaction by reaction
///
/// `samples_1` and `samples_2` map reaction ids to their sampled fluxes. Only the reactions of
/// `model` which are active in both tables are tested.
///
/// # Examples
/// ```rust
/// use indexmap::IndexMap;
/// use basegem_core::flux_analysis::comparison::compare_flux_samples;
/// use basegem_core::metabolic_model::model::Model;
/// let model = Model::from_json_str(
///     r#"{"metabolites":[{"id":"a"}],"genes":[],
///     "reactions":[{"id":"EX_a","metabolites":{"a":-1.0},"lower_bound":-10.0,"upper_bound":10.0}]}"#,
/// ).unwrap();
/// let samples_1 = IndexMap::from([("EX_a".to_string(), vec![1., 2., 3.])]);
/// let samples_2 = IndexMap::from([("EX_a".to_string(), vec![1., 2., 3.])]);
/// let comparison = compare_flux_samples(&model, &samples_1, &samples_2).unwrap();
/// assert_eq!(comparison.results[0].statistic, 0.);
/// ```
pub fn compare_flux_samples(
    model: &Model,
    samples_1: &IndexMap<String, Vec<f64>>,
    samples_2: &IndexMap<String, Vec<f64>>,
) -> Result<FluxComparison, ComparisonError> {
    let mut results = Vec::new();
    for reaction in model.reactions.keys() {
        let (Some(fluxes_1), Some(fluxes_2)) = (samples_1.get(reaction), samples_2.get(reaction))
        else {
            continue;
        };
        if !is_active(fluxes_1) || !is_active(fluxes_2) {
            continue;
        }
        if fluxes_1.iter().chain(fluxes_2).any(|f| !f.is_finite()) {
            return Err(ComparisonError::NonFiniteSample(reaction.clone()));
        }
        let (statistic, p_value) = ks_2samp(fluxes_1, fluxes_2);
        results.push(KsResult {
            reaction: reaction.clone(),
            statistic,
            p_value,
        });
    }
    debug!(
        "Compared the flux distributions of {} of {} reactions",
        results.len(),
        model.reactions.len()
    );
    Ok(FluxComparison { results })
}

fn is_active(fluxes: &[f64]) -> bool {
    fluxes.iter().any(|f| *f > ACTIVE_FLUX)
}

/// Two sided two sample Kolmogorov-Smirnov test, both samples must be non-empty and finite
fn ks_2samp(sample_1: &[f64], sample_2: &[f64]) -> (f64, f64) {
    let ecdf_1: Empirical = sample_1.iter().copied().collect();
    let ecdf_2: Empirical = sample_2.iter().copied().collect();
    let statistic = sample_1
        .iter()
        .chain(sample_2)
        .map(|x| (ecdf_1.cdf(*x) - ecdf_2.cdf(*x)).abs())
        .fold(0., f64::max);
    let (m, n) = (sample_1.len(), sample_2.len());
    let p_value = if m * n <= EXACT_MAX_CELLS {
        exact_p_value(statistic, m, n)
    } else {
        let effective_n = (m * n) as f64 / (m + n) as f64;
        kolmogorov_sf(statistic * effective_n.sqrt())
    };
    (statistic, p_value.clamp(0., 1.))
}

/// Probability that the statistic of two samples of sizes `m` and `n` from the same
/// distribution is at least `statistic`
///
/// Counts the lattice paths from (0, 0) to (m, n) which stay strictly closer than `statistic`
/// to the diagonal, as a fraction of all paths.
fn exact_p_value(statistic: f64, m: usize, n: usize) -> f64 {
    let lcm = m / gcd(m, n) * n;
    let (step_m, step_n) = ((lcm / m) as i64, (lcm / n) as i64);
    let h = (statistic * lcm as f64).round() as i64;
    if h == 0 {
        return 1.;
    }
    let inside = |i: usize, j: usize| (i as i64 * step_m - j as i64 * step_n).abs() < h;
    // row[j] is the fraction of paths to (i, j) which stayed inside
    let mut row = vec![0.; n + 1];
    for i in 0..=m {
        for j in 0..=n {
            row[j] = if !inside(i, j) {
                0.
            } else if i == 0 && j == 0 {
                1.
            } else {
                let from_i = if i > 0 { row[j] * i as f64 } else { 0. };
                let from_j = if j > 0 { row[j - 1] * j as f64 } else { 0. };
                (from_i + from_j) / (i + j) as f64
            };
        }
    }
    1. - row[n]
}

/// Survival function of the Kolmogorov distribution
fn kolmogorov_sf(lambda: f64) -> f64 {
    if lambda < 0.2 {
        return 1.;
    }
    let mut sum = 0.;
    for k in 1..=100 {
        let k = k as f64;
        let term = (-2. * k * k * lambda * lambda).exp();
        sum += if k as u32 % 2 == 1 { term } else { -term };
        if term < 1e-16 {
            break;
        }
    }
    2. * sum
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

#[derive(Error, Debug)]
pub enum ComparisonError {
    #[error("Flux samples of reaction {0} contain non finite values")]
    NonFiniteSample(String),
}
