use rand::Rng;
use rand_distr::{Beta, Distribution};
use serde::{Deserialize, Serialize};

/// Three-point duration models for schedule risk. "None" keeps the nominal
/// duration unperturbed in every iteration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DurationDistribution {
    #[default]
    None,
    Triangular {
        min: f64,
        most_likely: f64,
        max: f64,
    },
    Pert {
        min: f64,
        most_likely: f64,
        max: f64,
    },
    Uniform {
        min: f64,
        max: f64,
    },
}

impl DurationDistribution {
    pub fn is_none(&self) -> bool {
        matches!(self, DurationDistribution::None)
    }

    /// Domain check: min <= most-likely <= max, all finite and non-negative.
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            DurationDistribution::None => Ok(()),
            DurationDistribution::Triangular {
                min,
                most_likely,
                max,
            }
            | DurationDistribution::Pert {
                min,
                most_likely,
                max,
            } => {
                check_finite_non_negative(&[min, most_likely, max])?;
                if min > most_likely || most_likely > max {
                    return Err(format!(
                        "requires min <= most_likely <= max (got {min}, {most_likely}, {max})"
                    ));
                }
                Ok(())
            }
            DurationDistribution::Uniform { min, max } => {
                check_finite_non_negative(&[min, max])?;
                if min > max {
                    return Err(format!("requires min <= max (got {min}, {max})"));
                }
                Ok(())
            }
        }
    }

    /// Draw one duration. Callers must have validated the parameters; the
    /// "none" variant is never sampled and returns the only value it has.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        match *self {
            DurationDistribution::None => 0.0,
            DurationDistribution::Triangular {
                min,
                most_likely,
                max,
            } => sample_triangular(rng, min, most_likely, max),
            DurationDistribution::Pert {
                min,
                most_likely,
                max,
            } => sample_pert(rng, min, most_likely, max),
            DurationDistribution::Uniform { min, max } => {
                if max <= min {
                    min
                } else {
                    rng.gen_range(min..=max)
                }
            }
        }
    }
}

fn check_finite_non_negative(values: &[f64]) -> Result<(), String> {
    for value in values {
        if !value.is_finite() {
            return Err(format!("non-finite parameter {value}"));
        }
        if *value < 0.0 {
            return Err(format!("negative duration parameter {value}"));
        }
    }
    Ok(())
}

/// Inverse-CDF sampling on the triangular density over (min, mode, max).
fn sample_triangular<R: Rng>(rng: &mut R, min: f64, mode: f64, max: f64) -> f64 {
    if max <= min {
        return min;
    }
    let u: f64 = rng.r#gen();
    let cut = (mode - min) / (max - min);
    if u < cut {
        min + (u * (max - min) * (mode - min)).sqrt()
    } else {
        max - ((1.0 - u) * (max - min) * (max - mode)).sqrt()
    }
}

/// PERT: a four-parameter Beta shaped to weight the most-likely value more
/// heavily than the triangular density does.
fn sample_pert<R: Rng>(rng: &mut R, min: f64, mode: f64, max: f64) -> f64 {
    if max <= min {
        return min;
    }
    let span = max - min;
    let alpha = 1.0 + 4.0 * (mode - min) / span;
    let beta = 1.0 + 4.0 * (max - mode) / span;
    let shape = Beta::new(alpha, beta).expect("shape parameters positive for validated input");
    min + span * shape.sample(rng)
}
