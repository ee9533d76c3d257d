//! Ensembles of named, unnormalized branches produced by measurements.
//!
//! A [`Measurement`] is a list of [`Branch`]es whose squared norms are the
//! probabilities of the corresponding outcomes. A projective measurement
//! splits every branch into one new branch per outcome. The chance of no
//! detection stays behind as a scaled copy of the original branch under its
//! original name, so that total probability is conserved.

use std::fmt;
use itertools::Itertools;
use rand::Rng;
use thiserror::Error;
use tracing::debug;
use crate::{
    complex::ComplexFormat,
    tensor::{ Operator, TensorError, Vector },
};

#[derive(Debug, Error)]
pub enum MeasurementError {
    /// `pick_random: no branch selected`
    #[error("pick_random: branch probabilities sum to {0}, below the sampled value")]
    ProbabilitiesDoNotSumToOne(f64),

    /// `povm: efficiency out of range`
    #[error("povm: efficiency must lie in [0, 1], got {0}")]
    InvalidEfficiency(f64),

    #[error("tensor error: {0}")]
    Tensor(#[from] TensorError),
}
pub type MeasurementResult<T> = Result<T, MeasurementError>;

/// Branches with squared norm below this value are dropped after a
/// measurement.
pub const PRUNE_THRESHOLD: f64 = 1e-8;

/// A destructive measurement outcome: the measured dimensions are contracted
/// against `vector` and removed from the branch.
#[derive(Clone, Debug)]
pub struct NamedVector {
    pub name: String,
    pub vector: Vector,
}

impl NamedVector {
    /// Create a new `NamedVector`.
    pub fn new<S>(name: S, vector: Vector) -> Self
    where S: Into<String>
    {
        Self { name: name.into(), vector }
    }
}

/// A non-destructive, imperfect detection of the subspace of `projector`.
///
/// The detected branch is produced by the Kraus operator `√e P`, with `e` the
/// efficiency, and keeps all dimensions.
#[derive(Clone, Debug)]
pub struct NamedPovm {
    pub name: String,
    pub projector: Operator,
    pub efficiency: f64,
}

fn check_efficiency(efficiency: f64) -> MeasurementResult<()> {
    if (0.0..=1.0).contains(&efficiency) {
        Ok(())
    } else {
        Err(MeasurementError::InvalidEfficiency(efficiency))
    }
}

impl NamedPovm {
    /// Create a new `NamedPovm`.
    ///
    /// Fails if `efficiency` is not in `[0, 1]`.
    pub fn new<S>(name: S, projector: Operator, efficiency: f64)
        -> MeasurementResult<Self>
    where S: Into<String>
    {
        check_efficiency(efficiency)?;
        Ok(Self { name: name.into(), projector, efficiency })
    }
}

/// A single step in the history of a [`Branch`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Destructive projection onto a [`NamedVector`].
    Projection(String),
    /// Detection by a [`NamedPovm`].
    Povm(String),
}

impl Outcome {
    /// Return the name of the outcome.
    pub fn name(&self) -> &str {
        match self {
            Self::Projection(name) | Self::Povm(name) => name,
        }
    }
}

/// A single named branch of a [`Measurement`].
#[derive(Clone, Debug)]
pub struct Branch {
    /// All outcomes leading to this branch, in order.
    pub name: Vec<Outcome>,
    /// Unnormalized state of the branch.
    pub vector: Vector,
}

impl Branch {
    /// Return the probability of the branch, its squared norm.
    pub fn probability(&self) -> f64 { self.vector.norm_squared() }

    /// Render the outcome names.
    ///
    /// Successive projections are separated by spaces, while a POVM detection
    /// is joined to the names before it with `&`, e.g. `1,1 >V&detector`.
    pub fn name_string(&self) -> String {
        let mut out = String::new();
        for (k, outcome) in self.name.iter().enumerate() {
            match outcome {
                Outcome::Projection(_) if k > 0 => { out.push(' '); },
                Outcome::Povm(_) if k > 0 => { out.push('&'); },
                _ => { },
            }
            out.push_str(outcome.name());
        }
        out
    }

    fn extended(&self, outcome: Outcome, vector: Vector) -> Self {
        let mut name = self.name.clone();
        name.push(outcome);
        Self { name, vector }
    }
}

/// An ensemble of measurement branches.
#[derive(Clone, Debug)]
pub struct Measurement {
    states: Vec<Branch>,
}

// keep only branches with non-negligible probability
fn push_pruned(states: &mut Vec<Branch>, branch: Branch) {
    if branch.probability() >= PRUNE_THRESHOLD {
        states.push(branch);
    }
}

impl Measurement {
    /// Create a new `Measurement` from a list of branches.
    pub fn new(states: Vec<Branch>) -> Self { Self { states } }

    /// Create a `Measurement` with a single unnamed branch.
    pub fn from_vector(vector: Vector) -> Self {
        Self { states: vec![Branch { name: Vec::new(), vector }] }
    }

    /// Return all branches.
    pub fn states(&self) -> &[Branch] { &self.states }

    /// Return the number of branches.
    pub fn len(&self) -> usize { self.states.len() }

    /// Return `true` if there are no branches.
    pub fn is_empty(&self) -> bool { self.states.is_empty() }

    /// Return the summed probability of all branches.
    pub fn total_probability(&self) -> f64 {
        self.states.iter().map(|b| b.probability()).sum()
    }

    /// Measure the dimensions at positions `indices` of every branch.
    ///
    /// For each branch `v`, every entry of `projections` produces a new branch
    /// with the measured dimensions contracted away (see
    /// [`Vector::inner_partial`]), and every entry of `povms` a new branch
    /// `√e P v` over the same dimensions. The undetected remainder follows
    /// last, under the branch's original name: a copy of `v` scaled so that
    /// it carries whatever probability was not detected,
    /// ```math
    /// \sqrt{1 - \frac{p_\text{detected}}{\lVert v \rVert^2}} \, v
    /// ```
    /// Branches with probability below [`PRUNE_THRESHOLD`] are dropped.
    ///
    /// Projection vectors are assumed to be orthonormal and POVM projectors to
    /// be mutually orthogonal and orthogonal to the projection vectors.
    pub fn projective_measurement(
        &self,
        indices: &[usize],
        projections: &[NamedVector],
        povms: &[NamedPovm],
    ) -> MeasurementResult<Self>
    {
        povms.iter().try_for_each(|m| check_efficiency(m.efficiency))?;
        let mut states: Vec<Branch> = Vec::new();
        for branch in self.states.iter() {
            let v = &branch.vector;
            let total = branch.probability();
            let mut detected_prob = 0.0;
            for p in projections.iter() {
                let collapsed = p.vector.inner_partial(indices, v)?;
                detected_prob += collapsed.norm_squared();
                let outcome = Outcome::Projection(p.name.clone());
                push_pruned(&mut states, branch.extended(outcome, collapsed));
            }
            for m in povms.iter() {
                let detected
                    = m.projector
                    .mul_constant(m.efficiency.sqrt().into())
                    .mul_vec_partial(indices, v)?;
                detected_prob += detected.norm_squared();
                let outcome = Outcome::Povm(m.name.clone());
                push_pruned(&mut states, branch.extended(outcome, detected));
            }
            let scale
                = if total > 0.0 { (1.0 - detected_prob / total).max(0.0).sqrt() }
                else { 0.0 };
            push_pruned(
                &mut states,
                Branch { name: branch.name.clone(), vector: v.mul_constant(scale.into()) },
            );
        }
        debug!(
            before = self.states.len(),
            after = states.len(),
            "projective measurement",
        );
        Ok(Self { states })
    }

    /// Pick a single branch at random, weighted by probability, and return it
    /// normalized as a new `Measurement`.
    ///
    /// Fails if the total probability is less than the sampled number in
    /// `[0, 1)`.
    pub fn pick_random<R>(&self, rng: &mut R) -> MeasurementResult<Self>
    where R: Rng + ?Sized
    {
        let r: f64 = rng.gen();
        let mut cumulative = 0.0;
        for branch in self.states.iter() {
            cumulative += branch.probability();
            if r < cumulative {
                debug!(name = %branch.name_string(), "picked branch");
                let vector = branch.vector.normalize()?;
                return Ok(Self {
                    states: vec![Branch { name: branch.name.clone(), vector }],
                });
            }
        }
        Err(MeasurementError::ProbabilitiesDoNotSumToOne(cumulative))
    }

    /// Render every branch on its own line as `P% [name] ket`, with the
    /// probability to one decimal place.
    pub fn to_string_with(&self, format: ComplexFormat, precision: usize)
        -> String
    {
        self.states.iter()
            .map(|b| {
                format!(
                    "{:.1}% [{}] {}",
                    100.0 * b.probability(),
                    b.name_string(),
                    b.vector.to_ket_string(format, precision),
                )
            })
            .join("\n")
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = f.precision().unwrap_or(2);
        write!(f, "{}", self.to_string_with(ComplexFormat::Cartesian, precision))
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::FRAC_1_SQRT_2;
    use rand::{ SeedableRng, rngs::StdRng };
    use super::*;
    use crate::{
        photons::{ InteractionOperator, Photons, elements },
        tensor::Dimension,
    };

    fn dir_pol_projections() -> Vec<NamedVector> {
        let dims = vec![Dimension::direction(), Dimension::polarization()];
        let mut projections = Vec::new();
        for dir in [">", "^", "<", "v"] {
            for pol in ["H", "V"] {
                let vector = Vector::indicator(dims.clone(), &[dir, pol]).unwrap();
                projections.push(NamedVector::new(format!("{}{}", dir, pol), vector));
            }
        }
        projections
    }

    fn split_photon() -> Photons {
        let bs = elements::beam_splitter(135.0).unwrap();
        let interaction = InteractionOperator::new(3, 3, [(1, 1, &bs)]).unwrap();
        let mut photons = Photons::new(3, 3);
        photons.add_photon_from_indicator(0, 1, ">", "V").unwrap();
        photons.propagate_photons(true);
        photons.interact(&interaction).unwrap();
        photons
    }

    #[test]
    fn beam_splitter_branches() {
        let photons = split_photon();
        let measurement
            = Measurement::from_vector(photons.vector().clone())
            .projective_measurement(&[2, 3], &dir_pol_projections(), &[])
            .unwrap();
        assert_eq!(measurement.len(), 2);
        assert!((measurement.total_probability() - 1.0).abs() < 1e-12);
        for branch in measurement.states() {
            assert!((branch.probability() - 0.5).abs() < 1e-12);
            assert_eq!(branch.vector.names(), vec!["x", "y"]);
        }
        assert_eq!(
            measurement.to_string(),
            "50.0% [>V] (0.71 +0.00i) |1,1⟩\n50.0% [vV] (0.00 +0.71i) |1,1⟩"
        );
    }

    #[test]
    fn partial_projection_keeps_remainder() {
        let photons = split_photon();
        let projections = dir_pol_projections();
        let measurement
            = Measurement::from_vector(photons.vector().clone())
            .projective_measurement(&[2, 3], &projections[1..2], &[])
            .unwrap();
        assert_eq!(measurement.len(), 2);
        let remainder = &measurement.states()[1];
        assert!(remainder.name.is_empty());
        assert_eq!(remainder.vector.names(), photons.vector().names());
        assert_eq!(
            remainder.vector.to_string(),
            "(0.50 +0.00i) |1,1,>,V⟩ + (0.00 +0.50i) |1,1,v,V⟩",
        );
        let scaled = photons.vector().mul_constant(FRAC_1_SQRT_2.into());
        assert!(remainder.vector.is_close_to(&scaled, 1e-12).unwrap());
        assert!((measurement.total_probability() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn povm_detection() {
        let photons = split_photon();
        let dims = vec![Dimension::direction(), Dimension::polarization()];
        let down = Operator::indicator(dims, &["v", "V"]).unwrap();
        let povm = NamedPovm::new("detector", down, 0.5).unwrap();
        let measurement
            = Measurement::from_vector(photons.vector().clone())
            .projective_measurement(&[2, 3], &[], &[povm])
            .unwrap();
        assert_eq!(measurement.len(), 2);
        let detected = &measurement.states()[0];
        assert_eq!(detected.name_string(), "detector");
        assert!((detected.probability() - 0.25).abs() < 1e-12);
        assert_eq!(detected.vector.names(), photons.vector().names());
        let remainder = &measurement.states()[1];
        assert!((remainder.probability() - 0.75).abs() < 1e-12);
        let scaled = photons.vector().mul_constant(0.75_f64.sqrt().into());
        assert!(remainder.vector.is_close_to(&scaled, 1e-12).unwrap());
        assert!((measurement.total_probability() - 1.0).abs() < 1e-12);

        let projections = dir_pol_projections();
        let again
            = measurement
            .projective_measurement(&[2, 3], &projections[1..2], &[])
            .unwrap();
        let names: Vec<String> = again.states().iter().map(|b| b.name_string()).collect();
        assert_eq!(names, vec!["detector", ">V", ""]);
        assert!((again.total_probability() - 1.0).abs() < 1e-12);
        assert!(matches!(
            NamedPovm::new("bad", Operator::identity(vec![]), 1.5),
            Err(MeasurementError::InvalidEfficiency(_))
        ));
    }

    #[test]
    fn outcome_names() {
        let branch = Branch {
            name: vec![
                Outcome::Projection("1,1".into()),
                Outcome::Projection(">V".into()),
                Outcome::Povm("detector".into()),
            ],
            vector: Vector::scalar(1.0.into()),
        };
        assert_eq!(branch.name_string(), "1,1 >V&detector");
        let branch = Branch {
            name: vec![Outcome::Povm("a".into()), Outcome::Povm("b".into())],
            vector: Vector::scalar(1.0.into()),
        };
        assert_eq!(branch.name_string(), "a&b");
        assert_eq!(branch.name[1].name(), "b");
    }

    #[test]
    fn random_pick() {
        let photons = split_photon();
        let measurement
            = Measurement::from_vector(photons.vector().clone())
            .projective_measurement(&[2, 3], &dir_pol_projections(), &[])
            .unwrap();
        let mut rng = StdRng::seed_from_u64(10546);
        let mut right = 0;
        for _ in 0..1000 {
            let picked = measurement.pick_random(&mut rng).unwrap();
            assert_eq!(picked.len(), 1);
            assert!((picked.total_probability() - 1.0).abs() < 1e-12);
            match picked.states()[0].name_string().as_str() {
                ">V" => { right += 1; },
                "vV" => { },
                other => panic!("unexpected branch {}", other),
            }
        }
        assert!((400..600).contains(&right));
    }

    #[test]
    fn random_pick_without_probability() {
        let empty = Measurement::from_vector(Vector::zeros(vec![Dimension::qubit()]));
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            empty.pick_random(&mut rng),
            Err(MeasurementError::ProbabilitiesDoNotSumToOne(_))
        ));
    }
}
