//! Truncated Fock-space operators and the matrices of the continuous-variable gates.
//!
//! Every gate is the matrix exponential of an anti-Hermitian generator built from the truncated
//! ladder operators, so gate matrices are unitary at any cutoff and `op(x) op(-x) = I`.

use crate::types::Precision;
use crate::Complex;
use ndarray::linalg::kron;
use ndarray::Array2;
use num_traits::{One, Zero};

/// Number of Taylor terms used by [`expm`] once the matrix has been scaled down.
const TAYLOR_TERMS: usize = 18;

/// Operators on `cutoff` Fock levels of a single qumode.
#[derive(Debug, Clone)]
pub struct CvOperators<P: Precision> {
    cutoff: usize,
    a: Array2<Complex<P>>,
    a_dag: Array2<Complex<P>>,
    eye: Array2<Complex<P>>,
}

fn real<P: Precision>(x: f64) -> P {
    P::from(x).unwrap_or_else(P::zero)
}

impl<P: Precision> CvOperators<P> {
    /// Precompute the ladder operators for `cutoff` levels.
    pub fn new(cutoff: usize) -> Self {
        let mut a = Array2::zeros((cutoff, cutoff));
        (1..cutoff).for_each(|n| {
            a[[n - 1, n]] = Complex::new(real::<P>(n as f64).sqrt(), P::zero());
        });
        let a_dag = a.t().mapv(|c: Complex<P>| c.conj());
        Self {
            cutoff,
            a,
            a_dag,
            eye: Array2::eye(cutoff),
        }
    }

    /// Number of Fock levels.
    pub fn cutoff(&self) -> usize {
        self.cutoff
    }

    /// Annihilation operator, `a|n> = sqrt(n)|n-1>`.
    pub fn annihilation(&self) -> &Array2<Complex<P>> {
        &self.a
    }

    /// Creation operator, `a†|n> = sqrt(n+1)|n+1>` below the cutoff.
    pub fn creation(&self) -> &Array2<Complex<P>> {
        &self.a_dag
    }

    /// Number operator `a†a`.
    pub fn number(&self) -> Array2<Complex<P>> {
        self.a_dag.dot(&self.a)
    }

    /// Identity on one qumode.
    pub fn identity(&self) -> &Array2<Complex<P>> {
        &self.eye
    }

    /// Displacement `exp(alpha a† - alpha* a)`.
    pub fn d(&self, alpha: Complex<P>) -> Array2<Complex<P>> {
        let gen = self.a_dag.mapv(|c| c * alpha) - self.a.mapv(|c| c * alpha.conj());
        expm(&gen)
    }

    /// Phase space rotation `exp(i theta a†a)`.
    pub fn r(&self, theta: P) -> Array2<Complex<P>> {
        Array2::from_shape_fn((self.cutoff, self.cutoff), |(i, j)| {
            if i == j {
                Complex::from_polar(P::one(), theta * real(i as f64))
            } else {
                Complex::zero()
            }
        })
    }

    /// Single mode squeezing `exp(1/2 (z* a^2 - z a†^2))`.
    pub fn s(&self, z: Complex<P>) -> Array2<Complex<P>> {
        let half = real::<P>(0.5);
        let a2 = self.a.dot(&self.a);
        let a_dag2 = self.a_dag.dot(&self.a_dag);
        let gen = a2.mapv(|c| c * z.conj() * half) - a_dag2.mapv(|c| c * z * half);
        expm(&gen)
    }

    /// Two mode beamsplitter `exp(theta (e^{i phi} a1 a2† - e^{-i phi} a1† a2))`. Rows are indexed
    /// by `n1 * cutoff + n2`.
    pub fn bs(&self, theta: P, phi: P) -> Array2<Complex<P>> {
        let (a1, a1_dag, a2, a2_dag) = self.two_mode_ladders();
        let phase = Complex::from_polar(theta, phi);
        let phase_conj = Complex::from_polar(theta, -phi);
        let gen = a1.dot(&a2_dag).mapv(|c| c * phase) - a1_dag.dot(&a2).mapv(|c| c * phase_conj);
        expm(&gen)
    }

    /// Two mode squeezing `exp(z a1† a2† - z* a1 a2)`. Rows are indexed by `n1 * cutoff + n2`.
    pub fn s2(&self, z: Complex<P>) -> Array2<Complex<P>> {
        let (a1, a1_dag, a2, a2_dag) = self.two_mode_ladders();
        let gen = a1_dag.dot(&a2_dag).mapv(|c| c * z) - a1.dot(&a2).mapv(|c| c * z.conj());
        expm(&gen)
    }

    fn two_mode_ladders(
        &self,
    ) -> (
        Array2<Complex<P>>,
        Array2<Complex<P>>,
        Array2<Complex<P>>,
        Array2<Complex<P>>,
    ) {
        (
            kron(&self.a, &self.eye),
            kron(&self.a_dag, &self.eye),
            kron(&self.eye, &self.a),
            kron(&self.eye, &self.a_dag),
        )
    }
}

/// Matrix exponential by scaling and squaring: the matrix is halved until its max row sum is at
/// most 1/2, exponentiated with a truncated Taylor series, then squared back.
pub fn expm<P: Precision>(m: &Array2<Complex<P>>) -> Array2<Complex<P>> {
    let dim = m.nrows();
    let norm = m
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|c| c.norm()).sum::<P>())
        .fold(P::zero(), P::max);

    let half = real::<P>(0.5);
    let mut scale = P::one();
    let mut squarings = 0;
    while norm * scale > half {
        scale *= half;
        squarings += 1;
    }

    let scaled = m.mapv(|c| c * scale);
    let mut result = Array2::<Complex<P>>::eye(dim);
    let mut term = Array2::<Complex<P>>::eye(dim);
    for k in 1..=TAYLOR_TERMS {
        let k = real::<P>(k as f64);
        term = term.dot(&scaled).mapv(|c| c / k);
        result = result + &term;
    }
    for _ in 0..squarings {
        result = result.dot(&result);
    }
    result
}
