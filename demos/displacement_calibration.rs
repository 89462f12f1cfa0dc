use qip_cv::prelude::*;
use std::f64::consts::PI;

/// Echoed conditional displacements around a displacement in the conjugate quadrature. The
/// qubit picks up a geometric phase which shows in the measured distribution.
fn main() -> CircuitResult<()> {
    let qmr = QumodeRegister::new(1, 4)?;
    let mut circuit = CvCircuit::<f64>::named(qmr, 1, 1, "displacement_calibration");
    circuit.cv_initialize(&[0])?;

    let alpha = PI.sqrt() / 2.0;
    let plus = Complex::new(alpha, 0.0);

    circuit.h(0)?;
    circuit.cv_cnd_d(plus, -plus, 0, 0)?;
    circuit.cv_d(Complex::new(0.0, alpha), 0)?;
    circuit.cv_cnd_d(-plus, plus, 0, 0)?;
    circuit.cv_d(Complex::new(0.0, -alpha), 0)?;
    circuit.h(0)?;
    circuit.measure(0, 0)?;

    let state = circuit.calculate_state()?;
    let probs = state.fock_probabilities(0)?;
    println!("Fock distribution of the qumode:");
    for (n, p) in probs.iter().enumerate().filter(|(_, p)| **p > 1e-6) {
        println!("\t|{}>: {:.6}", n, p);
    }
    if let Some((value, p)) = state.clbit(0) {
        println!("Measured qubit: {} (p = {:.6})", value, p);
    }
    Ok(())
}
