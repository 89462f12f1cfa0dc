use ndarray::Array2;
use qip_cv::prelude::*;
use rand::random;
use std::f64::consts::PI;

const EPS: f64 = 1e-8;

fn count_nonzero(state: &[Complex<f64>]) -> usize {
    state.iter().filter(|c| c.norm() > EPS).count()
}

fn assert_unchanged(circuit: &mut CvCircuit<f64>) -> CircuitResult<()> {
    let state = circuit.calculate_state()?;
    assert_eq!(count_nonzero(state.statevector()), 1);
    Ok(())
}

fn assert_changed(circuit: &mut CvCircuit<f64>) -> CircuitResult<()> {
    let state = circuit.calculate_state()?;
    assert!(count_nonzero(state.statevector()) > 1);
    Ok(())
}

fn assert_states_close(a: &[Complex<f64>], b: &[Complex<f64>]) {
    assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .for_each(|(a, b)| assert!((a - b).norm() < EPS, "{} != {}", a, b));
}

/// Two qumodes of two qubits each in vacuum, no plain qubits.
fn create_unconditional() -> CircuitResult<CvCircuit<f64>> {
    let qmr = QumodeRegister::new(2, 2)?;
    let mut circuit = CvCircuit::new(qmr, 0, 0);
    circuit.cv_initialize(&[0, 0])?;
    Ok(circuit)
}

/// Two qumodes of two qubits each in vacuum, qubit 0 in |0> and qubit 1 in |1>.
fn create_conditional() -> CircuitResult<CvCircuit<f64>> {
    let qmr = QumodeRegister::new(2, 2)?;
    let mut circuit = CvCircuit::new(qmr, 2, 0);
    circuit.cv_initialize(&[0, 0])?;
    circuit.initialize(&[Complex::new(0.0, 0.0), Complex::new(1.0, 0.0)], 1)?;
    Ok(circuit)
}

fn real(x: f64) -> Complex<f64> {
    Complex::new(x, 0.0)
}

#[test]
fn test_no_gates() -> CircuitResult<()> {
    let mut circuit = create_unconditional()?;
    assert_unchanged(&mut circuit)
}

#[test]
fn test_conditional_setup() -> CircuitResult<()> {
    let mut circuit = create_conditional()?;
    let state = circuit.calculate_state()?;
    // Qumodes in qubits 0..4, qubit 1 of the plain qubits is the last one.
    assert!((state.statevector()[1].norm() - 1.0).abs() < EPS);
    Ok(())
}

#[test]
fn test_beamsplitter_once() -> CircuitResult<()> {
    let mut circuit = create_unconditional()?;
    circuit.cv_bs(0.7, 0.0, 0, 1)?;
    // Vacuum is left alone by a beamsplitter.
    assert_unchanged(&mut circuit)
}

#[test]
fn test_beamsplitter_twice() -> CircuitResult<()> {
    let mut circuit = create_unconditional()?;
    circuit.cv_d(real(0.4), 0)?;
    let (theta, phi) = (random::<f64>(), random::<f64>());
    circuit.cv_bs(theta, phi, 0, 1)?;
    circuit.cv_bs(-theta, phi, 0, 1)?;
    circuit.cv_d(real(-0.4), 0)?;
    assert_unchanged(&mut circuit)
}

#[test]
fn test_beamsplitter_moves_photon() -> CircuitResult<()> {
    let qmr = QumodeRegister::new(2, 2)?;
    let mut circuit = CvCircuit::<f64>::new(qmr, 0, 0);
    circuit.cv_initialize(&[1, 0])?;
    circuit.cv_bs(PI / 2.0, 0.0, 0, 1)?;
    let state = circuit.calculate_state()?;
    let probs_a = state.fock_probabilities(0)?;
    let probs_b = state.fock_probabilities(1)?;
    assert!(probs_a[0] > 1.0 - 1e-6);
    assert!(probs_b[1] > 1.0 - 1e-6);
    Ok(())
}

#[test]
fn test_conditional_beamsplitter() -> CircuitResult<()> {
    let mut circuit = create_conditional()?;
    circuit.cv_cnd_bs(0.3, 0.8, 0, 0, 1)?;
    assert_unchanged(&mut circuit)
}

#[test]
fn test_conditional_displacement() -> CircuitResult<()> {
    let mut circuit = create_conditional()?;
    let (alpha, beta) = (real(random()), real(random()));
    circuit.cv_cnd_d(alpha, -beta, 0, 0)?;
    circuit.cv_cnd_d(-alpha, beta, 0, 0)?;
    circuit.cv_cnd_d(alpha, -beta, 1, 0)?;
    circuit.cv_cnd_d(-alpha, beta, 1, 0)?;
    assert_unchanged(&mut circuit)
}

#[test]
fn test_conditional_squeezing() -> CircuitResult<()> {
    let mut circuit = create_conditional()?;
    let (alpha, beta) = (real(random()), real(random()));
    circuit.cv_cnd_s(alpha, -beta, 0, 0)?;
    circuit.cv_cnd_s(-alpha, beta, 0, 0)?;
    circuit.cv_cnd_s(alpha, -beta, 1, 0)?;
    circuit.cv_cnd_s(-alpha, beta, 1, 0)?;
    assert_unchanged(&mut circuit)
}

#[test]
fn test_conditional_rotation() -> CircuitResult<()> {
    let mut circuit = create_conditional()?;
    circuit.cv_cnd_r(0.3, 1.1, 1, 1)?;
    assert_unchanged(&mut circuit)
}

/// One photon in qumode 0 of two, a single plain qubit.
fn create_one_photon(ctrl_set: bool) -> CircuitResult<CvCircuit<f64>> {
    let qmr = QumodeRegister::new(2, 2)?;
    let mut circuit = CvCircuit::new(qmr, 1, 0);
    circuit.cv_initialize(&[1, 0])?;
    if ctrl_set {
        circuit.x(0)?;
    }
    Ok(circuit)
}

#[test]
fn test_conditional_beamsplitter_picks_branch() -> CircuitResult<()> {
    let (theta_a, theta_b) = (0.4, 1.1);
    for (ctrl_set, theta) in [(false, theta_a), (true, theta_b)] {
        let mut conditional = create_one_photon(ctrl_set)?;
        conditional.cv_cnd_bs(theta_a, theta_b, 0, 0, 1)?;
        let conditional = conditional.calculate_state()?;

        let mut direct = create_one_photon(ctrl_set)?;
        direct.cv_bs(theta, 0.0, 0, 1)?;
        let direct = direct.calculate_state()?;

        // The photon is shared between both qumodes.
        assert_eq!(count_nonzero(conditional.statevector()), 2);
        assert_states_close(conditional.statevector(), direct.statevector());
    }
    Ok(())
}

#[test]
fn test_conditional_rotation_phase() -> CircuitResult<()> {
    let (theta_a, theta_b) = (0.3, 1.1);
    let qmr = QumodeRegister::new(1, 2)?;
    let mut circuit = CvCircuit::<f64>::new(qmr, 1, 0);
    circuit.cv_initialize(&[1])?;
    circuit.h(0)?;
    circuit.cv_cnd_r(theta_a, theta_b, 0, 0)?;
    let state = circuit.calculate_state()?;
    let sv = state.statevector();

    // |n = 1, q = 0> and |n = 1, q = 1>.
    let (a, b) = (sv[0b01_0], sv[0b01_1]);
    assert!((a.norm() - std::f64::consts::FRAC_1_SQRT_2).abs() < EPS);
    assert!((b.norm() - std::f64::consts::FRAC_1_SQRT_2).abs() < EPS);
    let relative = b / a;
    let expected = Complex::from_polar(1.0, theta_b - theta_a);
    assert!((relative - expected).norm() < EPS, "{} != {}", relative, expected);

    // Control in |0> gives the first rotation.
    let mut conditional = CvCircuit::<f64>::new(qmr, 1, 0);
    conditional.cv_initialize(&[1])?;
    conditional.cv_cnd_r(theta_a, theta_b, 0, 0)?;
    let conditional = conditional.calculate_state()?;
    let mut direct = CvCircuit::<f64>::new(qmr, 1, 0);
    direct.cv_initialize(&[1])?;
    direct.cv_r(theta_a, 0)?;
    let direct = direct.calculate_state()?;
    assert_states_close(conditional.statevector(), direct.statevector());
    Ok(())
}

#[test]
fn test_displacement_leaves_padding_empty() -> CircuitResult<()> {
    // Cutoff 3 in two qubits: level 3 must stay empty.
    let qmr = QumodeRegister::with_cutoff(1, 3)?;
    let mut circuit = CvCircuit::<f64>::new(qmr, 1, 0);
    circuit.h(0)?;
    circuit.cv_d(real(0.6), 0)?;
    circuit.cv_cnd_d(real(0.4), real(-0.7), 0, 0)?;
    let state = circuit.calculate_state()?;
    let sv = state.statevector();
    assert!(sv[0b11_0].norm() < EPS);
    assert!(sv[0b11_1].norm() < EPS);
    let probs = state.fock_probabilities(0)?;
    assert_eq!(probs.len(), 3);
    assert!((probs.iter().sum::<f64>() - 1.0).abs() < EPS);
    assert!(probs.iter().filter(|p| **p > EPS).count() > 1);
    Ok(())
}

#[test]
fn test_conditional_picks_branch() -> CircuitResult<()> {
    let beta = real(0.5);

    // Qubit 1 holds |1> so only the second displacement acts.
    let mut conditional = create_conditional()?;
    conditional.cv_cnd_d(real(-0.9), beta, 1, 0)?;
    let conditional = conditional.calculate_state()?;

    let mut direct = create_conditional()?;
    direct.cv_d(beta, 0)?;
    let direct = direct.calculate_state()?;

    assert_states_close(conditional.statevector(), direct.statevector());
    Ok(())
}

#[test]
fn test_displacement_once() -> CircuitResult<()> {
    let mut circuit = create_unconditional()?;
    circuit.cv_d(real(0.5), 0)?;
    assert_changed(&mut circuit)
}

#[test]
fn test_displacement_twice() -> CircuitResult<()> {
    let mut circuit = create_unconditional()?;
    let alpha = Complex::new(random(), random());
    circuit.cv_d(alpha, 0)?;
    circuit.cv_d(-alpha, 0)?;
    assert_unchanged(&mut circuit)
}

#[test]
fn test_displacement_poisson() -> CircuitResult<()> {
    let qmr = QumodeRegister::new(1, 4)?;
    let mut circuit = CvCircuit::<f64>::new(qmr, 0, 0);
    let alpha = 0.5f64;
    circuit.cv_d(real(alpha), 0)?;
    let probs = circuit.calculate_state()?.fock_probabilities(0)?;
    assert_eq!(probs.len(), 16);
    let mean = alpha * alpha;
    let mut expected = (-mean).exp();
    for (n, p) in probs.iter().enumerate().take(6) {
        if n > 0 {
            expected *= mean / n as f64;
        }
        assert!((p - expected).abs() < 1e-6, "P({}) = {} != {}", n, p, expected);
    }
    Ok(())
}

#[test]
fn test_cond_displacement_gate_vs_two_separate() -> CircuitResult<()> {
    let alpha = real(PI.sqrt());
    let beta = -alpha;

    let qmr = QumodeRegister::new(1, 2)?;
    let mut circuit = CvCircuit::<f64>::new(qmr, 1, 1);
    circuit.cv_initialize(&[0])?;
    circuit.cv_cnd_d(alpha, beta, 0, 0)?;
    let state_cnd = circuit.calculate_state()?;

    // Same thing with two separately controlled unitaries on a bare builder, qumode first.
    let mut b = LocalBuilder::<f64>::default();
    let qumode = b.qudit(2).unwrap();
    let q = b.qubit();
    let ops = CvOperators::<f64>::new(qmr.cutoff());
    let d_alpha = qmr.embed_operator(&ops.d(alpha), 1)?;
    let d_beta = qmr.embed_operator(&ops.d(beta), 1)?;
    let mut cb = b.condition_with_state(q, 0)?;
    let qumode = cb.apply_vec_matrix(qumode, d_alpha)?;
    let q = cb.dissolve()?;
    let mut cb = b.condition_with_state(q, 1)?;
    let _qumode = cb.apply_vec_matrix(qumode, d_beta)?;
    let _q = cb.dissolve()?;
    let (state_unitary, _) = b.calculate_state()?;

    assert_states_close(state_cnd.statevector(), &state_unitary);
    Ok(())
}

#[test]
fn test_displacement_calibration() -> CircuitResult<()> {
    let qmr = QumodeRegister::new(1, 2)?;
    let mut circuit = CvCircuit::<f64>::new(qmr, 1, 1);
    circuit.cv_initialize(&[0])?;

    let alpha = PI.sqrt();
    circuit.h(0)?;
    circuit.cv_cnd_d(real(alpha), real(-alpha), 0, 0)?;
    circuit.cv_d(Complex::new(0.0, alpha), 0)?;
    circuit.cv_cnd_d(real(-alpha), real(alpha), 0, 0)?;
    circuit.cv_d(Complex::new(0.0, -alpha), 0)?;
    circuit.h(0)?;
    circuit.measure(0, 0)?;

    let state = circuit.calculate_state()?;
    assert!(!state.statevector().is_empty());
    let norm: f64 = state.statevector().iter().map(|c| c.norm_sqr()).sum();
    assert!((norm - 1.0).abs() < EPS);
    let (value, p) = state.clbit(0).unwrap();
    assert!(value < 2);
    assert!(p > 0.0 && p <= 1.0 + EPS);
    Ok(())
}

#[test]
fn test_rotation_once() -> CircuitResult<()> {
    let mut circuit = create_unconditional()?;
    circuit.cv_r(0.8, 0)?;
    // Vacuum only picks up a trivial phase.
    assert_unchanged(&mut circuit)
}

#[test]
fn test_rotation_twice() -> CircuitResult<()> {
    let mut circuit = create_unconditional()?;
    circuit.cv_d(real(0.3), 0)?;
    let theta = random::<f64>();
    circuit.cv_r(theta, 0)?;
    circuit.cv_r(-theta, 0)?;
    circuit.cv_d(real(-0.3), 0)?;
    assert_unchanged(&mut circuit)
}

#[test]
fn test_squeezing_once() -> CircuitResult<()> {
    let mut circuit = create_unconditional()?;
    circuit.cv_s(real(0.4), 0)?;
    assert_changed(&mut circuit)
}

#[test]
fn test_squeezing_twice() -> CircuitResult<()> {
    let mut circuit = create_unconditional()?;
    let z = real(random());
    circuit.cv_s(z, 0)?;
    circuit.cv_s(-z, 0)?;
    assert_unchanged(&mut circuit)
}

#[test]
fn test_two_mode_squeezing_once() -> CircuitResult<()> {
    let mut circuit = create_unconditional()?;
    circuit.cv_s2(real(0.3), 0, 1)?;
    assert_changed(&mut circuit)
}

#[test]
fn test_two_mode_squeezing_twice() -> CircuitResult<()> {
    let mut circuit = create_unconditional()?;
    let z = real(random());
    circuit.cv_s2(z, 0, 1)?;
    circuit.cv_s2(-z, 0, 1)?;
    assert_unchanged(&mut circuit)
}

#[test]
fn test_all_gates() -> CircuitResult<()> {
    let mut circuit = create_conditional()?;
    circuit.cv_bs(0.4, 0.1, 0, 1)?;
    circuit.cv_d(real(0.3), 1)?;
    circuit.cv_r(0.5, 0)?;
    circuit.cv_s(real(0.2), 0)?;
    circuit.cv_s2(real(0.25), 0, 1)?;
    circuit.cv_cnd_d(real(0.1), real(-0.1), 1, 0)?;
    circuit.cv_cnd_s(real(0.1), real(0.2), 0, 1)?;
    let state = circuit.calculate_state()?;
    let norm: f64 = state.statevector().iter().map(|c| c.norm_sqr()).sum();
    assert!((norm - 1.0).abs() < EPS);
    assert!(count_nonzero(state.statevector()) > 1);
    Ok(())
}

#[test]
fn test_initialize_fock_state() -> CircuitResult<()> {
    let qmr = QumodeRegister::new(2, 2)?;
    let mut circuit = CvCircuit::<f64>::new(qmr, 0, 2);
    circuit.cv_initialize(&[3, 1])?;
    circuit.cv_measure(0, 0)?;
    circuit.cv_measure(1, 1)?;
    let state = circuit.calculate_state()?;
    assert!((state.statevector()[0b11_01].norm() - 1.0).abs() < EPS);
    let (n, p) = state.clbit(0).unwrap();
    assert_eq!(n, 3);
    assert!((p - 1.0).abs() < EPS);
    assert_eq!(state.clbit(1).map(|(n, _)| n), Some(1));
    let probs = state.fock_probabilities(1)?;
    assert!((probs[1] - 1.0).abs() < EPS);
    Ok(())
}

#[test]
fn test_initialize_twice_resets() -> CircuitResult<()> {
    let qmr = QumodeRegister::new(1, 2)?;
    let mut circuit = CvCircuit::<f64>::new(qmr, 0, 0);
    circuit.cv_d(real(0.7), 0)?;
    circuit.cv_initialize_qumode(2, 0)?;
    let state = circuit.calculate_state()?;
    assert!((state.statevector()[2].norm() - 1.0).abs() < EPS);
    Ok(())
}

#[test]
fn test_fock_state_out_of_range() -> CircuitResult<()> {
    let qmr = QumodeRegister::new(2, 2)?;
    let mut circuit = CvCircuit::<f64>::new(qmr, 0, 0);
    let err = circuit.cv_initialize(&[1, 4]).unwrap_err();
    assert!(matches!(
        err,
        CircuitError::FockStateOutOfRange { n: 4, cutoff: 4 }
    ));
    assert!(err
        .to_string()
        .starts_with("The parameter n should be lower than the cutoff"));
    // Nothing was attached by the failed call.
    assert_eq!(circuit.builder().pipeline_depth(), 0);

    // Cutoff smaller than the qubit space: level 3 exists in the qubits but not in the qumode.
    let qmr = QumodeRegister::with_cutoff(1, 3)?;
    let mut circuit = CvCircuit::<f64>::new(qmr, 0, 0);
    assert!(circuit.cv_initialize(&[3]).is_err());
    circuit.cv_initialize(&[2])?;
    Ok(())
}

#[test]
fn test_bad_wires() -> CircuitResult<()> {
    let qmr = QumodeRegister::new(2, 2)?;
    let mut circuit = CvCircuit::<f64>::new(qmr, 1, 1);
    assert!(matches!(
        circuit.cv_d(real(0.1), 2),
        Err(CircuitError::QumodeOutOfRange { index: 2, .. })
    ));
    assert!(matches!(
        circuit.cv_bs(0.1, 0.0, 1, 1),
        Err(CircuitError::RegisterInUse(_))
    ));
    assert!(matches!(
        circuit.x(1),
        Err(CircuitError::QubitOutOfRange { index: 1, .. })
    ));
    assert!(matches!(
        circuit.measure(0, 1),
        Err(CircuitError::ClbitOutOfRange { index: 1, .. })
    ));
    // The circuit is still usable after the failures.
    circuit.cv_bs(0.1, 0.0, 0, 1)?;
    circuit.x(0)?;
    assert_eq!(circuit.builder().pipeline_depth(), 2);
    Ok(())
}

#[test]
fn test_instruction_inverse() -> CircuitResult<()> {
    let mut circuit = create_conditional()?;
    let ops = circuit.ops().clone();
    let instruction = circuit.cv_conditional("Sc", &ops.s(real(0.3)), &ops.s(real(-0.5)))?;
    let inverse = instruction.inverse()?;
    assert_eq!(inverse.name(), "Sc_dg");
    circuit.append(&instruction, &[1], &[0])?;
    circuit.append(&inverse, &[1], &[0])?;
    assert_unchanged(&mut circuit)
}

#[test]
fn test_append_width_mismatch() -> CircuitResult<()> {
    let mut circuit = create_conditional()?;
    let ops = circuit.ops().clone();
    let instruction = circuit.cv_conditional("Dc", &ops.d(real(0.3)), &ops.d(real(0.1)))?;
    assert_eq!(instruction.num_qubits(), 1);
    assert_eq!(instruction.num_qumodes(), 1);
    assert!(circuit.append(&instruction, &[0, 1], &[0]).is_err());
    assert!(circuit.append(&instruction, &[0], &[0, 1]).is_err());

    let mismatched = circuit.cv_conditional("BSc", &ops.bs(0.1, 0.0), &ops.d(real(0.1)));
    assert!(mismatched.is_err());
    Ok(())
}

#[test]
fn test_gate_labels() -> CircuitResult<()> {
    let mut circuit = create_unconditional()?;
    circuit.cv_bs(0.1, 0.0, 0, 1)?;
    circuit.cv_d(real(0.1), 0)?;
    circuit.cv_r(0.1, 0)?;
    circuit.cv_s(real(0.1), 0)?;
    circuit.cv_s2(real(0.1), 0, 1)?;
    let labels = circuit
        .builder()
        .instructions()
        .iter()
        .filter_map(|(_, co)| co.label())
        .filter(|l| !matches!(*l, "Reset" | "Initialize"))
        .collect::<Vec<_>>();
    assert_eq!(labels, vec!["BS", "D", "R", "S", "S2"]);
    Ok(())
}

#[test]
fn test_little_endian() -> CircuitResult<()> {
    let qmr = QumodeRegister::new(1, 1)?;
    let mut circuit = CvCircuit::<f64>::new(qmr, 1, 0);
    circuit.x(0)?;
    let state = circuit.calculate_state()?;
    assert!((state.statevector()[0b01].norm() - 1.0).abs() < EPS);
    let little = state.into_statevector(Representation::LittleEndian);
    assert!((little[0b10].norm() - 1.0).abs() < EPS);
    Ok(())
}

#[test]
fn test_failed_initialize_keeps_qubit() -> CircuitResult<()> {
    let qmr = QumodeRegister::new(1, 1)?;
    let mut circuit = CvCircuit::<f64>::new(qmr, 1, 0);
    assert!(matches!(
        circuit.initialize(&[real(1.0), real(0.0), real(0.0)], 0),
        Err(CircuitError::InvalidAmplitudes(_))
    ));
    assert!(matches!(
        circuit.initialize(&[real(0.0), real(0.0)], 0),
        Err(CircuitError::InvalidAmplitudes(_))
    ));
    assert_eq!(circuit.builder().pipeline_depth(), 0);

    circuit.h(0)?;
    circuit.initialize(&[real(0.0), real(2.0)], 0)?;
    let state = circuit.calculate_state()?;
    assert!((state.statevector()[0b0_1].norm() - 1.0).abs() < EPS);
    Ok(())
}

#[test]
fn test_oversized_unitary_rejected() -> CircuitResult<()> {
    let qmr = QumodeRegister::new(2, 2)?;
    let mut circuit = CvCircuit::<f64>::new(qmr, 0, 0);
    let op = Array2::<Complex<f64>>::eye(4);
    assert!(matches!(
        circuit.cv_unitary(&op, &[0; 40], "U"),
        Err(CircuitError::RegisterInUse(_))
    ));
    let many = (0..40).collect::<Vec<_>>();
    assert!(matches!(
        circuit.cv_unitary(&op, &many, "U"),
        Err(CircuitError::QumodeOutOfRange { index: 2, .. })
    ));
    // Valid wires, wrong operator size.
    assert!(circuit.cv_unitary(&op, &[0, 1], "U").is_err());
    assert_eq!(circuit.builder().pipeline_depth(), 0);

    circuit.cv_unitary(&op, &[1], "U")?;
    circuit.cv_bs(0.2, 0.0, 0, 1)?;
    assert_eq!(circuit.builder().pipeline_depth(), 2);
    Ok(())
}
