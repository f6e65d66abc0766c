//! Cross-checks the radix-2 engine against `rustfft`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;
use spectra_core::{ComplexBuffer, FftEngine};

fn random_buffer(rng: &mut StdRng, len: usize) -> ComplexBuffer {
    let real = (0..len).map(|_| rng.random_range(-1.0f32..1.0)).collect();
    let imag = (0..len).map(|_| rng.random_range(-1.0f32..1.0)).collect();
    ComplexBuffer::from_parts(real, imag)
}

fn reference(input: &ComplexBuffer, inverse: bool) -> Vec<Complex<f32>> {
    let mut planner = FftPlanner::<f32>::new();
    let fft = if inverse {
        planner.plan_fft_inverse(input.len())
    } else {
        planner.plan_fft_forward(input.len())
    };
    let mut data: Vec<Complex<f32>> = input
        .real
        .iter()
        .zip(&input.imag)
        .map(|(&re, &im)| Complex::new(re, im))
        .collect();
    fft.process(&mut data);
    data
}

fn assert_close(actual: &ComplexBuffer, expected: &[Complex<f32>], tolerance: f32) {
    for (k, c) in expected.iter().enumerate() {
        assert!(
            (actual.real[k] - c.re).abs() < tolerance && (actual.imag[k] - c.im).abs() < tolerance,
            "bin {k}: got ({}, {}), expected ({}, {})",
            actual.real[k],
            actual.imag[k],
            c.re,
            c.im
        );
    }
}

#[test]
fn forward_matches_rustfft() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for order in 2..=12 {
        let mut engine = FftEngine::new(order).unwrap();
        let input = random_buffer(&mut rng, engine.size());
        let mut output = ComplexBuffer::zeros(engine.size());
        engine.fft_buffer(&input, &mut output);
        let tolerance = 2e-4 * (order as f32);
        assert_close(&output, &reference(&input, false), tolerance);
    }
}

#[test]
fn inverse_matches_rustfft() {
    let mut rng = StdRng::seed_from_u64(17);
    for order in [2, 3, 7, 10] {
        let mut engine = FftEngine::new(order).unwrap();
        let input = random_buffer(&mut rng, engine.size());
        let mut output = ComplexBuffer::zeros(engine.size());
        engine.ifft_buffer(&input, &mut output);
        assert_close(&output, &reference(&input, true), 2e-3);
    }
}

#[test]
fn real_transform_matches_rustfft() {
    let mut rng = StdRng::seed_from_u64(99);
    for order in [2, 5, 9, 11] {
        let mut engine = FftEngine::new(order).unwrap();
        let real: Vec<f32> = (0..engine.size()).map(|_| rng.random_range(-1.0f32..1.0)).collect();
        let input = ComplexBuffer::from_real(&real);
        let mut output = ComplexBuffer::zeros(engine.size());
        engine.rfft_buffer(&real, &mut output);
        assert_close(&output, &reference(&input, false), 2e-3);
    }
}

#[test]
fn scaled_inverse_recovers_signal_at_large_order() {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut engine = FftEngine::new(14).unwrap();
    let input = random_buffer(&mut rng, engine.size());
    let mut spectrum = ComplexBuffer::zeros(engine.size());
    let mut restored = ComplexBuffer::zeros(engine.size());
    engine.fft_buffer(&input, &mut spectrum);
    engine.ifft_buffer(&spectrum, &mut restored);
    engine.ifft_scale(&mut restored.real, &mut restored.imag);
    for k in 0..engine.size() {
        assert!((restored.real[k] - input.real[k]).abs() < 5e-4);
        assert!((restored.imag[k] - input.imag[k]).abs() < 5e-4);
    }
}
