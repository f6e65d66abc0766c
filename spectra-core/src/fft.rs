//! # Fast Fourier Transform (FFT) Module
//!
//! A power-of-two, radix-2 FFT engine built for repeated use on fixed-size
//! analysis frames. The engine precomputes its twiddle factors once and keeps
//! its own scratch storage, so a transform never allocates.
//!
//! ## Features
//! - Forward and inverse complex FFT (`fft`, `ifft`)
//! - Forward real-input FFT with a specialised first stage (`rfft`)
//! - In-place `1/N` scaling for the inverse (`ifft_scale`)
//! - Twiddle tables shared read-only between engines through `Arc`
//!
//! Each transform runs `order` butterfly stages. Stage output ping-pongs
//! between the caller's output pair and the engine's scratch pair; the side
//! written by the first stage is picked from the parity of `order` so that the
//! last stage lands in the caller's buffers.

use std::f64::consts::PI;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, SpectraError};

/// Precomputed `cos(-2πk/N)` and `sin(-2πk/N)` for `k` in `[0, N)`.
///
/// A table is tied to the order it was built for and never changes after
/// construction, so it can be shared between any number of engines.
#[derive(Debug, Clone, PartialEq)]
pub struct TwiddleTable {
    order: u32,
    cos: Vec<f32>,
    sin: Vec<f32>,
}

impl TwiddleTable {
    /// Builds the table for transforms of length `2^order`.
    ///
    /// # Errors
    /// * `InvalidOrder` if `order <= 1`; a radix-2 split needs at least 4 points.
    /// * `OrderTooLarge` if `2^order` does not fit in `usize`.
    pub fn new(order: u32) -> Result<Self> {
        if order <= 1 {
            return Err(SpectraError::InvalidOrder(order));
        }
        if order >= usize::BITS {
            return Err(SpectraError::OrderTooLarge(order));
        }

        let size = 1usize << order;
        let omega = -2.0 * PI / size as f64;
        let (cos, sin) = (0..size)
            .map(|k| {
                let angle = omega * k as f64;
                (angle.cos() as f32, angle.sin() as f32)
            })
            .unzip();

        Ok(Self { order, cos, sin })
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    /// Transform length `N`.
    pub fn size(&self) -> usize {
        self.cos.len()
    }

    /// `N / 2`.
    pub fn half_size(&self) -> usize {
        self.cos.len() / 2
    }

    pub fn cos(&self) -> &[f32] {
        &self.cos
    }

    pub fn sin(&self) -> &[f32] {
        &self.sin
    }
}

/// Returns the transform order for a frame size, if it is a power of two of
/// at least 4 samples.
pub fn order_for_size(size: usize) -> Result<u32> {
    if size < 4 || !size.is_power_of_two() {
        return Err(SpectraError::InvalidFrameSize(size));
    }
    Ok(size.trailing_zeros())
}

/// A complex signal stored as separate real and imaginary arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComplexBuffer {
    pub real: Vec<f32>,
    pub imag: Vec<f32>,
}

impl ComplexBuffer {
    pub fn zeros(len: usize) -> Self {
        Self {
            real: vec![0.0; len],
            imag: vec![0.0; len],
        }
    }

    /// Wraps a real signal, with an all-zero imaginary part.
    pub fn from_real(real: &[f32]) -> Self {
        Self {
            real: real.to_vec(),
            imag: vec![0.0; real.len()],
        }
    }

    /// # Panics
    /// If `real` and `imag` differ in length.
    pub fn from_parts(real: Vec<f32>, imag: Vec<f32>) -> Self {
        assert_eq!(
            real.len(),
            imag.len(),
            "real and imaginary parts must have the same length"
        );
        Self { real, imag }
    }

    pub fn len(&self) -> usize {
        self.real.len()
    }

    pub fn is_empty(&self) -> bool {
        self.real.is_empty()
    }

    /// `sqrt(re² + im²)` at index `k`.
    #[inline]
    pub fn magnitude(&self, k: usize) -> f32 {
        let (re, im) = (self.real[k], self.imag[k]);
        (re * re + im * im).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    /// Uses the complex conjugate of each twiddle factor.
    Inverse,
}

impl Direction {
    #[inline]
    fn twiddle(self, table: &TwiddleTable, index: usize) -> (f32, f32) {
        let wr = table.cos[index];
        let wi = table.sin[index];
        match self {
            Direction::Forward => (wr, wi),
            Direction::Inverse => (wr, -wi),
        }
    }
}

/// Loop bounds for one butterfly stage.
#[derive(Debug, Clone, Copy)]
struct Stage {
    pairs_in_group: usize,
    number_of_groups: usize,
    distance: usize,
}

impl Stage {
    fn first(half_size: usize) -> Self {
        Self {
            pairs_in_group: half_size,
            number_of_groups: 1,
            distance: half_size,
        }
    }

    fn next(self) -> Self {
        Self {
            pairs_in_group: self.pairs_in_group >> 1,
            number_of_groups: self.number_of_groups << 1,
            distance: self.distance >> 1,
        }
    }
}

/// One complete stage of butterflies, reading `a` and writing `b`.
fn radix2_stage(
    table: &TwiddleTable,
    stage: Stage,
    direction: Direction,
    a_real: &[f32],
    a_imag: &[f32],
    b_real: &mut [f32],
    b_imag: &mut [f32],
) {
    let half_size = table.half_size();
    let mut index = 0;
    for k in 0..stage.number_of_groups {
        let first = 2 * k * stage.pairs_in_group;
        let (wr, wi) = direction.twiddle(table, k * stage.pairs_in_group);
        for j in first..first + stage.pairs_in_group {
            let idx = j + stage.distance;
            let tr = wr * a_real[idx] - wi * a_imag[idx];
            let ti = wr * a_imag[idx] + wi * a_real[idx];
            b_real[index] = a_real[j] + tr;
            b_imag[index] = a_imag[j] + ti;
            b_real[index + half_size] = a_real[j] - tr;
            b_imag[index + half_size] = a_imag[j] - ti;
            index += 1;
        }
    }
}

/// First forward stage for a purely real input: the imaginary terms vanish.
fn real_first_stage(
    table: &TwiddleTable,
    stage: Stage,
    a_real: &[f32],
    b_real: &mut [f32],
    b_imag: &mut [f32],
) {
    let half_size = table.half_size();
    let mut index = 0;
    for k in 0..stage.number_of_groups {
        let first = 2 * k * stage.pairs_in_group;
        let (wr, wi) = Direction::Forward.twiddle(table, k * stage.pairs_in_group);
        for j in first..first + stage.pairs_in_group {
            let idx = j + stage.distance;
            let tr = wr * a_real[idx];
            let ti = wi * a_real[idx];
            b_real[index] = a_real[j] + tr;
            b_imag[index] = ti;
            b_real[index + half_size] = a_real[j] - tr;
            b_imag[index + half_size] = -ti;
            index += 1;
        }
    }
}

/// Engine-owned working storage, reused by every transform.
#[derive(Debug, Clone)]
struct Scratch {
    real: Vec<f32>,
    imag: Vec<f32>,
}

/// Which buffer pair holds the latest stage result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Output,
    Scratch,
}

impl Side {
    fn other(self) -> Self {
        match self {
            Side::Output => Side::Scratch,
            Side::Scratch => Side::Output,
        }
    }

    /// Side the first stage writes to so that, after `order` stages, the
    /// result sits in the output pair.
    fn opening(order: u32) -> Self {
        if order & 1 == 1 {
            Side::Output
        } else {
            Side::Scratch
        }
    }
}

/// The caller's output pair and the engine's scratch pair, with an explicit
/// tag for the side holding the current data.
struct PingPong<'a> {
    output_real: &'a mut [f32],
    output_imag: &'a mut [f32],
    scratch_real: &'a mut [f32],
    scratch_imag: &'a mut [f32],
    current: Side,
}

impl<'a> PingPong<'a> {
    /// Runs the opening stage into the parity-selected side.
    fn open(
        output_real: &'a mut [f32],
        output_imag: &'a mut [f32],
        scratch: &'a mut Scratch,
        order: u32,
        opening_stage: impl FnOnce(&mut [f32], &mut [f32]),
    ) -> Self {
        let mut buffers = Self {
            output_real,
            output_imag,
            scratch_real: &mut scratch.real,
            scratch_imag: &mut scratch.imag,
            current: Side::opening(order),
        };
        let (re, im) = buffers.side_mut(buffers.current);
        opening_stage(re, im);
        buffers
    }

    fn side_mut(&mut self, side: Side) -> (&mut [f32], &mut [f32]) {
        match side {
            Side::Output => (&mut *self.output_real, &mut *self.output_imag),
            Side::Scratch => (&mut *self.scratch_real, &mut *self.scratch_imag),
        }
    }

    /// Feeds the current side through `stage` into the other side.
    fn advance(&mut self, stage: impl FnOnce(&[f32], &[f32], &mut [f32], &mut [f32])) {
        match self.current {
            Side::Output => stage(
                &*self.output_real,
                &*self.output_imag,
                &mut *self.scratch_real,
                &mut *self.scratch_imag,
            ),
            Side::Scratch => stage(
                &*self.scratch_real,
                &*self.scratch_imag,
                &mut *self.output_real,
                &mut *self.output_imag,
            ),
        }
        self.current = self.current.other();
    }

    /// Leaves the authoritative result in the output pair.
    fn finish(self) {
        if self.current == Side::Scratch {
            self.output_real.copy_from_slice(&*self.scratch_real);
            self.output_imag.copy_from_slice(&*self.scratch_imag);
        }
    }
}

/// Radix-2 FFT engine for one fixed transform order.
///
/// Every call mutates the engine's scratch buffers, so one engine must not be
/// used from several places at once. Clone it (the twiddle table is shared,
/// the scratch storage is not) or build engines with [`FftEngine::with_table`]
/// for concurrent work.
#[derive(Debug, Clone)]
pub struct FftEngine {
    table: Arc<TwiddleTable>,
    scratch: Scratch,
}

impl FftEngine {
    /// Creates an engine for transforms of length `2^order`.
    pub fn new(order: u32) -> Result<Self> {
        Ok(Self::with_table(Arc::new(TwiddleTable::new(order)?)))
    }

    /// Creates an engine for a frame size that is a power of two.
    pub fn for_size(size: usize) -> Result<Self> {
        Self::new(order_for_size(size)?)
    }

    /// Creates an engine around an existing, possibly shared, twiddle table.
    pub fn with_table(table: Arc<TwiddleTable>) -> Self {
        let size = table.size();
        debug!(order = table.order(), size, "created FFT engine");
        Self {
            table,
            scratch: Scratch {
                real: vec![0.0; size],
                imag: vec![0.0; size],
            },
        }
    }

    pub fn order(&self) -> u32 {
        self.table.order()
    }

    pub fn size(&self) -> usize {
        self.table.size()
    }

    pub fn half_size(&self) -> usize {
        self.table.half_size()
    }

    pub fn table(&self) -> &Arc<TwiddleTable> {
        &self.table
    }

    /// Forward complex FFT: `b[k] = Σ x[n]·exp(-2πi·k·n/N)`.
    ///
    /// # Arguments
    /// * `xr`, `xi` - Real and imaginary parts of the input
    /// * `b_real`, `b_imag` - Receive the spectrum in natural bin order
    ///
    /// # Panics
    /// If any buffer is not exactly `N` long.
    pub fn fft(&mut self, xr: &[f32], xi: &[f32], b_real: &mut [f32], b_imag: &mut [f32]) {
        self.check_len("xr", xr.len());
        self.check_len("xi", xi.len());
        self.check_output(b_real, b_imag);
        self.transform(Direction::Forward, b_real, b_imag, move |table, stage, re, im| {
            radix2_stage(table, stage, Direction::Forward, xr, xi, re, im)
        });
    }

    /// Unnormalised inverse complex FFT: `ifft(fft(x)) = N·x`.
    /// Follow with [`FftEngine::ifft_scale`] for the true inverse.
    ///
    /// # Panics
    /// If any buffer is not exactly `N` long.
    pub fn ifft(&mut self, xr: &[f32], xi: &[f32], b_real: &mut [f32], b_imag: &mut [f32]) {
        self.check_len("xr", xr.len());
        self.check_len("xi", xi.len());
        self.check_output(b_real, b_imag);
        self.transform(Direction::Inverse, b_real, b_imag, move |table, stage, re, im| {
            radix2_stage(table, stage, Direction::Inverse, xr, xi, re, im)
        });
    }

    /// Forward FFT of a real signal. Same result as [`FftEngine::fft`] with a
    /// zero imaginary input; only bins `[0, N/2)` carry non-redundant content.
    ///
    /// # Arguments
    /// * `xr` - Real input signal
    /// * `b_real`, `b_imag` - Receive the full `N`-bin spectrum
    ///
    /// # Panics
    /// If any buffer is not exactly `N` long.
    pub fn rfft(&mut self, xr: &[f32], b_real: &mut [f32], b_imag: &mut [f32]) {
        self.check_len("xr", xr.len());
        self.check_output(b_real, b_imag);
        self.transform(Direction::Forward, b_real, b_imag, move |table, stage, re, im| {
            real_first_stage(table, stage, xr, re, im)
        });
    }

    /// Multiplies both arrays by `1/N` in place.
    ///
    /// # Panics
    /// If either array is not exactly `N` long.
    pub fn ifft_scale(&self, xr: &mut [f32], xi: &mut [f32]) {
        self.check_output(xr, xi);
        let factor = 1.0 / self.size() as f32;
        for (re, im) in xr.iter_mut().zip(xi.iter_mut()) {
            *re *= factor;
            *im *= factor;
        }
    }

    pub fn fft_buffer(&mut self, input: &ComplexBuffer, output: &mut ComplexBuffer) {
        self.fft(&input.real, &input.imag, &mut output.real, &mut output.imag);
    }

    pub fn ifft_buffer(&mut self, input: &ComplexBuffer, output: &mut ComplexBuffer) {
        self.ifft(&input.real, &input.imag, &mut output.real, &mut output.imag);
    }

    pub fn rfft_buffer(&mut self, input: &[f32], output: &mut ComplexBuffer) {
        self.rfft(input, &mut output.real, &mut output.imag);
    }

    fn transform(
        &mut self,
        direction: Direction,
        b_real: &mut [f32],
        b_imag: &mut [f32],
        opening_stage: impl FnOnce(&TwiddleTable, Stage, &mut [f32], &mut [f32]),
    ) {
        let table = &*self.table;
        let size = table.size();
        let mut stage = Stage::first(table.half_size());

        let mut buffers = PingPong::open(b_real, b_imag, &mut self.scratch, table.order(), |re, im| {
            opening_stage(table, stage, re, im)
        });
        stage = stage.next();

        while stage.number_of_groups < size {
            buffers.advance(move |ar, ai, br, bi| radix2_stage(table, stage, direction, ar, ai, br, bi));
            stage = stage.next();
        }
        buffers.finish();
    }

    fn check_len(&self, name: &str, len: usize) {
        assert_eq!(
            len,
            self.size(),
            "{name} must hold exactly {} samples for an order-{} transform",
            self.size(),
            self.order()
        );
    }

    fn check_output(&self, real: &[f32], imag: &[f32]) {
        self.check_len("real output", real.len());
        self.check_len("imaginary output", imag.len());
    }
}
