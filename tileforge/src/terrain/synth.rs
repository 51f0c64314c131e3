//! Deterministic terrain heightfield synthesis.
//!
//! Heights come from layered value noise sampled in world space, so samples
//! on the shared edge of two neighbouring chunks are identical. The output
//! depends only on the seed and the chunk coordinates.

use rayon::prelude::*;

/// World-space edge length of one chunk, in metres.
pub const CHUNK_WORLD_SIZE: f64 = 256.0;

/// Noise octaves summed per sample.
const OCTAVES: u32 = 5;

/// Wavelength of the lowest octave, in metres.
const BASE_WAVELENGTH: f64 = 2048.0;

/// Peak amplitude of the lowest octave, in metres.
const BASE_AMPLITUDE: f64 = 600.0;

/// Layered value-noise terrain generator.
#[derive(Debug, Clone, Copy)]
pub struct TerrainSynthesizer {
    seed: u64,
}

impl TerrainSynthesizer {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generates the `(resolution + 1)²` row-major samples of a chunk.
    ///
    /// Rows are computed in parallel on the rayon pool.
    pub fn heightfield(&self, x: i32, z: i32, resolution: u16) -> Vec<f32> {
        let side = resolution as usize + 1;
        let step = if resolution == 0 {
            0.0
        } else {
            CHUNK_WORLD_SIZE / resolution as f64
        };
        let origin_x = x as f64 * CHUNK_WORLD_SIZE;
        let origin_z = z as f64 * CHUNK_WORLD_SIZE;

        let mut heights = vec![0.0f32; side * side];
        heights
            .par_chunks_mut(side)
            .enumerate()
            .for_each(|(row, samples)| {
                let wz = origin_z + row as f64 * step;
                for (col, sample) in samples.iter_mut().enumerate() {
                    let wx = origin_x + col as f64 * step;
                    *sample = self.height_at(wx, wz) as f32;
                }
            });
        heights
    }

    /// Height at a world-space position.
    pub fn height_at(&self, wx: f64, wz: f64) -> f64 {
        let mut total = 0.0;
        let mut wavelength = BASE_WAVELENGTH;
        let mut amplitude = BASE_AMPLITUDE;
        for octave in 0..OCTAVES {
            total += amplitude * self.value_noise(wx / wavelength, wz / wavelength, octave);
            wavelength /= 2.0;
            amplitude /= 2.0;
        }
        total
    }

    fn value_noise(&self, x: f64, z: f64, octave: u32) -> f64 {
        let x0 = x.floor();
        let z0 = z.floor();
        let tx = smoothstep(x - x0);
        let tz = smoothstep(z - z0);
        let (ix, iz) = (x0 as i64, z0 as i64);

        let a = self.lattice(ix, iz, octave);
        let b = self.lattice(ix + 1, iz, octave);
        let c = self.lattice(ix, iz + 1, octave);
        let d = self.lattice(ix + 1, iz + 1, octave);

        let top = a + (b - a) * tx;
        let bottom = c + (d - c) * tx;
        top + (bottom - top) * tz
    }

    /// Pseudo-random lattice value in `[-1, 1]`.
    fn lattice(&self, ix: i64, iz: i64, octave: u32) -> f64 {
        let mut h = self.seed ^ (octave as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        h ^= (ix as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        h = h.rotate_left(31);
        h ^= (iz as u64).wrapping_mul(0x94D0_49BB_1331_11EB);
        // splitmix64 finalizer
        h = (h ^ (h >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        h = (h ^ (h >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        h ^= h >> 31;
        (h >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0
    }
}

impl Default for TerrainSynthesizer {
    fn default() -> Self {
        Self::new(0x7E44_A1F0)
    }
}

fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}
