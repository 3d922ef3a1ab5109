//! Dense 4-D spectral cube: `[Z][Y][X][R]` of f32 in row-major order,
//! backed by a flat buffer. `R` is the concatenated spectral axis of all
//! detectors.

use crate::error::SmdError;

#[derive(Debug, Clone, PartialEq)]
pub struct Cube {
    shape: [usize; 4],
    data: Vec<f32>,
}

impl Cube {
    /// Wrap row-major values. The value count must match the shape.
    pub fn from_vec(shape: [usize; 4], data: Vec<f32>) -> Result<Self, SmdError> {
        let expected = shape.iter().product::<usize>();
        if data.len() != expected {
            return Err(SmdError::CorruptData {
                expected: expected * 4,
                got: data.len() * 4,
            });
        }
        Ok(Self { shape, data })
    }

    /// Reinterpret a little-endian byte payload as a cube of the given shape.
    pub fn from_le_bytes(shape: [usize; 4], bytes: &[u8]) -> Result<Self, SmdError> {
        let expected = shape.iter().product::<usize>();
        if bytes.len() != expected * 4 {
            return Err(SmdError::CorruptData {
                expected: expected * 4,
                got: bytes.len(),
            });
        }
        let data = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self { shape, data })
    }

    /// Serialize back to little-endian bytes in row-major order. For an
    /// unmodified cube this reproduces the original payload byte-for-byte.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.data.len() * 4);
        for &val in &self.data {
            buf.extend_from_slice(&val.to_le_bytes());
        }
        buf
    }

    pub fn shape(&self) -> [usize; 4] {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat row-major values.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_parts(self) -> ([usize; 4], Vec<f32>) {
        (self.shape, self.data)
    }

    fn index(&self, i0: usize, i1: usize, i2: usize, i3: usize) -> usize {
        let [_, n1, n2, n3] = self.shape;
        ((i0 * n1 + i1) * n2 + i2) * n3 + i3
    }

    pub fn get(&self, i0: usize, i1: usize, i2: usize, i3: usize) -> f32 {
        self.data[self.index(i0, i1, i2, i3)]
    }

    /// Copy out `[.., .., .., start..start+len]` along the spectral axis.
    pub fn slice_last(&self, start: usize, len: usize) -> Cube {
        let [n0, n1, n2, n3] = self.shape;
        debug_assert!(start + len <= n3);

        let mut data = Vec::with_capacity(n0 * n1 * n2 * len);
        for row in self.data.chunks_exact(n3) {
            data.extend_from_slice(&row[start..start + len]);
        }
        Cube {
            shape: [n0, n1, n2, len],
            data,
        }
    }

    /// Reverse the three spatial dimensions: `(Z, Y, X, R)` becomes
    /// `(X, Y, Z, R)`, with `out[x][y][z][r] == self[z][y][x][r]`. The
    /// spectral axis stays last.
    pub fn transpose_spatial(&self) -> Cube {
        let [nz, ny, nx, nr] = self.shape;
        let mut out = Cube {
            shape: [nx, ny, nz, nr],
            data: vec![0.0; self.data.len()],
        };
        for z in 0..nz {
            for y in 0..ny {
                for x in 0..nx {
                    let src = self.index(z, y, x, 0);
                    let dst = out.index(x, y, z, 0);
                    out.data[dst..dst + nr].copy_from_slice(&self.data[src..src + nr]);
                }
            }
        }
        out
    }
}
