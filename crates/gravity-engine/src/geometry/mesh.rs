use std::ops::Range;

use thiserror::Error;

/// Errors raised while decoding strip geometry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("mesh has {positions} positions but {normals} normals")]
    AttributeMismatch { positions: usize, normals: usize },

    #[error("mesh has {0} vertices; at most 65535 fit 16-bit strip indices")]
    TooManyVertices(usize),

    #[error("strip at offset {offset} declares {declared} indices but only {available} remain")]
    TruncatedStrip {
        offset: usize,
        declared: usize,
        available: usize,
    },

    #[error("strip at offset {offset} has {len} indices; a triangle strip needs at least 3")]
    DegenerateStrip { offset: usize, len: usize },

    #[error("index {index} at offset {offset} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        offset: usize,
        index: u16,
        vertex_count: usize,
    },

    #[error("mesh has no strips")]
    Empty,
}

/// Static indexed geometry drawn as a sequence of triangle strips.
///
/// All strips share one index buffer; `strips()` yields the index range of
/// each one so a renderer can issue one draw call per strip.
#[derive(Debug, Clone, PartialEq)]
pub struct StripMesh {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    indices: Vec<u16>,
    strips: Vec<Range<u32>>,
}

impl StripMesh {
    /// Decodes run-length-encoded strips.
    ///
    /// `rle` is a sequence of runs `[count, i0, i1, .., i(count - 1)]`. A `0`
    /// count ends the list early; trailing data after it is ignored.
    pub fn from_rle(
        positions: Vec<[f32; 3]>,
        normals: Vec<[f32; 3]>,
        rle: &[u16],
    ) -> Result<Self, GeometryError> {
        check_attributes(&positions, &normals)?;

        let vertex_count = positions.len();
        let mut indices = Vec::with_capacity(rle.len());
        let mut strips = Vec::new();

        let mut offset = 0;
        while offset < rle.len() {
            let declared = rle[offset] as usize;
            if declared == 0 {
                break;
            }

            let body = offset + 1;
            let available = rle.len() - body;
            if declared > available {
                return Err(GeometryError::TruncatedStrip {
                    offset,
                    declared,
                    available,
                });
            }
            if declared < 3 {
                return Err(GeometryError::DegenerateStrip { offset, len: declared });
            }

            let start = indices.len() as u32;
            for (i, &index) in rle[body..body + declared].iter().enumerate() {
                if index as usize >= vertex_count {
                    return Err(GeometryError::IndexOutOfRange {
                        offset: body + i,
                        index,
                        vertex_count,
                    });
                }
                indices.push(index);
            }
            strips.push(start..indices.len() as u32);

            offset = body + declared;
        }

        if strips.is_empty() {
            return Err(GeometryError::Empty);
        }

        Ok(Self {
            positions,
            normals,
            indices,
            strips,
        })
    }

    /// Encodes the strips back into the run-length format, without terminator.
    pub fn to_rle(&self) -> Vec<u16> {
        let mut out = Vec::with_capacity(self.indices.len() + self.strips.len());
        for strip in self.strips() {
            out.push(strip.len() as u16);
            out.extend_from_slice(strip);
        }
        out
    }

    #[inline]
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    #[inline]
    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    /// Concatenated indices of every strip.
    #[inline]
    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    /// Index ranges into `indices()`, one per strip.
    #[inline]
    pub fn strip_ranges(&self) -> &[Range<u32>] {
        &self.strips
    }

    /// Iterates the index list of each strip.
    pub fn strips(&self) -> impl Iterator<Item = &[u16]> + '_ {
        self.strips
            .iter()
            .map(|r| &self.indices[r.start as usize..r.end as usize])
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn strip_count(&self) -> usize {
        self.strips.len()
    }
}

/// Incremental builder used by procedural models.
#[derive(Debug, Default)]
pub(crate) struct StripMeshBuilder {
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    rle: Vec<u16>,
}

impl StripMeshBuilder {
    /// Adds a vertex and returns its index.
    pub(crate) fn vertex(&mut self, position: [f32; 3], normal: [f32; 3]) -> u16 {
        self.positions.push(position);
        self.normals.push(normal);
        (self.positions.len() - 1) as u16
    }

    pub(crate) fn strip(&mut self, indices: &[u16]) {
        self.rle.push(indices.len() as u16);
        self.rle.extend_from_slice(indices);
    }

    pub(crate) fn build(self) -> Result<StripMesh, GeometryError> {
        StripMesh::from_rle(self.positions, self.normals, &self.rle)
    }
}

fn check_attributes(positions: &[[f32; 3]], normals: &[[f32; 3]]) -> Result<(), GeometryError> {
    if positions.len() != normals.len() {
        return Err(GeometryError::AttributeMismatch {
            positions: positions.len(),
            normals: normals.len(),
        });
    }
    // 0xFFFF restarts a Uint16 strip, so the last usable index is 0xFFFE.
    if positions.len() > u16::MAX as usize {
        return Err(GeometryError::TooManyVertices(positions.len()));
    }
    Ok(())
}
