//! Built-in arrow model.
//!
//! The arrow points along model -Y, which the orientation rotation maps onto
//! the gravity direction. Extents are sized for the default model placement
//! (scale 3, one unit in front of the camera).

use std::f32::consts::TAU;

use super::mesh::{GeometryError, StripMesh, StripMeshBuilder};

const SEGMENTS: u16 = 24;

const SHAFT_RADIUS: f32 = 0.012;
const SHAFT_TOP: f32 = 0.06;
const SHAFT_BOTTOM: f32 = -0.02;

const HEAD_RADIUS: f32 = 0.03;
const HEAD_BASE: f32 = -0.02;
const HEAD_TIP: f32 = -0.07;

/// Builds the arrow as four strips: shaft wall, shaft cap, head cone, head base.
pub fn gravity_arrow() -> Result<StripMesh, GeometryError> {
    let mut b = StripMeshBuilder::default();

    shaft_wall(&mut b);
    disk(&mut b, SHAFT_TOP, SHAFT_RADIUS, 1.0);
    cone(&mut b);
    disk(&mut b, HEAD_BASE, HEAD_RADIUS, -1.0);

    b.build()
}

fn ring(i: u16) -> (f32, f32) {
    let a = TAU * (i % SEGMENTS) as f32 / SEGMENTS as f32;
    (a.cos(), a.sin())
}

fn shaft_wall(b: &mut StripMeshBuilder) {
    let mut strip = Vec::with_capacity(2 * (SEGMENTS as usize + 1));
    for i in 0..SEGMENTS {
        let (c, s) = ring(i);
        let normal = [c, 0.0, s];
        let top = b.vertex([SHAFT_RADIUS * c, SHAFT_TOP, SHAFT_RADIUS * s], normal);
        let bottom = b.vertex([SHAFT_RADIUS * c, SHAFT_BOTTOM, SHAFT_RADIUS * s], normal);
        strip.push(top);
        strip.push(bottom);
    }
    // Close the tube on the first pair.
    strip.push(strip[0]);
    strip.push(strip[1]);
    b.strip(&strip);
}

fn cone(b: &mut StripMeshBuilder) {
    let height = HEAD_BASE - HEAD_TIP;
    let slant = (height * height + HEAD_RADIUS * HEAD_RADIUS).sqrt();
    let (ny, nr) = (-HEAD_RADIUS / slant, height / slant);

    let mut strip = Vec::with_capacity(2 * (SEGMENTS as usize + 1));
    for i in 0..SEGMENTS {
        let (c, s) = ring(i);
        let normal = [nr * c, ny, nr * s];
        let base = b.vertex([HEAD_RADIUS * c, HEAD_BASE, HEAD_RADIUS * s], normal);
        let tip = b.vertex([0.0, HEAD_TIP, 0.0], normal);
        strip.push(base);
        strip.push(tip);
    }
    strip.push(strip[0]);
    strip.push(strip[1]);
    b.strip(&strip);
}

/// Flat disk as one strip zig-zagging between both ends of the ring.
fn disk(b: &mut StripMeshBuilder, y: f32, radius: f32, facing: f32) {
    let rim: Vec<u16> = (0..SEGMENTS)
        .map(|i| {
            let (c, s) = ring(i);
            b.vertex([radius * c, y, radius * s], [0.0, facing, 0.0])
        })
        .collect();

    let mut strip = Vec::with_capacity(rim.len());
    let (mut lo, mut hi) = (0usize, rim.len() - 1);
    while lo <= hi {
        strip.push(rim[lo]);
        if lo != hi {
            strip.push(rim[hi]);
        }
        lo += 1;
        hi -= 1;
    }
    b.strip(&strip);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrow_builds_four_strips() {
        let mesh = gravity_arrow().unwrap();
        assert_eq!(mesh.strip_count(), 4);
        // Two rings each for shaft wall and cone, one each for the disks.
        assert_eq!(mesh.vertex_count(), 6 * SEGMENTS as usize);
    }

    #[test]
    fn disk_strip_visits_every_ring_vertex_once() {
        let mesh = gravity_arrow().unwrap();
        let cap: Vec<u16> = mesh.strips().nth(1).unwrap().to_vec();
        assert_eq!(cap.len(), SEGMENTS as usize);

        let mut sorted = cap.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), SEGMENTS as usize);
    }

    #[test]
    fn normals_are_unit_length() {
        let mesh = gravity_arrow().unwrap();
        for n in mesh.normals() {
            let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
            assert!((len - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn tip_is_the_lowest_point() {
        let mesh = gravity_arrow().unwrap();
        let min_y = mesh
            .positions()
            .iter()
            .map(|p| p[1])
            .fold(f32::INFINITY, f32::min);
        assert_eq!(min_y, HEAD_TIP);
    }
}
