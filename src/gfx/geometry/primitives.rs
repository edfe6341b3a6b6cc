//! # Primitive Shape Generation
//!
//! This module contains functions to generate the primitive shapes used by
//! the scene. All shapes are generated with proper outward-facing normals.

use super::GeometryData;
use std::f32::consts::PI;

/// Generate an axis-aligned box centered at the origin
///
/// # Arguments
/// * `width` - Extent along X
/// * `height` - Extent along Y
/// * `depth` - Extent along Z
///
/// Each face has normals pointing outward.
pub fn generate_box(width: f32, height: f32, depth: f32) -> GeometryData {
    let mut data = GeometryData::new();

    let hw = width * 0.5;
    let hh = height * 0.5;
    let hd = depth * 0.5;

    let positions = [
        // Front face
        [-hw, -hh,  hd], [ hw, -hh,  hd], [ hw,  hh,  hd], [-hw,  hh,  hd],
        // Back face
        [-hw, -hh, -hd], [-hw,  hh, -hd], [ hw,  hh, -hd], [ hw, -hh, -hd],
        // Left face
        [-hw, -hh, -hd], [-hw, -hh,  hd], [-hw,  hh,  hd], [-hw,  hh, -hd],
        // Right face
        [ hw, -hh,  hd], [ hw, -hh, -hd], [ hw,  hh, -hd], [ hw,  hh,  hd],
        // Top face
        [-hw,  hh,  hd], [ hw,  hh,  hd], [ hw,  hh, -hd], [-hw,  hh, -hd],
        // Bottom face
        [-hw, -hh, -hd], [ hw, -hh, -hd], [ hw, -hh,  hd], [-hw, -hh,  hd],
    ];

    let normals = [
        [0.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0], [0.0, 0.0, -1.0], [0.0, 0.0, -1.0], [0.0, 0.0, -1.0],
        [-1.0, 0.0, 0.0], [-1.0, 0.0, 0.0], [-1.0, 0.0, 0.0], [-1.0, 0.0, 0.0],
        [1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0], [0.0, 1.0, 0.0], [0.0, 1.0, 0.0], [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0], [0.0, -1.0, 0.0], [0.0, -1.0, 0.0], [0.0, -1.0, 0.0],
    ];

    data.vertices = positions.to_vec();
    data.normals = normals.to_vec();

    // Two triangles per face, counter-clockwise
    data.indices = vec![
        0, 1, 2,    2, 3, 0,
        4, 5, 6,    6, 7, 4,
        8, 9, 10,   10, 11, 8,
        12, 13, 14, 14, 15, 12,
        16, 17, 18, 18, 19, 16,
        20, 21, 22, 22, 23, 20,
    ];

    data
}

/// Generate a cone frustum centered at the origin, axis along Y
///
/// # Arguments
/// * `radius_top` - Radius at +height/2
/// * `radius_bottom` - Radius at -height/2 (zero for a sharp apex)
/// * `height` - Extent along Y
/// * `segments` - Number of circular segments
///
/// With `radius_bottom = 0` this is the downward-pointing flame cone used
/// by the rocket thruster.
pub fn generate_cone(radius_top: f32, radius_bottom: f32, height: f32, segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let segs = segments.max(3);
    let half_height = height * 0.5;

    // Slope of the side in the (radial, vertical) plane, for normals
    let slope = (radius_top - radius_bottom) / height;
    let normal_len = (1.0 + slope * slope).sqrt();

    // Side vertices, bottom and top ring interleaved
    for i in 0..=segs {
        let angle = i as f32 * 2.0 * PI / segs as f32;
        let cos_a = angle.cos();
        let sin_a = angle.sin();

        let normal = [cos_a / normal_len, slope / normal_len, sin_a / normal_len];

        data.vertices
            .push([radius_bottom * cos_a, -half_height, radius_bottom * sin_a]);
        data.normals.push(normal);

        data.vertices
            .push([radius_top * cos_a, half_height, radius_top * sin_a]);
        data.normals.push(normal);
    }

    // Side faces
    for i in 0..segs {
        let bottom_current = i * 2;
        let top_current = bottom_current + 1;
        let bottom_next = (i + 1) * 2;
        let top_next = bottom_next + 1;

        data.indices.push(bottom_current);
        data.indices.push(top_current);
        data.indices.push(bottom_next);

        data.indices.push(top_current);
        data.indices.push(top_next);
        data.indices.push(bottom_next);
    }

    // Caps (skipped for degenerate zero-radius ends)
    if radius_top > 0.0 {
        let center_top_idx = data.vertices.len() as u32;
        data.vertices.push([0.0, half_height, 0.0]);
        data.normals.push([0.0, 1.0, 0.0]);

        for i in 0..segs {
            let current = i * 2 + 1;
            let next = (i + 1) * 2 + 1;

            data.indices.push(center_top_idx);
            data.indices.push(current);
            data.indices.push(next);
        }
    }

    if radius_bottom > 0.0 {
        let center_bottom_idx = data.vertices.len() as u32;
        data.vertices.push([0.0, -half_height, 0.0]);
        data.normals.push([0.0, -1.0, 0.0]);

        for i in 0..segs {
            let current = i * 2;
            let next = (i + 1) * 2;

            data.indices.push(center_bottom_idx);
            data.indices.push(next);
            data.indices.push(current);
        }
    }

    data
}

/// Generate a ground plane in the XZ plane with the normal pointing up (+Y)
///
/// # Arguments
/// * `width` - Extent along X
/// * `depth` - Extent along Z
/// * `width_segments` - Number of subdivisions along width
/// * `depth_segments` - Number of subdivisions along depth
///
/// Returns a plane centered at the origin at y = 0.
pub fn generate_plane(width: f32, depth: f32, width_segments: u32, depth_segments: u32) -> GeometryData {
    let mut data = GeometryData::new();

    let w_segs = width_segments.max(1);
    let d_segs = depth_segments.max(1);

    for z in 0..=d_segs {
        let v = z as f32 / d_segs as f32;
        let pos_z = (v - 0.5) * depth;

        for x in 0..=w_segs {
            let u = x as f32 / w_segs as f32;
            let pos_x = (u - 0.5) * width;

            data.vertices.push([pos_x, 0.0, pos_z]);
            data.normals.push([0.0, 1.0, 0.0]);
        }
    }

    // Counter-clockwise winding when viewed from above
    for z in 0..d_segs {
        for x in 0..w_segs {
            let i = z * (w_segs + 1) + x;
            let next_row = i + w_segs + 1;

            data.indices.push(i);
            data.indices.push(i + 1);
            data.indices.push(next_row);

            data.indices.push(next_row);
            data.indices.push(i + 1);
            data.indices.push(next_row + 1);
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_generation() {
        let platform = generate_box(2.5, 10.0, 2.5);
        assert_eq!(platform.vertices.len(), 24); // 6 faces * 4 vertices
        assert_eq!(platform.indices.len(), 36); // 6 faces * 2 triangles * 3 indices
        assert_eq!(platform.triangle_count(), 12);

        let aabb = platform.bounding_box().unwrap();
        assert_eq!(aabb.height(), 10.0);
        assert_eq!(aabb.min, [-1.25, -5.0, -1.25]);
        assert_eq!(aabb.max, [1.25, 5.0, 1.25]);
    }

    #[test]
    fn test_cone_generation() {
        let flame = generate_cone(0.5, 0.0, 5.0, 24);
        assert!(flame.vertices.len() > 0);
        assert_eq!(flame.vertices.len(), flame.normals.len());
        // Sharp apex at the bottom: no bottom cap
        assert_eq!(flame.vertices.len() as u32, (24 + 1) * 2 + 1);

        let aabb = flame.bounding_box().unwrap();
        assert_eq!(aabb.height(), 5.0);
    }

    #[test]
    fn test_plane_generation() {
        let ground = generate_plane(100.0, 100.0, 2, 2);
        assert_eq!(ground.vertices.len(), 9); // 3x3 grid
        assert_eq!(ground.indices.len(), 24); // 4 quads * 2 triangles * 3 indices
        assert!(ground.normals.iter().all(|n| *n == [0.0, 1.0, 0.0]));
    }

    #[test]
    fn test_geometry_translate_rebases_bounds() {
        let mut flame = generate_cone(0.5, 0.0, 5.0, 12);
        flame.translate(0.0, -2.5, 0.0);
        let aabb = flame.bounding_box().unwrap();
        assert_eq!(aabb.max[1], 0.0);
        assert_eq!(aabb.min[1], -5.0);
    }
}
