//! Spatial sampling for the two element configurations.
//!
//! The scattered configuration draws points uniformly by volume from a sphere;
//! the formed configuration either fills a cone volume (foliage) or walks a
//! spiral on the cone surface (ornaments). All functions are generic over the
//! random source so construction can use `thread_rng()` while tests pass a
//! seeded `StdRng`.

use std::f32::consts::{PI, TAU};

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Uniform-by-volume point inside a sphere of `radius` centered at the origin.
///
/// The radius is scaled by the cube root of a uniform value; scaling it
/// linearly would pile points up near the center.
pub fn sample_sphere_volume<R: Rng + ?Sized>(rng: &mut R, radius: f32) -> Vec3 {
    let phi = rng.gen::<f32>() * TAU;
    let cos_theta = rng.gen::<f32>() * 2.0 - 1.0;
    let u = rng.gen::<f32>();

    let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
    let r = radius * u.cbrt();

    Vec3::new(
        r * sin_theta * phi.cos(),
        r * sin_theta * phi.sin(),
        r * cos_theta,
    )
}

/// Point inside a cone standing on the XZ plane, apex up.
///
/// Height is uniform over `[-height/2, height/2]`. The disk radius at a given
/// height shrinks linearly from `base_radius` at the bottom to zero at the top,
/// and the radial coordinate uses `sqrt(u)` so each cross-section is filled
/// with uniform area density.
pub fn sample_cone_volume<R: Rng + ?Sized>(rng: &mut R, height: f32, base_radius: f32) -> Vec3 {
    let y_norm = rng.gen::<f32>();
    let y = y_norm * height - height * 0.5;

    let max_radius = cone_radius_at(base_radius, y_norm);
    let r = rng.gen::<f32>().sqrt() * max_radius;
    let angle = rng.gen::<f32>() * TAU;

    Vec3::new(angle.cos() * r, y, angle.sin() * r)
}

/// Cone radius at normalized height `y_norm` (0 = base, 1 = apex).
pub fn cone_radius_at(base_radius: f32, y_norm: f32) -> f32 {
    base_radius * (1.0 - y_norm.clamp(0.0, 1.0))
}

/// Linear radius profile of a cone surface: `base_radius` at `base_y`,
/// reaching zero `span` units higher.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConeProfile {
    pub base_radius: f32,
    pub base_y: f32,
    pub span: f32,
}

impl ConeProfile {
    /// Surface radius at world height `y`. Not clamped: heights above the apex
    /// produce negative radii, which mirror the point through the axis exactly
    /// as the original placement curve does.
    pub fn radius_at(&self, y: f32) -> f32 {
        self.base_radius * (1.0 - (y - self.base_y) / self.span)
    }
}

/// A spiral ascending a cone surface.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpiralPath {
    /// Full revolutions between the first and the last element.
    pub turns: f32,
    /// Angular offset in radians.
    pub phase: f32,
    /// World height of the element at `t = 0`.
    pub y_start: f32,
    /// World height reached at `t = 1`.
    pub y_end: f32,
}

/// Place element `index` of `total_count` at `t = index / total_count` along
/// the spiral. Deterministic: no randomness, even angular spacing.
///
/// `total_count` must be non-zero; layer construction rejects empty spirals
/// before this is ever called.
pub fn sample_spiral_on_cone(
    index: usize,
    total_count: usize,
    path: &SpiralPath,
    profile: &ConeProfile,
) -> Vec3 {
    debug_assert!(total_count > 0, "spiral placement needs at least one element");

    let t = index as f32 / total_count as f32;
    let angle = t * path.turns * TAU + path.phase;
    let y = path.y_start + t * (path.y_end - path.y_start);
    let r = profile.radius_at(y);

    Vec3::new(angle.cos() * r, y, angle.sin() * r)
}

/// Random Euler seed `(rand·π, rand·π, 0)` used for ornament base rotation.
pub fn sample_rotation_seed<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    Vec3::new(rng.gen::<f32>() * PI, rng.gen::<f32>() * PI, 0.0)
}

/// Uniform point in an axis-aligned cube of edge `size` centered at the origin.
pub fn sample_cube_volume<R: Rng + ?Sized>(rng: &mut R, size: f32) -> Vec3 {
    Vec3::new(
        (rng.gen::<f32>() - 0.5) * size,
        (rng.gen::<f32>() - 0.5) * size,
        (rng.gen::<f32>() - 0.5) * size,
    )
}
