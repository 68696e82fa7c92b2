//! Projections onto the sets appearing in contact problems.
//!
//! All functions operate on a single contact block laid out as the normal component followed
//! by one (2D) or two (3D) tangential components.

/// Where a point was found relative to the Coulomb cone before projection.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConeRegion {
    /// The point was in the polar cone and projected to the apex.
    Polar,
    /// The point was already inside the cone.
    Inside,
    /// The point was projected onto the boundary of the cone.
    Boundary,
}

/// Projects `r` onto the Coulomb cone `{ ‖r_T‖ ≤ μ r_N }` in place.
pub fn project_on_cone(r: &mut [f64], mu: f64) -> ConeRegion {
    let norm_t = tangent_norm(r);
    if mu * norm_t <= -r[0] {
        r.iter_mut().for_each(|x| *x = 0.0);
        ConeRegion::Polar
    } else if norm_t <= mu * r[0] {
        ConeRegion::Inside
    } else {
        let normal = (mu * norm_t + r[0]) / (mu * mu + 1.0);
        let scale = mu * normal / norm_t;
        r[0] = normal;
        r[1..].iter_mut().for_each(|x| *x *= scale);
        ConeRegion::Boundary
    }
}

/// Projects `r` onto the cylinder `{ r_N ≥ 0, ‖r_T‖ ≤ s }` in place.
pub fn project_on_cylinder(r: &mut [f64], s: f64) {
    r[0] = r[0].max(0.0);
    let norm_t = tangent_norm(r);
    if norm_t > s {
        let scale = s.max(0.0) / norm_t;
        r[1..].iter_mut().for_each(|x| *x *= scale);
    }
}

/// Euclidean norm of the tangential components.
#[inline]
pub fn tangent_norm(v: &[f64]) -> f64 {
    v[1..].iter().map(|x| x * x).sum::<f64>().sqrt()
}
