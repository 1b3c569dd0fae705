//! Parametric curve evaluation.

use std::f32::consts::TAU;

use skyraid_core::{
    project, CoordinateSpace, CurveDefinition, CurveKind, Projector, SineAxis, Vec2,
};

/// Evaluates the position along `curve` at progress `t`.
///
/// `t` is clamped to `[0, 1]`. Normalized-screen points are converted through
/// `projector`; without one they are used as world points. Bezier curves with
/// the wrong number of control points evaluate to the origin, as do linear
/// curves without points and sine curves with fewer than two points.
#[must_use]
pub fn evaluate(
    curve: &CurveDefinition,
    t: f32,
    projector: Option<&dyn Projector>,
    depth: f32,
) -> Vec2 {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let resolver = Resolver {
        space: curve.space,
        projector,
        depth,
    };

    match curve.kind {
        CurveKind::Linear => linear(curve, t, &resolver),
        CurveKind::QuadraticBezier => match curve.points.as_slice() {
            [p0, p1, p2] => quadratic_bezier(
                resolver.point(p0.position),
                resolver.point(p1.position),
                resolver.point(p2.position),
                t,
            ),
            _ => Vec2::ZERO,
        },
        CurveKind::CubicBezier => match curve.points.as_slice() {
            [p0, p1, p2, p3] => cubic_bezier(
                resolver.point(p0.position),
                resolver.point(p1.position),
                resolver.point(p2.position),
                resolver.point(p3.position),
                t,
            ),
            _ => Vec2::ZERO,
        },
        CurveKind::Circle => circle(curve, t, &resolver),
        CurveKind::Sine => sine(curve, t, &resolver),
    }
}

/// Progress at which a control point is considered reached.
///
/// Uses an even split of progress across control points, which approximates
/// arc length only for linear curves with equal segments.
#[must_use]
pub fn estimated_progress_at(curve: &CurveDefinition, index: usize) -> f32 {
    let count = curve.points.len();
    if count <= 1 {
        return 1.0;
    }
    (index as f32 / (count - 1) as f32).clamp(0.0, 1.0)
}

struct Resolver<'a> {
    space: CoordinateSpace,
    projector: Option<&'a dyn Projector>,
    depth: f32,
}

impl Resolver<'_> {
    fn point(&self, point: Vec2) -> Vec2 {
        match self.space {
            CoordinateSpace::World => point,
            CoordinateSpace::NormalizedScreen => project(self.projector, point, self.depth),
        }
    }

    /// Converts a screen-fraction length measured from `anchor` into world units.
    fn length(&self, anchor: Vec2, length: f32) -> f32 {
        match self.space {
            CoordinateSpace::World => length,
            CoordinateSpace::NormalizedScreen => {
                let from = self.point(anchor);
                let to = self.point(anchor + Vec2::new(length, 0.0));
                from.distance(to)
            }
        }
    }
}

fn linear(curve: &CurveDefinition, t: f32, resolver: &Resolver<'_>) -> Vec2 {
    let points = &curve.points;
    match points.len() {
        0 => Vec2::ZERO,
        1 => resolver.point(points[0].position),
        count => {
            let segments = count - 1;
            let scaled = t * segments as f32;
            let index = (scaled.floor() as usize).min(segments - 1);
            let local = scaled - index as f32;
            let from = resolver.point(points[index].position);
            let to = resolver.point(points[index + 1].position);
            from.lerp(to, local)
        }
    }
}

fn quadratic_bezier(p0: Vec2, p1: Vec2, p2: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
}

fn cubic_bezier(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
}

fn circle(curve: &CurveDefinition, t: f32, resolver: &Resolver<'_>) -> Vec2 {
    let arc = &curve.circle;
    let center = resolver.point(arc.center);
    let radius = resolver.length(arc.center, arc.radius);
    let angle = (arc.start_angle_deg + (arc.end_angle_deg - arc.start_angle_deg) * t).to_radians();
    center + Vec2::new(angle.cos(), angle.sin()) * radius
}

fn sine(curve: &CurveDefinition, t: f32, resolver: &Resolver<'_>) -> Vec2 {
    let (Some(first), Some(last)) = (curve.points.first(), curve.points.last()) else {
        return Vec2::ZERO;
    };
    if curve.points.len() < 2 {
        return Vec2::ZERO;
    }

    let base = resolver
        .point(first.position)
        .lerp(resolver.point(last.position), t);
    let amplitude = resolver.length(Vec2::new(0.0, 0.5), curve.sine.amplitude);
    let offset = (t * curve.sine.frequency * TAU).sin() * amplitude;
    match curve.sine.axis {
        SineAxis::X => base + Vec2::new(offset, 0.0),
        SineAxis::Y => base + Vec2::new(0.0, offset),
    }
}
