use skyraid_core::{
    CircleArc, CurveDefinition, CurveKind, FormationDefinition, FormationLayout, SineAxis,
    SineWave, Vec2,
};
use skyraid_system_paths::{curve, formation};

fn assert_close(actual: Vec2, expected: Vec2) {
    assert!(
        (actual - expected).length() < 1e-4,
        "expected {expected:?}, got {actual:?}"
    );
}

fn sample_curves() -> Vec<(CurveDefinition, Vec2, Vec2)> {
    let points = [
        Vec2::new(-1.0, 4.0),
        Vec2::new(2.0, 3.0),
        Vec2::new(0.5, -1.0),
        Vec2::new(3.0, -2.0),
    ];
    vec![
        (
            CurveDefinition::through(CurveKind::Linear, points, 2.0),
            points[0],
            points[3],
        ),
        (
            CurveDefinition::through(CurveKind::QuadraticBezier, points[..3].to_vec(), 2.0),
            points[0],
            points[2],
        ),
        (
            CurveDefinition::through(CurveKind::CubicBezier, points, 2.0),
            points[0],
            points[3],
        ),
        (
            CurveDefinition::arc(
                CircleArc {
                    center: Vec2::new(1.0, 1.0),
                    radius: 2.0,
                    start_angle_deg: 180.0,
                    end_angle_deg: 360.0,
                },
                2.0,
            ),
            Vec2::new(-1.0, 1.0),
            Vec2::new(3.0, 1.0),
        ),
        (
            CurveDefinition::through(CurveKind::Sine, [points[0], points[3]], 2.0).with_sine(
                SineWave {
                    amplitude: 0.5,
                    frequency: 3.0,
                    axis: SineAxis::Y,
                },
            ),
            points[0],
            points[3],
        ),
    ]
}

#[test]
fn every_curve_starts_and_ends_at_its_endpoints() {
    for (curve, start, end) in sample_curves() {
        assert!(curve.validate().is_ok(), "{:?} should be valid", curve.kind);
        assert_close(curve::evaluate(&curve, 0.0, None, 0.0), start);
        assert_close(curve::evaluate(&curve, 1.0, None, 0.0), end);
    }
}

#[test]
fn linear_polyline_interpolates_within_segments() {
    let curve = CurveDefinition::through(
        CurveKind::Linear,
        [Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(2.0, 0.0)],
        1.0,
    );
    assert_close(curve::evaluate(&curve, 0.25, None, 0.0), Vec2::new(0.5, 0.5));
    assert_close(curve::evaluate(&curve, 0.75, None, 0.0), Vec2::new(1.5, 0.5));
}

#[test]
fn quadratic_bezier_midpoint() {
    let curve = CurveDefinition::through(
        CurveKind::QuadraticBezier,
        [Vec2::new(0.0, 0.0), Vec2::new(1.0, 2.0), Vec2::new(2.0, 0.0)],
        1.0,
    );
    assert_close(curve::evaluate(&curve, 0.5, None, 0.0), Vec2::new(1.0, 1.0));
}

#[test]
fn grid_offsets_anchor_columns_from_origin() {
    let (dx, dy) = (1.5, 2.0);
    let definition = FormationDefinition {
        members: 5,
        layout: FormationLayout::Grid {
            columns: 3,
            column_spacing: dx,
            row_spacing: dy,
        },
        break_behavior: Default::default(),
        individual_curves: Vec::new(),
    };

    let offsets: Vec<Vec2> = (0..5)
        .map(|index| formation::offset(&definition, index))
        .collect();
    assert_eq!(
        offsets,
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(dx, 0.0),
            Vec2::new(2.0 * dx, 0.0),
            Vec2::new(0.0, -dy),
            Vec2::new(dx, -dy),
        ]
    );
}

#[test]
fn normalized_curves_use_the_projection() {
    let projector = |point: Vec2, _depth: f32| point * 10.0;
    let curve = CurveDefinition::through(CurveKind::Linear, [Vec2::ZERO, Vec2::ONE], 1.0)
        .in_space(skyraid_core::CoordinateSpace::NormalizedScreen);

    assert_close(
        curve::evaluate(&curve, 0.5, Some(&projector), 0.0),
        Vec2::splat(5.0),
    );
    assert_close(curve::evaluate(&curve, 0.5, None, 0.0), Vec2::splat(0.5));
}
