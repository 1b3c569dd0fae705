//! Immutable configuration assets authored by designers.
//!
//! Assets are plain data validated once at load or assignment time. Runtime
//! code treats an invalid asset as "no asset" instead of failing.

use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, TemplateId, Vitality};

const DEFAULT_CURVE_DURATION: f32 = 4.0;
const DEFAULT_NODE_SPEED: f32 = 3.0;

/// Families of parametric curves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveKind {
    /// Polyline through every control point.
    Linear,
    /// Bernstein-basis curve over exactly three points.
    QuadraticBezier,
    /// Bernstein-basis curve over exactly four points.
    CubicBezier,
    /// Arc around a center between two angles.
    Circle,
    /// Straight line between the first and last point with a sinusoidal offset.
    Sine,
}

impl CurveKind {
    /// Exact number of control points required by Bezier families.
    #[must_use]
    pub const fn exact_points(self) -> Option<usize> {
        match self {
            Self::QuadraticBezier => Some(3),
            Self::CubicBezier => Some(4),
            Self::Linear | Self::Circle | Self::Sine => None,
        }
    }
}

/// Coordinate space control points are authored in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSpace {
    /// Points are world positions.
    #[default]
    World,
    /// Points are fractions of the screen, projected through the viewport.
    NormalizedScreen,
}

/// Single control point of a curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    /// Position in the curve's coordinate space.
    pub position: Vec2,
    /// Speed multiplier reserved for per-segment pacing.
    #[serde(default = "unit_multiplier")]
    pub speed_multiplier: f32,
    /// Pause duration reserved for per-point holds.
    #[serde(default)]
    pub pause: f32,
}

impl ControlPoint {
    /// Creates a control point with neutral pacing.
    #[must_use]
    pub const fn at(position: Vec2) -> Self {
        Self {
            position,
            speed_multiplier: 1.0,
            pause: 0.0,
        }
    }
}

fn unit_multiplier() -> f32 {
    1.0
}

/// Arc parameters for [`CurveKind::Circle`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CircleArc {
    /// Center of the arc.
    pub center: Vec2,
    /// Radius, a screen fraction when the curve is normalized.
    pub radius: f32,
    /// Angle at progress zero, in degrees.
    pub start_angle_deg: f32,
    /// Angle at progress one, in degrees.
    pub end_angle_deg: f32,
}

impl Default for CircleArc {
    fn default() -> Self {
        Self {
            center: Vec2::new(0.5, 1.1),
            radius: 0.2,
            start_angle_deg: 180.0,
            end_angle_deg: 360.0,
        }
    }
}

/// Axis a sine offset is applied along.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SineAxis {
    /// Oscillate horizontally.
    #[default]
    X,
    /// Oscillate vertically.
    Y,
}

/// Oscillation parameters for [`CurveKind::Sine`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SineWave {
    /// Peak offset, a screen fraction when the curve is normalized.
    pub amplitude: f32,
    /// Full oscillations over the whole progress range.
    pub frequency: f32,
    /// Axis the offset is applied along.
    #[serde(default)]
    pub axis: SineAxis,
}

impl Default for SineWave {
    fn default() -> Self {
        Self {
            amplitude: 0.1,
            frequency: 2.0,
            axis: SineAxis::X,
        }
    }
}

/// Parametric curve traversed over a fixed duration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurveDefinition {
    /// Curve family.
    pub kind: CurveKind,
    /// Space the control points and circle parameters are expressed in.
    #[serde(default)]
    pub space: CoordinateSpace,
    /// Ordered control points.
    #[serde(default)]
    pub points: Vec<ControlPoint>,
    /// Arc parameters used by circle curves.
    #[serde(default)]
    pub circle: CircleArc,
    /// Oscillation parameters used by sine curves.
    #[serde(default)]
    pub sine: SineWave,
    /// Seconds needed to traverse the whole curve.
    #[serde(default = "default_curve_duration")]
    pub duration: f32,
    /// Whether progress wraps around instead of ending.
    #[serde(default)]
    pub looping: bool,
}

fn default_curve_duration() -> f32 {
    DEFAULT_CURVE_DURATION
}

impl CurveDefinition {
    /// Creates a world-space curve through the provided points.
    #[must_use]
    pub fn through(kind: CurveKind, points: impl IntoIterator<Item = Vec2>, duration: f32) -> Self {
        Self {
            kind,
            space: CoordinateSpace::World,
            points: points.into_iter().map(ControlPoint::at).collect(),
            circle: CircleArc::default(),
            sine: SineWave::default(),
            duration,
            looping: false,
        }
    }

    /// Creates a world-space circle curve.
    #[must_use]
    pub fn arc(circle: CircleArc, duration: f32) -> Self {
        Self {
            circle,
            ..Self::through(CurveKind::Circle, std::iter::empty(), duration)
        }
    }

    /// Returns the curve with the provided coordinate space.
    #[must_use]
    pub fn in_space(mut self, space: CoordinateSpace) -> Self {
        self.space = space;
        self
    }

    /// Returns the curve with the provided loop flag.
    #[must_use]
    pub fn looped(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Returns the curve with the provided oscillation parameters.
    #[must_use]
    pub fn with_sine(mut self, sine: SineWave) -> Self {
        self.sine = sine;
        self
    }

    /// Checks the point-count and duration invariants of the curve.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(ConfigError::NonPositiveDuration(self.duration));
        }

        let found = self.points.len();
        if let Some(expected) = self.kind.exact_points() {
            if found != expected {
                return Err(ConfigError::BezierPointCount {
                    kind: self.kind,
                    expected,
                    found,
                });
            }
            return Ok(());
        }

        let minimum = match self.kind {
            CurveKind::Linear => 1,
            CurveKind::Sine => 2,
            _ => 0,
        };
        if found < minimum {
            return Err(ConfigError::TooFewPoints {
                kind: self.kind,
                minimum,
                found,
            });
        }
        Ok(())
    }
}

/// Layout families used to compute per-member offsets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormationLayout {
    /// Explicit offset per member.
    CustomOffsets {
        /// Offsets indexed by member.
        offsets: Vec<Vec2>,
    },
    /// Centered horizontal row.
    Line {
        /// Distance between neighbouring members.
        spacing: f32,
    },
    /// Rows anchored left-to-right from the origin, growing downward.
    Grid {
        /// Members per row.
        columns: u32,
        /// Horizontal distance between columns.
        column_spacing: f32,
        /// Vertical distance between rows.
        row_spacing: f32,
    },
    /// Members evenly spread on a circle.
    Circle {
        /// Circle radius.
        radius: f32,
    },
}

/// How and when formation members stop sharing the formation offset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BreakBehavior {
    /// Members never break.
    #[default]
    StayInFormation,
    /// Members break once they have been alive for the given time.
    BreakAfterTime {
        /// Alive time that triggers the break.
        seconds: f32,
    },
    /// Members break once progress reaches the estimated progress of a control point.
    BreakOnWaypointIndex {
        /// Control point index that triggers the break.
        index: usize,
    },
    /// Members break after the given alive time and switch to their individual curves.
    IndividualPathsAfterBreak {
        /// Alive time that triggers the break.
        seconds: f32,
    },
}

/// Fixed-size group of enemies sharing a layout and break behaviour.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormationDefinition {
    /// Number of members in the formation.
    pub members: u32,
    /// Layout used to compute member offsets.
    pub layout: FormationLayout,
    /// Break behaviour shared by all members.
    #[serde(default)]
    pub break_behavior: BreakBehavior,
    /// Curves members switch to after breaking, indexed by member.
    #[serde(default)]
    pub individual_curves: Vec<Arc<CurveDefinition>>,
}

impl FormationDefinition {
    /// Individual curve assigned to a member, if one was authored.
    #[must_use]
    pub fn individual_curve(&self, index: usize) -> Option<&Arc<CurveDefinition>> {
        self.individual_curves.get(index)
    }

    /// Checks member count, layout parameters and individual curves.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.members == 0 {
            return Err(ConfigError::EmptyFormation);
        }
        if let FormationLayout::Grid { columns: 0, .. } = self.layout {
            return Err(ConfigError::ZeroColumns);
        }
        for (index, curve) in self.individual_curves.iter().enumerate() {
            curve
                .validate()
                .map_err(|error| error.within(format!("individual curve {index}")))?;
        }
        Ok(())
    }
}

/// Screen side used by directional actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Left edge of the screen.
    Left,
    /// Right edge of the screen.
    Right,
}

/// Kind of gameplay reaction requested by a route node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionTag {
    /// Fire a radial volley.
    Volley,
    /// Roar, switching to the next movement pattern.
    Roar,
    /// Punch towards a screen side.
    Punch,
    /// Host-defined marker with no built-in reaction.
    Marker,
}

/// Typed payload accompanying an [`ActionTag`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPayload {
    /// No payload.
    #[default]
    None,
    /// Screen side the action targets.
    Side(Side),
}

/// Action tag carried by a route node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteAction {
    /// Reaction requested.
    pub tag: ActionTag,
    /// Data accompanying the reaction.
    #[serde(default)]
    pub payload: ActionPayload,
}

impl RouteAction {
    /// Creates an action without payload.
    #[must_use]
    pub const fn plain(tag: ActionTag) -> Self {
        Self {
            tag,
            payload: ActionPayload::None,
        }
    }
}

/// Interpretation of route node positions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeSpace {
    /// Positions are absolute world coordinates.
    Absolute,
    /// Positions are offsets from the position captured when the route is assigned.
    #[default]
    SpawnRelative,
    /// Positions are screen fractions projected through the viewport.
    NormalizedScreen,
}

/// Behaviour applied when a non-looping route ends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteEnd {
    /// Hand control back to default downward drift.
    #[default]
    ResumeDefaultMovement,
    /// Freeze at the last node.
    StopHere,
    /// Deactivate the enemy.
    Despawn,
}

/// Single waypoint of a route.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteNode {
    /// Position interpreted according to the route's [`NodeSpace`].
    pub position: Vec2,
    /// Travel speed towards this node in world units per second.
    #[serde(default = "default_node_speed")]
    pub speed: f32,
    /// Seconds to wait after arriving at this node.
    #[serde(default)]
    pub pause: f32,
    /// Optional action fired on arrival.
    #[serde(default)]
    pub action: Option<RouteAction>,
}

fn default_node_speed() -> f32 {
    DEFAULT_NODE_SPEED
}

impl RouteNode {
    /// Creates an untagged node without pause.
    #[must_use]
    pub const fn at(position: Vec2, speed: f32) -> Self {
        Self {
            position,
            speed,
            pause: 0.0,
            action: None,
        }
    }

    /// Returns the node with the provided post-arrival pause.
    #[must_use]
    pub const fn pausing(mut self, pause: f32) -> Self {
        self.pause = pause;
        self
    }

    /// Returns the node with the provided action tag.
    #[must_use]
    pub const fn tagged(mut self, action: RouteAction) -> Self {
        self.action = Some(action);
        self
    }
}

/// Ordered waypoint traversal used for hand-authored paths and bosses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteDefinition {
    /// Interpretation of node positions.
    #[serde(default)]
    pub space: NodeSpace,
    /// Ordered nodes.
    pub nodes: Vec<RouteNode>,
    /// Whether traversal restarts at the first node.
    #[serde(default)]
    pub looping: bool,
    /// Behaviour applied when a non-looping route ends.
    #[serde(default)]
    pub end: RouteEnd,
}

impl RouteDefinition {
    /// Creates a non-looping route in the provided space.
    #[must_use]
    pub fn new(space: NodeSpace, nodes: Vec<RouteNode>) -> Self {
        Self {
            space,
            nodes,
            looping: false,
            end: RouteEnd::ResumeDefaultMovement,
        }
    }

    /// Returns the route with the provided loop flag.
    #[must_use]
    pub fn looped(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Returns the route with the provided end behaviour.
    #[must_use]
    pub fn ending(mut self, end: RouteEnd) -> Self {
        self.end = end;
        self
    }

    /// Routes with fewer than two nodes are treated as no route.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.nodes.len() >= 2
    }

    /// Checks the node-count invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(ConfigError::RouteTooShort(self.nodes.len()))
        }
    }
}

/// Entity template registered with the host's entity factory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnemyTemplate {
    /// Identifier passed to the entity factory.
    pub id: TemplateId,
    /// Health the enemy spawns with.
    pub max_health: u32,
    /// Whether health is owned by the boss phase machine.
    #[serde(default)]
    pub boss: bool,
}

impl EnemyTemplate {
    /// Damage model requested when spawning this template.
    #[must_use]
    pub fn vitality(&self) -> Vitality {
        if self.boss {
            Vitality::Delegated
        } else {
            Vitality::Health(self.max_health.max(1))
        }
    }
}
