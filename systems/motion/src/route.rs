//! Ordered waypoint traversal with pauses, loops and node actions.

use std::sync::Arc;

use skyraid_core::{
    project, ConfigError, NodeSpace, Projector, RouteAction, RouteDefinition, RouteEnd,
    RouteNode, Vec2,
};
use skyraid_system_paths::move_towards;

const MIN_NODE_SPEED: f32 = 0.01;
const ARRIVAL_EPSILON_SQUARED: f32 = 1e-6;

/// Notification produced while traversing a route.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RouteSignal {
    /// A node carrying an action tag was reached.
    NodeReached {
        /// Index of the node within the route.
        index: usize,
        /// Action tag of the node.
        action: RouteAction,
    },
    /// A non-looping route ended. The controller no longer holds a route.
    Finished(RouteEnd),
}

/// Observable state of a [`RouteController`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RouteStatus {
    /// No route assigned.
    Idle,
    /// Moving towards the node at `target`.
    Traveling {
        /// Index of the node being approached.
        target: usize,
    },
    /// Waiting after arriving at a node.
    Waiting {
        /// Seconds left before traversal resumes.
        remaining: f32,
    },
    /// Suspended by an external override.
    Suspended,
}

/// Per-entity route traversal state.
#[derive(Clone, Debug, Default)]
pub struct RouteController {
    route: Option<Arc<RouteDefinition>>,
    base: Vec2,
    index: usize,
    pause: f32,
    paused: bool,
}

impl RouteController {
    /// Creates a controller without a route.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a route to an entity standing at `current`.
    ///
    /// Captures the base position, snaps to node 0, treats node 0 as reached
    /// and returns the snapped position. Routes with fewer than two nodes
    /// leave the controller idle.
    pub fn assign(
        &mut self,
        route: Arc<RouteDefinition>,
        current: Vec2,
        projector: Option<&dyn Projector>,
        depth: f32,
        signals: &mut Vec<RouteSignal>,
    ) -> Result<Vec2, ConfigError> {
        if let Err(error) = route.validate() {
            self.clear();
            return Err(error);
        }

        self.base = current;
        self.paused = false;
        let first = resolve(&route, &route.nodes[0], self.base, projector, depth);
        self.route = Some(route);
        self.arrive_at(0, signals);
        Ok(first)
    }

    /// Drops the route, returning the controller to idle.
    pub fn clear(&mut self) {
        self.route = None;
        self.index = 0;
        self.pause = 0.0;
        self.paused = false;
    }

    /// Reports whether an active route is assigned.
    #[must_use]
    pub fn has_route(&self) -> bool {
        self.route.is_some()
    }

    /// Suspends or resumes traversal without touching the index or pause timer.
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Current state of the traversal.
    #[must_use]
    pub fn status(&self) -> RouteStatus {
        if self.route.is_none() {
            RouteStatus::Idle
        } else if self.paused {
            RouteStatus::Suspended
        } else if self.pause > 0.0 {
            RouteStatus::Waiting {
                remaining: self.pause,
            }
        } else {
            RouteStatus::Traveling { target: self.index }
        }
    }

    /// Advances traversal by `dt` seconds from `current`, returning the new position.
    pub fn advance(
        &mut self,
        current: Vec2,
        dt: f32,
        projector: Option<&dyn Projector>,
        depth: f32,
        signals: &mut Vec<RouteSignal>,
    ) -> Vec2 {
        let Some(route) = self.route.clone() else {
            return current;
        };
        if self.paused {
            return current;
        }
        if self.pause > 0.0 {
            self.pause -= dt;
            return current;
        }

        let Some(node) = route.nodes.get(self.index) else {
            self.finish(&route, signals);
            return current;
        };

        let target = resolve(&route, node, self.base, projector, depth);
        let position = move_towards(current, target, node.speed.max(MIN_NODE_SPEED) * dt);
        if position.distance_squared(target) <= ARRIVAL_EPSILON_SQUARED {
            self.arrive_at(self.index, signals);
        }
        position
    }

    fn arrive_at(&mut self, index: usize, signals: &mut Vec<RouteSignal>) {
        let Some(node) = self.route.as_ref().and_then(|route| route.nodes.get(index)) else {
            return;
        };
        if let Some(action) = node.action {
            signals.push(RouteSignal::NodeReached { index, action });
        }
        self.pause = node.pause.max(0.0);
        self.index = index + 1;
    }

    fn finish(&mut self, route: &RouteDefinition, signals: &mut Vec<RouteSignal>) {
        if route.looping {
            self.arrive_at(0, signals);
            return;
        }
        self.clear();
        signals.push(RouteSignal::Finished(route.end));
    }
}

/// Resolves a node to a world position. Evaluated on every visit.
fn resolve(
    route: &RouteDefinition,
    node: &RouteNode,
    base: Vec2,
    projector: Option<&dyn Projector>,
    depth: f32,
) -> Vec2 {
    match route.space {
        NodeSpace::NormalizedScreen => project(projector, node.position, depth),
        NodeSpace::SpawnRelative => base + node.position,
        NodeSpace::Absolute => node.position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skyraid_core::ActionTag;

    fn two_node(end: RouteEnd) -> Arc<RouteDefinition> {
        Arc::new(
            RouteDefinition::new(
                NodeSpace::Absolute,
                vec![
                    RouteNode::at(Vec2::ZERO, 1.0),
                    RouteNode::at(Vec2::new(2.0, 0.0), 1.0),
                ],
            )
            .ending(end),
        )
    }

    #[test]
    fn assignment_snaps_to_first_node() {
        let mut controller = RouteController::new();
        let mut signals = Vec::new();
        let position = controller
            .assign(two_node(RouteEnd::StopHere), Vec2::new(9.0, 9.0), None, 0.0, &mut signals)
            .expect("valid route");
        assert_eq!(position, Vec2::ZERO);
        assert_eq!(controller.status(), RouteStatus::Traveling { target: 1 });
    }

    #[test]
    fn short_route_leaves_controller_idle() {
        let mut controller = RouteController::new();
        let mut signals = Vec::new();
        let route = Arc::new(RouteDefinition::new(
            NodeSpace::Absolute,
            vec![RouteNode::at(Vec2::ZERO, 1.0)],
        ));
        assert_eq!(
            controller.assign(route, Vec2::ZERO, None, 0.0, &mut signals),
            Err(ConfigError::RouteTooShort(1))
        );
        assert!(!controller.has_route());
    }

    #[test]
    fn never_overshoots_target() {
        let mut controller = RouteController::new();
        let mut signals = Vec::new();
        let start = controller
            .assign(two_node(RouteEnd::StopHere), Vec2::ZERO, None, 0.0, &mut signals)
            .expect("valid route");
        let position = controller.advance(start, 10.0, None, 0.0, &mut signals);
        assert_eq!(position, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn spawn_relative_nodes_offset_from_base() {
        let route = Arc::new(RouteDefinition::new(
            NodeSpace::SpawnRelative,
            vec![
                RouteNode::at(Vec2::ZERO, 1.0),
                RouteNode::at(Vec2::new(0.0, -1.0), 1.0),
            ],
        ));
        let mut controller = RouteController::new();
        let mut signals = Vec::new();
        let start = controller
            .assign(route, Vec2::new(3.0, 3.0), None, 0.0, &mut signals)
            .expect("valid route");
        assert_eq!(start, Vec2::new(3.0, 3.0));
        let position = controller.advance(start, 2.0, None, 0.0, &mut signals);
        assert_eq!(position, Vec2::new(3.0, 2.0));
    }

    #[test]
    fn suspension_keeps_progress() {
        let mut controller = RouteController::new();
        let mut signals = Vec::new();
        let start = controller
            .assign(two_node(RouteEnd::StopHere), Vec2::ZERO, None, 0.0, &mut signals)
            .expect("valid route");
        let halfway = controller.advance(start, 1.0, None, 0.0, &mut signals);

        controller.set_paused(true);
        assert_eq!(controller.status(), RouteStatus::Suspended);
        assert_eq!(controller.advance(halfway, 1.0, None, 0.0, &mut signals), halfway);

        controller.set_paused(false);
        assert_eq!(controller.status(), RouteStatus::Traveling { target: 1 });
        assert_eq!(
            controller.advance(halfway, 1.0, None, 0.0, &mut signals),
            Vec2::new(2.0, 0.0)
        );
    }

    #[test]
    fn tagged_first_node_fires_on_assignment() {
        let route = Arc::new(RouteDefinition::new(
            NodeSpace::Absolute,
            vec![
                RouteNode::at(Vec2::ZERO, 1.0)
                    .pausing(0.5)
                    .tagged(RouteAction::plain(ActionTag::Volley)),
                RouteNode::at(Vec2::X, 1.0),
            ],
        ));
        let mut controller = RouteController::new();
        let mut signals = Vec::new();
        let _ = controller
            .assign(route, Vec2::ZERO, None, 0.0, &mut signals)
            .expect("valid route");
        assert_eq!(
            signals,
            vec![RouteSignal::NodeReached {
                index: 0,
                action: RouteAction::plain(ActionTag::Volley),
            }]
        );
        assert_eq!(controller.status(), RouteStatus::Waiting { remaining: 0.5 });
    }
}
