use std::{sync::Arc, time::Duration};

use skyraid_core::{
    ActionTag, Command, CurveDefinition, CurveKind, DespawnCause, EnemyId, Event, MotionPlan,
    NodeSpace, RouteAction, RouteDefinition, RouteEnd, RouteNode, TemplateId, Vec2, Viewport,
    Vitality,
};
use skyraid_system_motion::{Config, LocomotionKind, Motion, RouteStatus};
use skyraid_world::{apply, query, World};

struct Harness {
    world: World,
    motion: Motion,
    viewport: Viewport,
    log: Vec<Event>,
}

impl Harness {
    fn new() -> Self {
        let viewport = Viewport::default();
        Self {
            world: World::new(),
            motion: Motion::new(Config::new(viewport)),
            viewport,
            log: Vec::new(),
        }
    }

    fn spawn(&mut self, position: Vec2, motion: MotionPlan) -> EnemyId {
        self.spawn_with(position, Vitality::Health(3), motion)
    }

    fn spawn_with(&mut self, position: Vec2, vitality: Vitality, motion: MotionPlan) -> EnemyId {
        let mut events = Vec::new();
        apply(
            &mut self.world,
            Command::SpawnEnemy {
                template: TemplateId::new(1),
                position,
                vitality,
                motion,
                tracking: None,
            },
            &mut events,
        );
        let enemy = match events.first() {
            Some(Event::EnemySpawned { enemy, .. }) => *enemy,
            other => panic!("unexpected event {other:?}"),
        };
        self.dispatch(events);
        enemy
    }

    fn submit(&mut self, command: Command) {
        let mut events = Vec::new();
        apply(&mut self.world, command, &mut events);
        self.dispatch(events);
    }

    fn tick(&mut self, seconds: f32) {
        self.submit(Command::Tick {
            dt: Duration::from_secs_f32(seconds),
        });
    }

    fn dispatch(&mut self, mut events: Vec<Event>) {
        while !events.is_empty() {
            let view = query::enemy_view(&self.world);
            let mut commands = Vec::new();
            self.motion
                .handle(&events, &view, Some(&self.viewport), &mut commands);
            self.log.append(&mut events);
            for command in commands {
                apply(&mut self.world, command, &mut events);
            }
        }
    }

    fn position(&self, enemy: EnemyId) -> Option<Vec2> {
        query::enemy(&self.world, enemy).map(|snapshot| snapshot.position)
    }

    fn gone_cause(&self, enemy: EnemyId) -> Option<DespawnCause> {
        self.log.iter().find_map(|event| match event {
            Event::EnemyGone {
                enemy: gone, cause, ..
            } if *gone == enemy => Some(*cause),
            _ => None,
        })
    }
}

fn assert_close(actual: Option<Vec2>, expected: Vec2) {
    let actual = actual.expect("enemy should be active");
    assert!(
        (actual - expected).length() < 1e-4,
        "expected {expected:?}, got {actual:?}"
    );
}

fn downward_route(end: RouteEnd) -> Arc<RouteDefinition> {
    Arc::new(
        RouteDefinition::new(
            NodeSpace::Absolute,
            vec![
                RouteNode::at(Vec2::ZERO, 2.0),
                RouteNode::at(Vec2::new(0.0, -2.0), 2.0),
            ],
        )
        .ending(end),
    )
}

#[test]
fn finished_route_hands_control_back_to_drift() {
    let mut harness = Harness::new();
    let enemy = harness.spawn(
        Vec2::new(1.0, 1.0),
        MotionPlan::Route(downward_route(RouteEnd::ResumeDefaultMovement)),
    );
    assert_close(harness.position(enemy), Vec2::ZERO);

    harness.tick(0.5);
    assert_close(harness.position(enemy), Vec2::new(0.0, -1.0));
    harness.tick(0.5);
    assert_close(harness.position(enemy), Vec2::new(0.0, -2.0));
    assert_eq!(harness.motion.locomotion(enemy), Some(LocomotionKind::Route));

    harness.tick(0.5);
    assert_eq!(harness.motion.locomotion(enemy), Some(LocomotionKind::Drift));
    assert_eq!(harness.motion.route_status(enemy), None);
    assert_close(harness.position(enemy), Vec2::new(0.0, -2.0));

    harness.tick(0.5);
    assert_eq!(harness.motion.locomotion(enemy), Some(LocomotionKind::Drift));
    assert_close(harness.position(enemy), Vec2::new(0.0, -3.25));
}

#[test]
fn despawning_route_removes_enemy() {
    let mut harness = Harness::new();
    let enemy = harness.spawn(Vec2::ZERO, MotionPlan::Route(downward_route(RouteEnd::Despawn)));
    for _ in 0..4 {
        harness.tick(0.5);
    }
    assert_eq!(harness.gone_cause(enemy), Some(DespawnCause::RouteComplete));
    assert_eq!(harness.motion.locomotion(enemy), None);
}

#[test]
fn drifting_enemy_is_culled_below_viewport() {
    let mut harness = Harness::new();
    let bottom = harness.viewport.bottom();
    let enemy = harness.spawn(Vec2::new(0.0, bottom - 1.5), MotionPlan::Drift);

    harness.tick(0.5);

    assert_eq!(harness.gone_cause(enemy), Some(DespawnCause::LeftArena));
    assert!(harness.position(enemy).is_none());
}

#[test]
fn completed_curve_despawns_enemy() {
    let mut harness = Harness::new();
    let curve = Arc::new(CurveDefinition::through(
        CurveKind::Linear,
        [Vec2::ZERO, Vec2::new(0.0, 4.0)],
        1.0,
    ));
    let enemy = harness.spawn(
        Vec2::ZERO,
        MotionPlan::Curve {
            curve,
            formation: None,
        },
    );

    harness.tick(0.5);
    assert_close(harness.position(enemy), Vec2::new(0.0, 2.0));
    harness.tick(0.5);
    assert_eq!(harness.gone_cause(enemy), Some(DespawnCause::PathComplete));
}

#[test]
fn fly_in_lands_then_starts_route() {
    let mut harness = Harness::new();
    let curve = Arc::new(CurveDefinition::through(
        CurveKind::Linear,
        [Vec2::new(-3.0, 0.0), Vec2::ZERO],
        0.5,
    ));
    let route = Arc::new(
        RouteDefinition::new(
            NodeSpace::SpawnRelative,
            vec![
                RouteNode::at(Vec2::ZERO, 1.0),
                RouteNode::at(Vec2::new(1.0, 0.0), 1.0)
                    .tagged(RouteAction::plain(ActionTag::Marker)),
            ],
        )
        .ending(RouteEnd::StopHere),
    );
    let enemy = harness.spawn(
        Vec2::new(-3.0, 0.0),
        MotionPlan::FlyIn {
            curve,
            then: Some(route),
        },
    );

    harness.tick(0.5);
    assert_close(harness.position(enemy), Vec2::ZERO);
    assert_eq!(harness.motion.locomotion(enemy), Some(LocomotionKind::Route));

    harness.tick(1.0);
    assert_close(harness.position(enemy), Vec2::new(1.0, 0.0));
    assert!(harness.log.iter().any(|event| matches!(
        event,
        Event::RouteNodeReached { index: 1, .. }
    )));

    harness.tick(0.1);
    assert_eq!(harness.motion.locomotion(enemy), Some(LocomotionKind::Hold));
}

#[test]
fn paused_route_resumes_where_it_stopped() {
    let mut harness = Harness::new();
    let enemy = harness.spawn(
        Vec2::ZERO,
        MotionPlan::Route(downward_route(RouteEnd::StopHere)),
    );
    harness.tick(0.5);

    harness.submit(Command::SetRoutePaused {
        enemy,
        paused: true,
    });
    assert_eq!(harness.motion.route_status(enemy), Some(RouteStatus::Suspended));
    harness.tick(0.5);
    assert_close(harness.position(enemy), Vec2::new(0.0, -1.0));

    harness.submit(Command::SetRoutePaused {
        enemy,
        paused: false,
    });
    harness.tick(0.5);
    assert_close(harness.position(enemy), Vec2::new(0.0, -2.0));
}

#[test]
fn stopping_route_holds_final_node() {
    let mut harness = Harness::new();
    let enemy = harness.spawn(Vec2::ZERO, MotionPlan::Route(downward_route(RouteEnd::StopHere)));
    harness.tick(0.5);
    harness.tick(0.5);
    harness.tick(0.5);

    assert_eq!(harness.motion.locomotion(enemy), Some(LocomotionKind::Hold));
    assert_eq!(harness.motion.route_status(enemy), None);

    harness.tick(1.0);
    assert_close(harness.position(enemy), Vec2::new(0.0, -2.0));
    assert_eq!(harness.gone_cause(enemy), None);
}

#[test]
fn looping_route_wraps_and_fires_first_node_again() {
    let mut harness = Harness::new();
    let route = Arc::new(
        RouteDefinition::new(
            NodeSpace::Absolute,
            vec![
                RouteNode::at(Vec2::ZERO, 2.0).tagged(RouteAction::plain(ActionTag::Volley)),
                RouteNode::at(Vec2::new(2.0, 0.0), 2.0),
                RouteNode::at(Vec2::new(2.0, 2.0), 2.0),
            ],
        )
        .looped(true),
    );
    let enemy = harness.spawn(Vec2::ZERO, MotionPlan::Route(route));
    let first_node_hits = |harness: &Harness| {
        harness
            .log
            .iter()
            .filter(|event| matches!(event, Event::RouteNodeReached { index: 0, .. }))
            .count()
    };
    assert_eq!(first_node_hits(&harness), 1);

    harness.tick(1.0);
    harness.tick(1.0);
    assert_close(harness.position(enemy), Vec2::new(2.0, 2.0));
    harness.tick(0.1);

    assert_eq!(first_node_hits(&harness), 2);
    assert_eq!(
        harness.motion.route_status(enemy),
        Some(RouteStatus::Traveling { target: 1 })
    );
    harness.tick(0.5);
    assert_close(harness.position(enemy), Vec2::new(2.0, 1.0));
}

#[test]
fn delegated_enemy_holds_when_route_would_release_it() {
    for end in [RouteEnd::ResumeDefaultMovement, RouteEnd::Despawn] {
        let mut harness = Harness::new();
        let enemy = harness.spawn_with(
            Vec2::ZERO,
            Vitality::Delegated,
            MotionPlan::Route(downward_route(end)),
        );
        for _ in 0..40 {
            harness.tick(0.5);
        }

        assert_eq!(harness.motion.locomotion(enemy), Some(LocomotionKind::Hold));
        assert_close(harness.position(enemy), Vec2::new(0.0, -2.0));
        assert_eq!(harness.gone_cause(enemy), None);
    }
}

#[test]
fn delegated_enemy_holds_at_curve_end() {
    let mut harness = Harness::new();
    let curve = Arc::new(CurveDefinition::through(
        CurveKind::Linear,
        [Vec2::ZERO, Vec2::new(0.0, 4.0)],
        1.0,
    ));
    let enemy = harness.spawn_with(
        Vec2::ZERO,
        Vitality::Delegated,
        MotionPlan::Curve {
            curve,
            formation: None,
        },
    );
    for _ in 0..4 {
        harness.tick(0.5);
    }

    assert_eq!(harness.gone_cause(enemy), None);
    assert_eq!(harness.motion.locomotion(enemy), Some(LocomotionKind::Hold));
}
