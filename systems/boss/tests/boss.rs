use std::{sync::Arc, time::Duration};

use skyraid_core::{
    ActionTag, Command, EnemyId, Event, HazardKind, NodeSpace, Projector, RouteAction,
    RouteDefinition, RouteEnd, RouteNode, TemplateId, Vec2, Viewport,
};
use skyraid_system_boss::{Boss, BossConfig, BossPhase, Config};
use skyraid_system_motion::Motion;
use skyraid_world::{apply, query, World};

const BOSS: TemplateId = TemplateId::new(90);

struct Harness {
    world: World,
    motion: Motion,
    boss: Boss,
    viewport: Viewport,
    log: Vec<Event>,
}

impl Harness {
    fn new(config: BossConfig) -> Self {
        let viewport = Viewport::default();
        Self {
            world: World::new(),
            motion: Motion::new(skyraid_system_motion::Config::new(viewport)),
            boss: Boss::new(Config::new(config, 17)),
            viewport,
            log: Vec::new(),
        }
    }

    fn summon(&mut self) -> EnemyId {
        let mut commands = Vec::new();
        self.boss.summon(Some(&self.viewport), &mut commands);
        for command in commands {
            self.submit(command);
        }
        self.log
            .iter()
            .find_map(|event| match event {
                Event::EnemySpawned { enemy, template, .. } if *template == BOSS => Some(*enemy),
                _ => None,
            })
            .expect("boss spawned")
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

    fn hit(&mut self, enemy: EnemyId, amount: u32) {
        self.submit(Command::DamageEnemy { enemy, amount });
    }

    fn dispatch(&mut self, mut events: Vec<Event>) {
        while !events.is_empty() {
            let mut next = Vec::new();

            let mut commands = Vec::new();
            let view = query::enemy_view(&self.world);
            self.motion
                .handle(&events, &view, Some(&self.viewport), &mut commands);
            for command in commands.drain(..) {
                apply(&mut self.world, command, &mut next);
            }

            let view = query::enemy_view(&self.world);
            self.boss
                .handle(&events, &view, Some(&self.viewport), &mut commands);
            for command in commands {
                apply(&mut self.world, command, &mut next);
            }

            self.log.append(&mut events);
            events = next;
        }
    }

    fn position(&self, enemy: EnemyId) -> Option<Vec2> {
        query::enemy(&self.world, enemy).map(|snapshot| snapshot.position)
    }
}

#[test]
fn route_tag_fires_sound_wave_from_boss_position() {
    let mut config = BossConfig::new(BOSS);
    config.routes.phase1 = Some(Arc::new(
        RouteDefinition::new(
            NodeSpace::Absolute,
            vec![
                RouteNode::at(Vec2::new(0.0, 3.0), 10.0),
                RouteNode::at(Vec2::new(0.0, 2.0), 10.0)
                    .tagged(RouteAction::plain(ActionTag::Volley)),
            ],
        )
        .ending(RouteEnd::StopHere),
    ));
    let mut harness = Harness::new(config);
    let boss = harness.summon();
    assert_eq!(harness.position(boss), Some(Vec2::new(0.0, 3.0)));

    harness.tick(0.2);

    assert_eq!(harness.position(boss), Some(Vec2::new(0.0, 2.0)));
    let hazards = query::hazards(&harness.world);
    assert_eq!(hazards.len(), 8);
    assert!(hazards
        .iter()
        .all(|hazard| hazard.kind == HazardKind::SoundWave && hazard.position == Vec2::new(0.0, 2.0)));
}

#[test]
fn summoned_boss_holds_at_entry_point() {
    let mut harness = Harness::new(BossConfig::new(BOSS));
    let boss = harness.summon();
    let entry = harness.viewport.to_world(Vec2::new(0.5, 0.85), 0.0);

    harness.tick(1.0);

    let position = harness.position(boss).expect("boss active");
    assert!((position - entry).length() < 1e-4);
    assert_eq!(
        harness.boss.state(boss).map(|state| state.phase),
        Some(BossPhase::Phase1)
    );
}

#[test]
fn damage_drives_phases_until_defeat() {
    let mut harness = Harness::new(BossConfig::new(BOSS));
    let boss = harness.summon();

    harness.hit(boss, 250);
    assert_eq!(harness.boss.state(boss).map(|state| state.health), Some(250));
    harness.tick(0.01);
    assert_eq!(
        harness.boss.state(boss).map(|state| state.phase),
        Some(BossPhase::Phase2)
    );

    harness.hit(boss, 250);

    assert!(harness.boss.state(boss).is_none());
    assert!(harness.position(boss).is_none());
    assert!(harness
        .log
        .iter()
        .any(|event| matches!(event, Event::EnemyGone { enemy, .. } if *enemy == boss)));
}

#[test]
fn rewind_clears_hazards_and_ignores_hits() {
    let mut harness = Harness::new(BossConfig::new(BOSS));
    let boss = harness.summon();
    for _ in 0..3 {
        harness.submit(Command::SpawnHazard {
            kind: HazardKind::Cassette,
            origin: Vec2::ZERO,
            velocity: Vec2::ZERO,
            damage: 1,
            lifetime: 30.0,
        });
    }

    harness.hit(boss, 420);
    harness.tick(0.01);

    assert!(harness
        .log
        .iter()
        .any(|event| matches!(event, Event::HazardsCleared { count: 3 })));
    let state = harness.boss.state(boss).expect("boss alive");
    assert_eq!(state.health, 130);
    assert_eq!(state.phase, BossPhase::Phase3);
    assert!(state.invulnerable);

    harness.hit(boss, 100);
    assert_eq!(harness.boss.state(boss).map(|state| state.health), Some(130));
}

#[test]
fn third_phase_teleports_between_screen_anchors() {
    let config = BossConfig::new(BOSS);
    let anchors = config.teleport_positions.clone();
    let mut harness = Harness::new(config);
    let boss = harness.summon();

    harness.hit(boss, 360);
    harness.tick(0.01);
    harness.tick(0.3);

    let position = harness.position(boss).expect("boss alive");
    assert!(anchors.iter().any(|anchor| {
        (harness.viewport.to_world(*anchor, 0.0) - position).length() < 1e-4
    }));
}
