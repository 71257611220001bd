//! Whole-engine runs at the reference frame rate

use zeno_paradoxes::consts::FRAME_DT;
use zeno_paradoxes::sim::{
    Command, DichotomyConfig, Engine, EngineConfig, EngineEvent, PursuitConfig, ScenarioConfig,
    SimulationMode, TickInput,
};

fn start(config: EngineConfig) -> Engine {
    let mut engine = Engine::new(config).expect("valid config");
    engine.tick(&TickInput::new([Command::TogglePause]), 0.0);
    engine
}

fn run_frames(engine: &mut Engine, frames: usize) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    for _ in 0..frames {
        events.extend(engine.tick(&TickInput::default(), FRAME_DT).events);
    }
    events
}

fn completions(events: &[EngineEvent]) -> Vec<(f32, f32)> {
    events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::Completed { time, position } => Some((*time, *position)),
            _ => None,
        })
        .collect()
}

fn classic_race() -> EngineConfig {
    let mut config = EngineConfig::pursuit();
    config.scenario = ScenarioConfig::Pursuit(PursuitConfig {
        pursuer_start: 0.0,
        pursuer_speed: 10.0,
        target_start: 100.0,
        target_speed: 1.0,
        ..PursuitConfig::default()
    });
    config
}

#[test]
fn test_pursuit_catches_once_at_closed_form_time() {
    let mut engine = start(classic_race());
    let mut events = Vec::new();
    for _ in 0..900 {
        events.extend(engine.tick(&TickInput::default(), FRAME_DT).events);
        let bodies = engine.scenario().bodies();
        assert!(bodies[0].position <= bodies[1].position + 1e-3);
    }

    let done = completions(&events);
    assert_eq!(done.len(), 1);
    let (time, position) = done[0];
    assert!((time - 100.0 / 9.0).abs() < 1e-2, "caught at {}", time);
    assert!((position - 1000.0 / 9.0).abs() < 0.1, "caught at x={}", position);

    // Both bodies stay at the meeting point afterwards
    let bodies = engine.scenario().bodies();
    assert_eq!(bodies[0].position, bodies[1].position);
}

#[test]
fn test_dichotomy_converges_in_thirteen_steps() {
    let mut config = EngineConfig::dichotomy();
    config.scenario = ScenarioConfig::Dichotomy(DichotomyConfig {
        origin: 0.0,
        destination: 8.0,
        epsilon: 0.001,
        ..DichotomyConfig::default()
    });
    let mut engine = start(config);
    engine.tick(&TickInput::new([Command::SetSpeed(3.0)]), 0.0);

    let events = run_frames(&mut engine, 2000);
    let steps: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            EngineEvent::Step(s) => Some(*s),
            _ => None,
        })
        .collect();

    assert_eq!(steps.len(), 13);
    for (k, step) in steps.iter().enumerate() {
        assert_eq!(step.index as usize, k + 1);
        let expected = 8.0 * (1.0 - 0.5_f32.powi(k as i32 + 1));
        assert!((step.position - expected).abs() < 1e-5);
    }
    assert!(steps[12].finished);

    let stepper = engine.scenario().stepper().expect("dichotomy has a stepper");
    assert_eq!(stepper.step_index, 13);
    assert!(stepper.remaining().abs() <= 0.001);
    assert_eq!(completions(&events).len(), 1);
}

#[test]
fn test_arrow_stops_at_target() {
    let mut engine = start(EngineConfig::arrow().with_seed(11));
    let events = run_frames(&mut engine, 600);

    let done = completions(&events);
    assert_eq!(done.len(), 1);
    assert!((done[0].0 - 800.0 / 120.0).abs() < 1e-2);
    assert_eq!(engine.scenario().bodies()[0].position, 800.0);
    assert!(engine.particles().len() <= 50);
}

#[test]
fn test_reset_restores_initial_state() {
    let mut engine = start(EngineConfig::arrow().with_seed(2));
    engine.tick(&TickInput::new([Command::SetSpeed(2.0), Command::CycleMode]), FRAME_DT);
    run_frames(&mut engine, 120);
    assert!(!engine.history().is_empty());

    let outcome = engine.tick(&TickInput::new([Command::Reset]), FRAME_DT);
    assert_eq!(outcome.dt, 0.0);
    assert_eq!(engine.scenario().bodies()[0].position, 0.0);
    assert!(engine.history().is_empty());
    assert!(engine.particles().is_empty());
    assert!(!engine.clock().running);
    assert_eq!(engine.clock().sim_time, 0.0);
    // Preferences survive
    assert_eq!(engine.clock().speed_multiplier, 2.0);
    assert_eq!(engine.mode(), SimulationMode::DiscreteSteps);
}

#[test]
fn test_completion_fires_again_after_reset() {
    let mut engine = start(classic_race());
    engine.tick(&TickInput::new([Command::SetSpeed(5.0)]), 0.0);
    assert_eq!(completions(&run_frames(&mut engine, 200)).len(), 1);

    engine.tick(&TickInput::new([Command::Reset, Command::TogglePause]), FRAME_DT);
    assert!(!engine.completed());
    assert_eq!(completions(&run_frames(&mut engine, 200)).len(), 1);
}

#[test]
fn test_pause_freezes_everything() {
    let mut engine = start(EngineConfig::dichotomy());
    run_frames(&mut engine, 150);
    engine.tick(&TickInput::new([Command::TogglePause]), FRAME_DT);

    let frozen_view = |engine: &Engine| {
        (
            serde_json::to_string(engine.particles()).expect("serialize"),
            engine.history().len(),
            engine.scenario().stepper().map(|s| (s.current, s.step_timer)),
            engine.clock().sim_time,
        )
    };
    let before = frozen_view(&engine);
    run_frames(&mut engine, 60);
    assert_eq!(frozen_view(&engine), before);
}

#[test]
fn test_same_seed_same_run() {
    let script = |engine: &mut Engine| {
        let mut out = Vec::new();
        for frame in 0..400 {
            let input = match frame {
                50 => TickInput::new([Command::SetMode(SimulationMode::ProbabilisticView)]),
                60 => TickInput::new([Command::ToggleOverlay(zeno_paradoxes::sim::Overlay::Uncertainty)]),
                200 => TickInput::new([Command::RefineInstant, Command::IncreaseSpeed]),
                _ => TickInput::default(),
            };
            engine.tick(&input, FRAME_DT);
            out.push(serde_json::to_string(&engine.snapshot()).expect("serialize"));
        }
        out
    };

    let mut a = start(EngineConfig::arrow().with_seed(42));
    let mut b = start(EngineConfig::arrow().with_seed(42));
    assert_eq!(script(&mut a), script(&mut b));

    let mut same = start(EngineConfig::arrow().with_seed(42));
    let mut other = start(EngineConfig::arrow().with_seed(43));
    assert_ne!(script(&mut same), script(&mut other));
}

#[test]
fn test_speed_scales_progress() {
    let mut slow = start(classic_race());
    let mut fast = start(classic_race());
    fast.tick(&TickInput::new([Command::SetSpeed(2.0)]), 0.0);
    run_frames(&mut slow, 120);
    run_frames(&mut fast, 60);
    let (a, b) = (
        slow.scenario().bodies()[0].position,
        fast.scenario().bodies()[0].position,
    );
    assert!((a - b).abs() < 1e-2);
}
