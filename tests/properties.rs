//! Quantified invariants of the simulation components

use glam::Vec2;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use zeno_paradoxes::sim::{
    Body, ClockConfig, Color, ColorPolicy, EmitShape, EngineClock, HistoryBuffer, ModeController,
    ParticleConfig, ParticlePool, SimulationMode, SteppedTarget, StepTrigger, StopCondition, advance,
};

static ALL_MODES: [SimulationMode; 6] = [
    SimulationMode::Continuous,
    SimulationMode::DiscreteSteps,
    SimulationMode::Mathematical,
    SimulationMode::Energy,
    SimulationMode::DerivativeView,
    SimulationMode::ProbabilisticView,
];

fn pool(cap: Option<usize>) -> ParticlePool {
    ParticlePool::new(ParticleConfig {
        decay_rate: 2.0,
        shrink: 0.97,
        gravity: 100.0,
        cap,
        burst: 5,
        shape: EmitShape::radial(10.0, 50.0, 3.0),
    })
}

proptest! {
    #[test]
    fn motion_is_linear_in_dt(
        position in -1000.0_f32..1000.0,
        speed in 0.0_f32..500.0,
        dt in 0.0_f32..0.1,
    ) {
        let mut bodies = [Body::new(position, speed)];
        let adv = advance(&mut bodies, dt, StopCondition::Never);
        prop_assert!(!adv.stopped);
        prop_assert!((bodies[0].position - (position + speed * dt)).abs() < 1e-3);
    }

    #[test]
    fn split_advance_matches_single_advance(
        speed in 0.0_f32..500.0,
        dt1 in 0.0_f32..0.1,
        dt2 in 0.0_f32..0.1,
    ) {
        let mut split = [Body::new(0.0, speed)];
        advance(&mut split, dt1, StopCondition::Never);
        advance(&mut split, dt2, StopCondition::Never);
        let mut whole = [Body::new(0.0, speed)];
        advance(&mut whole, dt1 + dt2, StopCondition::Never);
        prop_assert!((split[0].position - whole[0].position).abs() < 1e-2);
    }

    #[test]
    fn pursuer_never_overtakes(
        lead in 1.0_f32..500.0,
        pursuer_speed in 1.0_f32..300.0,
        target_speed in 0.0_f32..100.0,
        dts in prop::collection::vec(0.0_f32..0.5, 1..200),
    ) {
        let stop = StopCondition::Catch { pursuer: 0, target: 1 };
        let mut bodies = [Body::new(0.0, pursuer_speed), Body::new(lead, target_speed)];
        for dt in dts {
            advance(&mut bodies, dt, stop);
            prop_assert!(bodies[0].position <= bodies[1].position);
        }
    }

    #[test]
    fn speed_stays_in_bounds(requests in prop::collection::vec(any::<f32>(), 1..20)) {
        let config = ClockConfig::default();
        let mut clock = EngineClock::new(config);
        for speed in requests {
            let applied = clock.set_speed(speed);
            prop_assert!(applied >= config.min_speed && applied <= config.max_speed);
        }
    }

    #[test]
    fn paused_clock_never_advances(raw in prop::collection::vec(-1.0_f32..1.0, 1..50)) {
        let mut clock = EngineClock::new(ClockConfig::default());
        for dt in raw {
            prop_assert_eq!(clock.tick(dt), 0.0);
        }
        prop_assert_eq!(clock.sim_time, 0.0);
    }

    #[test]
    fn mode_cycle_is_modular(len in 1_usize..=6, cycles in 0_usize..100) {
        let modes = &ALL_MODES[..len];
        let mut controller = ModeController::new(modes);
        for _ in 0..cycles {
            controller.cycle();
        }
        prop_assert_eq!(controller.index(), cycles % len);
        prop_assert_eq!(controller.current(), modes[cycles % len]);
    }

    #[test]
    fn pool_holds_only_live_particles(
        seed in any::<u64>(),
        cap in prop::option::of(0_usize..60),
        script in prop::collection::vec((0_usize..20, 0.0_f32..0.3), 1..60),
    ) {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut pool = pool(cap);
        let colors = ColorPolicy::Fixed(Color::RED);
        for (count, dt) in script {
            pool.emit(Vec2::ZERO, count, &colors, &mut rng);
            if let Some(cap) = cap {
                prop_assert!(pool.len() <= cap);
            }
            pool.update(dt);
            prop_assert!(pool.particles().iter().all(|p| p.life > 0.0));
        }
    }

    #[test]
    fn history_samples_are_spaced(
        interval in 0.01_f32..1.0,
        steps in prop::collection::vec(0.0_f32..0.2, 1..300),
    ) {
        let mut history = HistoryBuffer::new(interval);
        // Reference model: last accepted time and how many ticks were eligible
        let mut last_accepted: Option<f32> = None;
        let mut eligible = 0_usize;
        let mut time = 0.0_f32;
        for dt in steps {
            time += dt;
            let due = match last_accepted {
                None => true,
                Some(last) => time - last >= interval,
            };
            if due {
                eligible += 1;
                last_accepted = Some(time);
            }
            prop_assert_eq!(history.record(time, [time, -time]), due);
        }
        prop_assert_eq!(history.len(), eligible);
        prop_assert!(!history.is_empty());
        for pair in history.samples().windows(2) {
            prop_assert!(pair[1].time - pair[0].time >= interval);
        }
    }

    #[test]
    fn each_step_halves_the_remaining_distance(
        distance in 1.0_f32..1000.0,
        epsilon in 0.0001_f32..0.5,
    ) {
        let mut stepper = SteppedTarget::new(0.0, distance, 1.0, epsilon);
        stepper.set_trigger(StepTrigger::Manual);
        let mut before = stepper.remaining();
        while let Some(step) = stepper.step_once() {
            prop_assert!((step.remaining - before / 2.0).abs() <= distance * 1e-6);
            prop_assert!(step.position <= distance);
            before = step.remaining;
        }
        prop_assert!(stepper.finished());
        prop_assert!(stepper.remaining().abs() <= epsilon);
    }
}
