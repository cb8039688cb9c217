use safety_synth::aig::{Aig, Literal};
use safety_synth::arena::Arena;
use safety_synth::bdd::Bdd;
use safety_synth::encode::{encode_strategy, AigEncoder};
use safety_synth::sim::Simulator;
use safety_synth::solver::{FixpointMode, GameSolver, Minimization, SafetySolver};
use safety_synth::synth::{run, Outcome, SynthConfig};
use test_log::test;

const MODES: [FixpointMode; 2] = [FixpointMode::Greatest, FixpointMode::Attractor];
const MINIMIZATIONS: [Minimization; 3] = [
    Minimization::None,
    Minimization::ForcedTrue,
    Minimization::Smallest,
];

fn xor(aig: &mut Aig, a: Literal, b: Literal) -> Literal {
    let p = aig.mk_and(a, !b);
    let q = aig.mk_and(!a, b);
    !aig.mk_and(!p, !q)
}

/// One controllable input, bad when it is low.
fn negated_controllable() -> Aig {
    let mut aig = Aig::new();
    let c = aig.mk_input(Some("controllable_c"));
    aig.add_output(!c, Some("bad"));
    aig
}

/// One uncontrollable input wired to the output.
fn uncontrollable_output() -> Aig {
    let mut aig = Aig::new();
    let u = aig.mk_input(Some("u"));
    aig.add_output(u, Some("bad"));
    aig
}

/// `l' = l XOR u`, bad when `l` is set.
fn toggle_latch() -> Aig {
    let mut aig = Aig::new();
    let u = aig.mk_input(Some("u"));
    let l = aig.next_literal();
    aig.add_latch(l, Literal::FALSE, 0, Some("l"));
    let next = xor(&mut aig, l, u);
    aig.set_latch_next(0, next);
    aig.add_output(l, Some("bad"));
    aig
}

/// `l' = l XOR u XOR c`, bad when `l` is set.
fn cancel_toggle() -> Aig {
    let mut aig = Aig::new();
    let u = aig.mk_input(Some("u"));
    let c = aig.mk_input(Some("controllable_c"));
    let l = aig.next_literal();
    aig.add_latch(l, Literal::FALSE, 0, Some("l"));
    let t = xor(&mut aig, l, u);
    let next = xor(&mut aig, t, c);
    aig.set_latch_next(0, next);
    aig.add_output(l, Some("bad"));
    aig
}

/// Two controllables that must agree.
fn equal_controllables() -> Aig {
    let mut aig = Aig::new();
    let a = aig.mk_input(Some("controllable_a"));
    let b = aig.mk_input(Some("controllable_b"));
    let bad = xor(&mut aig, a, b);
    aig.add_output(bad, Some("bad"));
    aig
}

/// Counter incremented by the environment, cleared by the controller,
/// bad when every bit is set.
fn counter(bits: usize) -> Aig {
    let mut aig = Aig::new();
    let inc = aig.mk_input(Some("inc"));
    let clear = aig.mk_input(Some("controllable_clear"));
    let state: Vec<Literal> = (0..bits)
        .map(|i| {
            let l = aig.next_literal();
            aig.add_latch(l, Literal::FALSE, 0, Some(&format!("b{}", i)));
            l
        })
        .collect();

    let mut carry = inc;
    for (i, &b) in state.iter().enumerate() {
        let sum = xor(&mut aig, b, carry);
        carry = aig.mk_and(b, carry);
        let next = aig.mk_and(sum, !clear);
        aig.set_latch_next(i, next);
    }

    let mut full = Literal::TRUE;
    for &b in &state {
        full = aig.mk_and(full, b);
    }
    aig.add_output(full, Some("full"));
    aig
}

fn realizable_games() -> Vec<(&'static str, Aig)> {
    vec![
        ("negated_controllable", negated_controllable()),
        ("cancel_toggle", cancel_toggle()),
        ("equal_controllables", equal_controllables()),
        ("counter", counter(3)),
    ]
}

fn unrealizable_games() -> Vec<(&'static str, Aig)> {
    vec![
        ("uncontrollable_output", uncontrollable_output()),
        ("toggle_latch", toggle_latch()),
    ]
}

#[test]
fn test_negated_controllable_gets_constant_true_policy() {
    let aig = negated_controllable();
    let bdd = Bdd::default();
    let arena = Arena::new(&aig, &bdd).unwrap();

    for mode in MODES {
        let solver = SafetySolver::new(&arena).with_mode(mode);
        let w = solver.solve();
        assert!(bdd.is_one(w));
        let strategy = solver.extract_strategy(w);
        assert_eq!(strategy.policies(), &[bdd.one]);
    }
}

#[test]
fn test_uncontrollable_output_is_unrealizable() {
    let aig = uncontrollable_output();
    let bdd = Bdd::default();
    let arena = Arena::new(&aig, &bdd).unwrap();

    for mode in MODES {
        assert!(bdd.is_zero(SafetySolver::new(&arena).with_mode(mode).solve()));
    }
    let outcome = run(&aig, &SynthConfig::default()).unwrap();
    assert!(matches!(outcome, Outcome::Unrealizable));
}

#[test]
fn test_toggle_latch_runs_the_fixpoint() {
    let aig = toggle_latch();
    let bdd = Bdd::default();
    let arena = Arena::new(&aig, &bdd).unwrap();
    let solver = SafetySolver::new(&arena);

    let l = bdd.mk_var(2);
    assert_eq!(solver.iterates(), vec![bdd.one, -l, bdd.zero]);
    assert!(bdd.is_zero(solver.solve()));
}

#[test]
fn test_unrealizable_in_every_configuration() {
    for (name, aig) in unrealizable_games() {
        for mode in MODES {
            let config = SynthConfig::default().with_mode(mode);
            let outcome = run(&aig, &config).unwrap();
            assert!(!outcome.is_realizable(), "{} should be lost in {} mode", name, mode);
        }
    }
}

#[test]
fn test_soundness() {
    for (name, aig) in realizable_games() {
        let bdd = Bdd::default();
        let arena = Arena::new(&aig, &bdd).unwrap();
        for mode in MODES {
            let solver = SafetySolver::new(&arena).with_mode(mode);
            let w = solver.solve();
            assert!(!bdd.is_zero(w), "{} should be won in {} mode", name, mode);
            assert!(bdd.is_implies(arena.initial(), w), "{}: initial state outside", name);
            assert!(
                bdd.is_implies(w, solver.controlled_predecessor(w)),
                "{}: winning region is not closed",
                name
            );
        }
    }
}

#[test]
fn test_modes_agree() {
    for (name, aig) in realizable_games().into_iter().chain(unrealizable_games()) {
        let bdd = Bdd::default();
        let arena = Arena::new(&aig, &bdd).unwrap();
        let greatest = SafetySolver::new(&arena).with_mode(FixpointMode::Greatest).solve();
        let attractor = SafetySolver::new(&arena).with_mode(FixpointMode::Attractor).solve();
        assert_eq!(greatest, attractor, "{}: fixpoints disagree", name);
    }
}

#[test]
fn test_strategy_consistency() {
    for (name, aig) in realizable_games() {
        let bdd = Bdd::default();
        let arena = Arena::new(&aig, &bdd).unwrap();
        for mode in MODES {
            for minimization in MINIMIZATIONS {
                let solver = SafetySolver::new(&arena)
                    .with_mode(mode)
                    .with_minimization(minimization);
                let w = solver.solve();
                let strategy = solver.extract_strategy(w);
                assert_eq!(strategy.len(), arena.controllables().len());
                assert!(
                    solver.verify(w, &strategy),
                    "{}: {} strategy is not winning",
                    name,
                    minimization
                );
                for &policy in strategy.policies() {
                    let support = bdd.support(policy);
                    assert!(arena.controllables().iter().all(|c| !support.contains(c)));
                }
            }
        }
    }
}

#[test]
fn test_solve_is_idempotent() {
    for (_, aig) in realizable_games().into_iter().chain(unrealizable_games()) {
        let bdd = Bdd::default();
        let arena = Arena::new(&aig, &bdd).unwrap();
        for mode in MODES {
            let solver = SafetySolver::new(&arena).with_mode(mode);
            assert_eq!(solver.solve(), solver.solve());
        }
    }
}

#[test]
fn test_iterates_are_monotone() {
    for (name, aig) in realizable_games().into_iter().chain(unrealizable_games()) {
        let bdd = Bdd::default();
        let arena = Arena::new(&aig, &bdd).unwrap();
        let solver = SafetySolver::new(&arena);
        let bound = (1usize << arena.latches().len()) + 1;

        let iterates = solver.iterates();
        assert!(iterates.len() <= bound, "{}: too many iterates", name);
        for pair in iterates.windows(2) {
            assert!(bdd.is_implies(pair[1], pair[0]), "{}: iterates grow", name);
            assert_ne!(pair[0], pair[1]);
        }

        let levels = solver.attractor_levels();
        assert!(levels.len() <= bound, "{}: too many levels", name);
        for pair in levels.windows(2) {
            assert!(bdd.is_implies(pair[0], pair[1]), "{}: attractor shrinks", name);
            assert_ne!(pair[0], pair[1]);
        }
    }
}

#[test]
fn test_encoder_round_trip() {
    let bdd = Bdd::default();
    let x: Vec<_> = (1..=4).map(|v| bdd.mk_var(v)).collect();
    let functions = [
        bdd.apply_xor(bdd.apply_xor(x[0], x[1]), bdd.apply_xor(x[2], x[3])),
        bdd.apply_ite(x[1], bdd.apply_and(x[0], -x[3]), bdd.apply_or(x[2], x[3])),
        -bdd.apply_and_many(x.iter().copied()),
        bdd.zero,
    ];

    let mut encoder = AigEncoder::new(&bdd);
    for v in 1..=4 {
        encoder.add_input(v, None);
    }
    for &f in &functions {
        encoder.add_output(f, None);
    }
    let aig = encoder.finish();

    let arena = Arena::new(&aig, &bdd).unwrap();
    assert_eq!(arena.outputs(), &functions);
}

#[test]
fn test_strategy_circuit_round_trip() {
    for (name, aig) in realizable_games() {
        let bdd = Bdd::default();
        let arena = Arena::new(&aig, &bdd).unwrap();
        let solver = SafetySolver::new(&arena);
        let w = solver.solve();
        let strategy = solver.extract_strategy(w);
        let circuit = encode_strategy(&arena, &strategy);

        // The strategy circuit numbers its inputs from 1 again.
        let rebuilt = Arena::new(&circuit, &bdd).unwrap();
        let mapping: Vec<_> = arena
            .uncontrollables()
            .iter()
            .chain(arena.latches())
            .map(|&v| bdd.mk_var(v))
            .collect();
        let policies: Vec<_> = rebuilt
            .outputs()
            .iter()
            .map(|&f| bdd.vector_compose(f, &mapping))
            .collect();
        assert_eq!(policies, strategy.policies(), "{}: policies changed", name);
    }
}

/// Every sequence of `len` input vectors of the given width.
fn traces(width: usize, len: usize) -> Vec<Vec<Vec<bool>>> {
    let bits = width * len;
    (0..1u32 << bits)
        .map(|n| {
            (0..len)
                .map(|step| (0..width).map(|i| n >> (step * width + i) & 1 != 0).collect())
                .collect()
        })
        .collect()
}

#[test]
fn test_merged_circuit_matches_closed_loop() {
    for (name, aig) in realizable_games() {
        for minimization in MINIMIZATIONS {
            let config = SynthConfig::default().with_minimization(minimization);
            let (strategy, merged) = match run(&aig, &config).unwrap() {
                Outcome::Realizable { strategy, merged } => (strategy, merged),
                Outcome::Unrealizable => panic!("{} should be won", name),
            };
            let controllable: Vec<bool> = aig
                .inputs()
                .iter()
                .map(|input| input.is_controllable(&config.controllable_marker))
                .collect();
            let width = controllable.iter().filter(|&&c| !c).count();

            for trace in traces(width, 4) {
                let mut arena_sim = Simulator::new(&aig).unwrap();
                let mut strategy_sim = Simulator::new(&strategy).unwrap();
                let mut merged_sim = Simulator::new(&merged).unwrap();

                for uncontrollable in &trace {
                    let observed: Vec<bool> = uncontrollable
                        .iter()
                        .chain(arena_sim.state())
                        .copied()
                        .collect();
                    let decisions = strategy_sim.step(&observed).unwrap();

                    let mut decisions = decisions.into_iter();
                    let mut uncontrollable_values = uncontrollable.iter();
                    let inputs: Vec<bool> = controllable
                        .iter()
                        .map(|&c| {
                            if c {
                                decisions.next().unwrap()
                            } else {
                                *uncontrollable_values.next().unwrap()
                            }
                        })
                        .collect();

                    let expected = arena_sim.step(&inputs).unwrap();
                    let actual = merged_sim.step(uncontrollable).unwrap();
                    assert_eq!(actual, expected, "{}: outputs differ", name);
                    assert_eq!(merged_sim.state(), arena_sim.state(), "{}: states differ", name);
                    assert!(expected.iter().all(|&bad| !bad), "{}: bad output raised", name);
                }
            }
        }
    }
}
