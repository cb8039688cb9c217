//! Synthesize a controller for one of a few built-in safety games.
//!
//! Run with:
//! ```bash
//! cargo run --example synth -- counter --bits 4 --mode attractor -v
//! ```

use clap::{Parser, ValueEnum};
use log::LevelFilter;
use safety_synth::aig::{Aig, Literal};
use safety_synth::sim::Simulator;
use safety_synth::solver::{FixpointMode, Minimization};
use safety_synth::synth::{run, Outcome, SynthConfig};

#[derive(Debug, Copy, Clone, ValueEnum)]
enum Game {
    /// Environment increments a counter, controller may clear it.
    Counter,
    /// Controller must cancel every toggle of a latch.
    Toggle,
    /// Environment drives the bad output directly.
    Lost,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum Mode {
    Greatest,
    Attractor,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum Minimize {
    None,
    ForcedTrue,
    Smallest,
}

#[derive(Debug, Parser)]
#[command(author, version, about = "Safety game synthesis demo")]
struct Cli {
    #[arg(value_enum, default_value = "counter")]
    game: Game,

    /// Counter width
    #[arg(long, default_value = "3")]
    bits: usize,

    #[arg(long, value_enum, default_value = "greatest")]
    mode: Mode,

    #[arg(long, value_enum, default_value = "smallest")]
    minimize: Minimize,

    /// Number of cycles to simulate the closed loop for
    #[arg(long, default_value = "8")]
    cycles: usize,

    /// Log solver rounds
    #[arg(short, long)]
    verbose: bool,
}

fn xor(aig: &mut Aig, a: Literal, b: Literal) -> Literal {
    let p = aig.mk_and(a, !b);
    let q = aig.mk_and(!a, b);
    !aig.mk_and(!p, !q)
}

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

fn toggle() -> Aig {
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

fn lost() -> Aig {
    let mut aig = Aig::new();
    let u = aig.mk_input(Some("u"));
    aig.add_output(u, Some("bad"));
    aig
}

fn print_circuit(title: &str, aig: &Aig) {
    println!(
        "{}: maxvar {}, {} inputs, {} latches, {} outputs, {} AND gates",
        title,
        aig.maxvar(),
        aig.inputs().len(),
        aig.latches().len(),
        aig.outputs().len(),
        aig.ands().len()
    );
    for input in aig.inputs() {
        println!("  input  {} {}", input.lit, input.name.as_deref().unwrap_or(""));
    }
    for latch in aig.latches() {
        println!("  latch  {} <- {} (reset {})", latch.lit, latch.next, latch.reset);
    }
    for output in aig.outputs() {
        println!("  output {} {}", output.lit, output.name.as_deref().unwrap_or(""));
    }
    for gate in aig.ands() {
        println!("  and    {} = {} & {}", gate.lhs, gate.rhs0, gate.rhs1);
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    simplelog::TermLogger::init(
        if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        },
        simplelog::ConfigBuilder::new()
            .add_filter_allow_str("safety_synth::solver")
            .add_filter_allow_str("safety_synth::arena")
            .add_filter_allow_str("safety_synth::encode")
            .add_filter_allow_str("safety_synth::merge")
            .add_filter_allow_str("safety_synth::synth")
            .build(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let aig = match cli.game {
        Game::Counter => counter(cli.bits),
        Game::Toggle => toggle(),
        Game::Lost => lost(),
    };
    let config = SynthConfig::default()
        .with_mode(match cli.mode {
            Mode::Greatest => FixpointMode::Greatest,
            Mode::Attractor => FixpointMode::Attractor,
        })
        .with_minimization(match cli.minimize {
            Minimize::None => Minimization::None,
            Minimize::ForcedTrue => Minimization::ForcedTrue,
            Minimize::Smallest => Minimization::Smallest,
        });
    print_circuit("arena", &aig);

    let time_total = std::time::Instant::now();
    let outcome = run(&aig, &config)?;
    println!("synthesis took {:?}", time_total.elapsed());

    let merged = match outcome {
        Outcome::Unrealizable => {
            println!("UNREALIZABLE");
            return Ok(());
        }
        Outcome::Realizable { strategy, merged } => {
            println!("REALIZABLE");
            print_circuit("strategy", &strategy);
            print_circuit("merged", &merged);
            merged
        }
    };

    // The environment pushes as hard as it can.
    let mut sim = Simulator::new(&merged)?;
    for cycle in 0..cli.cycles {
        let inputs = vec![true; merged.inputs().len()];
        let outputs = sim.step(&inputs)?;
        println!("cycle {}: outputs {:?}, state {:?}", cycle, outputs, sim.state());
    }

    Ok(())
}
