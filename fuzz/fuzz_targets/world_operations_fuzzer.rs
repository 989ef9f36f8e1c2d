//! Fuzz target for multi-client operation sequences
//!
//! Several real clients against the scripted server, driven by arbitrary
//! [`Operation`] sequences. Complements the proptest model tests with
//! coverage-guided exploration.
//!
//! # Invariants
//!
//! - Harness invariants hold after every operation
//! - After settling, every client agrees with the server on its identity and
//!   on who is online

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use parley_harness::{InvariantRegistry, Operation, RostersAgree, World};

#[derive(Debug, Arbitrary)]
struct Scenario {
    clients: u8,
    operations: Vec<Operation>,
}

fuzz_target!(|scenario: Scenario| {
    let num_clients = usize::from(scenario.clients % 4) + 1;
    let mut world = World::new(num_clients);
    world.connect_all();

    let registry = InvariantRegistry::standard();
    for op in scenario.operations.iter().take(64) {
        world.apply(op);
        registry.assert_all(&world.snapshot(), &format!("after {op:?}"));
    }

    world.connect_all();
    world.settle();

    if let Err(e) = world.check_against_server() {
        panic!("world did not converge: {e}");
    }

    let mut agreement = InvariantRegistry::new();
    agreement.add(RostersAgree);
    agreement.assert_all(&world.snapshot(), "after settle");
});
