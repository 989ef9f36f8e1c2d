//! Model-based property tests.
//!
//! These tests generate random operation sequences, apply them to a world of
//! real clients talking to the scripted server, and check that the system
//! stays sane along the way and converges once it goes quiet.
//!
//! # Architecture
//!
//! ```text
//! proptest generates: Vec<Operation>
//!                          │
//!                          ▼
//!                World (clients + scripted server)
//!                          │
//!           ┌──────────────┴──────────────┐
//!           ▼                             ▼
//!   invariants after every op     settle, then compare
//!                                 with the server's view
//! ```

use parley_harness::{
    InvariantRegistry, Operation, RostersAgree, SmallText, World,
    scripted_server::NAME_TAKEN_REPLY,
};
use proptest::prelude::*;

/// Strategy for generating SmallText.
fn small_text_strategy() -> impl Strategy<Value = SmallText> {
    (any::<u8>(), any::<u8>()).prop_map(|(seed, len)| SmallText { seed, len })
}

/// Strategy for generating operations with valid client IDs.
fn operation_strategy(num_clients: usize) -> impl Strategy<Value = Operation> {
    let client_id = 0..num_clients as u8;
    let millis = 0..4000u16;

    prop_oneof![
        // Weight towards chat and time, which exercise echo and presence timers
        5 => (client_id.clone(), small_text_strategy())
            .prop_map(|(c, text)| Operation::SendText { client_id: c, text }),
        4 => millis.prop_map(|m| Operation::AdvanceTime { millis: m }),
        3 => Just(Operation::DeliverPending),
        2 => (client_id.clone(), any::<u8>())
            .prop_map(|(c, seed)| Operation::Rename { client_id: c, name_seed: seed }),
        2 => (client_id.clone(), client_id.clone())
            .prop_map(|(c, p)| Operation::SelectTarget { client_id: c, peer_id: p }),
        1 => client_id.clone().prop_map(|c| Operation::Connect { client_id: c }),
        1 => client_id.clone().prop_map(|c| Operation::Disconnect { client_id: c }),
        1 => client_id.clone().prop_map(|c| Operation::Refresh { client_id: c }),
        1 => client_id.clone().prop_map(|c| Operation::SwitchPublic { client_id: c }),
        1 => client_id.prop_map(|c| Operation::SwitchPrivate { client_id: c }),
    ]
}

fn connected_world(num_clients: usize) -> World {
    let mut world = World::new(num_clients);
    world.connect_all();
    world
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Per-client invariants hold after every single operation.
    #[test]
    fn prop_invariants_hold_after_every_operation(
        num_clients in 2..5usize,
        ops in prop::collection::vec(operation_strategy(4), 0..60)
    ) {
        let registry = InvariantRegistry::standard();
        let mut world = connected_world(num_clients);

        for (i, op) in ops.iter().enumerate() {
            world.apply(op);

            let result = registry.check_all(&world.snapshot());
            prop_assert!(
                result.is_ok(),
                "Violation after operation {}: {:?}\n{:?}",
                i, op, result
            );
        }
    }

    /// Once quiet, every client agrees with the server on who is online and
    /// what it is called.
    #[test]
    fn prop_world_converges_after_settle(
        num_clients in 2..5usize,
        ops in prop::collection::vec(operation_strategy(4), 0..60)
    ) {
        let mut world = connected_world(num_clients);
        for op in &ops {
            world.apply(op);
        }
        world.settle();

        prop_assert_eq!(world.check_against_server(), Ok(()));

        let mut registry = InvariantRegistry::standard();
        registry.add(RostersAgree);
        let result = registry.check_all(&world.snapshot());
        prop_assert!(result.is_ok(), "Violation after settle: {:?}", result);
    }

    /// Every public message a client sends is shown to its author exactly
    /// once: the local copy is shown and the server echo is suppressed.
    #[test]
    fn prop_own_public_messages_shown_once(
        num_clients in 1..4usize,
        ops in prop::collection::vec(operation_strategy(3), 0..60)
    ) {
        let mut world = connected_world(num_clients);
        for op in &ops {
            world.apply(op);
        }
        world.settle();

        for id in 0..world.num_clients() {
            prop_assert_eq!(
                world.own_public_shown(id),
                world.public_sent(id),
                "client {} display/send mismatch",
                id
            );
        }
    }
}

#[test]
fn rename_collision_keeps_both_names_distinct() {
    let mut world = connected_world(2);
    world.settle();

    world.apply(&Operation::Rename { client_id: 0, name_seed: 1 });
    world.apply(&Operation::Rename { client_id: 1, name_seed: 7 });
    world.settle();

    assert_eq!(world.check_against_server(), Ok(()));
    assert_eq!(world.client(0).and_then(|c| c.identity()), Some("n1"));
    assert_eq!(world.client(1).and_then(|c| c.identity()), Some("User2"));
    // The losing client was told why and its name did not change.
    assert_eq!(world.rejected(1), 0);
    let notices = world
        .transcript(1)
        .map(|t| t.iter().filter(|m| m.text.contains(NAME_TAKEN_REPLY)).count())
        .unwrap_or_default();
    assert_eq!(notices, 1);
}

#[test]
fn private_target_is_dropped_when_peer_leaves() {
    let mut world = connected_world(3);
    world.settle();

    world.apply(&Operation::SelectTarget { client_id: 0, peer_id: 2 });
    assert_eq!(
        world.client(0).and_then(|c| c.mode().target().map(str::to_owned)),
        Some("User3".to_owned())
    );

    world.apply(&Operation::Disconnect { client_id: 2 });
    // Long enough for the offline refresh, short of the reconnect.
    world.advance(std::time::Duration::from_millis(2900));

    let client = world.client(0);
    assert_eq!(client.map(|c| c.mode().is_private()), Some(true));
    assert_eq!(client.and_then(|c| c.mode().target()), None);
}

#[test]
fn send_while_disconnected_is_dropped() {
    let mut world = connected_world(2);
    world.settle();

    world.apply(&Operation::Disconnect { client_id: 0 });
    world.apply(&Operation::SendText { client_id: 0, text: SmallText { seed: 1, len: 3 } });
    world.settle();

    assert_eq!(world.public_sent(0), 0);
    assert_eq!(world.check_against_server(), Ok(()));
}
