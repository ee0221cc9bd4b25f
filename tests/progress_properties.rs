// tests/progress_properties.rs

mod common;
use crate::common::{Recorder, init_tracing};

use proptest::prelude::{any, prop_assert, prop_assert_eq, prop_assert_ne, prop_oneof, proptest};
use proptest::strategy::Strategy as _;
use reactive_command::{Channel, Command, Progress, Strategy};

#[derive(Debug, Clone)]
enum Write {
    Set(f64),
    Add(f64),
}

fn write_strategy() -> impl proptest::strategy::Strategy<Value = Write> {
    prop_oneof![
        (-1.0f64..2.0).prop_map(Write::Set),
        (-0.5f64..0.5).prop_map(Write::Add),
    ]
}

#[test]
fn test_progress_calibration_values() {
    init_tracing();

    let progress = Progress::new();
    let published = Recorder::attach(progress.channel());

    assert!(progress.set(0.3));
    assert!(!progress.set(0.2));
    assert_eq!(progress.value(), 0.3);

    assert!(progress.set(1.5));
    assert_eq!(progress.value(), 1.0);

    let fresh = Progress::new();
    assert!(!fresh.set(-0.5));
    assert_eq!(fresh.value(), 0.0);
    assert!(!fresh.set(f64::NAN));

    assert_eq!(published.values(), vec![0.0, 0.3, 1.0]);
}

proptest! {
    #[test]
    fn prop_published_progress_is_clamped_and_monotonic(
        writes in proptest::collection::vec(write_strategy(), 0..40)
    ) {
        let progress = Progress::new();
        let published = Recorder::attach(progress.channel());

        for write in &writes {
            match write {
                Write::Set(v) => { progress.set(*v); }
                Write::Add(d) => { progress.add(*d); }
            }
        }

        let values = published.values();
        prop_assert_eq!(values[0], 0.0);
        for pair in values.windows(2) {
            prop_assert!(pair[1] > pair[0], "not strictly increasing: {:?}", values);
        }
        for v in &values {
            prop_assert!((0.0..=1.0).contains(v));
        }
        prop_assert_eq!(progress.value(), *values.last().unwrap());
    }

    #[test]
    fn prop_invocation_progress_passes_through_one_and_ends_at_zero(
        writes in proptest::collection::vec(write_strategy(), 0..20)
    ) {
        let command = Command::new(Strategy::sync_with_progress(
            move |progress: &Progress, _: ()| {
                for write in &writes {
                    match write {
                        Write::Set(v) => { progress.set(*v); }
                        Write::Add(d) => { progress.add(*d); }
                    }
                }
                Ok(())
            },
        ));
        let published = Recorder::attach(command.channels().progress());

        let _ = command.execute_unit().expect("sync body never fails");

        let values = published.values();
        prop_assert_eq!(values.first().copied(), Some(0.0));
        prop_assert_eq!(values.last().copied(), Some(0.0));
        prop_assert_eq!(values[values.len() - 2], 1.0);
        prop_assert_eq!(command.channels().execution_count().current(), Some(1));
    }

    #[test]
    fn prop_can_execute_is_and_of_signals(
        initial in proptest::collection::vec(any::<bool>(), 0..4),
        flips in proptest::collection::vec((0usize..4, any::<bool>()), 0..16)
    ) {
        let signals: Vec<Channel<bool>> = initial.iter().map(|b| Channel::with_value(*b)).collect();
        let mut builder = Command::builder(Strategy::sync(|_: ()| Ok(())));
        for signal in &signals {
            builder = builder.can_execute(signal.clone());
        }
        let command = builder.build();
        let seen = Recorder::attach(command.channels().can_execute());

        let mut state = initial.clone();
        for (index, value) in flips {
            if state.is_empty() {
                break;
            }
            let index = index % state.len();
            state[index] = value;
            signals[index].publish(value);

            let expected = state.iter().all(|b| *b);
            prop_assert_eq!(command.channels().can_execute().current(), Some(expected));
        }

        // De-duplicated: consecutive notifications always differ.
        for pair in seen.values().windows(2) {
            prop_assert_ne!(pair[0], pair[1]);
        }
    }
}
