//! Property tests over every family and level.
//!
//! - exactly one correct option, all option values distinct
//! - same seed and level give the same instance
//! - the trace replays to the answer
//! - generated instances pass their quality filter
//! - levels stay within 1..=3 under any outcome sequence

use proptest::prelude::*;

use practice_backend::domain::{FamilyId, InstanceSource, Level};
use practice_backend::families;
use practice_backend::ledger::{LevelStateMachine, PerformanceLedger};
use practice_backend::options;
use practice_backend::random::RandomSource;
use practice_backend::training::Outcome;

fn arb_family() -> impl Strategy<Value = FamilyId> {
  prop::sample::select(FamilyId::ALL.to_vec())
}

fn arb_level() -> impl Strategy<Value = Level> {
  (1u8..=3).prop_map(Level::new)
}

fn arb_outcome() -> impl Strategy<Value = Outcome> {
  prop::sample::select(Outcome::ALL.to_vec())
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(64))]

  #[test]
  fn option_set_has_one_correct_and_distinct_values(family in arb_family(), level in arb_level(), seed in any::<u64>()) {
    let mut rng = RandomSource::seeded(seed);
    let instance = families::generate(family, &mut rng, level, families::DEFAULT_MAX_TRIES);
    let solution = families::solve(&instance.params);
    let distractors = families::distractors(&instance.params, &solution.answer, &mut rng, 3);
    let opts = options::build(&solution.answer, &distractors, 3, &mut rng).unwrap();

    prop_assert_eq!(opts.len(), 4);
    prop_assert_eq!(opts.iter().filter(|o| o.is_correct).count(), 1);
    let mut values: Vec<&str> = opts.iter().map(|o| o.value.as_str()).collect();
    values.sort();
    values.dedup();
    prop_assert_eq!(values.len(), 4);
  }

  #[test]
  fn generation_is_deterministic(family in arb_family(), level in arb_level(), seed in any::<u64>()) {
    let a = families::generate(family, &mut RandomSource::seeded(seed), level, families::DEFAULT_MAX_TRIES);
    let b = families::generate(family, &mut RandomSource::seeded(seed), level, families::DEFAULT_MAX_TRIES);
    prop_assert_eq!(&a.params, &b.params);
    prop_assert_eq!(a.id, b.id);
    prop_assert_eq!(families::solve(&a.params).answer, families::solve(&b.params).answer);
  }

  #[test]
  fn trace_replays_to_answer(family in arb_family(), level in arb_level(), seed in any::<u64>()) {
    let instance = families::generate(family, &mut RandomSource::seeded(seed), level, families::DEFAULT_MAX_TRIES);
    let solution = families::solve(&instance.params);
    prop_assert_eq!(solution.trace.replay(), Some(solution.answer.clone()));
  }

  #[test]
  fn generated_instances_pass_quality_filter(family in arb_family(), level in arb_level(), seed in any::<u64>()) {
    let instance = families::generate(family, &mut RandomSource::seeded(seed), level, families::DEFAULT_MAX_TRIES);
    if instance.source == InstanceSource::Generated {
      prop_assert!(families::is_acceptable(&instance.params, level));
    }
    prop_assert_eq!(instance.family, family);
  }

  #[test]
  fn level_stays_in_bounds(start in arb_level(), outcomes in prop::collection::vec(arb_outcome(), 0..40)) {
    let mut ledger = PerformanceLedger { level: start, ..PerformanceLedger::default() };
    for outcome in outcomes {
      ledger.record(outcome == Outcome::Promote);
      LevelStateMachine::apply(&mut ledger, outcome);
      prop_assert!(ledger.level >= Level::MIN && ledger.level <= Level::MAX);
    }
  }
}
