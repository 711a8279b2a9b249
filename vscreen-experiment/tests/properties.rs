mod common;

use common::{answer, session};
use proptest::prelude::*;
use vscreen_core::{SessionStatus, TestType};
use vscreen_experiment::Transition;

fn staircase_test() -> impl Strategy<Value = TestType> {
    prop_oneof![
        Just(TestType::VisualAcuity),
        Just(TestType::ContrastSensitivity),
    ]
}

fn any_test() -> impl Strategy<Value = TestType> {
    proptest::sample::select(TestType::ALL.to_vec())
}

proptest! {
    #[test]
    fn trial_index_never_exceeds_quota(
        test_type in any_test(),
        answers in prop::collection::vec(any::<bool>(), 1..80),
    ) {
        let eye = test_type.is_two_eye().then_some(vscreen_core::Eye::Left);
        let (mut s, timer) = session(test_type, eye);
        let quota = s.policy().trials_per_level;
        let mut last_level = s.level();
        for correct in answers {
            if s.status() == SessionStatus::Complete {
                break;
            }
            answer(&mut s, &timer, correct);
            prop_assert!(s.trial_index() <= quota);
            prop_assert!(s.level() >= last_level);
            prop_assert!(s.level() <= last_level + 1);
            last_level = s.level();
        }
    }

    #[test]
    fn staircase_passes_every_level_but_the_last(
        test_type in staircase_test(),
        answers in prop::collection::vec(any::<bool>(), 1..120),
    ) {
        let (mut s, timer) = session(test_type, None);
        let mut completed = false;
        for correct in answers {
            let outcome = answer(&mut s, &timer, correct);
            if let Some(result) = outcome.level_result {
                match outcome.transition {
                    Transition::LevelChanged { from, to } => {
                        prop_assert!(result.passed);
                        prop_assert_eq!(to, from + 1);
                    }
                    Transition::Completed => {
                        prop_assert!(!result.passed || s.level() == s.policy().levels);
                    }
                    Transition::Continued => {
                        prop_assert!(false, "quota met without transition");
                    }
                }
            }
            if outcome.transition == Transition::Completed {
                completed = true;
                break;
            }
        }
        if completed {
            prop_assert_eq!(s.status(), SessionStatus::Complete);
            let passes = s.level_results().iter().filter(|l| l.passed).count();
            prop_assert!(passes + 1 >= s.level_results().len());
        }
    }

    #[test]
    fn fixed_sequences_present_every_item(
        test_type in prop_oneof![Just(TestType::ColorVision), Just(TestType::AmslerGrid)],
        answers in prop::collection::vec(any::<bool>(), 8),
    ) {
        let (mut s, timer) = session(test_type, None);
        let items = s.policy().levels as usize;
        for correct in answers.into_iter().take(items) {
            prop_assert_ne!(s.status(), SessionStatus::Complete);
            answer(&mut s, &timer, correct);
        }
        prop_assert_eq!(s.status(), SessionStatus::Complete);
        prop_assert_eq!(s.trials().len(), items);
    }
}
