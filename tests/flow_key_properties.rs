use proptest::prelude::*;
use survey_flow::flow_key::{compare_keys, compose, decompose, FlowKey};
use survey_flow::FlowError;

proptest! {
    #[test]
    fn well_formed_keys_round_trip(question_num in 1u32..100_000, flow_no in 1u32..100_000) {
        let key = format!("FlowNo_{}={}", question_num, flow_no);
        let d = decompose(&key).unwrap();
        prop_assert_eq!(d.question_num, question_num);
        prop_assert_eq!(d.flow_no, flow_no);
        prop_assert_eq!(compose(d.question_num, d.flow_no).unwrap(), key.clone());
        prop_assert_eq!(FlowKey::parse(&key).unwrap().to_string(), key);
    }

    #[test]
    fn bare_keys_round_trip(question_num in 1u32..100_000) {
        let key = format!("FlowNo_{}", question_num);
        let d = decompose(&key).unwrap();
        prop_assert_eq!(d.flow_no, 0);
        prop_assert_eq!(compose(d.question_num, d.flow_no).unwrap(), key);
    }

    #[test]
    fn ordering_is_numeric(a in 1u32..1000, b in 1u32..1000, c in 1u32..1000, d in 1u32..1000) {
        let left = format!("FlowNo_{}={}", a, b);
        let right = format!("FlowNo_{}={}", c, d);
        prop_assert_eq!(compare_keys(&left, &right), (a, b).cmp(&(c, d)));
    }

    #[test]
    fn arbitrary_text_never_panics(s in "\\PC*") {
        match decompose(&s) {
            Ok(d) => prop_assert!(d.question_num > 0),
            Err(e) => prop_assert!(matches!(e, FlowError::MalformedKey(_))),
        }
    }
}
