//! End-to-end checks of the bundled scenario circuits and small inline
//! netlists with hand-derived histories.

use std::collections::BTreeMap;

use wavesim_common::Logic;
use wavesim_conformance::{history, points, run_scenario, run_toml};
use wavesim_sim::{simulate, Dff, Gate, SimTime, Stimulus};

// ---------------------------------------------------------------------------
// Bundled circuit files
// ---------------------------------------------------------------------------

#[test]
fn mealy_machine_state_trace() {
    let result = run_scenario("mealy_1").unwrap();
    let w = &result.waveforms;

    assert_eq!(
        points(w, "X_bar").unwrap(),
        [(0, 1), (65, 0), (115, 1), (165, 0), (215, 1), (305, 0), (345, 1)]
    );
    assert_eq!(
        points(w, "A+").unwrap(),
        [(0, 1), (80, 0), (130, 1), (185, 0), (230, 1), (320, 0), (360, 1)]
    );
    assert_eq!(
        points(w, "B+").unwrap(),
        [(0, 0), (70, 1), (120, 0), (185, 1), (220, 0), (310, 1), (350, 0)]
    );
    assert_eq!(
        points(w, "A").unwrap(),
        [(0, 1), (120, 0), (170, 1), (220, 0), (270, 1), (370, 0), (420, 1)]
    );
    assert_eq!(
        points(w, "B").unwrap(),
        [(0, 0), (120, 1), (170, 0), (220, 1), (270, 0)]
    );
}

#[test]
fn mealy_machine_clock_and_input_are_recorded_verbatim() {
    let result = run_scenario("mealy_1").unwrap();
    let w = &result.waveforms;

    let clk = points(w, "CLK").unwrap();
    assert_eq!(clk.len(), 17);
    assert_eq!(clk[0], (0, 1));
    assert_eq!(clk[16], (400, 1));
    assert!(clk.iter().all(|&(t, _)| t % 25 == 0));

    assert_eq!(
        points(w, "X").unwrap(),
        [(0, 0), (55, 1), (105, 0), (155, 1), (205, 0), (295, 1), (335, 0)]
    );
}

#[test]
fn mealy_flip_flops_change_only_after_rising_edges() {
    let result = run_scenario("mealy_1").unwrap();
    let w = &result.waveforms;
    for q in ["A", "B"] {
        for &(t, _) in &w.get(q).unwrap()[1..] {
            let edge = SimTime::new(t.units() - 20);
            assert_eq!(
                w.value_at("CLK", edge),
                Some(Logic::One),
                "{q} changed at {t} without a rising clock edge 20 units earlier"
            );
            assert!(w.get("CLK").unwrap().contains(&(edge, Logic::One)));
        }
    }
}

#[test]
fn and_not_chain_file() {
    let result = run_scenario("and_not").unwrap();
    let w = &result.waveforms;
    assert_eq!(points(w, "X").unwrap(), [(0, 0), (13, 1), (23, 0)]);
    assert_eq!(points(w, "Y").unwrap(), [(0, 1), (15, 0), (25, 1)]);
    assert_eq!(result.final_time, SimTime::new(25));
}

// ---------------------------------------------------------------------------
// Inline descriptions
// ---------------------------------------------------------------------------

#[test]
fn and_truth_table_from_plain_data() {
    let gates = vec![Gate::new("G1", "AND", ["A", "B"], "X", 3).unwrap()];
    let initial: BTreeMap<String, Logic> =
        [("A".into(), Logic::Zero), ("B".into(), Logic::Zero)].into();
    let stimulus = Stimulus::new()
        .set("A", 5, Logic::One)
        .set("B", 10, Logic::One);

    let w = simulate(&gates, &[], &initial, &stimulus, SimTime::new(40)).unwrap();
    assert_eq!(w.get("X").unwrap(), history(&[(0, 0), (13, 1)]).as_slice());
}

#[test]
fn dff_samples_on_rising_edges_only() {
    let dffs = vec![Dff::new("FF", "D", "CLK", "Q", 2)];
    let initial: BTreeMap<String, Logic> =
        [("D".into(), Logic::Zero), ("CLK".into(), Logic::Zero)].into();
    let stimulus = Stimulus::new()
        .set("D", 3, Logic::One)
        .set("CLK", 5, Logic::One)
        .set("D", 7, Logic::Zero)
        .set("CLK", 9, Logic::Zero)
        .set("CLK", 12, Logic::One);

    let w = simulate(&[], &dffs, &initial, &stimulus, SimTime::new(30)).unwrap();
    assert_eq!(w.get("Q").unwrap(), history(&[(0, 0), (7, 1), (14, 0)]).as_slice());
}

#[test]
fn simultaneous_clock_and_data_pop_in_name_order() {
    let initial: BTreeMap<String, Logic> = [
        ("A".into(), Logic::Zero),
        ("CLK".into(), Logic::Zero),
        ("D".into(), Logic::Zero),
    ]
    .into();
    let stimulus = Stimulus::new()
        .set("CLK", 5, Logic::One)
        .set("D", 5, Logic::One)
        .set("A", 5, Logic::One);
    let dffs = vec![
        // "CLK" < "D": the edge samples D before it rises.
        Dff::new("FF_D", "D", "CLK", "QD", 1),
        // "A" < "CLK": A has already risen when the edge is seen.
        Dff::new("FF_A", "A", "CLK", "QA", 1),
    ];

    let w = simulate(&[], &dffs, &initial, &stimulus, SimTime::new(20)).unwrap();
    assert_eq!(w.get("QD").unwrap(), history(&[(0, 0)]).as_slice());
    assert_eq!(w.get("QA").unwrap(), history(&[(0, 0), (6, 1)]).as_slice());
}

#[test]
fn horizon_is_inclusive() {
    let result = run_toml(
        r#"
[simulation]
end_time = 13

[signals]
A = 0
B = 1
X = 1

[[gate]]
name = "G1"
type = "XOR"
inputs = ["A", "B"]
output = "X"
delay = 3

[stimulus]
A = [[10, 1], [14, 0]]
"#,
    )
    .unwrap();
    let w = &result.waveforms;
    assert_eq!(points(w, "A").unwrap(), [(0, 0), (10, 1)]);
    assert_eq!(points(w, "X").unwrap(), [(0, 1), (13, 0)]);
    assert_eq!(result.stats.events_dropped, 1);
}

#[test]
fn waveforms_serialize_as_name_to_pairs() {
    let result = run_scenario("and_not").unwrap();
    let json = serde_json::to_value(result.waveforms.select(["X"])).unwrap();
    assert_eq!(json, serde_json::json!({ "X": [[0, 0], [13, 1], [23, 0]] }));
}
