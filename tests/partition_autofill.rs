use std::collections::BTreeSet;

use rand::{rngs::StdRng, SeedableRng};

use rydercup_lineup::{
    core::partition::{auto_fill, validate_manual_assignment, Violation},
    fairness::score_default,
    roster::{MatchSlot, Player, SessionFormat},
    types::{FormatKind, PlayerId, Side},
};

fn roster(side: Side, first_id: u64, n: u64) -> Vec<Player> {
    (0..n)
        .map(|i| {
            let id = first_id + i;
            Player::new(id, "Player", format!("{id}"), 4.0 + i as f64, side)
        })
        .collect()
}

fn all_players(a: &[Player], b: &[Player]) -> Vec<Player> {
    a.iter().chain(b).cloned().collect()
}

fn placed(slots: &[MatchSlot], side: Side) -> Vec<PlayerId> {
    slots.iter().flat_map(|s| s.players(side).iter().copied()).collect()
}

#[test]
fn fourball_with_eight_a_side_fills_every_slot() {
    let format = SessionFormat::new(FormatKind::Fourball, 2, 4, 1.0);
    let a = roster(Side::A, 1, 8);
    let b = roster(Side::B, 101, 8);
    let mut rng = StdRng::seed_from_u64(1);

    let slots = auto_fill(&a, &b, &format, &mut rng);

    assert_eq!(slots.len(), 4);
    for (i, slot) in slots.iter().enumerate() {
        assert_eq!(slot.order, i as u32 + 1);
        assert_eq!(slot.side_a.len(), 2);
        assert_eq!(slot.side_b.len(), 2);
        assert!(slot.is_complete(&format));
    }

    let fairness = score_default(&slots, &all_players(&a, &b), &format, None);
    assert_eq!(fairness.incomplete_count(), 0);
    assert!(fairness.overall.is_some());

    let report = validate_manual_assignment(&slots, &format);
    assert!(report.valid, "violations: {:?}", report.violations);
}

#[test]
fn surplus_players_leave_every_slot_complete_and_no_one_double_booked() {
    let format = SessionFormat::new(FormatKind::Foursomes, 2, 3, 1.0);
    let a = roster(Side::A, 1, 10);
    let b = roster(Side::B, 101, 7);

    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let slots = auto_fill(&a, &b, &format, &mut rng);
        assert!(slots.iter().all(|s| s.is_complete(&format)));

        for side in Side::BOTH {
            let ids = placed(&slots, side);
            let unique: BTreeSet<_> = ids.iter().copied().collect();
            assert_eq!(ids.len(), 6);
            assert_eq!(unique.len(), ids.len());
        }
    }
}

#[test]
fn one_short_on_side_a_leaves_exactly_one_partial_slot() {
    let format = SessionFormat::new(FormatKind::Fourball, 2, 4, 1.0);
    let a = roster(Side::A, 1, 7);
    let b = roster(Side::B, 101, 8);
    let mut rng = StdRng::seed_from_u64(9);

    let slots = auto_fill(&a, &b, &format, &mut rng);

    let partial: Vec<&MatchSlot> = slots.iter().filter(|s| !s.is_complete(&format)).collect();
    assert_eq!(partial.len(), 1);
    assert_eq!(partial[0].side_a.len(), 1);
    assert_eq!(partial[0].side_b.len(), 2);

    let fairness = score_default(&slots, &all_players(&a, &b), &format, None);
    assert_eq!(fairness.incomplete_count(), 1);
    let message = fairness
        .warning_messages()
        .into_iter()
        .find(|m| m.contains("incomplete"))
        .expect("incomplete warning");
    assert_eq!(
        message,
        format!("Slot {} incomplete: missing 1 player(s) on side A", partial[0].order)
    );
}

#[test]
fn singles_with_ten_a_side_leaves_two_empty_slots() {
    let format = SessionFormat::for_kind(FormatKind::Singles);
    assert_eq!(format.match_count, 12);
    let a = roster(Side::A, 1, 10);
    let b = roster(Side::B, 101, 10);
    let mut rng = StdRng::seed_from_u64(3);

    let slots = auto_fill(&a, &b, &format, &mut rng);

    assert_eq!(slots.len(), 12);
    assert_eq!(slots.iter().filter(|s| s.is_complete(&format)).count(), 10);
    assert_eq!(slots.iter().filter(|s| s.is_empty()).count(), 2);

    let fairness = score_default(&slots, &all_players(&a, &b), &format, None);
    assert_eq!(fairness.incomplete_count(), 2);
}

#[test]
fn shuffle_reaches_different_pairings() {
    let format = SessionFormat::new(FormatKind::Singles, 1, 6, 1.0);
    let a = roster(Side::A, 1, 6);
    let b = roster(Side::B, 101, 6);

    let mut seen = BTreeSet::new();
    for seed in 0..30 {
        let mut rng = StdRng::seed_from_u64(seed);
        let slots = auto_fill(&a, &b, &format, &mut rng);
        seen.insert(placed(&slots, Side::A));
    }
    assert!(seen.len() > 1);
}

#[test]
fn validation_reports_wrong_slot_count() {
    let format = SessionFormat::new(FormatKind::Singles, 1, 3, 1.0);
    let slots = vec![MatchSlot {
        slot_id: 1,
        order: 1,
        side_a: vec![1],
        side_b: vec![101],
    }];

    let report = validate_manual_assignment(&slots, &format);
    assert!(!report.valid);
    assert_eq!(report.violations, vec![Violation::SlotCount { found: 1, expected: 3 }]);
}

#[test]
fn validation_accepts_partial_slots() {
    let format = SessionFormat::new(FormatKind::Fourball, 2, 2, 1.0);
    let slots = vec![
        MatchSlot {
            slot_id: 1,
            order: 1,
            side_a: vec![1],
            side_b: vec![],
        },
        MatchSlot::empty(2, 2),
    ];
    assert!(validate_manual_assignment(&slots, &format).valid);
}
