use proptest::prelude::*;
use proptest::test_runner::Config;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use tally::engine::{
    compute_balances, normalize, plan, EngineError, InvalidSplitReason, SettlementPlanner, SplitShares,
};
use tally::models::{Expense, GroupId, MemberId, Money, Percentage, SplitMethod};

fn roster(n: usize) -> Vec<MemberId> {
    let mut members: Vec<MemberId> = (0..n).map(|_| MemberId::new()).collect();
    members.sort();
    members
}

/// Percentages that add up to exactly 100%, built from cut points
fn percentages(cuts: &[u32]) -> Vec<Percentage> {
    let mut points: Vec<u32> = cuts.to_vec();
    points.push(0);
    points.push(10_000);
    points.sort_unstable();
    points
        .windows(2)
        .map(|w| Percentage::from_basis_points(w[1] - w[0]))
        .collect()
}

/// One generated expense: payer index, cents, participant mask and a
/// repayment selector per roster slot
type RawExpense = (usize, i64, u16, Vec<u16>);

/// Expenses from raw tuples. A selector of zero leaves the split open, one
/// that is a multiple of 7 marks it paid, anything else repays that fraction
/// of `u16::MAX` of the split. The payer's own split is never repaid.
fn build_expenses(members: &[MemberId], raw: &[RawExpense]) -> Vec<Expense> {
    let group = GroupId::new();
    raw.iter()
        .map(|(payer, cents, mask, repaid)| {
            let payer = members[payer % members.len()];
            let mut participants: Vec<MemberId> = members
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1u16 << *i) != 0)
                .map(|(_, m)| *m)
                .collect();
            if participants.is_empty() {
                participants.push(payer);
            }
            let amount = Money::from_cents(*cents);
            let splits = normalize(amount, members, &SplitShares::Equal(participants)).expect("split");
            let mut expense = Expense::new(group, payer, amount, "generated", SplitMethod::Equal, splits);

            for (split, selector) in expense.splits.iter_mut().zip(repaid) {
                if split.member_id == payer || *selector == 0 {
                    continue;
                }
                if selector % 7 == 0 {
                    split.mark_paid();
                    continue;
                }
                let part = split.amount.cents() * i64::from(*selector) / i64::from(u16::MAX);
                if part > 0 {
                    split.record_payment(Money::from_cents(part)).expect("repayment");
                }
            }
            expense
        })
        .collect()
}

fn expense_inputs() -> impl Strategy<Value = (usize, Vec<RawExpense>)> {
    (2usize..9).prop_flat_map(|n| {
        (
            Just(n),
            prop::collection::vec(
                (
                    0..n,
                    1i64..1_000_000,
                    any::<u16>(),
                    prop::collection::vec(any::<u16>(), n),
                ),
                0..24,
            ),
        )
    })
}

/// Roster with the given shares plus one member holding 0%
fn percentage_shares(pcts: Vec<Percentage>) -> (Vec<MemberId>, SplitShares) {
    let members = roster(pcts.len() + 1);
    let shares = members
        .iter()
        .copied()
        .zip(pcts.into_iter().chain(std::iter::once(Percentage::from_basis_points(0))))
        .collect();
    (members, SplitShares::Percentage(shares))
}

/// Shift the first share that can absorb `delta` basis points
fn nudge(mut pcts: Vec<Percentage>, delta: i32) -> Vec<Percentage> {
    if let Some(pct) = pcts
        .iter_mut()
        .find(|p| i64::from(p.basis_points()) + i64::from(delta) >= 0)
    {
        let bp = i64::from(pct.basis_points()) + i64::from(delta);
        *pct = Percentage::from_basis_points(bp as u32);
    }
    pcts
}

proptest! {
    #![proptest_config(Config::with_cases(128))]

    #[test]
    fn equal_split_sums_to_amount(cents in 1i64..10_000_000_000, n in 1usize..16) {
        let members = roster(n);
        let splits = normalize(Money::from_cents(cents), &members, &SplitShares::equal_all()).expect("split");

        let total: i64 = splits.iter().map(|s| s.amount.cents()).sum();
        prop_assert_eq!(total, cents);

        let max = splits.iter().map(|s| s.amount.cents()).max().unwrap_or(0);
        let min = splits.iter().map(|s| s.amount.cents()).min().unwrap_or(0);
        prop_assert!(max - min <= 1);
    }

    #[test]
    fn percentage_split_sums_to_amount(
        cents in 1i64..10_000_000_000,
        cuts in prop::collection::vec(0u32..=10_000, 0..10)
    ) {
        let pcts = percentages(&cuts);
        let members = roster(pcts.len());
        let shares = SplitShares::Percentage(members.iter().copied().zip(pcts).collect());

        let splits = normalize(Money::from_cents(cents), &members, &shares).expect("split");
        let total: i64 = splits.iter().map(|s| s.amount.cents()).sum();
        prop_assert_eq!(total, cents);
        prop_assert!(splits.iter().all(|s| s.amount.cents() >= 0));
    }

    #[test]
    fn percentage_split_within_tolerance_sums_to_amount(
        cents in 1i64..10_000_000_000,
        cuts in prop::collection::vec(0u32..=10_000, 0..10),
        delta in prop_oneof![Just(-1i32), Just(1i32)]
    ) {
        let pcts = nudge(percentages(&cuts), delta);
        let (members, shares) = percentage_shares(pcts);

        let splits = normalize(Money::from_cents(cents), &members, &shares).expect("split");
        let total: i64 = splits.iter().map(|s| s.amount.cents()).sum();
        prop_assert_eq!(total, cents);
        prop_assert!(splits.iter().all(|s| s.amount.cents() >= 0));

        let zero_share = splits.last().expect("zero share");
        prop_assert!(zero_share.amount.is_zero());
    }

    #[test]
    fn percentage_split_outside_tolerance_fails(
        cents in 1i64..10_000_000_000,
        cuts in prop::collection::vec(0u32..=10_000, 0..10)
    ) {
        let pcts = nudge(percentages(&cuts), 2);
        let (members, shares) = percentage_shares(pcts);

        prop_assert_eq!(
            normalize(Money::from_cents(cents), &members, &shares),
            Err(EngineError::InvalidSplit(InvalidSplitReason::PercentageSum(
                Percentage::from_basis_points(10_002)
            )))
        );
    }

    #[test]
    fn fixed_split_mismatch_fails(
        cents in 1i64..1_000_000,
        shares in prop::collection::vec(0i64..1_000_000, 1..6)
    ) {
        let members = roster(shares.len());
        let total: i64 = shares.iter().sum();
        let fixed = SplitShares::Fixed(
            members.iter().copied().zip(shares.into_iter().map(Money::from_cents)).collect(),
        );

        let result = normalize(Money::from_cents(cents), &members, &fixed);
        prop_assert_eq!(result.is_ok(), total == cents);
    }

    #[test]
    fn balances_are_conserved((n, raw) in expense_inputs()) {
        let members = roster(n);
        let expenses = build_expenses(&members, &raw);

        let balances = compute_balances(&members, &expenses).expect("balances");
        prop_assert!(balances.total().is_zero());
        prop_assert_eq!(balances.len(), n);

        let fronted: i64 = expenses.iter().map(|e| e.outstanding_total().cents()).sum();
        let credited: i64 = balances
            .iter()
            .map(|(_, b)| b.cents())
            .filter(|b| *b > 0)
            .sum();
        prop_assert!(credited <= fronted);
    }

    #[test]
    fn balances_ignore_expense_order((n, raw) in expense_inputs(), seed in any::<u64>()) {
        let members = roster(n);
        let expenses = build_expenses(&members, &raw);
        let mut shuffled = expenses.clone();
        shuffled.shuffle(&mut StdRng::seed_from_u64(seed));

        let original = compute_balances(&members, &expenses).expect("balances");
        let reordered = compute_balances(&members, &shuffled).expect("balances");
        prop_assert_eq!(original, reordered);
    }

    #[test]
    fn plan_settles_every_balance((n, raw) in expense_inputs()) {
        let members = roster(n);
        let expenses = build_expenses(&members, &raw);
        let balances = compute_balances(&members, &expenses).expect("balances");

        let greedy = plan(&balances).expect("plan");
        let exact = SettlementPlanner::with_exact_search_limit(12).plan(&balances).expect("plan");

        for transfers in [&greedy, &exact] {
            let mut settled = balances.clone();
            for transfer in transfers.iter() {
                prop_assert!(transfer.amount.is_positive());
                prop_assert_ne!(transfer.from, transfer.to);
                settled.apply(transfer);
            }
            prop_assert!(settled.is_settled());

            let nonzero = balances.nonzero().count();
            prop_assert!(transfers.len() <= nonzero.saturating_sub(1));
        }
        prop_assert!(exact.len() <= greedy.len());
    }

    #[test]
    fn plan_is_deterministic((n, raw) in expense_inputs()) {
        let members = roster(n);
        let expenses = build_expenses(&members, &raw);
        let balances = compute_balances(&members, &expenses).expect("balances");

        prop_assert_eq!(plan(&balances).expect("plan"), plan(&balances).expect("plan"));
    }
}

#[test]
fn one_payer_three_members() {
    let members = roster(3);
    let amount = Money::from_cents(9000);
    let splits = normalize(amount, &members, &SplitShares::equal_all()).unwrap();
    let expense = Expense::new(GroupId::new(), members[0], amount, "Dinner", SplitMethod::Equal, splits);

    let balances = compute_balances(&members, [&expense]).unwrap();
    assert_eq!(balances.get(members[0]), Money::from_cents(6000));
    assert_eq!(balances.get(members[1]), Money::from_cents(-3000));
    assert_eq!(balances.get(members[2]), Money::from_cents(-3000));

    let transfers = plan(&balances).unwrap();
    assert_eq!(transfers.len(), 2);
    assert!(transfers.iter().all(|t| t.to == members[0] && t.amount == Money::from_cents(3000)));
}
