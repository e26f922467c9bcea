//! Stakeholder analysis for the basic dashboard.

use chrono::NaiveDate;
use nickel_watch_core::{
    config::DashboardConfig,
    dataset::StakeholderTransaction,
    generator::{basic_stakeholders, DataSource, SeededSource},
    stakeholder::{stakeholder_risk, suspicious_by_person, timeline, type_distribution},
    types::{TransactionFlag, TransactionType},
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn txn(d: NaiveDate, person: &str, amount: u64, txn_type: TransactionType) -> StakeholderTransaction {
    StakeholderTransaction {
        date: d,
        person: person.into(),
        amount,
        txn_type,
        flag: if amount > 300_000 { TransactionFlag::Suspicious } else { TransactionFlag::Normal },
    }
}

/// 20 points per suspicious transaction, 30 more for an official role.
#[test]
fn risk_scores_for_reference_stakeholders() {
    let rows = stakeholder_risk(&basic_stakeholders());
    let ranked: Vec<(&str, u32)> = rows.iter().map(|r| (r.name.as_str(), r.risk_score)).collect();
    assert_eq!(
        ranked,
        vec![
            ("Jane Smith", 130),
            ("Maria Garcia", 90),
            ("Budi Santoso", 80),
            ("John Doe", 40),
            ("Ali Wong", 20),
            ("Robert Johnson", 0),
        ]
    );
}

#[test]
fn suspicious_counts_are_per_person_and_alphabetical() {
    let txns = vec![
        txn(date(2022, 1, 2), "Jane Smith", 400_000, TransactionType::CashDeposit),
        txn(date(2022, 1, 9), "Jane Smith", 350_000, TransactionType::EWallet),
        txn(date(2022, 1, 9), "Ali Wong", 310_000, TransactionType::BankTransfer),
        txn(date(2022, 1, 16), "Ali Wong", 300_000, TransactionType::BankTransfer),
        txn(date(2022, 1, 16), "John Doe", 10_000, TransactionType::BankTransfer),
    ];
    assert_eq!(
        suspicious_by_person(&txns),
        vec![("Ali Wong".to_string(), 1), ("Jane Smith".to_string(), 2)]
    );
}

#[test]
fn timeline_sums_per_date_and_person() {
    let txns = vec![
        txn(date(2022, 1, 9), "Jane Smith", 100, TransactionType::EWallet),
        txn(date(2022, 1, 2), "Jane Smith", 50, TransactionType::CashDeposit),
        txn(date(2022, 1, 2), "Jane Smith", 25, TransactionType::BankTransfer),
        txn(date(2022, 1, 2), "Ali Wong", 10, TransactionType::BankTransfer),
    ];
    let points: Vec<(NaiveDate, String, u64)> =
        timeline(&txns).into_iter().map(|p| (p.date, p.person, p.amount)).collect();
    assert_eq!(
        points,
        vec![
            (date(2022, 1, 2), "Ali Wong".to_string(), 10),
            (date(2022, 1, 2), "Jane Smith".to_string(), 75),
            (date(2022, 1, 9), "Jane Smith".to_string(), 100),
        ]
    );
}

#[test]
fn type_shares_cover_the_total() {
    let txns = vec![
        txn(date(2022, 1, 2), "John Doe", 300, TransactionType::BankTransfer),
        txn(date(2022, 1, 2), "Ali Wong", 100, TransactionType::CashDeposit),
        txn(date(2022, 1, 9), "Ali Wong", 600, TransactionType::BankTransfer),
    ];
    let shares = type_distribution(&txns);
    assert_eq!(shares.len(), 2, "types with no volume are left out");
    assert_eq!(shares[0].txn_type, TransactionType::BankTransfer);
    assert_eq!(shares[0].amount, 900);
    assert!((shares[0].percent - 90.0).abs() < 1e-9);
    assert!((shares[1].percent - 10.0).abs() < 1e-9);
    assert!(type_distribution(&[]).is_empty());
}

/// Weekly stakeholder activity: flagged exactly when the amount exceeds
/// the threshold, amounts in range, only domestic channels.
#[test]
fn generated_stakeholder_transactions_follow_flag_rule() {
    let config = DashboardConfig::default_test();
    let data = SeededSource.generate(&config).expect("generate");
    let txns = &data.basic.transactions;
    assert!(!txns.is_empty());

    let names: Vec<String> = basic_stakeholders().into_iter().map(|s| s.name).collect();
    for t in txns {
        let expected = if t.amount > config.transactions.basic_flag_amount {
            TransactionFlag::Suspicious
        } else {
            TransactionFlag::Normal
        };
        assert_eq!(t.flag, expected, "{} on {}: {}", t.person, t.date, t.amount);
        assert!((5_000..500_000).contains(&t.amount));
        assert!(TransactionType::DOMESTIC.contains(&t.txn_type));
        assert!(names.contains(&t.person));
    }

    let shares: f64 = type_distribution(txns).iter().map(|s| s.percent).sum();
    assert!((shares - 100.0).abs() < 1e-9);

    let counted: usize = suspicious_by_person(txns).iter().map(|(_, n)| n).sum();
    let flagged = txns.iter().filter(|t| t.flag == TransactionFlag::Suspicious).count();
    assert_eq!(counted, flagged);

    let summed: u64 = timeline(txns).iter().map(|p| p.amount).sum();
    assert_eq!(summed, txns.iter().map(|t| t.amount).sum::<u64>());
}
