use chrono::NaiveDate;
use rentcover_core::db::open_db_in_memory;
use rentcover_core::{
    AccountService, CatalogService, Claim, ClaimRequest, ClaimStatus, Contract, ContractRequest,
    LedgerConfig, LedgerQueries, LifecycleManager, NewContractType, NewItem, RepairOrder,
    RepoError, SequentialIds,
};
use rusqlite::Connection;

fn day(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

struct Scenario {
    alice_contract: Contract,
    bob_contract: Contract,
    approved: Claim,
    theft: Claim,
    order: RepairOrder,
}

/// Two users, two items, one contract each, plus claims in several states.
fn build(conn: &Connection, ids: &SequentialIds) -> Scenario {
    let accounts = AccountService::with_config(
        conn,
        LedgerConfig {
            min_password_len: 4,
            ..LedgerConfig::default()
        },
    )
    .unwrap();
    accounts
        .register_user("alice", "alice-pw", "Alice", "Liddell")
        .unwrap();
    accounts.register_user("bob", "bob-pw", "Bob", "Marley").unwrap();

    let catalog = CatalogService::with_parts(conn, ids, LedgerConfig::default()).unwrap();
    let product = catalog
        .create_contract_type(NewContractType {
            shop_type: "Camera".to_string(),
            formula_per_day: "price * 0.015".to_string(),
            max_sum_insured: 120_000,
            theft_insured: true,
            description: String::new(),
            conditions: String::new(),
            active: true,
            min_duration_days: 2,
            max_duration_days: 60,
        })
        .unwrap();
    let items = ["CAM-1", "CAM-2"].map(|serial_no| {
        catalog
            .register_item(&NewItem {
                brand: "Leica".to_string(),
                model: "Q3".to_string(),
                price: 590_000,
                description: String::new(),
                serial_no: serial_no.to_string(),
            })
            .unwrap()
    });

    let lifecycle = LifecycleManager::with_parts(conn, ids, LedgerConfig::default()).unwrap();
    let contract_for = |username: &str, item_id| {
        lifecycle
            .create_contract(&ContractRequest {
                username: username.to_string(),
                item_id,
                contract_type_id: product.id,
                start_date: day(3, 1),
                end_date: day(3, 31),
            })
            .unwrap()
    };
    let alice_contract = contract_for("alice", items[0].id);
    let bob_contract = contract_for("bob", items[1].id);

    let file = |contract_id, amount, is_theft| {
        lifecycle
            .file_claim(&ClaimRequest {
                contract_id,
                date: day(3, 10),
                description: "dropped on pavement".to_string(),
                is_theft,
                reimbursable_request: amount,
            })
            .unwrap()
    };
    let approved = file(alice_contract.id, 40_000, false);
    let _filed = file(alice_contract.id, 10_000, false);
    let theft = file(bob_contract.id, 590_000, true);

    lifecycle
        .transition_claim_status(approved.id, ClaimStatus::Approved)
        .unwrap();
    let order = lifecycle.open_repair_order(approved.id).unwrap();

    let queries = LedgerQueries::try_new(conn).unwrap();
    Scenario {
        alice_contract: queries.get_contract(alice_contract.id).unwrap(),
        bob_contract: queries.get_contract(bob_contract.id).unwrap(),
        approved: queries.get_claim(approved.id).unwrap(),
        theft: queries.get_claim(theft.id).unwrap(),
        order,
    }
}

#[test]
fn list_contracts_attaches_claims_in_filing_order() {
    let conn = open_db_in_memory().unwrap();
    let ids = SequentialIds::new();
    let scenario = build(&conn, &ids);
    let queries = LedgerQueries::try_new(&conn).unwrap();

    let alice = queries.list_contracts(Some("Alice")).unwrap();
    assert_eq!(alice.len(), 1);
    assert_eq!(alice[0].contract, scenario.alice_contract);
    let claim_ids: Vec<_> = alice[0].claims.iter().map(|claim| claim.id).collect();
    assert_eq!(claim_ids, scenario.alice_contract.claim_index);
    assert_eq!(claim_ids[0], scenario.approved.id);

    let all = queries.list_contracts(None).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[1].contract, scenario.bob_contract);
    assert_eq!(all[1].claims, vec![scenario.theft.clone()]);

    assert!(queries.list_contracts(Some("nobody")).unwrap().is_empty());
    assert!(matches!(
        queries.list_contracts(Some("?!")),
        Err(RepoError::Validation(_))
    ));
}

#[test]
fn list_claims_filters_by_status() {
    let conn = open_db_in_memory().unwrap();
    let ids = SequentialIds::new();
    let scenario = build(&conn, &ids);
    let queries = LedgerQueries::try_new(&conn).unwrap();

    assert_eq!(queries.list_claims(None).unwrap().len(), 3);
    assert_eq!(
        queries.list_claims(Some(ClaimStatus::Approved)).unwrap(),
        vec![scenario.approved.clone()]
    );
    assert_eq!(queries.list_claims(Some(ClaimStatus::Filed)).unwrap().len(), 2);
    assert!(queries
        .list_claims(Some(ClaimStatus::Paid))
        .unwrap()
        .is_empty());
}

#[test]
fn pending_theft_view_carries_item_and_holder() {
    let conn = open_db_in_memory().unwrap();
    let ids = SequentialIds::new();
    let scenario = build(&conn, &ids);
    let queries = LedgerQueries::try_new(&conn).unwrap();

    let pending = queries.list_pending_theft_claims().unwrap();
    assert_eq!(pending.len(), 1);
    let view = &pending[0];
    assert_eq!(view.claim, scenario.theft);
    assert_eq!(view.item.id, scenario.bob_contract.item_id);
    assert_eq!(view.username, "bob");
    assert_eq!(view.holder_name, "Bob Marley");
    assert_eq!(view.claim.reimbursable, 120_000);
}

#[test]
fn integrity_report_is_clean_after_service_writes() {
    let conn = open_db_in_memory().unwrap();
    let ids = SequentialIds::new();
    let scenario = build(&conn, &ids);
    let queries = LedgerQueries::try_new(&conn).unwrap();

    assert_eq!(
        queries.list_repair_orders(false).unwrap(),
        vec![scenario.order.clone()]
    );
    let report = queries.check_integrity().unwrap();
    assert!(report.is_clean(), "unexpected findings: {report:?}");
    assert_eq!(report.finding_count(), 0);
}

#[test]
fn integrity_report_flags_out_of_band_edits() {
    let conn = open_db_in_memory().unwrap();
    let ids = SequentialIds::new();
    let scenario = build(&conn, &ids);

    conn.execute(
        "UPDATE contracts SET claim_index = '[]' WHERE id = ?1;",
        [scenario.alice_contract.id.to_string()],
    )
    .unwrap();
    conn.execute("UPDATE users SET contract_index = '[]' WHERE username = 'bob';", [])
        .unwrap();
    conn.execute(
        "UPDATE claims SET status = 'approved', reimbursable = 500000 WHERE id = ?1;",
        [scenario.theft.id.to_string()],
    )
    .unwrap();
    conn.execute(
        "UPDATE repair_orders SET ready = 1 WHERE id = ?1;",
        [scenario.order.id.to_string()],
    )
    .unwrap();

    let report = LedgerQueries::try_new(&conn)
        .unwrap()
        .check_integrity()
        .unwrap();

    assert_eq!(report.claim_index_drift.len(), 1);
    let drift = &report.claim_index_drift[0];
    assert_eq!(drift.owner, scenario.alice_contract.id.to_string());
    assert_eq!(drift.missing.len(), 2);
    assert!(drift.unexpected.is_empty());

    assert_eq!(report.contract_index_drift.len(), 1);
    assert_eq!(report.contract_index_drift[0].owner, "bob");
    assert_eq!(
        report.contract_index_drift[0].missing,
        vec![scenario.bob_contract.id]
    );

    assert_eq!(report.coverage_overruns.len(), 1);
    assert_eq!(report.coverage_overruns[0].contract_id, scenario.bob_contract.id);
    assert_eq!(report.coverage_overruns[0].committed, 500_000);

    assert_eq!(report.repair_order_mismatches.len(), 1);
    assert_eq!(
        report.repair_order_mismatches[0].repair_order_id,
        scenario.order.id
    );
    assert_eq!(report.finding_count(), 4);
}
