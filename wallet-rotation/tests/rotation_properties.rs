//! Bootstrap, rotation and settlement counting against the in-memory pool,
//! plus properties over random settle/rotate sequences.

use proptest::prelude::*;
use std::sync::Arc;
use wallet_core::{RotationConfig, WalletError};
use wallet_rotation::{RotationEngine, RotationOutcome, SettlementHook};
use wallet_storage::{IdentifierStore, InMemoryIdentifierStore};
use wallet_test_utils::assertions::{assert_pool_empty, assert_single_active};
use wallet_test_utils::fixtures::{populated_pool, populated_pool_with_cap, settle_times};

fn engine_for(store: &InMemoryIdentifierStore) -> RotationEngine {
    RotationEngine::new(Arc::new(store.clone()), RotationConfig::default())
}

#[tokio::test]
async fn bootstrap_activates_lowest_position_exactly_once() {
    let store = populated_pool(3).await;
    let engine = engine_for(&store);

    let first = engine.get_active_or_bootstrap().await.unwrap();
    assert_eq!(first.position, 1);
    assert_eq!(first.successful_payments, 0);

    let again = engine.get_active_or_bootstrap().await.unwrap();
    assert_eq!(again.id, first.id);
    let pool = store.identifier_list().await.unwrap();
    assert_eq!(assert_single_active(&pool).id, first.id);
}

#[tokio::test]
async fn bootstrap_on_empty_pool_is_pool_empty() {
    let store = InMemoryIdentifierStore::new();
    let engine = engine_for(&store);
    assert_pool_empty(&engine.get_active_or_bootstrap().await);
}

#[tokio::test]
async fn rotation_wraps_from_last_to_first() {
    let store = populated_pool(3).await;
    let engine = engine_for(&store);
    engine.get_active_or_bootstrap().await.unwrap();
    engine.rotate().await.unwrap();
    let third = engine.rotate().await.unwrap().unwrap();
    assert_eq!(third.position, 3);

    let wrapped = engine.rotate().await.unwrap().unwrap();
    assert_eq!(wrapped.position, 1);
    assert_eq!(wrapped.successful_payments, 0);
    let pool = store.identifier_list().await.unwrap();
    assert_eq!(assert_single_active(&pool).position, 1);
}

#[tokio::test]
async fn single_identifier_pool_reactivates_itself_with_reset_counter() {
    let store = populated_pool(1).await;
    let engine = engine_for(&store);
    let only = engine.get_active_or_bootstrap().await.unwrap();
    settle_times(&store, only.id, 4).await;

    let rotated = engine.rotate().await.unwrap().unwrap();
    assert_eq!(rotated.id, only.id);
    assert!(rotated.active);
    assert_eq!(rotated.successful_payments, 0);
}

#[tokio::test]
async fn settlement_at_cap_rotates_once_to_fresh_successor() {
    let store = populated_pool(3).await;
    let engine = engine_for(&store);
    let hook = SettlementHook::new(engine.clone());
    let first = engine.get_active_or_bootstrap().await.unwrap();
    settle_times(&store, first.id, 9).await;

    let outcome = hook.on_recharge_settled(first.id).await.unwrap();
    assert_eq!(outcome.identifier.successful_payments, 10);
    match outcome.rotation {
        Some(RotationOutcome::Rotated { from, to }) => {
            assert_eq!(from.id, first.id);
            assert_eq!(to.position, 2);
            assert_eq!(to.successful_payments, 0);
        }
        other => panic!("expected a rotation, got {:?}", other),
    }

    let pool = store.identifier_list().await.unwrap();
    assert_eq!(assert_single_active(&pool).position, 2);
}

#[tokio::test]
async fn settlement_below_cap_does_not_rotate() {
    let store = populated_pool(3).await;
    let engine = engine_for(&store);
    let hook = SettlementHook::new(engine.clone());
    let first = engine.get_active_or_bootstrap().await.unwrap();
    settle_times(&store, first.id, 5).await;

    let outcome = hook.on_recharge_settled(first.id).await.unwrap();
    assert_eq!(outcome.identifier.successful_payments, 6);
    assert!(outcome.rotation.is_none());
    assert!(!outcome.rotated());

    let active = store.identifier_get_active().await.unwrap().unwrap();
    assert_eq!(active.id, first.id);
}

#[tokio::test]
async fn settlement_on_inactive_identifier_only_counts() {
    let store = populated_pool_with_cap(2, 1).await;
    let engine = engine_for(&store);
    let hook = SettlementHook::new(engine.clone());
    engine.get_active_or_bootstrap().await.unwrap();
    let second = store.identifier_list().await.unwrap()[1].clone();

    let outcome = hook.on_recharge_settled(second.id).await.unwrap();
    assert_eq!(outcome.identifier.successful_payments, 1);
    assert!(outcome.rotation.is_none());
    let active = store.identifier_get_active().await.unwrap().unwrap();
    assert_eq!(active.position, 1);
}

#[tokio::test]
async fn settlement_for_removed_identifier_is_not_found() {
    let store = populated_pool(2).await;
    let engine = engine_for(&store);
    let hook = SettlementHook::new(engine.clone());
    let gone = store.identifier_list().await.unwrap()[1].clone();
    store.identifier_remove(gone.id).await.unwrap();

    let err = hook.on_recharge_settled(gone.id).await.unwrap_err();
    assert!(matches!(
        err,
        WalletError::Pool(wallet_core::PoolError::NotFound { .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cap_crossing_settlements_rotate_exactly_once() {
    for _ in 0..20 {
        let store = populated_pool(3).await;
        let engine = engine_for(&store);
        let hook = SettlementHook::new(engine.clone());
        let first = engine.get_active_or_bootstrap().await.unwrap();
        settle_times(&store, first.id, 9).await;

        let a = tokio::spawn({
            let hook = hook.clone();
            async move { hook.on_recharge_settled(first.id).await }
        });
        let b = tokio::spawn({
            let hook = hook.clone();
            async move { hook.on_recharge_settled(first.id).await }
        });
        let outcomes = [a.await.unwrap().unwrap(), b.await.unwrap().unwrap()];

        let rotations = outcomes.iter().filter(|o| o.rotated()).count();
        assert_eq!(rotations, 1, "outcomes: {:?}", outcomes);

        let pool = store.identifier_list().await.unwrap();
        let active = assert_single_active(&pool);
        assert_eq!(active.position, 2);
        assert_eq!(active.successful_payments, 0);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cap_crossing_on_single_identifier_rotates_once() {
    for _ in 0..20 {
        let store = populated_pool(1).await;
        let engine = engine_for(&store);
        let hook = SettlementHook::new(engine.clone());
        let only = engine.get_active_or_bootstrap().await.unwrap();
        settle_times(&store, only.id, 9).await;

        let a = tokio::spawn({
            let hook = hook.clone();
            async move { hook.on_recharge_settled(only.id).await }
        });
        let b = tokio::spawn({
            let hook = hook.clone();
            async move { hook.on_recharge_settled(only.id).await }
        });
        let outcomes = [a.await.unwrap().unwrap(), b.await.unwrap().unwrap()];
        assert_eq!(
            outcomes.iter().filter(|o| o.rotated()).count(),
            1,
            "outcomes: {:?}",
            outcomes
        );

        // Either both settlements landed before the rotation (count reset to
        // 0) or the second one landed on the fresh cycle (count 1).
        let pool = store.identifier_list().await.unwrap();
        assert!(assert_single_active(&pool).successful_payments <= 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_manual_rotations_advance_once() {
    for _ in 0..20 {
        let store = populated_pool(3).await;
        let engine = engine_for(&store);
        let first = engine.get_active_or_bootstrap().await.unwrap();

        let a = tokio::spawn({
            let engine = engine.clone();
            async move { engine.rotate_from(first.id).await }
        });
        let b = tokio::spawn({
            let engine = engine.clone();
            async move { engine.rotate_from(first.id).await }
        });
        let outcomes = [a.await.unwrap().unwrap(), b.await.unwrap().unwrap()];
        assert_eq!(outcomes.iter().filter(|o| o.rotated()).count(), 1);

        let pool = store.identifier_list().await.unwrap();
        assert_eq!(assert_single_active(&pool).position, 2);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_bootstraps_converge_on_one_identifier() {
    for _ in 0..20 {
        let store = populated_pool(4).await;
        let engine = engine_for(&store);

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let engine = engine.clone();
            tasks.push(tokio::spawn(async move {
                engine.get_active_or_bootstrap().await
            }));
        }
        let mut ids = Vec::new();
        for task in tasks {
            ids.push(task.await.unwrap().unwrap().id);
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);

        let pool = store.identifier_list().await.unwrap();
        assert_eq!(assert_single_active(&pool).position, 1);
    }
}

#[tokio::test]
async fn full_cycle_of_settlements_visits_every_identifier() {
    let store = populated_pool_with_cap(3, 2).await;
    let engine = engine_for(&store);
    let hook = SettlementHook::new(engine.clone());

    let mut visited = Vec::new();
    for _ in 0..3 {
        let active = engine.get_active_or_bootstrap().await.unwrap();
        visited.push(active.position);
        hook.on_recharge_settled(active.id).await.unwrap();
        hook.on_recharge_settled(active.id).await.unwrap();
    }
    assert_eq!(visited, vec![1, 2, 3]);
    let back = engine.get_active_or_bootstrap().await.unwrap();
    assert_eq!(back.position, 1);
}

// ============================================================================
// PROPERTIES
// ============================================================================

#[derive(Debug, Clone)]
enum PoolStep {
    /// Settle a recharge routed to the active identifier
    SettleActive,
    /// Settle a late recharge routed to the identifier at this index
    SettleAt(usize),
    /// Operator rotation
    Rotate,
}

fn step_strategy() -> impl Strategy<Value = PoolStep> {
    prop_oneof![
        6 => Just(PoolStep::SettleActive),
        2 => (0usize..5).prop_map(PoolStep::SettleAt),
        1 => Just(PoolStep::Rotate),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Sequential settlements rotate exactly when the active identifier
    /// reaches its cap, the active identifier is never left at its cap, and
    /// exactly one identifier is active throughout.
    #[test]
    fn prop_settlements_keep_single_active_below_cap(
        size in 1usize..5,
        cap in 1i32..4,
        steps in prop::collection::vec(step_strategy(), 1..60),
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        runtime.block_on(async {
            let store = populated_pool_with_cap(size, cap).await;
            let engine = engine_for(&store);
            let hook = SettlementHook::new(engine.clone());
            engine.get_active_or_bootstrap().await.unwrap();

            for step in steps {
                let pool = store.identifier_list().await.unwrap();
                let active = assert_single_active(&pool).clone();
                match step {
                    PoolStep::SettleActive => {
                        let outcome = hook.on_recharge_settled(active.id).await.unwrap();
                        let due = active.successful_payments + 1 >= cap;
                        prop_assert_eq!(outcome.rotated(), due);
                    }
                    PoolStep::SettleAt(index) => {
                        let target = pool[index % pool.len()].clone();
                        let outcome = hook.on_recharge_settled(target.id).await.unwrap();
                        if target.id != active.id {
                            prop_assert!(outcome.rotation.is_none());
                        }
                    }
                    PoolStep::Rotate => {
                        prop_assert!(engine.rotate().await.unwrap().is_some());
                    }
                }

                let pool = store.identifier_list().await.unwrap();
                let now_active = assert_single_active(&pool);
                prop_assert!(now_active.successful_payments < cap);
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
