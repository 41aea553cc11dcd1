//! Bill workflow tests against the in-memory store

use async_trait::async_trait;
use callbill_core::{
    models::{BandRate, BillingPeriod, CallRecord, PricedCall, TariffSchedule},
    traits::{BillRepository, PricedCallRepository, Repository},
    AppError, AppResult,
};
use callbill_db::MemoryStore;
use callbill_services::{BillAggregator, TariffPricer};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal_macros::dec;
use std::sync::Arc;

const SUBSCRIBER: &str = "99988526423";
const OTHER_SUBSCRIBER: &str = "11999999999";
const DESTINATION: &str = "9993468278";

fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, s)
        .unwrap()
}

fn december() -> BillingPeriod {
    "12/2017".parse().unwrap()
}

async fn save_call(
    store: &MemoryStore,
    call_id: i64,
    origin: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
) {
    store
        .save(&CallRecord::start(call_id, start, origin, DESTINATION))
        .await
        .unwrap();
    store.save(&CallRecord::end(call_id, end)).await.unwrap();
}

/// Ten paired calls for the subscriber plus records that must not be billed
async fn seed_december(store: &MemoryStore) {
    let calls = [
        (70, at(2017, 12, 12, 15, 7, 13), at(2017, 12, 12, 15, 14, 56)),
        (71, at(2017, 12, 12, 22, 47, 56), at(2017, 12, 12, 22, 50, 56)),
        (72, at(2017, 12, 12, 21, 57, 13), at(2017, 12, 12, 22, 10, 56)),
        (73, at(2017, 12, 12, 4, 57, 13), at(2017, 12, 12, 6, 10, 56)),
        (74, at(2017, 12, 12, 21, 57, 13), at(2017, 12, 13, 22, 10, 56)),
        (75, at(2017, 12, 12, 15, 7, 58), at(2017, 12, 12, 15, 12, 56)),
        (76, at(2017, 12, 18, 12, 1, 45), at(2017, 12, 18, 12, 2, 45)),
        (77, at(2017, 12, 25, 19, 56, 23), at(2017, 12, 25, 22, 0, 0)),
        (78, at(2017, 12, 27, 20, 15, 55), at(2017, 12, 27, 22, 1, 55)),
        (79, at(2017, 12, 30, 5, 30, 4), at(2017, 12, 30, 6, 30, 26)),
    ];
    for (call_id, start, end) in calls {
        save_call(store, call_id, SUBSCRIBER, start, end).await;
    }

    // End without a start
    store
        .save(&CallRecord::end(80, at(2017, 12, 15, 10, 0, 0)))
        .await
        .unwrap();

    // Another subscriber's call
    save_call(
        store,
        81,
        OTHER_SUBSCRIBER,
        at(2017, 12, 20, 10, 0, 0),
        at(2017, 12, 20, 10, 30, 0),
    )
    .await;

    // Ends in January
    save_call(
        store,
        82,
        SUBSCRIBER,
        at(2017, 12, 31, 23, 50, 0),
        at(2018, 1, 1, 0, 10, 0),
    )
    .await;
}

fn aggregator(
    store: &Arc<MemoryStore>,
    pricer: TariffPricer,
) -> BillAggregator<MemoryStore, MemoryStore, MemoryStore> {
    BillAggregator::new(
        Arc::clone(store),
        Arc::clone(store),
        Arc::clone(store),
        Arc::new(pricer),
    )
}

#[tokio::test]
async fn test_december_batch_total() {
    let store = Arc::new(MemoryStore::new());
    seed_december(&store).await;

    let bill = aggregator(&store, TariffPricer::default())
        .build(SUBSCRIBER, december())
        .await
        .unwrap();

    assert_eq!(bill.calls().len(), 10);
    assert_eq!(bill.total(), dec!(115.65));

    let price_of = |call_id: i64| {
        bill.calls()
            .iter()
            .find(|c| c.call_identifier == call_id)
            .map(|c| c.price)
    };
    assert_eq!(price_of(74), Some(dec!(86.94)));
    assert_eq!(price_of(79), Some(dec!(3.15)));
    assert_eq!(price_of(80), None);
    assert_eq!(price_of(81), None);
    assert_eq!(price_of(82), None);
}

#[tokio::test]
async fn test_calls_follow_end_record_order() {
    let store = Arc::new(MemoryStore::new());
    seed_december(&store).await;

    let bill = aggregator(&store, TariffPricer::default())
        .build(SUBSCRIBER, december())
        .await
        .unwrap();

    let ends: Vec<NaiveDateTime> = bill.calls().iter().map(|c| c.call_end).collect();
    let mut sorted = ends.clone();
    sorted.sort();
    assert_eq!(ends, sorted);
    assert_eq!(bill.calls()[0].call_identifier, 73);
}

#[tokio::test]
async fn test_call_is_billed_in_month_of_its_end() {
    let store = Arc::new(MemoryStore::new());
    save_call(
        &store,
        83,
        SUBSCRIBER,
        at(2017, 11, 30, 23, 58, 0),
        at(2017, 12, 1, 0, 2, 30),
    )
    .await;

    let aggregator = aggregator(&store, TariffPricer::default());
    let november = aggregator
        .build(SUBSCRIBER, "11/2017".parse().unwrap())
        .await
        .unwrap();
    let december = aggregator.build(SUBSCRIBER, december()).await.unwrap();

    assert!(november.is_empty());
    assert_eq!(december.calls().len(), 1);
    assert_eq!(december.total(), dec!(0.36));
}

#[tokio::test]
async fn test_empty_period() {
    let store = Arc::new(MemoryStore::new());
    seed_december(&store).await;

    let bill = aggregator(&store, TariffPricer::default())
        .build(SUBSCRIBER, "02/2018".parse().unwrap())
        .await
        .unwrap();

    assert!(bill.is_empty());
    assert_eq!(bill.total(), dec!(0));
}

#[tokio::test]
async fn test_persist_stores_bill_and_calls() {
    let store = Arc::new(MemoryStore::new());
    seed_december(&store).await;

    let bill = aggregator(&store, TariffPricer::default())
        .run(SUBSCRIBER, december())
        .await
        .unwrap();

    let bill_id = bill.id.unwrap();
    assert!(bill.calls().iter().all(|c| c.id.is_some()));
    assert!(bill.calls().iter().all(|c| c.bill_id == Some(bill_id)));
    assert_eq!(store.bill_total(SUBSCRIBER, december()), Some(dec!(115.65)));

    let stored = store.find(SUBSCRIBER, december()).await.unwrap().unwrap();
    assert_eq!(stored.total(), dec!(115.65));
    assert_eq!(stored.calls().len(), 10);
}

#[tokio::test]
async fn test_runs_are_idempotent() {
    let store = Arc::new(MemoryStore::new());
    seed_december(&store).await;
    let aggregator = aggregator(&store, TariffPricer::default());

    let first = aggregator.run(SUBSCRIBER, december()).await.unwrap();
    let second = aggregator.run(SUBSCRIBER, december()).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.total(), second.total());
    assert_eq!(first.calls(), second.calls());
}

#[tokio::test]
async fn test_stored_prices_survive_tariff_change() {
    let store = Arc::new(MemoryStore::new());
    seed_december(&store).await;
    aggregator(&store, TariffPricer::default())
        .run(SUBSCRIBER, december())
        .await
        .unwrap();

    let doubled = TariffSchedule::new(
        NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(21, 59, 0).unwrap(),
        BandRate::new(dec!(0.72), dec!(0.18)),
        BandRate::new(dec!(0.72), dec!(0)),
    )
    .unwrap();

    let rebuilt = aggregator(&store, TariffPricer::new(doubled))
        .build(SUBSCRIBER, december())
        .await
        .unwrap();

    assert_eq!(rebuilt.total(), dec!(115.65));
}

#[tokio::test]
async fn test_other_subscriber_gets_own_calls() {
    let store = Arc::new(MemoryStore::new());
    seed_december(&store).await;

    let bill = aggregator(&store, TariffPricer::default())
        .build(OTHER_SUBSCRIBER, december())
        .await
        .unwrap();

    // 30 standard minutes
    assert_eq!(bill.calls().len(), 1);
    assert_eq!(bill.total(), dec!(3.06));
}

#[tokio::test]
async fn test_unbillable_pairs_are_skipped() {
    let store = Arc::new(MemoryStore::new());

    save_call(
        &store,
        90,
        SUBSCRIBER,
        at(2017, 12, 18, 12, 1, 45),
        at(2017, 12, 18, 12, 2, 45),
    )
    .await;

    // End stamped an hour before its start
    save_call(
        &store,
        91,
        SUBSCRIBER,
        at(2017, 12, 20, 10, 0, 0),
        at(2017, 12, 20, 9, 0, 0),
    )
    .await;

    // Start stored without a destination number
    let mut start = CallRecord::start(92, at(2017, 12, 21, 10, 0, 0), SUBSCRIBER, DESTINATION);
    start.destination_number = None;
    store.save(&start).await.unwrap();
    store
        .save(&CallRecord::end(92, at(2017, 12, 21, 10, 5, 0)))
        .await
        .unwrap();

    let bill = aggregator(&store, TariffPricer::default())
        .run(SUBSCRIBER, december())
        .await
        .unwrap();

    let billed: Vec<i64> = bill.calls().iter().map(|c| c.call_identifier).collect();
    assert_eq!(billed, vec![90]);
    assert_eq!(bill.total(), dec!(0.45));
    assert_eq!(store.bill_total(SUBSCRIBER, december()), Some(dec!(0.45)));
    assert!(store.find_by_call_identifier(91).await.unwrap().is_none());
}

/// Priced call store whose writes always fail
struct FailingPricedCalls;

#[async_trait]
impl PricedCallRepository for FailingPricedCalls {
    async fn find_by_call_identifier(&self, _call_identifier: i64) -> AppResult<Option<PricedCall>> {
        Ok(None)
    }

    async fn insert_if_absent(&self, _call: &PricedCall) -> AppResult<PricedCall> {
        Err(AppError::Database("connection reset".to_string()))
    }
}

#[tokio::test]
async fn test_storage_failure_keeps_computed_bill() {
    let store = Arc::new(MemoryStore::new());
    seed_december(&store).await;

    let aggregator = BillAggregator::new(
        Arc::clone(&store),
        Arc::new(FailingPricedCalls),
        Arc::clone(&store),
        Arc::new(TariffPricer::default()),
    );

    let mut bill = aggregator.build(SUBSCRIBER, december()).await.unwrap();
    let result = aggregator.persist(&mut bill).await;

    assert!(matches!(result, Err(AppError::Database(_))));
    assert_eq!(bill.total(), dec!(115.65));
    assert!(bill.calls().iter().all(|c| c.id.is_none()));
}

#[tokio::test]
async fn test_aggregator_over_trait_objects() {
    use callbill_core::traits::CallRecordRepository;

    let store = Arc::new(MemoryStore::new());
    seed_december(&store).await;

    let records: Arc<dyn CallRecordRepository> = store.clone();
    let priced_calls: Arc<dyn PricedCallRepository> = store.clone();
    let bills: Arc<dyn BillRepository> = store.clone();
    let aggregator = BillAggregator::new(records, priced_calls, bills, Arc::new(TariffPricer::default()));

    let bill = aggregator.run(SUBSCRIBER, december()).await.unwrap();
    assert_eq!(bill.total(), dec!(115.65));
}
