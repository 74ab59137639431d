use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::{TimeZone, Utc};
use std::sync::Arc;

use standops_allocation::compute;
use standops_bookings::{Booking, BookingCommand, BookingId, BookingStatus};
use standops_core::{InventoryItemId, ItemTypeId, OrderId, SectorId, Versioned};
use standops_events::InMemoryEventBus;
use standops_infra::{
    AllocationLedger, InMemoryBookingStore, InMemoryItemStore, InMemoryOrderStore, ItemStore,
    OrderStore, TransitionManager,
};
use standops_inventory::InventoryItem;
use standops_orders::{Order, OrderCommand, OrderLine, OrderStatus};

fn test_item(capacity: i64) -> InventoryItem {
    InventoryItem::new(
        InventoryItemId::new(),
        ItemTypeId::new(),
        SectorId::new(),
        capacity,
        80_000,
        50_000,
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
    )
    .unwrap()
}

fn approved_order(item_id: InventoryItemId, quantity: i64) -> Order {
    let mut order = Order::new(
        OrderId::new(),
        vec![OrderLine {
            line_no: 1,
            item_id,
            quantity,
        }],
        Utc::now(),
    )
    .unwrap();
    let event = order
        .handle(&OrderCommand::SetStatus {
            status: OrderStatus::Approved,
            occurred_at: Utc::now(),
        })
        .unwrap();
    order.apply(&event);
    order
}

fn confirmed_booking(item_id: InventoryItemId) -> Booking {
    let start = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2026, 2, 3, 0, 0, 0).unwrap();
    let mut booking = Booking::new(BookingId::new(), item_id, start, end, start).unwrap();
    let event = booking
        .handle(&BookingCommand::SetStatus {
            status: BookingStatus::Confirmed,
            occurred_at: start,
        })
        .unwrap();
    booking.apply(&event);
    booking
}

fn bench_compute_scaling(c: &mut Criterion) {
    standops_observability::init();

    let mut group = c.benchmark_group("allocation_compute");
    for demand_count in [10u64, 100, 1_000] {
        let item = test_item(1_000_000);
        let orders: Vec<Order> = (0..demand_count)
            .map(|_| approved_order(item.id(), 2))
            .collect();
        let bookings: Vec<Booking> = (0..demand_count / 10)
            .map(|_| confirmed_booking(item.id()))
            .collect();

        group.throughput(Throughput::Elements(demand_count));
        group.bench_with_input(
            BenchmarkId::from_parameter(demand_count),
            &demand_count,
            |b, _| {
                b.iter(|| {
                    black_box(compute(
                        black_box(&item),
                        black_box(&orders),
                        black_box(&bookings),
                        None,
                    ))
                })
            },
        );
    }
    group.finish();
}

fn bench_approval_pipeline(c: &mut Criterion) {
    c.bench_function("approval_pipeline", |b| {
        b.iter_batched(
            || {
                let items = Arc::new(InMemoryItemStore::new());
                let orders = Arc::new(InMemoryOrderStore::new());
                let bookings = Arc::new(InMemoryBookingStore::new());
                let bus = Arc::new(InMemoryEventBus::new());
                let ledger = Arc::new(AllocationLedger::new(
                    items.clone(),
                    orders.clone(),
                    bookings.clone(),
                ));
                let manager = TransitionManager::new(
                    items.clone(),
                    orders.clone(),
                    bookings.clone(),
                    ledger,
                    bus,
                );

                let item = test_item(1_000_000);
                let item_id = item.id();
                items.upsert(item);

                let order = Order::new(
                    OrderId::new(),
                    vec![OrderLine {
                        line_no: 1,
                        item_id,
                        quantity: 1,
                    }],
                    Utc::now(),
                )
                .unwrap();
                let order_id = order.id();
                orders.insert(order).unwrap();

                (manager, order_id)
            },
            |(manager, order_id)| manager.request_order_approval(order_id).unwrap(),
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_compute_scaling, bench_approval_pipeline);
criterion_main!(benches);
