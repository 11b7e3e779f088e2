// libs/scheduling-cell/tests/slots_test.rs
//
// Pure slot engine tests: overlap predicate, fixed-stride enumeration,
// booked counts and utilization.

use chrono::{NaiveDate, NaiveTime, Utc};
use uuid::Uuid;
use assert_matches::assert_matches;

use scheduling_cell::models::{
    AppointmentStatus, AvailabilityWindow, BookedInterval, SchedulingError, TimeInterval,
};
use scheduling_cell::services::slots::{
    booked_count, free_slots, has_conflict, overlaps, utilization_percentage, MIN_SLOT_MINUTES,
};

// ==============================================================================
// TEST FIXTURES AND UTILITIES
// ==============================================================================

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn interval(start: (u32, u32), end: (u32, u32)) -> TimeInterval {
    TimeInterval::new(t(start.0, start.1), t(end.0, end.1)).unwrap()
}

fn window(start: (u32, u32), end: (u32, u32)) -> AvailabilityWindow {
    AvailabilityWindow {
        id: Uuid::new_v4(),
        staff_id: Uuid::new_v4(),
        date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
        start_time: t(start.0, start.1),
        end_time: t(end.0, end.1),
        is_available: true,
        notes: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn booked(start: (u32, u32), duration_minutes: i32, status: AppointmentStatus) -> BookedInterval {
    BookedInterval {
        start_time: t(start.0, start.1),
        duration_minutes,
        status,
    }
}

/// Status filtering happens upstream of the engine, mirroring what the
/// availability service does before calling free_slots.
fn occupied(appointments: &[BookedInterval]) -> Vec<TimeInterval> {
    appointments
        .iter()
        .filter(|a| a.occupies_slot())
        .map(|a| a.interval().unwrap())
        .collect()
}

// ==============================================================================
// OVERLAP PREDICATE
// ==============================================================================

#[test]
fn overlap_is_symmetric() {
    let cases = [
        (interval((9, 0), (10, 0)), interval((9, 30), (10, 30))),
        (interval((9, 0), (10, 0)), interval((10, 0), (11, 0))),
        (interval((9, 0), (12, 0)), interval((10, 0), (10, 30))),
        (interval((9, 0), (9, 30)), interval((14, 0), (15, 0))),
    ];

    for (a, b) in &cases {
        assert_eq!(overlaps(a, b), overlaps(b, a), "asymmetric for {} vs {}", a, b);
    }
}

#[test]
fn back_to_back_intervals_do_not_overlap() {
    let first = interval((9, 0), (9, 30));
    let second = interval((9, 30), (10, 0));

    assert!(!overlaps(&first, &second));
    assert!(!overlaps(&second, &first));
}

#[test]
fn interval_overlaps_itself() {
    let a = interval((9, 0), (10, 0));
    assert!(overlaps(&a, &a));
}

#[test]
fn containment_and_partial_overlap_detected() {
    let outer = interval((9, 0), (12, 0));
    let inner = interval((10, 0), (10, 30));
    let straddling = interval((11, 30), (12, 30));

    assert!(overlaps(&outer, &inner));
    assert!(overlaps(&outer, &straddling));
}

#[test]
fn conflict_check_short_circuits_over_many_bookings() {
    let candidate = interval((9, 0), (9, 30));
    let bookings = vec![
        interval((9, 0), (9, 30)),
        interval((10, 0), (10, 30)),
        interval((11, 0), (11, 30)),
    ];

    assert!(has_conflict(&candidate, &bookings));
    assert!(!has_conflict(&interval((12, 0), (12, 30)), &bookings));
    assert!(!has_conflict(&candidate, &[]));
}

// ==============================================================================
// SLOT ENUMERATION
// ==============================================================================

#[test]
fn empty_morning_yields_six_half_hour_slots() {
    let window = window((9, 0), (12, 0));

    let slots = free_slots(&window, &[], 30).unwrap();

    assert_eq!(slots.len(), 6);
    let expected = [
        ("09:00 - 09:30", t(9, 0)),
        ("09:30 - 10:00", t(9, 30)),
        ("10:00 - 10:30", t(10, 0)),
        ("10:30 - 11:00", t(10, 30)),
        ("11:00 - 11:30", t(11, 0)),
        ("11:30 - 12:00", t(11, 30)),
    ];
    for (slot, (label, start)) in slots.iter().zip(expected.iter()) {
        assert_eq!(slot.label, *label);
        assert_eq!(slot.start_time, *start);
    }
}

#[test]
fn confirmed_booking_blocks_its_slot() {
    let window = window((9, 0), (10, 0));
    let bookings = occupied(&[booked((9, 30), 30, AppointmentStatus::Confirmed)]);

    let slots = free_slots(&window, &bookings, 30).unwrap();

    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].start_time, t(9, 0));
    assert_eq!(slots[0].end_time, t(9, 30));
}

#[test]
fn cancelled_booking_frees_its_slot() {
    let window = window((9, 0), (10, 0));
    let bookings = occupied(&[booked((9, 15), 30, AppointmentStatus::Cancelled)]);

    let slots = free_slots(&window, &bookings, 30).unwrap();

    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].start_time, t(9, 0));
    assert_eq!(slots[1].start_time, t(9, 30));
}

#[test]
fn fixed_stride_does_not_reprobe_after_off_stride_booking() {
    // Booking ends 09:40; the 09:40-10:10 gap fits a slot but the scan
    // only probes on 30-minute boundaries from 09:00.
    let window = window((9, 0), (10, 30));
    let bookings = occupied(&[booked((9, 10), 30, AppointmentStatus::Confirmed)]);

    let slots = free_slots(&window, &bookings, 30).unwrap();

    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].start_time, t(10, 0));
    assert_eq!(slots[0].end_time, t(10, 30));
}

#[test]
fn no_slot_extends_past_window_end() {
    // 10:00 + 30min would overrun the 10:15 close
    let window = window((9, 0), (10, 15));

    let slots = free_slots(&window, &[], 30).unwrap();

    assert_eq!(slots.len(), 2);
    for slot in &slots {
        assert!(slot.end_time <= window.end_time);
    }
}

#[test]
fn emitted_slots_never_overlap_bookings() {
    let window = window((8, 0), (18, 0));
    let bookings = occupied(&[
        booked((8, 45), 60, AppointmentStatus::Confirmed),
        booked((11, 0), 45, AppointmentStatus::Pending),
        booked((14, 30), 90, AppointmentStatus::InProgress),
        booked((16, 0), 15, AppointmentStatus::Completed),
    ]);

    let slots = free_slots(&window, &bookings, 45).unwrap();

    assert!(!slots.is_empty());
    for slot in &slots {
        let candidate = TimeInterval::new(slot.start_time, slot.end_time).unwrap();
        assert!(
            !has_conflict(&candidate, &bookings),
            "slot {} overlaps a booking",
            slot.label
        );
        assert!(slot.end_time <= window.end_time);
    }
}

#[test]
fn unavailable_window_yields_no_slots() {
    let mut window = window((9, 0), (17, 0));
    window.is_available = false;

    let slots = free_slots(&window, &[], 30).unwrap();
    assert!(slots.is_empty());
}

#[test]
fn fully_booked_window_yields_no_slots() {
    let window = window((9, 0), (11, 0));
    let bookings = occupied(&[
        booked((9, 0), 60, AppointmentStatus::Confirmed),
        booked((10, 0), 60, AppointmentStatus::Confirmed),
    ]);

    let slots = free_slots(&window, &bookings, 30).unwrap();
    assert!(slots.is_empty());
}

#[test]
fn duration_shorter_than_window_minimum_is_rejected() {
    let window = window((9, 0), (12, 0));

    assert_matches!(free_slots(&window, &[], 0), Err(SchedulingError::InvalidDuration(0)));
    assert_matches!(free_slots(&window, &[], -30), Err(SchedulingError::InvalidDuration(-30)));
    assert_matches!(
        free_slots(&window, &[], MIN_SLOT_MINUTES - 1),
        Err(SchedulingError::InvalidDuration(_))
    );
}

#[test]
fn duration_longer_than_window_yields_no_slots() {
    let window = window((9, 0), (9, 30));

    let slots = free_slots(&window, &[], 45).unwrap();
    assert!(slots.is_empty());
}

// ==============================================================================
// BOOKED COUNT & UTILIZATION
// ==============================================================================

#[test]
fn booked_count_skips_no_shows_and_cancellations() {
    let appointments = [
        booked((9, 0), 30, AppointmentStatus::Confirmed),
        booked((10, 0), 30, AppointmentStatus::NoShow),
        booked((11, 0), 30, AppointmentStatus::Completed),
    ];

    assert_eq!(booked_count(&appointments), 2);

    let with_cancellation = [
        booked((9, 0), 30, AppointmentStatus::Cancelled),
        booked((10, 0), 30, AppointmentStatus::Pending),
    ];
    assert_eq!(booked_count(&with_cancellation), 1);
}

#[test]
fn utilization_is_zero_with_no_bookings() {
    let window = window((9, 0), (17, 0));
    assert_eq!(utilization_percentage(&window, &[]), 0.0);
}

#[test]
fn utilization_is_full_when_bookings_tile_the_window() {
    let window = window((9, 0), (12, 0));
    let appointments = [
        booked((9, 0), 60, AppointmentStatus::Confirmed),
        booked((10, 0), 60, AppointmentStatus::Confirmed),
        booked((11, 0), 60, AppointmentStatus::InProgress),
    ];

    assert_eq!(utilization_percentage(&window, &appointments), 100.0);
}

#[test]
fn utilization_rounds_to_one_decimal() {
    // 50 of 180 minutes = 27.777... -> 27.8
    let window = window((9, 0), (12, 0));
    let appointments = [booked((9, 0), 50, AppointmentStatus::Confirmed)];

    assert_eq!(utilization_percentage(&window, &appointments), 27.8);
}

#[test]
fn utilization_ignores_cancelled_minutes() {
    let window = window((9, 0), (11, 0));
    let appointments = [
        booked((9, 0), 60, AppointmentStatus::Cancelled),
        booked((10, 0), 30, AppointmentStatus::Confirmed),
    ];

    assert_eq!(utilization_percentage(&window, &appointments), 25.0);
}
