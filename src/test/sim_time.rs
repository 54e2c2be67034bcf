use crate::sim::SimTime;

#[test]
fn sim_time_unit_conversions() {
    assert_eq!(SimTime::from_micros(1), SimTime(1_000));
    assert_eq!(SimTime::from_millis(1), SimTime(1_000_000));
    assert_eq!(SimTime::from_secs(1), SimTime(1_000_000_000));
}

#[test]
fn sim_time_unit_conversions_saturate_on_overflow() {
    assert_eq!(SimTime::from_micros(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime::from_millis(u64::MAX), SimTime(u64::MAX));
    assert_eq!(SimTime::from_secs(u64::MAX), SimTime(u64::MAX));
}

#[test]
fn sim_time_from_secs_f64_rounds_and_clamps() {
    assert_eq!(SimTime::from_secs_f64(1.5), SimTime::from_millis(1_500));
    assert_eq!(SimTime::from_secs_f64(0.0000000004), SimTime::ZERO);
    assert_eq!(SimTime::from_secs_f64(-3.0), SimTime::ZERO);
    assert_eq!(SimTime::from_secs_f64(f64::NAN), SimTime::ZERO);
    assert_eq!(SimTime::from_secs_f64(f64::INFINITY), SimTime(u64::MAX));
    assert_eq!(SimTime::from_secs_f64(1e30), SimTime(u64::MAX));
}

#[test]
fn sim_time_saturating_arithmetic_and_display() {
    let t = SimTime::from_millis(600);
    assert_eq!(t.saturating_mul(3), SimTime::from_millis(1_800));
    assert_eq!(SimTime::ZERO.saturating_sub(t), SimTime::ZERO);
    assert_eq!(SimTime(u64::MAX).saturating_add(t), SimTime(u64::MAX));
    assert!((t.as_secs_f64() - 0.6).abs() < 1e-12);
    assert_eq!(t.to_string(), "0.600s");
}
