use crate::mac::Backoff;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn backoff_increase_is_mild_and_capped() {
    let mut b = Backoff::new(2, 64);
    let mut seen = vec![b.window()];
    for _ in 0..10 {
        b.increase();
        seen.push(b.window());
    }
    assert_eq!(seen, vec![2, 3, 5, 8, 12, 18, 27, 41, 62, 64, 64]);
}

#[test]
fn backoff_decrease_is_linear_and_floored() {
    let mut b = Backoff::new(2, 64);
    b.increase();
    b.increase();
    assert_eq!(b.window(), 5);
    b.decrease();
    assert_eq!(b.window(), 4);
    b.decrease();
    b.decrease();
    b.decrease();
    assert_eq!(b.window(), 2);
}

#[test]
fn backoff_reset_and_sync_clamp_to_bounds() {
    let mut b = Backoff::new(2, 64);
    b.sync(10);
    assert_eq!(b.window(), 10);
    b.sync(1_000);
    assert_eq!(b.window(), 64);
    b.sync(0);
    assert_eq!(b.window(), 2);
    b.sync(30);
    b.reset();
    assert_eq!(b.window(), b.min());
}

#[test]
fn backoff_draws_stay_inside_window() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut b = Backoff::new(2, 64);
    for _ in 0..6 {
        b.increase();
    }
    for _ in 0..200 {
        let slots = b.draw_slots(&mut rng);
        assert!((1..=b.window()).contains(&slots), "slots={slots}");
    }
}
