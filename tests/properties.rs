use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::f64::consts::TAU;
use swarmsim::behavior::{Ballistic, Brownian};
use swarmsim::color;
use swarmsim::prelude::*;

fn arena() -> Arena {
    Arena::new(200, 150, 30)
}

fn agent(x: f64, y: f64, orientation: f64, brownian: bool, boundary: Boundary) -> Agent {
    let behavior: Box<dyn Behavior> = if brownian {
        Box::new(Brownian::default())
    } else {
        Box::new(Ballistic)
    };
    Agent::new(0, 10.0, Point::new(x, y), orientation, arena(), color::BLUE, behavior)
        .with_boundary(boundary)
}

fn boundary() -> impl Strategy<Value = Boundary> {
    prop_oneof![Just(Boundary::BounceBack), Just(Boundary::Infinite)]
}

proptest! {
    #[test]
    fn heading_stays_in_range(
        x in 20.0..220.0f64,
        y in 20.0..170.0f64,
        orientation in 0.0..TAU,
        brownian in any::<bool>(),
        boundary in boundary(),
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut a = agent(x, y, orientation, brownian, boundary);
        for _ in 0..300 {
            a.update(&mut rng);
            prop_assert!((0.0..=TAU).contains(&a.orientation), "heading {}", a.orientation);
        }
    }

    #[test]
    fn centre_never_escapes_the_arena(
        x in 20.0..220.0f64,
        y in 20.0..170.0f64,
        orientation in 0.0..TAU,
        brownian in any::<bool>(),
        boundary in boundary(),
        seed in any::<u64>(),
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut a = agent(x, y, orientation, brownian, boundary);
        let (x0, x1) = arena().x_bounds();
        let (y0, y1) = arena().y_bounds();
        for _ in 0..500 {
            a.update(&mut rng);
            let c = a.center();
            prop_assert!(c.x >= x0 && c.x <= x1, "x = {}", c.x);
            prop_assert!(c.y >= y0 && c.y <= y1, "y = {}", c.y);
        }
    }

    #[test]
    fn speed_never_exceeds_cap(kicks in 0usize..5, seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut a = agent(100.0, 100.0, 1.0, true, Boundary::Infinite);
        for _ in 0..kicks {
            a.velocity += 0.5;
        }
        a.update(&mut rng);
        prop_assert!(a.velocity <= a.v_max);
    }
}
