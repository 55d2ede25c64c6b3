use image::Rgb;
use std::f64::consts::TAU;

pub const BACKGROUND: Rgb<u8> = Rgb([200, 200, 200]);
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
pub const LIGHT_BLUE: Rgb<u8> = Rgb([173, 216, 230]);

/// Matplotlib-style "jet" colormap, `x` in [0, 1].
pub fn jet(x: f64) -> Rgb<u8> {
    let x = x.clamp(0.0, 1.0);
    let channel = |offset: f64| ((1.5 - (4.0 * x - offset).abs()).clamp(0.0, 1.0) * 255.0) as u8;
    Rgb([channel(3.0), channel(2.0), channel(1.0)])
}

/// Colour of an agent derived from where it is heading and how fast it goes.
pub fn calculate_color(orientation: f64, velocity: f64) -> Rgb<u8> {
    let base = jet(orientation.rem_euclid(TAU) / TAU);
    let shade = 0.6 + 0.4 * velocity.abs().min(1.0);
    Rgb(base.0.map(|c| (c as f64 * shade) as u8))
}

/// Alpha-blend `top` over `bottom`.
pub fn blend(bottom: Rgb<u8>, top: Rgb<u8>, alpha: f64) -> Rgb<u8> {
    let a = alpha.clamp(0.0, 1.0);
    let mut out = [0u8; 3];
    for (i, c) in out.iter_mut().enumerate() {
        *c = ((1.0 - a) * bottom.0[i] as f64 + a * top.0[i] as f64).round() as u8;
    }
    Rgb(out)
}
